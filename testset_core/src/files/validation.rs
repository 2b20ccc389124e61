use std::collections::HashSet;

use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::source::FileSource;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("File too large: {size} bytes (max: {max_size} bytes)")]
    FileTooLarge { size: u64, max_size: u64 },

    #[error("Invalid file type: {content_type} (allowed: {allowed:?})")]
    InvalidFileType { content_type: String, allowed: Vec<String> },

    #[error("Filename too long: {length} characters (max: {max_length})")]
    FilenameTooLong { length: usize, max_length: usize },

    #[error("Invalid filename: {filename}")]
    InvalidFilename { filename: String },

    #[error("Empty file not allowed")]
    EmptyFile,
}

/// Outcome of a content check. Failures carry no detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationResult {
    Valid,
    Invalid,
}

impl ValidationResult {
    pub fn is_valid(self) -> bool {
        matches!(self, ValidationResult::Valid)
    }
}

impl From<bool> for ValidationResult {
    fn from(valid: bool) -> Self {
        if valid {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestsetFormat {
    Csv,
    Json,
}

impl TestsetFormat {
    /// Guesses the format from the filename's extension.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let guess = mime_guess::from_path(filename).first()?;
        if guess.type_() == mime::TEXT && guess.subtype() == mime::CSV {
            Some(TestsetFormat::Csv)
        } else if guess.type_() == mime::APPLICATION && guess.subtype() == mime::JSON {
            Some(TestsetFormat::Json)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileValidationConfig {
    pub max_file_size: u64,
    pub allowed_content_types: HashSet<String>,
    pub max_filename_length: usize,
}

impl Default for FileValidationConfig {
    fn default() -> Self {
        let allowed_types = ["text/csv", "application/json", "text/plain"]
            .into_iter()
            .map(str::to_string)
            .collect();

        Self {
            max_file_size: 10 * 1024 * 1024,
            allowed_content_types: allowed_types,
            max_filename_length: 255,
        }
    }
}

#[derive(Clone)]
pub struct FileValidator {
    config: FileValidationConfig,
}

impl FileValidator {
    pub fn new(config: FileValidationConfig) -> Self {
        Self { config }
    }

    pub fn with_default_config() -> Self {
        Self::new(FileValidationConfig::default())
    }

    /// Screens an upload before its content is parsed.
    ///
    /// Only the last path component of `filename` is screened.
    pub fn validate_upload(&self, filename: &str, content_type: &str, data: &[u8]) -> Result<(), UploadError> {
        let filename = client_file_name(filename);

        if data.is_empty() {
            return Err(UploadError::EmptyFile);
        }

        if data.len() as u64 > self.config.max_file_size {
            return Err(UploadError::FileTooLarge {
                size: data.len() as u64,
                max_size: self.config.max_file_size,
            });
        }

        self.validate_filename(filename)?;

        self.validate_content_type(content_type)?;

        Ok(())
    }

    pub async fn validate(&self, format: TestsetFormat, file: &dyn FileSource) -> ValidationResult {
        match format {
            TestsetFormat::Csv => validate_csv(file).await,
            TestsetFormat::Json => validate_json(file).await,
        }
    }

    fn validate_filename(&self, filename: &str) -> Result<(), UploadError> {
        if filename.len() > self.config.max_filename_length {
            return Err(UploadError::FilenameTooLong {
                length: filename.len(),
                max_length: self.config.max_filename_length,
            });
        }

        if filename.is_empty() || filename.contains('\0') || filename.contains('/') || filename.contains('\\') {
            return Err(UploadError::InvalidFilename {
                filename: filename.to_string(),
            });
        }

        let reserved_names = ["CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8", "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9"];

        let name_without_ext = filename.split('.').next().unwrap_or(filename).to_uppercase();
        if reserved_names.contains(&name_without_ext.as_str()) {
            return Err(UploadError::InvalidFilename {
                filename: filename.to_string(),
            });
        }

        Ok(())
    }

    fn validate_content_type(&self, content_type: &str) -> Result<(), UploadError> {
        // Browsers append parameters such as "; charset=utf-8".
        let essence = content_type.split(';').next().unwrap_or("").trim();

        if !self.config.allowed_content_types.contains(essence) {
            let mut allowed: Vec<String> = self.config.allowed_content_types.iter().cloned().collect();
            allowed.sort();
            return Err(UploadError::InvalidFileType {
                content_type: content_type.to_string(),
                allowed,
            });
        }
        Ok(())
    }
}

/// Last component of a client-supplied name, split on `/` and `\\`.
///
/// Some browsers send the full Windows path, e.g. `C:\\Users\\x\\rows.csv`.
pub fn client_file_name(raw: &str) -> &str {
    raw.rsplit(['/', '\\']).next().unwrap_or(raw)
}

/// `Valid` when the file reads as text and yields at least one CSV row.
///
/// Blank lines are skipped. Only the row count matters: a record the parser
/// cannot decode ends the scan but rows read before it still count.
pub async fn validate_csv(file: &dyn FileSource) -> ValidationResult {
    let content = match file.read_text().await {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!("CSV check could not read {}: {}", file.name(), e);
            return ValidationResult::Invalid;
        }
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = 0usize;
    for record in reader.byte_records() {
        match record {
            Ok(record) if !record.is_empty() => rows += 1,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!("CSV parse stopped in {} after {} rows: {}", file.name(), rows, e);
                break;
            }
        }
    }

    ValidationResult::from(rows > 0)
}

/// `Valid` when the whole file parses as a single JSON value.
pub async fn validate_json(file: &dyn FileSource) -> ValidationResult {
    let content = match file.read_text().await {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!("JSON check could not read {}: {}", file.name(), e);
            return ValidationResult::Invalid;
        }
    };

    ValidationResult::from(serde_json::from_str::<serde::de::IgnoredAny>(&content).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::UploadedFile;

    fn text(content: &str) -> UploadedFile {
        UploadedFile::new("testset", "text/plain", content.as_bytes().to_vec())
    }

    #[test]
    fn test_validate_filename() {
        let validator = FileValidator::with_default_config();

        assert!(validator.validate_filename("testset.csv").is_ok());
        assert!(validator.validate_filename("rows with spaces.json").is_ok());

        assert!(validator.validate_filename("").is_err());
        assert!(validator.validate_filename("dir/file.csv").is_err());
        assert!(validator.validate_filename("dir\\file.csv").is_err());
        assert!(validator.validate_filename("nul\0byte.csv").is_err());
        assert!(validator.validate_filename("con.csv").is_err());

        let long_name = "a".repeat(300);
        assert!(validator.validate_filename(&long_name).is_err());
    }

    #[test]
    fn test_validate_content_type() {
        let validator = FileValidator::with_default_config();

        assert!(validator.validate_content_type("text/csv").is_ok());
        assert!(validator.validate_content_type("application/json").is_ok());
        assert!(validator.validate_content_type("text/csv; charset=utf-8").is_ok());

        assert!(validator.validate_content_type("application/pdf").is_err());
        assert!(validator.validate_content_type("image/png").is_err());
    }

    #[test]
    fn test_validate_upload() {
        let validator = FileValidator::new(FileValidationConfig {
            max_file_size: 8,
            ..FileValidationConfig::default()
        });

        assert!(validator.validate_upload("a.csv", "text/csv", b"a,b").is_ok());
        assert!(matches!(
            validator.validate_upload("a.csv", "text/csv", b""),
            Err(UploadError::EmptyFile)
        ));
        assert!(matches!(
            validator.validate_upload("a.csv", "text/csv", b"0123456789"),
            Err(UploadError::FileTooLarge { size: 10, max_size: 8 })
        ));
    }

    #[test]
    fn test_client_file_name() {
        assert_eq!(client_file_name("rows.csv"), "rows.csv");
        assert_eq!(client_file_name("C:\\Users\\x\\rows.csv"), "rows.csv");
        assert_eq!(client_file_name("/home/x/rows.json"), "rows.json");
        assert_eq!(client_file_name("dir/"), "");
    }

    #[test]
    fn test_validate_upload_accepts_windows_paths() {
        let validator = FileValidator::with_default_config();

        assert!(validator.validate_upload("C:\\Users\\x\\rows.csv", "text/csv", b"a,b").is_ok());
        assert!(validator.validate_upload("C:\\fakepath\\CON.csv", "text/csv", b"a,b").is_err());
        assert!(validator.validate_upload("uploads/", "text/csv", b"a,b").is_err());
    }

    #[tokio::test]
    async fn test_bom_prefixed_files_are_checked_without_the_bom() {
        let mut json = vec![0xEF, 0xBB, 0xBF];
        json.extend_from_slice(br#"{"a":1}"#);
        let json = UploadedFile::new("rows.json", "application/json", json);
        assert_eq!(validate_json(&json).await, ValidationResult::Valid);

        let mut csv = vec![0xEF, 0xBB, 0xBF];
        csv.extend_from_slice(b"a,b\n1,2");
        let csv = UploadedFile::new("rows.csv", "text/csv", csv);
        assert_eq!(validate_csv(&csv).await, ValidationResult::Valid);

        let bom_only = UploadedFile::new("rows.csv", "text/csv", vec![0xEF, 0xBB, 0xBF]);
        assert_eq!(validate_csv(&bom_only).await, ValidationResult::Invalid);
        assert_eq!(validate_json(&bom_only).await, ValidationResult::Invalid);
    }

    #[test]
    fn test_format_from_filename() {
        assert_eq!(TestsetFormat::from_filename("rows.csv"), Some(TestsetFormat::Csv));
        assert_eq!(TestsetFormat::from_filename("ROWS.JSON"), Some(TestsetFormat::Json));
        assert_eq!(TestsetFormat::from_filename("notes.txt"), None);
        assert_eq!(TestsetFormat::from_filename("no_extension"), None);
    }

    #[tokio::test]
    async fn test_validate_csv() {
        assert_eq!(validate_csv(&text("a,b\n1,2")).await, ValidationResult::Valid);
        assert_eq!(validate_csv(&text("single")).await, ValidationResult::Valid);
        assert_eq!(validate_csv(&text("\n\na,b\n\n")).await, ValidationResult::Valid);

        assert_eq!(validate_csv(&text("")).await, ValidationResult::Invalid);
        assert_eq!(validate_csv(&text("\n\n\r\n")).await, ValidationResult::Invalid);
    }

    #[tokio::test]
    async fn test_validate_csv_binary_is_invalid() {
        let binary = UploadedFile::new("image.png", "image/png", vec![0x89, 0x50, 0x4E, 0x47, 0xFF, 0xD8]);
        assert_eq!(validate_csv(&binary).await, ValidationResult::Invalid);
    }

    #[tokio::test]
    async fn test_validate_csv_keeps_rows_from_malformed_content() {
        let unbalanced = text("a,\"b\n1,2");
        assert!(validate_csv(&unbalanced).await.is_valid());
    }

    #[tokio::test]
    async fn test_validate_json() {
        assert_eq!(validate_json(&text(r#"{"a":1}"#)).await, ValidationResult::Valid);
        assert_eq!(validate_json(&text("[]")).await, ValidationResult::Valid);
        assert_eq!(validate_json(&text("  42 ")).await, ValidationResult::Valid);
        assert_eq!(validate_json(&text("null")).await, ValidationResult::Valid);

        assert_eq!(validate_json(&text("not json")).await, ValidationResult::Invalid);
        assert_eq!(validate_json(&text("")).await, ValidationResult::Invalid);
        assert_eq!(validate_json(&text(r#"{"a":1} {"b":2}"#)).await, ValidationResult::Invalid);
    }

    #[tokio::test]
    async fn test_validator_dispatches_on_format() {
        let validator = FileValidator::with_default_config();
        let file = text(r#"[{"q":"x"}]"#);

        assert!(validator.validate(TestsetFormat::Json, &file).await.is_valid());
        assert!(validator.validate(TestsetFormat::Csv, &file).await.is_valid());
        assert!(!validator.validate(TestsetFormat::Json, &text("q\nx")).await.is_valid());
    }
}
