pub mod download;
pub mod export;
pub mod source;
pub mod validation;

pub use download::{download_csv, Blob, DirectoryHost, DownloadHost};
pub use export::{convert_to_csv, escape_newlines, Row};
pub use source::{DiskFile, FileSource, UploadedFile};
pub use validation::{client_file_name, validate_csv, validate_json, FileValidationConfig, FileValidator, TestsetFormat, UploadError, ValidationResult};
