use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs as async_fs;

/// Read-only handle to file content supplied by the caller.
#[async_trait]
pub trait FileSource: Send + Sync {
    fn name(&self) -> &str;

    /// Reads the whole file as UTF-8 text, without a leading byte order mark.
    async fn read_text(&self) -> io::Result<String>;
}

/// A file received in a request body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data,
        }
    }
}

#[async_trait]
impl FileSource for UploadedFile {
    fn name(&self) -> &str {
        &self.filename
    }

    async fn read_text(&self) -> io::Result<String> {
        String::from_utf8(self.data.clone())
            .map(strip_bom)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// A file on the local filesystem.
#[derive(Debug, Clone)]
pub struct DiskFile {
    path: PathBuf,
    name: String,
}

impl DiskFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Self { path, name }
    }
}

#[async_trait]
impl FileSource for DiskFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_text(&self) -> io::Result<String> {
        async_fs::read_to_string(&self.path).await.map(strip_bom)
    }
}

const BOM: char = '\u{FEFF}';

fn strip_bom(text: String) -> String {
    match text.strip_prefix(BOM) {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_uploaded_file_rejects_non_utf8() {
        let upload = UploadedFile::new("blob.bin", "application/octet-stream", vec![0xFF, 0xFE, 0x00]);
        let err = upload.read_text().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_disk_file_reads_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rows.csv");
        std::fs::write(&path, "a,b\n1,2").unwrap();

        let file = DiskFile::new(&path);
        assert_eq!(file.name(), "rows.csv");
        assert_eq!(file.read_text().await.unwrap(), "a,b\n1,2");
    }

    #[tokio::test]
    async fn test_read_text_strips_leading_bom() {
        let upload = UploadedFile::new("rows.json", "application/json", "\u{FEFF}{\"a\":1}".as_bytes().to_vec());
        assert_eq!(upload.read_text().await.unwrap(), "{\"a\":1}");

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rows.csv");
        std::fs::write(&path, "\u{FEFF}a,b\n\u{FEFF}").unwrap();
        assert_eq!(DiskFile::new(&path).read_text().await.unwrap(), "a,b\n\u{FEFF}");
    }

    #[tokio::test]
    async fn test_disk_file_missing() {
        let file = DiskFile::new("/definitely/not/here.json");
        assert!(file.read_text().await.is_err());
    }
}
