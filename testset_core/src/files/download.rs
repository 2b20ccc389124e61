use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use mime::Mime;
use parking_lot::Mutex;
use uuid::Uuid;

/// In-memory content tagged with a MIME type.
#[derive(Debug, Clone)]
pub struct Blob {
    pub content_type: Mime,
    pub data: Vec<u8>,
}

impl Blob {
    pub fn new(data: impl Into<Vec<u8>>, content_type: Mime) -> Self {
        Self {
            content_type,
            data: data.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Environment able to save generated content on the user's behalf.
pub trait DownloadHost: Send + Sync {
    /// Registers `blob` and returns a temporary reference to it.
    fn create_object_url(&self, blob: Blob) -> io::Result<String>;

    /// Saves the content behind `url` under `filename`.
    fn save(&self, url: &str, filename: &str) -> io::Result<()>;

    fn revoke_object_url(&self, url: &str);
}

struct ObjectUrl<'a> {
    host: &'a dyn DownloadHost,
    url: String,
}

impl Drop for ObjectUrl<'_> {
    fn drop(&mut self) {
        self.host.revoke_object_url(&self.url);
    }
}

/// Saves `content` as a `text/csv` file named `filename`.
///
/// Without a host this returns immediately and does nothing. Host errors are
/// returned as-is; the temporary object URL is released either way.
pub fn download_csv(host: Option<&dyn DownloadHost>, content: &str, filename: &str) -> io::Result<()> {
    let Some(host) = host else {
        tracing::debug!("No download host available, skipping download of {}", filename);
        return Ok(());
    };

    let blob = Blob::new(content, mime::TEXT_CSV);
    let link = ObjectUrl {
        host,
        url: host.create_object_url(blob)?,
    };

    host.save(&link.url, filename)
}

/// Host that writes downloads into a local directory.
///
/// `save` does blocking file I/O; async callers run it on the blocking pool.
pub struct DirectoryHost {
    dir: PathBuf,
    pending: Mutex<HashMap<String, Blob>>,
}

impl DirectoryHost {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of object URLs not yet revoked.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}

impl DownloadHost for DirectoryHost {
    fn create_object_url(&self, blob: Blob) -> io::Result<String> {
        let url = format!("blob:{}", Uuid::new_v4());
        self.pending.lock().insert(url.clone(), blob);
        Ok(url)
    }

    fn save(&self, url: &str, filename: &str) -> io::Result<()> {
        let data = self
            .pending
            .lock()
            .get(url)
            .map(|blob| blob.data.clone())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("unknown object URL {}", url)))?;

        let name = Path::new(filename)
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, format!("invalid download filename {:?}", filename)))?;

        std::fs::create_dir_all(&self.dir)?;
        let target = self.dir.join(name);
        std::fs::write(&target, data)?;

        tracing::info!("Saved download {} to {}", filename, target.display());
        Ok(())
    }

    fn revoke_object_url(&self, url: &str) {
        self.pending.lock().remove(url);
    }
}
