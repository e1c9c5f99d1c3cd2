//! Delivery of produced files

use std::path::{Path, PathBuf};

use recamera_core::ConsoleError;
use tracing::debug;

/// Receives recordings and snapshots for the user to keep
pub trait DownloadSink: Send + Sync {
    /// Store `data` under `file_name` and report where it went
    fn save(&self, file_name: &str, mime_type: &str, data: &[u8]) -> Result<PathBuf, ConsoleError>;
}

/// Writes files into a directory
#[derive(Debug, Clone)]
pub struct DirectoryDownloadSink {
    dir: PathBuf,
}

impl DirectoryDownloadSink {
    /// Sink writing into `dir`; the directory is created on first save
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectoryDownloadSink {
    fn save(&self, file_name: &str, mime_type: &str, data: &[u8]) -> Result<PathBuf, ConsoleError> {
        // Only a bare file name may be written
        let name = Path::new(file_name)
            .file_name()
            .filter(|name| name.to_str() == Some(file_name))
            .ok_or_else(|| ConsoleError::invalid_field("file_name", format!("'{}' is not a plain file name", file_name)))?;

        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        std::fs::write(&path, data)?;
        debug!("Wrote {} ({}, {} bytes)", path.display(), mime_type, data.len());
        Ok(path)
    }
}
