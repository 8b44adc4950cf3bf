use std::{
    io::{self, SeekFrom},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, Take},
};

/// A stored object with the metadata needed for conditional responses.
#[derive(Debug, Clone)]
pub struct ArtifactFile {
    path: PathBuf,
    size: u64,
    etag: String,
    updated: DateTime<Utc>,
    content_type: &'static str,
    download_name: String,
}

impl ArtifactFile {
    /// Stat `path`. `Ok(None)` when nothing is stored there.
    pub async fn stat(
        path: impl Into<PathBuf>,
        content_type: &'static str,
        download_name: impl Into<String>,
    ) -> io::Result<Option<Self>> {
        let path = path.into();
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };
        if !metadata.is_file() {
            return Ok(None);
        }

        let updated: DateTime<Utc> = metadata.modified()?.into();
        let size = metadata.len();
        Ok(Some(Self {
            etag: format!("\"{:x}-{:x}\"", updated.timestamp(), size),
            path,
            size,
            updated,
            content_type,
            download_name: download_name.into(),
        }))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Quoted entity tag.
    pub fn etag(&self) -> &str {
        &self.etag
    }

    pub fn updated(&self) -> DateTime<Utc> {
        self.updated
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    pub fn download_name(&self) -> &str {
        &self.download_name
    }

    /// Open for reading `len` bytes starting at `start`.
    pub async fn open_range(&self, start: u64, len: u64) -> io::Result<Take<File>> {
        let mut file = File::open(&self.path).await?;
        if start > 0 {
            file.seek(SeekFrom::Start(start)).await?;
        }
        Ok(file.take(len))
    }
}
