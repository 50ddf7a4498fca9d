use async_trait::async_trait;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to read upload source: {0}")]
    Source(#[from] std::io::Error),
    #[error("Upload to {backend} failed: {message}")]
    Upload {
        backend: &'static str,
        message: String,
    },
}

/// What to upload: an in-memory buffer or a file already on disk.
#[derive(Debug, Clone)]
pub enum UploadSource {
    Bytes(Vec<u8>),
    File(PathBuf),
}

impl UploadSource {
    pub async fn read(self) -> Result<Vec<u8>, StorageError> {
        match self {
            UploadSource::Bytes(bytes) => Ok(bytes),
            UploadSource::File(path) => Ok(tokio::fs::read(path).await?),
        }
    }
}

/// Durable object storage for finished artifacts.
#[async_trait]
pub trait StorageRepository: Send + Sync {
    /// Store `source` as `<folder>/<filename>` and return its public URL.
    async fn upload(
        &self,
        source: UploadSource,
        filename: &str,
        content_type: &str,
        folder: &str,
    ) -> Result<String, StorageError>;
}

/// `folder/filename` with stray slashes removed.
pub fn object_path(folder: &str, filename: &str) -> String {
    let folder = folder.trim_matches('/');
    let filename = filename.trim_start_matches('/');
    if folder.is_empty() {
        filename.to_string()
    } else {
        format!("{}/{}", folder, filename)
    }
}
