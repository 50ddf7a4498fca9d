use super::storage_repository::{object_path, StorageError, StorageRepository, UploadSource};
use async_trait::async_trait;
use std::path::PathBuf;

/// Writes objects below a directory; URLs are `public_base_url/<object>`.
pub struct LocalStorageRepository {
    root: PathBuf,
    public_base_url: String,
}

impl LocalStorageRepository {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }
}

#[async_trait]
impl StorageRepository for LocalStorageRepository {
    async fn upload(
        &self,
        source: UploadSource,
        filename: &str,
        _content_type: &str,
        folder: &str,
    ) -> Result<String, StorageError> {
        let object = object_path(folder, filename);
        let destination = self.root.join(&object);

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        match source {
            UploadSource::Bytes(bytes) => tokio::fs::write(&destination, bytes).await?,
            UploadSource::File(path) => {
                tokio::fs::copy(&path, &destination).await?;
            }
        }

        tracing::debug!(path = %destination.display(), "Stored object locally");

        Ok(format!(
            "{}/{}",
            self.public_base_url.trim_end_matches('/'),
            object
        ))
    }
}
