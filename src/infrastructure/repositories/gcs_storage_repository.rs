use super::storage_repository::{object_path, StorageError, StorageRepository, UploadSource};
use async_trait::async_trait;

const GCS_UPLOAD_URL: &str = "https://storage.googleapis.com/upload/storage/v1/b";
const GCS_PUBLIC_URL: &str = "https://storage.googleapis.com";
const BACKEND: &str = "gcs";

/// Google Cloud Storage via the JSON API simple media upload.
pub struct GcsStorageRepository {
    bucket: String,
    access_token: String,
    http_client: reqwest::Client,
}

impl GcsStorageRepository {
    pub fn new(bucket: String, access_token: String) -> Self {
        Self {
            bucket,
            access_token,
            http_client: reqwest::Client::new(),
        }
    }

    fn upload_url(&self, object: &str) -> String {
        format!(
            "{}/{}/o?uploadType=media&name={}",
            GCS_UPLOAD_URL,
            self.bucket,
            urlencoding::encode(object)
        )
    }

    pub fn public_url(&self, object: &str) -> String {
        format!("{}/{}/{}", GCS_PUBLIC_URL, self.bucket, object)
    }
}

#[async_trait]
impl StorageRepository for GcsStorageRepository {
    async fn upload(
        &self,
        source: UploadSource,
        filename: &str,
        content_type: &str,
        folder: &str,
    ) -> Result<String, StorageError> {
        let object = object_path(folder, filename);
        let bytes = source.read().await?;
        let size = bytes.len();

        let response = self
            .http_client
            .post(self.upload_url(&object))
            .bearer_auth(&self.access_token)
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                backend: BACKEND,
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!(
                status = %status,
                bucket = %self.bucket,
                object = %object,
                body = %error_text,
                "GCS upload rejected"
            );
            return Err(StorageError::Upload {
                backend: BACKEND,
                message: format!("status {}: {}", status, error_text),
            });
        }

        tracing::info!(bucket = %self.bucket, object = %object, size_bytes = size, "Uploaded object to GCS");

        Ok(self.public_url(&object))
    }
}
