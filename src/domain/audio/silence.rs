use super::error::AudioError;
use crate::infrastructure::media::MediaToolkit;
use moka::future::Cache;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Rendered silence clips keyed by duration.
///
/// A clip is rendered the first time its duration is asked for and shared
/// afterwards. The cache owns the directory the clips live in, so it must
/// outlive every concat that references them: one cache per run, or one per
/// group of sibling renders.
#[derive(Clone)]
pub struct SilenceCache {
    media: Arc<dyn MediaToolkit>,
    dir: Arc<TempDir>,
    clips: Cache<u64, Arc<PathBuf>>,
}

impl SilenceCache {
    pub fn new(media: Arc<dyn MediaToolkit>) -> Result<Self, AudioError> {
        let dir = tempfile::Builder::new().prefix("silence-").tempdir()?;
        Ok(Self {
            media,
            dir: Arc::new(dir),
            clips: Cache::builder().max_capacity(256).build(),
        })
    }

    /// Path of a clip holding `duration_ms` of silence.
    pub async fn clip(&self, duration_ms: u64) -> Result<Arc<PathBuf>, AudioError> {
        let media = self.media.clone();
        let path = self.dir.path().join(format!("silence_{}ms.wav", duration_ms));

        self.clips
            .try_get_with(duration_ms, async move {
                tracing::debug!(duration_ms = duration_ms, "Rendering silence clip");
                media.render_silence(duration_ms, &path).await?;
                Ok::<_, crate::infrastructure::media::MediaError>(Arc::new(path))
            })
            .await
            .map_err(AudioError::Silence)
    }
}
