use crate::domain::tts::TtsError;
use crate::infrastructure::media::MediaError;
use crate::infrastructure::repositories::StorageError;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("Synthesis of batch {batch_index} failed: {source}")]
    Synthesis {
        batch_index: usize,
        #[source]
        source: TtsError,
    },
    #[error("Script has nothing to render")]
    NothingToRender,
    #[error("Provider returned no timepoint for {mark_name}")]
    MissingMark { mark_name: String },
    #[error("Transcoding failed: {0}")]
    Media(#[from] MediaError),
    #[error("Silence rendering failed: {0}")]
    Silence(Arc<MediaError>),
    #[error("Upload failed: {0}")]
    Storage(#[from] StorageError),
    #[error("Audio workspace error: {0}")]
    Io(#[from] std::io::Error),
}
