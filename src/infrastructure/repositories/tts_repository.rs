use crate::domain::tts::{SynthesisOutput, SynthesisRequest, TtsError};
use async_trait::async_trait;

/// Repository for TTS synthesis operations.
/// Abstracts the underlying TTS provider (Google Cloud TTS, AWS Polly)
///
/// Implementations are responsible for:
/// - Translating the request into the provider's wire format
/// - Returning the audio together with one timepoint per SSML mark
/// - Converting provider time units to seconds
#[async_trait]
pub trait TtsRepository: Send + Sync {
    /// Synthesize SSML and report where each `<mark/>` landed in the audio.
    ///
    /// # Errors
    /// Returns error if the provider call fails or the response lacks audio
    /// or timepoints
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisOutput, TtsError>;
}
