use super::batch::Batch;
use super::error::TtsError;
use super::model::{SynthesisOutput, SynthesisRequest};
use super::provider::ProviderKind;
use super::ssml;
use crate::infrastructure::repositories::TtsRepository;
use std::sync::Arc;

/// Routes batches to the provider their voice belongs to.
pub struct TtsService {
    google: Arc<dyn TtsRepository>,
    polly: Arc<dyn TtsRepository>,
}

impl TtsService {
    pub fn new(google: Arc<dyn TtsRepository>, polly: Arc<dyn TtsRepository>) -> Self {
        Self { google, polly }
    }

    fn repository(&self, kind: ProviderKind) -> &Arc<dyn TtsRepository> {
        match kind {
            ProviderKind::Google => &self.google,
            ProviderKind::Polly => &self.polly,
        }
    }

    /// Render and synthesize one batch.
    pub async fn synthesize_batch(&self, batch: &Batch) -> Result<SynthesisOutput, TtsError> {
        let start_time = std::time::Instant::now();
        let provider = ProviderKind::for_voice(&batch.voice_id);

        let request = SynthesisRequest {
            ssml: ssml::build(batch, provider),
            voice_id: batch.voice_id.clone(),
            language_code: batch.language_code.clone(),
            speed: batch.speed,
            pitch: batch.pitch,
        };

        tracing::info!(
            provider = %provider,
            voice = %batch.voice_id,
            language = %batch.language_code,
            speed = batch.speed,
            unit_count = batch.units.len(),
            "Synthesizing batch"
        );

        let output = self.repository(provider).synthesize(&request).await?;

        let duration = start_time.elapsed();
        let characters_count = batch.characters();
        let throughput_chars_per_sec = if duration.as_secs_f64() > 0.0 {
            characters_count as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        tracing::info!(
            provider = %provider,
            voice = %batch.voice_id,
            latency_ms = duration.as_millis(),
            characters_count = characters_count,
            unit_count = batch.units.len(),
            timepoint_count = output.timepoints.len(),
            audio_size_bytes = output.audio.len(),
            throughput_chars_per_sec = format!("{:.2}", throughput_chars_per_sec),
            "TTS synthesis completed"
        );

        Ok(output)
    }
}
