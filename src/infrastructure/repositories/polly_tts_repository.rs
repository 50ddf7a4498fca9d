use super::tts_repository::TtsRepository;
use crate::domain::tts::language::is_voice_neural_compatible;
use crate::domain::tts::{ProviderKind, SynthesisOutput, SynthesisRequest, Timepoint, TtsError};
use async_trait::async_trait;
use aws_sdk_polly::{
    types::{Engine, OutputFormat, SpeechMarkType, TextType, VoiceId},
    Client as PollyClient,
};
use serde::Deserialize;
use std::sync::Arc;

const PROVIDER: ProviderKind = ProviderKind::Polly;

/// One line of Polly's newline-delimited speech mark output.
#[derive(Debug, Deserialize)]
struct SpeechMark {
    #[serde(rename = "type")]
    kind: String,
    /// Milliseconds from the start of the audio.
    time: f64,
    #[serde(default)]
    value: Option<String>,
}

/// AWS Polly implementation of TTS repository
///
/// Polly cannot return audio and marks together, so every synthesis is two
/// calls against the same SSML: one for MP3, one for JSON speech marks.
pub struct PollyTtsRepository {
    polly_client: Arc<PollyClient>,
    prefer_neural: bool,
}

impl PollyTtsRepository {
    pub fn new(polly_client: Arc<PollyClient>, prefer_neural: bool) -> Self {
        Self {
            polly_client,
            prefer_neural,
        }
    }

    fn engine_for(&self, voice: &str) -> Engine {
        if self.prefer_neural && is_voice_neural_compatible(voice) {
            Engine::Neural
        } else {
            Engine::Standard
        }
    }

    /// Request the MP3 rendering of the SSML
    async fn call_audio(&self, request: &SynthesisRequest, engine: Engine) -> Result<Vec<u8>, TtsError> {
        let result = self
            .polly_client
            .synthesize_speech()
            .text(&request.ssml)
            .text_type(TextType::Ssml)
            .voice_id(VoiceId::from(request.voice_id.as_str()))
            .output_format(OutputFormat::Mp3)
            .engine(engine.clone())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = ?e,
                    error_display = %e,
                    voice_id = %request.voice_id,
                    engine = ?engine,
                    ssml_length = request.ssml.len(),
                    "AWS Polly synthesize_speech (audio) failed"
                );
                TtsError::provider(PROVIDER, format!("audio request failed: {}", e))
            })?;

        let audio_stream = result.audio_stream.collect().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to collect audio stream from Polly response");
            TtsError::provider(PROVIDER, format!("failed to read audio stream: {}", e))
        })?;

        Ok(audio_stream.into_bytes().to_vec())
    }

    /// Request SSML speech marks for the same input
    async fn call_marks(&self, request: &SynthesisRequest, engine: Engine) -> Result<String, TtsError> {
        let result = self
            .polly_client
            .synthesize_speech()
            .text(&request.ssml)
            .text_type(TextType::Ssml)
            .voice_id(VoiceId::from(request.voice_id.as_str()))
            .output_format(OutputFormat::Json)
            .speech_mark_types(SpeechMarkType::Ssml)
            .engine(engine.clone())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = ?e,
                    error_display = %e,
                    voice_id = %request.voice_id,
                    engine = ?engine,
                    "AWS Polly synthesize_speech (speech marks) failed"
                );
                TtsError::provider(PROVIDER, format!("speech mark request failed: {}", e))
            })?;

        let marks_stream = result.audio_stream.collect().await.map_err(|e| {
            TtsError::provider(PROVIDER, format!("failed to read speech mark stream: {}", e))
        })?;

        String::from_utf8(marks_stream.into_bytes().to_vec())
            .map_err(|e| TtsError::invalid_response(PROVIDER, format!("speech marks are not UTF-8: {}", e)))
    }
}

/// Keep only `ssml` marks, converting milliseconds to seconds.
///
/// Word and sentence marks, blank lines and unparseable lines are dropped.
pub fn parse_speech_marks(raw: &str) -> Vec<Timepoint> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<SpeechMark>(line) {
            Ok(mark) => Some(mark),
            Err(e) => {
                tracing::warn!(error = %e, line = line, "Skipping unreadable speech mark");
                None
            }
        })
        .filter(|mark| mark.kind == "ssml")
        .map(|mark| Timepoint {
            mark_name: mark.value,
            time_seconds: mark.time / 1000.0,
        })
        .collect()
}

#[async_trait]
impl TtsRepository for PollyTtsRepository {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisOutput, TtsError> {
        let engine = self.engine_for(&request.voice_id);
        if request.pitch.is_some() {
            tracing::debug!(
                voice_id = %request.voice_id,
                "Pitch offsets are not applied for Polly voices"
            );
        }

        tracing::info!(
            voice_id = %request.voice_id,
            engine = ?engine,
            output_format = "Mp3+Json",
            ssml_length = request.ssml.len(),
            ssml_preview = &request.ssml[..floor_char_boundary(&request.ssml, 200)],
            "Calling AWS Polly synthesize_speech"
        );

        let audio = self.call_audio(request, engine.clone()).await?;
        if audio.is_empty() {
            return Err(TtsError::MissingAudio { provider: PROVIDER });
        }

        let raw_marks = self.call_marks(request, engine).await?;
        if raw_marks.trim().is_empty() {
            return Err(TtsError::MissingTimepoints { provider: PROVIDER });
        }

        let timepoints = parse_speech_marks(&raw_marks);
        if timepoints.is_empty() {
            return Err(TtsError::MissingTimepoints { provider: PROVIDER });
        }

        tracing::debug!(
            audio_size = audio.len(),
            timepoint_count = timepoints.len(),
            "Polly audio and speech marks collected"
        );

        Ok(SynthesisOutput { audio, timepoints })
    }
}

fn floor_char_boundary(text: &str, max: usize) -> usize {
    let mut end = text.len().min(max);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    end
}
