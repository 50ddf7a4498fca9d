use super::tts_repository::TtsRepository;
use crate::domain::tts::language::locale_for_voice;
use crate::domain::tts::{ProviderKind, SynthesisOutput, SynthesisRequest, Timepoint, TtsError};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

pub const DEFAULT_GOOGLE_TTS_ENDPOINT: &str =
    "https://texttospeech.googleapis.com/v1beta1/text:synthesize";

const PROVIDER: ProviderKind = ProviderKind::Google;
const MIN_SPEAKING_RATE: f64 = 0.25;
const MAX_SPEAKING_RATE: f64 = 4.0;
const MAX_PITCH_SEMITONES: f64 = 20.0;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeBody<'a> {
    input: SsmlInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig,
    enable_time_pointing: [&'static str; 1],
}

#[derive(Debug, Serialize)]
struct SsmlInput<'a> {
    ssml: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: String,
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
    speaking_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pitch: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    #[serde(default)]
    audio_content: Option<String>,
    #[serde(default)]
    timepoints: Vec<Timepoint>,
}

/// Google Cloud Text-to-Speech over its REST API.
///
/// Marks come back natively as `timepoints` when time pointing is enabled,
/// so one request yields both audio and marks.
pub struct GoogleTtsRepository {
    api_key: String,
    endpoint: String,
    http_client: reqwest::Client,
}

impl GoogleTtsRepository {
    pub fn new(api_key: String, endpoint: String) -> Self {
        Self {
            api_key,
            endpoint,
            http_client: reqwest::Client::new(),
        }
    }

    fn body<'a>(request: &'a SynthesisRequest) -> SynthesizeBody<'a> {
        SynthesizeBody {
            input: SsmlInput { ssml: &request.ssml },
            voice: VoiceSelection {
                language_code: locale_for_voice(&request.voice_id)
                    .unwrap_or_else(|| request.language_code.clone()),
                name: &request.voice_id,
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
                speaking_rate: request.speed.clamp(MIN_SPEAKING_RATE, MAX_SPEAKING_RATE),
                pitch: request
                    .pitch
                    .map(|p| p.clamp(-MAX_PITCH_SEMITONES, MAX_PITCH_SEMITONES)),
            },
            enable_time_pointing: ["SSML_MARK"],
        }
    }
}

fn decode_response(response: SynthesizeResponse) -> Result<SynthesisOutput, TtsError> {
    let encoded = response
        .audio_content
        .filter(|content| !content.is_empty())
        .ok_or(TtsError::MissingAudio { provider: PROVIDER })?;

    let audio = BASE64
        .decode(encoded.as_bytes())
        .map_err(|e| TtsError::invalid_response(PROVIDER, format!("audioContent is not base64: {}", e)))?;

    if response.timepoints.is_empty() {
        return Err(TtsError::MissingTimepoints { provider: PROVIDER });
    }

    Ok(SynthesisOutput {
        audio,
        timepoints: response.timepoints,
    })
}

#[async_trait]
impl TtsRepository for GoogleTtsRepository {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisOutput, TtsError> {
        let body = Self::body(request);

        tracing::info!(
            voice_id = %request.voice_id,
            language_code = %body.voice.language_code,
            speaking_rate = body.audio_config.speaking_rate,
            pitch = ?body.audio_config.pitch,
            ssml_length = request.ssml.len(),
            "Calling Google text:synthesize"
        );

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("X-Goog-Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, voice_id = %request.voice_id, "Google TTS request failed");
                TtsError::provider(PROVIDER, e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!(
                status = %status,
                voice_id = %request.voice_id,
                body = %error_text,
                "Google TTS returned an error status"
            );
            return Err(TtsError::provider(
                PROVIDER,
                format!("status {}: {}", status, error_text),
            ));
        }

        let parsed: SynthesizeResponse = response
            .json()
            .await
            .map_err(|e| TtsError::invalid_response(PROVIDER, e.to_string()))?;

        decode_response(parsed)
    }
}
