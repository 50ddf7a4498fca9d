use serde::{Deserialize, Serialize};

/// A provider-reported instant in synthesized audio, tied to an SSML mark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timepoint {
    #[serde(default)]
    pub mark_name: Option<String>,
    /// Omitted by providers when zero.
    #[serde(default)]
    pub time_seconds: f64,
}

impl Timepoint {
    pub fn new(mark_name: impl Into<String>, time_seconds: f64) -> Self {
        Self {
            mark_name: Some(mark_name.into()),
            time_seconds,
        }
    }
}

/// Everything a provider needs for one call.
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub ssml: String,
    pub voice_id: String,
    pub language_code: String,
    pub speed: f64,
    /// Pitch offset in semitones.
    pub pitch: Option<f64>,
}

/// Audio bytes plus the mark timepoints that locate each unit inside them.
#[derive(Debug, Clone)]
pub struct SynthesisOutput {
    pub audio: Vec<u8>,
    pub timepoints: Vec<Timepoint>,
}
