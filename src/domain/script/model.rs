use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub const DEFAULT_SPEED: f64 = 1.0;

fn default_speed() -> f64 {
    DEFAULT_SPEED
}

/// Speed multiplier actually applied: non-finite or non-positive values
/// fall back to [`DEFAULT_SPEED`].
pub fn effective_speed(speed: f64) -> f64 {
    if speed.is_finite() && speed > 0.0 {
        speed
    } else {
        DEFAULT_SPEED
    }
}

/// One entry of a lesson script.
///
/// Every consumer matches on all four variants; there is no catch-all
/// representation for unknown unit types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ScriptUnit {
    /// Spoken in the learner's native language.
    Narration { text: String, voice_id: String },
    /// Spoken in the language being learned.
    Target {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reading: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        translation: Option<String>,
        voice_id: String,
        #[serde(default = "default_speed")]
        speed: f64,
        /// Pitch offset in semitones.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pitch: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        phrase_context: Option<String>,
    },
    Pause { seconds: f64 },
    Marker { label: String },
}

impl ScriptUnit {
    pub fn narration(text: impl Into<String>, voice_id: impl Into<String>) -> Self {
        Self::Narration {
            text: text.into(),
            voice_id: voice_id.into(),
        }
    }

    pub fn target(text: impl Into<String>, voice_id: impl Into<String>, speed: f64) -> Self {
        Self::Target {
            text: text.into(),
            reading: None,
            translation: None,
            voice_id: voice_id.into(),
            speed,
            pitch: None,
            phrase_context: None,
        }
    }

    pub fn pause(seconds: f64) -> Self {
        Self::Pause { seconds }
    }

    pub fn marker(label: impl Into<String>) -> Self {
        Self::Marker {
            label: label.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Narration { .. } => "narration",
            Self::Target { .. } => "target",
            Self::Pause { .. } => "pause",
            Self::Marker { .. } => "marker",
        }
    }
}

/// A dialogue line the script is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exchange {
    pub order: u32,
    pub speaker_name: String,
    pub speaker_voice_id: String,
    /// Line in the target language.
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading: Option<String>,
    /// Line in the learner's native language.
    pub translation: String,
}

impl Exchange {
    /// Whether the exchange has anything to drill.
    pub fn is_contentful(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Decode script units from loosely typed JSON, skipping entries that do not
/// describe one of the known unit types.
pub fn decode_units(values: Vec<JsonValue>) -> Vec<ScriptUnit> {
    let total = values.len();
    let units: Vec<ScriptUnit> = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<ScriptUnit>(value) {
            Ok(unit) => Some(unit),
            Err(e) => {
                tracing::warn!(
                    index = index,
                    error = %e,
                    "Skipping malformed script unit"
                );
                None
            }
        })
        .collect();

    if units.len() != total {
        tracing::info!(
            decoded = units.len(),
            skipped = total - units.len(),
            "Script units decoded with skips"
        );
    }

    units
}
