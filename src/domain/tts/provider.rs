use serde::{Deserialize, Serialize};

/// The two provider protocols the pipeline speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Cloud TTS: one call returns audio plus SSML mark timepoints.
    Google,
    /// AWS Polly: audio and speech marks come from two separate calls.
    Polly,
}

impl ProviderKind {
    /// Select the provider from the shape of a voice ID.
    ///
    /// Google voice names are locale-qualified (`ja-JP-Neural2-B`); Polly
    /// voice IDs are bare names (`Takumi`).
    pub fn for_voice(voice_id: &str) -> Self {
        if voice_id.contains('-') {
            ProviderKind::Google
        } else {
            ProviderKind::Polly
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Google => "google",
            ProviderKind::Polly => "polly",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
