use super::provider::ProviderKind;

/// Failure of a single provider synthesis call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TtsError {
    #[error("{provider} request failed: {message}")]
    Provider {
        provider: ProviderKind,
        message: String,
    },
    #[error("{provider} returned no audio")]
    MissingAudio { provider: ProviderKind },
    #[error("{provider} returned no timepoints")]
    MissingTimepoints { provider: ProviderKind },
    #[error("{provider} returned an unreadable response: {message}")]
    InvalidResponse {
        provider: ProviderKind,
        message: String,
    },
}

impl TtsError {
    pub fn provider(provider: ProviderKind, message: impl Into<String>) -> Self {
        Self::Provider {
            provider,
            message: message.into(),
        }
    }

    pub fn invalid_response(provider: ProviderKind, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider,
            message: message.into(),
        }
    }
}
