//! Publisher error types.

use eventmap_providers::ProviderError;
use thiserror::Error;

use crate::sink::SinkError;

/// Result type for publisher operations.
pub type PublishResult<T> = Result<T, PublishError>;

/// Errors that abort a run. Nothing is published when one occurs.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Missing or malformed configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required upstream (the event-type dictionary) could not be read.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The feed could not be encoded.
    #[error("failed to serialize feed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The feed or an asset could not be stored.
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    /// Local file access failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PublishError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failure() {
        assert_eq!(
            PublishError::config("MAX_PAGES must be a number").to_string(),
            "configuration error: MAX_PAGES must be a number"
        );
        let provider: PublishError = ProviderError::server("boom").into();
        assert!(provider.to_string().starts_with("provider error:"));
    }
}
