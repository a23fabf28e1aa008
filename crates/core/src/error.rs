//! Error types for the SMS Agent Stack domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for relay operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Server I/O ---
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Errors raised while constructing or driving the completion client.
///
/// HTTP outcomes of individual endpoint attempts are not errors; they are
/// classified into [`crate::provider::CompletionOutcome`].
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("HTTP client could not be built: {0}")]
    HttpClient(String),

    #[error("No endpoints configured for provider {0}")]
    NoEndpoints(String),
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Channel not configured: {0}")]
    NotConfigured(String),

    #[error("Message delivery failed to {channel}: {reason}")]
    DeliveryFailed { channel: String, reason: String },

    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),

    #[error("Request signature rejected: {0}")]
    InvalidSignature(String),
}

/// Retrieval failures. These never reach the end user: the completion
/// client logs them and continues without context.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("Document store has not been loaded yet")]
    NotInitialized,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::NotConfigured(
            "HYPERMODE_API_KEY is required".into(),
        ));
        assert!(err.to_string().contains("HYPERMODE_API_KEY"));
        assert!(err.to_string().starts_with("Provider error"));
    }

    #[test]
    fn channel_error_displays_correctly() {
        let err = ChannelError::DeliveryFailed {
            channel: "sms".into(),
            reason: "status 400".into(),
        };
        assert!(err.to_string().contains("sms"));
        assert!(err.to_string().contains("status 400"));
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("port taken"));
    }
}
