//! Completion provider types — the request payload and classified outcomes.
//!
//! A [`CompletionRequest`] is built fresh for every inbound message. Each
//! endpoint attempt is classified exactly once into a [`CompletionOutcome`];
//! call sites branch on the enum, never on raw status codes.

use serde::{Deserialize, Serialize};
use crate::message::Message;

/// JSON body for `POST <base>/chat/completions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Provider model identifier (already resolved from the tier table)
    pub model: String,

    /// System instruction followed by the enriched user turn
    pub messages: Vec<Message>,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Temperature (0.0 = deterministic, 2.0 = very creative)
    pub temperature: f32,

    #[serde(default)]
    pub presence_penalty: f32,

    #[serde(default)]
    pub frequency_penalty: f32,

    /// Always false: replies are relayed as a single message
    #[serde(default)]
    pub stream: bool,
}

/// The classified result of one endpoint attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// HTTP 200 with at least one usable choice
    Success(String),
    /// HTTP 401
    AuthError,
    /// HTTP 429
    RateLimited,
    /// HTTP 5xx
    ServerError { status: u16, detail: String },
    /// Timeout, refused connection, TLS failure
    TransportError(String),
    /// Any other status, or a 200 whose body had no usable choice
    Unrecognized { status: u16, detail: String },
}

impl CompletionOutcome {
    /// Whether this outcome ends the endpoint loop.
    ///
    /// Success, authentication failures and rate limiting are final for the
    /// current call; everything else moves on to the next endpoint.
    pub fn is_conclusive(&self) -> bool {
        matches!(
            self,
            CompletionOutcome::Success(_)
                | CompletionOutcome::AuthError
                | CompletionOutcome::RateLimited
        )
    }

    /// Short label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CompletionOutcome::Success(_) => "success",
            CompletionOutcome::AuthError => "auth_error",
            CompletionOutcome::RateLimited => "rate_limited",
            CompletionOutcome::ServerError { .. } => "server_error",
            CompletionOutcome::TransportError(_) => "transport_error",
            CompletionOutcome::Unrecognized { .. } => "unrecognized",
        }
    }
}

/// Result of a connectivity probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connected,
    AuthenticationFailed,
    ConnectionFailed,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionReport {
    pub status: ConnectionStatus,

    /// The endpoint that answered (connected / authentication_failed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectionReport {
    pub fn connected(endpoint: impl Into<String>) -> Self {
        Self {
            status: ConnectionStatus::Connected,
            endpoint: Some(endpoint.into()),
            error: None,
        }
    }

    pub fn failed(status: ConnectionStatus, endpoint: Option<String>, error: impl Into<String>) -> Self {
        Self {
            status,
            endpoint,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_openai_shape() {
        let req = CompletionRequest {
            model: "gpt-4o-mini".into(),
            messages: vec![Message::system("sys"), Message::user("hi")],
            max_tokens: 150,
            temperature: 0.7,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
            stream: false,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["max_tokens"], 150);
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn conclusive_outcomes() {
        assert!(CompletionOutcome::Success("ok".into()).is_conclusive());
        assert!(CompletionOutcome::AuthError.is_conclusive());
        assert!(CompletionOutcome::RateLimited.is_conclusive());
        assert!(!CompletionOutcome::ServerError { status: 500, detail: String::new() }.is_conclusive());
        assert!(!CompletionOutcome::TransportError("timeout".into()).is_conclusive());
        assert!(!CompletionOutcome::Unrecognized { status: 404, detail: String::new() }.is_conclusive());
    }

    #[test]
    fn report_omits_empty_fields() {
        let json = serde_json::to_string(&ConnectionReport::connected("https://x/chat/completions")).unwrap();
        assert!(json.contains("\"connected\""));
        assert!(!json.contains("error"));
    }
}
