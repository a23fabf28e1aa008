//! Completion client with ordered endpoint failover.
//!
//! One inbound message becomes one [`CompletionRequest`]. The request is sent
//! to each configured endpoint in order, every attempt bounded by the same
//! timeout and classified into a [`CompletionOutcome`]. The first conclusive
//! outcome (success, 401, 429) ends the loop; anything else moves on.
//!
//! [`CompletionClient::generate_response`] always returns reply text. Every
//! failure is mapped to a fixed user-facing message.

use futures::FutureExt;
use serde::Deserialize;
use smsagent_config::{ModelTable, ProviderConfig};
use smsagent_core::error::ProviderError;
use smsagent_core::message::Message;
use smsagent_core::provider::{
    CompletionOutcome, CompletionRequest, ConnectionReport, ConnectionStatus,
};
use smsagent_core::tier::ModelTier;
use smsagent_knowledge::ContextSource;
use smsagent_knowledge::context::{CONTEXT_HEADER, truncate_chars};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::selector::select_model;

pub const AUTH_ERROR_REPLY: &str =
    "Sorry, there's an authentication issue with the AI service. Please contact support.";

pub const RATE_LIMITED_REPLY: &str =
    "The AI service is busy right now. Please try again in a moment.";

pub const CONNECTION_FAILED_REPLY: &str =
    "Sorry, I'm having trouble connecting to the AI service right now. Please try again later.";

pub const TECHNICAL_DIFFICULTIES_REPLY: &str =
    "Sorry, I'm experiencing technical difficulties. Please try again later.";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant reachable by SMS and Slack. \
Keep replies concise and friendly, a few short sentences at most. \
When relevant information from the knowledge base is provided, use it naturally \
without mentioning where it came from.";

/// Response bodies are cut to this many characters before logging.
const LOG_BODY_CHARS: usize = 200;

/// Sampling parameters copied into every request.
#[derive(Debug, Clone, Copy, PartialEq)]
struct GenerationSettings {
    max_tokens: u32,
    temperature: f32,
    presence_penalty: f32,
    frequency_penalty: f32,
}

/// Client for an OpenAI-compatible chat-completions API.
pub struct CompletionClient {
    name: String,
    api_key: String,
    endpoints: Vec<String>,
    timeout: Duration,
    settings: GenerationSettings,
    system_prompt: String,
    models: ModelTable,
    context: Option<Arc<dyn ContextSource>>,
    client: reqwest::Client,
}

impl CompletionClient {
    /// Build a client from provider settings and the tier table.
    ///
    /// Fails when no API key is configured or the endpoint list is empty.
    pub fn new(config: &ProviderConfig, models: ModelTable) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                ProviderError::NotConfigured(format!(
                    "API key for provider '{}' is not set (HYPERMODE_API_KEY)",
                    config.name
                ))
            })?
            .to_string();

        let endpoints = config.endpoints();
        if endpoints.is_empty() {
            return Err(ProviderError::NoEndpoints(config.name.clone()));
        }

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| ProviderError::HttpClient(e.to_string()))?;

        Ok(Self {
            name: config.name.clone(),
            api_key,
            endpoints,
            timeout,
            settings: GenerationSettings {
                max_tokens: config.max_tokens,
                temperature: config.temperature,
                presence_penalty: config.presence_penalty,
                frequency_penalty: config.frequency_penalty,
            },
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            models,
            context: None,
            client,
        })
    }

    /// Attach a knowledge source used to enrich prompts.
    pub fn with_context(mut self, source: Arc<dyn ContextSource>) -> Self {
        self.context = Some(source);
        self
    }

    /// Override the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full endpoint URLs in the order they are tried.
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Produce a reply for `message`. Never fails.
    ///
    /// `model_override` may name a tier (`fast`, `premium`, ...) or a raw
    /// model id; when absent the tier is chosen from the message.
    pub async fn generate_response(
        &self,
        message: &str,
        sender_id: &str,
        model_override: Option<&str>,
    ) -> String {
        match AssertUnwindSafe(self.run(message, sender_id, model_override))
            .catch_unwind()
            .await
        {
            Ok(reply) => reply,
            Err(_) => {
                error!(provider = %self.name, "Completion pipeline panicked");
                TECHNICAL_DIFFICULTIES_REPLY.to_string()
            }
        }
    }

    async fn run(&self, message: &str, sender_id: &str, model_override: Option<&str>) -> String {
        let request = self.build_request(message, sender_id, model_override);

        match self.complete(&request).await {
            Some((_, CompletionOutcome::Success(text))) => text,
            Some((endpoint, CompletionOutcome::AuthError)) => {
                error!(endpoint = %endpoint, "Completion API rejected the API key");
                AUTH_ERROR_REPLY.to_string()
            }
            Some((endpoint, CompletionOutcome::RateLimited)) => {
                warn!(endpoint = %endpoint, "Completion API rate limited the request");
                RATE_LIMITED_REPLY.to_string()
            }
            Some((endpoint, other)) => {
                // complete() only returns conclusive outcomes
                error!(endpoint = %endpoint, outcome = other.kind(), "Unexpected final outcome");
                TECHNICAL_DIFFICULTIES_REPLY.to_string()
            }
            None => {
                error!(
                    provider = %self.name,
                    endpoints = self.endpoints.len(),
                    "All completion endpoints failed"
                );
                CONNECTION_FAILED_REPLY.to_string()
            }
        }
    }

    /// Resolve the model id for a message and optional override.
    pub fn resolve_model(&self, message: &str, model_override: Option<&str>) -> String {
        match model_override.map(str::trim).filter(|o| !o.is_empty()) {
            Some(name) => match name.parse::<ModelTier>() {
                Ok(tier) => self.models.model_for(tier).to_string(),
                Err(_) => name.to_string(),
            },
            None => self.models.model_for(select_model(message)).to_string(),
        }
    }

    /// Build the request body: system instruction plus the enriched user turn.
    pub fn build_request(
        &self,
        message: &str,
        sender_id: &str,
        model_override: Option<&str>,
    ) -> CompletionRequest {
        let model = self.resolve_model(message, model_override);
        let context = self.gather_context(message);

        debug!(
            model = %model,
            has_context = context.is_some(),
            "Built completion request"
        );

        CompletionRequest {
            model,
            messages: vec![
                Message::system(&self.system_prompt),
                Message::user(user_content(message, sender_id, context.as_deref())),
            ],
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            presence_penalty: self.settings.presence_penalty,
            frequency_penalty: self.settings.frequency_penalty,
            stream: false,
        }
    }

    /// Knowledge context for `message`. Any failure means no context.
    fn gather_context(&self, message: &str) -> Option<String> {
        let source = self.context.as_ref()?;

        match std::panic::catch_unwind(AssertUnwindSafe(|| source.build_context(message))) {
            Ok(Ok(context)) => context,
            Ok(Err(e)) => {
                warn!(error = %e, "Knowledge retrieval failed, continuing without context");
                None
            }
            Err(_) => {
                warn!("Knowledge retrieval panicked, continuing without context");
                None
            }
        }
    }

    /// Walk the endpoint list until an outcome is conclusive.
    ///
    /// Returns the endpoint and its outcome, or `None` when every endpoint
    /// failed inconclusively.
    async fn complete(&self, request: &CompletionRequest) -> Option<(&str, CompletionOutcome)> {
        let total = self.endpoints.len();

        for (i, endpoint) in self.endpoints.iter().enumerate() {
            info!(
                endpoint = %endpoint,
                attempt = i + 1,
                total,
                model = %request.model,
                "Trying completion endpoint"
            );

            let outcome = self.attempt(endpoint, request).await;
            if outcome.is_conclusive() {
                info!(endpoint = %endpoint, outcome = outcome.kind(), "Completion endpoint answered");
                return Some((endpoint.as_str(), outcome));
            }

            warn!(
                endpoint = %endpoint,
                outcome = outcome.kind(),
                detail = %describe(&outcome),
                "Completion endpoint failed, trying next"
            );
        }

        None
    }

    /// One bounded attempt against one endpoint.
    async fn attempt(&self, endpoint: &str, request: &CompletionRequest) -> CompletionOutcome {
        match tokio::time::timeout(self.timeout, self.send(endpoint, request)).await {
            Ok(outcome) => outcome,
            Err(_) => CompletionOutcome::TransportError(format!(
                "timed out after {}ms",
                self.timeout.as_millis()
            )),
        }
    }

    async fn send(&self, endpoint: &str, request: &CompletionRequest) -> CompletionOutcome {
        let response = match self
            .client
            .post(endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return CompletionOutcome::TransportError(e.to_string()),
        };

        let status = response.status().as_u16();
        match response.text().await {
            Ok(body) => classify(status, &body),
            Err(e) => CompletionOutcome::TransportError(e.to_string()),
        }
    }

    /// Probe the endpoints with a tiny request.
    ///
    /// Connected on the first 200, stops on 401 or 429, otherwise reports the
    /// last failure.
    pub async fn test_connection(&self) -> ConnectionReport {
        let request = CompletionRequest {
            model: self.models.model_for(ModelTier::Fast).to_string(),
            messages: vec![Message::user("Hello")],
            max_tokens: 10,
            temperature: self.settings.temperature,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
            stream: false,
        };

        match AssertUnwindSafe(self.probe(&request)).catch_unwind().await {
            Ok(report) => report,
            Err(_) => {
                error!(provider = %self.name, "Connection probe panicked");
                ConnectionReport::failed(
                    ConnectionStatus::Error,
                    None,
                    "internal error during connection test",
                )
            }
        }
    }

    async fn probe(&self, request: &CompletionRequest) -> ConnectionReport {
        let mut last_error = None;

        for endpoint in &self.endpoints {
            match self.attempt(endpoint, request).await {
                // A 200 proves connectivity even if the short reply was empty.
                CompletionOutcome::Success(_) | CompletionOutcome::Unrecognized { status: 200, .. } => {
                    info!(endpoint = %endpoint, "Provider connection OK");
                    return ConnectionReport::connected(endpoint.as_str());
                }
                CompletionOutcome::AuthError => {
                    return ConnectionReport::failed(
                        ConnectionStatus::AuthenticationFailed,
                        Some(endpoint.clone()),
                        "authentication failed (HTTP 401)",
                    );
                }
                CompletionOutcome::RateLimited => {
                    return ConnectionReport::failed(
                        ConnectionStatus::Error,
                        Some(endpoint.clone()),
                        "rate limited (HTTP 429)",
                    );
                }
                other => {
                    warn!(endpoint = %endpoint, outcome = other.kind(), "Probe attempt failed");
                    last_error = Some(format!("{endpoint}: {}", describe(&other)));
                }
            }
        }

        ConnectionReport::failed(
            ConnectionStatus::ConnectionFailed,
            None,
            last_error.unwrap_or_else(|| "no endpoints configured".into()),
        )
    }
}

/// The user turn: sender attribution, the message, and optional context.
pub fn user_content(message: &str, sender_id: &str, context: Option<&str>) -> String {
    match context {
        Some(context) => {
            format!("User ({sender_id}) asks: {message}\n\n{CONTEXT_HEADER}\n{context}")
        }
        None => format!("User ({sender_id}) asks: {message}"),
    }
}

/// Classify one HTTP response.
pub fn classify(status: u16, body: &str) -> CompletionOutcome {
    match status {
        200 => match first_choice(body) {
            Some(text) => CompletionOutcome::Success(text),
            None => CompletionOutcome::Unrecognized {
                status,
                detail: format!("no usable choice: {}", truncate_chars(body, LOG_BODY_CHARS)),
            },
        },
        401 => CompletionOutcome::AuthError,
        429 => CompletionOutcome::RateLimited,
        500..=599 => CompletionOutcome::ServerError {
            status,
            detail: truncate_chars(body, LOG_BODY_CHARS),
        },
        _ => CompletionOutcome::Unrecognized {
            status,
            detail: truncate_chars(body, LOG_BODY_CHARS),
        },
    }
}

/// Content of the first choice, unmodified, if present and non-blank.
fn first_choice(body: &str) -> Option<String> {
    let response: ApiResponse = serde_json::from_str(body).ok()?;
    let content = response.choices.into_iter().next()?.message.content?;
    (!content.trim().is_empty()).then_some(content)
}

fn describe(outcome: &CompletionOutcome) -> String {
    match outcome {
        CompletionOutcome::Success(_) => "success".into(),
        CompletionOutcome::AuthError => "authentication failed (HTTP 401)".into(),
        CompletionOutcome::RateLimited => "rate limited (HTTP 429)".into(),
        CompletionOutcome::ServerError { status, detail } => format!("HTTP {status}: {detail}"),
        CompletionOutcome::Unrecognized { status, detail } => format!("HTTP {status}: {detail}"),
        CompletionOutcome::TransportError(e) => e.clone(),
    }
}

// --- API types ---

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
}

#[derive(Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Deserialize)]
struct ApiMessage {
    content: Option<String>,
}
