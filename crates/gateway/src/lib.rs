//! HTTP gateway for the SMS Agent Stack.
//!
//! Receives Twilio and Slack webhooks, runs each message through the
//! completion pipeline, and exposes small status and knowledge-base
//! endpoints for operators.
//!
//! Built on Axum.

mod handlers;

pub use handlers::{NOT_CONFIGURED_REPLY, SMS_ERROR_REPLY};

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use smsagent_channels::{SlackChannel, SmsChannel};
use smsagent_config::AppConfig;
use smsagent_core::channel::Channel;
use smsagent_knowledge::KnowledgeBase;
use smsagent_providers::CompletionClient;
use std::sync::Arc;
use tracing::{info, warn};

/// Request bodies above this size are rejected.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared application state, built once at startup.
pub struct AppState {
    pub config: AppConfig,
    pub knowledge: Arc<KnowledgeBase>,
    /// `None` when no API key is configured
    pub client: Option<Arc<CompletionClient>>,
    pub sms: Arc<SmsChannel>,
    pub slack: Arc<SlackChannel>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Load the knowledge base and build the client and channels.
    ///
    /// A missing API key is not fatal: the gateway still starts and answers
    /// with a fixed "not configured" reply.
    pub fn from_config(config: AppConfig) -> Self {
        let knowledge = Arc::new(KnowledgeBase::from_config(&config.knowledge));
        info!(
            documents = knowledge.store().len(),
            directory = %config.knowledge.documents_dir.display(),
            "Knowledge base loaded"
        );

        let client = match CompletionClient::new(&config.provider, config.models.clone()) {
            Ok(client) => {
                info!(
                    provider = %client.name(),
                    endpoints = client.endpoints().len(),
                    "Completion client ready"
                );
                Some(Arc::new(client.with_context(knowledge.clone())))
            }
            Err(e) => {
                warn!(error = %e, "Completion client unavailable");
                None
            }
        };

        let sms = Arc::new(SmsChannel::new(config.sms.clone()));
        if !sms.is_configured() {
            warn!("Twilio credentials incomplete; outbound SMS disabled");
        }

        let slack = Arc::new(SlackChannel::new(config.slack.clone()));
        if !slack.has_signing_secret() {
            warn!("SLACK_SIGNING_SECRET not set; Slack request signatures will not be verified");
        }

        Self::new(config, knowledge, client, sms, slack)
    }

    pub fn new(
        config: AppConfig,
        knowledge: Arc<KnowledgeBase>,
        client: Option<Arc<CompletionClient>>,
        sms: Arc<SmsChannel>,
        slack: Arc<SlackChannel>,
    ) -> Self {
        Self {
            config,
            knowledge,
            client,
            sms,
            slack,
        }
    }
}

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(handlers::health))
        .route("/health", get(handlers::health))
        .route("/sms", post(handlers::sms_webhook))
        .route("/respond", post(handlers::send_sms))
        .route("/slack/events", post(handlers::slack_events))
        .route("/slack/status", get(handlers::slack_status))
        .route("/knowledge/status", get(handlers::knowledge_status))
        .route("/knowledge/reload", post(handlers::knowledge_reload))
        .route("/knowledge/search", get(handlers::knowledge_search))
        .route("/provider/test", get(handlers::provider_test))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> smsagent_core::Result<()> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let state = Arc::new(AppState::from_config(config));
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
