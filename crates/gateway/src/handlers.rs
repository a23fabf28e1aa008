//! Route handlers.

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use smsagent_channels::{SlackEvent, TwilioInbound, twiml_message};
use smsagent_core::channel::{Channel, ChannelMessage};
use smsagent_core::provider::{ConnectionReport, ConnectionStatus};
use smsagent_knowledge::KnowledgeStatus;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::SharedState;

pub const NOT_CONFIGURED_REPLY: &str =
    "Sorry, the AI assistant is not properly configured. Please contact support.";

pub const SMS_ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again.";

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn twiml(text: &str) -> Response {
    (
        [(header::CONTENT_TYPE, "application/xml")],
        twiml_message(text),
    )
        .into_response()
}

// --- Health ---

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    message: &'static str,
    status: &'static str,
    version: &'static str,
}

pub(crate) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "SMS Agent Stack is running!",
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// --- SMS ---

pub(crate) async fn sms_webhook(
    State(state): State<SharedState>,
    form: Result<Form<TwilioInbound>, FormRejection>,
) -> Response {
    let inbound = match form {
        Ok(Form(inbound)) => state.sms.parse_inbound(inbound),
        Err(rejection) => {
            warn!(error = %rejection, "Unreadable SMS webhook");
            return twiml(SMS_ERROR_REPLY);
        }
    };

    let message = match inbound {
        Ok(message) => message,
        Err(e) => {
            warn!(error = %e, "Rejected SMS webhook");
            return twiml(SMS_ERROR_REPLY);
        }
    };

    info!(
        from = %message.sender_id,
        body_len = message.content.len(),
        "SMS received"
    );

    let Some(client) = state.client.as_ref() else {
        error!("Completion client not configured; cannot answer SMS");
        return twiml(NOT_CONFIGURED_REPLY);
    };

    let reply = client
        .generate_response(&message.content, &message.sender_id, None)
        .await;
    info!(to = %message.sender_id, reply_len = reply.len(), "SMS reply ready");

    twiml(&reply)
}

#[derive(Deserialize)]
pub(crate) struct OutboundSms {
    to: String,
    message: String,
}

pub(crate) async fn send_sms(
    State(state): State<SharedState>,
    Json(request): Json<OutboundSms>,
) -> Response {
    if !state.sms.is_configured() {
        return detail(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Twilio credentials not configured",
        );
    }

    match state.sms.send_sms(&request.to, &request.message).await {
        Ok(sid) => Json(json!({ "status": "sent", "message_sid": sid })).into_response(),
        Err(e) => {
            error!(to = %request.to, error = %e, "Outbound SMS failed");
            detail(StatusCode::INTERNAL_SERVER_ERROR, "Failed to send SMS")
        }
    }
}

// --- Slack ---

pub(crate) async fn slack_events(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(e) = state.slack.verify_signature(
        header_str(&headers, "x-slack-request-timestamp"),
        header_str(&headers, "x-slack-signature"),
        &body,
    ) {
        warn!(error = %e, "Rejected Slack request");
        return detail(StatusCode::UNAUTHORIZED, "invalid request signature");
    }

    let event = match state.slack.parse_event(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "Unreadable Slack event");
            return detail(StatusCode::BAD_REQUEST, "invalid event payload");
        }
    };

    match event {
        SlackEvent::UrlVerification { challenge } => {
            info!("Slack URL verification");
            Json(json!({ "challenge": challenge })).into_response()
        }
        SlackEvent::Message(message) => {
            info!(
                user = %message.sender_id,
                channel = %message.chat_id,
                "Slack message received"
            );
            // Slack retries unless acknowledged within 3 seconds.
            tokio::spawn(answer_slack(state.clone(), message));
            Json(json!({ "ok": true })).into_response()
        }
        SlackEvent::Ignored(reason) => {
            debug!(reason = %reason, "Slack event ignored");
            Json(json!({ "ok": true })).into_response()
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn answer_slack(state: SharedState, message: ChannelMessage) {
    let reply = match state.client.as_ref() {
        Some(client) => {
            client
                .generate_response(&message.content, &message.sender_id, None)
                .await
        }
        None => NOT_CONFIGURED_REPLY.to_string(),
    };

    if let Err(e) = state.slack.send(&message.chat_id, &reply).await {
        error!(channel = %message.chat_id, error = %e, "Slack reply failed");
    }
}

pub(crate) async fn slack_status(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let status = if state.slack.is_configured() {
        "configured"
    } else {
        "not_configured"
    };
    Json(json!({
        "status": status,
        "bot_token": state.slack.has_bot_token(),
        "signing_secret": state.slack.has_signing_secret(),
    }))
}

// --- Knowledge base ---

pub(crate) async fn knowledge_status(State(state): State<SharedState>) -> Json<KnowledgeStatus> {
    Json(state.knowledge.status())
}

pub(crate) async fn knowledge_reload(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let knowledge = Arc::clone(&state.knowledge);
    let status = match tokio::task::spawn_blocking(move || knowledge.reload()).await {
        Ok(status) => status,
        Err(e) => {
            error!(error = %e, "Knowledge reload task failed");
            "Reload failed".to_string()
        }
    };
    info!(status = %status, "Knowledge base reloaded");
    Json(json!({ "status": status }))
}

#[derive(Deserialize)]
pub(crate) struct SearchParams {
    #[serde(default)]
    q: String,
    max_results: Option<usize>,
}

pub(crate) async fn knowledge_search(
    State(state): State<SharedState>,
    Query(params): Query<SearchParams>,
) -> Json<serde_json::Value> {
    let max_results = params
        .max_results
        .unwrap_or(state.config.knowledge.max_results);
    let results = state.knowledge.search(&params.q, max_results);
    Json(json!({ "query": params.q, "results": results }))
}

// --- Provider ---

pub(crate) async fn provider_test(State(state): State<SharedState>) -> Json<ConnectionReport> {
    let report = match state.client.as_ref() {
        Some(client) => client.test_connection().await,
        None => ConnectionReport::failed(
            ConnectionStatus::Error,
            None,
            "API key not configured (HYPERMODE_API_KEY)",
        ),
    };
    Json(report)
}
