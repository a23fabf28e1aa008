//! Slack channel adapter (Events API).
//!
//! Slack POSTs signed JSON events to the gateway. Message events are turned
//! into [`ChannelMessage`]s; replies are posted back with `chat.postMessage`.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use smsagent_config::SlackConfig;
use smsagent_core::channel::{Channel, ChannelId, ChannelMessage};
use smsagent_core::error::ChannelError;
use tracing::{debug, info, warn};

type HmacSha256 = Hmac<Sha256>;

/// Requests older (or newer) than this are rejected as replays.
pub const MAX_TIMESTAMP_SKEW_SECS: i64 = 60 * 5;

/// A parsed Events API callback.
#[derive(Debug, Clone, PartialEq)]
pub enum SlackEvent {
    /// Endpoint registration handshake
    UrlVerification { challenge: String },
    /// A user message to answer
    Message(ChannelMessage),
    /// Anything we do not answer, with the reason
    Ignored(String),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Envelope {
    UrlVerification {
        challenge: String,
    },
    EventCallback {
        event: InnerEvent,
        #[serde(default)]
        team_id: Option<String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct InnerEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    subtype: Option<String>,
    #[serde(default)]
    bot_id: Option<String>,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    ts: Option<String>,
}

#[derive(Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Slack adapter.
pub struct SlackChannel {
    config: SlackConfig,
    channel_id: ChannelId,
    client: reqwest::Client,
}

impl SlackChannel {
    pub fn new(config: SlackConfig) -> Self {
        Self {
            config,
            channel_id: ChannelId("slack".into()),
            client: reqwest::Client::new(),
        }
    }

    pub fn has_bot_token(&self) -> bool {
        self.config.bot_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn has_signing_secret(&self) -> bool {
        self.config
            .signing_secret
            .as_deref()
            .is_some_and(|s| !s.is_empty())
    }

    /// Verify the `X-Slack-Signature` header against the current time.
    pub fn verify_signature(
        &self,
        timestamp: &str,
        signature: &str,
        body: &[u8],
    ) -> Result<(), ChannelError> {
        self.verify_signature_at(timestamp, signature, body, chrono::Utc::now().timestamp())
    }

    /// Verify a request signature as of `now` (unix seconds).
    ///
    /// Passes unconditionally when no signing secret is configured.
    pub fn verify_signature_at(
        &self,
        timestamp: &str,
        signature: &str,
        body: &[u8],
        now: i64,
    ) -> Result<(), ChannelError> {
        let Some(secret) = self.config.signing_secret.as_deref().filter(|s| !s.is_empty()) else {
            return Ok(());
        };

        let ts: i64 = timestamp
            .trim()
            .parse()
            .map_err(|_| ChannelError::InvalidSignature("malformed timestamp".into()))?;
        if now.abs_diff(ts) > MAX_TIMESTAMP_SKEW_SECS.unsigned_abs() {
            return Err(ChannelError::InvalidSignature("stale timestamp".into()));
        }

        let provided = signature
            .strip_prefix("v0=")
            .and_then(|h| hex::decode(h).ok())
            .ok_or_else(|| ChannelError::InvalidSignature("malformed signature".into()))?;

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| ChannelError::InvalidSignature(e.to_string()))?;
        mac.update(b"v0:");
        mac.update(timestamp.trim().as_bytes());
        mac.update(b":");
        mac.update(body);

        // Constant-time comparison
        mac.verify_slice(&provided)
            .map_err(|_| ChannelError::InvalidSignature("signature mismatch".into()))
    }

    /// Parse an Events API request body.
    pub fn parse_event(&self, body: &[u8]) -> Result<SlackEvent, ChannelError> {
        let envelope: Envelope = serde_json::from_slice(body)
            .map_err(|e| ChannelError::InvalidPayload(format!("Slack event: {e}")))?;

        let (event, team_id) = match envelope {
            Envelope::UrlVerification { challenge } => {
                return Ok(SlackEvent::UrlVerification { challenge });
            }
            Envelope::EventCallback { event, team_id } => (event, team_id),
            Envelope::Other => return Ok(SlackEvent::Ignored("unsupported envelope".into())),
        };

        if event.kind != "message" && event.kind != "app_mention" {
            return Ok(SlackEvent::Ignored(format!("event type {}", event.kind)));
        }
        if event.bot_id.is_some() {
            return Ok(SlackEvent::Ignored("bot message".into()));
        }
        if let Some(subtype) = event.subtype {
            return Ok(SlackEvent::Ignored(format!("message subtype {subtype}")));
        }

        let (Some(user), Some(channel)) = (event.user, event.channel) else {
            return Ok(SlackEvent::Ignored("missing user or channel".into()));
        };

        let raw = event.text.unwrap_or_default();
        let text = if event.kind == "app_mention" {
            strip_mentions(&raw)
        } else {
            raw.trim()
        };
        if text.is_empty() {
            return Ok(SlackEvent::Ignored("empty text".into()));
        }

        let mut metadata = serde_json::Map::new();
        if let Some(ts) = event.ts {
            metadata.insert("ts".into(), ts.into());
        }
        if let Some(team) = team_id {
            metadata.insert("team_id".into(), team.into());
        }

        Ok(SlackEvent::Message(ChannelMessage {
            channel_id: self.channel_id.clone(),
            sender_id: user,
            content: text.to_string(),
            chat_id: channel,
            metadata,
        }))
    }

    fn delivery_failed(&self, reason: String) -> ChannelError {
        ChannelError::DeliveryFailed {
            channel: "slack".into(),
            reason,
        }
    }
}

/// Drop leading `<@U…>` mentions.
fn strip_mentions(text: &str) -> &str {
    let mut rest = text.trim_start();
    while let Some(after) = rest.strip_prefix("<@") {
        match after.find('>') {
            Some(end) => rest = after[end + 1..].trim_start(),
            None => break,
        }
    }
    rest.trim_end()
}

#[async_trait]
impl Channel for SlackChannel {
    fn name(&self) -> &str {
        "slack"
    }

    fn is_configured(&self) -> bool {
        self.has_bot_token() && self.has_signing_secret()
    }

    async fn send(&self, chat_id: &str, content: &str) -> Result<(), ChannelError> {
        let token = self
            .config
            .bot_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ChannelError::NotConfigured("Slack bot token not configured".into()))?;

        let url = format!(
            "{}/chat.postMessage",
            self.config.api_base.trim_end_matches('/')
        );
        debug!(channel = %chat_id, content_len = content.len(), "Posting Slack message");

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&serde_json::json!({ "channel": chat_id, "text": content }))
            .send()
            .await
            .map_err(|e| self.delivery_failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.delivery_failed(format!("HTTP {status}")));
        }

        let body: PostMessageResponse = response
            .json()
            .await
            .map_err(|e| self.delivery_failed(format!("unreadable response: {e}")))?;

        if !body.ok {
            let reason = body.error.unwrap_or_else(|| "unknown error".into());
            warn!(channel = %chat_id, error = %reason, "Slack rejected message");
            return Err(self.delivery_failed(reason));
        }

        info!(channel = %chat_id, "Slack reply posted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";

    fn channel(api_base: &str) -> SlackChannel {
        SlackChannel::new(SlackConfig {
            bot_token: Some("xoxb-test".into()),
            signing_secret: Some(SECRET.into()),
            api_base: api_base.into(),
        })
    }

    fn sign(timestamp: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(format!("v0:{timestamp}:").as_bytes());
        mac.update(body);
        format!("v0={}", hex::encode(mac.finalize().into_bytes()))
    }

    fn callback(event: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "type": "event_callback",
            "team_id": "T1",
            "event": event,
        }))
        .unwrap()
    }

    #[test]
    fn valid_signature_passes() {
        let ch = channel("http://localhost");
        let body = br#"{"type":"url_verification","challenge":"abc"}"#;
        let sig = sign("1700000000", body);
        assert!(ch.verify_signature_at("1700000000", &sig, body, 1_700_000_100).is_ok());
    }

    #[test]
    fn tampered_body_fails() {
        let ch = channel("http://localhost");
        let sig = sign("1700000000", b"original");
        assert!(matches!(
            ch.verify_signature_at("1700000000", &sig, b"tampered", 1_700_000_000),
            Err(ChannelError::InvalidSignature(_))
        ));
    }

    #[test]
    fn stale_timestamp_fails() {
        let ch = channel("http://localhost");
        let sig = sign("1700000000", b"body");
        assert!(ch.verify_signature_at("1700000000", &sig, b"body", 1_700_000_301).is_err());
        assert!(ch.verify_signature_at("1700000000", &sig, b"body", 1_700_000_300).is_ok());
    }

    #[test]
    fn extreme_timestamps_are_stale() {
        let ch = channel("http://localhost");
        for ts in [i64::MIN.to_string(), i64::MAX.to_string()] {
            assert!(matches!(
                ch.verify_signature_at(&ts, "v0=00", b"", 1_700_000_000),
                Err(ChannelError::InvalidSignature(_))
            ));
        }
    }

    #[test]
    fn malformed_headers_fail() {
        let ch = channel("http://localhost");
        assert!(ch.verify_signature_at("soon", "v0=00", b"", 0).is_err());
        assert!(ch.verify_signature_at("0", "sha256=00", b"", 0).is_err());
        assert!(ch.verify_signature_at("0", "v0=zz", b"", 0).is_err());
    }

    #[test]
    fn no_secret_skips_verification() {
        let ch = SlackChannel::new(SlackConfig::default());
        assert!(ch.verify_signature_at("", "", b"anything", 0).is_ok());
        assert!(!ch.is_configured());
    }

    #[test]
    fn url_verification() {
        let ch = channel("http://localhost");
        let event = ch
            .parse_event(br#"{"type":"url_verification","challenge":"3eZbrw1a"}"#)
            .unwrap();
        assert_eq!(
            event,
            SlackEvent::UrlVerification {
                challenge: "3eZbrw1a".into()
            }
        );
    }

    #[test]
    fn message_event_is_normalized() {
        let ch = channel("http://localhost");
        let body = callback(serde_json::json!({
            "type": "message",
            "user": "U123",
            "text": "What are your hours?",
            "channel": "C456",
            "ts": "1700000000.000100",
        }));

        match ch.parse_event(&body).unwrap() {
            SlackEvent::Message(msg) => {
                assert_eq!(msg.sender_id, "U123");
                assert_eq!(msg.chat_id, "C456");
                assert_eq!(msg.content, "What are your hours?");
                assert_eq!(msg.metadata["team_id"], "T1");
            }
            other => panic!("expected message, got {other:?}"),
        }
    }

    #[test]
    fn app_mention_strips_leading_mentions() {
        let ch = channel("http://localhost");
        let body = callback(serde_json::json!({
            "type": "app_mention",
            "user": "U123",
            "text": "<@UBOT> <@UOTHER>  ping <@U9> please",
            "channel": "C456",
        }));

        match ch.parse_event(&body).unwrap() {
            SlackEvent::Message(msg) => assert_eq!(msg.content, "ping <@U9> please"),
            other => panic!("expected message, got {other:?}"),
        }
    }

    #[test]
    fn bot_subtype_and_empty_messages_are_ignored() {
        let ch = channel("http://localhost");
        for event in [
            serde_json::json!({"type": "message", "bot_id": "B1", "text": "hi", "channel": "C"}),
            serde_json::json!({"type": "message", "subtype": "message_changed", "user": "U", "channel": "C"}),
            serde_json::json!({"type": "message", "user": "U", "text": "   ", "channel": "C"}),
            serde_json::json!({"type": "app_mention", "user": "U", "text": "<@UBOT>", "channel": "C"}),
            serde_json::json!({"type": "reaction_added", "user": "U"}),
        ] {
            assert!(matches!(
                ch.parse_event(&callback(event)).unwrap(),
                SlackEvent::Ignored(_)
            ));
        }
    }

    #[test]
    fn unknown_envelope_is_ignored_and_garbage_rejected() {
        let ch = channel("http://localhost");
        assert!(matches!(
            ch.parse_event(br#"{"type":"app_rate_limited"}"#).unwrap(),
            SlackEvent::Ignored(_)
        ));
        assert!(matches!(
            ch.parse_event(b"not json"),
            Err(ChannelError::InvalidPayload(_))
        ));
    }

    #[tokio::test]
    async fn send_posts_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .and(header("authorization", "Bearer xoxb-test"))
            .and(body_json(serde_json::json!({"channel": "C456", "text": "hello"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        channel(&server.uri()).send("C456", "hello").await.unwrap();
    }

    #[tokio::test]
    async fn send_maps_ok_false_to_delivery_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"ok": false, "error": "channel_not_found"})),
            )
            .mount(&server)
            .await;

        match channel(&server.uri()).send("C404", "hello").await {
            Err(ChannelError::DeliveryFailed { reason, .. }) => {
                assert_eq!(reason, "channel_not_found")
            }
            other => panic!("expected delivery failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_without_token_fails() {
        let ch = SlackChannel::new(SlackConfig::default());
        assert!(matches!(
            ch.send("C1", "hi").await,
            Err(ChannelError::NotConfigured(_))
        ));
    }
}
