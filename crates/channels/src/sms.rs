//! SMS channel adapter (Twilio).
//!
//! Inbound SMS arrive as form-encoded webhooks and are answered inline with
//! TwiML. Outbound SMS go through the Twilio Messages API.

use async_trait::async_trait;
use serde::Deserialize;
use smsagent_config::SmsConfig;
use smsagent_core::channel::{Channel, ChannelId, ChannelMessage};
use smsagent_core::error::ChannelError;
use tracing::{debug, info, warn};

/// Form fields Twilio posts to the SMS webhook. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TwilioInbound {
    #[serde(rename = "From", default)]
    pub from: String,
    #[serde(rename = "To", default)]
    pub to: String,
    #[serde(rename = "Body", default)]
    pub body: String,
    #[serde(rename = "MessageSid", default)]
    pub message_sid: Option<String>,
}

/// Wrap `text` in a TwiML `<Message>` response.
pub fn twiml_message(text: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>{}</Message></Response>",
        quick_xml::escape::escape(text)
    )
}

#[derive(Deserialize)]
struct MessageResource {
    sid: String,
}

/// Twilio SMS adapter.
pub struct SmsChannel {
    config: SmsConfig,
    channel_id: ChannelId,
    client: reqwest::Client,
}

impl SmsChannel {
    pub fn new(config: SmsConfig) -> Self {
        Self {
            config,
            channel_id: ChannelId("sms".into()),
            client: reqwest::Client::new(),
        }
    }

    /// Normalize a Twilio webhook into a channel message.
    ///
    /// Replies go back to the sender, so `chat_id` is the sender's number.
    pub fn parse_inbound(&self, form: TwilioInbound) -> Result<ChannelMessage, ChannelError> {
        let from = form.from.trim();
        if from.is_empty() {
            return Err(ChannelError::InvalidPayload("missing From".into()));
        }
        if form.body.trim().is_empty() {
            return Err(ChannelError::InvalidPayload("missing Body".into()));
        }

        let mut metadata = serde_json::Map::new();
        if !form.to.is_empty() {
            metadata.insert("to".into(), form.to.clone().into());
        }
        if let Some(sid) = form.message_sid {
            metadata.insert("message_sid".into(), sid.into());
        }

        Ok(ChannelMessage {
            channel_id: self.channel_id.clone(),
            sender_id: from.to_string(),
            content: form.body,
            chat_id: from.to_string(),
            metadata,
        })
    }

    /// Send an SMS and return Twilio's message SID.
    pub async fn send_sms(&self, to: &str, body: &str) -> Result<String, ChannelError> {
        let (Some(sid), Some(token), Some(from)) = (
            self.config.account_sid.as_deref(),
            self.config.auth_token.as_deref(),
            self.config.phone_number.as_deref(),
        ) else {
            return Err(ChannelError::NotConfigured(
                "Twilio credentials not configured".into(),
            ));
        };

        let url = format!(
            "{}/2010-04-01/Accounts/{sid}/Messages.json",
            self.config.api_base.trim_end_matches('/')
        );
        debug!(to = %to, body_len = body.len(), "Sending SMS");

        let response = self
            .client
            .post(&url)
            .basic_auth(sid, Some(token))
            .form(&[("To", to), ("From", from), ("Body", body)])
            .send()
            .await
            .map_err(|e| self.delivery_failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %text, "Twilio rejected SMS");
            return Err(self.delivery_failed(format!("HTTP {status}")));
        }

        let resource: MessageResource = response
            .json()
            .await
            .map_err(|e| self.delivery_failed(format!("unreadable response: {e}")))?;

        info!(to = %to, message_sid = %resource.sid, "SMS sent");
        Ok(resource.sid)
    }

    fn delivery_failed(&self, reason: String) -> ChannelError {
        ChannelError::DeliveryFailed {
            channel: "sms".into(),
            reason,
        }
    }
}

#[async_trait]
impl Channel for SmsChannel {
    fn name(&self) -> &str {
        "sms"
    }

    fn is_configured(&self) -> bool {
        self.config.is_complete()
    }

    async fn send(&self, chat_id: &str, content: &str) -> Result<(), ChannelError> {
        self.send_sms(chat_id, content).await.map(|_| ())
    }
}
