//! Channel adapters for the SMS Agent Stack.
//!
//! Inbound traffic arrives on the gateway's webhook routes; these adapters
//! parse it into [`ChannelMessage`](smsagent_core::ChannelMessage)s and
//! deliver replies back out.
//!
//! - **SMS** — Twilio webhooks in, TwiML or the Messages API out
//! - **Slack** — Events API in (signed), `chat.postMessage` out

pub mod slack;
pub mod sms;

pub use slack::{SlackChannel, SlackEvent};
pub use sms::{SmsChannel, TwilioInbound, twiml_message};
