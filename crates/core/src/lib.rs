//! # SMS Agent Stack Core
//!
//! Domain types, traits, and error definitions for the SMS Agent Stack relay.
//! This crate has **no framework dependencies** — it defines the domain model
//! that the knowledge, provider, channel and gateway crates implement against.
//!
//! ## Layout
//!
//! - [`message`] — chat messages exchanged with the completion provider
//! - [`tier`] — model tiers picked by the selector
//! - [`provider`] — completion request payload and classified outcomes
//! - [`channel`] — the messaging-channel boundary (SMS, Slack)
//! - [`error`] — one error enum per bounded context

pub mod channel;
pub mod error;
pub mod message;
pub mod provider;
pub mod tier;

// Re-export key types at crate root for ergonomics
pub use channel::{Channel, ChannelId, ChannelMessage};
pub use error::{ChannelError, Error, KnowledgeError, ProviderError, Result};
pub use message::{Message, Role};
pub use provider::{CompletionOutcome, CompletionRequest, ConnectionReport, ConnectionStatus};
pub use tier::ModelTier;
