//! Completion provider client for the SMS Agent Stack.
//!
//! The [`CompletionClient`] talks to any OpenAI-compatible chat-completions
//! API. It picks a model tier with [`selector::select_model`], enriches the
//! prompt with knowledge-base context, and fails over across a fixed list of
//! endpoint paths on the same host.

pub mod completion;
pub mod selector;

pub use completion::CompletionClient;
pub use selector::select_model;
