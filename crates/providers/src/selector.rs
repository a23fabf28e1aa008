//! Model tier selection.
//!
//! Long messages and messages that ask for reasoning go to the premium tier,
//! medium-length messages to the balanced tier, everything else to the fast
//! tier. `Smart` is never chosen here.

use smsagent_core::ModelTier;

/// Substrings (matched on the lower-cased message) that force the premium tier.
pub const PREMIUM_TRIGGERS: [&str; 6] = [
    "explain",
    "analyze",
    "complex",
    "detailed",
    "how does",
    "why",
];

/// Messages longer than this many characters go to the premium tier.
pub const PREMIUM_MIN_EXCLUSIVE: usize = 100;

/// Messages longer than this many characters go at least to the balanced tier.
pub const BALANCED_MIN_EXCLUSIVE: usize = 50;

/// Pick a tier from the message text alone.
pub fn select_model(message: &str) -> ModelTier {
    let length = message.chars().count();
    let lower = message.to_lowercase();

    if length > PREMIUM_MIN_EXCLUSIVE || PREMIUM_TRIGGERS.iter().any(|t| lower.contains(t)) {
        ModelTier::Premium
    } else if length > BALANCED_MIN_EXCLUSIVE {
        ModelTier::Balanced
    } else {
        ModelTier::Fast
    }
}
