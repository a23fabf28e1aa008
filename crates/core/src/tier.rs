//! Model tiers.
//!
//! A tier is a named class of completion model. The selector picks `Fast`,
//! `Balanced` or `Premium` from the message text; `Smart` is only reachable
//! through an explicit override.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Fast,
    Balanced,
    Premium,
    Smart,
}

impl ModelTier {
    pub const ALL: [ModelTier; 4] = [
        ModelTier::Fast,
        ModelTier::Balanced,
        ModelTier::Premium,
        ModelTier::Smart,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::Fast => "fast",
            ModelTier::Balanced => "balanced",
            ModelTier::Premium => "premium",
            ModelTier::Smart => "smart",
        }
    }
}

impl std::fmt::Display for ModelTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(ModelTier::Fast),
            "balanced" => Ok(ModelTier::Balanced),
            "premium" => Ok(ModelTier::Premium),
            "smart" => Ok(ModelTier::Smart),
            other => Err(format!("unknown model tier: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Smart".parse::<ModelTier>(), Ok(ModelTier::Smart));
        assert_eq!(" fast ".parse::<ModelTier>(), Ok(ModelTier::Fast));
        assert!("gpt-4o".parse::<ModelTier>().is_err());
    }

    #[test]
    fn display_matches_serde() {
        for tier in ModelTier::ALL {
            let json = serde_json::to_string(&tier).unwrap();
            assert_eq!(json, format!("\"{tier}\""));
        }
    }
}
