//! Refresh cadence policy keyed by coarse network quality.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Coarse network-condition category selecting how hard to poll the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// Slow or metered connection.
    Low,
    #[default]
    Medium,
    /// Fast local connection.
    High,
}

impl QualityTier {
    /// How often the details view refreshes on this tier.
    #[must_use]
    pub const fn refresh_interval(self) -> Duration {
        match self {
            Self::Low => Duration::from_secs(10),
            Self::Medium => Duration::from_secs(5),
            Self::High => Duration::from_secs(2),
        }
    }
}

impl FromStr for QualityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown quality tier: {other}")),
        }
    }
}
