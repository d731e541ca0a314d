//! Order quota enforcement.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How order quotas from the current rebalance are applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuotaPolicy {
    /// Any order with a recoverable poster is accepted.
    #[default]
    Unmetered,
    /// Each order consumes one unit of the poster's `orderLimit`; posters
    /// without quota are rejected.
    PerOrder,
}

impl QuotaPolicy {
    /// Whether quotas are checked and consumed.
    pub fn is_enforced(&self) -> bool {
        matches!(self, QuotaPolicy::PerOrder)
    }
}

impl fmt::Display for QuotaPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuotaPolicy::Unmetered => f.write_str("unmetered"),
            QuotaPolicy::PerOrder => f.write_str("per-order"),
        }
    }
}

impl FromStr for QuotaPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unmetered" | "off" | "false" | "0" => Ok(QuotaPolicy::Unmetered),
            "per-order" | "on" | "true" | "1" => Ok(QuotaPolicy::PerOrder),
            other => Err(format!("unknown quota policy: {}", other)),
        }
    }
}
