//! Severity and priority classification rules
//!
//! Zones and messages share one ordered tier scale. Raw labels coming from
//! detectors and field reports are parsed into [`Tier`] at ingestion; anything
//! outside the closed set is rejected instead of silently defaulting.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordered severity/priority tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Low,
    Medium,
    High,
    Critical,
}

/// Color-free semantic meaning of a tier, for presentation layers to style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticTier {
    /// Immediate action required
    Urgent,
    /// Needs attention soon
    Elevated,
    /// Watch closely
    Guarded,
    /// Informational
    Nominal,
}

impl Tier {
    /// All tiers, highest first
    pub const ALL: [Tier; 4] = [Tier::Critical, Tier::High, Tier::Medium, Tier::Low];

    /// Numeric rank: CRITICAL(3) > HIGH(2) > MEDIUM(1) > LOW(0)
    pub fn rank(self) -> u8 {
        match self {
            Tier::Critical => 3,
            Tier::High => 2,
            Tier::Medium => 1,
            Tier::Low => 0,
        }
    }

    pub fn is_high_priority(self) -> bool {
        self.rank() >= Tier::High.rank()
    }

    /// Relative display weight in (0, 1]
    pub fn display_weight(self) -> f64 {
        match self {
            Tier::Critical => 1.0,
            Tier::High => 0.75,
            Tier::Medium => 0.5,
            Tier::Low => 0.25,
        }
    }

    pub fn semantic(self) -> SemanticTier {
        match self {
            Tier::Critical => SemanticTier::Urgent,
            Tier::High => SemanticTier::Elevated,
            Tier::Medium => SemanticTier::Guarded,
            Tier::Low => SemanticTier::Nominal,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Critical => "CRITICAL",
            Tier::High => "HIGH",
            Tier::Medium => "MEDIUM",
            Tier::Low => "LOW",
        }
    }
}

impl FromStr for Tier {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" => Ok(Tier::Critical),
            "HIGH" => Ok(Tier::High),
            "MEDIUM" => Ok(Tier::Medium),
            "LOW" => Ok(Tier::Low),
            _ => Err(EngineError::InvalidTier(s.to_string())),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rank of a raw tier label
pub fn rank(label: &str) -> Result<u8> {
    label.parse::<Tier>().map(Tier::rank)
}

/// Whether a raw tier label is HIGH or above
pub fn is_high_priority(label: &str) -> Result<bool> {
    label.parse::<Tier>().map(Tier::is_high_priority)
}
