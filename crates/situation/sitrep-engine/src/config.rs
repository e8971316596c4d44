//! Engine configuration.
//!
//! Policy constants (sufficiency thresholds, default submission scores) live
//! here rather than in the evaluators so deployments can tune them without a
//! rebuild. Configuration is loaded from a TOML file layered with `SITREP_*`
//! environment variables (`SITREP_ADEQUACY_THRESHOLD`,
//! `SITREP_SUBMIT_SCORES__HIGH`), or parsed directly from TOML text.

use crate::classification::Tier;
use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "SITREP";

/// Default numeric scores assigned to operator-submitted messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitScores {
    pub critical: u8,
    pub high: u8,
    pub medium: u8,
    pub low: u8,
}

impl Default for SubmitScores {
    fn default() -> Self {
        Self {
            critical: 95,
            high: 85,
            medium: 70,
            low: 55,
        }
    }
}

impl SubmitScores {
    /// Score for a given tier
    pub fn for_tier(&self, tier: Tier) -> u8 {
        match tier {
            Tier::Critical => self.critical,
            Tier::High => self.high,
            Tier::Medium => self.medium,
            Tier::Low => self.low,
        }
    }
}

/// Thresholds and weights for environmental risk scoring
///
/// A factor triggers when its input crosses the threshold and contributes its
/// weight as a probability; the assessment takes the largest contribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    /// Rain over the last 24 hours (mm) above which the 24h factor triggers
    pub rain_24h_mm: f64,
    /// Rain over the last 72 hours (mm) above which the 72h factor triggers
    pub rain_72h_mm: f64,
    /// Magnitude at or above which the seismic factor triggers
    pub quake_magnitude: f64,
    /// Relative humidity (%) above which the humidity factor triggers
    pub humidity_pct: f64,
    pub rain_24h_weight: f64,
    pub rain_72h_weight: f64,
    pub seismic_weight: f64,
    pub humidity_weight: f64,
    /// Probability when no factor triggers
    pub baseline: f64,
    /// Lowest probability mapped to CRITICAL
    pub critical_at: f64,
    /// Lowest probability mapped to HIGH
    pub high_at: f64,
    /// Lowest probability mapped to MEDIUM
    pub medium_at: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            rain_24h_mm: 25.0,
            rain_72h_mm: 50.0,
            quake_magnitude: 3.0,
            humidity_pct: 85.0,
            rain_24h_weight: 0.6,
            rain_72h_weight: 0.8,
            seismic_weight: 0.7,
            humidity_weight: 0.4,
            baseline: 0.1,
            critical_at: 0.8,
            high_at: 0.6,
            medium_at: 0.3,
        }
    }
}

impl RiskThresholds {
    /// Tier for a risk probability
    pub fn tier_for(&self, probability: f64) -> Tier {
        if probability >= self.critical_at {
            Tier::Critical
        } else if probability >= self.high_at {
            Tier::High
        } else if probability >= self.medium_at {
            Tier::Medium
        } else {
            Tier::Low
        }
    }

    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("rain_24h_weight", self.rain_24h_weight),
            ("rain_72h_weight", self.rain_72h_weight),
            ("seismic_weight", self.seismic_weight),
            ("humidity_weight", self.humidity_weight),
            ("baseline", self.baseline),
            ("critical_at", self.critical_at),
            ("high_at", self.high_at),
            ("medium_at", self.medium_at),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::config(format!("risk.{field} must be within 0-1, got {value}")));
            }
        }
        for (field, value) in [
            ("rain_24h_mm", self.rain_24h_mm),
            ("rain_72h_mm", self.rain_72h_mm),
            ("quake_magnitude", self.quake_magnitude),
            ("humidity_pct", self.humidity_pct),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::config(format!("risk.{field} must be non-negative, got {value}")));
            }
        }
        if self.medium_at > self.high_at || self.high_at > self.critical_at {
            return Err(EngineError::config(
                "risk tier cutoffs must satisfy medium_at <= high_at <= critical_at",
            ));
        }
        Ok(())
    }
}

/// Configuration for the situational engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ratio of current/estimated below which a resource is in shortage
    pub adequacy_threshold: f64,
    /// Ratio of current/estimated above which a resource is in surplus
    pub surplus_threshold: f64,
    /// Allowed relative drift between allocated + needed and estimated
    pub reconcile_tolerance: f64,
    /// Default scores for operator-submitted messages
    pub submit_scores: SubmitScores,
    /// Location label stamped on operator-submitted messages
    pub command_center_location: String,
    /// Fixed system load (0-100). Derived from deployments when absent.
    pub system_load: Option<f64>,
    /// Environmental risk scoring
    pub risk: RiskThresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            adequacy_threshold: 0.9,
            surplus_threshold: 1.0,
            reconcile_tolerance: 0.05,
            submit_scores: SubmitScores::default(),
            command_center_location: "Command Center".to_string(),
            system_load: None,
            risk: RiskThresholds::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a file, layered with environment overrides
    ///
    /// The format is detected from the file extension (`.toml`, `.json`, ...).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading engine configuration from {}", path.display());

        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(true))
            .add_source(env_source())
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(env_source())
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the policy constants for consistency
    pub fn validate(&self) -> Result<()> {
        if !self.adequacy_threshold.is_finite() || self.adequacy_threshold <= 0.0 {
            return Err(EngineError::config(format!(
                "adequacy_threshold must be positive, got {}",
                self.adequacy_threshold
            )));
        }
        if !self.surplus_threshold.is_finite() || self.surplus_threshold < self.adequacy_threshold {
            return Err(EngineError::config(format!(
                "surplus_threshold ({}) must not be below adequacy_threshold ({})",
                self.surplus_threshold, self.adequacy_threshold
            )));
        }
        if !self.reconcile_tolerance.is_finite() || self.reconcile_tolerance < 0.0 {
            return Err(EngineError::config("reconcile_tolerance must be non-negative"));
        }

        let scores = &self.submit_scores;
        if [scores.critical, scores.high, scores.medium, scores.low]
            .iter()
            .any(|s| *s > 100)
        {
            return Err(EngineError::config("submit_scores must be within 0-100"));
        }

        if let Some(load) = self.system_load {
            if !(0.0..=100.0).contains(&load) {
                return Err(EngineError::config(format!(
                    "system_load must be within 0-100, got {load}"
                )));
            }
        }

        self.risk.validate()
    }
}

/// `SITREP_*` variables, `__` separating nested keys
fn env_source() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
