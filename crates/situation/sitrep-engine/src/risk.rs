//! Environmental risk scoring
//!
//! Slope-failure risk from recent rain, humidity and seismic activity. Each
//! trigger that crosses its threshold contributes a fixed probability; the
//! assessment takes the largest one, or a baseline when nothing triggers, and
//! maps it onto the shared [`Tier`] scale.

use crate::classification::Tier;
use crate::config::RiskThresholds;
use crate::error::{EngineError, Result};
use crate::weather::WeatherSeries;
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Environmental trigger contributing to an assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    Rainfall24h,
    Rainfall72h,
    Seismic,
    Humidity,
}

/// Inputs an assessment was computed from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskInputs {
    pub rain_24h_mm: f64,
    pub rain_72h_mm: f64,
    /// Largest recent quake magnitude, when reported
    pub max_magnitude: Option<f64>,
    /// Humidity of the latest sample, `None` without weather
    pub humidity_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// 0-1
    pub probability: f64,
    pub tier: Tier,
    /// Triggered factors, strongest first
    pub factors: Vec<RiskFactor>,
    pub inputs: RiskInputs,
}

impl RiskAssessment {
    /// Whether no factor triggered
    pub fn is_baseline(&self) -> bool {
        self.factors.is_empty()
    }
}

/// Rain accumulated over the `hours` ending at the latest sample
pub fn accumulated_rain(series: &WeatherSeries, hours: i64) -> f64 {
    let Some(latest) = series.latest() else {
        return 0.0;
    };
    let cutoff = latest.timestamp - Duration::hours(hours);
    series
        .samples()
        .iter()
        .filter(|s| s.timestamp > cutoff)
        .map(|s| s.rainfall)
        .sum()
}

/// Score risk from a weather series and the largest recent quake magnitude
pub fn assess_risk(
    series: &WeatherSeries,
    max_magnitude: Option<f64>,
    thresholds: &RiskThresholds,
) -> Result<RiskAssessment> {
    if let Some(magnitude) = max_magnitude {
        if !magnitude.is_finite() || magnitude < 0.0 {
            return Err(EngineError::quantity(format!(
                "max_magnitude must be non-negative, got {magnitude}"
            )));
        }
    }

    let inputs = RiskInputs {
        rain_24h_mm: accumulated_rain(series, 24),
        rain_72h_mm: accumulated_rain(series, 72),
        max_magnitude,
        humidity_pct: series.latest().map(|s| s.humidity),
    };

    let mut triggered = Vec::new();
    if inputs.rain_24h_mm > thresholds.rain_24h_mm {
        triggered.push((RiskFactor::Rainfall24h, thresholds.rain_24h_weight));
    }
    if inputs.rain_72h_mm > thresholds.rain_72h_mm {
        triggered.push((RiskFactor::Rainfall72h, thresholds.rain_72h_weight));
    }
    if max_magnitude.is_some_and(|m| m >= thresholds.quake_magnitude) {
        triggered.push((RiskFactor::Seismic, thresholds.seismic_weight));
    }
    if inputs.humidity_pct.is_some_and(|h| h > thresholds.humidity_pct) {
        triggered.push((RiskFactor::Humidity, thresholds.humidity_weight));
    }
    // stable sort keeps declaration order among equal weights
    triggered.sort_by(|a, b| b.1.total_cmp(&a.1));

    let probability = triggered.first().map_or(thresholds.baseline, |(_, weight)| *weight);
    let tier = thresholds.tier_for(probability);
    tracing::debug!(probability, tier = %tier, factors = triggered.len(), "Assessed environmental risk");

    Ok(RiskAssessment {
        probability,
        tier,
        factors: triggered.into_iter().map(|(factor, _)| factor).collect(),
        inputs,
    })
}
