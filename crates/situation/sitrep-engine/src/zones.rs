//! Zone risk aggregation
//!
//! Detected hazard zones are validated once at ingestion and then only viewed:
//! sorted by risk, filtered by response status and counted by tier. None of
//! the views mutate the input slice.

use crate::classification::Tier;
use crate::error::{EngineError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Kind of hazard detected in a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardKind {
    Flood,
    Fire,
    Landslide,
    Rockfall,
    Earthquake,
    Storm,
}

impl FromStr for HazardKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flood" => Ok(Self::Flood),
            "fire" | "wildfire" => Ok(Self::Fire),
            "landslide" => Ok(Self::Landslide),
            "rockfall" => Ok(Self::Rockfall),
            "earthquake" => Ok(Self::Earthquake),
            "storm" => Ok(Self::Storm),
            _ => Err(EngineError::label("hazard", s)),
        }
    }
}

impl fmt::Display for HazardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Flood => "Flood",
            Self::Fire => "Fire",
            Self::Landslide => "Landslide",
            Self::Rockfall => "Rockfall",
            Self::Earthquake => "Earthquake",
            Self::Storm => "Storm",
        };
        f.write_str(name)
    }
}

/// Response status of a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneStatus {
    /// Responders are engaged
    Active,
    /// Under observation, no active response
    Monitoring,
}

impl FromStr for ZoneStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "monitoring" => Ok(Self::Monitoring),
            _ => Err(EngineError::label("zone status", s)),
        }
    }
}

/// Zone as reported by the detection pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawZone {
    pub id: u64,
    #[serde(alias = "type")]
    pub hazard: String,
    pub severity: String,
    pub location: String,
    pub detected_at: DateTime<Utc>,
    pub confidence: f64,
    pub status: String,
    #[serde(default)]
    pub responders: i64,
    #[serde(default)]
    pub evacuated: i64,
    #[serde(default)]
    pub affected: i64,
}

/// Validated hazard zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: u64,
    pub hazard: HazardKind,
    pub severity: Tier,
    pub location: String,
    pub detected_at: DateTime<Utc>,
    /// Detection confidence, 0-100
    pub confidence: f64,
    pub status: ZoneStatus,
    pub responders: u32,
    pub evacuated: u32,
    pub affected: u32,
}

fn zone_count(zone_id: u64, field: &str, value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        EngineError::quantity(format!("zone {zone_id}: {field} must be a non-negative count, got {value}"))
    })
}

impl RawZone {
    pub fn validate(&self) -> Result<Zone> {
        let severity = self.severity.parse::<Tier>()?;
        let hazard = self.hazard.parse::<HazardKind>()?;
        let status = self.status.parse::<ZoneStatus>()?;

        if !(0.0..=100.0).contains(&self.confidence) {
            return Err(EngineError::quantity(format!(
                "zone {}: confidence must be within 0-100, got {}",
                self.id, self.confidence
            )));
        }

        let mut zone = Zone {
            id: self.id,
            hazard,
            severity,
            location: self.location.clone(),
            detected_at: self.detected_at,
            confidence: self.confidence,
            status,
            responders: 0,
            evacuated: 0,
            affected: 0,
        };
        zone.update_counts(
            zone_count(self.id, "responders", self.responders)?,
            zone_count(self.id, "evacuated", self.evacuated)?,
            zone_count(self.id, "affected", self.affected)?,
        )?;
        Ok(zone)
    }
}

impl Zone {
    /// Replace responder/evacuation counts, keeping evacuated <= affected
    pub fn update_counts(&mut self, responders: u32, evacuated: u32, affected: u32) -> Result<()> {
        if evacuated > affected {
            return Err(EngineError::quantity(format!(
                "zone {}: evacuated ({}) exceeds affected ({})",
                self.id, evacuated, affected
            )));
        }
        self.responders = responders;
        self.evacuated = evacuated;
        self.affected = affected;
        Ok(())
    }

    pub fn is_high_priority(&self) -> bool {
        self.severity.is_high_priority()
    }

    /// Share of affected people already evacuated
    pub fn evacuation_percent(&self) -> u8 {
        if self.affected == 0 {
            return 0;
        }
        (f64::from(self.evacuated) / f64::from(self.affected) * 100.0).round() as u8
    }
}

/// Risk ordering: severity desc, most recent detection first, then id asc
pub fn risk_order(a: &Zone, b: &Zone) -> Ordering {
    b.severity
        .rank()
        .cmp(&a.severity.rank())
        .then_with(|| b.detected_at.cmp(&a.detected_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Zones sorted by risk
pub fn classify(zones: &[Zone]) -> Vec<Zone> {
    let mut sorted = zones.to_vec();
    sorted.sort_by(risk_order);
    sorted
}

pub fn count_high_priority(zones: &[Zone]) -> usize {
    zones.iter().filter(|z| z.is_high_priority()).count()
}

/// Lazy view of zones with the given status
///
/// The returned iterator is `Clone`, so a consumer can restart the view
/// without re-filtering the source.
pub fn filter_by_status(zones: &[Zone], status: ZoneStatus) -> impl Iterator<Item = &Zone> + Clone {
    zones.iter().filter(move |z| z.status == status)
}

/// Lazy view of HIGH and CRITICAL zones
pub fn high_priority(zones: &[Zone]) -> impl Iterator<Item = &Zone> + Clone {
    zones.iter().filter(|z| z.is_high_priority())
}

/// Zone counts per tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TierCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl TierCounts {
    pub fn get(&self, tier: Tier) -> usize {
        match tier {
            Tier::Critical => self.critical,
            Tier::High => self.high,
            Tier::Medium => self.medium,
            Tier::Low => self.low,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low
    }
}

pub fn counts_by_tier(zones: &[Zone]) -> TierCounts {
    zones.iter().fold(TierCounts::default(), |mut counts, zone| {
        match zone.severity {
            Tier::Critical => counts.critical += 1,
            Tier::High => counts.high += 1,
            Tier::Medium => counts.medium += 1,
            Tier::Low => counts.low += 1,
        }
        counts
    })
}

/// People and responder totals across zones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ZoneTotals {
    pub responders: u64,
    pub evacuated: u64,
    pub affected: u64,
}

pub fn totals(zones: &[Zone]) -> ZoneTotals {
    zones.iter().fold(ZoneTotals::default(), |mut totals, zone| {
        totals.responders += u64::from(zone.responders);
        totals.evacuated += u64::from(zone.evacuated);
        totals.affected += u64::from(zone.affected);
        totals
    })
}
