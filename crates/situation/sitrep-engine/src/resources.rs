//! Resource sufficiency evaluation
//!
//! Turns current/estimated/allocated counts for a resource category into a
//! sufficiency status and the percentages shown on resource cards. Deployment
//! units (teams, vehicles, supply pools) are evaluated here as well.

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource sufficiency status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    /// Below the adequacy threshold
    Shortage,
    /// Between the adequacy and surplus thresholds (inclusive)
    Adequate,
    /// Above the surplus threshold
    Surplus,
}

impl ResourceStatus {
    /// Classify a current/estimated ratio
    pub fn from_ratio(ratio: f64, config: &EngineConfig) -> Self {
        if ratio < config.adequacy_threshold {
            Self::Shortage
        } else if ratio <= config.surplus_threshold {
            Self::Adequate
        } else {
            Self::Surplus
        }
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shortage => write!(f, "shortage"),
            Self::Adequate => write!(f, "adequate"),
            Self::Surplus => write!(f, "surplus"),
        }
    }
}

/// Raw resource counts as reported upstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResource {
    pub name: String,
    pub zone: String,
    pub current: f64,
    pub estimated: f64,
    #[serde(default)]
    pub allocated: f64,
    /// Explicit override for the derived needed quantity
    #[serde(default)]
    pub needed: Option<f64>,
}

/// Derived metrics for one set of counts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceMetrics {
    /// Raw current/estimated ratio, unclamped
    pub ratio: f64,
    /// Rounded percentage of need covered, clamped to 0-100
    pub percent_allocated: u8,
    pub needed: f64,
    pub status: ResourceStatus,
}

/// Evaluated resource category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceCategory {
    pub name: String,
    pub zone: String,
    pub current: f64,
    pub estimated: f64,
    pub allocated: f64,
    pub metrics: ResourceMetrics,
    /// Whether allocated + needed matches the estimate within tolerance
    pub reconciled: bool,
}

impl ResourceCategory {
    pub fn status(&self) -> ResourceStatus {
        self.metrics.status
    }

    pub fn needed(&self) -> f64 {
        self.metrics.needed
    }

    pub fn is_shortage(&self) -> bool {
        self.metrics.status == ResourceStatus::Shortage
    }
}

fn check_quantity(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(EngineError::quantity(format!(
            "{field} must be a non-negative number, got {value}"
        )));
    }
    Ok(())
}

/// Evaluate sufficiency for one set of counts
pub fn evaluate(current: f64, estimated: f64, allocated: f64, config: &EngineConfig) -> Result<ResourceMetrics> {
    check_quantity("current", current)?;
    check_quantity("allocated", allocated)?;
    if !estimated.is_finite() || estimated <= 0.0 {
        return Err(EngineError::quantity(format!(
            "estimated must be positive, got {estimated}"
        )));
    }

    let ratio = current / estimated;
    let percent_allocated = (ratio * 100.0).round().clamp(0.0, 100.0) as u8;
    let needed = (estimated - current).max(0.0);

    Ok(ResourceMetrics {
        ratio,
        percent_allocated,
        needed,
        status: ResourceStatus::from_ratio(ratio, config),
    })
}

impl RawResource {
    /// Validate and evaluate this resource category
    pub fn evaluate(&self, config: &EngineConfig) -> Result<ResourceCategory> {
        let mut metrics = evaluate(self.current, self.estimated, self.allocated, config)
            .map_err(|e| match e {
                EngineError::InvalidQuantity(msg) => {
                    EngineError::quantity(format!("resource '{}': {}", self.name, msg))
                }
                other => other,
            })?;

        if let Some(needed) = self.needed {
            check_quantity("needed", needed)?;
            metrics.needed = needed;
        }

        let drift = (self.allocated + metrics.needed - self.estimated).abs();
        let reconciled = drift <= config.reconcile_tolerance * self.estimated;
        if !reconciled {
            tracing::warn!(
                resource = %self.name,
                zone = %self.zone,
                allocated = self.allocated,
                needed = metrics.needed,
                estimated = self.estimated,
                "Resource allocation does not reconcile with estimate"
            );
        }

        Ok(ResourceCategory {
            name: self.name.clone(),
            zone: self.zone.clone(),
            current: self.current,
            estimated: self.estimated,
            allocated: self.allocated,
            metrics,
            reconciled,
        })
    }
}

/// Raw deployment unit counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDeployment {
    pub name: String,
    pub deployed: i64,
    pub available: i64,
    pub total: i64,
}

/// Validated deployment unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentUnit {
    pub name: String,
    pub deployed: u32,
    pub available: u32,
    pub total: u32,
}

fn count(field: &str, owner: &str, value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        EngineError::quantity(format!("{owner}: {field} must be a non-negative count, got {value}"))
    })
}

impl RawDeployment {
    pub fn validate(&self) -> Result<DeploymentUnit> {
        let deployed = count("deployed", &self.name, self.deployed)?;
        let available = count("available", &self.name, self.available)?;
        let total = count("total", &self.name, self.total)?;

        if u64::from(deployed) + u64::from(available) > u64::from(total) {
            return Err(EngineError::quantity(format!(
                "{}: deployed ({}) + available ({}) exceeds total ({})",
                self.name, deployed, available, total
            )));
        }

        Ok(DeploymentUnit {
            name: self.name.clone(),
            deployed,
            available,
            total,
        })
    }
}

impl DeploymentUnit {
    /// Share of the unit that is deployed, rounded to a percentage
    pub fn utilization_percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        (f64::from(self.deployed) / f64::from(self.total) * 100.0).round() as u8
    }
}

/// Deployment utilization across all units, 0 when nothing is deployable
pub fn overall_utilization(units: &[DeploymentUnit]) -> f64 {
    let deployed: u64 = units.iter().map(|u| u64::from(u.deployed)).sum();
    let total: u64 = units.iter().map(|u| u64::from(u.total)).sum();
    if total == 0 {
        0.0
    } else {
        (deployed as f64 / total as f64 * 100.0).round()
    }
}

/// Cross-category resource counters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceSummary {
    pub shortage_count: usize,
    pub adequate_count: usize,
    pub surplus_count: usize,
    /// Overall Σcurrent/Σestimated as a clamped percentage
    pub percent_allocated: u8,
    pub total_needed: f64,
}

impl ResourceSummary {
    pub fn from_categories(categories: &[ResourceCategory]) -> Self {
        let mut summary = Self::default();
        let mut current = 0.0;
        let mut estimated = 0.0;

        for category in categories {
            match category.status() {
                ResourceStatus::Shortage => summary.shortage_count += 1,
                ResourceStatus::Adequate => summary.adequate_count += 1,
                ResourceStatus::Surplus => summary.surplus_count += 1,
            }
            current += category.current;
            estimated += category.estimated;
            summary.total_needed += category.needed();
        }

        if estimated > 0.0 {
            summary.percent_allocated = (current / estimated * 100.0).round().clamp(0.0, 100.0) as u8;
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(current: f64, estimated: f64, allocated: f64) -> RawResource {
        RawResource {
            name: "medical".to_string(),
            zone: "Alpha".to_string(),
            current,
            estimated,
            allocated,
            needed: None,
        }
    }

    #[test]
    fn test_shortage() {
        let config = EngineConfig::default();
        let metrics = evaluate(125.0, 200.0, 75.0, &config).unwrap();
        assert_eq!(metrics.status, ResourceStatus::Shortage);
        assert_eq!(metrics.needed, 75.0);
        assert_eq!(metrics.percent_allocated, 63);
    }

    #[test]
    fn test_exact_match_is_adequate() {
        let config = EngineConfig::default();
        let metrics = evaluate(600.0, 600.0, 0.0, &config).unwrap();
        assert_eq!(metrics.status, ResourceStatus::Adequate);
        assert_eq!(metrics.needed, 0.0);
        assert_eq!(metrics.percent_allocated, 100);
    }

    #[test]
    fn test_threshold_boundaries() {
        let config = EngineConfig::default();
        assert_eq!(evaluate(90.0, 100.0, 0.0, &config).unwrap().status, ResourceStatus::Adequate);
        assert_eq!(evaluate(89.0, 100.0, 0.0, &config).unwrap().status, ResourceStatus::Shortage);
        assert_eq!(evaluate(101.0, 100.0, 0.0, &config).unwrap().status, ResourceStatus::Surplus);
    }

    #[test]
    fn test_surplus_keeps_raw_ratio() {
        let config = EngineConfig::default();
        let metrics = evaluate(300.0, 200.0, 0.0, &config).unwrap();
        assert_eq!(metrics.status, ResourceStatus::Surplus);
        assert_eq!(metrics.percent_allocated, 100);
        assert_eq!(metrics.ratio, 1.5);
        assert_eq!(metrics.needed, 0.0);
    }

    #[test]
    fn test_configured_threshold() {
        let config = EngineConfig {
            adequacy_threshold: 0.5,
            ..EngineConfig::default()
        };
        let metrics = evaluate(125.0, 200.0, 0.0, &config).unwrap();
        assert_eq!(metrics.status, ResourceStatus::Adequate);
    }

    #[test]
    fn test_invalid_quantities() {
        let config = EngineConfig::default();
        assert!(matches!(evaluate(10.0, 0.0, 0.0, &config), Err(EngineError::InvalidQuantity(_))));
        assert!(matches!(evaluate(-1.0, 10.0, 0.0, &config), Err(EngineError::InvalidQuantity(_))));
        assert!(matches!(evaluate(1.0, f64::NAN, 0.0, &config), Err(EngineError::InvalidQuantity(_))));
        assert!(matches!(evaluate(1.0, 10.0, -3.0, &config), Err(EngineError::InvalidQuantity(_))));
    }

    #[test]
    fn test_needed_override_and_reconciliation() {
        let config = EngineConfig::default();

        let category = raw(125.0, 200.0, 125.0).evaluate(&config).unwrap();
        assert_eq!(category.needed(), 75.0);
        assert!(category.reconciled);

        let mut overridden = raw(75.0, 200.0, 125.0);
        overridden.needed = Some(125.0);
        let category = overridden.evaluate(&config).unwrap();
        assert_eq!(category.needed(), 125.0);
        assert!(!category.reconciled);
        assert!(category.is_shortage());
    }

    #[test]
    fn test_error_names_resource() {
        let err = raw(1.0, 0.0, 0.0).evaluate(&EngineConfig::default()).unwrap_err();
        assert!(err.to_string().contains("medical"));
    }

    #[test]
    fn test_deployment_validation() {
        let unit = RawDeployment {
            name: "Rescue Units".to_string(),
            deployed: 6,
            available: 4,
            total: 10,
        }
        .validate()
        .unwrap();
        assert_eq!(unit.utilization_percent(), 60);

        let over = RawDeployment {
            name: "Rescue Units".to_string(),
            deployed: 8,
            available: 4,
            total: 10,
        };
        assert!(matches!(over.validate(), Err(EngineError::InvalidQuantity(_))));

        let negative = RawDeployment {
            name: "Transport".to_string(),
            deployed: -1,
            available: 0,
            total: 5,
        };
        assert!(matches!(negative.validate(), Err(EngineError::InvalidQuantity(_))));
    }

    #[test]
    fn test_overall_utilization() {
        let units = vec![
            DeploymentUnit { name: "Medical Teams".into(), deployed: 8, available: 12, total: 20 },
            DeploymentUnit { name: "Rescue Units".into(), deployed: 6, available: 4, total: 10 },
            DeploymentUnit { name: "Emergency Supplies".into(), deployed: 65, available: 35, total: 100 },
            DeploymentUnit { name: "Transport Vehicles".into(), deployed: 15, available: 10, total: 25 },
        ];
        // 94 / 155
        assert_eq!(overall_utilization(&units), 61.0);
        assert_eq!(overall_utilization(&[]), 0.0);
    }

    #[test]
    fn test_summary() {
        let config = EngineConfig::default();
        let categories = vec![
            raw(75.0, 200.0, 125.0).evaluate(&config).unwrap(),
            raw(600.0, 600.0, 0.0).evaluate(&config).unwrap(),
            raw(25.0, 20.0, 0.0).evaluate(&config).unwrap(),
        ];
        let summary = ResourceSummary::from_categories(&categories);
        assert_eq!(summary.shortage_count, 1);
        assert_eq!(summary.adequate_count, 1);
        assert_eq!(summary.surplus_count, 1);
        // 700 / 820
        assert_eq!(summary.percent_allocated, 85);
        assert_eq!(summary.total_needed, 125.0);
    }
}
