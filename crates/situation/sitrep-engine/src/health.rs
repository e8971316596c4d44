//! System health aggregation
//!
//! Combines the status of the analysis subsystems (detection models, route
//! optimizer, resource predictor) into the single indicator shown in the
//! dashboard header, together with system load and active incident count.

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::resources::{overall_utilization, DeploymentUnit};
use crate::zones::{filter_by_status, Zone, ZoneStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Known analysis subsystems
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubsystemKind {
    /// Computer-vision hazard detection
    CvModel,
    /// Field message classifier
    NlpModel,
    RouteOptimizer,
    ResourcePredictor,
}

impl SubsystemKind {
    pub const ALL: [SubsystemKind; 4] = [
        SubsystemKind::CvModel,
        SubsystemKind::NlpModel,
        SubsystemKind::RouteOptimizer,
        SubsystemKind::ResourcePredictor,
    ];
}

impl FromStr for SubsystemKind {
    type Err = EngineError;

    /// Accepts `cv_model`, `cvModel` and `cv-model` spellings
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "cvmodel" => Ok(Self::CvModel),
            "nlpmodel" => Ok(Self::NlpModel),
            "routeoptimizer" => Ok(Self::RouteOptimizer),
            "resourcepredictor" => Ok(Self::ResourcePredictor),
            _ => Err(EngineError::label("subsystem", s)),
        }
    }
}

impl fmt::Display for SubsystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CvModel => "cv_model",
            Self::NlpModel => "nlp_model",
            Self::RouteOptimizer => "route_optimizer",
            Self::ResourcePredictor => "resource_predictor",
        };
        f.write_str(name)
    }
}

/// Operational state of a subsystem, also used for the overall indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubsystemState {
    Online,
    Processing,
    Offline,
}

impl FromStr for SubsystemState {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "online" => Ok(Self::Online),
            "processing" => Ok(Self::Processing),
            "offline" => Ok(Self::Offline),
            _ => Err(EngineError::label("subsystem state", s)),
        }
    }
}

impl fmt::Display for SubsystemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Online => write!(f, "online"),
            Self::Processing => write!(f, "processing"),
            Self::Offline => write!(f, "offline"),
        }
    }
}

/// Subsystem status as reported upstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSubsystem {
    #[serde(alias = "status")]
    pub state: String,
    #[serde(alias = "lastUpdate")]
    pub last_update: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsystemStatus {
    pub kind: SubsystemKind,
    pub state: SubsystemState,
    pub last_update: DateTime<Utc>,
}

/// Validate a component name -> status mapping, ordered by component
pub fn validate_subsystems(raw: &HashMap<String, RawSubsystem>) -> Result<Vec<SubsystemStatus>> {
    let mut components = BTreeMap::new();
    for (name, status) in raw {
        let kind = name.parse::<SubsystemKind>()?;
        let state = status.state.parse::<SubsystemState>()?;
        let entry = SubsystemStatus {
            kind,
            state,
            last_update: status.last_update,
        };
        if components.insert(kind, entry).is_some() {
            return Err(EngineError::label("subsystem", format!("{name} (reported twice)")));
        }
    }
    Ok(components.into_values().collect())
}

/// Overall state: offline beats processing beats online
pub fn overall_state(components: &[SubsystemStatus]) -> SubsystemState {
    if components.iter().any(|c| c.state == SubsystemState::Offline) {
        SubsystemState::Offline
    } else if components.iter().any(|c| c.state == SubsystemState::Processing) {
        SubsystemState::Processing
    } else {
        SubsystemState::Online
    }
}

/// Configured load when set, else deployment utilization
pub fn system_load(config: &EngineConfig, deployments: &[DeploymentUnit]) -> f64 {
    config
        .system_load
        .unwrap_or_else(|| overall_utilization(deployments))
}

/// Header/footer health indicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSummary {
    pub overall: SubsystemState,
    /// 0-100
    pub system_load: f64,
    pub active_incidents: usize,
    pub online: usize,
    pub processing: usize,
    pub offline: usize,
    pub components: Vec<SubsystemStatus>,
}

impl HealthSummary {
    pub fn aggregate(components: Vec<SubsystemStatus>, zones: &[Zone], system_load: f64) -> Self {
        let count = |state: SubsystemState| components.iter().filter(|c| c.state == state).count();
        Self {
            overall: overall_state(&components),
            system_load,
            active_incidents: filter_by_status(zones, ZoneStatus::Active).count(),
            online: count(SubsystemState::Online),
            processing: count(SubsystemState::Processing),
            offline: count(SubsystemState::Offline),
            components,
        }
    }

    /// Components that are not online
    pub fn degraded(&self) -> impl Iterator<Item = &SubsystemStatus> {
        self.components.iter().filter(|c| c.state != SubsystemState::Online)
    }

    /// One-line status for the dashboard footer
    pub fn summary(&self) -> String {
        match self.overall {
            SubsystemState::Online => format!(
                "All {} subsystems online. Load {:.0}%, {} active incidents.",
                self.components.len(),
                self.system_load,
                self.active_incidents
            ),
            SubsystemState::Processing => format!(
                "{} subsystem(s) processing. Load {:.0}%, {} active incidents.",
                self.processing, self.system_load, self.active_incidents
            ),
            SubsystemState::Offline => {
                let names: Vec<String> = self
                    .components
                    .iter()
                    .filter(|c| c.state == SubsystemState::Offline)
                    .map(|c| c.kind.to_string())
                    .collect();
                format!("OFFLINE: {}. {} active incidents.", names.join(", "), self.active_incidents)
            }
        }
    }
}
