//! Snapshot assembly
//!
//! One raw bundle per refresh cycle goes in, one immutable [`Snapshot`] comes
//! out. Assembly is all-or-nothing: every input is validated before anything
//! is published, and a failed cycle leaves the last good snapshot in place.

use crate::config::EngineConfig;
use crate::error::Result;
use crate::health::{self, HealthSummary, RawSubsystem};
use crate::messages::{self, Message, MessageBoard, RawMessage};
use crate::resources::{DeploymentUnit, RawDeployment, RawResource, ResourceCategory, ResourceSummary};
use crate::risk::{self, RiskAssessment};
use crate::weather::{WeatherSample, WeatherSeries, WeatherSummary};
use crate::zones::{self, RawZone, TierCounts, Zone, ZoneStatus, ZoneTotals};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Raw inputs captured at one ingestion instant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawBundle {
    pub zones: Vec<RawZone>,
    pub resources: Vec<RawResource>,
    pub deployments: Vec<RawDeployment>,
    pub messages: Vec<RawMessage>,
    pub weather: Vec<WeatherSample>,
    pub subsystems: HashMap<String, RawSubsystem>,
    /// Largest quake magnitude reported over the last 72 hours
    #[serde(alias = "max_magnitude_72h")]
    pub max_magnitude: Option<f64>,
    /// When the collaborator captured the bundle
    pub captured_at: Option<DateTime<Utc>>,
}

/// Cross-entity counters shown in the dashboard header
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Counters {
    pub high_priority_zones: usize,
    pub active_incidents: usize,
    /// 0-100
    pub system_load: f64,
    /// Unresolved HIGH/CRITICAL messages
    pub open_alerts: usize,
    pub open_messages: usize,
    /// Overall share of estimated resource need currently on hand
    pub percent_allocated: u8,
}

/// Immutable, versioned view of all derived dashboard state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    id: Uuid,
    version: u64,
    generated_at: DateTime<Utc>,
    captured_at: Option<DateTime<Utc>>,
    zones: Vec<Zone>,
    zone_counts: TierCounts,
    zone_totals: ZoneTotals,
    resources: Vec<ResourceCategory>,
    resource_summary: ResourceSummary,
    deployments: Vec<DeploymentUnit>,
    messages: Vec<Message>,
    weather: WeatherSeries,
    weather_summary: Option<WeatherSummary>,
    risk: RiskAssessment,
    health: HealthSummary,
    counters: Counters,
}

impl Snapshot {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Monotonically increasing per assembler
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        self.captured_at
    }

    /// Zones in risk order
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn high_priority_zones(&self) -> impl Iterator<Item = &Zone> + Clone {
        zones::high_priority(&self.zones)
    }

    pub fn zones_with_status(&self, status: ZoneStatus) -> impl Iterator<Item = &Zone> + Clone {
        zones::filter_by_status(&self.zones, status)
    }

    pub fn zone_counts(&self) -> TierCounts {
        self.zone_counts
    }

    pub fn zone_totals(&self) -> ZoneTotals {
        self.zone_totals
    }

    pub fn resources(&self) -> &[ResourceCategory] {
        &self.resources
    }

    pub fn shortages(&self) -> impl Iterator<Item = &ResourceCategory> {
        self.resources.iter().filter(|r| r.is_shortage())
    }

    pub fn resource_summary(&self) -> ResourceSummary {
        self.resource_summary
    }

    pub fn deployments(&self) -> &[DeploymentUnit] {
        &self.deployments
    }

    /// Messages in triage order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn open_messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.is_open())
    }

    pub fn weather(&self) -> &WeatherSeries {
        &self.weather
    }

    pub fn weather_summary(&self) -> Option<&WeatherSummary> {
        self.weather_summary.as_ref()
    }

    /// Environmental risk from the bundle's weather and seismic readings
    pub fn risk(&self) -> &RiskAssessment {
        &self.risk
    }

    pub fn health(&self) -> &HealthSummary {
        &self.health
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    /// Header line for the dashboard
    pub fn headline(&self) -> String {
        format!(
            "{} high-priority zones, {} active incidents, {} open alerts. {}% of resource need covered. Systems {}.",
            self.counters.high_priority_zones,
            self.counters.active_incidents,
            self.counters.open_alerts,
            self.counters.percent_allocated,
            self.health.overall
        )
    }
}

/// Validated inputs, before version/identity are stamped
struct Derived {
    zones: Vec<Zone>,
    resources: Vec<ResourceCategory>,
    deployments: Vec<DeploymentUnit>,
    messages: Vec<Message>,
    weather: WeatherSeries,
    risk: RiskAssessment,
    health: HealthSummary,
}

/// Builds snapshots and retains the last good one
///
/// Owned by the application layer, typically one per session. Safe to share
/// between threads.
pub struct SnapshotAssembler {
    config: EngineConfig,
    version: AtomicU64,
    latest: RwLock<Option<Arc<Snapshot>>>,
}

impl SnapshotAssembler {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            version: AtomicU64::new(0),
            latest: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Version of the last published snapshot, 0 before the first
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Last successfully assembled snapshot
    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.latest.read().clone()
    }

    /// Assemble a snapshot from one raw bundle
    pub fn assemble(&self, bundle: &RawBundle) -> Result<Arc<Snapshot>> {
        self.assemble_session(bundle, &MessageBoard::new(&self.config))
    }

    /// Assemble a snapshot, merging the session's operator messages
    ///
    /// See [`MessageBoard::with_feed`]: the board's entries are ordered after
    /// the bundle's messages, and the caller's board is not modified.
    pub fn assemble_session(&self, bundle: &RawBundle, board: &MessageBoard) -> Result<Arc<Snapshot>> {
        let derived = match self.derive(bundle, board) {
            Ok(derived) => derived,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    retained_version = self.version(),
                    "Rejected raw bundle, keeping last good snapshot"
                );
                return Err(e);
            }
        };

        let resource_summary = ResourceSummary::from_categories(&derived.resources);
        let counters = Counters {
            high_priority_zones: zones::count_high_priority(&derived.zones),
            active_incidents: derived.health.active_incidents,
            system_load: derived.health.system_load,
            open_alerts: derived
                .messages
                .iter()
                .filter(|m| m.is_open() && m.is_high_priority())
                .count(),
            open_messages: derived.messages.iter().filter(|m| m.is_open()).count(),
            percent_allocated: resource_summary.percent_allocated,
        };

        let mut latest = self.latest.write();
        let version = self.version.fetch_add(1, Ordering::AcqRel) + 1;
        let snapshot = Arc::new(Snapshot {
            id: Uuid::new_v4(),
            version,
            generated_at: Utc::now(),
            captured_at: bundle.captured_at,
            zone_counts: zones::counts_by_tier(&derived.zones),
            zone_totals: zones::totals(&derived.zones),
            resource_summary,
            weather_summary: derived.weather.summary(),
            zones: derived.zones,
            resources: derived.resources,
            deployments: derived.deployments,
            messages: derived.messages,
            weather: derived.weather,
            risk: derived.risk,
            health: derived.health,
            counters,
        });
        *latest = Some(snapshot.clone());

        tracing::info!(
            version,
            zones = snapshot.zones.len(),
            messages = snapshot.messages.len(),
            high_priority_zones = counters.high_priority_zones,
            overall = %snapshot.health.overall,
            "Published snapshot"
        );
        Ok(snapshot)
    }

    fn derive(&self, bundle: &RawBundle, board: &MessageBoard) -> Result<Derived> {
        let config = &self.config;

        let zones = bundle
            .zones
            .iter()
            .map(RawZone::validate)
            .collect::<Result<Vec<_>>>()?;
        let zones = zones::classify(&zones);
        tracing::debug!(count = zones.len(), "Classified zones");

        let resources = bundle
            .resources
            .iter()
            .map(|r| r.evaluate(config))
            .collect::<Result<Vec<_>>>()?;
        let deployments = bundle
            .deployments
            .iter()
            .map(RawDeployment::validate)
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(resources = resources.len(), deployments = deployments.len(), "Evaluated resources");

        let session = board.with_feed(&bundle.messages)?;
        let messages = messages::rank(session.messages());
        tracing::debug!(count = messages.len(), "Ranked messages");

        let weather = WeatherSeries::from_samples(bundle.weather.clone())?;
        let risk = risk::assess_risk(&weather, bundle.max_magnitude, &config.risk)?;

        let components = health::validate_subsystems(&bundle.subsystems)?;
        let load = health::system_load(config, &deployments);
        let health = HealthSummary::aggregate(components, &zones, load);

        Ok(Derived {
            zones,
            resources,
            deployments,
            messages,
            weather,
            risk,
            health,
        })
    }
}

impl Default for SnapshotAssembler {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
