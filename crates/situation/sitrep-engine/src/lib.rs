//! # Sitrep Engine
//!
//! Situational aggregation and classification engine for disaster response
//! dashboards. Turns raw observations (zone detections, resource counts,
//! field messages, weather samples, subsystem status) into the derived state
//! a dashboard renders.
//!
//! ## Key Features
//! - Ordered severity/priority tiers with strict label validation
//! - Resource shortage/adequate/surplus evaluation with configurable thresholds
//! - Risk-ordered zone views and high-priority counters
//! - Message triage with a forward-only status lifecycle
//! - Rule-based environmental risk scoring from rain, humidity and quakes
//! - Overall system health indicator
//! - Immutable, versioned snapshots with last-good retention
//!
//! The engine performs no I/O and holds no process-wide state. Stores such as
//! [`MessageBoard`] and [`SnapshotAssembler`] are owned by the caller.

pub mod classification;
pub mod config;
pub mod error;
pub mod health;
pub mod messages;
pub mod resources;
pub mod risk;
pub mod snapshot;
pub mod weather;
pub mod zones;

// Re-export main types
pub use classification::{SemanticTier, Tier};
pub use crate::config::{EngineConfig, RiskThresholds, SubmitScores};
pub use error::{EngineError, Result};
pub use health::{HealthSummary, SubsystemKind, SubsystemState, SubsystemStatus};
pub use messages::{Message, MessageBoard, MessageId, MessageStatus, RawMessage};
pub use resources::{DeploymentUnit, ResourceCategory, ResourceMetrics, ResourceStatus, ResourceSummary};
pub use risk::{RiskAssessment, RiskFactor};
pub use snapshot::{Counters, RawBundle, Snapshot, SnapshotAssembler};
pub use weather::{WeatherSample, WeatherSeries, WeatherSummary};
pub use zones::{HazardKind, Zone, ZoneStatus};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
