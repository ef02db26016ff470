//! Bottleline
//!
//! A headless, deterministic simulation of an industrial bottle-inspection line
//! with label, dent, cap and liquid-level defects, plus defect-pattern analytics
//! over cyclic line positions.
//!
//! # Architecture
//!
//! Data flows one way through a fixed-step loop:
//!
//! - Generator: synthetic bottles with defect tags and fill levels
//! - Conveyor: advances positions, purges bottles that left the line
//! - Detector: one detection per bottle crossing the inspection window
//! - Separator: `OnLine -> Ejected -> Quarantined` plus the machine-health model
//! - Aggregator: per-position defect counts and confidence-scored insights
//!   (see the `bottleline-patterns` crate)
//!
//! [`LineController`] owns all of it and publishes [`LineEvent`]s to subscribers.
//!
//! ## Example Usage
//!
//! ```rust
//! use bottleline::{DefectType, LineConfig, LineController};
//!
//! let config = LineConfig { auto_mode: false, ..LineConfig::default().with_seed(7) };
//! let mut line = LineController::new(config).unwrap();
//!
//! line.handle_detection_change(DefectType::Cap);
//! for _ in 0..200 {
//!     line.tick();
//! }
//!
//! assert_eq!(line.inspected_count(), 1);
//! assert_eq!(line.production_stats().rejected_count, 1);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod controller;
pub mod inspection;
pub mod line;

// Re-export main types for convenience
pub use controller::{LineController, LineError, LineResult, LineSnapshot};

pub use inspection::{DefectShares, InspectionContext, InspectionStatistics, InspectionStatus};

pub use line::{
    Bottle, BottleId, BottleStage, BottleView, ConfigError, ConfigResult, DefectWeights,
    Detection, HealthLevel, LineConfig, LineEvent, ProductionStats, SpawnPolicy, SystemStatus,
};

pub use bottleline_patterns::{
    DefectCounts, DefectPatterns, DefectSet, DefectType, Insight, InsightKind, PatternAlert,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
