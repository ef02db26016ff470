//! Simulated production line
//!
//! Leaf-to-root: bottle generator, conveyor motion, inspection zone detector and
//! the separator state machine with its machine-health model.

pub mod config;
pub mod conveyor;
pub mod detector;
pub mod event;
pub mod generator;
pub mod separator;
pub mod types;

// Re-export main types
pub use config::{ConfigError, ConfigResult, DefectWeights, LineConfig, SpawnPolicy};
pub use conveyor::{should_remove, Conveyor, EXIT_THRESHOLD, QUARANTINE_EXIT_THRESHOLD};
pub use detector::{Detection, InspectionZone, INSPECTION_CENTER};
pub use event::LineEvent;
pub use generator::BottleGenerator;
pub use separator::{
    health_level, HealthLevel, ProductionStats, Separator, SystemStatus, Transition,
    APPROVAL_POSITION, PRESSURE_CEILING, PRESSURE_FLOOR, QUARANTINE_POSITION, SPEED_MAX, SPEED_MIN,
};
pub use types::{Bottle, BottleId, BottleStage, BottleView};
