//! Line events for subscribers
//!
//! Everything the presentation layer needs to react to, published in tick order.

use super::detector::Detection;
use super::separator::HealthLevel;
use super::types::{BottleId, BottleStage};
use bottleline_patterns::{DefectSet, PatternAlert};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LineEvent {
    Spawned {
        bottle_id: BottleId,
        types: DefectSet,
        fill_level: u8,
    },
    /// One per bottle, the first time it is sampled in the inspection window
    Detected(Detection),
    Ejected {
        bottle_id: BottleId,
        sim_time_ms: u64,
    },
    Quarantined {
        bottle_id: BottleId,
    },
    Approved {
        bottle_id: BottleId,
    },
    Removed {
        bottle_id: BottleId,
        stage: BottleStage,
    },
    PatternAlert(PatternAlert),
    HealthChanged {
        from: HealthLevel,
        to: HealthLevel,
    },
}

impl LineEvent {
    /// Bottle the event refers to, if any
    pub fn bottle_id(&self) -> Option<BottleId> {
        match self {
            LineEvent::Spawned { bottle_id, .. }
            | LineEvent::Ejected { bottle_id, .. }
            | LineEvent::Quarantined { bottle_id }
            | LineEvent::Approved { bottle_id }
            | LineEvent::Removed { bottle_id, .. } => Some(*bottle_id),
            LineEvent::Detected(detection) => Some(detection.bottle_id),
            LineEvent::PatternAlert(_) | LineEvent::HealthChanged { .. } => None,
        }
    }
}
