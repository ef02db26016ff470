//! Core type definitions for the simulated line

use bottleline_patterns::{DefectSet, DefectType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a bottle, assigned at creation and never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct BottleId(pub u64);

impl BottleId {
    pub fn new(id: u64) -> Self {
        BottleId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BottleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BottleId({})", self.0)
    }
}

impl From<u64> for BottleId {
    fn from(id: u64) -> Self {
        BottleId(id)
    }
}

/// Lifecycle stage of a bottle; only ever moves forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BottleStage {
    /// Travelling on the main line
    OnLine,
    /// Knocked off by the separator and falling toward the quarantine chute
    Ejected,
    /// Resting in quarantine until purged
    Quarantined,
}

/// A unit moving through the simulated line
#[derive(Debug, Clone, PartialEq)]
pub struct Bottle {
    id: BottleId,
    types: DefectSet,
    fill_level: u8,
    /// Slots travelled since entry
    pub(crate) position: f64,
    pub(crate) stage: BottleStage,
    /// Detection event already emitted
    pub(crate) detected: bool,
    /// Approval already counted
    pub(crate) counted: bool,
}

impl Bottle {
    pub(crate) fn new(id: BottleId, types: DefectSet, fill_level: u8) -> Self {
        Self {
            id,
            types,
            fill_level,
            position: 0.0,
            stage: BottleStage::OnLine,
            detected: false,
            counted: false,
        }
    }

    pub fn id(&self) -> BottleId {
        self.id
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    /// True when at least one real defect was assigned at creation
    pub fn has_issue(&self) -> bool {
        !self.types.is_clean()
    }

    pub fn types(&self) -> &DefectSet {
        &self.types
    }

    pub fn has_defect(&self, defect: DefectType) -> bool {
        self.types.contains(defect)
    }

    pub fn fill_level(&self) -> u8 {
        self.fill_level
    }

    pub fn stage(&self) -> BottleStage {
        self.stage
    }

    pub fn ejected(&self) -> bool {
        self.stage >= BottleStage::Ejected
    }

    pub fn in_quarantine(&self) -> bool {
        self.stage == BottleStage::Quarantined
    }

    pub fn detected(&self) -> bool {
        self.detected
    }

    /// Read-only projection handed to renderers
    pub fn view(&self) -> BottleView {
        BottleView {
            id: self.id,
            position: self.position,
            types: self.types.clone(),
            fill_level: self.fill_level,
            ejected: self.ejected(),
            in_quarantine: self.in_quarantine(),
        }
    }
}

/// Snapshot of a bottle for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BottleView {
    pub id: BottleId,
    pub position: f64,
    pub types: DefectSet,
    pub fill_level: u8,
    pub ejected: bool,
    pub in_quarantine: bool,
}
