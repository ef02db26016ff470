//! Defect pattern aggregation by cyclic line slot
//!
//! Each inspected bottle is assigned the next slot of a cyclic counter
//! (`counter mod line_length`), independent of where it physically sits on the
//! conveyor. Defect occurrences are accumulated per slot for the whole session.

use super::defect::{DefectCounts, DefectSet, DefectType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of cyclic slots on the simulated line
pub const DEFAULT_LINE_LENGTH: u32 = 30;

/// A slot that already holds this many occurrences of a type raises an alert
/// when one more is recorded
pub const PATTERN_ALERT_THRESHOLD: u64 = 3;

/// Raised when a defect keeps recurring at the same slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternAlert {
    pub slot: u32,
    pub defect: DefectType,
    /// Count after the triggering occurrence was recorded
    pub count: u64,
}

/// Outcome of recording one inspected bottle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRecord {
    pub slot: u32,
    pub alerts: Vec<PatternAlert>,
}

/// Cumulative defect counts keyed by cyclic slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectPatterns {
    line_length: u32,
    /// Bottles assigned a slot so far (clean ones included)
    slot_counter: u64,
    slots: BTreeMap<u32, DefectCounts>,
}

impl DefectPatterns {
    /// Create an empty aggregator; a zero line length is treated as one slot
    pub fn new(line_length: u32) -> Self {
        Self {
            line_length: line_length.max(1),
            slot_counter: 0,
            slots: BTreeMap::new(),
        }
    }

    pub fn line_length(&self) -> u32 {
        self.line_length
    }

    /// Total bottles that have been assigned a slot
    pub fn bottles_recorded(&self) -> u64 {
        self.slot_counter
    }

    /// Slot the next recorded bottle will occupy
    pub fn next_slot(&self) -> u32 {
        (self.slot_counter % self.line_length as u64) as u32
    }

    /// Assign the next slot to a bottle and count its defects there.
    ///
    /// Clean bottles still advance the slot counter but leave no counts behind.
    pub fn record(&mut self, types: &DefectSet) -> SlotRecord {
        let slot = self.next_slot();
        self.slot_counter += 1;

        let mut alerts = Vec::new();
        for defect in types.defects() {
            let count = self.add_occurrence(slot, defect);
            if count > PATTERN_ALERT_THRESHOLD {
                alerts.push(PatternAlert { slot, defect, count });
            }
        }

        SlotRecord { slot, alerts }
    }

    /// Count one occurrence of `defect` at `slot` (wrapped onto the line).
    /// Returns the new count; `none` is ignored and returns 0.
    pub fn add_occurrence(&mut self, slot: u32, defect: DefectType) -> u64 {
        if !defect.is_defect() {
            return 0;
        }
        let slot = slot % self.line_length;
        self.slots.entry(slot).or_default().increment(defect)
    }

    pub fn get(&self, slot: u32) -> Option<&DefectCounts> {
        self.slots.get(&slot)
    }

    /// Occupied slots in ascending order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &DefectCounts)> + '_ {
        self.slots.iter().map(|(&slot, counts)| (slot, counts))
    }

    /// Slots where `defect` has been seen at least once, ascending
    pub fn slots_with(&self, defect: DefectType) -> Vec<u32> {
        self.slots
            .iter()
            .filter(|(_, counts)| counts.get(defect) > 0)
            .map(|(&slot, _)| slot)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Plain copy of the slot map for presentation
    pub fn snapshot(&self) -> BTreeMap<u32, DefectCounts> {
        self.slots.clone()
    }
}

impl Default for DefectPatterns {
    fn default() -> Self {
        Self::new(DEFAULT_LINE_LENGTH)
    }
}
