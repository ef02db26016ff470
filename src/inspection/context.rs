//! Inspection context: what the camera has seen so far
//!
//! Holds the inspection-side counters, the status indicator and the defect
//! pattern aggregator. Fed one detection at a time by the controller.

use crate::line::Detection;
use bottleline_patterns::{
    derive_insights, DefectCounts, DefectPatterns, DefectSet, Insight, SlotRecord,
};
use serde::{Deserialize, Serialize};

/// Indicator shown next to the last inspection result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InspectionStatus {
    Success,
    Error,
    Warning,
    Idle,
}

#[derive(Debug, Clone)]
pub struct InspectionContext {
    status: InspectionStatus,
    last_types: DefectSet,
    inspected_count: u64,
    rejected_count: u64,
    defect_counts: DefectCounts,
    patterns: DefectPatterns,
}

impl InspectionContext {
    pub fn new(line_length: u32) -> Self {
        Self {
            status: InspectionStatus::Success,
            last_types: DefectSet::clean(),
            inspected_count: 0,
            rejected_count: 0,
            defect_counts: DefectCounts::default(),
            patterns: DefectPatterns::new(line_length),
        }
    }

    /// Count a detection and bucket its defects into the next cyclic slot
    pub fn record_detection(&mut self, detection: &Detection) -> SlotRecord {
        self.inspected_count += 1;
        self.last_types = detection.types.clone();

        if detection.has_issue {
            self.status = InspectionStatus::Error;
            self.rejected_count += 1;
            for defect in detection.types.defects() {
                self.defect_counts.increment(defect);
            }
        } else {
            self.status = InspectionStatus::Success;
        }

        self.patterns.record(&detection.types)
    }

    /// Operator override of the indicator
    pub fn set_status(&mut self, status: InspectionStatus) {
        self.status = status;
    }

    pub fn status(&self) -> InspectionStatus {
        self.status
    }

    pub fn last_types(&self) -> &DefectSet {
        &self.last_types
    }

    pub fn inspected_count(&self) -> u64 {
        self.inspected_count
    }

    /// Bottles the camera flagged as defective
    pub fn rejected_count(&self) -> u64 {
        self.rejected_count
    }

    pub fn defect_counts(&self) -> &DefectCounts {
        &self.defect_counts
    }

    pub fn patterns(&self) -> &DefectPatterns {
        &self.patterns
    }

    /// Recompute insights over everything inspected so far
    pub fn insights(&self) -> Vec<Insight> {
        derive_insights(&self.patterns, self.inspected_count)
    }
}

impl Default for InspectionContext {
    fn default() -> Self {
        Self::new(bottleline_patterns::DEFAULT_LINE_LENGTH)
    }
}
