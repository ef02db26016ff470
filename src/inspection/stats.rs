//! Summary statistics over the inspection counters

use super::context::InspectionContext;
use bottleline_patterns::{DefectCounts, DefectType};
use serde::{Deserialize, Serialize};

/// Each defect type's share of all recorded defects, percent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DefectShares {
    pub label: f64,
    pub dent: f64,
    pub cap: f64,
    pub liquid: f64,
}

impl DefectShares {
    pub fn from_counts(counts: &DefectCounts) -> Self {
        let total = counts.total();
        let share = |defect: DefectType| {
            if total == 0 {
                0.0
            } else {
                100.0 * counts.get(defect) as f64 / total as f64
            }
        };
        Self {
            label: share(DefectType::Label),
            dent: share(DefectType::Dent),
            cap: share(DefectType::Cap),
            liquid: share(DefectType::Liquid),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionStatistics {
    pub inspected: u64,
    pub rejected: u64,
    /// `(inspected - rejected) / inspected`, percent; 0 before the first inspection
    pub approval_rate: f64,
    pub defect_counts: DefectCounts,
    pub defect_shares: DefectShares,
}

impl InspectionStatistics {
    pub fn from_context(context: &InspectionContext) -> Self {
        let inspected = context.inspected_count();
        let rejected = context.rejected_count();
        let approval_rate = if inspected == 0 {
            0.0
        } else {
            100.0 * (inspected - rejected) as f64 / inspected as f64
        };
        Self {
            inspected,
            rejected,
            approval_rate,
            defect_counts: *context.defect_counts(),
            defect_shares: DefectShares::from_counts(context.defect_counts()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::{BottleId, Detection};
    use bottleline_patterns::DefectSet;

    #[test]
    fn test_empty_statistics() {
        let stats = InspectionStatistics::from_context(&InspectionContext::default());
        assert_eq!(stats.approval_rate, 0.0);
        assert_eq!(stats.defect_shares, DefectShares::default());
    }

    #[test]
    fn test_rates() {
        let mut context = InspectionContext::default();
        let feed = [
            DefectSet::clean(),
            DefectSet::clean(),
            DefectSet::clean(),
            DefectSet::from_defects([DefectType::Dent, DefectType::Cap]),
        ];
        for (id, types) in feed.into_iter().enumerate() {
            context.record_detection(&Detection {
                bottle_id: BottleId(id as u64),
                has_issue: !types.is_clean(),
                types,
            });
        }

        let stats = InspectionStatistics::from_context(&context);
        assert_eq!(stats.approval_rate, 75.0);
        assert_eq!(stats.defect_shares.dent, 50.0);
        assert_eq!(stats.defect_shares.cap, 50.0);
        assert_eq!(stats.defect_shares.label, 0.0);
    }
}
