//! Insight heuristics over accumulated defect patterns
//!
//! Three rules, recomputed from scratch on every call:
//! - hotspot: one defect type dominates a slot
//! - systemic fault: several defect types share a slot
//! - sequential fault: a defect type repeats along a regular run of slots

use super::aggregator::DefectPatterns;
use super::defect::DefectType;
use super::sequence::classify;
use serde::{Deserialize, Serialize};

/// Per-type rate (percent of inspected bottles) above which a hotspot is reported
pub const HOTSPOT_RATE_THRESHOLD: f64 = 20.0;

/// Upper bound for any confidence score
pub const MAX_CONFIDENCE: f64 = 98.0;

const HOTSPOT_CONFIDENCE_CAP: f64 = 95.0;
const HOTSPOT_CONFIDENCE_BONUS: f64 = 30.0;
const SYSTEMIC_CONFIDENCE_BONUS: f64 = 40.0;
const PROGRESSION_CONFIDENCE: f64 = 85.0;
const CONSECUTIVE_CONFIDENCE: f64 = 75.0;

/// Which rule produced an insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Hotspot,
    SystemicFault,
    SequentialFault,
}

/// A human-readable hypothesis about a recurring defect pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    /// 1-based position in the report
    pub id: usize,
    pub kind: InsightKind,
    /// Defect type the insight is about (`None` for systemic faults)
    pub defect: Option<DefectType>,
    /// Slots involved, in line order
    pub slots: Vec<u32>,
    pub pattern: String,
    pub probable_cause: String,
    pub recommended_action: String,
    /// Percent in `[0, 98]`
    pub confidence: f64,
}

/// `100 * count / max(1, total)`
pub fn defect_rate(count: u64, total: u64) -> f64 {
    100.0 * count as f64 / total.max(1) as f64
}

fn clamp_confidence(confidence: f64) -> f64 {
    confidence.clamp(0.0, MAX_CONFIDENCE)
}

/// Derive every insight supported by `patterns`, given `total_bottles` inspected.
pub fn derive_insights(patterns: &DefectPatterns, total_bottles: u64) -> Vec<Insight> {
    let mut insights = Vec::new();

    for (slot, counts) in patterns.iter() {
        for (defect, count) in counts.iter() {
            let rate = defect_rate(count, total_bottles);
            if rate > HOTSPOT_RATE_THRESHOLD {
                let (probable_cause, recommended_action) = slot_advice(defect, slot);
                insights.push(Insight {
                    id: insights.len() + 1,
                    kind: InsightKind::Hotspot,
                    defect: Some(defect),
                    slots: vec![slot],
                    pattern: format!(
                        "Slot {} shows {:.1}% {} defects",
                        slot,
                        rate,
                        defect.display_name()
                    ),
                    probable_cause,
                    recommended_action,
                    confidence: clamp_confidence(
                        (rate + HOTSPOT_CONFIDENCE_BONUS).min(HOTSPOT_CONFIDENCE_CAP),
                    ),
                });
            }
        }

        let present = counts.present();
        if present.len() >= 2 {
            let rate = defect_rate(counts.total(), total_bottles);
            let names: Vec<&str> = present.iter().map(|d| d.display_name()).collect();
            insights.push(Insight {
                id: insights.len() + 1,
                kind: InsightKind::SystemicFault,
                defect: None,
                slots: vec![slot],
                pattern: format!("Slot {} shows multiple defects ({})", slot, names.join(" and ")),
                probable_cause: format!(
                    "Possible systemic process or equipment fault at slot {}",
                    slot
                ),
                recommended_action: format!(
                    "Run a full equipment inspection at slot {} and review operating procedures",
                    slot
                ),
                confidence: clamp_confidence(rate + SYSTEMIC_CONFIDENCE_BONUS),
            });
        }
    }

    for defect in DefectType::DEFECTS {
        let slots = patterns.slots_with(defect);
        let Some(shape) = classify(&slots) else {
            continue;
        };
        let confidence = if shape.is_progression() {
            PROGRESSION_CONFIDENCE
        } else {
            CONSECUTIVE_CONFIDENCE
        };
        let (probable_cause, recommended_action) = sequence_advice(defect);
        insights.push(Insight {
            id: insights.len() + 1,
            kind: InsightKind::SequentialFault,
            defect: Some(defect),
            pattern: format!(
                "Sequential {} defects at slots {}",
                defect.display_name(),
                describe_slots(&slots)
            ),
            slots,
            probable_cause: probable_cause.to_string(),
            recommended_action: recommended_action.to_string(),
            confidence: clamp_confidence(confidence),
        });
    }

    insights
}

/// First three slots, with an ellipsis when more follow
fn describe_slots(slots: &[u32]) -> String {
    let head: Vec<String> = slots.iter().take(3).map(|s| s.to_string()).collect();
    let mut text = head.join(", ");
    if slots.len() > 3 {
        text.push_str("...");
    }
    text
}

fn slot_advice(defect: DefectType, slot: u32) -> (String, String) {
    match defect {
        DefectType::Label => (
            format!("Label applicator fault at slot {}", slot),
            format!("Check alignment of applicator {} and its position sensors", slot),
        ),
        DefectType::Dent => (
            format!("Bottle handling fault at slot {}", slot),
            format!(
                "Inspect the conveyor transfer at slot {} and reduce contact pressure",
                slot
            ),
        ),
        DefectType::Cap => (
            format!("Capper fault at slot {}", slot),
            format!("Calibrate capping torque at slot {} and check alignment", slot),
        ),
        DefectType::Liquid => (
            format!("Filler nozzle {} malfunction", slot),
            format!("Check filler valve {} and the level sensor", slot),
        ),
        DefectType::None => (
            format!("Unknown fault at slot {}", slot),
            format!("Inspect slot {} manually", slot),
        ),
    }
}

fn sequence_advice(defect: DefectType) -> (&'static str, &'static str) {
    match defect {
        DefectType::Label => (
            "Sequential fault in the labelling system",
            "Check overall labeller alignment and calibrate its sensors",
        ),
        DefectType::Dent => (
            "Conveyor system denting bottles in sequence",
            "Check conveyor guides and adjust transport chain pressure",
        ),
        DefectType::Cap => (
            "Sequential fault in the capping system",
            "Check the cap feeder and adjust the capping heads",
        ),
        DefectType::Liquid => (
            "Filling system fault in sequence",
            "Check filling system pressure and calibrate level sensors",
        ),
        DefectType::None => ("Unknown sequential fault", "Inspect the line manually"),
    }
}
