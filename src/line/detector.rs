//! Inspection zone detector
//!
//! The camera looks at a fixed window around slot 3. Each bottle produces exactly
//! one detection the first time it is sampled inside the window.

use super::types::{Bottle, BottleId};
use bottleline_patterns::DefectSet;
use serde::{Deserialize, Serialize};

/// Centre of the inspection window
pub const INSPECTION_CENTER: f64 = 3.0;

/// What the camera reports for one bottle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    pub bottle_id: BottleId,
    pub has_issue: bool,
    pub types: DefectSet,
}

/// Closed window `[center - epsilon, center + epsilon]`
#[derive(Debug, Clone)]
pub struct InspectionZone {
    epsilon: f64,
    last_detected: Option<BottleId>,
}

impl InspectionZone {
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon,
            last_detected: None,
        }
    }

    pub fn contains(&self, position: f64) -> bool {
        (position - INSPECTION_CENTER).abs() <= self.epsilon
    }

    pub fn last_detected(&self) -> Option<BottleId> {
        self.last_detected
    }

    /// Sample a bottle; returns a detection only on its first visit to the window
    pub fn sample(&mut self, bottle: &mut Bottle) -> Option<Detection> {
        if bottle.detected || !self.contains(bottle.position) {
            return None;
        }
        if self.last_detected == Some(bottle.id()) {
            return None;
        }

        bottle.detected = true;
        self.last_detected = Some(bottle.id());
        Some(Detection {
            bottle_id: bottle.id(),
            has_issue: bottle.has_issue(),
            types: bottle.types().clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bottleline_patterns::DefectType;

    fn bottle_at(id: u64, position: f64) -> Bottle {
        let mut bottle = Bottle::new(BottleId(id), DefectSet::single(DefectType::Label), 90);
        bottle.position = position;
        bottle
    }

    #[test]
    fn test_window_bounds_are_closed() {
        let zone = InspectionZone::new(0.05);
        assert!(zone.contains(2.95));
        assert!(zone.contains(3.05));
        assert!(!zone.contains(2.94));
        assert!(!zone.contains(3.06));
    }

    #[test]
    fn test_single_detection_per_bottle() {
        let mut zone = InspectionZone::new(0.05);
        let mut bottle = bottle_at(4, 2.97);

        let detection = zone.sample(&mut bottle).unwrap();
        assert_eq!(detection.bottle_id, BottleId(4));
        assert!(detection.has_issue);
        assert_eq!(detection.types.as_slice(), &[DefectType::Label]);

        bottle.position = 3.02;
        assert!(zone.sample(&mut bottle).is_none());
        assert_eq!(zone.last_detected(), Some(BottleId(4)));
    }

    #[test]
    fn test_outside_window_is_ignored() {
        let mut zone = InspectionZone::new(0.05);
        let mut bottle = bottle_at(1, 1.0);
        assert!(zone.sample(&mut bottle).is_none());
        assert!(!bottle.detected());
    }

    #[test]
    fn test_last_detected_guard() {
        let mut zone = InspectionZone::new(0.1);
        let mut first = bottle_at(9, 3.0);
        zone.sample(&mut first);

        // a stale copy of the same bottle must not fire again
        let mut stale = bottle_at(9, 3.0);
        assert!(zone.sample(&mut stale).is_none());

        let mut next = bottle_at(10, 2.95);
        assert!(zone.sample(&mut next).is_some());
    }
}
