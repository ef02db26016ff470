//! Conveyor motion model
//!
//! Moves every bottle forward by a fixed step per tick and decides when a bottle
//! has left the simulated range.

use super::types::Bottle;

/// Bottles on the main line are purged here
pub const EXIT_THRESHOLD: f64 = 7.0;

/// Quarantined bottles leave the main line and are purged earlier
pub const QUARANTINE_EXIT_THRESHOLD: f64 = 5.0;

/// Belt motion in slots per second. The conveyor speed percentage on the
/// status panel is a reading only and does not feed back into motion.
#[derive(Debug, Clone, Copy)]
pub struct Conveyor {
    speed: f64,
}

impl Conveyor {
    pub fn new(speed: f64) -> Self {
        Self { speed }
    }

    /// Distance covered in `dt_ms`
    pub fn step(&self, dt_ms: f64) -> f64 {
        self.speed * dt_ms / 1000.0
    }

    /// Move a bottle forward; positions never decrease
    pub fn advance(&self, bottle: &mut Bottle, step: f64) {
        bottle.position += step.max(0.0);
    }
}

/// Removal predicate applied after each tick
pub fn should_remove(bottle: &Bottle) -> bool {
    if bottle.in_quarantine() {
        bottle.position >= QUARANTINE_EXIT_THRESHOLD
    } else {
        bottle.position >= EXIT_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::types::{BottleId, BottleStage};
    use bottleline_patterns::DefectSet;

    #[test]
    fn test_step_is_speed_times_elapsed() {
        let conveyor = Conveyor::new(3.0);
        assert!((conveyor.step(16.0) - 0.048).abs() < 1e-12);
        assert!((Conveyor::new(1.5).step(32.0) - 0.048).abs() < 1e-12);
    }

    #[test]
    fn test_advance_never_moves_backwards() {
        let conveyor = Conveyor::new(3.0);
        let mut bottle = Bottle::new(BottleId(0), DefectSet::clean(), 90);
        conveyor.advance(&mut bottle, 0.5);
        conveyor.advance(&mut bottle, -1.0);
        assert_eq!(bottle.position(), 0.5);
    }

    #[test]
    fn test_removal_thresholds() {
        let mut bottle = Bottle::new(BottleId(0), DefectSet::clean(), 90);
        bottle.position = 6.99;
        assert!(!should_remove(&bottle));
        bottle.position = 7.0;
        assert!(should_remove(&bottle));

        bottle.position = 5.0;
        bottle.stage = BottleStage::Quarantined;
        assert!(should_remove(&bottle));
        bottle.position = 4.9;
        assert!(!should_remove(&bottle));
    }
}
