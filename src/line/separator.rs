//! Ejection / separation state machine and machine-health model
//!
//! Defective bottles are knocked off the line when they pass the separator
//! (`OnLine -> Ejected`) and counted as rejected once they land in quarantine
//! (`Ejected -> Quarantined`). Each ejection loads the pneumatics and slows the
//! belt; each landing lets them recover a little.

use super::types::{Bottle, BottleId, BottleStage};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Ejection window `[EJECTION_START, EJECTION_START + EJECTION_WINDOW)`
pub const EJECTION_START: f64 = 3.0;
pub const EJECTION_WINDOW: f64 = 0.1;

/// Ejected bottles reach quarantine here
pub const QUARANTINE_POSITION: f64 = 3.5;

/// Clean bottles count as approved once they pass this point
pub const APPROVAL_POSITION: f64 = 6.8;

/// Operating band of the pneumatic pressure, percent
pub const PRESSURE_FLOOR: u32 = 70;
pub const PRESSURE_CEILING: u32 = 98;

/// Operating band of the belt speed, percent
pub const SPEED_MIN: u32 = 70;
pub const SPEED_MAX: u32 = 100;

/// Belt speed never drops below this during an ejection
pub const EJECTION_SPEED_FLOOR: u32 = 85;

/// Manual speed adjustment step, percent
pub const SPEED_STEP: u32 = 5;

/// Sensor noise never pushes a reading below these
pub const PRESSURE_JITTER_FLOOR: u32 = 75;
pub const SPEED_JITTER_FLOOR: u32 = 90;

const PRESSURE_JITTER_CHANCE: f64 = 0.03;
const SPEED_JITTER_CHANCE: f64 = 0.02;

/// Overall machine health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthLevel {
    Normal,
    Warning,
    Error,
}

/// Health is a pure function of pressure and belt speed
pub fn health_level(pressure: u32, conveyor_speed: u32) -> HealthLevel {
    if pressure < 70 || conveyor_speed < 75 {
        HealthLevel::Error
    } else if pressure < 80 || conveyor_speed < 85 {
        HealthLevel::Warning
    } else {
        HealthLevel::Normal
    }
}

/// Derived machine state shown on the status panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    /// Belt speed, percent of nominal
    pub conveyor_speed: u32,
    /// Pneumatic pressure, percent of nominal
    pub pressure: u32,
    pub health: HealthLevel,
    pub separator_active: bool,
    pub current_ejection: Option<BottleId>,
    /// Wall-clock `HH:MM:SS` of the last ejection
    pub last_ejection_time: Option<String>,
    /// Simulated time of the last ejection
    pub last_ejection_ms: Option<u64>,
}

impl Default for SystemStatus {
    fn default() -> Self {
        Self {
            conveyor_speed: 100,
            pressure: 95,
            health: HealthLevel::Normal,
            separator_active: false,
            current_ejection: None,
            last_ejection_time: None,
            last_ejection_ms: None,
        }
    }
}

/// Post-inspection production counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionStats {
    pub approved_count: u64,
    pub rejected_count: u64,
}

impl ProductionStats {
    pub fn total(&self) -> u64 {
        self.approved_count + self.rejected_count
    }
}

/// A lifecycle step taken by one bottle during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Ejected(BottleId),
    Quarantined(BottleId),
    Approved(BottleId),
}

/// Separator controller owning the machine-health model
#[derive(Debug, Clone, Default)]
pub struct Separator {
    status: SystemStatus,
    stats: ProductionStats,
}

impl Separator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &SystemStatus {
        &self.status
    }

    pub fn stats(&self) -> ProductionStats {
        self.stats
    }

    /// Apply the state machine to one bottle at its new position
    pub fn process<R: Rng + ?Sized>(
        &mut self,
        bottle: &mut Bottle,
        sim_time_ms: u64,
        rng: &mut R,
    ) -> Option<Transition> {
        match bottle.stage() {
            BottleStage::OnLine if bottle.has_issue() && in_ejection_window(bottle.position) => {
                bottle.stage = BottleStage::Ejected;
                self.on_ejection(bottle.id(), sim_time_ms, rng);
                Some(Transition::Ejected(bottle.id()))
            }
            BottleStage::OnLine
                if !bottle.has_issue() && !bottle.counted && bottle.position >= APPROVAL_POSITION =>
            {
                bottle.counted = true;
                self.stats.approved_count += 1;
                Some(Transition::Approved(bottle.id()))
            }
            BottleStage::Ejected if bottle.position >= QUARANTINE_POSITION => {
                bottle.stage = BottleStage::Quarantined;
                self.on_quarantine(bottle.id(), rng);
                Some(Transition::Quarantined(bottle.id()))
            }
            _ => None,
        }
    }

    fn on_ejection<R: Rng + ?Sized>(&mut self, id: BottleId, sim_time_ms: u64, rng: &mut R) {
        let status = &mut self.status;
        status.separator_active = true;
        status.current_ejection = Some(id);
        status.last_ejection_time = Some(chrono::Local::now().format("%H:%M:%S").to_string());
        status.last_ejection_ms = Some(sim_time_ms);

        // floors never raise a value the operator already set lower
        let pressure_drop = rng.gen_range(0..15);
        status.pressure = status
            .pressure
            .saturating_sub(pressure_drop)
            .max(PRESSURE_FLOOR.min(status.pressure));
        let speed_drop = rng.gen_range(0..8);
        status.conveyor_speed = status
            .conveyor_speed
            .saturating_sub(speed_drop)
            .max(EJECTION_SPEED_FLOOR.min(status.conveyor_speed));

        debug!(
            bottle = id.as_u64(),
            pressure = status.pressure,
            speed = status.conveyor_speed,
            "Separator fired"
        );
    }

    fn on_quarantine<R: Rng + ?Sized>(&mut self, id: BottleId, rng: &mut R) {
        self.stats.rejected_count += 1;
        let status = &mut self.status;
        status.pressure = (status.pressure + rng.gen_range(0..5)).min(PRESSURE_CEILING);
        status.conveyor_speed = (status.conveyor_speed + rng.gen_range(0..5)).min(SPEED_MAX);
        debug!(
            bottle = id.as_u64(),
            rejected = self.stats.rejected_count,
            "Bottle quarantined"
        );
    }

    /// End-of-tick bookkeeping over the full next-state collection: release the
    /// separator when nothing is in flight, add sensor noise, refresh health.
    pub fn settle<R: Rng + ?Sized>(&mut self, bottles: &[Bottle], rng: &mut R) {
        let in_flight = bottles.iter().any(|b| {
            b.has_issue()
                && !b.in_quarantine()
                && b.position >= EJECTION_START
                && b.position < QUARANTINE_POSITION
        });
        if !in_flight {
            self.status.separator_active = false;
            self.status.current_ejection = None;
        }

        if rng.gen_bool(PRESSURE_JITTER_CHANCE) {
            let delta = signed_jitter(rng, 3);
            self.status.pressure = apply_jitter(
                self.status.pressure,
                delta,
                PRESSURE_JITTER_FLOOR,
                PRESSURE_CEILING,
            );
        }
        if rng.gen_bool(SPEED_JITTER_CHANCE) {
            let delta = signed_jitter(rng, 2);
            self.status.conveyor_speed = apply_jitter(
                self.status.conveyor_speed,
                delta,
                SPEED_JITTER_FLOOR,
                SPEED_MAX,
            );
        }

        let previous = self.status.health;
        self.status.health = health_level(self.status.pressure, self.status.conveyor_speed);
        if self.status.health == HealthLevel::Error && previous != HealthLevel::Error {
            warn!(
                pressure = self.status.pressure,
                speed = self.status.conveyor_speed,
                "Line health degraded to error"
            );
        }
    }

    /// Raise belt speed by one step, clamped to the operating band
    pub fn speed_increase(&mut self) -> u32 {
        self.set_conveyor_speed(self.status.conveyor_speed.saturating_add(SPEED_STEP))
    }

    /// Lower belt speed by one step, clamped to the operating band
    pub fn speed_decrease(&mut self) -> u32 {
        self.set_conveyor_speed(self.status.conveyor_speed.saturating_sub(SPEED_STEP))
    }

    fn set_conveyor_speed(&mut self, speed: u32) -> u32 {
        self.status.conveyor_speed = speed.clamp(SPEED_MIN, SPEED_MAX);
        self.status.health = health_level(self.status.pressure, self.status.conveyor_speed);
        self.status.conveyor_speed
    }
}

fn in_ejection_window(position: f64) -> bool {
    position >= EJECTION_START && position < EJECTION_START + EJECTION_WINDOW
}

/// Uniform magnitude in `0..bound` with a random sign
fn signed_jitter<R: Rng + ?Sized>(rng: &mut R, bound: i64) -> i64 {
    let magnitude = rng.gen_range(0..bound);
    if rng.gen_bool(0.5) {
        magnitude
    } else {
        -magnitude
    }
}

fn apply_jitter(value: u32, delta: i64, low: u32, high: u32) -> u32 {
    let low = low.min(value);
    let moved = (value as i64 + delta).clamp(low as i64, high as i64);
    moved as u32
}
