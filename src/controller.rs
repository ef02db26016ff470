//! Line controller
//!
//! Owns every piece of simulation state and runs the fixed-step loop:
//! generator, motion, detector, separator, aggregator. Each tick computes the
//! next bottle collection from the current one and then replaces it, so every
//! phase observes a consistent snapshot.

use crate::inspection::{InspectionContext, InspectionStatistics, InspectionStatus};
use crate::line::{
    should_remove, Bottle, BottleGenerator, BottleView, ConfigError, Conveyor, Detection,
    HealthLevel, InspectionZone, LineConfig, LineEvent, ProductionStats, Separator, SystemStatus,
    Transition,
};
use bottleline_patterns::{DefectCounts, DefectSet, DefectType, Insight};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

/// Controller errors
#[derive(Error, Debug)]
pub enum LineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type LineResult<T> = Result<T, LineError>;

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, Serialize)]
pub struct LineSnapshot {
    pub tick: u64,
    pub elapsed_ms: u64,
    pub auto_mode: bool,
    pub bottles: Vec<BottleView>,
    pub inspection_status: InspectionStatus,
    pub last_types: DefectSet,
    pub system_status: SystemStatus,
    pub production: ProductionStats,
    pub statistics: InspectionStatistics,
    pub defect_patterns: BTreeMap<u32, DefectCounts>,
    pub insights: Vec<Insight>,
}

pub struct LineController {
    config: LineConfig,
    rng: StdRng,
    generator: BottleGenerator,
    conveyor: Conveyor,
    zone: InspectionZone,
    separator: Separator,
    context: InspectionContext,
    bottles: Vec<Bottle>,
    auto_mode: bool,
    /// Operator-injected bottles waiting for the next generator phase
    pending: VecDeque<DefectSet>,
    tick_count: u64,
    elapsed_ms: u64,
    /// Simulated time handed to `advance` that did not fill a whole tick
    carry: Duration,
    subscribers: Vec<UnboundedSender<LineEvent>>,
}

impl LineController {
    pub fn new(config: LineConfig) -> LineResult<Self> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!(
            seed = ?config.seed,
            tick_ms = config.tick_ms,
            speed = config.speed,
            auto_mode = config.auto_mode,
            "Line controller initialized"
        );

        Ok(Self {
            rng,
            generator: BottleGenerator::new(&config),
            conveyor: Conveyor::new(config.speed),
            zone: InspectionZone::new(config.inspection_epsilon),
            separator: Separator::new(),
            context: InspectionContext::new(config.line_length),
            bottles: Vec::new(),
            auto_mode: config.auto_mode,
            pending: VecDeque::new(),
            tick_count: 0,
            elapsed_ms: 0,
            carry: Duration::ZERO,
            subscribers: Vec::new(),
            config,
        })
    }

    /// Register a listener; it receives every event from the next tick on
    pub fn subscribe(&mut self) -> UnboundedReceiver<LineEvent> {
        let (tx, rx) = unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Run one fixed step of `tick_ms` simulated milliseconds
    pub fn tick(&mut self) -> Vec<LineEvent> {
        let dt_ms = self.config.tick_ms;
        self.tick_count += 1;
        self.elapsed_ms += dt_ms;

        let mut events = Vec::new();
        let health_before = self.separator.status().health;

        // Generator: new bottles enter at slot 0 and are not moved this tick
        let mut spawned = Vec::new();
        while let Some(types) = self.pending.pop_front() {
            spawned.push(self.generator.spawn_with(types, &mut self.rng));
        }
        if self.auto_mode {
            let due = self.generator.due(dt_ms as f64, &mut self.rng);
            for _ in 0..due {
                spawned.push(self.generator.spawn(&mut self.rng));
            }
        }
        for bottle in &spawned {
            events.push(LineEvent::Spawned {
                bottle_id: bottle.id(),
                types: bottle.types().clone(),
                fill_level: bottle.fill_level(),
            });
        }

        // Motion over the current snapshot
        let step = self.conveyor.step(dt_ms as f64);
        let mut next: Vec<Bottle> = self
            .bottles
            .iter()
            .map(|bottle| {
                let mut moved = bottle.clone();
                self.conveyor.advance(&mut moved, step);
                moved
            })
            .collect();
        next.extend(spawned);

        // Detector
        let mut detections: Vec<Detection> = Vec::new();
        for bottle in next.iter_mut() {
            if let Some(detection) = self.zone.sample(bottle) {
                debug!(
                    bottle = detection.bottle_id.as_u64(),
                    types = %detection.types,
                    "Bottle inspected"
                );
                events.push(LineEvent::Detected(detection.clone()));
                detections.push(detection);
            }
        }

        // Separator
        for bottle in next.iter_mut() {
            match self.separator.process(bottle, self.elapsed_ms, &mut self.rng) {
                Some(Transition::Ejected(bottle_id)) => events.push(LineEvent::Ejected {
                    bottle_id,
                    sim_time_ms: self.elapsed_ms,
                }),
                Some(Transition::Quarantined(bottle_id)) => {
                    events.push(LineEvent::Quarantined { bottle_id })
                }
                Some(Transition::Approved(bottle_id)) => {
                    events.push(LineEvent::Approved { bottle_id })
                }
                None => {}
            }
        }
        self.separator.settle(&next, &mut self.rng);
        let health_after = self.separator.status().health;
        if health_after != health_before {
            events.push(LineEvent::HealthChanged {
                from: health_before,
                to: health_after,
            });
        }

        // Removal
        next.retain(|bottle| {
            if should_remove(bottle) {
                events.push(LineEvent::Removed {
                    bottle_id: bottle.id(),
                    stage: bottle.stage(),
                });
                false
            } else {
                true
            }
        });

        // Aggregator
        for detection in &detections {
            let record = self.context.record_detection(detection);
            for alert in record.alerts {
                info!(
                    slot = alert.slot,
                    defect = %alert.defect,
                    count = alert.count,
                    "Recurring defect at line position"
                );
                events.push(LineEvent::PatternAlert(alert));
            }
        }

        self.bottles = next;
        self.publish(&events);
        events
    }

    /// Run as many whole ticks as fit in `elapsed`, carrying the remainder
    pub fn advance(&mut self, elapsed: Duration) -> Vec<LineEvent> {
        let tick = Duration::from_millis(self.config.tick_ms);
        self.carry += elapsed;

        let mut events = Vec::new();
        while self.carry >= tick {
            self.carry -= tick;
            events.extend(self.tick());
        }
        events
    }

    fn publish(&mut self, events: &[LineEvent]) {
        if events.is_empty() || self.subscribers.is_empty() {
            return;
        }
        let before = self.subscribers.len();
        self.subscribers
            .retain(|tx| events.iter().all(|event| tx.send(event.clone()).is_ok()));
        if self.subscribers.len() < before {
            debug!(dropped = before - self.subscribers.len(), "Closed subscribers removed");
        }
    }

    // ---- controls ----

    /// Toggle automatic bottle generation
    pub fn set_auto_mode(&mut self, enabled: bool) {
        if self.auto_mode != enabled {
            info!(enabled, "Auto mode changed");
        }
        self.auto_mode = enabled;
    }

    /// Inject a bottle carrying exactly `defect`; it enters on the next tick
    pub fn handle_detection_change(&mut self, defect: DefectType) {
        let types = if defect.is_defect() {
            DefectSet::single(defect)
        } else {
            DefectSet::clean()
        };
        debug!(types = %types, "Manual bottle queued");
        self.pending.push_back(types);
    }

    pub fn on_speed_increase(&mut self) -> u32 {
        let speed = self.separator.speed_increase();
        info!(speed, "Conveyor speed raised");
        speed
    }

    pub fn on_speed_decrease(&mut self) -> u32 {
        let speed = self.separator.speed_decrease();
        if self.separator.status().health == HealthLevel::Error {
            warn!(speed, "Conveyor speed lowered into error band");
        } else {
            info!(speed, "Conveyor speed lowered");
        }
        speed
    }

    /// Operator override of the inspection indicator
    pub fn handle_status_change(&mut self, status: InspectionStatus) {
        self.context.set_status(status);
    }

    // ---- accessors ----

    pub fn config(&self) -> &LineConfig {
        &self.config
    }

    pub fn auto_mode(&self) -> bool {
        self.auto_mode
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn bottles(&self) -> Vec<BottleView> {
        self.bottles.iter().map(Bottle::view).collect()
    }

    pub fn bottle_count(&self) -> usize {
        self.bottles.len()
    }

    pub fn bottles_created(&self) -> u64 {
        self.generator.created()
    }

    pub fn inspected_count(&self) -> u64 {
        self.context.inspected_count()
    }

    /// Defective detections
    pub fn rejected_count(&self) -> u64 {
        self.context.rejected_count()
    }

    pub fn defect_counts(&self) -> DefectCounts {
        *self.context.defect_counts()
    }

    pub fn defect_patterns(&self) -> BTreeMap<u32, DefectCounts> {
        self.context.patterns().snapshot()
    }

    pub fn inspection_status(&self) -> InspectionStatus {
        self.context.status()
    }

    pub fn last_types(&self) -> &DefectSet {
        self.context.last_types()
    }

    pub fn system_status(&self) -> &SystemStatus {
        self.separator.status()
    }

    pub fn production_stats(&self) -> ProductionStats {
        self.separator.stats()
    }

    pub fn statistics(&self) -> InspectionStatistics {
        InspectionStatistics::from_context(&self.context)
    }

    pub fn insights(&self) -> Vec<Insight> {
        self.context.insights()
    }

    pub fn snapshot(&self) -> LineSnapshot {
        LineSnapshot {
            tick: self.tick_count,
            elapsed_ms: self.elapsed_ms,
            auto_mode: self.auto_mode,
            bottles: self.bottles(),
            inspection_status: self.context.status(),
            last_types: self.context.last_types().clone(),
            system_status: self.separator.status().clone(),
            production: self.separator.stats(),
            statistics: self.statistics(),
            defect_patterns: self.defect_patterns(),
            insights: self.insights(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manual(seed: u64) -> LineController {
        let config = LineConfig {
            auto_mode: false,
            ..LineConfig::default().with_seed(seed)
        };
        LineController::new(config).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = LineConfig {
            p_issue: 2.0,
            ..Default::default()
        };
        assert!(matches!(LineController::new(config), Err(LineError::Config(_))));
    }

    #[test]
    fn test_injected_bottle_enters_next_tick_at_zero() {
        let mut line = manual(1);
        line.handle_detection_change(DefectType::Cap);
        assert_eq!(line.bottle_count(), 0);

        let events = line.tick();
        assert!(matches!(events[0], LineEvent::Spawned { .. }));
        let bottles = line.bottles();
        assert_eq!(bottles.len(), 1);
        assert_eq!(bottles[0].position, 0.0);
        assert_eq!(bottles[0].types, DefectSet::single(DefectType::Cap));

        line.tick();
        assert!(line.bottles()[0].position > 0.0);
    }

    #[test]
    fn test_auto_mode_off_spawns_nothing() {
        let mut line = manual(2);
        line.advance(Duration::from_secs(5));
        assert_eq!(line.bottles_created(), 0);
        assert_eq!(line.tick_count(), 5000 / 16);
    }

    #[test]
    fn test_advance_carries_partial_ticks() {
        let mut line = manual(3);
        line.advance(Duration::from_millis(10));
        assert_eq!(line.tick_count(), 0);
        line.advance(Duration::from_millis(10));
        assert_eq!(line.tick_count(), 1);
        assert_eq!(line.elapsed_ms(), 16);
    }

    #[test]
    fn test_defective_bottle_is_detected_then_ejected_then_quarantined() {
        let mut line = manual(4);
        line.handle_detection_change(DefectType::Dent);

        let mut events = Vec::new();
        for _ in 0..200 {
            events.extend(line.tick());
        }

        let detected = events
            .iter()
            .position(|e| matches!(e, LineEvent::Detected(_)))
            .unwrap();
        let ejected = events
            .iter()
            .position(|e| matches!(e, LineEvent::Ejected { .. }))
            .unwrap();
        let quarantined = events
            .iter()
            .position(|e| matches!(e, LineEvent::Quarantined { .. }))
            .unwrap();
        let removed = events
            .iter()
            .position(|e| matches!(e, LineEvent::Removed { .. }))
            .unwrap();
        assert!(detected < ejected && ejected < quarantined && quarantined < removed);

        assert_eq!(line.inspected_count(), 1);
        assert_eq!(line.rejected_count(), 1);
        assert_eq!(line.production_stats().rejected_count, 1);
        assert_eq!(line.production_stats().approved_count, 0);
        assert_eq!(line.inspection_status(), InspectionStatus::Error);
        assert_eq!(line.bottle_count(), 0);
    }

    #[test]
    fn test_subscriber_receives_events() {
        let mut line = manual(5);
        let mut rx = line.subscribe();
        line.handle_detection_change(DefectType::None);
        let events = line.tick();
        assert_eq!(rx.try_recv().unwrap(), events[0]);

        drop(rx);
        line.handle_detection_change(DefectType::None);
        line.tick();
        assert!(line.subscribers.is_empty());
    }

    #[test]
    fn test_motion_ignores_conveyor_speed_reading() {
        let mut line = manual(8);
        for _ in 0..6 {
            line.on_speed_decrease();
        }
        assert_eq!(line.system_status().conveyor_speed, 70);

        line.handle_detection_change(DefectType::None);
        line.tick();
        for _ in 0..10 {
            line.tick();
        }
        // 10 ticks of 16 ms at 3 slots per second
        assert!((line.bottles()[0].position - 0.48).abs() < 1e-9);
    }

    #[test]
    fn test_status_override_and_speed_controls() {
        let mut line = manual(6);
        line.handle_status_change(InspectionStatus::Warning);
        assert_eq!(line.inspection_status(), InspectionStatus::Warning);

        assert_eq!(line.on_speed_decrease(), 95);
        assert_eq!(line.on_speed_increase(), 100);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut line = manual(7);
        line.handle_detection_change(DefectType::Label);
        line.tick();
        let json = serde_json::to_value(line.snapshot()).unwrap();
        assert_eq!(json["tick"], 1);
        assert_eq!(json["bottles"][0]["types"][0], "label");
        assert_eq!(json["inspection_status"], "success");
    }
}
