use bottleline::line::{health_level, PRESSURE_CEILING, PRESSURE_FLOOR, SPEED_MAX, SPEED_MIN};
use bottleline::{BottleId, LineConfig, LineController, LineEvent, SpawnPolicy};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

fn arb_spawn_policy() -> impl Strategy<Value = SpawnPolicy> {
    prop_oneof![
        (30.0f64..200.0)
            .prop_map(|bottles_per_minute| SpawnPolicy::FixedInterval { bottles_per_minute }),
        (0.5f64..3.0)
            .prop_map(|bottles_per_second| SpawnPolicy::Probabilistic { bottles_per_second }),
    ]
}

fn arb_config() -> impl Strategy<Value = LineConfig> {
    (any::<u64>(), 0.0f64..=1.0, 0.0f64..=1.0, arb_spawn_policy()).prop_map(
        |(seed, p_issue, p_multi, spawn)| LineConfig {
            p_issue,
            p_multi,
            spawn,
            ..LineConfig::default().with_seed(seed)
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Bottle lifecycle invariants hold on every tick of a random run
    #[test]
    fn lifecycle_invariants_hold_every_tick(config in arb_config()) {
        let mut line = LineController::new(config).unwrap();
        let mut positions: HashMap<BottleId, f64> = HashMap::new();
        let mut last_spawned: Option<BottleId> = None;
        let mut detected: HashSet<BottleId> = HashSet::new();
        let mut ejected: HashSet<BottleId> = HashSet::new();

        for _ in 0..1500 {
            for event in line.tick() {
                match event {
                    LineEvent::Spawned { bottle_id, types, fill_level } => {
                        prop_assert!(last_spawned.map_or(true, |last| bottle_id > last));
                        last_spawned = Some(bottle_id);
                        prop_assert!(types.as_slice().len() <= 2);
                        if types.contains(bottleline::DefectType::Liquid) {
                            prop_assert!((40..=85).contains(&fill_level));
                        } else {
                            prop_assert!((85..=100).contains(&fill_level));
                        }
                    }
                    LineEvent::Detected(detection) => {
                        prop_assert!(detected.insert(detection.bottle_id));
                        prop_assert_eq!(detection.has_issue, !detection.types.is_clean());
                    }
                    LineEvent::Ejected { bottle_id, .. } => {
                        prop_assert!(detected.contains(&bottle_id));
                        prop_assert!(ejected.insert(bottle_id));
                    }
                    LineEvent::Quarantined { bottle_id } => {
                        prop_assert!(ejected.contains(&bottle_id));
                    }
                    LineEvent::Removed { bottle_id, .. } => {
                        prop_assert!(detected.contains(&bottle_id));
                        positions.remove(&bottle_id);
                    }
                    _ => {}
                }
            }

            for bottle in line.bottles() {
                if let Some(previous) = positions.insert(bottle.id, bottle.position) {
                    prop_assert!(bottle.position >= previous);
                }
                prop_assert!(!bottle.ejected || !bottle.types.is_clean());
                prop_assert!(!bottle.in_quarantine || bottle.ejected);
            }

            let production = line.production_stats();
            prop_assert!(production.total() <= line.inspected_count());
            prop_assert!(production.rejected_count <= line.rejected_count());

            let status = line.system_status();
            prop_assert_eq!(status.health, health_level(status.pressure, status.conveyor_speed));
            prop_assert!((PRESSURE_FLOOR..=PRESSURE_CEILING).contains(&status.pressure));
            prop_assert!((SPEED_MIN..=SPEED_MAX).contains(&status.conveyor_speed));
        }
    }

    /// Pattern counts never shrink and agree with the per-type counters
    #[test]
    fn pattern_counts_match_detections(config in arb_config()) {
        let mut line = LineController::new(config).unwrap();
        let mut previous_total = 0u64;

        for _ in 0..40 {
            line.advance(std::time::Duration::from_millis(480));
            let patterns = line.defect_patterns();
            let pattern_total: u64 = patterns.values().map(|counts| counts.total()).sum();
            prop_assert!(pattern_total >= previous_total);
            prop_assert_eq!(pattern_total, line.defect_counts().total());
            prop_assert!(patterns.keys().all(|slot| *slot < line.config().line_length));
            previous_total = pattern_total;
        }
    }
}
