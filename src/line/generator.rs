//! Bottle generator
//!
//! Produces the synthetic bottle stream: ids, defect tags and fill levels, and
//! decides how many bottles enter the line on each tick.

use super::config::{LineConfig, SpawnPolicy};
use super::types::{Bottle, BottleId};
use bottleline_patterns::{DefectSet, DefectType};
use rand::Rng;

/// Fill level range for bottles with a liquid-level defect
pub const LOW_FILL_RANGE: (u8, u8) = (40, 85);
/// Fill level range for every other bottle
pub const NORMAL_FILL_RANGE: (u8, u8) = (85, 100);

/// Draw a fill level consistent with the bottle's defects
pub fn draw_fill_level<R: Rng + ?Sized>(types: &DefectSet, rng: &mut R) -> u8 {
    let (low, high) = if types.contains(DefectType::Liquid) {
        LOW_FILL_RANGE
    } else {
        NORMAL_FILL_RANGE
    };
    rng.gen_range(low..=high)
}

/// Synthetic bottle source
#[derive(Debug, Clone)]
pub struct BottleGenerator {
    next_id: u64,
    p_issue: f64,
    p_multi: f64,
    weights: [f64; 4],
    policy: SpawnPolicy,
    /// Simulated time accumulated toward the next fixed-interval spawn
    since_last_spawn_ms: f64,
}

impl BottleGenerator {
    pub fn new(config: &LineConfig) -> Self {
        Self {
            next_id: 0,
            p_issue: config.p_issue,
            p_multi: config.p_multi,
            weights: config.defect_weights.as_array(),
            policy: config.spawn,
            since_last_spawn_ms: 0.0,
        }
    }

    /// Total bottles created so far
    pub fn created(&self) -> u64 {
        self.next_id
    }

    /// Number of bottles to admit after `dt_ms` of simulated time
    pub fn due<R: Rng + ?Sized>(&mut self, dt_ms: f64, rng: &mut R) -> usize {
        match self.policy {
            SpawnPolicy::FixedInterval { bottles_per_minute } => {
                let interval_ms = 60_000.0 / bottles_per_minute;
                self.since_last_spawn_ms += dt_ms;
                let mut due = 0;
                while self.since_last_spawn_ms >= interval_ms {
                    self.since_last_spawn_ms -= interval_ms;
                    due += 1;
                }
                due
            }
            SpawnPolicy::Probabilistic { bottles_per_second } => {
                let p = (bottles_per_second / 1000.0 * dt_ms).clamp(0.0, 1.0);
                usize::from(rng.gen_bool(p))
            }
        }
    }

    /// Create a bottle with randomly drawn defects
    pub fn spawn<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Bottle {
        let types = self.draw_defects(rng);
        self.spawn_with(types, rng)
    }

    /// Create a bottle carrying exactly `types`
    pub fn spawn_with<R: Rng + ?Sized>(&mut self, types: DefectSet, rng: &mut R) -> Bottle {
        let id = BottleId(self.next_id);
        self.next_id += 1;
        let fill_level = draw_fill_level(&types, rng);
        Bottle::new(id, types, fill_level)
    }

    /// Bernoulli issue trial, then one or two distinct defects
    pub fn draw_defects<R: Rng + ?Sized>(&self, rng: &mut R) -> DefectSet {
        if !rng.gen_bool(self.p_issue) {
            return DefectSet::clean();
        }

        let first = self.pick_weighted(rng);
        if !rng.gen_bool(self.p_multi) {
            return DefectSet::single(first);
        }

        let remaining: Vec<DefectType> = DefectType::DEFECTS
            .iter()
            .copied()
            .filter(|&d| d != first)
            .collect();
        let second = remaining[rng.gen_range(0..remaining.len())];
        DefectSet::from_defects([first, second])
    }

    fn pick_weighted<R: Rng + ?Sized>(&self, rng: &mut R) -> DefectType {
        let total: f64 = self.weights.iter().sum();
        let mut target = rng.gen::<f64>() * total;
        for (defect, weight) in DefectType::DEFECTS.iter().zip(self.weights) {
            if target < weight {
                return *defect;
            }
            target -= weight;
        }
        // rounding can leave a sliver past the last bucket
        DefectType::DEFECTS
            .iter()
            .zip(self.weights)
            .rev()
            .find(|(_, w)| *w > 0.0)
            .map(|(d, _)| *d)
            .unwrap_or(DefectType::Liquid)
    }
}
