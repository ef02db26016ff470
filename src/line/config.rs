//! Line configuration
//!
//! Every tunable of the simulation lives here. Values are plain data so they can
//! be loaded from YAML by the binaries; the core itself never touches files or
//! the environment.

use super::separator::EJECTION_WINDOW;
use bottleline_patterns::DEFAULT_LINE_LENGTH;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A probability outside `[0, 1]`
    #[error("{name} must be a probability in [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f64 },

    /// A quantity that must be strictly positive
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    /// One tick would jump over a detection or ejection window
    #[error("conveyor step of {step:.3} slots per tick must stay below {limit:.3}")]
    StepTooLarge { step: f64, limit: f64 },

    /// Inspection window half-width out of range
    #[error("inspection epsilon must be in (0, 0.5), got {0}")]
    InvalidEpsilon(f64),

    /// Defect weights must be non-negative with a positive sum
    #[error("defect weights must be non-negative and not all zero")]
    InvalidWeights,

    /// YAML could not be parsed
    #[error("invalid configuration document: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// When the generator admits new bottles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum SpawnPolicy {
    /// One bottle every `60000 / bottles_per_minute` ms of simulated time
    FixedInterval { bottles_per_minute: f64 },
    /// Per-tick admission with probability `bottles_per_second / 1000 * dt_ms`
    Probabilistic { bottles_per_second: f64 },
}

impl Default for SpawnPolicy {
    fn default() -> Self {
        SpawnPolicy::FixedInterval { bottles_per_minute: 99.0 }
    }
}

/// Relative weights of the first defect drawn for a faulty bottle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefectWeights {
    pub label: f64,
    pub dent: f64,
    pub cap: f64,
    pub liquid: f64,
}

impl Default for DefectWeights {
    fn default() -> Self {
        Self {
            label: 1.0,
            dent: 1.0,
            cap: 1.0,
            liquid: 1.0,
        }
    }
}

impl DefectWeights {
    pub fn as_array(&self) -> [f64; 4] {
        [self.label, self.dent, self.cap, self.liquid]
    }
}

/// Simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    /// Conveyor speed in slots per second
    pub speed: f64,
    /// Fixed simulation step in milliseconds
    pub tick_ms: u64,
    /// Half-width of the inspection window around slot 3
    pub inspection_epsilon: f64,
    /// Probability that a bottle carries at least one defect
    pub p_issue: f64,
    /// Probability that a faulty bottle carries a second defect
    pub p_multi: f64,
    pub defect_weights: DefectWeights,
    pub spawn: SpawnPolicy,
    /// Cyclic slots used for pattern bucketing
    pub line_length: u32,
    /// Generator runs only in auto mode
    pub auto_mode: bool,
    /// Seed for reproducible runs; entropy when absent
    pub seed: Option<u64>,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            speed: 3.0,
            tick_ms: 16,
            inspection_epsilon: 0.05,
            p_issue: 0.25,
            p_multi: 0.3,
            defect_weights: DefectWeights::default(),
            spawn: SpawnPolicy::default(),
            line_length: DEFAULT_LINE_LENGTH,
            auto_mode: true,
            seed: None,
        }
    }
}

impl LineConfig {
    /// Parse a YAML document; missing fields take their defaults
    pub fn from_yaml_str(text: &str) -> ConfigResult<Self> {
        let config: LineConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Builder-style seed override
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Distance a bottle travels in one tick
    pub fn step_per_tick(&self) -> f64 {
        self.speed * self.tick_ms as f64 / 1000.0
    }

    /// Check every invariant the simulation relies on
    pub fn validate(&self) -> ConfigResult<()> {
        check_probability("p_issue", self.p_issue)?;
        check_probability("p_multi", self.p_multi)?;
        check_positive("speed", self.speed)?;
        check_positive("tick_ms", self.tick_ms as f64)?;
        check_positive("line_length", self.line_length as f64)?;

        match self.spawn {
            SpawnPolicy::FixedInterval { bottles_per_minute } => {
                check_positive("bottles_per_minute", bottles_per_minute)?
            }
            SpawnPolicy::Probabilistic { bottles_per_second } => {
                check_positive("bottles_per_second", bottles_per_second)?
            }
        }

        if !(self.inspection_epsilon > 0.0 && self.inspection_epsilon < 0.5) {
            return Err(ConfigError::InvalidEpsilon(self.inspection_epsilon));
        }

        let weights = self.defect_weights.as_array();
        let negative = weights.iter().any(|w| !w.is_finite() || *w < 0.0);
        if negative || weights.iter().sum::<f64>() <= 0.0 {
            return Err(ConfigError::InvalidWeights);
        }

        // Every bottle must be sampled inside both windows at least once.
        let limit = (2.0 * self.inspection_epsilon).min(EJECTION_WINDOW);
        let step = self.step_per_tick();
        if step >= limit {
            return Err(ConfigError::StepTooLarge { step, limit });
        }

        Ok(())
    }
}

fn check_probability(name: &'static str, value: f64) -> ConfigResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidProbability { name, value })
    }
}

fn check_positive(name: &'static str, value: f64) -> ConfigResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = LineConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.step_per_tick() - 0.048).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_bad_probability() {
        let config = LineConfig { p_issue: 1.5, ..Default::default() };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidProbability { name: "p_issue", .. })
        ));
    }

    #[test]
    fn test_rejects_step_that_skips_window() {
        let config = LineConfig { speed: 10.0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::StepTooLarge { .. })));

        let narrow = LineConfig { inspection_epsilon: 0.02, ..Default::default() };
        assert!(matches!(narrow.validate(), Err(ConfigError::StepTooLarge { .. })));
    }

    #[test]
    fn test_rejects_zero_weights() {
        let config = LineConfig {
            defect_weights: DefectWeights { label: 0.0, dent: 0.0, cap: 0.0, liquid: 0.0 },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidWeights)));
    }

    #[test]
    fn test_yaml_partial_document() {
        let yaml = "speed: 2.5\nseed: 7\nspawn:\n  policy: probabilistic\n  \
                    bottles_per_second: 1.2\n";
        let config = LineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.speed, 2.5);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.spawn, SpawnPolicy::Probabilistic { bottles_per_second: 1.2 });
        assert_eq!(config.tick_ms, 16);
    }

    #[test]
    fn test_yaml_round_trip_default() {
        let yaml = LineConfig::default().to_yaml().unwrap();
        assert_eq!(LineConfig::from_yaml_str(&yaml).unwrap(), LineConfig::default());
    }

    #[test]
    fn test_yaml_rejects_garbage() {
        assert!(matches!(
            LineConfig::from_yaml_str("speed: [fast]"),
            Err(ConfigError::Parse(_))
        ));
    }
}
