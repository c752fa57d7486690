//! Configuration for a production-line run.
//!
//! Mistake-proofed through:
//! - Type-safe configuration structs
//! - Compile-time validation via serde
//! - Runtime semantic validation
//!
//! Invalid parameters are rejected at construction time; a run is never
//! started with a malformed configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::error::{SimError, SimResult};

/// Processing-time parameters for one stage.
///
/// Service durations are drawn as `Normal(mean, std_dev)` and clamped
/// to zero before scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct StageParams {
    /// Mean processing time.
    #[validate(range(min = 0.0))]
    pub mean: f64,
    /// Standard deviation of the processing time.
    #[validate(range(min = 0.0))]
    pub std_dev: f64,
}

impl StageParams {
    /// Create stage parameters.
    #[must_use]
    pub const fn new(mean: f64, std_dev: f64) -> Self {
        Self { mean, std_dev }
    }
}

/// Top-level simulation configuration.
///
/// Loaded from YAML or built programmatically via [`LineConfig::builder`].
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct LineConfig {
    /// Total simulation horizon (simulated time units).
    #[validate(range(min = 0.0))]
    #[serde(default = "default_horizon")]
    pub horizon: f64,

    /// Capacity of the queue feeding stage 1. Zero is legal: every
    /// arrival while stage 1 is busy is then lost.
    #[serde(default = "default_queue1_capacity")]
    pub queue1_capacity: usize,

    /// Capacity of the batch queue feeding stage 2. Must be at least 1;
    /// a zero-capacity batch queue would deadlock the line.
    #[serde(default = "default_queue2_capacity")]
    pub queue2_capacity: usize,

    /// Capacity of the batch queue feeding stage 3. Dedicated parameter,
    /// not an alias of `queue2_capacity`. Must be at least 1.
    #[serde(default = "default_queue3_capacity")]
    pub queue3_capacity: usize,

    /// Number of good units folded into one batch.
    #[validate(range(min = 1))]
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Mean interarrival time of raw units (exponential).
    #[validate(range(min = 0.0))]
    #[serde(default = "default_mean_interarrival")]
    pub mean_interarrival: f64,

    /// Stage 1 (production) processing-time parameters.
    #[validate(nested)]
    #[serde(default = "default_stage1")]
    pub stage1: StageParams,

    /// Stage 2 (packing) processing-time parameters.
    #[validate(nested)]
    #[serde(default = "default_stage2")]
    pub stage2: StageParams,

    /// Stage 3 (sealing) processing-time parameters.
    #[validate(nested)]
    #[serde(default = "default_stage3")]
    pub stage3: StageParams,

    /// Probability that a unit leaving stage 1 is defective.
    /// Convention: defect ⇔ `uniform() < defect_prob`.
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default = "default_defect_prob")]
    pub defect_prob: f64,

    /// Master seed for the random source.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

const fn default_horizon() -> f64 {
    1000.0
}

const fn default_queue1_capacity() -> usize {
    100
}

const fn default_queue2_capacity() -> usize {
    20
}

const fn default_queue3_capacity() -> usize {
    20
}

const fn default_batch_size() -> usize {
    50
}

const fn default_mean_interarrival() -> f64 {
    1.0
}

const fn default_stage1() -> StageParams {
    StageParams::new(1.0, 0.1)
}

const fn default_stage2() -> StageParams {
    StageParams::new(45.0, 5.0)
}

const fn default_stage3() -> StageParams {
    StageParams::new(10.0, 1.0)
}

const fn default_defect_prob() -> f64 {
    0.05
}

const fn default_seed() -> u64 {
    42
}

impl LineConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - YAML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> SimResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.check()?;
        Ok(config)
    }

    /// Create a builder for configuration.
    #[must_use]
    pub fn builder() -> LineConfigBuilder {
        LineConfigBuilder::default()
    }

    /// Validate all constraints, schema and semantic.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Validation` or `SimError::Config` on any
    /// malformed parameter.
    pub fn check(&self) -> SimResult<()> {
        self.validate()?;
        self.validate_semantic()
    }

    /// Validate semantic constraints beyond schema.
    fn validate_semantic(&self) -> SimResult<()> {
        if !self.horizon.is_finite() || self.horizon <= 0.0 {
            return Err(SimError::config("Horizon must be positive and finite"));
        }
        if !self.mean_interarrival.is_finite() || self.mean_interarrival <= 0.0 {
            return Err(SimError::config(
                "Mean interarrival time must be positive and finite",
            ));
        }
        for (name, stage) in [
            ("stage1", self.stage1),
            ("stage2", self.stage2),
            ("stage3", self.stage3),
        ] {
            if !stage.mean.is_finite() || stage.mean <= 0.0 {
                return Err(SimError::config(format!(
                    "{name}: mean processing time must be positive, got {}",
                    stage.mean
                )));
            }
            if !stage.std_dev.is_finite() || stage.std_dev < 0.0 {
                return Err(SimError::config(format!(
                    "{name}: std dev must be non-negative, got {}",
                    stage.std_dev
                )));
            }
        }
        if !self.defect_prob.is_finite() {
            return Err(SimError::config("Defect probability must be finite"));
        }
        // Queue 1 may be zero (pure loss system), but a zero-capacity
        // batch queue can never accept a batch and the line deadlocks
        // as soon as the accumulator fills
        if self.queue2_capacity == 0 {
            return Err(SimError::config("queue2_capacity must be at least 1"));
        }
        if self.queue3_capacity == 0 {
            return Err(SimError::config("queue3_capacity must be at least 1"));
        }
        Ok(())
    }
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            horizon: default_horizon(),
            queue1_capacity: default_queue1_capacity(),
            queue2_capacity: default_queue2_capacity(),
            queue3_capacity: default_queue3_capacity(),
            batch_size: default_batch_size(),
            mean_interarrival: default_mean_interarrival(),
            stage1: default_stage1(),
            stage2: default_stage2(),
            stage3: default_stage3(),
            defect_prob: default_defect_prob(),
            seed: default_seed(),
        }
    }
}

/// Configuration builder for programmatic construction.
#[derive(Debug, Default)]
pub struct LineConfigBuilder {
    config: LineConfig,
}

impl LineConfigBuilder {
    /// Set the simulation horizon.
    #[must_use]
    pub const fn horizon(mut self, horizon: f64) -> Self {
        self.config.horizon = horizon;
        self
    }

    /// Set the capacity of queue 1.
    #[must_use]
    pub const fn queue1_capacity(mut self, capacity: usize) -> Self {
        self.config.queue1_capacity = capacity;
        self
    }

    /// Set the capacity of queue 2.
    #[must_use]
    pub const fn queue2_capacity(mut self, capacity: usize) -> Self {
        self.config.queue2_capacity = capacity;
        self
    }

    /// Set the capacity of queue 3.
    #[must_use]
    pub const fn queue3_capacity(mut self, capacity: usize) -> Self {
        self.config.queue3_capacity = capacity;
        self
    }

    /// Set the batch size.
    #[must_use]
    pub const fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    /// Set the mean interarrival time.
    #[must_use]
    pub const fn mean_interarrival(mut self, mean: f64) -> Self {
        self.config.mean_interarrival = mean;
        self
    }

    /// Set stage 1 processing-time parameters.
    #[must_use]
    pub const fn stage1(mut self, params: StageParams) -> Self {
        self.config.stage1 = params;
        self
    }

    /// Set stage 2 processing-time parameters.
    #[must_use]
    pub const fn stage2(mut self, params: StageParams) -> Self {
        self.config.stage2 = params;
        self
    }

    /// Set stage 3 processing-time parameters.
    #[must_use]
    pub const fn stage3(mut self, params: StageParams) -> Self {
        self.config.stage3 = params;
        self
    }

    /// Set the defect probability.
    #[must_use]
    pub const fn defect_prob(mut self, p: f64) -> Self {
        self.config.defect_prob = p;
        self
    }

    /// Set the random seed.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Build the configuration. Validation happens when the engine is
    /// constructed.
    #[must_use]
    pub fn build(self) -> LineConfig {
        self.config
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = LineConfig::default();
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = LineConfig::builder()
            .horizon(500.0)
            .queue1_capacity(10)
            .queue2_capacity(5)
            .queue3_capacity(5)
            .batch_size(50)
            .mean_interarrival(1.0)
            .stage1(StageParams::new(1.0, 0.1))
            .stage2(StageParams::new(45.0, 5.0))
            .stage3(StageParams::new(10.0, 1.0))
            .defect_prob(0.05)
            .seed(42)
            .build();

        assert!((config.horizon - 500.0).abs() < f64::EPSILON);
        assert_eq!(config.queue1_capacity, 10);
        assert_eq!(config.queue3_capacity, 5);
        assert_eq!(config.seed, 42);
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let config = LineConfig::builder().horizon(0.0).build();
        assert!(config.check().is_err());
    }

    #[test]
    fn test_negative_mean_rejected() {
        let config = LineConfig::builder()
            .stage2(StageParams::new(-1.0, 0.5))
            .build();
        assert!(config.check().is_err());
    }

    #[test]
    fn test_negative_std_dev_rejected() {
        let config = LineConfig::builder()
            .stage1(StageParams::new(1.0, -0.1))
            .build();
        assert!(config.check().is_err());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = LineConfig::builder().batch_size(0).build();
        assert!(config.check().is_err());
    }

    #[test]
    fn test_defect_prob_out_of_range_rejected() {
        let config = LineConfig::builder().defect_prob(1.5).build();
        assert!(config.check().is_err());

        let config = LineConfig::builder().defect_prob(-0.1).build();
        assert!(config.check().is_err());
    }

    #[test]
    fn test_zero_queue1_capacity_is_legal() {
        let config = LineConfig::builder().queue1_capacity(0).build();
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_zero_batch_queue_capacity_rejected() {
        // A batch queue that can never accept a batch would leave
        // stage 1 blocked forever once the accumulator fills
        let config = LineConfig::builder().queue2_capacity(0).build();
        assert!(config.check().is_err());

        let config = LineConfig::builder().queue3_capacity(0).build();
        assert!(config.check().is_err());
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r"
horizon: 1000.0
queue1_capacity: 10
queue2_capacity: 5
queue3_capacity: 5
batch_size: 50
mean_interarrival: 1.0
stage1: { mean: 1.0, std_dev: 0.1 }
stage2: { mean: 45.0, std_dev: 5.0 }
stage3: { mean: 10.0, std_dev: 1.0 }
defect_prob: 0.05
seed: 42
";
        let config = LineConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.queue1_capacity, 10);
        assert_eq!(config.batch_size, 50);
        assert!((config.stage2.mean - 45.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_yaml_defaults() {
        let config = LineConfig::from_yaml("seed: 7").unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.batch_size, 50);
        assert!((config.horizon - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_yaml_unknown_field_rejected() {
        let result = LineConfig::from_yaml("unknown_knob: 1");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_yaml_invalid_value_rejected() {
        let result = LineConfig::from_yaml("defect_prob: 2.0");
        assert!(result.is_err());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let config = LineConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let restored = LineConfig::from_yaml(&yaml).unwrap();
        assert_eq!(restored.queue2_capacity, config.queue2_capacity);
        assert!((restored.defect_prob - config.defect_prob).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stage_params_new() {
        let params = StageParams::new(2.0, 0.2);
        assert!((params.mean - 2.0).abs() < f64::EPSILON);
        assert!((params.std_dev - 0.2).abs() < f64::EPSILON);
    }
}
