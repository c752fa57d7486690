//! Validated random source: LCG batches filtered by the battery.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::random::battery::run_battery;
use crate::random::{box_muller, LinearCongruence, RandomSource};

const DEFAULT_BATCH_SIZE: usize = 50_000;
const DEFAULT_ALPHA: f64 = 0.01;
const DEFAULT_MAX_ATTEMPTS: u32 = 10;
const CHI_SQUARE_INTERVALS: usize = 10;

/// Random source that serves linear-congruential outputs only after the
/// whole batch passes the goodness-of-fit battery.
///
/// When a batch is exhausted the next one is generated and validated on
/// demand. If `max_attempts` consecutive batches fail, the source
/// reports `SimError::RandomSource`; the simulation core treats that as
/// fatal and never substitutes a degraded stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedSource {
    rng: LinearCongruence,
    batch_size: usize,
    alpha: f64,
    max_attempts: u32,
    #[serde(skip)]
    batch: Vec<f64>,
    #[serde(skip)]
    cursor: usize,
}

impl ValidatedSource {
    /// Create a source with default batch size, significance level and
    /// retry budget.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_settings(seed, DEFAULT_BATCH_SIZE, DEFAULT_ALPHA, DEFAULT_MAX_ATTEMPTS)
    }

    /// Create a source with explicit settings.
    #[must_use]
    pub fn with_settings(seed: u64, batch_size: usize, alpha: f64, max_attempts: u32) -> Self {
        Self {
            rng: LinearCongruence::new(seed),
            batch_size,
            alpha,
            max_attempts,
            batch: Vec::new(),
            cursor: 0,
        }
    }

    /// Number of values still available from the current batch.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.batch.len().saturating_sub(self.cursor)
    }

    fn refill(&mut self) -> SimResult<()> {
        for _ in 0..self.max_attempts {
            let candidate = self.rng.batch(self.batch_size);
            if run_battery(&candidate, self.alpha, CHI_SQUARE_INTERVALS).accepted() {
                self.batch = candidate;
                self.cursor = 0;
                return Ok(());
            }
        }
        Err(SimError::RandomSource {
            attempts: self.max_attempts,
        })
    }
}

impl RandomSource for ValidatedSource {
    fn uniform(&mut self) -> SimResult<f64> {
        if self.cursor >= self.batch.len() {
            self.refill()?;
        }
        let value = self.batch[self.cursor];
        self.cursor += 1;
        Ok(value)
    }

    fn gaussian(&mut self, mean: f64, std_dev: f64) -> SimResult<f64> {
        let u1 = self.uniform()?;
        let u2 = self.uniform()?;
        Ok(box_muller(u1, u2).mul_add(std_dev, mean))
    }

    fn reseed(&mut self, seed: u64) {
        self.rng.seed(seed);
        self.batch.clear();
        self.cursor = 0;
    }
}
