//! Unit-to-batch accumulator between stage 1 and stage 2.
//!
//! Good units aggregate here until `batch_size` of them can be wrapped
//! into one [`BatchUnit`]. FIFO discipline: first-produced,
//! first-batched, so the earliest unit determines a batch's system
//! entry time and system-time-in-queue statistics stay meaningful.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::engine::SimTime;
use crate::line::item::{BatchUnit, Unit};

/// FIFO staging area converting units into batches.
///
/// Conceptually unbounded; in practice capped by how fast stage 1
/// feeds it while stage 2 keeps up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Accumulator {
    units: VecDeque<Unit>,
    batch_size: usize,
}

impl Accumulator {
    /// Create an empty accumulator.
    ///
    /// `batch_size` must be at least 1; configuration validation
    /// guarantees this before an engine is built.
    #[must_use]
    pub fn new(batch_size: usize) -> Self {
        Self {
            units: VecDeque::new(),
            batch_size,
        }
    }

    /// Append a good unit.
    pub fn push(&mut self, unit: Unit) {
        self.units.push_back(unit);
    }

    /// Whether enough units are buffered to form a batch.
    #[must_use]
    pub fn ready(&self) -> bool {
        self.units.len() >= self.batch_size
    }

    /// Remove the oldest `batch_size` units and wrap them into a batch
    /// stamped with the current time.
    ///
    /// Returns `None` when fewer than `batch_size` units are buffered;
    /// the caller checks queue2 capacity before committing the take.
    pub fn take_batch(&mut self, id: u64, now: SimTime) -> Option<BatchUnit> {
        if !self.ready() {
            return None;
        }
        let units: Vec<Unit> = self.units.drain(..self.batch_size).collect();
        Some(BatchUnit::new(id, now, units))
    }

    /// Number of buffered units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether no units are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Configured batch size.
    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }
}
