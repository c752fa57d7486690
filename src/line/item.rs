//! Flow items: single units and sealed batches.

use serde::{Deserialize, Serialize};

use crate::engine::SimTime;

/// One item flowing through the line before batching.
///
/// Created at arrival, destroyed if defective after stage 1, otherwise
/// consumed when folded into a [`BatchUnit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Unique sequence id, assigned at arrival.
    pub id: u64,
    /// Time the unit entered the system.
    pub entered_system: SimTime,
    /// Time the unit entered its current queue.
    pub entered_queue: SimTime,
    /// Defect flag, set only at stage 1 completion.
    pub defective: bool,
}

impl Unit {
    /// Create a unit arriving now.
    #[must_use]
    pub const fn new(id: u64, now: SimTime) -> Self {
        Self {
            id,
            entered_system: now,
            entered_queue: now,
            defective: false,
        }
    }

    /// Stamp entry into a new queue.
    pub fn enter_queue(&mut self, now: SimTime) {
        self.entered_queue = now;
    }
}

/// A composite of `batch_size` non-defective units, the flow item from
/// stage 2 onward.
///
/// Its lifecycle ends when stage 3 finishes sealing it; total system
/// time is measured from the earliest constituent unit's entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchUnit {
    /// Unique batch id.
    pub id: u64,
    /// Time the batch was formed by the accumulator.
    pub created_at: SimTime,
    /// Time the batch entered its current queue.
    pub entered_queue: SimTime,
    /// Constituent units, in production (FIFO) order.
    pub units: Vec<Unit>,
}

impl BatchUnit {
    /// Create a batch from units in FIFO order.
    #[must_use]
    pub const fn new(id: u64, now: SimTime, units: Vec<Unit>) -> Self {
        Self {
            id,
            created_at: now,
            entered_queue: now,
            units,
        }
    }

    /// Stamp entry into a new queue.
    pub fn enter_queue(&mut self, now: SimTime) {
        self.entered_queue = now;
    }

    /// System-entry time of the batch: the earliest constituent unit's
    /// arrival. With FIFO batching this is the first unit, but the min
    /// is taken to keep the accounting independent of ordering.
    #[must_use]
    pub fn earliest_entry(&self) -> SimTime {
        self.units
            .iter()
            .map(|u| u.entered_system)
            .min()
            .unwrap_or(self.created_at)
    }

    /// Number of constituent units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the batch holds no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn unit_at(id: u64, secs: f64) -> Unit {
        Unit::new(id, SimTime::from_secs(secs))
    }

    #[test]
    fn test_unit_new() {
        let u = unit_at(3, 1.5);
        assert_eq!(u.id, 3);
        assert_eq!(u.entered_system, SimTime::from_secs(1.5));
        assert_eq!(u.entered_queue, SimTime::from_secs(1.5));
        assert!(!u.defective);
    }

    #[test]
    fn test_unit_enter_queue_keeps_system_entry() {
        let mut u = unit_at(0, 1.0);
        u.enter_queue(SimTime::from_secs(4.0));
        assert_eq!(u.entered_queue, SimTime::from_secs(4.0));
        assert_eq!(u.entered_system, SimTime::from_secs(1.0));
    }

    #[test]
    fn test_batch_earliest_entry() {
        let units = vec![unit_at(0, 2.0), unit_at(1, 5.0), unit_at(2, 3.0)];
        let batch = BatchUnit::new(0, SimTime::from_secs(6.0), units);
        assert_eq!(batch.earliest_entry(), SimTime::from_secs(2.0));
        assert_eq!(batch.len(), 3);
        assert!(!batch.is_empty());
    }

    #[test]
    fn test_batch_earliest_entry_empty_falls_back_to_creation() {
        let batch = BatchUnit::new(0, SimTime::from_secs(6.0), Vec::new());
        assert_eq!(batch.earliest_entry(), SimTime::from_secs(6.0));
        assert!(batch.is_empty());
    }

    #[test]
    fn test_batch_enter_queue() {
        let mut batch = BatchUnit::new(1, SimTime::from_secs(6.0), vec![unit_at(0, 2.0)]);
        batch.enter_queue(SimTime::from_secs(8.0));
        assert_eq!(batch.entered_queue, SimTime::from_secs(8.0));
        assert_eq!(batch.created_at, SimTime::from_secs(6.0));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let batch = BatchUnit::new(7, SimTime::from_secs(1.0), vec![unit_at(0, 0.5)]);
        let json = serde_json::to_string(&batch).unwrap();
        let restored: BatchUnit = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, batch);
    }
}
