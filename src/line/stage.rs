//! Machine state, bounded buffers and the per-stage state machine.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// State of one machine.
///
/// `Blocked` is a logical state, not a thread-blocking wait: the stage
/// finished work but cannot push downstream, and retains the finished
/// item until space frees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MachineState {
    /// Never started, or explicitly reset.
    Idle,
    /// Working on an item.
    Processing,
    /// Finished an item but the downstream buffer is full.
    Blocked,
    /// Finished and found no upstream input.
    Starved,
}

impl MachineState {
    /// Whether the machine can accept a new item right now.
    #[must_use]
    pub const fn can_start(self) -> bool {
        matches!(self, Self::Idle | Self::Starved)
    }
}

impl std::fmt::Display for MachineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Processing => "processing",
            Self::Blocked => "blocked",
            Self::Starved => "starved",
        };
        write!(f, "{s}")
    }
}

/// Capacity-bounded FIFO buffer.
///
/// Capacity zero is legal; such a queue rejects every push.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundedQueue<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Create an empty queue with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push an item, returning it back if the queue is full.
    ///
    /// # Errors
    ///
    /// Returns `Err(item)` when at capacity; ownership goes back to the
    /// caller, which decides whether to drop or retain it.
    pub fn push(&mut self, item: T) -> Result<(), T> {
        if self.items.len() >= self.capacity {
            return Err(item);
        }
        self.items.push_back(item);
        Ok(())
    }

    /// Pop the oldest item.
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// Current depth.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the queue is at capacity.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    /// Configured capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

/// One machine: a bounded input queue, a state, and a slot for the item
/// currently in the machine (in process, or finished-and-retained while
/// blocked).
///
/// Invariant: `slot.is_some()` implies the state is `Processing` or
/// `Blocked`; a stage holding an item is never `Idle`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage<T> {
    /// Input buffer.
    pub queue: BoundedQueue<T>,
    /// Current machine state.
    pub state: MachineState,
    /// Item currently held by the machine.
    pub slot: Option<T>,
}

impl<T> Stage<T> {
    /// Create an idle stage with the given input capacity.
    #[must_use]
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            queue: BoundedQueue::new(queue_capacity),
            state: MachineState::Idle,
            slot: None,
        }
    }

    /// Put an item into the machine and mark it processing.
    pub fn begin(&mut self, item: T) {
        self.slot = Some(item);
        self.state = MachineState::Processing;
    }

    /// Take the finished item out of the machine.
    pub fn finish(&mut self) -> Option<T> {
        self.slot.take()
    }

    /// Retain a finished item and mark the machine blocked.
    pub fn block_with(&mut self, item: T) {
        self.slot = Some(item);
        self.state = MachineState::Blocked;
    }

    /// Whether the machine currently holds an item.
    #[must_use]
    pub const fn is_holding(&self) -> bool {
        self.slot.is_some()
    }

    /// Work-in-process at this stage: queue depth plus the held item.
    #[must_use]
    pub fn wip(&self) -> usize {
        self.queue.len() + usize::from(self.slot.is_some())
    }
}
