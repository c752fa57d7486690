//! Production-line building blocks.
//!
//! The flow items ([`Unit`], [`BatchUnit`]), the per-machine state
//! ([`MachineState`], [`Stage`]) and the unit-to-batch [`Accumulator`].
//!
//! Ownership discipline: a unit or batch is exclusively owned by
//! whichever queue, machine slot or accumulator currently holds it;
//! ownership transfers on every enqueue/dequeue, never shared.

pub mod accumulator;
pub mod item;
pub mod stage;

pub use accumulator::Accumulator;
pub use item::{BatchUnit, Unit};
pub use stage::{BoundedQueue, MachineState, Stage};
