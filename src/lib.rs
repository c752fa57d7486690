//! # lineasim
//!
//! Discrete-event simulation of a three-stage production line
//! (produce → pack → seal) with finite buffers, blocking, defects and a
//! unit-to-batch accumulator, driven by a deterministic random source.
//!
//! Reproducibility guarantee: given the same configuration and seed, two
//! runs produce identical event sequences and identical statistics.
//!
//! ## Example
//!
//! ```rust
//! use lineasim::prelude::*;
//!
//! let config = LineConfig::builder()
//!     .horizon(200.0)
//!     .seed(42)
//!     .build();
//! let mut engine = LineEngine::new(config)?;
//! let report = engine.run()?;
//! assert!(report.counters.produced > 0);
//! # Ok::<(), lineasim::SimError>(())
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::missing_const_for_fn,  // Many functions can't be const in stable Rust
)]

pub mod config;
pub mod engine;
pub mod error;
pub mod line;
pub mod random;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{LineConfig, LineConfigBuilder, StageParams};
    pub use crate::engine::stats::RunReport;
    pub use crate::engine::{LineEngine, LineEvent, SimTime};
    pub use crate::error::{SimError, SimResult};
    pub use crate::line::MachineState;
    pub use crate::random::{PcgSource, RandomSource, ValidatedSource};
}

/// Re-export for public API
pub use error::{SimError, SimResult};
