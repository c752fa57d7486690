//! Simulation clock for the event-driven main loop.
//!
//! Unlike a fixed-timestep clock, this one jumps directly to each
//! event's timestamp. The only invariant is monotonicity: the clock
//! never moves backward.

use serde::{Deserialize, Serialize};

use crate::engine::SimTime;

/// Event-driven simulation clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimClock {
    /// Current simulation time.
    current: SimTime,
    /// Number of events dispatched.
    event_count: u64,
    /// Configured run horizon.
    horizon: SimTime,
}

impl SimClock {
    /// Create a clock at time zero with the given horizon.
    #[must_use]
    pub const fn new(horizon: SimTime) -> Self {
        Self {
            current: SimTime::ZERO,
            event_count: 0,
            horizon,
        }
    }

    /// Get current simulation time.
    #[must_use]
    pub const fn current_time(&self) -> SimTime {
        self.current
    }

    /// Get the configured horizon.
    #[must_use]
    pub const fn horizon(&self) -> SimTime {
        self.horizon
    }

    /// Get the number of events dispatched so far.
    #[must_use]
    pub const fn event_count(&self) -> u64 {
        self.event_count
    }

    /// Advance to an event's time, never backward, and count the event.
    ///
    /// Returns the new time.
    pub fn advance_to(&mut self, time: SimTime) -> SimTime {
        if time > self.current {
            self.current = time;
        }
        self.event_count += 1;
        self.current
    }

    /// Whether a given event time lies beyond the horizon.
    #[must_use]
    pub fn past_horizon(&self, time: SimTime) -> bool {
        time > self.horizon
    }

    /// Reset the clock to time zero.
    pub fn reset(&mut self) {
        self.current = SimTime::ZERO;
        self.event_count = 0;
    }
}
