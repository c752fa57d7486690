//! Core simulation engine.
//!
//! Single-threaded, cooperative, event-driven. "Concurrency" between
//! stages is modeled purely through the event queue's time ordering:
//! one handler runs to completion before the next event is popped, so
//! the whole run is linearizable and reproducible given a fixed seed.

pub mod clock;
pub mod scheduler;
pub mod stats;

use serde::{Deserialize, Serialize};

pub use clock::SimClock;
pub use scheduler::{EventScheduler, ScheduledEvent};
pub use stats::{RunReport, StatsRecorder};

use crate::config::{LineConfig, StageParams};
use crate::error::SimResult;
use crate::line::{Accumulator, BatchUnit, MachineState, Stage, Unit};
use crate::random::{PcgSource, RandomSource};
use stats::Counters;

/// Simulation time representation.
///
/// Uses a fixed-point representation for reproducibility across
/// platforms. Internal representation is in nanoseconds from simulation
/// start.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct SimTime {
    /// Time in nanoseconds from simulation start.
    nanos: u64,
}

impl SimTime {
    /// Zero time (simulation start).
    pub const ZERO: Self = Self { nanos: 0 };

    /// Create time from seconds.
    ///
    /// # Panics
    ///
    /// Panics if seconds is negative or not finite.
    #[must_use]
    pub fn from_secs(secs: f64) -> Self {
        assert!(secs >= 0.0, "SimTime cannot be negative");
        assert!(secs.is_finite(), "SimTime must be finite");
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let nanos = (secs * 1_000_000_000.0) as u64;
        Self { nanos }
    }

    /// Create time from nanoseconds.
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self { nanos }
    }

    /// Get time as seconds (f64).
    #[must_use]
    pub fn as_secs_f64(&self) -> f64 {
        self.nanos as f64 / 1_000_000_000.0
    }

    /// Get time as nanoseconds.
    #[must_use]
    pub const fn as_nanos(&self) -> u64 {
        self.nanos
    }
}

impl std::ops::Add for SimTime {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            nanos: self.nanos + rhs.nanos,
        }
    }
}

impl std::ops::Sub for SimTime {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            nanos: self.nanos.saturating_sub(rhs.nanos),
        }
    }
}

impl std::fmt::Display for SimTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.9}s", self.as_secs_f64())
    }
}

/// Kinds of events driving the line.
///
/// Items live in machine slots and queues, not in the events, so the
/// payload is empty; ordering never inspects it either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineEvent {
    /// A raw unit arrives at the head of the line.
    Arrival,
    /// Stage 1 finishes producing a unit.
    Stage1Done,
    /// Stage 2 finishes packing a batch.
    Stage2Done,
    /// Stage 3 finishes sealing a batch.
    Stage3Done,
}

/// Main simulation engine.
///
/// Owns the event queue, the clock, the three stages, the accumulator
/// and the statistics recorder for the run's lifetime. Units and
/// batches are exclusively owned by whichever queue or machine slot
/// currently holds them; ownership transfers on enqueue/dequeue.
pub struct LineEngine {
    config: LineConfig,
    clock: SimClock,
    scheduler: EventScheduler,
    stage1: Stage<Unit>,
    stage2: Stage<BatchUnit>,
    stage3: Stage<BatchUnit>,
    accumulator: Accumulator,
    stats: StatsRecorder,
    source: Box<dyn RandomSource>,
    next_unit_id: u64,
    next_batch_id: u64,
}

impl LineEngine {
    /// Create an engine with the default PCG random source.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Config`/`SimError::Validation` if the
    /// configuration is malformed; the run is refused before any event
    /// is scheduled.
    pub fn new(config: LineConfig) -> SimResult<Self> {
        let source = Box::new(PcgSource::new(config.seed));
        Self::with_source(config, source)
    }

    /// Create an engine with an explicit random source.
    ///
    /// # Errors
    ///
    /// Same as [`LineEngine::new`].
    pub fn with_source(config: LineConfig, source: Box<dyn RandomSource>) -> SimResult<Self> {
        config.check()?;

        let mut engine = Self {
            clock: SimClock::new(SimTime::from_secs(config.horizon)),
            scheduler: EventScheduler::new(),
            stage1: Stage::new(config.queue1_capacity),
            stage2: Stage::new(config.queue2_capacity),
            stage3: Stage::new(config.queue3_capacity),
            accumulator: Accumulator::new(config.batch_size),
            stats: StatsRecorder::new(),
            source,
            next_unit_id: 0,
            next_batch_id: 0,
            config,
        };
        engine.scheduler.schedule(SimTime::ZERO, LineEvent::Arrival);
        Ok(engine)
    }

    /// Reset to a fresh run: clears all state, re-seeds the source from
    /// the configuration and schedules the first arrival. The only
    /// place the source is ever re-seeded.
    pub fn reset(&mut self) {
        self.clock.reset();
        self.scheduler.clear();
        self.stage1 = Stage::new(self.config.queue1_capacity);
        self.stage2 = Stage::new(self.config.queue2_capacity);
        self.stage3 = Stage::new(self.config.queue3_capacity);
        self.accumulator = Accumulator::new(self.config.batch_size);
        self.stats = StatsRecorder::new();
        self.source.reseed(self.config.seed);
        self.next_unit_id = 0;
        self.next_batch_id = 0;
        self.scheduler.schedule(SimTime::ZERO, LineEvent::Arrival);
    }

    /// Run until the given time.
    ///
    /// Pops the minimum-time event, advances the clock (never
    /// backward) and dispatches, stopping when the queue is empty or
    /// the next event lies beyond `until`. No event with time greater
    /// than `until` is processed; it stays queued, so a later call with
    /// a larger bound resumes exactly where this one stopped.
    ///
    /// # Errors
    ///
    /// Propagates random-source failures; the run is aborted.
    pub fn run_until(&mut self, until: SimTime) -> SimResult<()> {
        while let Some(next_time) = self.scheduler.next_event_time() {
            if next_time > until {
                break;
            }
            if let Some(scheduled) = self.scheduler.next() {
                self.clock.advance_to(scheduled.time);
                self.dispatch(scheduled.event)?;
                self.record_sample();
            }
        }
        Ok(())
    }

    /// Run to the configured horizon and build the report.
    ///
    /// # Errors
    ///
    /// Propagates random-source failures; the run is aborted.
    pub fn run(&mut self) -> SimResult<RunReport> {
        let horizon = self.clock.horizon();
        self.run_until(horizon)?;
        Ok(self.stats.clone().finalize(horizon.as_secs_f64()))
    }

    fn dispatch(&mut self, event: LineEvent) -> SimResult<()> {
        match event {
            LineEvent::Arrival => self.handle_arrival(),
            LineEvent::Stage1Done => self.handle_stage1_done(),
            LineEvent::Stage2Done => self.handle_stage2_done(),
            LineEvent::Stage3Done => self.handle_stage3_done(),
        }
    }

    // ===== Stage 1: production with defects =====

    fn handle_arrival(&mut self) -> SimResult<()> {
        let now = self.clock.current_time();

        // Schedule the next arrival first so the draw order is fixed
        let gap = self.draw_exponential(self.config.mean_interarrival)?;
        self.scheduler.schedule(now + gap, LineEvent::Arrival);

        let unit = Unit::new(self.next_unit_id, now);
        self.next_unit_id += 1;

        if self.stage1.state.can_start() {
            self.start_stage1(unit)?;
        } else if self.stage1.queue.push(unit).is_err() {
            // Drop-on-full policy: the unit is discarded, not retried
            self.stats.counters.lost += 1;
        }
        Ok(())
    }

    fn start_stage1(&mut self, unit: Unit) -> SimResult<()> {
        let duration = self.draw_service(self.config.stage1)?;
        let now = self.clock.current_time();
        self.scheduler.schedule(now + duration, LineEvent::Stage1Done);
        self.stage1.begin(unit);
        Ok(())
    }

    fn handle_stage1_done(&mut self) -> SimResult<()> {
        let Some(mut unit) = self.stage1.finish() else {
            return Ok(());
        };
        self.stats.counters.produced += 1;

        // Bernoulli success = defect when uniform() < defect_prob
        if self.source.uniform()? < self.config.defect_prob {
            unit.defective = true;
            self.stats.counters.defective += 1;
            drop(unit);
        } else {
            self.stats.counters.good += 1;
            self.accumulator.push(unit);
            if self.accumulator.ready() && !self.try_form_batch()? {
                // Queue 2 is full: block, do not pull from queue 1
                self.stage1.state = MachineState::Blocked;
                return Ok(());
            }
        }

        self.pull_stage1()
    }

    fn pull_stage1(&mut self) -> SimResult<()> {
        if let Some(unit) = self.stage1.queue.pop() {
            self.start_stage1(unit)?;
        } else {
            self.stage1.state = MachineState::Starved;
        }
        Ok(())
    }

    /// Re-attempt batch formation for a blocked stage 1 and resume it
    /// on success.
    fn maybe_unblock_stage1(&mut self) -> SimResult<()> {
        if self.stage1.state == MachineState::Blocked && self.try_form_batch()? {
            self.pull_stage1()?;
        }
        Ok(())
    }

    // ===== Accumulator =====

    /// Wrap the oldest `batch_size` good units into a batch and push it
    /// onto queue 2. Returns `false` when queue 2 has no room; the
    /// caller must block upstream.
    fn try_form_batch(&mut self) -> SimResult<bool> {
        if !self.accumulator.ready() {
            return Ok(true);
        }
        if self.stage2.queue.is_full() {
            return Ok(false);
        }

        let now = self.clock.current_time();
        if let Some(batch) = self.accumulator.take_batch(self.next_batch_id, now) {
            self.next_batch_id += 1;
            if self.stage2.queue.push(batch).is_ok() && self.stage2.state.can_start() {
                self.start_stage2()?;
            }
        }
        Ok(true)
    }

    // ===== Stage 2: packing =====

    fn start_stage2(&mut self) -> SimResult<()> {
        if !self.stage2.state.can_start() {
            return Ok(());
        }
        if let Some(batch) = self.stage2.queue.pop() {
            let duration = self.draw_service(self.config.stage2)?;
            let now = self.clock.current_time();
            self.scheduler.schedule(now + duration, LineEvent::Stage2Done);
            self.stage2.begin(batch);
        }
        Ok(())
    }

    fn handle_stage2_done(&mut self) -> SimResult<()> {
        let Some(mut batch) = self.stage2.finish() else {
            return Ok(());
        };
        self.stats.counters.packed += 1;
        let now = self.clock.current_time();

        if self.stage3.queue.is_full() {
            // Retain the finished batch until queue 3 frees up
            self.stage2.block_with(batch);
        } else {
            batch.enter_queue(now);
            if self.stage3.queue.push(batch).is_ok() {
                self.start_stage3()?;
            }
            self.stage2.state = MachineState::Starved;
            self.start_stage2()?;
        }

        // Cascading unblock: stage 1 re-attempts batch formation at the
        // end of every Stage2Done
        self.maybe_unblock_stage1()
    }

    // ===== Stage 3: sealing =====

    fn start_stage3(&mut self) -> SimResult<()> {
        if !self.stage3.state.can_start() {
            return Ok(());
        }
        if let Some(batch) = self.stage3.queue.pop() {
            let duration = self.draw_service(self.config.stage3)?;
            let now = self.clock.current_time();
            self.scheduler.schedule(now + duration, LineEvent::Stage3Done);
            self.stage3.begin(batch);
        }
        Ok(())
    }

    fn handle_stage3_done(&mut self) -> SimResult<()> {
        let Some(batch) = self.stage3.finish() else {
            return Ok(());
        };
        self.stats.counters.sealed += 1;
        let now = self.clock.current_time();

        // System time runs from the earliest constituent unit's arrival
        let elapsed = (now - batch.earliest_entry()).as_secs_f64();
        self.stats.record_system_time(elapsed);
        drop(batch);

        self.stage3.state = MachineState::Starved;
        self.start_stage3()?;

        // Cascading unblock: stage 2's held batch moves into queue 3,
        // stage 2 resumes, and stage 1 gets its own re-attempt since
        // resuming stage 2 frees queue 2 space
        if self.stage2.state == MachineState::Blocked && !self.stage3.queue.is_full() {
            if let Some(mut held) = self.stage2.finish() {
                held.enter_queue(now);
                if self.stage3.queue.push(held).is_ok() {
                    self.start_stage3()?;
                }
                self.stage2.state = MachineState::Starved;
                self.start_stage2()?;
                self.maybe_unblock_stage1()?;
            }
        }
        Ok(())
    }

    // ===== Draws =====

    fn draw_exponential(&mut self, mean: f64) -> SimResult<SimTime> {
        let u = self.source.uniform()?;
        let u = if u <= 0.0 { 1e-9 } else { u };
        Ok(SimTime::from_secs(-u.ln() * mean))
    }

    /// Normal service draw, clamped to zero before scheduling.
    fn draw_service(&mut self, params: StageParams) -> SimResult<SimTime> {
        let duration = self.source.gaussian(params.mean, params.std_dev)?;
        Ok(SimTime::from_secs(duration.max(0.0)))
    }

    fn record_sample(&mut self) {
        let now = self.clock.current_time().as_secs_f64();
        self.stats.sample(
            now,
            self.stage1.queue.len(),
            self.stage2.queue.len(),
            self.stage3.queue.len(),
            self.accumulator.len(),
            [self.stage1.state, self.stage2.state, self.stage3.state],
        );
    }

    // ===== Accessors =====

    /// Current simulation time.
    #[must_use]
    pub fn current_time(&self) -> SimTime {
        self.clock.current_time()
    }

    /// Configuration the engine was built with.
    #[must_use]
    pub const fn config(&self) -> &LineConfig {
        &self.config
    }

    /// Counters as of now.
    #[must_use]
    pub const fn counters(&self) -> Counters {
        self.stats.counters
    }

    /// Depth of the unit queue feeding stage 1.
    #[must_use]
    pub fn queue1_depth(&self) -> usize {
        self.stage1.queue.len()
    }

    /// Depth of the batch queue feeding stage 2.
    #[must_use]
    pub fn queue2_depth(&self) -> usize {
        self.stage2.queue.len()
    }

    /// Depth of the batch queue feeding stage 3.
    #[must_use]
    pub fn queue3_depth(&self) -> usize {
        self.stage3.queue.len()
    }

    /// Units buffered in the accumulator.
    #[must_use]
    pub fn accumulator_len(&self) -> usize {
        self.accumulator.len()
    }

    /// Machine states of the three stages.
    #[must_use]
    pub const fn stage_states(&self) -> [MachineState; 3] {
        [self.stage1.state, self.stage2.state, self.stage3.state]
    }

    /// Whether stage 2's machine slot holds a batch.
    #[must_use]
    pub const fn stage2_holding(&self) -> bool {
        self.stage2.is_holding()
    }

    /// Conservation check: every good unit is in the accumulator, in a
    /// queued batch, in the batch stage 2 is processing, or in a batch
    /// stage 2 has already finished.
    #[must_use]
    pub fn conservation_holds(&self) -> bool {
        let b = self.config.batch_size as u64;
        let in_stage2 = u64::from(self.stage2.state == MachineState::Processing);
        let batched = b * (self.stats.counters.packed + self.queue2_depth() as u64 + in_stage2);
        self.stats.counters.good == batched + self.accumulator_len() as u64
    }
}
