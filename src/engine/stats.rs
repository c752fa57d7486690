//! Run statistics: incremental recording and the final report.
//!
//! Counters and time series are updated incrementally on every
//! state-changing event; the strongly-typed [`RunReport`] is built once
//! at run end. Nothing here is ever surfaced as an error: capacity
//! rejections and blocking are data, not faults.

use serde::{Deserialize, Serialize};

use crate::line::MachineState;

/// Cumulative event counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    /// Units that finished stage 1 (good or defective).
    pub produced: u64,
    /// Units found defective at stage 1 and discarded.
    pub defective: u64,
    /// Non-defective units handed to the accumulator.
    pub good: u64,
    /// Batches that finished packing at stage 2.
    pub packed: u64,
    /// Batches that finished sealing at stage 3.
    pub sealed: u64,
    /// Arrivals discarded because queue 1 was full.
    pub lost: u64,
}

/// One `(time, level)` occupancy sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WipSample {
    /// Sample time.
    pub time: f64,
    /// Occupancy at that time.
    pub level: usize,
}

/// Machine states observed at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateSample {
    /// Sample time.
    pub time: f64,
    /// Stage 1 state.
    pub stage1: MachineState,
    /// Stage 2 state.
    pub stage2: MachineState,
    /// Stage 3 state.
    pub stage3: MachineState,
}

/// Incremental statistics recorder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsRecorder {
    /// Cumulative counters.
    pub counters: Counters,
    queue1_series: Vec<WipSample>,
    queue2_series: Vec<WipSample>,
    queue3_series: Vec<WipSample>,
    accumulator_series: Vec<WipSample>,
    state_series: Vec<StateSample>,
    system_times: Vec<f64>,
}

impl StatsRecorder {
    /// Create a recorder with all series primed at time zero.
    #[must_use]
    pub fn new() -> Self {
        let zero = WipSample {
            time: 0.0,
            level: 0,
        };
        Self {
            counters: Counters::default(),
            queue1_series: vec![zero],
            queue2_series: vec![zero],
            queue3_series: vec![zero],
            accumulator_series: vec![zero],
            state_series: Vec::new(),
            system_times: Vec::new(),
        }
    }

    /// Record the system state after a state-changing event.
    #[allow(clippy::too_many_arguments)]
    pub fn sample(
        &mut self,
        now: f64,
        queue1: usize,
        queue2: usize,
        queue3: usize,
        accumulator: usize,
        states: [MachineState; 3],
    ) {
        self.queue1_series.push(WipSample {
            time: now,
            level: queue1,
        });
        self.queue2_series.push(WipSample {
            time: now,
            level: queue2,
        });
        self.queue3_series.push(WipSample {
            time: now,
            level: queue3,
        });
        self.accumulator_series.push(WipSample {
            time: now,
            level: accumulator,
        });
        self.state_series.push(StateSample {
            time: now,
            stage1: states[0],
            stage2: states[1],
            stage3: states[2],
        });
    }

    /// Record the total system time of a sealed batch.
    pub fn record_system_time(&mut self, elapsed: f64) {
        self.system_times.push(elapsed);
    }

    /// Build the final report for a run of length `horizon`.
    #[must_use]
    pub fn finalize(self, horizon: f64) -> RunReport {
        let throughput = if horizon > 0.0 {
            self.counters.sealed as f64 / horizon
        } else {
            0.0
        };
        let mean_system_time = if self.system_times.is_empty() {
            0.0
        } else {
            self.system_times.iter().sum::<f64>() / self.system_times.len() as f64
        };

        RunReport {
            avg_queue1_wip: time_weighted_average(&self.queue1_series, horizon),
            avg_queue2_wip: time_weighted_average(&self.queue2_series, horizon),
            avg_queue3_wip: time_weighted_average(&self.queue3_series, horizon),
            avg_accumulator_level: time_weighted_average(&self.accumulator_series, horizon),
            counters: self.counters,
            horizon,
            throughput,
            mean_system_time,
            system_times: self.system_times,
            queue1_series: self.queue1_series,
            queue2_series: self.queue2_series,
            queue3_series: self.queue3_series,
            accumulator_series: self.accumulator_series,
            state_series: self.state_series,
        }
    }
}

/// Time-weighted average occupancy: each sample contributes
/// `level * (t_next - t)`, with the final sample's level extended to
/// the horizon.
#[must_use]
pub fn time_weighted_average(series: &[WipSample], horizon: f64) -> f64 {
    if horizon <= 0.0 || series.is_empty() {
        return 0.0;
    }

    let mut area = 0.0;
    for pair in series.windows(2) {
        area += pair[0].level as f64 * (pair[1].time - pair[0].time);
    }
    if let Some(last) = series.last() {
        if horizon > last.time {
            area += last.level as f64 * (horizon - last.time);
        }
    }
    area / horizon
}

/// Structured result of one run, consumed by dashboards and tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Cumulative counters.
    pub counters: Counters,
    /// Configured horizon the averages are normalized by.
    pub horizon: f64,
    /// Sealed batches per unit time.
    pub throughput: f64,
    /// Mean system time across sealed batches.
    pub mean_system_time: f64,
    /// Time-weighted average occupancy of queue 1.
    pub avg_queue1_wip: f64,
    /// Time-weighted average occupancy of queue 2.
    pub avg_queue2_wip: f64,
    /// Time-weighted average occupancy of queue 3.
    pub avg_queue3_wip: f64,
    /// Time-weighted average accumulator fill.
    pub avg_accumulator_level: f64,
    /// Per-batch system times, in sealing order.
    pub system_times: Vec<f64>,
    /// Queue 1 occupancy series.
    pub queue1_series: Vec<WipSample>,
    /// Queue 2 occupancy series.
    pub queue2_series: Vec<WipSample>,
    /// Queue 3 occupancy series.
    pub queue3_series: Vec<WipSample>,
    /// Accumulator fill series.
    pub accumulator_series: Vec<WipSample>,
    /// Machine-state series.
    pub state_series: Vec<StateSample>,
}

impl RunReport {
    /// Observed defect rate at stage 1.
    #[must_use]
    pub fn defect_rate(&self) -> f64 {
        if self.counters.produced == 0 {
            0.0
        } else {
            self.counters.defective as f64 / self.counters.produced as f64
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample(time: f64, level: usize) -> WipSample {
        WipSample { time, level }
    }

    #[test]
    fn test_time_weighted_average_flat() {
        let series = vec![sample(0.0, 2)];
        // Level 2 held for the whole horizon
        assert!((time_weighted_average(&series, 10.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_time_weighted_average_step() {
        // Level 0 for [0,4), level 3 for [4,10)
        let series = vec![sample(0.0, 0), sample(4.0, 3)];
        let expected = (0.0 * 4.0 + 3.0 * 6.0) / 10.0;
        assert!((time_weighted_average(&series, 10.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_time_weighted_average_multiple_steps() {
        let series = vec![sample(0.0, 1), sample(2.0, 4), sample(5.0, 0)];
        // 1*2 + 4*3 + 0*5 over horizon 10
        assert!((time_weighted_average(&series, 10.0) - 1.4).abs() < 1e-12);
    }

    #[test]
    fn test_time_weighted_average_degenerate() {
        assert!((time_weighted_average(&[], 10.0)).abs() < 1e-12);
        assert!((time_weighted_average(&[sample(0.0, 5)], 0.0)).abs() < 1e-12);
    }

    #[test]
    fn test_recorder_counters_flow_into_report() {
        let mut rec = StatsRecorder::new();
        rec.counters.produced = 100;
        rec.counters.defective = 5;
        rec.counters.good = 95;
        rec.counters.sealed = 2;
        rec.record_system_time(60.0);
        rec.record_system_time(80.0);

        let report = rec.finalize(1000.0);
        assert_eq!(report.counters.produced, 100);
        assert!((report.throughput - 0.002).abs() < 1e-12);
        assert!((report.mean_system_time - 70.0).abs() < 1e-12);
        assert!((report.defect_rate() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_defect_rate_no_production() {
        let report = StatsRecorder::new().finalize(100.0);
        assert!((report.defect_rate()).abs() < 1e-12);
        assert!((report.mean_system_time).abs() < 1e-12);
        assert!((report.throughput).abs() < 1e-12);
    }

    #[test]
    fn test_sample_appends_all_series() {
        let mut rec = StatsRecorder::new();
        rec.sample(
            5.0,
            1,
            2,
            3,
            4,
            [
                MachineState::Processing,
                MachineState::Idle,
                MachineState::Starved,
            ],
        );

        let report = rec.finalize(10.0);
        assert_eq!(report.queue1_series.len(), 2);
        assert_eq!(report.queue2_series.last().unwrap().level, 2);
        assert_eq!(report.queue3_series.last().unwrap().level, 3);
        assert_eq!(report.accumulator_series.last().unwrap().level, 4);
        assert_eq!(report.state_series.len(), 1);
        assert_eq!(report.state_series[0].stage3, MachineState::Starved);
    }

    #[test]
    fn test_state_sample_comparisons() {
        let a = StateSample {
            time: 1.5,
            stage1: MachineState::Processing,
            stage2: MachineState::Idle,
            stage3: MachineState::Starved,
        };
        let b = a;
        assert_eq!(a, b);
        assert_ne!(
            a,
            StateSample {
                stage2: MachineState::Blocked,
                ..a
            }
        );
        // Whole series compare element-wise
        assert_eq!(vec![a, b], vec![a, b]);
    }

    #[test]
    fn test_report_serializes() {
        let report = StatsRecorder::new().finalize(100.0);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("throughput"));
        let restored: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.counters, report.counters);
    }
}
