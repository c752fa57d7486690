//! Scenario tests for the production line end to end.

#![allow(clippy::unwrap_used)]

use lineasim::prelude::*;

fn benchmark_config() -> LineConfig {
    LineConfig::builder()
        .horizon(1000.0)
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
        .build()
}

#[test]
fn probar_escenario_base() {
    let mut engine = LineEngine::new(benchmark_config()).unwrap();
    let report = engine.run().unwrap();

    // Roughly one arrival per time unit over the horizon
    assert!(report.counters.produced > 500, "too little production");
    assert!(report.counters.good > 0);
    assert!(report.counters.packed > 0, "no batch was packed");
    assert!(report.counters.sealed > 0, "no batch was sealed");
    assert_eq!(
        report.counters.produced,
        report.counters.good + report.counters.defective
    );

    // Observed defect rate tracks the configured probability
    let rate = report.defect_rate();
    assert!(
        (rate - 0.05).abs() < 0.03,
        "defect rate {rate} far from 0.05"
    );

    // Every good unit is accounted for somewhere in the line
    assert!(engine.conservation_holds());

    // Sealed can never exceed packed, and packing consumes whole batches
    assert!(report.counters.sealed <= report.counters.packed);
    assert!(report.counters.good >= 50 * report.counters.packed);
}

#[test]
fn probar_cola1_capacidad_cero() {
    // With no buffer ahead of stage 1, every arrival that finds the
    // machine busy is lost outright
    let config = LineConfig::builder()
        .horizon(500.0)
        .queue1_capacity(0)
        .queue2_capacity(5)
        .queue3_capacity(5)
        .batch_size(10)
        .mean_interarrival(1.0)
        .stage1(StageParams::new(2.0, 0.2))
        .stage2(StageParams::new(1.0, 0.1))
        .stage3(StageParams::new(1.0, 0.1))
        .defect_prob(0.0)
        .seed(42)
        .build();

    let mut engine = LineEngine::new(config).unwrap();
    let report = engine.run().unwrap();

    assert!(report.counters.lost > 0, "service slower than arrivals must lose units");
    assert_eq!(engine.queue1_depth(), 0);
    assert!((report.avg_queue1_wip).abs() < 1e-12);
    assert!(report.counters.produced > 0);
}

#[test]
fn probar_inanicion_entrada_lenta() {
    // Arrivals far slower than service: stage 1 spends most of the run
    // starved and nothing is ever lost
    let config = LineConfig::builder()
        .horizon(1000.0)
        .queue1_capacity(10)
        .queue2_capacity(5)
        .queue3_capacity(5)
        .batch_size(5)
        .mean_interarrival(10.0)
        .stage1(StageParams::new(0.5, 0.05))
        .stage2(StageParams::new(1.0, 0.1))
        .stage3(StageParams::new(1.0, 0.1))
        .defect_prob(0.0)
        .seed(42)
        .build();

    let mut engine = LineEngine::new(config).unwrap();
    let report = engine.run().unwrap();

    assert_eq!(report.counters.lost, 0);
    assert!(report
        .state_series
        .iter()
        .any(|s| s.stage1 == MachineState::Starved));
    // The input queue stays essentially empty
    assert!(report.avg_queue1_wip < 0.5);
}

#[test]
fn probar_contrapresion_extrema() {
    // Stage 2 is the bottleneck and its queue holds a single batch:
    // blocking must cascade all the way back to stage 1 and fill queue 1
    let config = LineConfig::builder()
        .horizon(500.0)
        .queue1_capacity(10)
        .queue2_capacity(1)
        .queue3_capacity(1)
        .batch_size(1)
        .mean_interarrival(0.5)
        .stage1(StageParams::new(0.5, 0.05))
        .stage2(StageParams::new(50.0, 2.0))
        .stage3(StageParams::new(1.0, 0.1))
        .defect_prob(0.0)
        .seed(42)
        .build();

    let mut engine = LineEngine::new(config).unwrap();
    let report = engine.run().unwrap();

    assert!(report
        .state_series
        .iter()
        .any(|s| s.stage1 == MachineState::Blocked));
    // Queue 1 saturates while stage 1 is blocked
    assert!(
        report.avg_queue1_wip > 8.0,
        "avg queue1 occupancy {} should be near capacity",
        report.avg_queue1_wip
    );
    assert!(report.counters.lost > 0);
    assert!(engine.conservation_holds());
}

#[test]
fn probar_bloqueo_etapa_dos() {
    // Stage 3 much slower than stage 2: stage 2 must end up blocked
    // holding a finished batch, and resume once stage 3 drains
    let config = LineConfig::builder()
        .horizon(1000.0)
        .queue1_capacity(50)
        .queue2_capacity(5)
        .queue3_capacity(1)
        .batch_size(2)
        .mean_interarrival(0.5)
        .stage1(StageParams::new(0.3, 0.03))
        .stage2(StageParams::new(1.0, 0.1))
        .stage3(StageParams::new(30.0, 2.0))
        .defect_prob(0.0)
        .seed(42)
        .build();

    let mut engine = LineEngine::new(config).unwrap();
    let report = engine.run().unwrap();

    assert!(report
        .state_series
        .iter()
        .any(|s| s.stage2 == MachineState::Blocked));
    assert!(report.counters.sealed > 0, "stage 3 must keep sealing");
    assert!(engine.conservation_holds());
}

#[test]
fn probar_tiempos_de_sistema_positivos() {
    let mut engine = LineEngine::new(benchmark_config()).unwrap();
    let report = engine.run().unwrap();

    assert_eq!(report.system_times.len() as u64, report.counters.sealed);
    for &t in &report.system_times {
        assert!(t > 0.0, "system time must be positive");
        assert!(t <= report.horizon);
    }
}

#[test]
fn probar_config_desde_yaml() {
    let yaml = r"
horizon: 300.0
queue1_capacity: 10
queue2_capacity: 5
queue3_capacity: 5
batch_size: 10
mean_interarrival: 1.0
stage1: { mean: 1.0, std_dev: 0.1 }
stage2: { mean: 8.0, std_dev: 1.0 }
stage3: { mean: 4.0, std_dev: 0.5 }
defect_prob: 0.05
seed: 42
";
    let config = LineConfig::from_yaml(yaml).unwrap();
    let mut engine = LineEngine::new(config).unwrap();
    let report = engine.run().unwrap();
    assert!(report.counters.sealed > 0);
}
