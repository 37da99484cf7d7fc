// LETSCHED WORKER + ORCHESTRATOR TESTS
// TIMING-SENSITIVE BUT UNPRIVILEGED: WORKERS RUN UNDER THE INHERITED POLICY.
// REAL-TIME BINDING IS COVERED BY tests/realtime.rs (ROOT ONLY).

use std::time::Duration;

use letsched::calibrate::{CalibrationFactor, Calibrator};
use letsched::clock::{now_ns, NS_PER_MS, NS_PER_SEC};
use letsched::config::{ConfigParser, WorkloadConfig};
use letsched::policy::Policy;
use letsched::sim::{self, Binding};
use letsched::stats::{aggregate, Aggregate};
use letsched::worker::{run_loop, Workload};

// SCHEDULING JITTER ALLOWANCE PER IO BURST
const IO_TOLERANCE_SECS: f64 = 0.020;

fn config(label: &str, cpu: i64, io: i64) -> WorkloadConfig {
    WorkloadConfig::new(label, Policy::Fifo, 1, cpu, io).unwrap()
}

// === DEADLINE SEMANTICS ===

#[test]
fn zero_workload_zero_deadline_records_exactly_one_cycle() {
    // THE DEADLINE IS CHECKED AFTER EACH CYCLE, NEVER BEFORE THE FIRST
    let w = Workload::new(&config("idle", 0, 0), CalibrationFactor::new(1));
    let history = run_loop(&w, now_ns());
    assert_eq!(history.len(), 1);
}

#[test]
fn io_50ms_for_one_second() {
    let w = Workload::new(&config("io", 0, 50), CalibrationFactor::new(1));
    let history = run_loop(&w, now_ns() + NS_PER_SEC);

    let count = history.len();
    assert!((18..=22).contains(&count), "EXPECTED ~20 CYCLES, GOT {count}");
    for s in history.iter() {
        assert!(
            (s.io_secs - 0.050).abs() <= IO_TOLERANCE_SECS,
            "IO BURST {:.4}s OUTSIDE TOLERANCE",
            s.io_secs
        );
    }

    match aggregate(&config("io", 0, 50), &history) {
        Aggregate::Stats(stats) => {
            assert_eq!(stats.count, count);
            // SLEEP NEVER RETURNS EARLY: MEAN DIFF IS <= 0 (OVERRUN)
            assert!(stats.io.mean_ms <= 0.0);
            assert!(stats.io.mean_ms > -IO_TOLERANCE_SECS * 1e3);
        }
        Aggregate::NoData => panic!("NO DATA"),
    }
}

// === CALIBRATED CPU BURSTS ===

#[test]
fn calibrated_cpu_burst_is_near_nominal() {
    let factor = Calibrator::with_samples(3).calibrate().unwrap();
    let w = Workload::new(&config("cpu", 20, 0), factor);
    let history = run_loop(&w, now_ns());
    let cpu = history.samples()[0].cpu_secs;
    // LOOSE: CALIBRATION IS SINGLE-HOST, SINGLE-RUN, AND UNBOUND
    assert!(cpu > 0.002, "20 UNITS RAN IN {cpu}s");
    assert!(cpu < 2.0, "20 UNITS RAN IN {cpu}s");
}

// === ORCHESTRATOR ===

#[test]
fn shared_deadline_gives_comparable_run_lengths() {
    let configs = ConfigParser::new()
        .parse_all(&["FIFO/1/0cpu/10io", "RR/1/0cpu/20io", "FIFO/2/0cpu/1io"])
        .unwrap();
    let start = now_ns();
    let results = sim::run_with(
        &configs,
        Duration::from_millis(300),
        CalibrationFactor::new(1),
        Binding::Inherit,
    )
    .unwrap();
    let elapsed = now_ns() - start;

    assert_eq!(results.len(), 3);
    assert!(elapsed >= 300 * NS_PER_MS);
    assert!(elapsed < 1_000 * NS_PER_MS, "RUN TOOK {elapsed} ns");

    let io10 = results[0].history.len();
    let io20 = results[1].history.len();
    assert!(io10 > io20, "10MS WORKER {io10} CYCLES VS 20MS WORKER {io20}");
    assert!(results[2].history.len() > io10);

    for r in &results {
        assert!(matches!(aggregate(&r.config, &r.history), Aggregate::Stats(_)));
    }
}

#[test]
fn empty_run_produces_no_aggregates() {
    let results = sim::run(&[], Duration::from_secs(1), CalibrationFactor::new(1)).unwrap();
    assert!(results.is_empty());
}
