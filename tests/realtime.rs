// LETSCHED REAL-TIME END-TO-END
// REQUIRES ROOT (OR CAP_SYS_NICE).
// RUN: sudo cargo test --test realtime --release -- --ignored --test-threads=1

use std::time::Duration;

use letsched::binder;
use letsched::calibrate::Calibrator;
use letsched::config::ConfigParser;
use letsched::policy::Policy;
use letsched::report;
use letsched::sim;
use letsched::stats::Aggregate;

#[test]
#[ignore]
fn fifo_cpu_and_io_workers_both_make_progress() {
    assert_eq!(unsafe { libc::geteuid() }, 0, "REAL-TIME TEST REQUIRES ROOT");

    let configs = ConfigParser::new()
        .parse_all(&["FIFO/10/100cpu/0io", "FIFO/5/0cpu/100io"])
        .unwrap();
    let factor = Calibrator::with_samples(3).calibrate().unwrap();
    println!("CALIBRATION: {} ITERATIONS/MS", factor.get());

    let results = sim::run(&configs, Duration::from_secs(1), factor).unwrap();
    assert_eq!(results.len(), 2);

    let aggs = report::aggregate_all(&results);
    report::write_summary(&mut std::io::stdout(), &results, &aggs).unwrap();

    for (r, agg) in results.iter().zip(&aggs) {
        assert!(!r.history.is_empty(), "{} PRODUCED NO SAMPLES", r.config.label);
        assert!(matches!(agg, Aggregate::Stats(_)));
    }
    // THE CPU WORKER MUST NOT BE STARVED BY THE IO WORKER
    assert!(results[0].history.iter().any(|s| s.cpu_secs > 0.0));
}

#[test]
#[ignore]
fn bound_worker_reports_requested_policy() {
    assert_eq!(unsafe { libc::geteuid() }, 0, "REAL-TIME TEST REQUIRES ROOT");

    let seen = std::thread::spawn(|| {
        binder::bind_current(Policy::RoundRobin, 7).unwrap();
        binder::current()
    })
    .join()
    .unwrap();
    assert_eq!(seen, Some((Policy::RoundRobin, 7)));
}
