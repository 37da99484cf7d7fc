use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Result;

use letsched::binder;
use letsched::policy::Policy;
use letsched::worker::{self, Workload};

static RUNNING: AtomicBool = AtomicBool::new(true);

// ONE IO BURST PER LINE: HOW MANY MICROSECONDS THE SLEEP OVERSHOT.
// SAME CODE PATH AS A WORKER'S IO PHASE, SO THE NUMBERS ARE COMPARABLE.
pub fn run_probe(interval_ms: u64, rt: Option<(Policy, i32)>) -> Result<()> {
    ctrlc::set_handler(move || {
        RUNNING.store(false, Ordering::Relaxed);
    })?;

    if let Some((policy, priority)) = rt {
        binder::bind_current(policy, priority)?;
        eprintln!("PROBE BOUND TO {} PRIORITY {}", policy, priority);
    }

    let workload = Workload {
        cpu_iterations: 0,
        io: Duration::from_millis(interval_ms),
    };
    let target_us = interval_ms as f64 * 1_000.0;

    while RUNNING.load(Ordering::Relaxed) {
        let sample = worker::run_cycle(&workload);
        let overshoot_us = (sample.io_secs * 1e6 - target_us).max(0.0);
        println!("{:.0}", overshoot_us);
    }

    Ok(())
}
