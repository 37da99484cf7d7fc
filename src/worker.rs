// LETSCHED BURST WORKER
// ONE THREAD, ONE WORKLOAD: CPU BURST, IO BURST, RECORD, REPEAT UNTIL THE
// SHARED DEADLINE. THE DEADLINE IS CHECKED AFTER EVERY CYCLE, SO A WORKER
// ALWAYS RECORDS AT LEAST ONE SAMPLE, EVEN WITH A DEADLINE IN THE PAST.
//
// NO CANCELLATION: A CPU BURST ALWAYS RUNS TO COMPLETION ONCE STARTED.

use std::time::Duration;

use crate::binder;
use crate::calibrate::CalibrationFactor;
use crate::clock::{self, now_ns};
use crate::config::WorkloadConfig;
use crate::error::SimError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BurstSample {
    pub cpu_secs: f64,
    pub io_secs: f64,
}

// CHRONOLOGICAL: OLDEST CYCLE FIRST
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BurstHistory {
    samples: Vec<BurstSample>,
}

impl BurstHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: BurstSample) {
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[BurstSample] {
        &self.samples
    }

    pub fn iter(&self) -> impl Iterator<Item = &BurstSample> {
        self.samples.iter()
    }
}

impl FromIterator<BurstSample> for BurstHistory {
    fn from_iter<I: IntoIterator<Item = BurstSample>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

// THE PER-CYCLE WORK, RESOLVED AGAINST THE CALIBRATION FACTOR
#[derive(Clone, Copy, Debug)]
pub struct Workload {
    pub cpu_iterations: u64,
    pub io: Duration,
}

impl Workload {
    pub fn new(config: &WorkloadConfig, factor: CalibrationFactor) -> Self {
        Self {
            cpu_iterations: factor.iterations_for(config.cpu_units),
            io: Duration::from_millis(config.io_millis),
        }
    }
}

// ONE CYCLE. ZERO-LENGTH PHASES ARE SKIPPED BUT STILL TIMED.
pub fn run_cycle(workload: &Workload) -> BurstSample {
    let t0 = now_ns();
    if workload.cpu_iterations > 0 {
        clock::reference_work(workload.cpu_iterations);
    }
    let t1 = now_ns();
    if !workload.io.is_zero() {
        // REAL SUSPENSION: THE THREAD LEAVES THE RUN QUEUE
        std::thread::sleep(workload.io);
    }
    let t2 = now_ns();

    BurstSample {
        cpu_secs: clock::ns_to_secs(t1.saturating_sub(t0)),
        io_secs: clock::ns_to_secs(t2.saturating_sub(t1)),
    }
}

// CYCLE UNTIL now >= deadline_ns (CLOCK_MONOTONIC). DOES NOT TOUCH THE
// SCHEDULING POLICY: THE CALLER BINDS FIRST.
pub fn run_loop(workload: &Workload, deadline_ns: u64) -> BurstHistory {
    let mut history = BurstHistory::new();
    loop {
        history.push(run_cycle(workload));
        if now_ns() >= deadline_ns {
            break;
        }
    }
    history
}

// BIND THE CALLING THREAD, THEN RUN. FOR SINGLE-WORKER USE; THE
// ORCHESTRATOR SPLITS THESE STEPS SO ALL BINDS FINISH BEFORE ANY BURST.
pub fn run_burst(
    config: &WorkloadConfig,
    factor: CalibrationFactor,
    deadline_ns: u64,
) -> Result<BurstHistory, SimError> {
    binder::bind_current(config.policy, config.priority)?;
    Ok(run_loop(&Workload::new(config, factor), deadline_ns))
}
