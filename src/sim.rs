// LETSCHED SIMULATION ORCHESTRATOR
// FAN-OUT: ONE OS THREAD PER WORKLOAD. FAN-IN: BLOCKING JOIN, THEN HAND
// EVERY HISTORY BACK IN INPUT ORDER.
//
// STARTUP HANDSHAKE:
//   1. EACH WORKER BINDS ITS OWN POLICY/PRIORITY AND REPORTS THE RESULT
//      OVER A CHANNEL.
//   2. ONCE EVERY WORKER HAS REPORTED, THE ORCHESTRATOR EITHER ABORTS THE
//      WHOLE RUN (ANY BIND FAILED) OR STAMPS ONE ABSOLUTE DEADLINE AND
//      OPENS THE GATE FOR ALL WORKERS AT ONCE.
// NO WORKER BURNS CPU BEFORE EVERY BIND HAS SUCCEEDED, AND ALL WORKERS
// SHARE THE SAME DEADLINE REGARDLESS OF THREAD-CREATION SKEW.

use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::binder;
use crate::calibrate::CalibrationFactor;
use crate::clock::now_ns;
use crate::config::WorkloadConfig;
use crate::error::SimError;
use crate::worker::{self, BurstHistory, Workload};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Binding {
    // BIND EVERY WORKER TO ITS CONFIGURED REAL-TIME POLICY (FATAL ON FAILURE)
    #[default]
    RealTime,
    // KEEP THE INHERITED POLICY. RESULTS ARE NOT REAL-TIME MEASUREMENTS;
    // FOR UNPRIVILEGED DRY RUNS AND TESTS ONLY.
    Inherit,
}

#[derive(Clone, Debug)]
pub struct SimResult {
    pub config: WorkloadConfig,
    pub history: BurstHistory,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum GateState {
    Waiting,
    Go(u64),
    Abort,
}

struct StartGate {
    state: Mutex<GateState>,
    cond: Condvar,
}

impl StartGate {
    fn new() -> Self {
        Self {
            state: Mutex::new(GateState::Waiting),
            cond: Condvar::new(),
        }
    }

    fn open(&self, next: GateState) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *state = next;
        self.cond.notify_all();
    }

    // BLOCKS UNTIL OPENED. Some(deadline_ns) TO RUN, None TO ABORT.
    fn wait(&self) -> Option<u64> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        while *state == GateState::Waiting {
            state = self.cond.wait(state).unwrap_or_else(|e| e.into_inner());
        }
        match *state {
            GateState::Go(deadline) => Some(deadline),
            _ => None,
        }
    }
}

// OPENS THE GATE AS Abort IF THE ORCHESTRATOR UNWINDS BEFORE RELEASING,
// SO NO WORKER IS LEFT PARKED FOREVER
struct AbortOnDrop<'a> {
    gate: &'a StartGate,
    armed: bool,
}

impl Drop for AbortOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.gate.open(GateState::Abort);
        }
    }
}

pub fn run(
    configs: &[WorkloadConfig],
    duration: Duration,
    factor: CalibrationFactor,
) -> Result<Vec<SimResult>, SimError> {
    run_with(configs, duration, factor, Binding::RealTime)
}

pub fn run_with(
    configs: &[WorkloadConfig],
    duration: Duration,
    factor: CalibrationFactor,
    binding: Binding,
) -> Result<Vec<SimResult>, SimError> {
    if configs.is_empty() {
        return Ok(Vec::new());
    }

    let gate = Arc::new(StartGate::new());
    let mut guard = AbortOnDrop {
        gate: gate.as_ref(),
        armed: true,
    };
    let (tx, rx) = mpsc::channel::<(usize, Result<(), SimError>)>();

    let mut handles: Vec<JoinHandle<Option<BurstHistory>>> = Vec::with_capacity(configs.len());
    for (idx, config) in configs.iter().enumerate() {
        let tx = tx.clone();
        let gate = Arc::clone(&gate);
        let workload = Workload::new(config, factor);
        let (policy, priority) = (config.policy, config.priority);

        let spawned = thread::Builder::new()
            .name(format!("letsched-{idx}"))
            .spawn(move || {
                let bound = match binding {
                    Binding::RealTime => binder::bind_current(policy, priority),
                    Binding::Inherit => Ok(()),
                };
                let ok = bound.is_ok();
                let _ = tx.send((idx, bound));
                // DROP THE SENDER NOW: A PANICKED PEER THEN SHOWS UP AS A
                // DISCONNECT INSTEAD OF A HANG
                drop(tx);
                if !ok {
                    return None;
                }
                gate.wait().map(|deadline| worker::run_loop(&workload, deadline))
            });

        match spawned {
            Ok(h) => handles.push(h),
            Err(e) => {
                drop(guard);
                join_all(handles);
                return Err(SimError::Spawn {
                    label: config.label.clone(),
                    source: e,
                });
            }
        }
    }
    drop(tx);

    // COLLECT ONE BIND REPORT PER WORKER. KEEP THE LOWEST-INDEX FAILURE.
    let mut failure: Option<(usize, SimError)> = None;
    let mut reported = 0;
    while reported < handles.len() {
        match rx.recv() {
            Ok((_, Ok(()))) => reported += 1,
            Ok((idx, Err(e))) => {
                reported += 1;
                if failure.as_ref().map_or(true, |(f, _)| idx < *f) {
                    failure = Some((idx, e));
                }
            }
            Err(_) => break,
        }
    }

    if failure.is_some() || reported < handles.len() {
        drop(guard);
        let joined = join_all(handles);
        if let Some((_, e)) = failure {
            return Err(e);
        }
        return Err(panicked(configs, &joined));
    }

    // SHARED ABSOLUTE DEADLINE, STAMPED AFTER EVERY BIND SUCCEEDED
    let deadline = now_ns().saturating_add(duration.as_nanos().min(u64::MAX as u128) as u64);
    guard.armed = false;
    gate.open(GateState::Go(deadline));

    let joined = join_all(handles);
    if joined.iter().any(|j| !matches!(j, Some(Some(_)))) {
        return Err(panicked(configs, &joined));
    }
    Ok(configs
        .iter()
        .cloned()
        .zip(joined)
        .filter_map(|(config, j)| j.flatten().map(|history| SimResult { config, history }))
        .collect())
}

// None = THREAD PANICKED, Some(None) = ABORTED AT THE GATE
fn join_all(handles: Vec<JoinHandle<Option<BurstHistory>>>) -> Vec<Option<Option<BurstHistory>>> {
    handles.into_iter().map(|h| h.join().ok()).collect()
}

fn panicked(configs: &[WorkloadConfig], joined: &[Option<Option<BurstHistory>>]) -> SimError {
    let label = joined
        .iter()
        .position(|j| j.is_none())
        .and_then(|i| configs.get(i))
        .map(|c| c.label.clone())
        .unwrap_or_else(|| "<unknown>".to_string());
    SimError::WorkerPanicked { label }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Policy;

    fn cfg(label: &str, priority: i32, cpu: i64, io: i64) -> WorkloadConfig {
        WorkloadConfig::new(label, Policy::Fifo, priority, cpu, io).unwrap()
    }

    #[test]
    fn empty_config_list_is_noop() {
        let out = run(&[], Duration::from_secs(5), CalibrationFactor::new(1)).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn results_follow_input_order() {
        let configs = vec![cfg("a", 1, 0, 2), cfg("b", 1, 0, 3), cfg("c", 1, 0, 0)];
        let out = run_with(
            &configs,
            Duration::from_millis(30),
            CalibrationFactor::new(1),
            Binding::Inherit,
        )
        .unwrap();
        let labels: Vec<&str> = out.iter().map(|r| r.config.label.as_str()).collect();
        assert_eq!(labels, vec!["a", "b", "c"]);
        assert!(out.iter().all(|r| !r.history.is_empty()));
    }

    #[test]
    fn invalid_priority_aborts_whole_run() {
        // ONE BAD WORKER: NOBODY RUNS, FIRST FAILURE IS REPORTED
        let configs = vec![cfg("good", 1, 0, 1), cfg("bad", 0, 0, 1), cfg("worse", 200, 0, 1)];
        let err = run(&configs, Duration::from_secs(60), CalibrationFactor::new(1)).unwrap_err();
        match err {
            // PRIVILEGED: "good" BINDS, "bad" IS THE LOWEST-INDEX FAILURE
            SimError::InvalidPriority { priority, .. } => assert_eq!(priority, 0),
            // UNPRIVILEGED: "good" ITSELF IS REJECTED
            SimError::PermissionDenied { priority, .. } => assert_eq!(priority, 1),
            other => panic!("UNEXPECTED ERROR: {other}"),
        }
    }
}
