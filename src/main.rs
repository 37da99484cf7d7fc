// LETSCHED -- REAL-TIME THREAD BURST SIMULATOR
// RUNS ONE THREAD PER WORKLOAD UNDER SCHED_FIFO / SCHED_RR, ALTERNATING
// CALIBRATED CPU BURSTS WITH SLEEP BURSTS, AND REPORTS HOW FAR THE HOST
// SCHEDULER DRIFTS FROM THE CONFIGURED DURATIONS.
//
// SCHEDULING IS DONE BY THE KERNEL. THIS PROGRAM ONLY CONFIGURES AND MEASURES.

mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use letsched::calibrate::DEFAULT_SAMPLES_PER_PROBE;
use letsched::policy::Policy;

#[derive(Parser)]
#[command(name = "letsched")]
#[command(about = "LETSCHED -- REAL-TIME SCHEDULING BURST SIMULATOR")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the simulation (REQUIRES ROOT OR CAP_SYS_NICE)
    Run {
        // WORKLOADS: <POLICY>/<priority>/<cpu>cpu/<io>io, E.G. FIFO/1/100cpu/1000io
        #[arg(required = true)]
        workloads: Vec<String>,

        // SIMULATION LENGTH IN WHOLE SECONDS
        #[arg(short, long, default_value_t = 10)]
        duration: u64,

        // WRITE RAW PER-CYCLE SAMPLES (.gz SUFFIX COMPRESSES)
        #[arg(long)]
        csv: Option<PathBuf>,

        // POLICY FOR UNRECOGNIZED NAMES. UNSET: UNKNOWN NAMES ARE AN ERROR.
        #[arg(long)]
        fallback_policy: Option<Policy>,

        // TIMINGS PER CALIBRATION PROBE (MEDIAN IS USED)
        #[arg(long, default_value_t = DEFAULT_SAMPLES_PER_PROBE)]
        calibration_samples: u32,

        // KEEP THE INHERITED POLICY INSTEAD OF BINDING (DRY RUN, NOT REAL-TIME)
        #[arg(long)]
        inherit_policy: bool,

        // PRINT VERBOSE OUTPUT
        #[arg(long)]
        verbose: bool,
    },

    /// Print the calibration factor for this host
    Calibrate {
        #[arg(long, default_value_t = DEFAULT_SAMPLES_PER_PROBE)]
        samples: u32,
    },

    /// Check whether this host can run real-time threads
    Check,

    /// Print sleep overshoot (us) per IO burst until Ctrl+C
    Probe {
        #[arg(long, default_value_t = 10)]
        interval_ms: u64,

        #[arg(long, requires = "priority")]
        policy: Option<Policy>,

        #[arg(long, requires = "policy")]
        priority: Option<i32>,
    },

    /// Run unit tests, then the root-only integration tests
    TestGate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            workloads,
            duration,
            csv,
            fallback_policy,
            calibration_samples,
            inherit_policy,
            verbose,
        } => cli::run::run_simulation(cli::run::RunArgs {
            workloads,
            duration_secs: duration,
            csv,
            fallback_policy,
            calibration_samples,
            inherit_policy,
            verbose,
        }),
        Command::Calibrate { samples } => cli::run::run_calibrate(samples),
        Command::Check => cli::check::run_check(),
        Command::Probe {
            interval_ms,
            policy,
            priority,
        } => cli::probe::run_probe(interval_ms, policy.zip(priority)),
        Command::TestGate => cli::test_gate::run_test_gate(),
    }
}
