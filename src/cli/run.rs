// RUN + CALIBRATE SUBCOMMANDS
// PARSE -> CALIBRATE -> SIMULATE -> AGGREGATE -> REPORT.
// ANY FATAL SimError BUBBLES UP TO main AND EXITS NON-ZERO.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use letsched::binder;
use letsched::calibrate::Calibrator;
use letsched::clock::now_ns;
use letsched::config::ConfigParser;
use letsched::policy::Policy;
use letsched::report;
use letsched::sim::{self, Binding};

pub struct RunArgs {
    pub workloads: Vec<String>,
    pub duration_secs: u64,
    pub csv: Option<PathBuf>,
    pub fallback_policy: Option<Policy>,
    pub calibration_samples: u32,
    pub inherit_policy: bool,
    pub verbose: bool,
}

pub fn run_simulation(args: RunArgs) -> Result<()> {
    println!("LETSCHED");

    // PARSE EVERYTHING BEFORE ANY THREAD EXISTS
    let parser = ConfigParser::with_fallback(args.fallback_policy);
    let configs = parser.parse_all(args.workloads.as_slice())?;

    for cfg in &configs {
        let (min, max) = binder::priority_range(cfg.policy);
        println!(
            "WORKLOAD:        {:<28} {} PRIO {} (RANGE {}..={})  CPU {} UNITS  IO {} MS",
            cfg.label, cfg.policy, cfg.priority, min, max, cfg.cpu_units, cfg.io_millis
        );
        if parser.uses_fallback(&cfg.label) {
            println!("  UNKNOWN POLICY NAME -- RUNNING UNDER FALLBACK {}", cfg.policy);
        }
        if cfg.is_idle() {
            println!("  0cpu/0io -- CYCLES AS FAST AS THE DEADLINE CHECK ALLOWS");
        }
    }
    println!("DURATION:        {} s", args.duration_secs);
    if args.inherit_policy {
        println!("BINDING:         INHERITED (NOT REAL-TIME -- DRY RUN ONLY)");
    }
    println!();

    let calibrator = Calibrator::with_samples(args.calibration_samples);
    let t0 = now_ns();
    let factor = calibrator.calibrate()?;
    println!("CALIBRATION:     {} ITERATIONS/MS", factor.get());
    if args.verbose {
        println!(
            "  SEARCH:        1..{} BELOW {} NS, {} SAMPLE(S)/PROBE, {:.1} MS",
            calibrator.upper_bound,
            calibrator.threshold_ns,
            calibrator.samples_per_probe,
            now_ns().saturating_sub(t0) as f64 / 1e6
        );
    }

    let binding = if args.inherit_policy {
        Binding::Inherit
    } else {
        Binding::RealTime
    };

    println!("LETSCHED IS RUNNING ({} WORKER{})", configs.len(),
             if configs.len() == 1 { "" } else { "S" });
    let results = sim::run_with(
        &configs,
        Duration::from_secs(args.duration_secs),
        factor,
        binding,
    )
    .inspect_err(|e| {
        if e.is_bind_failure() {
            eprintln!("ABORTED: A WORKER COULD NOT BE BOUND -- NO WORKER RAN A SINGLE BURST");
        }
    })?;

    let aggregates = report::aggregate_all(&results);

    if args.verbose {
        for r in &results {
            let (min_cpu, max_cpu) = r.history.iter().fold((f64::MAX, 0.0f64), |(lo, hi), s| {
                (lo.min(s.cpu_secs), hi.max(s.cpu_secs))
            });
            if !r.history.is_empty() {
                println!(
                    "  {:<28} CYCLES={} CPU_MIN={:.3}MS CPU_MAX={:.3}MS",
                    r.config.label,
                    r.history.len(),
                    min_cpu * 1e3,
                    max_cpu * 1e3
                );
            }
        }
    }

    report::write_summary(&mut std::io::stdout().lock(), &results, &aggregates)?;

    if let Some(path) = &args.csv {
        report::write_csv_file(path, &results)
            .with_context(|| format!("FAILED TO WRITE {}", path.display()))?;
        println!("\nSAVED TO {}", path.display());
    }

    println!("LETSCHED OUT.");
    Ok(())
}

pub fn run_calibrate(samples: u32) -> Result<()> {
    let calibrator = Calibrator::with_samples(samples);
    let factor = calibrator.calibrate()?;
    println!("CALIBRATION:     {} ITERATIONS/MS", factor.get());
    println!(
        "  (THRESHOLD {} NS, {} SAMPLE(S) PER PROBE)",
        calibrator.threshold_ns, calibrator.samples_per_probe
    );
    Ok(())
}
