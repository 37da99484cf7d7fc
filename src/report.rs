// LETSCHED REPORTING
// HUMAN-READABLE SUMMARY TABLE + RAW PER-CYCLE CSV.
// CSV LAYOUT: TWO ROWS PER WORKER, CHRONOLOGICAL, MILLISECONDS:
//   <label>:cpu,<v1>,<v2>,...
//   <label>:io,<v1>,<v2>,...
// A PATH ENDING IN .gz IS GZIP-COMPRESSED.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::sim::SimResult;
use crate::stats::{self, Aggregate};

pub fn aggregate_all(results: &[SimResult]) -> Vec<Aggregate> {
    results
        .iter()
        .map(|r| stats::aggregate(&r.config, &r.history))
        .collect()
}

pub fn write_summary<W: Write>(
    w: &mut W,
    results: &[SimResult],
    aggregates: &[Aggregate],
) -> io::Result<()> {
    writeln!(w, "\n{}", "=".repeat(96))?;
    writeln!(w, "LETSCHED SUMMARY (DIFF = NOMINAL - OBSERVED, MS)")?;
    writeln!(w, "{}", "=".repeat(96))?;
    writeln!(
        w,
        "{:<28} {:<10} {:>4} {:>8} {:>11} {:>11} {:>11} {:>11}",
        "WORKLOAD", "POLICY", "PRIO", "CYCLES", "CPU_MEAN", "CPU_SD", "IO_MEAN", "IO_SD"
    )?;
    writeln!(w, "{}", "-".repeat(96))?;

    for (r, agg) in results.iter().zip(aggregates) {
        let cfg = &r.config;
        match agg {
            Aggregate::Stats(s) => writeln!(
                w,
                "{:<28} {:<10} {:>4} {:>8} {:>11.3} {:>11.3} {:>11.3} {:>11.3}",
                cfg.label,
                cfg.policy.to_string(),
                cfg.priority,
                s.count,
                s.cpu.mean_ms,
                s.cpu.std_dev_ms,
                s.io.mean_ms,
                s.io.std_dev_ms
            )?,
            Aggregate::NoData => writeln!(
                w,
                "{:<28} {:<10} {:>4} {:>8} {:>47}",
                cfg.label,
                cfg.policy.to_string(),
                cfg.priority,
                0,
                "NO DATA"
            )?,
        }
    }

    let total: usize = aggregates.iter().map(|a| a.count()).sum();
    writeln!(w, "{}", "-".repeat(96))?;
    writeln!(w, "  WORKERS:      {}", results.len())?;
    writeln!(w, "  TOTAL CYCLES: {}", total)?;
    Ok(())
}

pub fn write_csv<W: Write>(w: &mut W, results: &[SimResult]) -> io::Result<()> {
    for r in results {
        write!(w, "{}:cpu", r.config.label)?;
        for s in r.history.iter() {
            write!(w, ",{:.3}", s.cpu_secs * 1_000.0)?;
        }
        writeln!(w)?;

        write!(w, "{}:io", r.config.label)?;
        for s in r.history.iter() {
            write!(w, ",{:.3}", s.io_secs * 1_000.0)?;
        }
        writeln!(w)?;
    }
    Ok(())
}

pub fn write_csv_file(path: &Path, results: &[SimResult]) -> io::Result<()> {
    let file = BufWriter::new(File::create(path)?);
    if path.extension().is_some_and(|ext| ext == "gz") {
        let mut enc = GzEncoder::new(file, Compression::default());
        write_csv(&mut enc, results)?;
        enc.finish()?.flush()
    } else {
        let mut file = file;
        write_csv(&mut file, results)?;
        file.flush()
    }
}
