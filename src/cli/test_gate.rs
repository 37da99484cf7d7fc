// TEST GATE: UNPRIVILEGED SUITE FIRST, THEN THE REAL-TIME SUITE WHEN THIS
// PROCESS CAN ACTUALLY RUN IT. TALLIES COME FROM CARGO'S "test result:" LINES.

use std::process::Command;

use anyhow::{bail, Context, Result};

use super::TARGET_DIR;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Tally {
    passed: u32,
    failed: u32,
    ignored: u32,
}

impl Tally {
    fn add(&mut self, other: Tally) {
        self.passed += other.passed;
        self.failed += other.failed;
        self.ignored += other.ignored;
    }
}

// SUM EVERY "test result: ok. 12 passed; 0 failed; 3 ignored; ..." LINE
fn parse_tally(output: &str) -> Tally {
    let mut total = Tally::default();
    for line in output.lines() {
        let Some(rest) = line.trim().strip_prefix("test result:") else {
            continue;
        };
        let mut t = Tally::default();
        for field in rest.split(';') {
            let mut words = field.split_whitespace().rev();
            let (Some(kind), Some(n)) = (words.next(), words.next()) else {
                continue;
            };
            let Ok(n) = n.parse::<u32>() else { continue };
            match kind {
                "passed" => t.passed = n,
                "failed" => t.failed = n,
                "ignored" => t.ignored = n,
                _ => {}
            }
        }
        total.add(t);
    }
    total
}

fn cargo_test(extra: &[&str]) -> Result<(bool, Tally)> {
    let out = Command::new("cargo")
        .args(["test", "--release"])
        .args(extra)
        .env("CARGO_TARGET_DIR", TARGET_DIR)
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .output()
        .context("FAILED TO LAUNCH cargo test")?;

    let stdout = String::from_utf8_lossy(&out.stdout);
    if !out.status.success() {
        print!("{}", stdout);
        eprint!("{}", String::from_utf8_lossy(&out.stderr));
    }
    Ok((out.status.success(), parse_tally(&stdout)))
}

fn print_tally(stage: &str, t: Tally) {
    println!(
        "  {:<22}PASSED {:<5} FAILED {:<5} IGNORED {}",
        stage, t.passed, t.failed, t.ignored
    );
}

pub fn run_test_gate() -> Result<()> {
    println!("LETSCHED TEST GATE");
    println!("{}", "=".repeat(60));

    let (ok, unprivileged) = cargo_test(&[])?;
    print_tally("UNPRIVILEGED", unprivileged);
    if !ok {
        bail!("UNPRIVILEGED SUITE FAILED ({} FAILURES)", unprivileged.failed);
    }

    // THE REAL-TIME SUITE ASSERTS euid 0; CAP_SYS_NICE ALONE IS NOT ENOUGH
    if unsafe { libc::geteuid() } != 0 {
        println!("  {:<22}SKIPPED (NOT ROOT -- RERUN: sudo letsched test-gate)", "REAL-TIME");
        return Ok(());
    }

    let (ok, realtime) = cargo_test(&[
        "--test",
        "realtime",
        "--",
        "--ignored",
        "--test-threads=1",
    ])?;
    print_tally("REAL-TIME", realtime);
    if !ok || realtime.passed == 0 {
        bail!(
            "REAL-TIME SUITE FAILED ({} PASSED, {} FAILED)",
            realtime.passed,
            realtime.failed
        );
    }

    println!("ALL STAGES PASSED");
    Ok(())
}
