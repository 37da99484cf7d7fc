// LETSCHED CLOCK + REFERENCE WORKLOAD
// CLOCK_MONOTONIC ONLY. WALL-CLOCK ADJUSTMENTS (NTP, settimeofday) MUST NOT
// LEAK INTO BURST MEASUREMENTS.

use std::hint::black_box;

pub const NS_PER_MS: u64 = 1_000_000;
pub const NS_PER_SEC: u64 = 1_000_000_000;

pub fn now_ns() -> u64 {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    unsafe {
        libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts);
    }
    (ts.tv_sec as u64) * NS_PER_SEC + (ts.tv_nsec as u64)
}

pub fn ns_to_secs(ns: u64) -> f64 {
    ns as f64 / NS_PER_SEC as f64
}

// CPU-BOUND REFERENCE COMPUTATION: SUM OF SQUARE ROOTS OVER 0..iterations.
// COST GROWS MONOTONICALLY WITH iterations. black_box KEEPS THE OPTIMIZER
// FROM FOLDING THE LOOP AWAY.
pub fn reference_work(iterations: u64) -> f64 {
    let mut acc = 0.0f64;
    for i in 0..black_box(iterations) {
        acc += (i as f64).sqrt();
    }
    black_box(acc)
}

// NANOSECONDS SPENT IN ONE reference_work(iterations) CALL
pub fn time_reference(iterations: u64) -> u64 {
    let t0 = now_ns();
    reference_work(iterations);
    now_ns().saturating_sub(t0)
}
