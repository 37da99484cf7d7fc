// LETSCHED AGGREGATOR
// PER WORKER: CYCLE COUNT AND MEAN / POPULATION STD-DEV OF
// (NOMINAL - OBSERVED) FOR EACH PHASE. MATH IN SECONDS, REPORTED IN MS.
//
// POSITIVE DIFF: BURST FINISHED EARLY. NEGATIVE DIFF: BURST OVERRAN
// (PREEMPTION, TIMER SLACK, WAKEUP LATENCY).

use crate::config::WorkloadConfig;
use crate::worker::BurstHistory;

const MS_PER_SEC: f64 = 1_000.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiffStats {
    pub mean_ms: f64,
    pub std_dev_ms: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AggregateStats {
    pub count: usize,
    pub cpu: DiffStats,
    pub io: DiffStats,
}

// NO SAMPLES MEANS NO STATISTIC. NEVER NaN.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Aggregate {
    NoData,
    Stats(AggregateStats),
}

impl Aggregate {
    pub fn count(&self) -> usize {
        match self {
            Self::NoData => 0,
            Self::Stats(s) => s.count,
        }
    }

    pub fn stats(&self) -> Option<&AggregateStats> {
        match self {
            Self::NoData => None,
            Self::Stats(s) => Some(s),
        }
    }
}

pub fn aggregate(config: &WorkloadConfig, history: &BurstHistory) -> Aggregate {
    if history.is_empty() {
        return Aggregate::NoData;
    }

    // CONFIGURED VALUES ARE MILLISECONDS (ONE CPU UNIT ~ 1MS AFTER CALIBRATION)
    let nominal_cpu = config.cpu_units as f64 / MS_PER_SEC;
    let nominal_io = config.io_millis as f64 / MS_PER_SEC;

    let cpu = diff_stats(history.samples().iter().map(|s| nominal_cpu - s.cpu_secs));
    let io = diff_stats(history.samples().iter().map(|s| nominal_io - s.io_secs));

    Aggregate::Stats(AggregateStats {
        count: history.len(),
        cpu,
        io,
    })
}

// TWO-PASS MEAN / POPULATION VARIANCE. CALLER GUARANTEES AT LEAST ONE VALUE.
fn diff_stats<I>(diffs: I) -> DiffStats
where
    I: Iterator<Item = f64> + Clone,
{
    let n = diffs.clone().count() as f64;
    let mean = diffs.clone().sum::<f64>() / n;
    let var = diffs.map(|d| (d - mean) * (d - mean)).sum::<f64>() / n;
    DiffStats {
        mean_ms: mean * MS_PER_SEC,
        std_dev_ms: var.sqrt() * MS_PER_SEC,
    }
}
