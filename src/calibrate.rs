// LETSCHED CALIBRATOR
// BINARY SEARCH FOR THE LARGEST ITERATION COUNT OF THE REFERENCE WORKLOAD
// THAT STILL FINISHES UNDER 1MS ON THIS HOST. RUN ONCE, BEFORE ANY WORKER.
//
// THE RESULT IS THE CONVERSION FROM ONE ABSTRACT CPU UNIT TO A CONCRETE
// ITERATION COUNT. WORKERS ONLY EVER READ IT.

use crate::clock::{self, NS_PER_MS};
use crate::error::SimError;

pub const DEFAULT_THRESHOLD_NS: u64 = NS_PER_MS;
pub const DEFAULT_UPPER_BOUND: u64 = 1_000_000;
pub const DEFAULT_SAMPLES_PER_PROBE: u32 = 1;

// ITERATIONS OF THE REFERENCE WORKLOAD WORTH ~1MS ON THIS HOST
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalibrationFactor(u64);

impl CalibrationFactor {
    pub fn new(iterations_per_ms: u64) -> Self {
        Self(iterations_per_ms)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    // ITERATIONS FOR A CPU BURST OF `units` (SATURATES RATHER THAN WRAPS)
    pub fn iterations_for(self, units: u64) -> u64 {
        units.saturating_mul(self.0)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Calibrator {
    pub threshold_ns: u64,
    pub upper_bound: u64,
    // MEDIAN OF N TIMINGS PER PROBE. 1 = SINGLE-SAMPLE SEARCH.
    pub samples_per_probe: u32,
}

impl Default for Calibrator {
    fn default() -> Self {
        Self {
            threshold_ns: DEFAULT_THRESHOLD_NS,
            upper_bound: DEFAULT_UPPER_BOUND,
            samples_per_probe: DEFAULT_SAMPLES_PER_PROBE,
        }
    }
}

impl Calibrator {
    pub fn with_samples(samples_per_probe: u32) -> Self {
        Self {
            samples_per_probe,
            ..Self::default()
        }
    }

    // CALIBRATE AGAINST THE REAL REFERENCE WORKLOAD AND MONOTONIC CLOCK
    pub fn calibrate(&self) -> Result<CalibrationFactor, SimError> {
        self.calibrate_with(clock::time_reference)
    }

    // CALIBRATE AGAINST AN ARBITRARY COST MODEL. `measure(n)` RETURNS THE
    // NANOSECONDS n ITERATIONS TOOK. THE MODEL MUST BE NON-DECREASING IN n.
    //
    // INVARIANT: measure(low) < threshold AT EVERY STEP. WHEN THE UPPER
    // BOUND ITSELF IS STILL BELOW THE THRESHOLD THE RESULT IS upper_bound - 1.
    pub fn calibrate_with<F>(&self, mut measure: F) -> Result<CalibrationFactor, SimError>
    where
        F: FnMut(u64) -> u64,
    {
        if self.upper_bound < 2 {
            return Err(SimError::Calibration(format!(
                "upper bound {} leaves nothing to search",
                self.upper_bound
            )));
        }
        if self.samples_per_probe == 0 {
            return Err(SimError::Calibration(
                "samples per probe must be at least 1".to_string(),
            ));
        }

        let mut low = 1u64;
        let mut high = self.upper_bound;

        let floor = self.probe(&mut measure, low);
        if floor >= self.threshold_ns {
            return Err(SimError::Calibration(format!(
                "a single iteration took {} ns (threshold {} ns)",
                floor, self.threshold_ns
            )));
        }

        while high - low > 1 {
            let mid = low + (high - low) / 2;
            if self.probe(&mut measure, mid) < self.threshold_ns {
                low = mid;
            } else {
                high = mid;
            }
        }

        Ok(CalibrationFactor(low))
    }

    fn probe<F>(&self, measure: &mut F, n: u64) -> u64
    where
        F: FnMut(u64) -> u64,
    {
        if self.samples_per_probe == 1 {
            return measure(n);
        }
        let mut samples: Vec<u64> = (0..self.samples_per_probe).map(|_| measure(n)).collect();
        samples.sort_unstable();
        samples[samples.len() / 2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 37NS PER ITERATION: LARGEST n WITH 37n < 1_000_000 IS 27027
    fn linear_host(n: u64) -> u64 {
        n * 37
    }

    #[test]
    fn finds_largest_count_under_threshold() {
        let cal = Calibrator::default();
        let factor = cal.calibrate_with(linear_host).unwrap();
        assert_eq!(factor.get(), 27_027);
        assert!(linear_host(factor.get()) < DEFAULT_THRESHOLD_NS);
        assert!(linear_host(factor.get() + 1) >= DEFAULT_THRESHOLD_NS);
    }

    #[test]
    fn fixed_overhead_model() {
        // 200US STARTUP COST + 2NS PER ITERATION
        let host = |n: u64| 200_000 + 2 * n;
        let factor = Calibrator::default().calibrate_with(host).unwrap();
        assert!(host(factor.get()) < DEFAULT_THRESHOLD_NS);
        assert!(host(factor.get() + 1) >= DEFAULT_THRESHOLD_NS);
    }

    #[test]
    fn upper_bound_too_small_returns_bound_minus_one() {
        let cal = Calibrator {
            upper_bound: 1_000,
            ..Calibrator::default()
        };
        // EVERY COUNT IS FAST: SEARCH RUNS INTO THE CEILING
        let factor = cal.calibrate_with(|n| n).unwrap();
        assert_eq!(factor.get(), 999);
    }

    #[test]
    fn impossibly_slow_host_fails() {
        let err = Calibrator::default().calibrate_with(|_| 5_000_000).unwrap_err();
        assert!(matches!(err, SimError::Calibration(_)));
    }

    #[test]
    fn zero_samples_rejected() {
        let cal = Calibrator::with_samples(0);
        assert!(cal.calibrate_with(linear_host).is_err());
    }

    #[test]
    fn median_filters_outliers() {
        // EVERY THIRD TIMING IS A 10MS PREEMPTION SPIKE. A SINGLE-SAMPLE
        // SEARCH WOULD BE PULLED LOW; THE MEDIAN OF 3 IGNORES THE SPIKE.
        let mut calls = 0u64;
        let noisy = |n: u64| {
            calls += 1;
            if calls % 3 == 0 {
                10_000_000
            } else {
                linear_host(n)
            }
        };
        let factor = Calibrator::with_samples(3).calibrate_with(noisy).unwrap();
        assert_eq!(factor.get(), 27_027);
    }

    #[test]
    fn iterations_scale_and_saturate() {
        let f = CalibrationFactor::new(1_000);
        assert_eq!(f.iterations_for(0), 0);
        assert_eq!(f.iterations_for(100), 100_000);
        assert_eq!(CalibrationFactor::new(u64::MAX).iterations_for(2), u64::MAX);
    }

    #[test]
    fn real_host_calibrates() {
        let factor = Calibrator::default().calibrate().unwrap();
        assert!(factor.get() >= 1);
        assert!(factor.get() < DEFAULT_UPPER_BOUND);
    }
}
