// LETSCHED WORKLOAD CONFIG
// ONE WorkloadConfig PER SIMULATED THREAD, PARSED FROM <POLICY>/<prio>/<cpu>cpu/<io>io
// (E.G. FIFO/1/100cpu/1000io). IMMUTABLE ONCE BUILT.

use regex::Regex;

use crate::error::SimError;
use crate::policy::Policy;

const WORKLOAD_PATTERN: &str = r"^([A-Z]+)/([0-9]+)/([0-9]+)cpu/([0-9]+)io$";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkloadConfig {
    pub policy: Policy,
    // VALIDATED AGAINST THE OS RANGE AT BIND TIME, NOT HERE
    pub priority: i32,
    // ABSTRACT CPU UNITS PER CYCLE (1 UNIT ~ 1MS AFTER CALIBRATION)
    pub cpu_units: u64,
    pub io_millis: u64,
    // ORIGINAL TEXT. IDENTIFICATION ONLY, NEVER AFFECTS THE SIMULATION.
    pub label: String,
}

impl WorkloadConfig {
    // SIGNED INPUTS SO CALLERS THAT BYPASS THE PARSER STILL GET REJECTED
    pub fn new(
        label: impl Into<String>,
        policy: Policy,
        priority: i32,
        cpu_units: i64,
        io_millis: i64,
    ) -> Result<Self, SimError> {
        let label = label.into();
        let cpu_units = non_negative(&label, "cpu units", cpu_units)?;
        let io_millis = non_negative(&label, "io millis", io_millis)?;
        Ok(Self {
            policy,
            priority,
            cpu_units,
            io_millis,
            label,
        })
    }

    pub fn is_idle(&self) -> bool {
        self.cpu_units == 0 && self.io_millis == 0
    }
}

fn non_negative(label: &str, field: &'static str, value: i64) -> Result<u64, SimError> {
    u64::try_from(value).map_err(|_| SimError::NegativeWorkload {
        label: label.to_string(),
        field,
        value,
    })
}

// COMPILES THE PATTERN ONCE. BUILD ONE PER PROCESS AND REUSE IT.
pub struct ConfigParser {
    re: Regex,
    fallback: Option<Policy>,
}

impl ConfigParser {
    // STRICT: UNKNOWN POLICY NAMES ARE AN ERROR
    pub fn new() -> Self {
        Self::with_fallback(None)
    }

    // Some(p): UNKNOWN POLICY NAMES RUN UNDER p INSTEAD OF FAILING
    pub fn with_fallback(fallback: Option<Policy>) -> Self {
        Self {
            re: Regex::new(WORKLOAD_PATTERN).expect("static workload pattern"),
            fallback,
        }
    }

    pub fn parse(&self, input: &str) -> Result<WorkloadConfig, SimError> {
        let caps = self.re.captures(input).ok_or_else(|| SimError::Parse {
            input: input.to_string(),
            reason: "expected <POLICY>/<priority>/<n>cpu/<n>io".to_string(),
        })?;

        let name = &caps[1];
        let policy = match (Policy::from_name(name), self.fallback) {
            (Some(p), _) => p,
            (None, Some(p)) => p,
            (None, None) => {
                return Err(SimError::UnknownPolicy {
                    name: name.to_string(),
                })
            }
        };

        let priority: i32 = parse_field(input, "priority", &caps[2])?;
        let cpu: i64 = parse_field(input, "cpu", &caps[3])?;
        let io: i64 = parse_field(input, "io", &caps[4])?;

        WorkloadConfig::new(input, policy, priority, cpu, io)
    }

    pub fn parse_all<S: AsRef<str>>(&self, inputs: &[S]) -> Result<Vec<WorkloadConfig>, SimError> {
        inputs.iter().map(|s| self.parse(s.as_ref())).collect()
    }

    pub fn uses_fallback(&self, input: &str) -> bool {
        self.re
            .captures(input)
            .map(|c| Policy::from_name(&c[1]).is_none())
            .unwrap_or(false)
    }
}

impl Default for ConfigParser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_field<T: std::str::FromStr>(input: &str, field: &str, raw: &str) -> Result<T, SimError> {
    raw.parse().map_err(|_| SimError::Parse {
        input: input.to_string(),
        reason: format!("{field} value {raw} out of range"),
    })
}
