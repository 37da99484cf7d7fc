// LETSCHED POLICY TYPES
// PURE-RUST MODULE: NAME MAPPING ONLY. THE OS CALLS LIVE IN binder.rs.
//
// ONLY THE TWO POSIX REAL-TIME CLASSES ARE SUPPORTED. A NON-RT POLICY WOULD
// SILENTLY INVALIDATE THE MEASUREMENTS, SO THERE IS NO SCHED_OTHER VARIANT.

use std::fmt;
use std::str::FromStr;

use crate::error::SimError;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Policy {
    Fifo,
    RoundRobin,
}

impl Policy {
    // EXACT WORKLOAD-STRING NAMES: "FIFO", "RR"
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "FIFO" => Some(Self::Fifo),
            "RR" => Some(Self::RoundRobin),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Fifo => "FIFO",
            Self::RoundRobin => "RR",
        }
    }

    pub fn as_raw(self) -> libc::c_int {
        match self {
            Self::Fifo => libc::SCHED_FIFO,
            Self::RoundRobin => libc::SCHED_RR,
        }
    }

    pub fn from_raw(raw: libc::c_int) -> Option<Self> {
        match raw {
            libc::SCHED_FIFO => Some(Self::Fifo),
            libc::SCHED_RR => Some(Self::RoundRobin),
            _ => None,
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fifo => write!(f, "SCHED_FIFO"),
            Self::RoundRobin => write!(f, "SCHED_RR"),
        }
    }
}

// CASE-INSENSITIVE, FOR COMMAND-LINE FLAGS (--fallback-policy rr)
impl FromStr for Policy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(&s.to_ascii_uppercase()).ok_or_else(|| SimError::UnknownPolicy {
            name: s.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_map_to_policies() {
        assert_eq!(Policy::from_name("FIFO"), Some(Policy::Fifo));
        assert_eq!(Policy::from_name("RR"), Some(Policy::RoundRobin));
        assert_eq!(Policy::from_name("fifo"), None); // WORKLOAD NAMES ARE UPPERCASE
        assert_eq!(Policy::from_name("OTHER"), None);
    }

    #[test]
    fn raw_round_trip() {
        for p in [Policy::Fifo, Policy::RoundRobin] {
            assert_eq!(Policy::from_raw(p.as_raw()), Some(p));
        }
        assert_eq!(Policy::from_raw(libc::SCHED_OTHER), None);
    }

    #[test]
    fn flag_parse_is_case_insensitive() {
        assert_eq!("rr".parse::<Policy>().unwrap(), Policy::RoundRobin);
        assert_eq!("Fifo".parse::<Policy>().unwrap(), Policy::Fifo);
        assert!(matches!(
            "deadline".parse::<Policy>(),
            Err(SimError::UnknownPolicy { .. })
        ));
    }
}
