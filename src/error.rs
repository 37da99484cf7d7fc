// LETSCHED ERRORS
// EVERY VARIANT IS FATAL FOR THE RUN. EMPTY HISTORIES ARE NOT ERRORS:
// SEE stats::Aggregate::NoData.

use thiserror::Error;

use crate::policy::Policy;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("calibration failed: {0}")]
    Calibration(String),

    #[error(
        "permission denied setting {policy} priority {priority} \
         (real-time scheduling needs root or CAP_SYS_NICE; try sudo)"
    )]
    PermissionDenied { policy: Policy, priority: i32 },

    #[error("priority {priority} out of range for {policy} (valid: {min}..={max})")]
    InvalidPriority {
        policy: Policy,
        priority: i32,
        min: i32,
        max: i32,
    },

    #[error("failed to bind {policy} priority {priority}: os error {errno}")]
    Bind {
        policy: Policy,
        priority: i32,
        errno: i32,
    },

    #[error("workload {label}: {field} must be non-negative (got {value})")]
    NegativeWorkload {
        label: String,
        field: &'static str,
        value: i64,
    },

    #[error("malformed workload {input:?}: {reason}")]
    Parse { input: String, reason: String },

    #[error("unknown scheduling policy {name:?} (expected FIFO or RR)")]
    UnknownPolicy { name: String },

    #[error("failed to spawn worker thread for {label}")]
    Spawn {
        label: String,
        #[source]
        source: std::io::Error,
    },

    #[error("worker {label} panicked")]
    WorkerPanicked { label: String },
}

impl SimError {
    // TRUE FOR ERRORS THAT COME FROM THE SCHEDULER BINDER
    pub fn is_bind_failure(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied { .. } | Self::InvalidPriority { .. } | Self::Bind { .. }
        )
    }
}
