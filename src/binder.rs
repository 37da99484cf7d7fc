// LETSCHED SCHEDULER BINDER
// ATTACHES A REAL-TIME POLICY + PRIORITY TO ONE THREAD VIA
// pthread_setschedparam. NO FALLBACK TO SCHED_OTHER: A PARTIALLY
// REAL-TIME RUN PRODUCES MEANINGLESS COMPARISONS, SO EVERY FAILURE IS
// RETURNED TO THE CALLER AS A FATAL SimError.

use crate::error::SimError;
use crate::policy::Policy;

// OS-DEFINED PRIORITY RANGE FOR A POLICY (LINUX: 1..=99 FOR FIFO AND RR)
pub fn priority_range(policy: Policy) -> (i32, i32) {
    unsafe {
        (
            libc::sched_get_priority_min(policy.as_raw()),
            libc::sched_get_priority_max(policy.as_raw()),
        )
    }
}

pub fn bind(thread: libc::pthread_t, policy: Policy, priority: i32) -> Result<(), SimError> {
    let (min, max) = priority_range(policy);
    if priority < min || priority > max {
        return Err(SimError::InvalidPriority {
            policy,
            priority,
            min,
            max,
        });
    }

    let param = libc::sched_param {
        sched_priority: priority,
    };
    // pthread_* RETURNS THE ERROR NUMBER DIRECTLY, errno IS NOT SET
    let rc = unsafe { libc::pthread_setschedparam(thread, policy.as_raw(), &param) };
    match rc {
        0 => Ok(()),
        libc::EPERM => Err(SimError::PermissionDenied { policy, priority }),
        libc::EINVAL => Err(SimError::InvalidPriority {
            policy,
            priority,
            min,
            max,
        }),
        errno => Err(SimError::Bind {
            policy,
            priority,
            errno,
        }),
    }
}

// BIND THE CALLING THREAD. WORKERS CALL THIS BEFORE THEIR FIRST BURST.
pub fn bind_current(policy: Policy, priority: i32) -> Result<(), SimError> {
    bind(unsafe { libc::pthread_self() }, policy, priority)
}

// POLICY + PRIORITY THE CALLING THREAD IS RUNNING UNDER.
// None FOR NON-REAL-TIME CLASSES (SCHED_OTHER, SCHED_BATCH, ...).
pub fn current() -> Option<(Policy, i32)> {
    let mut raw_policy: libc::c_int = 0;
    let mut param = libc::sched_param { sched_priority: 0 };
    let rc = unsafe { libc::pthread_getschedparam(libc::pthread_self(), &mut raw_policy, &mut param) };
    if rc != 0 {
        return None;
    }
    Policy::from_raw(raw_policy).map(|p| (p, param.sched_priority))
}
