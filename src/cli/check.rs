use std::io::Read;

use anyhow::Result;

use letsched::binder;
use letsched::policy::Policy;

const RT_RUNTIME_PATH: &str = "/proc/sys/kernel/sched_rt_runtime_us";
const RT_PERIOD_PATH: &str = "/proc/sys/kernel/sched_rt_period_us";

fn check_privilege() -> bool {
    let euid = unsafe { libc::geteuid() };
    let mut lim = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    let rtprio = if unsafe { libc::getrlimit(libc::RLIMIT_RTPRIO, &mut lim) } == 0 {
        lim.rlim_cur
    } else {
        0
    };

    if euid == 0 {
        println!("  {:<24}OK (root)", "privilege");
        true
    } else if rtprio > 0 {
        println!("  {:<24}OK (RLIMIT_RTPRIO={})", "privilege", rtprio);
        true
    } else {
        println!("  {:<24}NOT ROOT, RLIMIT_RTPRIO=0", "privilege");
        false
    }
}

// TRY A REAL BIND ON A THROWAWAY THREAD
fn check_bind() -> bool {
    let outcome = std::thread::spawn(|| binder::bind_current(Policy::Fifo, 1)).join();
    match outcome {
        Ok(Ok(())) => {
            println!("  {:<24}OK", "SCHED_FIFO bind");
            true
        }
        Ok(Err(e)) => {
            println!("  {:<24}FAILED ({})", "SCHED_FIFO bind", e);
            false
        }
        Err(_) => {
            println!("  {:<24}PANICKED", "SCHED_FIFO bind");
            false
        }
    }
}

fn check_rt_throttling() -> bool {
    let runtime = std::fs::read_to_string(RT_RUNTIME_PATH).unwrap_or_default();
    let period = std::fs::read_to_string(RT_PERIOD_PATH).unwrap_or_default();
    let runtime = runtime.trim();
    let period = period.trim();

    match runtime.parse::<i64>() {
        Ok(-1) => {
            println!("  {:<24}DISABLED (RT THREADS MAY STARVE THE HOST)", "rt throttling");
            true
        }
        Ok(0) => {
            println!("  {:<24}RUNTIME=0 -- RT THREADS CANNOT RUN", "rt throttling");
            false
        }
        Ok(us) => {
            println!("  {:<24}{} / {} us", "rt throttling", us, period);
            true
        }
        Err(_) => {
            println!("  {:<24}UNREADABLE (SKIPPED)", "rt throttling");
            true
        }
    }
}

const KERNEL_CONFIG_PATH: &str = "/proc/config.gz";

// DECOMPRESSED KERNEL CONFIG, OR WHY IT COULD NOT BE READ
fn read_kernel_config() -> Result<String, String> {
    let gz = std::fs::File::open(KERNEL_CONFIG_PATH)
        .map_err(|e| format!("{KERNEL_CONFIG_PATH} unavailable: {e}"))?;
    let mut text = String::new();
    flate2::read::GzDecoder::new(gz)
        .read_to_string(&mut text)
        .map_err(|e| format!("{KERNEL_CONFIG_PATH} corrupt: {e}"))?;
    Ok(text)
}

#[derive(Debug, PartialEq, Eq)]
struct RtKernel {
    preempt_rt: bool,
    rt_group_sched: bool,
}

fn rt_kernel_flags(config: &str) -> RtKernel {
    let enabled = |key: &str| config.lines().any(|l| l.trim() == format!("{key}=y"));
    RtKernel {
        preempt_rt: enabled("CONFIG_PREEMPT_RT"),
        rt_group_sched: enabled("CONFIG_RT_GROUP_SCHED"),
    }
}

// INFORMATIONAL ONLY: NEITHER FLAG BLOCKS A RUN
fn check_kernel_config() -> bool {
    let flags = match read_kernel_config() {
        Ok(text) => rt_kernel_flags(&text),
        Err(why) => {
            println!("  {:<24}UNKNOWN ({})", "kernel rt support", why);
            return true;
        }
    };

    if flags.preempt_rt {
        println!("  {:<24}PREEMPT_RT", "kernel rt support");
    } else {
        println!("  {:<24}STOCK PREEMPTION -- EXPECT HIGHER BURST JITTER", "kernel rt support");
    }
    // WITH RT GROUP SCHEDULING A NON-ROOT CGROUP HAS ZERO RT BUDGET BY DEFAULT
    if flags.rt_group_sched {
        println!("  {:<24}ON -- CHECK cpu.rt_runtime_us OF YOUR CGROUP", "rt group scheduling");
    }
    true
}

pub fn run_check() -> Result<()> {
    println!("LETSCHED REAL-TIME CHECK");
    println!();

    let mut ok = true;
    for policy in [Policy::Fifo, Policy::RoundRobin] {
        let (min, max) = binder::priority_range(policy);
        println!("  {:<24}{}..={}", format!("{} priority", policy), min, max);
    }
    ok &= check_privilege();
    ok &= check_bind();
    ok &= check_rt_throttling();
    println!();

    println!("KERNEL CONFIG:");
    ok &= check_kernel_config();
    println!();

    if ok {
        println!("ALL CHECKS PASSED");
    } else {
        println!("SOME CHECKS FAILED");
        println!("  Run as root, grant CAP_SYS_NICE, or raise rtprio in /etc/security/limits.conf");
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rt_flags_need_exact_enabled_lines() {
        let config = "\
CONFIG_PREEMPT=y
CONFIG_PREEMPT_RT=y
# CONFIG_RT_GROUP_SCHED is not set
";
        assert_eq!(
            rt_kernel_flags(config),
            RtKernel {
                preempt_rt: true,
                rt_group_sched: false
            }
        );
    }

    #[test]
    fn stock_kernel_with_group_sched() {
        let config = "CONFIG_PREEMPT_VOLUNTARY=y\nCONFIG_RT_GROUP_SCHED=y\n";
        assert_eq!(
            rt_kernel_flags(config),
            RtKernel {
                preempt_rt: false,
                rt_group_sched: true
            }
        );
    }
}
