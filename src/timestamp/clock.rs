//! System clock access

use super::TimeSpec;
use std::time::{SystemTime, UNIX_EPOCH};

/// Read `CLOCK_REALTIME`
#[cfg(unix)]
pub fn realtime() -> TimeSpec {
    use nix::time::{clock_gettime, ClockId};

    match clock_gettime(ClockId::CLOCK_REALTIME) {
        Ok(ts) => TimeSpec::new(ts.tv_sec() as i64, ts.tv_nsec() as i64),
        Err(e) => {
            tracing::warn!("clock_gettime(CLOCK_REALTIME) failed: {}, using SystemTime", e);
            system_time()
        }
    }
}

/// Read the wall clock
#[cfg(not(unix))]
pub fn realtime() -> TimeSpec {
    system_time()
}

/// Wall clock through `SystemTime`, negative before the epoch
pub fn system_time() -> TimeSpec {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(since) => TimeSpec::from_duration(since),
        Err(e) => TimeSpec::ZERO - TimeSpec::from_duration(e.duration()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_realtime_agrees_with_system_time() {
        let a = system_time();
        let b = realtime();
        let c = system_time();
        // Both read the same wall clock, allow a generous window
        assert!(b.saturating_sub(a).as_millis() < 1000);
        assert!(c >= a);
        assert!(b.sec > 1_000_000_000);
    }
}
