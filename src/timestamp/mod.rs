//! Timestamp model shared by the sender and the receiver
//!
//! Both roles operate on the same caller-owned [`TimeSpec`]:
//!
//! - [`TimeStampMode::Send`] stamps the value with the current wall clock
//!   right before a message leaves.
//! - [`TimeStampMode::Receive`] turns a received send stamp into the time
//!   elapsed since it was taken (the one-way transit time).
//!
//! ```
//! use tstamp::timestamp::{timestamp_manipulate, TimeSpec, TimeStampMode};
//!
//! let mut ts = TimeSpec::ZERO;
//! timestamp_manipulate(&mut ts, TimeStampMode::Send);
//! let sent = ts;
//!
//! let transit = *timestamp_manipulate(&mut ts, TimeStampMode::Receive);
//! assert!(sent.sec > 0);
//! assert!(!transit.is_negative());
//! ```

mod clock;
mod timespec;

pub use clock::{realtime, system_time};
pub use timespec::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Environment variable naming the receiver's detailed report file
pub const ENV_TIMESTAMP_OUTPUT: &str = "TIMESTAMP_OUTPUT";

/// Role of the process calling [`timestamp_manipulate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeStampMode {
    /// Receiver side
    Receive,
    /// Sender side
    Send,
}

impl TimeStampMode {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Receive => "receive",
            Self::Send => "send",
        }
    }
}

impl fmt::Display for TimeStampMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Update `ts` in place according to `mode` and hand it back
///
/// In `Send` mode `ts` is overwritten with the current time. In `Receive`
/// mode `ts` must hold a send stamp and is replaced with the time elapsed
/// since then; a stamp from the future (sender clock ahead) yields zero.
pub fn timestamp_manipulate(ts: &mut TimeSpec, mode: TimeStampMode) -> &mut TimeSpec {
    let now = TimeSpec::now();
    match mode {
        TimeStampMode::Send => *ts = now,
        TimeStampMode::Receive => {
            if *ts > now {
                tracing::trace!("send stamp {} is ahead of local clock {}", ts, now);
            }
            *ts = now.saturating_sub(*ts);
        }
    }
    ts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_stamps_current_time() {
        let before = TimeSpec::now();
        let mut ts = TimeSpec::new(1, 1);
        let stamped = *timestamp_manipulate(&mut ts, TimeStampMode::Send);
        let after = TimeSpec::now();

        assert_eq!(stamped, ts);
        assert!(before <= stamped && stamped <= after);
    }

    #[test]
    fn test_receive_yields_elapsed_time() {
        let mut ts = TimeSpec::now() - TimeSpec::new(0, 50_000_000);
        timestamp_manipulate(&mut ts, TimeStampMode::Receive);

        assert!(ts.as_millis() >= 50);
        assert!(ts.as_millis() < 60_000);
    }

    #[test]
    fn test_receive_future_stamp_clamps_to_zero() {
        let mut ts = TimeSpec::now() + TimeSpec::new(3600, 0);
        timestamp_manipulate(&mut ts, TimeStampMode::Receive);
        assert_eq!(ts, TimeSpec::ZERO);
    }

    #[test]
    fn test_returns_same_value_for_chaining() {
        let mut ts = TimeSpec::ZERO;
        let sec = timestamp_manipulate(&mut ts, TimeStampMode::Send).sec;
        assert_eq!(sec, ts.sec);
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(TimeStampMode::Send.to_string(), "send");
        assert_eq!(TimeStampMode::Receive.name(), "receive");
        assert_eq!(ENV_TIMESTAMP_OUTPUT, "TIMESTAMP_OUTPUT");
    }
}
