//! Seconds/nanoseconds time value
//!
//! `TimeSpec` mirrors the POSIX `timespec` layout while keeping the
//! nanosecond field normalized into `0..NANOS_PER_SEC` after every
//! constructor and arithmetic operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};
use std::time::Duration;

/// Nanoseconds in one second
pub const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Nanoseconds in one millisecond
pub const NANOS_PER_MILLI: i64 = 1_000_000;

/// A point in time (or a span) as seconds plus nanoseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSpec {
    /// Whole seconds, may be negative
    pub sec: i64,
    /// Nanoseconds, always in `0..NANOS_PER_SEC`
    pub nsec: i64,
}

impl TimeSpec {
    /// The zero value (epoch, or an empty span)
    pub const ZERO: TimeSpec = TimeSpec { sec: 0, nsec: 0 };

    /// Create a normalized value; out-of-range nanoseconds carry into seconds
    pub fn new(sec: i64, nsec: i64) -> Self {
        Self {
            sec: sec.saturating_add(nsec.div_euclid(NANOS_PER_SEC)),
            nsec: nsec.rem_euclid(NANOS_PER_SEC),
        }
    }

    /// Current wall-clock time
    pub fn now() -> Self {
        super::clock::realtime()
    }

    /// Convert a non-negative `Duration`
    pub fn from_duration(d: Duration) -> Self {
        let sec = i64::try_from(d.as_secs()).unwrap_or(i64::MAX);
        Self::new(sec, i64::from(d.subsec_nanos()))
    }

    /// Convert to a `Duration`, `None` when the value is negative
    pub fn as_duration(&self) -> Option<Duration> {
        if self.sec < 0 {
            return None;
        }
        Some(Duration::new(self.sec as u64, self.nsec as u32))
    }

    /// Total nanoseconds
    pub fn as_nanos(&self) -> i128 {
        i128::from(self.sec) * i128::from(NANOS_PER_SEC) + i128::from(self.nsec)
    }

    /// Total milliseconds, rounded toward negative infinity
    pub fn as_millis(&self) -> i64 {
        let millis = self.as_nanos().div_euclid(i128::from(NANOS_PER_MILLI));
        millis.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }

    /// Milliseconds as a float, for statistics
    pub fn as_millis_f64(&self) -> f64 {
        self.sec as f64 * 1e3 + self.nsec as f64 / 1e6
    }

    /// Whether the value lies before the epoch (or is a negative span)
    pub fn is_negative(&self) -> bool {
        self.sec < 0
    }

    /// `self - other`, `None` on overflow
    pub fn checked_sub(self, other: TimeSpec) -> Option<TimeSpec> {
        let sec = self.sec.checked_sub(other.sec)?;
        let nsec = self.nsec - other.nsec;
        let carry = nsec.div_euclid(NANOS_PER_SEC);
        Some(TimeSpec {
            sec: sec.checked_add(carry)?,
            nsec: nsec.rem_euclid(NANOS_PER_SEC),
        })
    }

    /// `self + other`, `None` on overflow
    pub fn checked_add(self, other: TimeSpec) -> Option<TimeSpec> {
        let sec = self.sec.checked_add(other.sec)?;
        let nsec = self.nsec + other.nsec;
        let carry = nsec.div_euclid(NANOS_PER_SEC);
        Some(TimeSpec {
            sec: sec.checked_add(carry)?,
            nsec: nsec.rem_euclid(NANOS_PER_SEC),
        })
    }

    /// `self - other` clamped to zero
    pub fn saturating_sub(self, other: TimeSpec) -> TimeSpec {
        match self.checked_sub(other) {
            Some(span) if !span.is_negative() => span,
            Some(_) => TimeSpec::ZERO,
            None if self.sec < other.sec => TimeSpec::ZERO,
            None => TimeSpec {
                sec: i64::MAX,
                nsec: NANOS_PER_SEC - 1,
            },
        }
    }

    /// Interpret as a UTC wall-clock instant
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.sec, self.nsec as u32)
    }
}

impl Add for TimeSpec {
    type Output = TimeSpec;

    fn add(self, rhs: TimeSpec) -> TimeSpec {
        self.checked_add(rhs).expect("overflow when adding TimeSpec values")
    }
}

impl Sub for TimeSpec {
    type Output = TimeSpec;

    fn sub(self, rhs: TimeSpec) -> TimeSpec {
        self.checked_sub(rhs).expect("overflow when subtracting TimeSpec values")
    }
}

impl PartialOrd for TimeSpec {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeSpec {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sec.cmp(&other.sec).then(self.nsec.cmp(&other.nsec))
    }
}

impl From<Duration> for TimeSpec {
    fn from(d: Duration) -> Self {
        Self::from_duration(d)
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sec < 0 && self.nsec > 0 {
            // -1.25s is stored as { sec: -2, nsec: 750_000_000 }
            write!(f, "-{}.{:09}", -(self.sec + 1), NANOS_PER_SEC - self.nsec)
        } else {
            write!(f, "{}.{:09}", self.sec, self.nsec)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_normalizes() {
        assert_eq!(TimeSpec::new(1, 1_500_000_000), TimeSpec { sec: 2, nsec: 500_000_000 });
        assert_eq!(TimeSpec::new(1, -1), TimeSpec { sec: 0, nsec: 999_999_999 });
        assert_eq!(TimeSpec::new(0, -1_000_000_000), TimeSpec { sec: -1, nsec: 0 });
    }

    #[test]
    fn test_millis() {
        assert_eq!(TimeSpec::new(2, 345_678_901).as_millis(), 2345);
        assert_eq!(TimeSpec::new(-1, 500_000_000).as_millis(), -500);
        assert_eq!(TimeSpec::ZERO.as_millis(), 0);
    }

    #[test]
    fn test_saturating_sub_clamps() {
        let early = TimeSpec::new(10, 0);
        let late = TimeSpec::new(10, 250);
        assert_eq!(late.saturating_sub(early), TimeSpec::new(0, 250));
        assert_eq!(early.saturating_sub(late), TimeSpec::ZERO);
    }

    #[test]
    fn test_duration_conversion() {
        let ts = TimeSpec::from(Duration::from_millis(1500));
        assert_eq!(ts, TimeSpec::new(1, 500_000_000));
        assert_eq!(ts.as_duration(), Some(Duration::from_millis(1500)));
        assert_eq!(TimeSpec::new(-1, 0).as_duration(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(TimeSpec::new(3, 42).to_string(), "3.000000042");
        assert_eq!(TimeSpec::new(0, -250_000_000).to_string(), "-0.250000000");
    }

    #[test]
    fn test_to_datetime() {
        let dt = TimeSpec::new(0, 0).to_datetime().unwrap();
        assert_eq!(dt.to_rfc3339(), "1970-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_ordering() {
        assert!(TimeSpec::new(1, 999_999_999) < TimeSpec::new(2, 0));
        assert!(TimeSpec::new(-1, 5) < TimeSpec::ZERO);
    }

    proptest! {
        #[test]
        fn prop_normalized_after_arithmetic(
            a_sec in -1_000_000i64..1_000_000,
            a_nsec in -5_000_000_000i64..5_000_000_000,
            b_sec in -1_000_000i64..1_000_000,
            b_nsec in -5_000_000_000i64..5_000_000_000,
        ) {
            let a = TimeSpec::new(a_sec, a_nsec);
            let b = TimeSpec::new(b_sec, b_nsec);
            for v in [a, b, a + b, a - b, a.saturating_sub(b)] {
                prop_assert!((0..NANOS_PER_SEC).contains(&v.nsec));
            }
            prop_assert_eq!((a - b).as_nanos(), a.as_nanos() - b.as_nanos());
            prop_assert!(!a.saturating_sub(b).is_negative());
        }
    }
}
