//! Progress reporter implementation
//!
//! Uses indicatif to draw a message counter on stderr, leaving stdout free
//! for the stamp stream and the CSV lines.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Progress reporter for a send or receive session
pub struct ProgressReporter {
    /// Message counter bar
    bar: ProgressBar,
    /// Start time
    start_time: Instant,
    /// Messages handled so far
    messages: AtomicU64,
    /// Bytes handled so far
    bytes: AtomicU64,
    /// Is progress enabled
    enabled: AtomicBool,
}

impl ProgressReporter {
    /// Create a reporter; `total` is `None` when the message count is unknown
    pub fn new(total: Option<u64>, prefix: &str) -> Self {
        let bar = match total {
            Some(total) => {
                let bar = ProgressBar::new(total);
                if let Ok(style) = ProgressStyle::default_bar()
                    .template("{prefix:.bold.dim} [{bar:40.cyan/blue}] {pos}/{len} msgs ({per_sec}, ETA {eta})")
                {
                    bar.set_style(style.progress_chars("=> "));
                }
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                if let Ok(style) =
                    ProgressStyle::default_spinner().template("{spinner:.cyan} {prefix:.bold.dim} {pos} msgs ({per_sec})")
                {
                    bar.set_style(style);
                }
                bar.enable_steady_tick(Duration::from_millis(100));
                bar
            }
        };
        bar.set_draw_target(ProgressDrawTarget::stderr());
        bar.set_prefix(prefix.to_string());

        Self {
            bar,
            start_time: Instant::now(),
            messages: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
            enabled: AtomicBool::new(true),
        }
    }

    /// Create a disabled progress reporter (for quiet mode)
    pub fn disabled() -> Self {
        let reporter = Self::new(Some(0), "");
        reporter.enabled.store(false, Ordering::SeqCst);
        reporter.bar.set_draw_target(ProgressDrawTarget::hidden());
        reporter
    }

    /// Count one message of `bytes` bytes
    pub fn increment(&self, bytes: u64) {
        self.messages.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
        self.bar.inc(1);
    }

    /// Get elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Messages counted so far
    pub fn messages(&self) -> u64 {
        self.messages.load(Ordering::Relaxed)
    }

    /// Bytes counted so far
    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    /// Get current throughput in messages/second
    pub fn rate(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.messages() as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Finish progress with success message
    pub fn finish_success(&self, message: &str) {
        self.bar.finish_with_message(format!("✓ {}", message));
    }

    /// Finish progress with error message
    pub fn finish_error(&self, message: &str) {
        self.bar.abandon_with_message(format!("✗ {}", message));
    }

    /// Check if progress is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_reporter_counts() {
        let reporter = ProgressReporter::disabled();
        assert!(!reporter.is_enabled());

        reporter.increment(25);
        reporter.increment(537);

        assert_eq!(reporter.messages(), 2);
        assert_eq!(reporter.bytes(), 562);
        reporter.finish_success("done");
    }

    #[test]
    fn test_spinner_for_unknown_total() {
        let reporter = ProgressReporter::new(None, "recv");
        assert!(reporter.is_enabled());
        reporter.increment(9);
        reporter.finish_error("aborted");
        assert_eq!(reporter.messages(), 1);
    }

    #[test]
    fn test_rate_follows_messages() {
        let reporter = ProgressReporter::disabled();
        assert_eq!(reporter.rate(), 0.0);

        std::thread::sleep(Duration::from_millis(20));
        for _ in 0..10 {
            reporter.increment(25);
        }
        let rate = reporter.rate();
        assert!(rate > 0.0);
        // At least 20ms have passed
        assert!(rate <= 500.0);
    }
}
