//! Sending side of a session
//!
//! Emits the preamble, `count` stamp frames stamped immediately before
//! they are encoded, and a closing finish frame. Every frame is flushed on
//! its own so the receiver sees it as soon as possible.

use crate::config::SessionConfig;
use crate::error::{Result, TimestampError};
use crate::protocol::{write_preamble, Frame, PROTOCOL_MAGIC};
use crate::progress::ProgressReporter;
use crate::timestamp::{timestamp_manipulate, TimeSpec, TimeStampMode};
use std::io::{ErrorKind, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Outcome of a send session
#[derive(Debug, Clone)]
pub struct SendStats {
    /// Stamp frames written
    pub frames: u64,
    /// Bytes written, preamble and finish frame included
    pub bytes: u64,
    /// Stamp of the first frame
    pub first_sent: Option<TimeSpec>,
    /// Stamp of the last frame
    pub last_sent: Option<TimeSpec>,
    /// Time spent sending
    pub duration: Duration,
    /// False when the peer hung up or the session was cancelled
    pub completed: bool,
}

impl SendStats {
    /// Frames per second
    pub fn rate(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }

    /// Render a short human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "Sent {} messages ({}) in {} ({:.1} msg/s){}",
            self.frames,
            humansize::format_size(self.bytes, humansize::BINARY),
            humantime::format_duration(Duration::from_micros(self.duration.as_micros() as u64)),
            self.rate(),
            if self.completed { "" } else { ", incomplete" }
        )
    }
}

/// Timestamp sender
pub struct Sender {
    /// Configuration
    config: SessionConfig,
    /// Progress reporter
    progress: Option<ProgressReporter>,
    /// Cancellation flag
    cancelled: Arc<AtomicBool>,
}

impl Sender {
    /// Create a new sender
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            progress: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Set progress reporter
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Get cancellation flag for external control; setting it ends the
    /// session early, the finish frame is still sent
    pub fn cancellation_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Cancel the session on SIGINT or SIGTERM
    ///
    /// The signals are blocked on the calling thread and collected by a
    /// watcher thread, so call this before spawning other threads. A second
    /// signal exits immediately.
    #[cfg(unix)]
    pub fn cancel_on_signal(&self) -> Result<()> {
        use nix::sys::signal::{SigSet, Signal};

        let mut signals = SigSet::empty();
        signals.add(Signal::SIGINT);
        signals.add(Signal::SIGTERM);
        signals
            .thread_block()
            .map_err(|e| TimestampError::config(format!("cannot block signals: {}", e)))?;

        let flag = self.cancellation_flag();
        thread::spawn(move || {
            while let Ok(signal) = signals.wait() {
                if flag.swap(true, Ordering::SeqCst) {
                    std::process::exit(130);
                }
                tracing::info!("Received {}, finishing the session", signal.as_str());
            }
        });
        Ok(())
    }

    /// Cancel the session on interrupt (no-op off unix)
    #[cfg(not(unix))]
    pub fn cancel_on_signal(&self) -> Result<()> {
        Ok(())
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Open the configured endpoint and send
    pub fn execute(&self) -> Result<SendStats> {
        tracing::info!(
            "Sending {} messages with {} padding bytes via {}",
            self.config.send_count(),
            self.config.pad_size,
            self.config.endpoint
        );
        let mut writer = self.config.endpoint.open_writer()?;
        self.run(&mut writer)
    }

    /// Send a full session into `writer`
    pub fn run<W: Write + ?Sized>(&self, writer: &mut W) -> Result<SendStats> {
        let start = Instant::now();
        let count = self.config.send_count();
        let mut stats = SendStats {
            frames: 0,
            bytes: 0,
            first_sent: None,
            last_sent: None,
            duration: Duration::ZERO,
            completed: true,
        };

        let outcome = self.send_frames(writer, count, &mut stats);
        stats.duration = start.elapsed();

        match outcome {
            Ok(()) => {}
            Err(TimestampError::Stream(e)) if e.kind() == ErrorKind::BrokenPipe => {
                // A receiver with `-c` exits as soon as it has every stamp
                if stats.frames == count {
                    tracing::debug!("Receiver closed the stream before the finish frame");
                } else {
                    tracing::warn!("Receiver closed the stream after {} messages", stats.frames);
                    stats.completed = false;
                }
            }
            Err(e) => {
                if let Some(progress) = &self.progress {
                    progress.finish_error(&e.to_string());
                }
                return Err(e);
            }
        }

        if let Some(progress) = &self.progress {
            progress.finish_success(&stats.summary());
        }
        tracing::debug!("{}", stats.summary());

        Ok(stats)
    }

    fn send_frames<W: Write + ?Sized>(
        &self,
        writer: &mut W,
        count: u64,
        stats: &mut SendStats,
    ) -> Result<()> {
        write_preamble(writer)?;
        stats.bytes += PROTOCOL_MAGIC.len() as u64;

        for seq in 0..count {
            if self.is_cancelled() {
                tracing::info!("Send cancelled after {} messages", stats.frames);
                stats.completed = false;
                break;
            }

            let mut sent = TimeSpec::ZERO;
            timestamp_manipulate(&mut sent, TimeStampMode::Send);

            let frame = Frame::Stamp {
                seq,
                sent,
                pad_len: self.config.pad_size,
            };
            let written = frame.write_to(writer)?;
            writer.flush()?;

            stats.frames += 1;
            stats.bytes += written as u64;
            stats.first_sent.get_or_insert(sent);
            stats.last_sent = Some(sent);
            tracing::trace!("Sent stamp {} at {}", seq, sent);

            if let Some(progress) = &self.progress {
                progress.increment(written as u64);
            }

            if !self.config.interval.is_zero() && seq + 1 < count {
                thread::sleep(self.config.interval);
            }
        }

        let finish = Frame::Finish { sent: stats.frames };
        stats.bytes += finish.write_to(writer)? as u64;
        writer.flush()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{read_preamble, STAMP_HEADER_LEN, FINISH_LEN};
    use std::io::Cursor;

    fn config(count: u64, pad_size: u32) -> SessionConfig {
        SessionConfig {
            count: Some(count),
            pad_size,
            ..SessionConfig::sender()
        }
    }

    #[test]
    fn test_sends_sequenced_stamps_and_finish() {
        let sender = Sender::new(config(4, 16));
        let mut buf = Vec::new();
        let stats = sender.run(&mut buf).unwrap();

        assert!(stats.completed);
        assert_eq!(stats.frames, 4);
        assert_eq!(
            stats.bytes as usize,
            8 + 4 * (STAMP_HEADER_LEN + 16) + FINISH_LEN
        );
        assert_eq!(buf.len() as u64, stats.bytes);

        let mut cursor = Cursor::new(buf);
        read_preamble(&mut cursor).unwrap();
        let mut previous = TimeSpec::ZERO;
        for expected_seq in 0..4 {
            match Frame::read_from(&mut cursor).unwrap() {
                Some(Frame::Stamp { seq, sent, pad_len }) => {
                    assert_eq!(seq, expected_seq);
                    assert_eq!(pad_len, 16);
                    assert!(sent >= previous);
                    previous = sent;
                }
                other => panic!("unexpected frame: {:?}", other),
            }
        }
        assert_eq!(Frame::read_from(&mut cursor).unwrap(), Some(Frame::Finish { sent: 4 }));
    }

    #[test]
    fn test_interval_spaces_stamps() {
        let sender = Sender::new(SessionConfig {
            interval: Duration::from_millis(5),
            ..config(3, 0)
        });
        let stats = sender.run(&mut Vec::new()).unwrap();

        let span = stats.last_sent.unwrap().saturating_sub(stats.first_sent.unwrap());
        assert!(span.as_millis() >= 10);
    }

    #[test]
    fn test_cancelled_sender_still_finishes() {
        let sender = Sender::new(config(100, 0));
        sender.cancellation_flag().store(true, Ordering::SeqCst);
        let mut buf = Vec::new();
        let stats = sender.run(&mut buf).unwrap();

        assert!(!stats.completed);
        assert_eq!(stats.frames, 0);
        assert_eq!(buf.len(), 8 + FINISH_LEN);
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_broken_pipe_is_not_fatal() {
        let sender = Sender::new(config(3, 0));
        let stats = sender.run(&mut ClosedPipe).unwrap();
        assert!(!stats.completed);
        assert_eq!(stats.frames, 0);
    }

    /// Accepts `limit` bytes, then behaves like a closed pipe
    struct ClosesAfter {
        limit: usize,
        written: usize,
    }

    impl Write for ClosesAfter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let room = self.limit - self.written;
            if room == 0 {
                return Err(std::io::Error::new(ErrorKind::BrokenPipe, "closed"));
            }
            let n = buf.len().min(room);
            self.written += n;
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_hang_up_before_finish_frame_is_complete() {
        let sender = Sender::new(config(3, 0));
        let mut pipe = ClosesAfter {
            limit: 8 + 3 * STAMP_HEADER_LEN,
            written: 0,
        };
        let stats = sender.run(&mut pipe).unwrap();
        assert!(stats.completed);
        assert_eq!(stats.frames, 3);
    }

    #[test]
    fn test_summary_line() {
        let stats = Sender::new(config(2, 0)).run(&mut Vec::new()).unwrap();
        assert!(stats.summary().starts_with("Sent 2 messages"));
        assert!(!stats.summary().contains("incomplete"));
    }
}
