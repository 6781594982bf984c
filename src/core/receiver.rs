//! Receiving side of a session
//!
//! Reads frames until the configured count is reached, the sender closes
//! the session with a finish frame, or the stream ends. Each stamp is
//! timed on arrival and turned into an [`ArrivalRecord`].

use crate::config::SessionConfig;
use crate::error::Result;
use crate::protocol::{read_preamble, Frame, FINISH_LEN};
use crate::progress::ProgressReporter;
use crate::report::{
    create_report, resolve_report_path, ArrivalRecord, CsvSink, CsvStyle, RecordSink,
    SessionSummary, StopReason, SummaryBuilder,
};
use crate::timestamp::{timestamp_manipulate, TimeSpec, TimeStampMode};
use std::io::{self, Read};

/// Timestamp receiver
pub struct Receiver {
    /// Configuration
    config: SessionConfig,
    /// Progress reporter
    progress: Option<ProgressReporter>,
}

impl Receiver {
    /// Create a new receiver
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            progress: None,
        }
    }

    /// Set progress reporter
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Open the configured endpoint, print brief lines on stdout and write
    /// the detailed report if one is configured
    pub fn execute(&self) -> Result<SessionSummary> {
        let mut sinks: Vec<Box<dyn RecordSink>> = Vec::new();

        // Header goes out before the first stamp, even for empty sessions
        let stdout = CsvSink::new(io::stdout().lock(), CsvStyle::Brief)?.with_line_flush(true);
        sinks.push(Box::new(stdout));

        if let Some(path) = &self.config.report_path {
            let path = resolve_report_path(path);
            tracing::info!("Writing detailed report to {}", path.display());
            sinks.push(Box::new(create_report(&path)?));
        }

        tracing::info!("Receiving via {}", self.config.endpoint);
        let mut reader = self.config.endpoint.open_reader()?;
        self.run(&mut reader, &mut sinks)
    }

    /// Receive a full session from `reader`, feeding every record to `sink`
    pub fn run<R, S>(&self, reader: &mut R, sink: &mut S) -> Result<SessionSummary>
    where
        R: Read + ?Sized,
        S: RecordSink + ?Sized,
    {
        let result = self.receive_frames(reader, sink);
        let finished = sink.finish();

        match (result, finished) {
            (Ok(summary), Ok(())) => {
                if let Some(progress) = &self.progress {
                    progress.finish_success(&format!(
                        "Received {}/{} messages ({:.1} msg/s)",
                        summary.received,
                        summary.expected,
                        progress.rate()
                    ));
                }
                Ok(summary)
            }
            (Err(e), _) | (Ok(_), Err(e)) => {
                if let Some(progress) = &self.progress {
                    progress.finish_error(&e.to_string());
                }
                Err(e)
            }
        }
    }

    fn receive_frames<R, S>(&self, reader: &mut R, sink: &mut S) -> Result<SessionSummary>
    where
        R: Read + ?Sized,
        S: RecordSink + ?Sized,
    {
        read_preamble(reader)?;

        let mut builder = SummaryBuilder::new();
        let mut first_arrival: Option<TimeSpec> = None;
        let mut prev_arrival: Option<TimeSpec> = None;
        let mut pad_warned = false;

        loop {
            if let Some(count) = self.config.count {
                if builder.received() >= count {
                    tracing::debug!("Received all {} expected messages", count);
                    builder.stopped(StopReason::CountReached);
                    break;
                }
            }

            let frame = match Frame::read_from(reader)? {
                Some(frame) => frame,
                None => {
                    match self.config.count {
                        Some(count) => tracing::warn!(
                            "Stream ended after {} of {} messages",
                            builder.received(),
                            count
                        ),
                        None => tracing::warn!("Stream ended without a finish frame"),
                    }
                    builder.stopped(StopReason::EndOfStream);
                    break;
                }
            };

            match frame {
                Frame::Stamp { seq, sent, pad_len } => {
                    let arrival = TimeSpec::now();

                    let mut latency = sent;
                    timestamp_manipulate(&mut latency, TimeStampMode::Receive);

                    let first = *first_arrival.get_or_insert(arrival);
                    let delta = prev_arrival.map_or(TimeSpec::ZERO, |prev| arrival.saturating_sub(prev));
                    prev_arrival = Some(arrival);

                    if pad_len != self.config.pad_size && !pad_warned {
                        tracing::warn!(
                            "Message {} carries {} padding bytes, expected {}",
                            seq,
                            pad_len,
                            self.config.pad_size
                        );
                        pad_warned = true;
                    }

                    let record = ArrivalRecord {
                        seq,
                        sent,
                        arrival,
                        delta,
                        normalized: arrival.saturating_sub(first),
                        latency,
                        bytes: frame.encoded_len() as u64,
                    };
                    tracing::trace!("Stamp {} arrived at {} (latency {})", seq, arrival, latency);

                    builder.add(&record);
                    sink.record(&record)?;

                    if let Some(progress) = &self.progress {
                        progress.increment(record.bytes);
                    }
                }
                Frame::Finish { sent } => {
                    tracing::debug!("Sender finished after {} messages", sent);
                    builder.add_bytes(FINISH_LEN as u64);
                    builder.sender_finished(sent);
                    builder.stopped(StopReason::Finished);
                    break;
                }
            }
        }

        Ok(builder.build(self.config.count))
    }
}
