//! Session statistics
//!
//! [`SummaryBuilder`] folds arrival records into a [`SessionSummary`]
//! covering sequence accounting (missing, duplicate, reordered stamps) and
//! the spread of arrival deltas and transit latency.

use super::record::ArrivalRecord;
use crate::config::OutputFormat;
use crate::error::Result;
use crate::timestamp::TimeSpec;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;

/// Why a receive session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The configured number of stamps arrived
    CountReached,
    /// The sender closed the session with a finish frame
    Finished,
    /// The stream closed without a finish frame
    EndOfStream,
}

impl StopReason {
    /// Short description
    pub fn describe(&self) -> &'static str {
        match self {
            StopReason::CountReached => "count reached",
            StopReason::Finished => "sender finished",
            StopReason::EndOfStream => "end of stream",
        }
    }
}

/// Aggregated results of one receive session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    /// Stamps the sender announced, or the configured count
    pub expected: u64,
    /// Distinct stamps received
    pub received: u64,
    /// Expected stamps that never arrived
    pub missing: u64,
    /// Stamps seen more than once
    pub duplicates: u64,
    /// Stamps that arrived after a higher sequence number
    pub out_of_order: u64,
    /// Bytes received on the wire, preamble excluded
    pub bytes: u64,
    /// Whether a finish frame was read
    pub sender_finished: bool,
    /// How the session ended; `None` when rebuilt from a saved report
    pub stop_reason: Option<StopReason>,
    /// Wall-clock time of the first arrival
    pub first_arrival: Option<DateTime<Utc>>,
    /// First to last arrival, in milliseconds
    pub duration_ms: f64,
    /// Smallest arrival delta (first record excluded)
    pub delta_min_ms: Option<f64>,
    /// Largest arrival delta
    pub delta_max_ms: Option<f64>,
    /// Mean arrival delta
    pub delta_mean_ms: Option<f64>,
    /// Mean transit latency
    pub latency_mean_ms: Option<f64>,
    /// Largest transit latency
    pub latency_max_ms: Option<f64>,
}

impl SessionSummary {
    /// Fraction of expected stamps that were lost, in percent
    pub fn loss_percent(&self) -> f64 {
        if self.expected == 0 {
            0.0
        } else {
            self.missing as f64 / self.expected as f64 * 100.0
        }
    }

    /// Whether every expected stamp arrived exactly once
    pub fn is_complete(&self) -> bool {
        self.missing == 0 && self.duplicates == 0 && self.received == self.expected
    }

    /// Render in the requested format
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Text => Ok(self.to_text()),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)? + "\n"),
            OutputFormat::Csv => Ok(self.to_csv()),
        }
    }

    fn to_text(&self) -> String {
        let ms = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{:.3} ms", v));
        let duration = Duration::from_nanos((self.duration_ms.max(0.0) * 1e6) as u64);

        let mut out = String::new();
        out.push_str("=== Timestamp Session Summary ===\n");
        out.push_str(&format!("Expected:      {}\n", self.expected));
        out.push_str(&format!("Received:      {}\n", self.received));
        out.push_str(&format!(
            "Missing:       {} ({:.2}%)\n",
            self.missing,
            self.loss_percent()
        ));
        out.push_str(&format!("Duplicates:    {}\n", self.duplicates));
        out.push_str(&format!("Out of order:  {}\n", self.out_of_order));
        out.push_str(&format!(
            "Data:          {}\n",
            humansize::format_size(self.bytes, humansize::BINARY)
        ));
        if let Some(first) = self.first_arrival {
            out.push_str(&format!("First arrival: {}\n", first.to_rfc3339()));
        }
        out.push_str(&format!("Duration:      {}\n", humantime::format_duration(duration)));
        out.push_str(&format!(
            "Delta:         min {} / mean {} / max {}\n",
            ms(self.delta_min_ms),
            ms(self.delta_mean_ms),
            ms(self.delta_max_ms)
        ));
        out.push_str(&format!(
            "Latency:       mean {} / max {}\n",
            ms(self.latency_mean_ms),
            ms(self.latency_max_ms)
        ));
        if let Some(reason) = self.stop_reason {
            out.push_str(&format!("Stopped:       {}\n", reason.describe()));
        }
        if self.stop_reason == Some(StopReason::EndOfStream) {
            out.push_str("Sender did not send a finish frame\n");
        }
        out
    }

    fn to_csv(&self) -> String {
        let opt = |v: Option<f64>| v.map(|v| format!("{:.6}", v)).unwrap_or_default();
        let rows = [
            ("expected", self.expected.to_string()),
            ("received", self.received.to_string()),
            ("missing", self.missing.to_string()),
            ("duplicates", self.duplicates.to_string()),
            ("out_of_order", self.out_of_order.to_string()),
            ("bytes", self.bytes.to_string()),
            ("sender_finished", self.sender_finished.to_string()),
            (
                "stop_reason",
                self.stop_reason.map(|r| r.describe().to_string()).unwrap_or_default(),
            ),
            (
                "first_arrival",
                self.first_arrival.map(|t| t.to_rfc3339()).unwrap_or_default(),
            ),
            ("duration_ms", format!("{:.6}", self.duration_ms)),
            ("delta_min_ms", opt(self.delta_min_ms)),
            ("delta_max_ms", opt(self.delta_max_ms)),
            ("delta_mean_ms", opt(self.delta_mean_ms)),
            ("latency_mean_ms", opt(self.latency_mean_ms)),
            ("latency_max_ms", opt(self.latency_max_ms)),
        ];

        let mut out = String::from("KEY,VALUE\n");
        for (key, value) in rows {
            out.push_str(key);
            out.push(',');
            out.push_str(&value);
            out.push('\n');
        }
        out
    }
}

/// Incrementally builds a [`SessionSummary`]
#[derive(Debug, Default)]
pub struct SummaryBuilder {
    seen: HashSet<u64>,
    highest_seq: Option<u64>,
    received: u64,
    duplicates: u64,
    out_of_order: u64,
    bytes: u64,
    first_arrival: Option<TimeSpec>,
    last_arrival: Option<TimeSpec>,
    delta_count: u64,
    delta_sum_ms: f64,
    delta_min_ms: Option<f64>,
    delta_max_ms: Option<f64>,
    latency_sum_ms: f64,
    latency_max_ms: Option<f64>,
    announced: Option<u64>,
    stop_reason: Option<StopReason>,
}

impl SummaryBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record in
    pub fn add(&mut self, record: &ArrivalRecord) {
        self.bytes += record.bytes;

        if !self.seen.insert(record.seq) {
            self.duplicates += 1;
            return;
        }
        self.received += 1;

        match self.highest_seq {
            Some(high) if record.seq < high => self.out_of_order += 1,
            _ => self.highest_seq = Some(record.seq),
        }

        if self.first_arrival.is_none() {
            self.first_arrival = Some(record.arrival);
        } else {
            let delta = record.delta.as_millis_f64();
            self.delta_count += 1;
            self.delta_sum_ms += delta;
            self.delta_min_ms = Some(self.delta_min_ms.map_or(delta, |m| m.min(delta)));
            self.delta_max_ms = Some(self.delta_max_ms.map_or(delta, |m| m.max(delta)));
        }
        self.last_arrival = Some(record.arrival);

        let latency = record.latency.as_millis_f64();
        self.latency_sum_ms += latency;
        self.latency_max_ms = Some(self.latency_max_ms.map_or(latency, |m| m.max(latency)));
    }

    /// Count non-stamp bytes (e.g. the finish frame)
    pub fn add_bytes(&mut self, bytes: u64) {
        self.bytes += bytes;
    }

    /// Record the total announced by the sender's finish frame
    pub fn sender_finished(&mut self, sent: u64) {
        self.announced = Some(sent);
    }

    /// Record why the session ended
    pub fn stopped(&mut self, reason: StopReason) {
        self.stop_reason = Some(reason);
    }

    /// Number of distinct stamps received so far
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Produce the summary; `configured` is the count the receiver expected
    pub fn build(&self, configured: Option<u64>) -> SessionSummary {
        let observed = self.highest_seq.map_or(0, |h| h.saturating_add(1));
        let expected = self
            .announced
            .or(configured)
            .unwrap_or(observed)
            .max(self.received);

        let duration_ms = match (self.first_arrival, self.last_arrival) {
            (Some(first), Some(last)) => last.saturating_sub(first).as_millis_f64(),
            _ => 0.0,
        };

        SessionSummary {
            expected,
            received: self.received,
            missing: expected - self.received,
            duplicates: self.duplicates,
            out_of_order: self.out_of_order,
            bytes: self.bytes,
            sender_finished: self.announced.is_some(),
            stop_reason: self.stop_reason,
            first_arrival: self.first_arrival.and_then(|t| t.to_datetime()),
            duration_ms,
            delta_min_ms: self.delta_min_ms,
            delta_max_ms: self.delta_max_ms,
            delta_mean_ms: (self.delta_count > 0)
                .then(|| self.delta_sum_ms / self.delta_count as f64),
            latency_mean_ms: (self.received > 0)
                .then(|| self.latency_sum_ms / self.received as f64),
            latency_max_ms: self.latency_max_ms,
        }
    }
}
