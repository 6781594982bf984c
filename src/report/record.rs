//! Arrival records and their CSV forms
//!
//! Two CSV layouts are produced:
//!
//! - Brief, on stdout: `DELTA,NORMALIZED` in whole milliseconds, the format
//!   test harnesses parse line by line.
//! - Detailed, in the report file: raw stamps plus nanosecond spans, which
//!   can be loaded back with [`read_report`].

use crate::error::{IoResultExt, Result, TimestampError};
use crate::timestamp::TimeSpec;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Header of the brief stdout format
pub const BRIEF_HEADER: &str = "DELTA,NORMALIZED";

/// Header of the detailed report format
pub const DETAILED_HEADER: &str =
    "SEQ,SENT_SEC,SENT_NSEC,ARRIVAL_SEC,ARRIVAL_NSEC,DELTA_NS,NORMALIZED_NS,LATENCY_NS,BYTES";

/// One received stamp and the timings derived from it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArrivalRecord {
    /// Sequence number assigned by the sender
    pub seq: u64,
    /// Send stamp carried by the frame
    pub sent: TimeSpec,
    /// Local arrival time
    pub arrival: TimeSpec,
    /// Arrival time minus the previous arrival (zero for the first)
    pub delta: TimeSpec,
    /// Arrival time minus the first arrival
    pub normalized: TimeSpec,
    /// Transit time, zero when the sender clock is ahead
    pub latency: TimeSpec,
    /// Frame size on the wire
    pub bytes: u64,
}

impl ArrivalRecord {
    /// Render as a brief `DELTA,NORMALIZED` line
    pub fn brief_line(&self) -> String {
        format!("{},{}", self.delta.as_millis(), self.normalized.as_millis())
    }

    /// Render as a detailed report line
    pub fn detailed_line(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{}",
            self.seq,
            self.sent.sec,
            self.sent.nsec,
            self.arrival.sec,
            self.arrival.nsec,
            self.delta.as_nanos(),
            self.normalized.as_nanos(),
            self.latency.as_nanos(),
            self.bytes
        )
    }

    /// Parse a detailed report line
    pub fn parse_detailed(line: &str, line_no: usize) -> Result<Self> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 9 {
            return Err(TimestampError::report(
                line_no,
                format!("expected 9 fields, found {}", fields.len()),
            ));
        }

        let int = |idx: usize, name: &str| -> Result<i64> {
            fields[idx]
                .parse::<i64>()
                .map_err(|_| TimestampError::report(line_no, format!("invalid {}: '{}'", name, fields[idx])))
        };
        let span = |idx: usize, name: &str| -> Result<TimeSpec> {
            fields[idx]
                .parse::<i128>()
                .ok()
                .and_then(nanos_to_timespec)
                .ok_or_else(|| TimestampError::report(line_no, format!("invalid {}: '{}'", name, fields[idx])))
        };

        let seq = fields[0]
            .parse::<u64>()
            .map_err(|_| TimestampError::report(line_no, format!("invalid SEQ: '{}'", fields[0])))?;
        let bytes = fields[8]
            .parse::<u64>()
            .map_err(|_| TimestampError::report(line_no, format!("invalid BYTES: '{}'", fields[8])))?;

        Ok(Self {
            seq,
            sent: TimeSpec::new(int(1, "SENT_SEC")?, int(2, "SENT_NSEC")?),
            arrival: TimeSpec::new(int(3, "ARRIVAL_SEC")?, int(4, "ARRIVAL_NSEC")?),
            delta: span(5, "DELTA_NS")?,
            normalized: span(6, "NORMALIZED_NS")?,
            latency: span(7, "LATENCY_NS")?,
            bytes,
        })
    }
}

fn nanos_to_timespec(nanos: i128) -> Option<TimeSpec> {
    let sec = i64::try_from(nanos.div_euclid(1_000_000_000)).ok()?;
    let nsec = nanos.rem_euclid(1_000_000_000) as i64;
    Some(TimeSpec::new(sec, nsec))
}

/// Destination for arrival records as the receiver produces them
pub trait RecordSink {
    /// Accept one record
    fn record(&mut self, record: &ArrivalRecord) -> Result<()>;

    /// Flush whatever was buffered
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl RecordSink for Vec<ArrivalRecord> {
    fn record(&mut self, record: &ArrivalRecord) -> Result<()> {
        self.push(*record);
        Ok(())
    }
}

impl RecordSink for Vec<Box<dyn RecordSink>> {
    fn record(&mut self, record: &ArrivalRecord) -> Result<()> {
        for sink in self.iter_mut() {
            sink.record(record)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        for sink in self.iter_mut() {
            sink.finish()?;
        }
        Ok(())
    }
}

/// CSV layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvStyle {
    /// `DELTA,NORMALIZED` in milliseconds
    Brief,
    /// Full stamps and nanosecond spans
    Detailed,
}

/// Writes records as CSV lines, header first
pub struct CsvSink<W: Write> {
    writer: W,
    style: CsvStyle,
    /// Flush after every line, for live consumers of stdout
    line_flush: bool,
}

impl<W: Write> CsvSink<W> {
    /// Create the sink and write the header
    pub fn new(mut writer: W, style: CsvStyle) -> Result<Self> {
        let header = match style {
            CsvStyle::Brief => BRIEF_HEADER,
            CsvStyle::Detailed => DETAILED_HEADER,
        };
        writeln!(writer, "{}", header)?;
        Ok(Self {
            writer,
            style,
            line_flush: false,
        })
    }

    /// Flush after each record
    pub fn with_line_flush(mut self, enabled: bool) -> Self {
        self.line_flush = enabled;
        self
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn record(&mut self, record: &ArrivalRecord) -> Result<()> {
        let line = match self.style {
            CsvStyle::Brief => record.brief_line(),
            CsvStyle::Detailed => record.detailed_line(),
        };
        writeln!(self.writer, "{}", line)?;
        if self.line_flush {
            self.writer.flush()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Resolve a report path; relative names land in the temporary directory
pub fn resolve_report_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::temp_dir().join(path)
    }
}

/// Create the detailed report file
pub fn create_report(path: &Path) -> Result<CsvSink<BufWriter<File>>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_path(parent)?;
        }
    }
    let file = File::create(path).with_path(path)?;
    CsvSink::new(BufWriter::new(file), CsvStyle::Detailed)
}

/// Load a detailed report written by [`create_report`]
pub fn read_report(path: &Path) -> Result<Vec<ArrivalRecord>> {
    let file = File::open(path).with_path(path)?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();
    let mut seen_header = false;

    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_path(path)?;
        let line_no = idx + 1;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }
        if !seen_header {
            if trimmed != DETAILED_HEADER {
                return Err(TimestampError::report(line_no, "missing detailed report header"));
            }
            seen_header = true;
            continue;
        }
        records.push(ArrivalRecord::parse_detailed(trimmed, line_no)?);
    }

    Ok(records)
}
