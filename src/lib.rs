//! # tstamp - Timestamp Sender and Receiver
//!
//! tstamp measures how a stream of messages arrives across a link. A
//! sender emits timestamped, optionally padded messages; a receiver times
//! each arrival and reports, per message, the delta from the previous
//! arrival and the arrival time normalized to the first one.
//!
//! ## Features
//!
//! - **Shared timestamp model**: [`timestamp::TimeSpec`], [`timestamp::TimeStampMode`]
//!   and [`timestamp::timestamp_manipulate`]
//! - **Binary wire protocol**: magic preamble, stamp and finish frames
//! - **Transports**: stdio pipes (e.g. through `ssh`) and direct TCP
//! - **Reports**: `DELTA,NORMALIZED` lines, detailed CSV via `TIMESTAMP_OUTPUT`,
//!   session summaries in text, JSON or CSV, random report sampling
//!
//! ## Quick Start
//!
//! ```no_run
//! use tstamp::config::SessionConfig;
//! use tstamp::core::{Receiver, Sender};
//! use tstamp::report::ArrivalRecord;
//!
//! let sender = Sender::new(SessionConfig {
//!     count: Some(16),
//!     pad_size: 512,
//!     ..SessionConfig::sender()
//! });
//! let mut wire = Vec::new();
//! sender.run(&mut wire).unwrap();
//!
//! let receiver = Receiver::new(SessionConfig {
//!     pad_size: 512,
//!     ..SessionConfig::receiver()
//! });
//! let mut records: Vec<ArrivalRecord> = Vec::new();
//! let summary = receiver.run(&mut wire.as_slice(), &mut records).unwrap();
//!
//! println!("received {} of {}", summary.received, summary.expected);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod error;
pub mod network;
pub mod progress;
pub mod protocol;
pub mod report;
pub mod timestamp;

// Re-export commonly used types
pub use config::{OutputFormat, SessionConfig};
pub use core::{Receiver, SendStats, Sender};
pub use error::{Result, TimestampError};
pub use timestamp::{timestamp_manipulate, TimeSpec, TimeStampMode, ENV_TIMESTAMP_OUTPUT};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use tstamp::prelude::*;
    //! ```

    pub use crate::config::{OutputFormat, SessionConfig};
    pub use crate::core::{Receiver, SendStats, Sender};
    pub use crate::error::{Result, TimestampError};
    pub use crate::network::Endpoint;
    pub use crate::progress::ProgressReporter;
    pub use crate::report::{ArrivalRecord, RecordSink, SessionSummary};
    pub use crate::timestamp::{timestamp_manipulate, TimeSpec, TimeStampMode};
}
