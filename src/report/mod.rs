//! Reporting module
//!
//! Turns received stamps into CSV lines, a session summary, and random
//! samples of a saved report.

mod record;
mod sample;
mod stats;

pub use record::*;
pub use sample::*;
pub use stats::*;
