//! Progress reporting module
//!
//! Provides a live message counter for send and receive sessions.

mod reporter;

pub use reporter::*;
