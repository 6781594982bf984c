//! Configuration module for tstamp
//!
//! Provides CLI arguments and the runtime session settings derived
//! from them.

mod settings;

pub use settings::*;
