//! Transport module
//!
//! Moves the stamp stream between sender and receiver:
//! - Stdio, for pipes such as `ts -s | ssh host ts -r`
//! - Direct TCP, with the receiver listening for a single sender

mod endpoint;
mod tcp;

pub use endpoint::*;
pub use tcp::*;
