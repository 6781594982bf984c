//! Wire protocol between sender and receiver
//!
//! A stream starts with the 8-byte magic `TSTAMP01`, followed by any number
//! of frames. Each frame begins with a one-byte type:
//!
//! | Type | Name | Body |
//! |------|------|------|
//! | 1 | Stamp | `seq: u64`, `sec: i64`, `nsec: u32`, `pad_len: u32`, padding |
//! | 255 | Finish | `sent: u64` |
//!
//! The same encoding is used over a stdio pipe (e.g. through `ssh`) and
//! over a direct TCP connection.

mod frame;

pub use frame::*;
