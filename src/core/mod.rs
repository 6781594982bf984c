//! Session drivers
//!
//! [`Sender`] produces the stamp stream and [`Receiver`] consumes it. Both
//! work on any `Write`/`Read`, so a session can run over a pipe, a TCP
//! connection or an in-memory buffer.

mod receiver;
mod sender;

pub use receiver::*;
pub use sender::*;
