//! Stream endpoints for the sender and the receiver

use super::tcp::{self, StampListener, DEFAULT_BUFFER_SIZE};
use crate::error::{Result, TimestampError};
use std::fmt;
use std::io::{self, BufReader, BufWriter, Read, Write};

/// Where the stamp stream goes to or comes from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Endpoint {
    /// Stdout for the sender, stdin for the receiver (SSH pipe)
    #[default]
    Stdio,
    /// Sender connects to a listening receiver
    Connect(String),
    /// Receiver listens for one sender
    Listen(String),
}

impl Endpoint {
    /// Open the endpoint for writing stamps
    pub fn open_writer(&self) -> Result<Box<dyn Write>> {
        match self {
            Endpoint::Stdio => Ok(Box::new(BufWriter::with_capacity(
                DEFAULT_BUFFER_SIZE,
                io::stdout().lock(),
            ))),
            Endpoint::Connect(addr) => Ok(Box::new(tcp::connect(addr)?)),
            Endpoint::Listen(addr) => Err(TimestampError::config(format!(
                "sender cannot listen on {}, use --connect",
                addr
            ))),
        }
    }

    /// Open the endpoint for reading stamps
    pub fn open_reader(&self) -> Result<Box<dyn Read>> {
        match self {
            Endpoint::Stdio => Ok(Box::new(BufReader::with_capacity(
                DEFAULT_BUFFER_SIZE,
                io::stdin().lock(),
            ))),
            Endpoint::Listen(addr) => {
                let listener = StampListener::bind(addr)?;
                if let Ok(local) = listener.local_addr() {
                    tracing::info!("Waiting for sender on {}", local);
                }
                Ok(Box::new(listener.accept()?))
            }
            Endpoint::Connect(addr) => Err(TimestampError::config(format!(
                "receiver cannot connect to {}, use --listen",
                addr
            ))),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Stdio => f.write_str("stdio"),
            Endpoint::Connect(addr) => write!(f, "tcp -> {}", addr),
            Endpoint::Listen(addr) => write!(f, "tcp <- {}", addr),
        }
    }
}
