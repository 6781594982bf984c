//! Direct TCP transport
//!
//! Carries the stamp stream over a plain TCP connection instead of a
//! stdio pipe. The receiver listens and serves exactly one sender.

use crate::error::{Result, TimestampError};
use std::io::{BufReader, BufWriter};
use std::net::{SocketAddr, TcpListener, TcpStream};

/// Default buffer size (64KB)
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Listening side of a TCP session
pub struct StampListener {
    /// Listener
    listener: TcpListener,
}

impl StampListener {
    /// Bind the listener
    pub fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .map_err(|e| TimestampError::connection(addr, e.to_string()))?;

        Ok(Self { listener })
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Wait for the sender and return a buffered reader on its stream
    pub fn accept(self) -> Result<BufReader<TcpStream>> {
        let (stream, peer) = self
            .listener
            .accept()
            .map_err(|e| TimestampError::connection("listener", e.to_string()))?;
        tracing::info!("Accepted connection from {}", peer);

        Ok(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, stream))
    }
}

/// Connect to a listening receiver
pub fn connect(addr: &str) -> Result<BufWriter<TcpStream>> {
    let stream = TcpStream::connect(addr)
        .map_err(|e| TimestampError::connection(addr, e.to_string()))?;

    // Stamps must leave as soon as they are written
    stream
        .set_nodelay(true)
        .map_err(|e| TimestampError::connection(addr, e.to_string()))?;

    if let Ok(peer) = stream.peer_addr() {
        tracing::info!("Connected to {}", peer);
    }

    Ok(BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, stream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::thread;

    #[test]
    fn test_single_connection_transfer() {
        let listener = StampListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let server = thread::spawn(move || {
            let mut reader = listener.accept().unwrap();
            let mut buf = String::new();
            reader.read_to_string(&mut buf).unwrap();
            buf
        });

        let mut writer = connect(&addr).unwrap();
        writer.write_all(b"hello stamp").unwrap();
        writer.flush().unwrap();
        drop(writer);

        assert_eq!(server.join().unwrap(), "hello stamp");
    }

    #[test]
    fn test_connect_refused() {
        // Bind then drop to obtain a port nobody listens on
        let addr = {
            let listener = StampListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().to_string()
        };
        let err = connect(&addr).unwrap_err();
        assert!(matches!(err, TimestampError::ConnectionError { .. }));
    }
}
