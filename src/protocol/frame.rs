//! Frame encoding and decoding
//!
//! All integers are little-endian. Padding bytes are zero on the wire and
//! discarded by the decoder without buffering.

use crate::error::{Result, TimestampError};
use crate::timestamp::{TimeSpec, NANOS_PER_SEC};
use std::io::{self, Read, Write};

/// Magic bytes opening every stream
pub const PROTOCOL_MAGIC: &[u8; 8] = b"TSTAMP01";

/// Largest padding accepted on a single frame (16 MiB)
pub const MAX_PADDING: u32 = 16 * 1024 * 1024;

/// Fixed part of a stamp frame: type, seq, sec, nsec, pad_len
pub const STAMP_HEADER_LEN: usize = 1 + 8 + 8 + 4 + 4;

/// Size of a finish frame: type, sent
pub const FINISH_LEN: usize = 1 + 8;

/// Frame types
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// Timestamped message
    Stamp = 1,
    /// Sender is done
    Finish = 255,
}

impl MessageType {
    fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Stamp),
            255 => Some(Self::Finish),
            _ => None,
        }
    }
}

/// One message on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// A stamp taken by the sender right before writing
    Stamp {
        /// Sequence number, starting at 0
        seq: u64,
        /// Send stamp
        sent: TimeSpec,
        /// Number of padding bytes following the header
        pad_len: u32,
    },
    /// End of session
    Finish {
        /// Total stamps the sender emitted
        sent: u64,
    },
}

impl Frame {
    /// Size of this frame on the wire
    pub fn encoded_len(&self) -> usize {
        match self {
            Frame::Stamp { pad_len, .. } => STAMP_HEADER_LEN + *pad_len as usize,
            Frame::Finish { .. } => FINISH_LEN,
        }
    }

    /// Encode into `writer`, returning the number of bytes written
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize> {
        match *self {
            Frame::Stamp { seq, sent, pad_len } => {
                if pad_len > MAX_PADDING {
                    return Err(TimestampError::MalformedFrame(format!(
                        "padding of {} bytes exceeds limit of {} bytes",
                        pad_len, MAX_PADDING
                    )));
                }
                let mut header = [0u8; STAMP_HEADER_LEN];
                header[0] = MessageType::Stamp as u8;
                header[1..9].copy_from_slice(&seq.to_le_bytes());
                header[9..17].copy_from_slice(&sent.sec.to_le_bytes());
                header[17..21].copy_from_slice(&(sent.nsec as u32).to_le_bytes());
                header[21..25].copy_from_slice(&pad_len.to_le_bytes());
                writer.write_all(&header)?;
                io::copy(&mut io::repeat(0).take(u64::from(pad_len)), writer)?;
            }
            Frame::Finish { sent } => {
                writer.write_all(&[MessageType::Finish as u8])?;
                writer.write_all(&sent.to_le_bytes())?;
            }
        }
        Ok(self.encoded_len())
    }

    /// Decode the next frame, `Ok(None)` on a clean end of stream
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Option<Frame>> {
        let mut msg_type = [0u8; 1];
        match reader.read_exact(&mut msg_type) {
            Ok(_) => {}
            Err(ref e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(TimestampError::Stream(e)),
        }

        let msg_type =
            MessageType::from_u8(msg_type[0]).ok_or(TimestampError::UnknownFrame(msg_type[0]))?;

        match msg_type {
            MessageType::Stamp => {
                let mut header = [0u8; STAMP_HEADER_LEN - 1];
                read_full(reader, &mut header, "stamp header")?;

                let seq = u64::from_le_bytes(le_array(&header[0..8]));
                let sec = i64::from_le_bytes(le_array(&header[8..16]));
                let nsec = u32::from_le_bytes(le_array(&header[16..20]));
                let pad_len = u32::from_le_bytes(le_array(&header[20..24]));

                if i64::from(nsec) >= NANOS_PER_SEC {
                    return Err(TimestampError::MalformedFrame(format!(
                        "nanoseconds out of range: {}",
                        nsec
                    )));
                }
                if pad_len > MAX_PADDING {
                    return Err(TimestampError::MalformedFrame(format!(
                        "padding of {} bytes exceeds limit of {} bytes",
                        pad_len, MAX_PADDING
                    )));
                }

                let skipped = io::copy(&mut (&mut *reader).take(u64::from(pad_len)), &mut io::sink())?;
                if skipped != u64::from(pad_len) {
                    return Err(TimestampError::Truncated("stamp padding"));
                }

                Ok(Some(Frame::Stamp {
                    seq,
                    sent: TimeSpec {
                        sec,
                        nsec: i64::from(nsec),
                    },
                    pad_len,
                }))
            }
            MessageType::Finish => {
                let mut sent = [0u8; 8];
                read_full(reader, &mut sent, "finish frame")?;
                Ok(Some(Frame::Finish {
                    sent: u64::from_le_bytes(sent),
                }))
            }
        }
    }
}

/// Write the stream preamble
pub fn write_preamble<W: Write + ?Sized>(writer: &mut W) -> Result<()> {
    writer.write_all(PROTOCOL_MAGIC)?;
    Ok(())
}

/// Read and verify the stream preamble
pub fn read_preamble<R: Read + ?Sized>(reader: &mut R) -> Result<()> {
    let mut magic = [0u8; 8];
    read_full(reader, &mut magic, "preamble")?;
    if &magic != PROTOCOL_MAGIC {
        return Err(TimestampError::BadMagic(magic));
    }
    Ok(())
}

fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8], what: &'static str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => TimestampError::Truncated(what),
        _ => TimestampError::Stream(e),
    })
}

fn le_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}
