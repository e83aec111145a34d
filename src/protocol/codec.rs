//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Control Frame
//! ```text
//! ┌──────────┬─────────────────────────────────────────┐
//! │ Len (4)  │      UTF-8 JSON map (Len bytes)         │
//! └──────────┴─────────────────────────────────────────┘
//! ```
//!
//! ### Raw Payload Frame
//! ```text
//! ┌──────────┬─────────────────────────────────────────┐
//! │ Len (8)  │      File bytes (Len bytes)             │
//! └──────────┴─────────────────────────────────────────┘
//! ```
//!
//! Both length prefixes are big-endian. Payload bytes are written in
//! `CHUNK_SIZE` pieces, but readers never depend on chunk boundaries.

use std::io::{self, Read, Write};

use bytes::{BufMut, Bytes, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{FilePortError, Result};
use super::{Request, RequestFrame, Response};

/// Control frame header: 4 byte length
pub const CONTROL_HEADER_SIZE: usize = 4;

/// Payload frame header: 8 byte length
pub const PAYLOAD_HEADER_SIZE: usize = 8;

/// Maximum control message size (16 MB)
pub const MAX_CONTROL_SIZE: u32 = 16 * 1024 * 1024;

/// Write granularity for raw payloads
pub const CHUNK_SIZE: usize = 4096;

// =============================================================================
// Control Frame Encoding/Decoding
// =============================================================================

/// Encode a message as a complete control frame
///
/// Bodies over `MAX_CONTROL_SIZE` fail with `ControlTooLarge`.
pub fn encode_control<T: Serialize>(message: &T) -> Result<Bytes> {
    let body = serde_json::to_vec(message)?;

    if body.len() > MAX_CONTROL_SIZE as usize {
        return Err(FilePortError::ControlTooLarge {
            size: body.len(),
            max: MAX_CONTROL_SIZE,
        });
    }

    let mut frame = BytesMut::with_capacity(CONTROL_HEADER_SIZE + body.len());
    frame.put_u32(body.len() as u32);
    frame.put_slice(&body);

    Ok(frame.freeze())
}

/// Decode one complete control frame held in memory
pub fn decode_control<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    if bytes.len() < CONTROL_HEADER_SIZE {
        return Err(FilePortError::MalformedMessage(format!(
            "Incomplete header: expected {} bytes, got {}",
            CONTROL_HEADER_SIZE,
            bytes.len()
        )));
    }

    let body_len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    check_control_len(body_len)?;

    let total_len = CONTROL_HEADER_SIZE + body_len as usize;
    if bytes.len() != total_len {
        return Err(FilePortError::MalformedMessage(format!(
            "Frame length mismatch: header says {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    parse_body(&bytes[CONTROL_HEADER_SIZE..])
}

/// Decode a request frame held in memory
pub fn decode_request(bytes: &[u8]) -> Result<Request> {
    let frame: RequestFrame = decode_control(bytes)?;
    Ok(Request::try_from(frame)?)
}

fn check_control_len(len: u32) -> Result<()> {
    if len > MAX_CONTROL_SIZE {
        return Err(FilePortError::MalformedMessage(format!(
            "Control message too large: {} bytes (max {})",
            len, MAX_CONTROL_SIZE
        )));
    }
    Ok(())
}

/// Parse a control body; it must be a JSON map of the expected shape
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let text = std::str::from_utf8(body).map_err(|e| {
        FilePortError::MalformedMessage(format!("Control message is not UTF-8: {}", e))
    })?;

    // serde_json would also accept a sequence for a struct
    let value: serde_json::Value = serde_json::from_str(text)?;
    if !value.is_object() {
        return Err(FilePortError::MalformedMessage(
            "Control message is not a map".to_string(),
        ));
    }

    Ok(serde_json::from_value(value)?)
}

// =============================================================================
// Stream-based Control I/O
// =============================================================================

/// Read a complete control frame from a stream
///
/// Returns `PeerDisconnected` if the stream ends before the first header
/// byte, and `MalformedMessage` if it ends anywhere later in the frame.
pub fn read_control<R: Read, T: DeserializeOwned>(reader: &mut R) -> Result<T> {
    let mut header = [0u8; CONTROL_HEADER_SIZE];
    read_header(reader, &mut header)?;

    let body_len = u32::from_be_bytes(header);
    check_control_len(body_len)?;

    let mut body = vec![0u8; body_len as usize];
    reader
        .read_exact(&mut body)
        .map_err(|e| truncated(e, "control message"))?;

    tracing::trace!(bytes = body_len, "read control frame");
    parse_body(&body)
}

/// Write a control frame to a stream
pub fn write_control<W: Write, T: Serialize>(writer: &mut W, message: &T) -> Result<()> {
    let frame = encode_control(message)?;
    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}

/// Read and validate a request
///
/// An unknown command or missing filename comes back as
/// `FilePortError::Protocol`; the frame has been fully consumed.
pub fn read_request<R: Read>(reader: &mut R) -> Result<Request> {
    let frame: RequestFrame = read_control(reader)?;
    Ok(Request::try_from(frame)?)
}

/// Write a request to a stream
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<()> {
    write_control(writer, &RequestFrame::from(request))
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    read_control(reader)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    write_control(writer, response)
}

// =============================================================================
// Raw Payload I/O
// =============================================================================

/// Write an in-memory payload frame
pub fn write_payload<W: Write>(writer: &mut W, data: &[u8]) -> Result<()> {
    writer.write_all(&(data.len() as u64).to_be_bytes())?;
    for chunk in data.chunks(CHUNK_SIZE) {
        writer.write_all(chunk)?;
    }
    writer.flush()?;

    tracing::trace!(bytes = data.len(), "wrote payload");
    Ok(())
}

/// Stream exactly `len` bytes from `source` as a payload frame
///
/// Fails if `source` runs dry early. The header has already gone out by
/// then, so the stream should be abandoned.
pub fn write_payload_from<W: Write, R: Read>(
    writer: &mut W,
    source: &mut R,
    len: u64,
) -> Result<u64> {
    writer.write_all(&len.to_be_bytes())?;

    let mut buf = [0u8; CHUNK_SIZE];
    let mut remaining = len;
    while remaining > 0 {
        let want = remaining.min(CHUNK_SIZE as u64) as usize;
        let n = match source.read(&mut buf[..want]) {
            Ok(0) => {
                return Err(FilePortError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("source ended after {} of {} bytes", len - remaining, len),
                )))
            }
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        writer.write_all(&buf[..n])?;
        remaining -= n as u64;
    }
    writer.flush()?;

    tracing::trace!(bytes = len, "streamed payload");
    Ok(len)
}

/// Read a payload frame into memory
pub fn read_payload<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    read_payload_into(reader, &mut data)?;
    Ok(data)
}

/// Read a payload frame into `sink`, returning the byte count
///
/// Nothing is pre-allocated from the advertised length.
pub fn read_payload_into<R: Read, W: Write>(reader: &mut R, sink: &mut W) -> Result<u64> {
    let mut header = [0u8; PAYLOAD_HEADER_SIZE];
    read_header(reader, &mut header)?;
    let len = u64::from_be_bytes(header);

    let copied = io::copy(&mut reader.by_ref().take(len), sink)?;
    if copied != len {
        return Err(FilePortError::MalformedMessage(format!(
            "Payload truncated: expected {} bytes, got {}",
            len, copied
        )));
    }
    sink.flush()?;

    tracing::trace!(bytes = len, "read payload");
    Ok(len)
}

// =============================================================================
// Helpers
// =============================================================================

/// Fill a length prefix, telling a clean close apart from a cut-off frame
fn read_header<R: Read>(reader: &mut R, header: &mut [u8]) -> Result<()> {
    let mut filled = 0;
    while filled < header.len() {
        match reader.read(&mut header[filled..]) {
            Ok(0) if filled == 0 => return Err(FilePortError::PeerDisconnected),
            Ok(0) => {
                return Err(FilePortError::MalformedMessage(format!(
                    "Truncated length prefix: got {} of {} bytes",
                    filled,
                    header.len()
                )))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn truncated(e: io::Error, what: &str) -> FilePortError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        FilePortError::MalformedMessage(format!("Connection closed while reading {}", what))
    } else {
        e.into()
    }
}
