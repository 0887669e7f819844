//! Length-delimited frames and scalar tokens.
use crate::error::CoordError;
use std::io::{self, Read, Write};

/// Upper bound on the payload of a single frame.
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Writes `payload` prefixed with its length as a big-endian `u32`.
pub fn write_frame<W: Write>(w: &mut W, payload: &[u8]) -> io::Result<()> {
    if payload.len() > MAX_FRAME_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("frame of {} bytes exceeds the limit", payload.len()),
        ));
    }
    w.write_all(&(payload.len() as u32).to_be_bytes())?;
    w.write_all(payload)?;
    w.flush()
}

/// Reads one frame written by [`write_frame`].
///
/// An oversized length header yields [`io::ErrorKind::InvalidData`].
pub fn read_frame<R: Read>(r: &mut R) -> io::Result<Vec<u8>> {
    let mut header = [0u8; 4];
    r.read_exact(&mut header)?;
    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_FRAME_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame header announces {} bytes", len),
        ));
    }
    let mut payload = vec![0u8; len];
    r.read_exact(&mut payload)?;
    Ok(payload)
}

/// Encodes a scalar as a decimal text token.
pub fn encode_scalar(value: f64) -> Vec<u8> {
    value.to_string().into_bytes()
}

/// Parses a decimal text token.
pub fn decode_scalar(payload: &[u8]) -> Result<f64, CoordError> {
    let text = std::str::from_utf8(payload)
        .map_err(|_| CoordError::ProtocolDesync(String::from_utf8_lossy(payload).into_owned()))?;
    text.trim()
        .parse::<f64>()
        .map_err(|_| CoordError::ProtocolDesync(text.to_string()))
}
