//! Record framing: a little-endian `u32` payload length, then the payload.

use crate::utils::config::{MAX_RECORD_BYTES, RECORD_PREFIX_BYTES};
use crate::utils::error::CodecError;
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use std::io::{self, Read, Write};

/// Write one framed record
pub fn write_frame<W: Write>(sink: &mut W, payload: &[u8]) -> Result<(), CodecError> {
    let len = u32::try_from(payload.len())
        .ok()
        .filter(|len| *len <= MAX_RECORD_BYTES)
        .ok_or_else(|| {
            CodecError::Encoding(format!(
                "record of {} bytes exceeds the {} byte limit",
                payload.len(),
                MAX_RECORD_BYTES
            ))
        })?;

    sink.write_u32::<LittleEndian>(len)?;
    sink.write_all(payload)?;
    Ok(())
}

/// Read one framed record.
///
/// Returns `Ok(None)` when the source is exhausted exactly at a record
/// boundary.
///
/// # Errors
/// * `CodecError::CorruptStream` - truncated prefix or payload, or an oversized length
/// * `CodecError::Io` - the source failed
pub fn read_frame<R: Read>(source: &mut R) -> Result<Option<Vec<u8>>, CodecError> {
    let mut prefix = [0u8; RECORD_PREFIX_BYTES];
    let filled = fill(source, &mut prefix)?;
    if filled == 0 {
        return Ok(None);
    }
    if filled < RECORD_PREFIX_BYTES {
        return Err(CodecError::corrupt(format!(
            "truncated length prefix ({} of {} bytes)",
            filled, RECORD_PREFIX_BYTES
        )));
    }

    let len = LittleEndian::read_u32(&prefix);
    if len > MAX_RECORD_BYTES {
        return Err(CodecError::corrupt(format!(
            "record length {} exceeds the {} byte limit",
            len, MAX_RECORD_BYTES
        )));
    }

    // Grows with the bytes actually present, not with the claimed length
    let mut payload = Vec::new();
    source
        .by_ref()
        .take(u64::from(len))
        .read_to_end(&mut payload)?;
    if payload.len() < len as usize {
        return Err(CodecError::corrupt(format!(
            "truncated record ({} of {} bytes)",
            payload.len(),
            len
        )));
    }
    Ok(Some(payload))
}

/// Read until `buf` is full or the source ends; returns the bytes read
fn fill<R: Read>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
