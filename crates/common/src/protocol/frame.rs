//! Primitives shared by the request and response frame layouts
//!
//! All multi-byte integers are little-endian. Variable-length fields carry an
//! explicit length prefix except the body, which is always last and runs to
//! the end of the buffer.

use std::collections::BTreeMap;

use crate::error::{RelayError, Result};

/// Header name to ordered list of values
///
/// Keys are kept sorted so the serialized header block is deterministic.
pub type Headers = BTreeMap<String, Vec<String>>;

/// Serialize a header mapping into a header block
pub fn encode_header_block(headers: &Headers) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(headers)?)
}

/// Parse a header block; a malformed block is an error, never an empty map
///
/// A JSON `null` block is accepted as "no headers", and a `null` value as a
/// name with no values.
pub fn decode_header_block(block: &[u8]) -> Result<Headers> {
    let headers: Option<BTreeMap<String, Option<Vec<String>>>> = serde_json::from_slice(block)?;
    Ok(headers
        .unwrap_or_default()
        .into_iter()
        .map(|(name, values)| (name, values.unwrap_or_default()))
        .collect())
}

pub(crate) fn check_len(field: &'static str, len: usize, max: usize) -> Result<()> {
    if len > max {
        return Err(RelayError::FieldTooLong { field, len, max });
    }
    Ok(())
}

/// Cursor over a frame being decoded
pub(crate) struct FrameReader<'a> {
    buf: &'a [u8],
}

impl<'a> FrameReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub(crate) fn take(&mut self, n: usize, field: &'static str) -> Result<&'a [u8]> {
        if self.buf.len() < n {
            return Err(RelayError::Truncated(field));
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    pub(crate) fn read_u8(&mut self, field: &'static str) -> Result<u8> {
        Ok(self.take(1, field)?[0])
    }

    pub(crate) fn read_u16_le(&mut self, field: &'static str) -> Result<u16> {
        let b = self.take(2, field)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub(crate) fn read_i16_le(&mut self, field: &'static str) -> Result<i16> {
        let b = self.take(2, field)?;
        Ok(i16::from_le_bytes([b[0], b[1]]))
    }

    /// Length-prefixed field with a u16 prefix
    pub(crate) fn read_prefixed_u16(&mut self, field: &'static str) -> Result<&'a [u8]> {
        let len = self.read_u16_le(field)? as usize;
        self.take(len, field)
    }

    /// Everything left; used for the trailing body
    pub(crate) fn rest(self) -> &'a [u8] {
        self.buf
    }
}
