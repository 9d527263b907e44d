//! Payload shapes shared by all schemas

use std::borrow::Cow;
use std::fmt;

use super::{FieldContext, FieldValue, exact};
use crate::cursor::ByteWriter;
use crate::error::{EsmError, Result};
use crate::tag::Tag;

macro_rules! fixed_width {
    ($($ty:ty),* $(,)?) => {$(
        impl FieldValue for $ty {
            fn decode(tag: Tag, payload: &[u8], _ctx: &FieldContext<'_>) -> Result<Self> {
                Ok(<$ty>::from_le_bytes(exact(tag, payload)?))
            }

            fn payload_len(&self) -> usize {
                std::mem::size_of::<$ty>()
            }

            fn write_payload(&self, out: &mut ByteWriter<'_>) -> Result<()> {
                out.write_bytes(&self.to_le_bytes())
            }
        }
    )*};
}

fixed_width!(u8, u16, u32, u64, i16, i32, i64, f32);

/// Fixed-size opaque structs (bounds, sound data, destruction data...).
impl<const N: usize> FieldValue for [u8; N] {
    fn decode(tag: Tag, payload: &[u8], _ctx: &FieldContext<'_>) -> Result<Self> {
        exact(tag, payload)
    }

    fn payload_len(&self) -> usize {
        N
    }

    fn write_payload(&self, out: &mut ByteWriter<'_>) -> Result<()> {
        out.write_bytes(self)
    }
}

// =============================================================================
// Strings
// =============================================================================

/// NUL-terminated string subrecord.
///
/// The payload bytes are kept as read, so strings without a terminator or
/// with bytes after the first NUL re-encode unchanged. Text is exposed up to
/// the first NUL.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ZString {
    raw: Vec<u8>,
}

impl ZString {
    /// Build from text; the terminator is appended.
    pub fn new(text: &str) -> Self {
        let mut raw = Vec::with_capacity(text.len() + 1);
        raw.extend_from_slice(text.as_bytes());
        raw.push(0);
        Self { raw }
    }

    /// Wrap a payload exactly as it appears on disk.
    pub fn from_raw(raw: Vec<u8>) -> Self {
        Self { raw }
    }

    /// Text bytes before the first NUL.
    pub fn as_bytes(&self) -> &[u8] {
        let end = self.raw.iter().position(|&b| b == 0).unwrap_or(self.raw.len());
        &self.raw[..end]
    }

    /// Full payload, terminator included.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Text with invalid UTF-8 replaced (game files are mostly Windows-1252).
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl From<&str> for ZString {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl PartialEq<str> for ZString {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for ZString {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl fmt::Debug for ZString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.text())
    }
}

impl fmt::Display for ZString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

impl FieldValue for ZString {
    fn decode(tag: Tag, payload: &[u8], ctx: &FieldContext<'_>) -> Result<Self> {
        let max = ctx.max_string_len();
        if payload.len() > max {
            return Err(EsmError::OversizedField {
                tag,
                len: payload.len(),
                max,
            });
        }
        Ok(Self::from_raw(payload.to_vec()))
    }

    fn payload_len(&self) -> usize {
        self.raw.len()
    }

    fn write_payload(&self, out: &mut ByteWriter<'_>) -> Result<()> {
        out.write_bytes(&self.raw)
    }
}

/// NUL-padded text region of fixed width inside a struct payload.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedString<const N: usize>(pub [u8; N]);

impl<const N: usize> FixedString<N> {
    /// Pad `text` with NULs; `None` if it does not fit.
    pub fn from_text(text: &str) -> Option<Self> {
        let bytes = text.as_bytes();
        if bytes.len() > N {
            return None;
        }
        let mut buf = [0u8; N];
        buf[..bytes.len()].copy_from_slice(bytes);
        Some(Self(buf))
    }

    pub fn as_bytes(&self) -> &[u8] {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(N);
        &self.0[..end]
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }
}

impl<const N: usize> Default for FixedString<N> {
    fn default() -> Self {
        Self([0; N])
    }
}

impl<const N: usize> fmt::Debug for FixedString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.text())
    }
}

// =============================================================================
// Opaque data
// =============================================================================

/// Opaque payload of any length, kept byte for byte.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Blob(pub Vec<u8>);

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blob({} bytes)", self.0.len())
    }
}

impl FieldValue for Blob {
    fn decode(_tag: Tag, payload: &[u8], _ctx: &FieldContext<'_>) -> Result<Self> {
        Ok(Self(payload.to_vec()))
    }

    fn payload_len(&self) -> usize {
        self.0.len()
    }

    fn write_payload(&self, out: &mut ByteWriter<'_>) -> Result<()> {
        out.write_bytes(&self.0)
    }
}

/// Non-empty array of 32-bit form ids packed in one payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FormIdList(pub Vec<u32>);

impl FieldValue for FormIdList {
    fn decode(tag: Tag, payload: &[u8], _ctx: &FieldContext<'_>) -> Result<Self> {
        if payload.is_empty() || payload.len() % 4 != 0 {
            return Err(EsmError::InvalidValue {
                tag,
                reason: format!(
                    "length {} is not a non-zero multiple of four",
                    payload.len()
                ),
            });
        }
        let ids = payload
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Self(ids))
    }

    fn payload_len(&self) -> usize {
        self.0.len() * 4
    }

    fn check(&self, tag: Tag) -> Result<()> {
        if self.0.is_empty() {
            return Err(EsmError::InvalidValue {
                tag,
                reason: "form id list is empty".into(),
            });
        }
        Ok(())
    }

    fn write_payload(&self, out: &mut ByteWriter<'_>) -> Result<()> {
        for &id in &self.0 {
            out.write_u32(id)?;
        }
        Ok(())
    }
}
