//! Subrecord TLV codec
//!
//! A subrecord is `[tag][length][payload]`. The length is 4 bytes wide in
//! TES3 files and 2 bytes wide in TES4 files. TES4 payloads larger than
//! 65535 bytes are preceded by an `XXXX` subrecord whose 4-byte payload
//! holds the real length; the narrow length that follows is then a sentinel
//! (written as 0) and is ignored.

use std::io::Write;

use crate::cursor::{ByteWriter, Cursor};
use crate::error::{EsmError, Result};
use crate::field::FieldValue;
use crate::generation::Generation;
use crate::tag::{Tag, tags};

/// Size of the `XXXX` escape subrecord in bytes (tag + u16 length + u32 value).
pub const LENGTH_ESCAPE_SIZE: usize = 10;

/// One decoded subrecord, borrowing its payload from the record body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subrecord<'a> {
    pub tag: Tag,
    pub payload: &'a [u8],
    /// Absolute offset of the subrecord header
    pub offset: u64,
}

/// Number of bytes a subrecord with `payload_len` bytes occupies on disk.
pub fn subrecord_size(generation: Generation, payload_len: usize) -> usize {
    let escape = if needs_escape(generation, payload_len) {
        LENGTH_ESCAPE_SIZE
    } else {
        0
    };
    escape + generation.subrecord_header_len() + payload_len
}

fn needs_escape(generation: Generation, payload_len: usize) -> bool {
    generation.has_length_escape() && payload_len as u64 > generation.max_narrow_len()
}

// =============================================================================
// Decoding
// =============================================================================

/// Pull-style reader over the subrecords of one record body.
///
/// Never reads past the end of the body slice: a subrecord whose length
/// would overrun the body fails with [`EsmError::CorruptLength`], and
/// trailing bytes too short for a header with [`EsmError::TruncatedRecord`].
pub struct SubrecordReader<'a> {
    cursor: Cursor<'a>,
    record: Tag,
    generation: Generation,
}

impl<'a> SubrecordReader<'a> {
    pub fn new(body: &'a [u8], record: Tag, generation: Generation) -> Self {
        Self::with_base(body, record, generation, 0)
    }

    /// Reader whose reported offsets start at `base`.
    pub fn with_base(body: &'a [u8], record: Tag, generation: Generation, base: u64) -> Self {
        Self {
            cursor: Cursor::with_base(body, base),
            record,
            generation,
        }
    }

    /// Tag of the record being read, for error context.
    pub fn record(&self) -> Tag {
        self.record
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Bytes of the body not yet consumed.
    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    /// Decode the next subrecord, or `None` once the body is fully consumed.
    pub fn next_subrecord(&mut self) -> Result<Option<Subrecord<'a>>> {
        if self.cursor.is_empty() {
            return Ok(None);
        }

        let mut wide_len: Option<u32> = None;
        loop {
            let offset = self.cursor.offset();
            let (tag, narrow_len) = self.read_header(wide_len)?;

            if self.generation.has_length_escape() && tag == tags::XXXX {
                wide_len = Some(self.read_escape(narrow_len, wide_len)?);
                continue;
            }

            let len = wide_len.map_or(narrow_len, u64::from);
            let remaining = self.cursor.remaining();
            if len > remaining as u64 {
                return Err(EsmError::CorruptLength {
                    record: self.record,
                    tag,
                    declared: len,
                    remaining,
                });
            }
            let payload = self.cursor.read_bytes(len as usize)?;
            tracing::trace!(record = %self.record, subrecord = %tag, len, "subrecord");
            return Ok(Some(Subrecord {
                tag,
                payload,
                offset,
            }));
        }
    }

    /// Decode the next subrecord and require it to carry `tag`.
    pub fn expect(&mut self, tag: Tag) -> Result<Subrecord<'a>> {
        match self.next_subrecord()? {
            Some(sub) if sub.tag == tag => Ok(sub),
            Some(sub) => Err(EsmError::UnexpectedTag {
                context: self.record,
                expected: Some(tag),
                found: sub.tag,
            }),
            None => Err(EsmError::MissingRequiredField {
                record: self.record,
                tag,
            }),
        }
    }

    fn read_header(&mut self, wide_len: Option<u32>) -> Result<(Tag, u64)> {
        let header_len = self.generation.subrecord_header_len();
        let remaining = self.cursor.remaining();
        if remaining < header_len {
            // A dangling escape is reported against XXXX itself
            if wide_len.is_some() {
                return Err(EsmError::CorruptLength {
                    record: self.record,
                    tag: tags::XXXX,
                    declared: header_len as u64,
                    remaining,
                });
            }
            return Err(EsmError::TruncatedRecord {
                record: self.record,
                declared: header_len as u64,
                available: remaining as u64,
            });
        }

        let tag = self.cursor.read_tag()?;
        let len = match self.generation {
            Generation::Tes3 => u64::from(self.cursor.read_u32()?),
            Generation::Tes4 => u64::from(self.cursor.read_u16()?),
        };
        Ok((tag, len))
    }

    fn read_escape(&mut self, narrow_len: u64, previous: Option<u32>) -> Result<u32> {
        if previous.is_some() {
            return Err(EsmError::InvalidValue {
                tag: tags::XXXX,
                reason: "two consecutive length escapes".into(),
            });
        }
        if narrow_len != 4 {
            return Err(EsmError::FieldLength {
                tag: tags::XXXX,
                expected: 4,
                found: narrow_len as usize,
            });
        }
        let remaining = self.cursor.remaining();
        if remaining < 4 {
            return Err(EsmError::CorruptLength {
                record: self.record,
                tag: tags::XXXX,
                declared: 4,
                remaining,
            });
        }
        let value = self.cursor.read_u32()?;
        if value == 0 {
            return Err(EsmError::InvalidValue {
                tag: tags::XXXX,
                reason: "extended length of zero".into(),
            });
        }
        Ok(value)
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Writes subrecords for one generation, counting bytes produced.
pub struct SubrecordWriter<'w> {
    out: ByteWriter<'w>,
    generation: Generation,
}

impl<'w> SubrecordWriter<'w> {
    pub fn new(out: &'w mut dyn Write, generation: Generation) -> Self {
        Self {
            out: ByteWriter::new(out),
            generation,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Total bytes written, escapes included.
    pub fn written(&self) -> u64 {
        self.out.written()
    }

    /// Write a subrecord header for a payload of `len` bytes.
    ///
    /// Emits the `XXXX` escape first when the length does not fit the
    /// narrow field.
    pub fn write_header(&mut self, tag: Tag, len: usize) -> Result<()> {
        let wide = u32::try_from(len).map_err(|_| EsmError::OversizedField {
            tag,
            len,
            max: u32::MAX as usize,
        })?;

        match self.generation {
            Generation::Tes3 => {
                self.out.write_tag(tag)?;
                self.out.write_u32(wide)
            }
            Generation::Tes4 => match u16::try_from(len) {
                Ok(narrow) => {
                    self.out.write_tag(tag)?;
                    self.out.write_u16(narrow)
                }
                Err(_) => {
                    tracing::trace!(subrecord = %tag, len, "writing length escape");
                    self.out.write_tag(tags::XXXX)?;
                    self.out.write_u16(4)?;
                    self.out.write_u32(wide)?;
                    self.out.write_tag(tag)?;
                    self.out.write_u16(0)
                }
            },
        }
    }

    /// Write a complete subrecord from raw payload bytes.
    pub fn write_raw(&mut self, tag: Tag, payload: &[u8]) -> Result<()> {
        self.write_header(tag, payload.len())?;
        self.out.write_bytes(payload)
    }

    /// Write a complete subrecord for a typed value.
    pub fn put<V: FieldValue>(&mut self, tag: Tag, value: &V) -> Result<()> {
        value.check(tag)?;
        self.write_header(tag, value.payload_len())?;
        let before = self.out.written();
        value.write_payload(&mut self.out)?;
        debug_assert_eq!(
            (self.out.written() - before) as usize,
            value.payload_len(),
            "payload_len disagrees with bytes written for {tag}"
        );
        Ok(())
    }

    /// Access the underlying byte writer for payload bytes.
    pub fn bytes(&mut self) -> &mut ByteWriter<'w> {
        &mut self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: Tag = tags::NAME;

    fn collect(body: &[u8], generation: Generation) -> Result<Vec<(Tag, Vec<u8>)>> {
        let mut reader = SubrecordReader::new(body, tags::WRLD, generation);
        let mut out = Vec::new();
        while let Some(sub) = reader.next_subrecord()? {
            out.push((sub.tag, sub.payload.to_vec()));
        }
        Ok(out)
    }

    #[test]
    fn test_tes3_length_width() {
        let body = b"NAME\x04\0\0\0abc\0FNAM\x01\0\0\0s";
        let subs = collect(body, Generation::Tes3).unwrap();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0], (NAME, b"abc\0".to_vec()));
        assert_eq!(subs[1], (tags::FNAM, b"s".to_vec()));
    }

    #[test]
    fn test_tes4_length_width() {
        let body = b"EDID\x04\0abc\0FNAM\x01\0s";
        let subs = collect(body, Generation::Tes4).unwrap();
        assert_eq!(subs[0], (tags::EDID, b"abc\0".to_vec()));
        assert_eq!(subs[1], (tags::FNAM, b"s".to_vec()));
    }

    #[test]
    fn test_overrun_is_corrupt_length() {
        let body = b"EDID\x10\0abc\0";
        let err = collect(body, Generation::Tes4).unwrap_err();
        assert!(matches!(
            err,
            EsmError::CorruptLength {
                tag,
                declared: 16,
                remaining: 4,
                ..
            } if tag == tags::EDID
        ));
    }

    #[test]
    fn test_partial_header_is_truncated() {
        let body = b"EDID\x01\0xED";
        let err = collect(body, Generation::Tes4).unwrap_err();
        assert!(matches!(
            err,
            EsmError::TruncatedRecord {
                declared: 6,
                available: 2,
                ..
            }
        ));

        // Fewer than four trailing bytes, not even a tag
        let body = b"NAME\x01\0\0\0xNA";
        let err = collect(body, Generation::Tes3).unwrap_err();
        assert!(matches!(
            err,
            EsmError::TruncatedRecord {
                declared: 8,
                available: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_escape_overrides_narrow_length() {
        let mut body = Vec::new();
        body.extend_from_slice(b"XXXX\x04\0");
        body.extend_from_slice(&5u32.to_le_bytes());
        body.extend_from_slice(b"OFST\0\0hello");
        let subs = collect(&body, Generation::Tes4).unwrap();
        assert_eq!(subs, vec![(tags::OFST, b"hello".to_vec())]);
    }

    #[test]
    fn test_escape_is_plain_data_in_tes3() {
        let mut body = Vec::new();
        body.extend_from_slice(b"XXXX\x04\0\0\0");
        body.extend_from_slice(&5u32.to_le_bytes());
        let subs = collect(&body, Generation::Tes3).unwrap();
        assert_eq!(subs[0].0, tags::XXXX);
    }

    #[test]
    fn test_double_escape_rejected() {
        let mut body = Vec::new();
        for _ in 0..2 {
            body.extend_from_slice(b"XXXX\x04\0");
            body.extend_from_slice(&5u32.to_le_bytes());
        }
        body.extend_from_slice(b"OFST\0\0hello");
        assert!(matches!(
            collect(&body, Generation::Tes4),
            Err(EsmError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_dangling_escape() {
        let mut body = Vec::new();
        body.extend_from_slice(b"XXXX\x04\0");
        body.extend_from_slice(&5u32.to_le_bytes());
        let err = collect(&body, Generation::Tes4).unwrap_err();
        assert!(matches!(err, EsmError::CorruptLength { tag, .. } if tag == tags::XXXX));
    }

    #[test]
    fn test_expect() {
        let body = b"EDID\x02\0a\0";
        let mut reader = SubrecordReader::new(body, tags::GLOB, Generation::Tes4);
        assert!(matches!(
            reader.expect(tags::FNAM),
            Err(EsmError::UnexpectedTag { found, .. }) if found == tags::EDID
        ));
        assert!(matches!(
            reader.expect(tags::FNAM),
            Err(EsmError::MissingRequiredField { .. })
        ));
    }

    #[test]
    fn test_write_escape_for_large_payload() {
        let payload = vec![0xAB; 70_000];
        let mut out = Vec::new();
        let mut writer = SubrecordWriter::new(&mut out, Generation::Tes4);
        writer.write_raw(tags::OFST, &payload).unwrap();
        assert_eq!(writer.written() as usize, subrecord_size(Generation::Tes4, 70_000));
        assert_eq!(out.len(), 10 + 6 + 70_000);
        assert_eq!(&out[..10], b"XXXX\x04\0\x70\x11\x01\0");
        assert_eq!(&out[10..16], b"OFST\0\0");

        let subs = collect(&out, Generation::Tes4).unwrap();
        assert_eq!(subs, vec![(tags::OFST, payload)]);
    }

    #[test]
    fn test_no_escape_at_narrow_limit() {
        assert_eq!(subrecord_size(Generation::Tes4, 65_535), 6 + 65_535);
        assert_eq!(subrecord_size(Generation::Tes4, 65_536), 16 + 65_536);
        assert_eq!(subrecord_size(Generation::Tes3, 70_000), 8 + 70_000);
    }
}
