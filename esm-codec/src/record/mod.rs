//! Record codec
//!
//! Decoding reads the header, pulls exactly the declared number of body
//! bytes, then runs the record type's [`Schema`] over them. Encoding
//! computes the body size from the schema first, writes the header, then
//! the subrecords in table order.

mod generic;
mod header;

#[cfg(test)]
mod tests;

pub use generic::{GenericRecord, RawSubrecord};
pub use header::{
    FLAG_COMPRESSED, FLAG_DELETED, FLAG_IGNORED, FLAG_LOCALIZED, FLAG_MASTER, RecordHeader,
};

use std::any::Any;
use std::fmt;
use std::io::Write;

use crate::config::CodecConfig;
use crate::context::DecodeContext;
use crate::cursor::StreamReader;
use crate::error::{EsmError, Result};
use crate::field::Schema;
use crate::generation::Generation;
use crate::subrecord::{SubrecordReader, SubrecordWriter};
use crate::tag::Tag;

/// A record type described by a static field table.
pub trait RecordSchema: Default + fmt::Debug + Send + Sync + 'static {
    const TAG: Tag;
    const GENERATION: Generation;

    fn schema() -> &'static Schema<Self>;

    /// Value-level checks run after a successful subrecord loop and before
    /// anything is encoded.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Decoded contents of a record body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordBody<B> {
    Fields(B),
    /// Raw body of a deleted or compressed record, re-encoded unchanged
    Verbatim(Vec<u8>),
}

/// One record: its header plus typed fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<B> {
    pub header: RecordHeader,
    pub body: RecordBody<B>,
}

impl<B: RecordSchema> Record<B> {
    /// New record with an all-zero header.
    pub fn new(fields: B) -> Self {
        Self {
            header: RecordHeader::new(B::GENERATION),
            body: RecordBody::Fields(fields),
        }
    }

    pub fn fields(&self) -> Option<&B> {
        match &self.body {
            RecordBody::Fields(fields) => Some(fields),
            RecordBody::Verbatim(_) => None,
        }
    }

    pub fn fields_mut(&mut self) -> Option<&mut B> {
        match &mut self.body {
            RecordBody::Fields(fields) => Some(fields),
            RecordBody::Verbatim(_) => None,
        }
    }

    /// Decode a record, starting at its tag.
    pub fn decode(reader: &mut StreamReader<'_>, ctx: &DecodeContext<'_>) -> Result<Self> {
        let tag = reader.read_tag()?;
        if tag != B::TAG {
            return Err(EsmError::UnexpectedTag {
                context: B::TAG,
                expected: Some(B::TAG),
                found: tag,
            });
        }
        Self::decode_after_tag(reader, ctx)
    }

    /// Decode a record whose tag has already been consumed.
    pub fn decode_after_tag(reader: &mut StreamReader<'_>, ctx: &DecodeContext<'_>) -> Result<Self> {
        let start = reader.position().saturating_sub(4);
        let (size, header) = RecordHeader::read(B::GENERATION, reader)?;
        let body = read_body(reader, B::TAG, size, ctx.config)?;

        if header.is_opaque() {
            log_opaque(B::TAG, &header, size);
            return Ok(Self {
                header,
                body: RecordBody::Verbatim(body),
            });
        }

        let base = start + B::GENERATION.record_header_len() as u64;
        let mut subrecords = SubrecordReader::with_base(&body, B::TAG, B::GENERATION, base);
        let mut fields = B::default();
        B::schema().decode_body(
            &mut fields,
            &mut subrecords,
            &ctx.for_record(B::TAG, B::GENERATION),
        )?;
        fields.validate()?;

        tracing::debug!(record = %B::TAG, size, "decoded record");
        Ok(Self {
            header,
            body: RecordBody::Fields(fields),
        })
    }

    /// Decode a record from an in-memory buffer.
    pub fn from_bytes(bytes: &[u8], ctx: &DecodeContext<'_>) -> Result<Self> {
        let mut source = bytes;
        Self::decode(&mut StreamReader::new(&mut source), ctx)
    }

    /// Size of the body as it will be written.
    pub fn body_size(&self) -> Result<u32> {
        let size = match &self.body {
            RecordBody::Fields(fields) => B::schema().body_size(fields),
            RecordBody::Verbatim(raw) => raw.len(),
        };
        checked_size(B::TAG, size)
    }

    /// Header plus body, as written.
    pub fn total_written_size(&self) -> Result<u32> {
        total_size(B::TAG, B::GENERATION, self.body_size()?)
    }

    pub fn encode(&self, out: &mut dyn Write) -> Result<()> {
        if self.header.generation() != B::GENERATION {
            return Err(EsmError::InvalidValue {
                tag: B::TAG,
                reason: "header layout does not match the record type".into(),
            });
        }
        if let RecordBody::Fields(fields) = &self.body {
            fields.validate()?;
        }
        let size = self.body_size()?;
        let mut writer = SubrecordWriter::new(out, B::GENERATION);
        self.header.write(writer.bytes(), B::TAG, size)?;
        match &self.body {
            RecordBody::Fields(fields) => B::schema().encode_body(fields, &mut writer)?,
            RecordBody::Verbatim(raw) => writer.bytes().write_bytes(raw)?,
        }
        debug_assert_eq!(
            writer.written(),
            (B::GENERATION.record_header_len() as u64) + u64::from(size)
        );
        tracing::debug!(record = %B::TAG, size, "encoded record");
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.total_written_size()? as usize);
        self.encode(&mut out)?;
        Ok(out)
    }
}

/// Read a record body of `size` bytes, enforcing the configured bound.
pub(crate) fn read_body(
    reader: &mut StreamReader<'_>,
    tag: Tag,
    size: u32,
    config: &CodecConfig,
) -> Result<Vec<u8>> {
    if u64::from(size) > config.max_record_size {
        return Err(EsmError::RecordTooLarge {
            record: tag,
            size: u64::from(size),
            max: config.max_record_size,
        });
    }
    let (body, got) = reader.read_body(size as usize)?;
    if got < size as usize {
        return Err(EsmError::TruncatedRecord {
            record: tag,
            declared: u64::from(size),
            available: got as u64,
        });
    }
    Ok(body)
}

/// Consume a record whose tag has already been read, without decoding it.
///
/// Returns the body size that was skipped.
pub fn skip_record(tag: Tag, generation: Generation, reader: &mut StreamReader<'_>) -> Result<u32> {
    let (size, _) = RecordHeader::read(generation, reader)?;
    let skipped = reader.skip(u64::from(size))?;
    if skipped < u64::from(size) {
        return Err(EsmError::TruncatedRecord {
            record: tag,
            declared: u64::from(size),
            available: skipped,
        });
    }
    tracing::debug!(record = %tag, size, "skipped record");
    Ok(size)
}

pub(crate) fn log_opaque(tag: Tag, header: &RecordHeader, size: u32) {
    if header.is_compressed() {
        tracing::warn!(record = %tag, size, "compressed record kept verbatim");
    } else {
        tracing::debug!(record = %tag, size, "deleted record kept verbatim");
    }
}

pub(crate) fn checked_size(tag: Tag, size: usize) -> Result<u32> {
    u32::try_from(size).map_err(|_| EsmError::RecordTooLarge {
        record: tag,
        size: size as u64,
        max: u64::from(u32::MAX),
    })
}

pub(crate) fn total_size(tag: Tag, generation: Generation, body: u32) -> Result<u32> {
    let header = generation.record_header_len() as u32;
    body.checked_add(header).ok_or(EsmError::RecordTooLarge {
        record: tag,
        size: u64::from(body) + u64::from(header),
        max: u64::from(u32::MAX),
    })
}

// =============================================================================
// Type-erased records
// =============================================================================

/// Object-safe view of any record, used by groups and plugin containers.
pub trait AnyRecord: fmt::Debug + Send + Sync {
    fn tag(&self) -> Tag;

    fn header(&self) -> &RecordHeader;

    fn header_mut(&mut self) -> &mut RecordHeader;

    fn total_written_size(&self) -> Result<u32>;

    fn encode(&self, out: &mut dyn Write) -> Result<()>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<'r> dyn AnyRecord + 'r {
    pub fn downcast_ref<T: AnyRecord + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    pub fn downcast_mut<T: AnyRecord + 'static>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut()
    }

    /// Typed fields, if this is a decoded `Record<B>`.
    pub fn fields<B: RecordSchema>(&self) -> Option<&B> {
        self.downcast_ref::<Record<B>>()?.fields()
    }
}

impl<B: RecordSchema> AnyRecord for Record<B> {
    fn tag(&self) -> Tag {
        B::TAG
    }

    fn header(&self) -> &RecordHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut RecordHeader {
        &mut self.header
    }

    fn total_written_size(&self) -> Result<u32> {
        Record::total_written_size(self)
    }

    fn encode(&self, out: &mut dyn Write) -> Result<()> {
        Record::encode(self, out)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
