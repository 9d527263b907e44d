//! Records of types without a field table

use std::any::Any;
use std::borrow::Cow;
use std::io::Write;

use super::{AnyRecord, RecordBody, RecordHeader, checked_size, log_opaque, read_body, total_size};
use crate::context::DecodeContext;
use crate::cursor::StreamReader;
use crate::error::Result;
use crate::generation::Generation;
use crate::subrecord::{SubrecordReader, SubrecordWriter, subrecord_size};
use crate::tag::{Tag, tags};

/// One subrecord kept as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSubrecord {
    pub tag: Tag,
    pub payload: Vec<u8>,
}

/// A record of any type, kept as an ordered list of raw subrecords.
///
/// Length escapes are consumed on decode and regenerated on encode, so a
/// generic record round-trips byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericRecord {
    pub tag: Tag,
    pub header: RecordHeader,
    pub body: RecordBody<Vec<RawSubrecord>>,
}

impl GenericRecord {
    pub fn new(tag: Tag, generation: Generation) -> Self {
        Self {
            tag,
            header: RecordHeader::new(generation),
            body: RecordBody::Fields(Vec::new()),
        }
    }

    pub fn generation(&self) -> Generation {
        self.header.generation()
    }

    /// Decode a record whose tag has already been consumed.
    pub fn decode_after_tag(
        tag: Tag,
        generation: Generation,
        reader: &mut StreamReader<'_>,
        ctx: &DecodeContext<'_>,
    ) -> Result<Self> {
        let start = reader.position().saturating_sub(4);
        let (size, header) = RecordHeader::read(generation, reader)?;
        let body = read_body(reader, tag, size, ctx.config)?;

        if header.is_opaque() {
            log_opaque(tag, &header, size);
            return Ok(Self {
                tag,
                header,
                body: RecordBody::Verbatim(body),
            });
        }

        let base = start + generation.record_header_len() as u64;
        let mut subrecords = SubrecordReader::with_base(&body, tag, generation, base);
        let mut fields = Vec::new();
        while let Some(sub) = subrecords.next_subrecord()? {
            fields.push(RawSubrecord {
                tag: sub.tag,
                payload: sub.payload.to_vec(),
            });
        }
        tracing::debug!(record = %tag, size, subrecords = fields.len(), "decoded generic record");

        Ok(Self {
            tag,
            header,
            body: RecordBody::Fields(fields),
        })
    }

    /// Subrecords in file order; empty for a verbatim body.
    pub fn subrecords(&self) -> &[RawSubrecord] {
        match &self.body {
            RecordBody::Fields(subs) => subs,
            RecordBody::Verbatim(_) => &[],
        }
    }

    pub fn first(&self, tag: Tag) -> Option<&RawSubrecord> {
        self.subrecords().iter().find(|sub| sub.tag == tag)
    }

    /// Editor id (`EDID` in TES4, `NAME` in TES3), if present.
    pub fn editor_id(&self) -> Option<Cow<'_, str>> {
        let tag = match self.generation() {
            Generation::Tes3 => tags::NAME,
            Generation::Tes4 => tags::EDID,
        };
        let payload = &self.first(tag)?.payload;
        let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
        Some(String::from_utf8_lossy(&payload[..end]))
    }

    pub fn body_size(&self) -> Result<u32> {
        let size = match &self.body {
            RecordBody::Fields(subs) => subs
                .iter()
                .map(|sub| subrecord_size(self.generation(), sub.payload.len()))
                .sum(),
            RecordBody::Verbatim(raw) => raw.len(),
        };
        checked_size(self.tag, size)
    }

    pub fn encode(&self, out: &mut dyn Write) -> Result<()> {
        let size = self.body_size()?;
        let mut writer = SubrecordWriter::new(out, self.generation());
        self.header.write(writer.bytes(), self.tag, size)?;
        match &self.body {
            RecordBody::Fields(subs) => {
                for sub in subs {
                    writer.write_raw(sub.tag, &sub.payload)?;
                }
            }
            RecordBody::Verbatim(raw) => writer.bytes().write_bytes(raw)?,
        }
        Ok(())
    }
}

impl AnyRecord for GenericRecord {
    fn tag(&self) -> Tag {
        self.tag
    }

    fn header(&self) -> &RecordHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut RecordHeader {
        &mut self.header
    }

    fn total_written_size(&self) -> Result<u32> {
        total_size(self.tag, self.generation(), self.body_size()?)
    }

    fn encode(&self, out: &mut dyn Write) -> Result<()> {
        GenericRecord::encode(self, out)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
