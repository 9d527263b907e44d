//! `TES3` file header record

use std::sync::LazyLock;

use esm_codec::{
    ByteWriter, Cursor, EsmError, FieldContext, FieldValue, FixedString, Generation, RecordSchema,
    Result, Schema, Tag, tags,
};

use crate::common::MasterFile;

/// Payload size of `HEDR` in TES3 files.
pub const HEADER_DATA_LEN: usize = 300;

/// `HEDR` payload: format version, file type, author, description and
/// record count, in one fixed 300-byte struct.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaderData {
    pub version: f32,
    /// 1 for master files, 0 for plugins
    pub file_flag: u32,
    pub company: FixedString<32>,
    pub description: FixedString<256>,
    pub record_count: u32,
}

impl Default for HeaderData {
    fn default() -> Self {
        Self {
            version: 1.3,
            file_flag: 0,
            company: FixedString::default(),
            description: FixedString::default(),
            record_count: 0,
        }
    }
}

impl FieldValue for HeaderData {
    fn decode(tag: Tag, payload: &[u8], _ctx: &FieldContext<'_>) -> Result<Self> {
        if payload.len() != HEADER_DATA_LEN {
            return Err(EsmError::FieldLength {
                tag,
                expected: HEADER_DATA_LEN,
                found: payload.len(),
            });
        }
        let mut cursor = Cursor::new(payload);
        Ok(Self {
            version: cursor.read_f32()?,
            file_flag: cursor.read_u32()?,
            company: FixedString(cursor.read_array()?),
            description: FixedString(cursor.read_array()?),
            record_count: cursor.read_u32()?,
        })
    }

    fn payload_len(&self) -> usize {
        HEADER_DATA_LEN
    }

    fn write_payload(&self, out: &mut ByteWriter<'_>) -> Result<()> {
        out.write_f32(self.version)?;
        out.write_u32(self.file_flag)?;
        out.write_bytes(&self.company.0)?;
        out.write_bytes(&self.description.0)?;
        out.write_u32(self.record_count)
    }
}

/// The first record of every TES3 plugin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileHeader {
    pub data: HeaderData,
    pub masters: Vec<MasterFile>,
}

impl RecordSchema for FileHeader {
    const TAG: Tag = tags::TES3;
    const GENERATION: Generation = Generation::Tes3;

    fn schema() -> &'static Schema<Self> {
        static SCHEMA: LazyLock<Schema<FileHeader>> = LazyLock::new(|| {
            Schema::<FileHeader>::builder(tags::TES3, Generation::Tes3)
                .required(tags::HEDR, |h| &h.data, |h| &mut h.data)
                .repeated_compound(|h| &h.masters, |h| &mut h.masters)
                .build()
        });
        &SCHEMA
    }
}
