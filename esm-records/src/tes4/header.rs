//! `TES4` file header record

use std::sync::LazyLock;

use esm_codec::{
    ByteWriter, Cursor, EsmError, FieldContext, FieldValue, FormIdList, Generation, RecordSchema,
    Result, Schema, Tag, ZString, tags,
};

use crate::common::MasterFile;

/// `HEDR` payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaderData {
    pub version: f32,
    /// Records and groups in the file, the header itself excluded
    pub record_count: u32,
    /// Next free object id
    pub next_object_id: u32,
}

impl Default for HeaderData {
    fn default() -> Self {
        Self {
            version: 1.7,
            record_count: 0,
            next_object_id: 0x800,
        }
    }
}

impl FieldValue for HeaderData {
    fn decode(tag: Tag, payload: &[u8], _ctx: &FieldContext<'_>) -> Result<Self> {
        if payload.len() != 12 {
            return Err(EsmError::FieldLength {
                tag,
                expected: 12,
                found: payload.len(),
            });
        }
        let mut cursor = Cursor::new(payload);
        Ok(Self {
            version: cursor.read_f32()?,
            record_count: cursor.read_u32()?,
            next_object_id: cursor.read_u32()?,
        })
    }

    fn payload_len(&self) -> usize {
        12
    }

    fn write_payload(&self, out: &mut ByteWriter<'_>) -> Result<()> {
        out.write_f32(self.version)?;
        out.write_u32(self.record_count)?;
        out.write_u32(self.next_object_id)
    }
}

/// The first record of every TES4 plugin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileHeader {
    pub data: HeaderData,
    pub author: ZString,
    pub summary: Option<ZString>,
    pub masters: Vec<MasterFile>,
    /// Overridden references and navmeshes
    pub overrides: Option<FormIdList>,
    pub internal_version: u32,
    pub incc: Option<u32>,
}

impl RecordSchema for FileHeader {
    const TAG: Tag = tags::TES4;
    const GENERATION: Generation = Generation::Tes4;

    fn schema() -> &'static Schema<Self> {
        static SCHEMA: LazyLock<Schema<FileHeader>> = LazyLock::new(|| {
            Schema::<FileHeader>::builder(tags::TES4, Generation::Tes4)
                .required(tags::HEDR, |h| &h.data, |h| &mut h.data)
                .required(tags::CNAM, |h| &h.author, |h| &mut h.author)
                .optional(tags::SNAM, |h| &h.summary, |h| &mut h.summary)
                .repeated_compound(|h| &h.masters, |h| &mut h.masters)
                .optional(tags::ONAM, |h| &h.overrides, |h| &mut h.overrides)
                .required(tags::INTV, |h| &h.internal_version, |h| &mut h.internal_version)
                .optional(tags::INCC, |h| &h.incc, |h| &mut h.incc)
                .build()
        });
        &SCHEMA
    }

    fn validate(&self) -> Result<()> {
        if self.summary.as_ref().is_some_and(|s| s.raw().is_empty()) {
            return Err(EsmError::InvalidValue {
                tag: tags::SNAM,
                reason: "summary must not be empty".into(),
            });
        }
        if let Some(overrides) = &self.overrides {
            overrides.check(tags::ONAM)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use esm_codec::DecodeContext;

    #[test]
    fn test_header_data_len_checked() {
        let ctx = DecodeContext::default().for_record(tags::TES4, Generation::Tes4);
        let err = HeaderData::decode(tags::HEDR, &[0; 8], &ctx).unwrap_err();
        assert!(matches!(err, EsmError::FieldLength { expected: 12, found: 8, .. }));
    }

    #[test]
    fn test_empty_summary_rejected() {
        let header = FileHeader {
            summary: Some(ZString::from_raw(Vec::new())),
            ..Default::default()
        };
        assert!(header.validate().is_err());

        let header = FileHeader {
            summary: Some(ZString::new("")),
            ..Default::default()
        };
        assert!(header.validate().is_ok());
    }

    #[test]
    fn test_empty_overrides_rejected() {
        let header = FileHeader {
            overrides: Some(FormIdList(Vec::new())),
            ..Default::default()
        };
        assert!(matches!(
            header.validate(),
            Err(EsmError::InvalidValue { tag, .. }) if tag == tags::ONAM
        ));
    }
}
