//! Strings that are either inline or string table references
//!
//! In a localized plugin (file header flag `0x80`) fields such as `FULL`
//! hold a 4-byte index into the plugin's string tables instead of text.
//! The decoded value remembers which form it came from so that encoding
//! never switches representation behind the caller's back.

use std::borrow::Cow;

use crate::cursor::ByteWriter;
use crate::error::{EsmError, Result};
use crate::field::{FieldContext, FieldValue, ZString, exact};
use crate::tag::Tag;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalizedString {
    /// Text stored in the plugin itself
    Inline(ZString),
    /// Index into the string tables, with the text it resolved to
    Indexed { index: u32, text: String },
}

impl LocalizedString {
    pub fn inline(text: &str) -> Self {
        Self::Inline(ZString::new(text))
    }

    pub fn indexed(index: u32, text: impl Into<String>) -> Self {
        Self::Indexed {
            index,
            text: text.into(),
        }
    }

    /// Resolved text, whichever form the value has.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Self::Inline(s) => s.text(),
            Self::Indexed { text, .. } => Cow::Borrowed(text),
        }
    }

    /// String table index, if this value is a reference.
    pub fn index(&self) -> Option<u32> {
        match self {
            Self::Inline(_) => None,
            Self::Indexed { index, .. } => Some(*index),
        }
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self, Self::Indexed { .. })
    }
}

impl FieldValue for LocalizedString {
    fn decode(tag: Tag, payload: &[u8], ctx: &FieldContext<'_>) -> Result<Self> {
        if !ctx.localized {
            return Ok(Self::Inline(ZString::decode(tag, payload, ctx)?));
        }

        let index = u32::from_le_bytes(exact(tag, payload)?);
        // Index zero is the empty string and never appears in a table
        if index == 0 {
            return Ok(Self::indexed(0, String::new()));
        }
        let text = ctx
            .strings
            .resolve(index)
            .ok_or(EsmError::UnresolvedStringIndex { tag, index })?;
        Ok(Self::indexed(index, text))
    }

    fn payload_len(&self) -> usize {
        match self {
            Self::Inline(s) => s.payload_len(),
            Self::Indexed { .. } => 4,
        }
    }

    fn write_payload(&self, out: &mut ByteWriter<'_>) -> Result<()> {
        match self {
            Self::Inline(s) => s.write_payload(out),
            Self::Indexed { index, .. } => out.write_u32(*index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodecConfig;
    use crate::generation::Generation;
    use crate::strings::StringTable;
    use crate::subrecord::{SubrecordReader, SubrecordWriter};
    use crate::tag::tags;

    fn context<'c>(localized: bool, table: &'c StringTable, config: &'c CodecConfig) -> FieldContext<'c> {
        FieldContext {
            record: tags::ACTI,
            generation: Generation::Tes4,
            localized,
            strings: table,
            config,
        }
    }

    fn decode(data: &[u8], ctx: &FieldContext<'_>) -> Result<LocalizedString> {
        let mut reader = SubrecordReader::new(data, tags::ACTI, Generation::Tes4);
        let sub = reader.next_subrecord()?.expect("one subrecord");
        LocalizedString::decode(sub.tag, sub.payload, ctx)
    }

    fn encode(tag: Tag, value: &LocalizedString) -> Vec<u8> {
        let mut out = Vec::new();
        SubrecordWriter::new(&mut out, Generation::Tes4)
            .put(tag, value)
            .unwrap();
        out
    }

    #[test]
    fn test_indexed_roundtrip() {
        let config = CodecConfig::default();
        let mut table = StringTable::new();
        table.insert(0x0001_267C, "foo bar");
        let ctx = context(true, &table, &config);

        let data = b"FULL\x04\0\x7c\x26\x01\0";
        let value = decode(data, &ctx).unwrap();
        assert_eq!(value.index(), Some(0x0001_267C));
        assert_eq!(value.text(), "foo bar");
        assert_eq!(value.payload_len(), 4);
        assert_eq!(encode(tags::FULL, &value), data);
    }

    #[test]
    fn test_index_zero_is_empty() {
        let config = CodecConfig::default();
        let table = StringTable::new();
        let ctx = context(true, &table, &config);

        let data = b"RNAM\x04\0\0\0\0\0";
        let value = decode(data, &ctx).unwrap();
        assert_eq!(value, LocalizedString::indexed(0, ""));
        assert_eq!(encode(tags::RNAM, &value), data);
    }

    #[test]
    fn test_unresolved_index() {
        let config = CodecConfig::default();
        let table = StringTable::new();
        let ctx = context(true, &table, &config);

        let err = decode(b"FULL\x04\0\x7c\x34\x02\x01", &ctx).unwrap_err();
        assert!(matches!(
            err,
            EsmError::UnresolvedStringIndex { index: 0x0102_347C, .. }
        ));
    }

    #[test]
    fn test_localized_requires_four_bytes() {
        let config = CodecConfig::default();
        let table = StringTable::new();
        let ctx = context(true, &table, &config);

        let err = decode(b"FULL\x03\0ab\0", &ctx).unwrap_err();
        assert!(matches!(err, EsmError::FieldLength { expected: 4, found: 3, .. }));
    }

    #[test]
    fn test_inline_roundtrip() {
        let config = CodecConfig::default();
        let table = StringTable::new();
        let ctx = context(false, &table, &config);

        let data = b"FULL\x0A\0foo bar 3\0";
        let value = decode(data, &ctx).unwrap();
        assert!(!value.is_indexed());
        assert_eq!(value.text(), "foo bar 3");
        assert_eq!(value.payload_len(), 10);
        assert_eq!(encode(tags::FULL, &value), data);
    }

    #[test]
    fn test_inline_respects_cap() {
        let config = CodecConfig {
            tes4_max_string_len: 4,
            ..Default::default()
        };
        let table = StringTable::new();
        let ctx = context(false, &table, &config);

        let err = decode(b"FULL\x0A\0foo bar 3\0", &ctx).unwrap_err();
        assert!(matches!(err, EsmError::OversizedField { len: 10, max: 4, .. }));
    }
}
