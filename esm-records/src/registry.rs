//! Tag to decoder lookup
//!
//! A [`Registry`] maps record tags of one generation to typed decoders.
//! Tags without an entry are kept as [`GenericRecord`]s, or skipped when
//! the configuration says so.

use hashbrown::HashMap;
use std::fmt;

use esm_codec::{
    AnyRecord, DecodeContext, Generation, GenericRecord, Record, RecordDecoder, RecordSchema,
    Result, StreamReader, Tag, skip_record,
};

use crate::{tes3, tes4};

/// Decodes one record whose tag has already been read.
pub type DecodeFn = fn(&mut StreamReader<'_>, &DecodeContext<'_>) -> Result<Box<dyn AnyRecord>>;

fn decode_typed<B: RecordSchema>(
    reader: &mut StreamReader<'_>,
    ctx: &DecodeContext<'_>,
) -> Result<Box<dyn AnyRecord>> {
    Ok(Box::new(Record::<B>::decode_after_tag(reader, ctx)?))
}

#[derive(Clone)]
pub struct Registry {
    generation: Generation,
    decoders: HashMap<Tag, DecodeFn>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.decoders.keys().collect();
        tags.sort();
        f.debug_struct("Registry")
            .field("generation", &self.generation)
            .field("tags", &tags)
            .finish()
    }
}

impl Registry {
    /// Empty registry: every record decodes as a [`GenericRecord`].
    pub fn new(generation: Generation) -> Self {
        Self {
            generation,
            decoders: HashMap::new(),
        }
    }

    /// All TES3 record types this crate knows.
    pub fn tes3() -> Self {
        let mut registry = Self::new(Generation::Tes3);
        registry.register::<tes3::Activator>();
        registry.register::<tes3::Global>();
        registry.register::<tes3::Sound>();
        registry
    }

    /// All TES4 record types this crate knows.
    pub fn tes4() -> Self {
        let mut registry = Self::new(Generation::Tes4);
        registry.register::<tes4::Activator>();
        registry.register::<tes4::Global>();
        registry.register::<tes4::Sound>();
        registry.register::<tes4::WorldSpace>();
        registry
    }

    /// Decode `B::TAG` records as `Record<B>`.
    ///
    /// # Panics
    ///
    /// Panics if `B` belongs to the other generation.
    pub fn register<B: RecordSchema>(&mut self) -> &mut Self {
        assert_eq!(
            B::GENERATION,
            self.generation,
            "record type {} registered in a {:?} registry",
            B::TAG,
            self.generation
        );
        self.decoders.insert(B::TAG, decode_typed::<B>);
        self
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.decoders.contains_key(&tag)
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

impl RecordDecoder for Registry {
    fn decode_record(
        &self,
        tag: Tag,
        reader: &mut StreamReader<'_>,
        ctx: &DecodeContext<'_>,
    ) -> Result<Option<Box<dyn AnyRecord>>> {
        if let Some(decode) = self.decoders.get(&tag) {
            return decode(reader, ctx).map(Some);
        }
        if ctx.config.keep_unknown_records {
            let record = GenericRecord::decode_after_tag(tag, self.generation, reader, ctx)?;
            return Ok(Some(Box::new(record)));
        }
        skip_record(tag, self.generation, reader)?;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use esm_codec::{CodecConfig, tags};

    fn decode(registry: &Registry, bytes: &[u8], config: &CodecConfig) -> Option<Box<dyn AnyRecord>> {
        let mut source = bytes;
        let mut reader = StreamReader::new(&mut source);
        let tag = reader.read_tag().unwrap();
        registry
            .decode_record(tag, &mut reader, &DecodeContext::new(config))
            .unwrap()
    }

    const GLOB: &[u8] = b"GLOB\x27\0\0\0\0\0\0\0\0\0\0\0NAME\x0A\0\0\0Timescale\0FNAM\x01\0\0\0fFLTV\x04\0\0\0\0\0\xF0\x41";
    const CLAS: &[u8] = b"CLAS\x0E\0\0\0\0\0\0\0\0\0\0\0NAME\x06\0\0\0Scout\0";

    #[test]
    fn test_registered_tag_is_typed() {
        let registry = Registry::tes3();
        let record = decode(&registry, GLOB, &CodecConfig::default()).unwrap();
        let global = record.fields::<tes3::Global>().unwrap();
        assert_eq!(global.id, "Timescale");
        assert_eq!(global.value, 30.0);
    }

    #[test]
    fn test_unknown_tag_is_generic() {
        let registry = Registry::tes3();
        let record = decode(&registry, CLAS, &CodecConfig::default()).unwrap();
        let generic = record.downcast_ref::<GenericRecord>().unwrap();
        assert_eq!(generic.tag, Tag::new(b"CLAS"));
        assert_eq!(generic.editor_id().unwrap(), "Scout");
    }

    #[test]
    fn test_unknown_tag_skipped() {
        let config = CodecConfig {
            keep_unknown_records: false,
            ..Default::default()
        };
        let registry = Registry::tes3();
        assert!(decode(&registry, CLAS, &config).is_none());
    }

    #[test]
    fn test_default_registries() {
        let registry = Registry::tes4();
        assert_eq!(registry.generation(), Generation::Tes4);
        assert!(registry.contains(tags::WRLD));
        assert!(registry.contains(tags::ACTI));
        assert!(!registry.contains(tags::TES4));
        assert_eq!(Registry::tes3().len(), 3);
    }

    #[test]
    #[should_panic(expected = "registered in a")]
    fn test_generation_mismatch_panics() {
        Registry::tes3().register::<tes4::Global>();
    }
}
