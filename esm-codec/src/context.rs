//! Per-file decode settings

use crate::config::CodecConfig;
use crate::field::FieldContext;
use crate::generation::Generation;
use crate::strings::{NoStrings, StringResolver};
use crate::tag::Tag;

static NO_STRINGS: NoStrings = NoStrings;
static DEFAULT_CONFIG: CodecConfig = CodecConfig::DEFAULT;

/// What a record decoder needs to know about the file it reads from.
///
/// Built once per file by the loader, after the file header has been read
/// and, for localized files, after the string tables are loaded.
#[derive(Clone, Copy)]
pub struct DecodeContext<'c> {
    pub localized: bool,
    pub strings: &'c dyn StringResolver,
    pub config: &'c CodecConfig,
}

impl Default for DecodeContext<'static> {
    fn default() -> Self {
        Self::new(&DEFAULT_CONFIG)
    }
}

impl<'c> DecodeContext<'c> {
    /// Context for a non-localized file.
    pub fn new(config: &'c CodecConfig) -> Self {
        Self {
            localized: false,
            strings: &NO_STRINGS,
            config,
        }
    }

    /// Context for a localized file whose strings come from `strings`.
    pub fn localized(config: &'c CodecConfig, strings: &'c dyn StringResolver) -> Self {
        Self {
            localized: true,
            strings,
            config,
        }
    }

    pub fn for_record(&self, record: Tag, generation: Generation) -> FieldContext<'c> {
        FieldContext {
            record,
            generation,
            localized: self.localized,
            strings: self.strings,
            config: self.config,
        }
    }
}
