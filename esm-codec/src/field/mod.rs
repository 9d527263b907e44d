//! Declarative field model
//!
//! Every record type is described by a [`Schema`]: an ordered table of
//! fields, each bound to one subrecord tag (or a run of tags for compound
//! values), a cardinality, and accessor functions into the record struct.
//! The record codec interprets the table; record types carry no decode or
//! encode code of their own.

mod compound;
mod schema;
mod value;


pub use compound::CompoundValue;
pub use schema::{Cardinality, FieldAccess, Schema, SchemaBuilder};
pub use value::{Blob, FixedString, FormIdList, ZString};

use crate::config::CodecConfig;
use crate::cursor::ByteWriter;
use crate::error::{EsmError, Result};
use crate::generation::Generation;
use crate::strings::StringResolver;
use crate::tag::Tag;

/// Everything a field decoder may consult besides its payload.
#[derive(Clone, Copy)]
pub struct FieldContext<'c> {
    /// Record being decoded
    pub record: Tag,
    pub generation: Generation,
    /// Whether string fields marked localized hold string table indices
    pub localized: bool,
    pub strings: &'c dyn StringResolver,
    pub config: &'c CodecConfig,
}

impl FieldContext<'_> {
    /// String length cap for this record's generation.
    pub fn max_string_len(&self) -> usize {
        self.config.max_string_len(self.generation)
    }
}

/// A value stored in exactly one subrecord payload.
pub trait FieldValue: Sized {
    /// Decode from a payload whose length is already bounded by the subrecord.
    fn decode(tag: Tag, payload: &[u8], ctx: &FieldContext<'_>) -> Result<Self>;

    /// Exact number of payload bytes [`write_payload`](Self::write_payload) produces.
    fn payload_len(&self) -> usize;

    fn write_payload(&self, out: &mut ByteWriter<'_>) -> Result<()>;

    /// Reject a value that would not decode again, before anything is written.
    fn check(&self, _tag: Tag) -> Result<()> {
        Ok(())
    }
}

/// Require a payload of exactly `N` bytes.
pub fn exact<const N: usize>(tag: Tag, payload: &[u8]) -> Result<[u8; N]> {
    payload.try_into().map_err(|_| EsmError::FieldLength {
        tag,
        expected: N,
        found: payload.len(),
    })
}
