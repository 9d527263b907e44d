//! esm-codec: tagged record/subrecord codec for TES3 and TES4 plugin files
//!
//! Plugin files (`.esm`, `.esp`) are sequences of records. Each record is a
//! header followed by tagged, length-prefixed subrecords. Two generations of
//! the layout exist:
//!
//! - **TES3**: 16-byte record headers, 4-byte subrecord lengths, no groups.
//! - **TES4**: 24-byte record headers, 2-byte subrecord lengths with the
//!   `XXXX` escape for larger payloads, and records nested in `GRUP` groups.
//!
//! Record types are described declaratively by a [`Schema`], an ordered
//! table of fields with their tag, cardinality and value shape. One codec
//! interprets every table, in both directions, so a record that was decoded
//! and not modified re-encodes byte for byte.
//!
//! # Usage
//!
//! ```ignore
//! use esm_codec::{DecodeContext, Record};
//!
//! let record = Record::<MyGlobal>::from_bytes(&bytes, &DecodeContext::default())?;
//! assert_eq!(record.to_bytes()?, bytes);
//! ```
//!
//! # Non-goals
//!
//! Compressed record bodies are not inflated. They are kept verbatim and
//! written back unchanged, as are deleted records.

mod config;
mod context;
mod cursor;
mod error;
mod field;
mod generation;
mod group;
mod localized;
mod record;
mod strings;
mod subrecord;
pub mod tag;

// =============================================================================
// Byte level
// =============================================================================

pub use cursor::{ByteWriter, Cursor, StreamReader};
pub use subrecord::{
    LENGTH_ESCAPE_SIZE, Subrecord, SubrecordReader, SubrecordWriter, subrecord_size,
};
pub use tag::{Tag, tags};

// =============================================================================
// Fields and records
// =============================================================================

pub use field::{
    Blob, Cardinality, CompoundValue, FieldAccess, FieldContext, FieldValue, FixedString,
    FormIdList, Schema, SchemaBuilder, ZString, exact,
};
pub use localized::LocalizedString;
pub use record::{
    AnyRecord, FLAG_COMPRESSED, FLAG_DELETED, FLAG_IGNORED, FLAG_LOCALIZED, FLAG_MASTER,
    GenericRecord, RawSubrecord, Record, RecordBody, RecordHeader, RecordSchema, skip_record,
};

// =============================================================================
// Containers and environment
// =============================================================================

pub use config::CodecConfig;
pub use context::DecodeContext;
pub use error::{EsmError, Result};
pub use generation::Generation;
pub use group::{
    GROUP_HEADER_SIZE, GenericDecoder, Group, GroupChild, GroupFilter, GroupHeader,
    RecordDecoder, TOP_LEVEL, all_groups,
};
pub use strings::{
    NoStrings, StringResolver, StringTable, StringTableKind, associated_table_files,
};
