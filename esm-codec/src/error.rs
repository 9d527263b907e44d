//! Error types for record decoding and encoding

use std::io;
use std::path::PathBuf;

use crate::tag::Tag;

/// Errors that can occur while reading or writing plugin data
#[derive(Debug, thiserror::Error)]
pub enum EsmError {
    /// The input cannot supply the requested number of bytes
    #[error("truncated input at offset {offset}: need {need} bytes, have {have}")]
    TruncatedInput {
        offset: u64,
        need: usize,
        have: usize,
    },

    /// A tag that is not allowed at this position
    #[error("unexpected tag {found} in {context}{}", expected_suffix(.expected))]
    UnexpectedTag {
        context: Tag,
        expected: Option<Tag>,
        found: Tag,
    },

    /// Declared length is above the format's cap for this field
    #[error("subrecord {tag} is {len} bytes long, the limit is {max}")]
    OversizedField { tag: Tag, len: usize, max: usize },

    /// A non-repeatable subrecord occurred twice
    #[error("record {record} has more than one {tag} subrecord")]
    DuplicateSubrecord { record: Tag, tag: Tag },

    /// A required subrecord never occurred
    #[error("record {record} is missing required subrecord {tag}")]
    MissingRequiredField { record: Tag, tag: Tag },

    /// A subrecord would run past the end of its record
    #[error(
        "subrecord {tag} of {record} declares {declared} bytes but only {remaining} remain in the record"
    )]
    CorruptLength {
        record: Tag,
        tag: Tag,
        declared: u64,
        remaining: usize,
    },

    /// The stream ended inside a record or group body
    #[error("{record} declares {declared} bytes but the stream ended after {available}")]
    TruncatedRecord {
        record: Tag,
        declared: u64,
        available: u64,
    },

    /// A localized string index is not present in the string table
    #[error("string index 0x{index:08X} of {tag} is not in the string table")]
    UnresolvedStringIndex { tag: Tag, index: u32 },

    /// A fixed-shape payload has the wrong size
    #[error("subrecord {tag} has invalid length {found} (expected {expected})")]
    FieldLength {
        tag: Tag,
        expected: usize,
        found: usize,
    },

    /// Payload has a legal size but an illegal value
    #[error("subrecord {tag} has an invalid value: {reason}")]
    InvalidValue { tag: Tag, reason: String },

    /// Declared record size is above the configured bound
    #[error("record {record} declares {size} bytes, the configured limit is {max}")]
    RecordTooLarge { record: Tag, size: u64, max: u64 },

    /// The string table files for a localized plugin are incomplete
    #[error("expected three string table files for {}, found {found}", .plugin.display())]
    StringTableFiles { plugin: PathBuf, found: usize },

    /// IO error from the underlying source or sink
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration file could not be parsed
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

fn expected_suffix(expected: &Option<Tag>) -> String {
    match expected {
        Some(tag) => format!(" (expected {tag})"),
        None => String::new(),
    }
}

/// Result alias used throughout the codec
pub type Result<T> = std::result::Result<T, EsmError>;
