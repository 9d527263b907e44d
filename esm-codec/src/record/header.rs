//! Record headers for both generations

use crate::cursor::{ByteWriter, StreamReader};
use crate::error::Result;
use crate::generation::Generation;
use crate::tag::Tag;

// =============================================================================
// Flag bits
// =============================================================================

/// File header: plugin is a master file
pub const FLAG_MASTER: u32 = 0x0000_0001;
/// Record is deleted
pub const FLAG_DELETED: u32 = 0x0000_0020;
/// File header: string fields are string table indices
pub const FLAG_LOCALIZED: u32 = 0x0000_0080;
/// Record should be ignored by the game
pub const FLAG_IGNORED: u32 = 0x0000_1000;
/// Record body is zlib-compressed (TES4 only)
pub const FLAG_COMPRESSED: u32 = 0x0004_0000;

/// Header fields that follow the tag and size.
///
/// TES3 layout: `[tag][size][unknown u32][flags u32]`.
/// TES4 layout: `[tag][size][flags u32][form id u32][revision u32][version u16][reserved u16]`.
/// The size is not stored here; it is always derived from the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordHeader {
    Tes3 {
        unknown: u32,
        flags: u32,
    },
    Tes4 {
        flags: u32,
        form_id: u32,
        revision: u32,
        version: u16,
        reserved: u16,
    },
}

impl RecordHeader {
    /// All-zero header for a new record.
    pub fn new(generation: Generation) -> Self {
        match generation {
            Generation::Tes3 => Self::Tes3 {
                unknown: 0,
                flags: 0,
            },
            Generation::Tes4 => Self::Tes4 {
                flags: 0,
                form_id: 0,
                revision: 0,
                version: 0,
                reserved: 0,
            },
        }
    }

    pub fn generation(&self) -> Generation {
        match self {
            Self::Tes3 { .. } => Generation::Tes3,
            Self::Tes4 { .. } => Generation::Tes4,
        }
    }

    pub fn flags(&self) -> u32 {
        match *self {
            Self::Tes3 { flags, .. } | Self::Tes4 { flags, .. } => flags,
        }
    }

    pub fn set_flags(&mut self, value: u32) {
        match self {
            Self::Tes3 { flags, .. } | Self::Tes4 { flags, .. } => *flags = value,
        }
    }

    pub fn set_flag(&mut self, flag: u32, on: bool) {
        let flags = self.flags();
        self.set_flags(if on { flags | flag } else { flags & !flag });
    }

    /// Form id, TES4 only.
    pub fn form_id(&self) -> Option<u32> {
        match *self {
            Self::Tes3 { .. } => None,
            Self::Tes4 { form_id, .. } => Some(form_id),
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.flags() & FLAG_DELETED != 0
    }

    /// File header flag: the plugin is a master file.
    pub fn is_master(&self) -> bool {
        self.flags() & FLAG_MASTER != 0
    }

    /// File header flag: string fields hold string table indices.
    pub fn is_localized(&self) -> bool {
        self.flags() & FLAG_LOCALIZED != 0
    }

    pub fn is_ignored(&self) -> bool {
        self.flags() & FLAG_IGNORED != 0
    }

    /// Compression only exists in TES4 files; the bit means something else in TES3.
    pub fn is_compressed(&self) -> bool {
        matches!(self, Self::Tes4 { flags, .. } if flags & FLAG_COMPRESSED != 0)
    }

    /// Whether the body must be kept as raw bytes rather than decoded.
    pub fn is_opaque(&self) -> bool {
        self.is_deleted() || self.is_compressed()
    }

    /// Read the size and header fields that follow an already-read tag.
    ///
    /// Returns the declared body size and the header.
    pub fn read(generation: Generation, reader: &mut StreamReader<'_>) -> Result<(u32, Self)> {
        let size = reader.read_u32()?;
        let header = match generation {
            Generation::Tes3 => Self::Tes3 {
                unknown: reader.read_u32()?,
                flags: reader.read_u32()?,
            },
            Generation::Tes4 => Self::Tes4 {
                flags: reader.read_u32()?,
                form_id: reader.read_u32()?,
                revision: reader.read_u32()?,
                version: reader.read_u16()?,
                reserved: reader.read_u16()?,
            },
        };
        Ok((size, header))
    }

    /// Write tag, size and header fields.
    pub fn write(&self, out: &mut ByteWriter<'_>, tag: Tag, size: u32) -> Result<()> {
        out.write_tag(tag)?;
        out.write_u32(size)?;
        match *self {
            Self::Tes3 { unknown, flags } => {
                out.write_u32(unknown)?;
                out.write_u32(flags)
            }
            Self::Tes4 {
                flags,
                form_id,
                revision,
                version,
                reserved,
            } => {
                out.write_u32(flags)?;
                out.write_u32(form_id)?;
                out.write_u32(revision)?;
                out.write_u16(version)?;
                out.write_u16(reserved)
            }
        }
    }
}
