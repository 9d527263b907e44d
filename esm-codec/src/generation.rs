//! File format generations

/// The two sibling plugin formats.
///
/// TES3 files (Morrowind) use 4-byte subrecord lengths and 16-byte record
/// headers. TES4-style files (Oblivion onwards, Skyrim here) use 2-byte
/// subrecord lengths, 24-byte record headers and hierarchical groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Generation {
    Tes3,
    Tes4,
}

impl Generation {
    /// Width of a subrecord length field in bytes.
    pub const fn length_width(self) -> usize {
        match self {
            Self::Tes3 => 4,
            Self::Tes4 => 2,
        }
    }

    /// Size of a subrecord header (tag + length).
    pub const fn subrecord_header_len(self) -> usize {
        4 + self.length_width()
    }

    /// Size of a full record header, including tag and size.
    pub const fn record_header_len(self) -> usize {
        match self {
            Self::Tes3 => 16,
            Self::Tes4 => 24,
        }
    }

    /// Largest payload that fits the narrow length field.
    pub const fn max_narrow_len(self) -> u64 {
        match self {
            Self::Tes3 => u32::MAX as u64,
            Self::Tes4 => u16::MAX as u64,
        }
    }

    /// Whether the `XXXX` extended-length escape is part of this format.
    pub const fn has_length_escape(self) -> bool {
        matches!(self, Self::Tes4)
    }

    /// Whether records can be nested in groups.
    pub const fn has_groups(self) -> bool {
        matches!(self, Self::Tes4)
    }
}
