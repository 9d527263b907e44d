//! Four-character type tags

use std::fmt;

/// A four-byte record or subrecord type tag such as `GLOB` or `EDID`.
///
/// Tags are compared as raw bytes; the on-disk form is the same four bytes
/// in file order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub [u8; 4]);

impl Tag {
    /// Create a tag from a four-character byte literal.
    pub const fn new(bytes: &[u8; 4]) -> Self {
        Self(*bytes)
    }

    /// Raw bytes as written to disk.
    pub const fn bytes(self) -> [u8; 4] {
        self.0
    }

    /// Little-endian integer form, as older tooling compares tags.
    pub const fn as_u32(self) -> u32 {
        u32::from_le_bytes(self.0)
    }
}

impl From<[u8; 4]> for Tag {
    fn from(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02X}", b)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag(\"{}\")", self)
    }
}

// =============================================================================
// Well-known tags
// =============================================================================

/// Tags used by the container formats and the bundled schemas.
pub mod tags {
    use super::Tag;

    // Containers and escapes
    pub const GRUP: Tag = Tag::new(b"GRUP");
    pub const XXXX: Tag = Tag::new(b"XXXX");

    // File headers
    pub const TES3: Tag = Tag::new(b"TES3");
    pub const TES4: Tag = Tag::new(b"TES4");
    pub const HEDR: Tag = Tag::new(b"HEDR");
    pub const MAST: Tag = Tag::new(b"MAST");
    pub const ONAM: Tag = Tag::new(b"ONAM");
    pub const INTV: Tag = Tag::new(b"INTV");
    pub const INCC: Tag = Tag::new(b"INCC");

    // Record types
    pub const ACTI: Tag = Tag::new(b"ACTI");
    pub const GLOB: Tag = Tag::new(b"GLOB");
    pub const SOUN: Tag = Tag::new(b"SOUN");
    pub const WRLD: Tag = Tag::new(b"WRLD");

    // Subrecords
    pub const CNAM: Tag = Tag::new(b"CNAM");
    pub const DATA: Tag = Tag::new(b"DATA");
    pub const DEST: Tag = Tag::new(b"DEST");
    pub const DMDL: Tag = Tag::new(b"DMDL");
    pub const DMDS: Tag = Tag::new(b"DMDS");
    pub const DMDT: Tag = Tag::new(b"DMDT");
    pub const DSTD: Tag = Tag::new(b"DSTD");
    pub const DSTF: Tag = Tag::new(b"DSTF");
    pub const EDID: Tag = Tag::new(b"EDID");
    pub const FLTV: Tag = Tag::new(b"FLTV");
    pub const FNAM: Tag = Tag::new(b"FNAM");
    pub const FULL: Tag = Tag::new(b"FULL");
    pub const KNAM: Tag = Tag::new(b"KNAM");
    pub const KSIZ: Tag = Tag::new(b"KSIZ");
    pub const KWDA: Tag = Tag::new(b"KWDA");
    pub const MODL: Tag = Tag::new(b"MODL");
    pub const MODS: Tag = Tag::new(b"MODS");
    pub const MODT: Tag = Tag::new(b"MODT");
    pub const NAM2: Tag = Tag::new(b"NAM2");
    pub const NAME: Tag = Tag::new(b"NAME");
    pub const OBND: Tag = Tag::new(b"OBND");
    pub const OFST: Tag = Tag::new(b"OFST");
    pub const PNAM: Tag = Tag::new(b"PNAM");
    pub const RNAM: Tag = Tag::new(b"RNAM");
    pub const SCRI: Tag = Tag::new(b"SCRI");
    pub const SDSC: Tag = Tag::new(b"SDSC");
    pub const SNAM: Tag = Tag::new(b"SNAM");
    pub const SNDD: Tag = Tag::new(b"SNDD");
    pub const VMAD: Tag = Tag::new(b"VMAD");
    pub const VNAM: Tag = Tag::new(b"VNAM");
    pub const WNAM: Tag = Tag::new(b"WNAM");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_printable() {
        assert_eq!(tags::GLOB.to_string(), "GLOB");
        assert_eq!(format!("{:?}", tags::EDID), "Tag(\"EDID\")");
    }

    #[test]
    fn test_display_escapes_binary() {
        let tag = Tag([b'A', 0, 0xFF, b'B']);
        assert_eq!(tag.to_string(), "A\\x00\\xFFB");
    }

    #[test]
    fn test_as_u32_matches_le() {
        // "TES4" = 54 45 53 34
        assert_eq!(tags::TES4.as_u32(), 0x3453_4554);
    }
}
