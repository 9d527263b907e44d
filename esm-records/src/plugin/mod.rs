//! Whole plugin files
//!
//! A TES3 plugin is a file header followed by a flat run of records. A TES4
//! plugin is a file header followed by top-level groups.

mod tes3;
mod tes4;

pub use tes3::Tes3Plugin;
pub use tes4::Tes4Plugin;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use esm_codec::{EsmError, Generation, Result, Tag, tags};

use crate::registry::Registry;

/// Detect a plugin's generation from its first tag.
pub fn sniff_generation(source: &mut dyn Read) -> Result<Generation> {
    let mut tag = [0u8; 4];
    source.read_exact(&mut tag)?;
    match Tag::from(tag) {
        tags::TES3 => Ok(Generation::Tes3),
        tags::TES4 => Ok(Generation::Tes4),
        found => Err(EsmError::UnexpectedTag {
            context: tags::TES4,
            expected: None,
            found,
        }),
    }
}

/// [`sniff_generation`] for a file on disk.
pub fn sniff_file(path: &Path) -> Result<Generation> {
    let mut source = BufReader::new(File::open(path)?);
    sniff_generation(&mut source)
}

pub(crate) fn check_registry(registry: &Registry, generation: Generation, tag: Tag) -> Result<()> {
    if registry.generation() != generation {
        return Err(EsmError::InvalidValue {
            tag,
            reason: format!("registry decodes {:?} records", registry.generation()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff() {
        assert_eq!(sniff_generation(&mut &b"TES3\0\0"[..]).unwrap(), Generation::Tes3);
        assert_eq!(sniff_generation(&mut &b"TES4"[..]).unwrap(), Generation::Tes4);
        assert!(matches!(
            sniff_generation(&mut &b"GRUP"[..]),
            Err(EsmError::UnexpectedTag { .. })
        ));
        assert!(matches!(sniff_generation(&mut &b"TE"[..]), Err(EsmError::Io(_))));
    }
}
