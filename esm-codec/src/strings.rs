//! String tables for localized plugins
//!
//! A localized plugin `Foo.esm` ships three tables next to it:
//! `Strings/Foo_<language>.strings`, `.dlstrings` and `.ilstrings`. All
//! three share one layout:
//!
//! ```text
//! count: u32, data_size: u32
//! count x (id: u32, offset: u32)     offsets relative to the data block
//! data block
//! ```
//!
//! `.strings` entries are NUL-terminated; `.dlstrings` and `.ilstrings`
//! entries carry a u32 length prefix that includes the terminator.

use hashbrown::HashMap;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

use crate::cursor::{ByteWriter, Cursor};
use crate::error::{EsmError, Result};

/// Source of text for localized string indices.
pub trait StringResolver: Send + Sync {
    fn resolve(&self, index: u32) -> Option<&str>;
}

/// Resolver with no entries, used for non-localized plugins.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStrings;

impl StringResolver for NoStrings {
    fn resolve(&self, _index: u32) -> Option<&str> {
        None
    }
}

/// On-disk string table flavour, named by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringTableKind {
    /// `.strings`: NUL-terminated entries
    Strings,
    /// `.dlstrings`: length-prefixed entries
    DlStrings,
    /// `.ilstrings`: length-prefixed entries
    IlStrings,
}

impl StringTableKind {
    pub const ALL: [Self; 3] = [Self::Strings, Self::DlStrings, Self::IlStrings];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Strings => "strings",
            Self::DlStrings => "dlstrings",
            Self::IlStrings => "ilstrings",
        }
    }

    pub fn length_prefixed(self) -> bool {
        !matches!(self, Self::Strings)
    }

    /// Infer the flavour from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension().and_then(OsStr::to_str)?;
        Self::ALL
            .into_iter()
            .find(|kind| kind.extension().eq_ignore_ascii_case(ext))
    }
}

/// Map from string id to text. Id 0 is reserved for the empty string and is
/// never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringTable {
    entries: HashMap<u32, String>,
}

impl StringResolver for StringTable {
    fn resolve(&self, index: u32) -> Option<&str> {
        if index == 0 {
            return Some("");
        }
        self.get(index)
    }
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add or replace an entry. Returns `false` for id 0, which is not stored.
    pub fn insert(&mut self, id: u32, text: impl Into<String>) -> bool {
        if id == 0 {
            return false;
        }
        self.entries.insert(id, text.into());
        true
    }

    pub fn get(&self, id: u32) -> Option<&str> {
        self.entries.get(&id).map(String::as_str)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn remove(&mut self, id: u32) -> bool {
        self.entries.remove(&id).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries sorted by id.
    pub fn sorted(&self) -> Vec<(u32, &str)> {
        let mut out: Vec<(u32, &str)> = self
            .entries
            .iter()
            .map(|(&id, text)| (id, text.as_str()))
            .collect();
        out.sort_unstable_by_key(|&(id, _)| id);
        out
    }

    /// Merge the entries of one table file image. Returns the number added.
    pub fn merge_bytes(&mut self, bytes: &[u8], kind: StringTableKind) -> Result<usize> {
        let mut cursor = Cursor::new(bytes);
        let count = cursor.read_u32()? as usize;
        let data_size = cursor.read_u32()? as usize;

        let mut directory = Vec::with_capacity(count.min(cursor.remaining() / 8));
        for _ in 0..count {
            let id = cursor.read_u32()?;
            let offset = cursor.read_u32()? as usize;
            directory.push((id, offset));
        }

        let data_start = cursor.position();
        let data = &bytes[data_start..];
        if data.len() != data_size {
            tracing::debug!(
                declared = data_size,
                actual = data.len(),
                "string table data size differs from header"
            );
        }

        let mut added = 0;
        for (id, offset) in directory {
            if offset >= data.len() {
                tracing::warn!(id, offset, "string table entry points past the data block");
                continue;
            }
            let mut entry = Cursor::with_base(&data[offset..], (data_start + offset) as u64);
            let text = if kind.length_prefixed() {
                let len = entry.read_u32()? as usize;
                let raw = entry.read_bytes(len)?;
                let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
                &raw[..end]
            } else {
                let remaining = entry.remaining();
                entry.read_zstring(remaining)?
            };
            if self.insert(id, String::from_utf8_lossy(text)) {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Parse a single table file image.
    pub fn from_bytes(bytes: &[u8], kind: StringTableKind) -> Result<Self> {
        let mut table = Self::new();
        table.merge_bytes(bytes, kind)?;
        Ok(table)
    }

    /// Serialize all entries in id order.
    pub fn to_bytes(&self, kind: StringTableKind) -> Result<Vec<u8>> {
        let entries = self.sorted();

        let mut data = Vec::new();
        let mut directory = Vec::with_capacity(entries.len());
        {
            let mut writer = ByteWriter::new(&mut data);
            for &(id, text) in &entries {
                directory.push((id, writer.written() as u32));
                if kind.length_prefixed() {
                    writer.write_u32(text.len() as u32 + 1)?;
                }
                writer.write_bytes(text.as_bytes())?;
                writer.write_u8(0)?;
            }
        }

        let mut out = Vec::with_capacity(8 + directory.len() * 8 + data.len());
        let mut writer = ByteWriter::new(&mut out);
        writer.write_u32(directory.len() as u32)?;
        writer.write_u32(data.len() as u32)?;
        for (id, offset) in directory {
            writer.write_u32(id)?;
            writer.write_u32(offset)?;
        }
        writer.write_bytes(&data)?;
        Ok(out)
    }

    /// Merge a table file, inferring its flavour from the extension.
    pub fn read_file(&mut self, path: &Path) -> Result<usize> {
        let kind = StringTableKind::from_path(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a string table file", path.display()),
            )
        })?;
        let bytes = std::fs::read(path)?;
        let added = self.merge_bytes(&bytes, kind)?;
        tracing::debug!(path = %path.display(), added, "loaded string table");
        Ok(added)
    }

    /// Write all entries to `path` in the given flavour.
    pub fn write_file(&self, path: &Path, kind: StringTableKind) -> Result<()> {
        std::fs::write(path, self.to_bytes(kind)?)?;
        Ok(())
    }

    /// Load the three tables that belong to a localized plugin.
    pub fn load_for_plugin(plugin: &Path) -> Result<Self> {
        let mut table = Self::new();
        for path in associated_table_files(plugin)? {
            table.read_file(&path)?;
        }
        Ok(table)
    }
}

/// Find `Strings/<plugin>_<language>.{strings,dlstrings,ilstrings}` next to
/// a plugin file.
///
/// The language part holds no `_`. The first language found (in file name
/// order) wins; exactly one file of each flavour must exist for it.
pub fn associated_table_files(plugin: &Path) -> Result<Vec<PathBuf>> {
    let missing = |found| EsmError::StringTableFiles {
        plugin: plugin.to_path_buf(),
        found,
    };

    let stem = plugin
        .file_stem()
        .and_then(OsStr::to_str)
        .ok_or_else(|| missing(0))?
        .to_ascii_lowercase();
    let dir = plugin
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join("Strings");
    if !dir.is_dir() {
        return Err(missing(0));
    }

    let mut candidates: Vec<PathBuf> = std::fs::read_dir(&dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && StringTableKind::from_path(path).is_some())
        .collect();
    candidates.sort();

    let prefix = format!("{stem}_");
    let mut language: Option<String> = None;
    let mut files = Vec::new();
    for path in candidates {
        let Some(name) = path.file_stem().and_then(OsStr::to_str) else {
            continue;
        };
        let lower = name.to_ascii_lowercase();
        // `update_extra_english` belongs to `update_extra`, not `update`
        let Some(lang) = lower
            .strip_prefix(&prefix)
            .filter(|lang| !lang.is_empty() && !lang.contains('_'))
        else {
            continue;
        };
        match &language {
            None => {
                language = Some(lang.to_string());
                files.push(path);
            }
            Some(chosen) if chosen == lang => files.push(path),
            Some(_) => {}
        }
    }

    if files.len() != 3 {
        return Err(missing(files.len()));
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Fixtures in the layout the game's own tools produce
    const STRINGS: &[u8] = b"\x03\0\0\0\x0F\0\0\0\x78\x56\x34\x12\0\0\0\0\xFE\xAF\x00\x00\x04\0\0\0\x2A\x00\x00\x00\x08\0\0\0foo\0bar\0foobar\0";
    const ILSTRINGS: &[u8] = b"\x03\0\0\0\x0F\0\0\0\x78\x56\x34\x12\0\0\0\0\xFE\xAF\x00\x00\x08\0\0\0\x2A\x00\x00\x00\x10\0\0\0\x04\0\0\0foo\0\x04\0\0\0bar\0\x07\0\0\0foobar\0";

    fn assert_entries(table: &StringTable) {
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(0x1234_5678), Some("foo"));
        assert_eq!(table.get(0x0000_AFFE), Some("bar"));
        assert_eq!(table.get(42), Some("foobar"));
    }

    #[test]
    fn test_insert_ignores_zero() {
        let mut table = StringTable::new();
        assert!(!table.insert(0, "foobar"));
        assert!(table.is_empty());
        assert_eq!(table.resolve(0), Some(""));
        assert!(table.insert(1, "foo"));
        assert!(table.remove(1));
        assert!(!table.remove(1));
    }

    #[test]
    fn test_parse_nul_terminated() {
        let table = StringTable::from_bytes(STRINGS, StringTableKind::Strings).unwrap();
        assert_entries(&table);
    }

    #[test]
    fn test_parse_length_prefixed() {
        // The data size field of this fixture is stale; the data block is used as found
        let table = StringTable::from_bytes(ILSTRINGS, StringTableKind::IlStrings).unwrap();
        assert_entries(&table);
    }

    #[test]
    fn test_bad_offset_is_skipped() {
        let data = b"\x02\0\0\0\x04\0\0\0\x01\0\0\0\0\0\0\0\x02\0\0\0\x40\0\0\0foo\0";
        let table = StringTable::from_bytes(data, StringTableKind::Strings).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(1), Some("foo"));
    }

    #[test]
    fn test_truncated_directory() {
        let data = b"\x05\0\0\0\x00\0\0\0\x01\0\0\0";
        assert!(matches!(
            StringTable::from_bytes(data, StringTableKind::Strings),
            Err(EsmError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn test_write_then_read_all_kinds() {
        let mut table = StringTable::new();
        table.insert(0x1234_5678, "foo");
        table.insert(0x0000_AFFE, "bar");
        table.insert(42, "foobar");

        for kind in StringTableKind::ALL {
            let bytes = table.to_bytes(kind).unwrap();
            let back = StringTable::from_bytes(&bytes, kind).unwrap();
            assert_eq!(back, table, "{kind:?}");
        }
    }

    #[test]
    fn test_read_file_infers_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("foobar.guess.ILSTRINGS");
        std::fs::write(&path, ILSTRINGS).unwrap();

        let mut table = StringTable::new();
        assert_eq!(table.read_file(&path).unwrap(), 3);
        assert_entries(&table);

        let odd = dir.path().join("foobar.nonconform");
        std::fs::write(&odd, ILSTRINGS).unwrap();
        assert!(matches!(table.read_file(&odd), Err(EsmError::Io(_))));
    }

    #[test]
    fn test_associated_files() {
        let dir = tempfile::tempdir().unwrap();
        let strings = dir.path().join("Strings");
        std::fs::create_dir(&strings).unwrap();
        let plugin = dir.path().join("Update.esm");

        assert!(matches!(
            associated_table_files(&plugin),
            Err(EsmError::StringTableFiles { found: 0, .. })
        ));

        let mut table = StringTable::new();
        table.insert(7, "seven");
        for kind in StringTableKind::ALL {
            let name = format!("update_english.{}", kind.extension());
            table.write_file(&strings.join(name), kind).unwrap();
        }
        // A second language and another plugin's tables are ignored
        table
            .write_file(&strings.join("update_german.strings"), StringTableKind::Strings)
            .unwrap();
        table
            .write_file(&strings.join("skyrim_english.strings"), StringTableKind::Strings)
            .unwrap();

        let files = associated_table_files(&plugin).unwrap();
        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|f| {
            f.file_stem().and_then(OsStr::to_str) == Some("update_english")
        }));

        let loaded = StringTable::load_for_plugin(&plugin).unwrap();
        assert_eq!(loaded.get(7), Some("seven"));
    }

    #[test]
    fn test_associated_files_skip_longer_plugin_names() {
        let dir = tempfile::tempdir().unwrap();
        let strings = dir.path().join("Strings");
        std::fs::create_dir(&strings).unwrap();
        let plugin = dir.path().join("Update.esm");

        let mut table = StringTable::new();
        table.insert(7, "seven");
        for kind in StringTableKind::ALL {
            let name = format!("update_extra_english.{}", kind.extension());
            table.write_file(&strings.join(name), kind).unwrap();
        }
        assert!(matches!(
            associated_table_files(&plugin),
            Err(EsmError::StringTableFiles { found: 0, .. })
        ));

        // Sorted after `update_extra_*`, still picked for `update`
        for kind in StringTableKind::ALL {
            let name = format!("update_french.{}", kind.extension());
            table.write_file(&strings.join(name), kind).unwrap();
        }
        let files = associated_table_files(&plugin).unwrap();
        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|f| {
            f.file_stem().and_then(OsStr::to_str) == Some("update_french")
        }));
        assert_eq!(
            associated_table_files(&dir.path().join("Update_Extra.esp")).unwrap().len(),
            3
        );
    }
}
