use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use esm_codec::{
    AnyRecord, CodecConfig, DecodeContext, EsmError, Generation, Group, GroupFilter, GroupHeader,
    Record, Result, StreamReader, StringTable, Tag, all_groups, tags,
};

use super::check_registry;
use crate::common::MasterFile;
use crate::registry::Registry;
use crate::tes4::FileHeader;

/// A Skyrim-era plugin: header record plus top-level groups.
#[derive(Debug)]
pub struct Tes4Plugin {
    pub header: Record<FileHeader>,
    pub groups: Vec<Group>,
    /// Text for localized string fields; empty for non-localized plugins
    pub strings: StringTable,
}

impl Default for Tes4Plugin {
    fn default() -> Self {
        Self {
            header: Record::new(FileHeader::default()),
            groups: Vec::new(),
            strings: StringTable::new(),
        }
    }
}

impl Tes4Plugin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a plugin from a stream. `strings` resolves localized fields if
    /// the header says the plugin is localized.
    pub fn read(
        source: &mut dyn Read,
        registry: &Registry,
        config: &CodecConfig,
        strings: StringTable,
        filter: &dyn GroupFilter,
    ) -> Result<Self> {
        check_registry(registry, Generation::Tes4, tags::TES4)?;
        let mut reader = StreamReader::new(source);
        let header = read_file_header(&mut reader, config)?;
        Self::read_groups(header, &mut reader, registry, config, strings, filter)
    }

    /// Load a plugin and, if it is localized, its string tables.
    pub fn load(path: &Path, registry: &Registry, config: &CodecConfig) -> Result<Self> {
        Self::load_filtered(path, registry, config, &all_groups)
    }

    /// Like [`load`](Self::load), skipping groups that `filter` rejects.
    pub fn load_filtered(
        path: &Path,
        registry: &Registry,
        config: &CodecConfig,
        filter: &dyn GroupFilter,
    ) -> Result<Self> {
        check_registry(registry, Generation::Tes4, tags::TES4)?;
        let mut source = BufReader::new(File::open(path)?);
        let mut reader = StreamReader::new(&mut source);
        let header = read_file_header(&mut reader, config)?;
        let strings = if header.header.is_localized() {
            StringTable::load_for_plugin(path)?
        } else {
            StringTable::new()
        };
        let plugin = Self::read_groups(header, &mut reader, registry, config, strings, filter)?;
        tracing::info!(path = %path.display(), "loaded plugin");
        Ok(plugin)
    }

    /// Read only the file header.
    pub fn peek_header(path: &Path, config: &CodecConfig) -> Result<Record<FileHeader>> {
        let mut source = BufReader::new(File::open(path)?);
        read_file_header(&mut StreamReader::new(&mut source), config)
    }

    fn read_groups(
        header: Record<FileHeader>,
        reader: &mut StreamReader<'_>,
        registry: &Registry,
        config: &CodecConfig,
        strings: StringTable,
        filter: &dyn GroupFilter,
    ) -> Result<Self> {
        let localized = header.header.is_localized();
        if localized && strings.is_empty() {
            tracing::warn!("localized plugin read without string tables");
        }

        let mut groups = Vec::new();
        let mut top_level = 0;
        {
            let ctx = if localized {
                DecodeContext::localized(config, &strings)
            } else {
                DecodeContext::new(config)
            };
            while let Some(tag) = reader.read_tag_or_eof()? {
                if tag != tags::GRUP {
                    return Err(EsmError::UnexpectedTag {
                        context: tags::TES4,
                        expected: Some(tags::GRUP),
                        found: tag,
                    });
                }
                top_level += 1;
                if let Some(group) = Group::decode_after_tag(reader, registry, &ctx, filter)? {
                    groups.push(group);
                }
            }
        }

        tracing::info!(
            groups = groups.len(),
            localized,
            bytes = reader.position(),
            "read TES4 plugin"
        );
        let plugin = Self {
            header,
            groups,
            strings,
        };
        let unfiltered = config.keep_unknown_records && plugin.groups.len() == top_level;
        if let Some(fields) = plugin.header.fields() {
            let declared = fields.data.record_count as usize;
            if unfiltered && declared != plugin.record_count() {
                tracing::warn!(declared, found = plugin.record_count(), "record count mismatch");
            }
        }
        Ok(plugin)
    }

    /// Write the header and all groups. Call
    /// [`sync_record_count`](Self::sync_record_count) first if the contents
    /// changed. String tables are not written.
    pub fn write(&self, out: &mut dyn Write) -> Result<()> {
        self.header.encode(out)?;
        for group in &self.groups {
            group.encode(out)?;
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write(&mut out)?;
        out.flush()?;
        tracing::info!(path = %path.display(), groups = self.groups.len(), "saved plugin");
        Ok(())
    }

    /// Records and groups in the file, header excluded.
    pub fn record_count(&self) -> usize {
        self.groups
            .iter()
            .map(|group| 1 + group.group_count() + group.record_count())
            .sum()
    }

    /// Store [`record_count`](Self::record_count) in the header.
    pub fn sync_record_count(&mut self) {
        let count = self.record_count() as u32;
        if let Some(fields) = self.header.fields_mut() {
            fields.data.record_count = count;
        }
    }

    pub fn is_localized(&self) -> bool {
        self.header.header.is_localized()
    }

    pub fn is_master(&self) -> bool {
        self.header.header.is_master()
    }

    pub fn masters(&self) -> &[MasterFile] {
        self.header
            .fields()
            .map(|fields| fields.masters.as_slice())
            .unwrap_or_default()
    }

    pub fn find_record(&self, form_id: u32) -> Option<&dyn AnyRecord> {
        self.groups.iter().find_map(|group| group.find_record(form_id))
    }

    /// The top-level group holding records of type `tag`.
    pub fn top_level_group(&self, tag: Tag) -> Option<&Group> {
        self.groups
            .iter()
            .find(|group| group.header.is_top_level() && group.header.label_tag() == tag)
    }

    /// Append a record to the top-level group of its type, creating the
    /// group at the end of the file if needed.
    pub fn add_record(&mut self, record: Box<dyn AnyRecord>) {
        let tag = record.tag();
        let position = self
            .groups
            .iter()
            .position(|group| group.header.is_top_level() && group.header.label_tag() == tag);
        match position {
            Some(index) => self.groups[index].push_record(record),
            None => {
                let mut group = Group::new(GroupHeader::top_level(tag));
                group.push_record(record);
                self.groups.push(group);
            }
        }
    }

    /// Drop nested groups without records, then empty top-level groups.
    pub fn purge_empty_groups(&mut self) -> usize {
        let mut purged = 0;
        for group in &mut self.groups {
            purged += group.purge_empty_groups();
        }
        let before = self.groups.len();
        self.groups.retain(|group| !group.is_empty());
        purged + (before - self.groups.len())
    }
}

fn read_file_header(reader: &mut StreamReader<'_>, config: &CodecConfig) -> Result<Record<FileHeader>> {
    Record::<FileHeader>::decode(reader, &DecodeContext::new(config))
}
