//! Hierarchical record groups (TES4 only)
//!
//! A group is `GRUP [size u32] [label 4] [type i32] [stamp u32] [unknown u32]`
//! followed by its children. The size field counts the 24-byte header too.
//! Children are records or nested groups, kept in file order.

use std::io::Write;

use hashbrown::HashMap;

use crate::context::DecodeContext;
use crate::cursor::{ByteWriter, StreamReader};
use crate::error::{EsmError, Result};
use crate::generation::Generation;
use crate::record::{AnyRecord, GenericRecord};
use crate::tag::{Tag, tags};

/// Size of a group header in bytes, tag and size included.
pub const GROUP_HEADER_SIZE: u32 = 24;

/// Group type of a top-level group, whose label is a record tag.
pub const TOP_LEVEL: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GroupHeader {
    /// Record tag for top-level groups; a form id or block number otherwise
    pub label: [u8; 4],
    pub group_type: i32,
    pub stamp: u32,
    pub unknown: u32,
}

impl GroupHeader {
    /// Header of a top-level group holding records of type `record`.
    pub fn top_level(record: Tag) -> Self {
        Self {
            label: record.bytes(),
            group_type: TOP_LEVEL,
            ..Default::default()
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.group_type == TOP_LEVEL
    }

    /// Label read as a record tag.
    pub fn label_tag(&self) -> Tag {
        Tag(self.label)
    }

    /// Label read as a little-endian u32 (form id or block number).
    pub fn label_u32(&self) -> u32 {
        u32::from_le_bytes(self.label)
    }
}

// =============================================================================
// Decoding hooks
// =============================================================================

/// Turns a record tag into a decoded record.
pub trait RecordDecoder: Send + Sync {
    /// Decode the record whose tag has just been read.
    ///
    /// Returns `None` when the decoder consumed the record without keeping it.
    fn decode_record(
        &self,
        tag: Tag,
        reader: &mut StreamReader<'_>,
        ctx: &DecodeContext<'_>,
    ) -> Result<Option<Box<dyn AnyRecord>>>;
}

/// Keeps every record as a [`GenericRecord`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericDecoder;

impl RecordDecoder for GenericDecoder {
    fn decode_record(
        &self,
        tag: Tag,
        reader: &mut StreamReader<'_>,
        ctx: &DecodeContext<'_>,
    ) -> Result<Option<Box<dyn AnyRecord>>> {
        let record = GenericRecord::decode_after_tag(tag, Generation::Tes4, reader, ctx)?;
        Ok(Some(Box::new(record)))
    }
}

/// Chooses which groups to load. Rejected groups are skipped by size.
pub trait GroupFilter {
    fn keep(&self, header: &GroupHeader) -> bool;
}

impl<F: Fn(&GroupHeader) -> bool> GroupFilter for F {
    fn keep(&self, header: &GroupHeader) -> bool {
        self(header)
    }
}

/// Filter that loads everything.
pub fn all_groups(_: &GroupHeader) -> bool {
    true
}

// =============================================================================
// Group
// =============================================================================

#[derive(Debug)]
pub enum GroupChild {
    Record(Box<dyn AnyRecord>),
    Group(Group),
}

impl GroupChild {
    pub fn total_written_size(&self) -> Result<u32> {
        match self {
            Self::Record(record) => record.total_written_size(),
            Self::Group(group) => group.total_written_size(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Group {
    pub header: GroupHeader,
    pub children: Vec<GroupChild>,
}

impl Group {
    pub fn new(header: GroupHeader) -> Self {
        Self {
            header,
            children: Vec::new(),
        }
    }

    pub fn push_record(&mut self, record: Box<dyn AnyRecord>) {
        self.children.push(GroupChild::Record(record));
    }

    pub fn push_group(&mut self, group: Group) {
        self.children.push(GroupChild::Group(group));
    }

    /// Direct child records.
    pub fn records(&self) -> impl Iterator<Item = &dyn AnyRecord> {
        self.children.iter().filter_map(|child| match child {
            GroupChild::Record(record) => Some(record.as_ref()),
            GroupChild::Group(_) => None,
        })
    }

    /// Direct sub-groups.
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.children.iter().filter_map(|child| match child {
            GroupChild::Group(group) => Some(group),
            GroupChild::Record(_) => None,
        })
    }

    pub fn groups_mut(&mut self) -> impl Iterator<Item = &mut Group> {
        self.children.iter_mut().filter_map(|child| match child {
            GroupChild::Group(group) => Some(group),
            GroupChild::Record(_) => None,
        })
    }

    /// Records in this group and all nested groups.
    pub fn record_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| match child {
                GroupChild::Record(_) => 1,
                GroupChild::Group(group) => group.record_count(),
            })
            .sum()
    }

    /// Nested groups at any depth, not counting this one.
    pub fn group_count(&self) -> usize {
        self.groups().map(|group| 1 + group.group_count()).sum()
    }

    /// Whether the group holds no record at any depth.
    pub fn is_empty(&self) -> bool {
        self.records().next().is_none() && self.groups().all(Group::is_empty)
    }

    /// Remove nested groups that hold no records. Returns how many were removed.
    pub fn purge_empty_groups(&mut self) -> usize {
        let mut purged = 0;
        for group in self.groups_mut() {
            purged += group.purge_empty_groups();
        }
        let before = self.children.len();
        self.children
            .retain(|child| !matches!(child, GroupChild::Group(group) if group.is_empty()));
        purged + (before - self.children.len())
    }

    /// First record with the given form id, searching depth-first.
    pub fn find_record(&self, form_id: u32) -> Option<&dyn AnyRecord> {
        self.children.iter().find_map(|child| match child {
            GroupChild::Record(record) if record.header().form_id() == Some(form_id) => {
                Some(record.as_ref())
            }
            GroupChild::Record(_) => None,
            GroupChild::Group(group) => group.find_record(form_id),
        })
    }

    /// Index of every record by form id. Later duplicates win.
    pub fn form_index(&self) -> HashMap<u32, &dyn AnyRecord> {
        let mut index = HashMap::new();
        self.collect_form_ids(&mut index);
        index
    }

    fn collect_form_ids<'g>(&'g self, index: &mut HashMap<u32, &'g dyn AnyRecord>) {
        for child in &self.children {
            match child {
                GroupChild::Record(record) => {
                    if let Some(form_id) = record.header().form_id() {
                        index.insert(form_id, record.as_ref());
                    }
                }
                GroupChild::Group(group) => group.collect_form_ids(index),
            }
        }
    }

    /// Bytes of all children as written.
    pub fn content_size(&self) -> Result<u32> {
        self.children.iter().try_fold(0u32, |total, child| {
            let size = child.total_written_size()?;
            total
                .checked_add(size)
                .ok_or_else(|| too_large(u64::from(total) + u64::from(size)))
        })
    }

    /// Header plus content, the value written to the size field.
    pub fn total_written_size(&self) -> Result<u32> {
        let content = self.content_size()?;
        content
            .checked_add(GROUP_HEADER_SIZE)
            .ok_or_else(|| too_large(u64::from(content) + u64::from(GROUP_HEADER_SIZE)))
    }

    pub fn encode(&self, out: &mut dyn Write) -> Result<()> {
        let size = self.total_written_size()?;
        {
            let mut writer = ByteWriter::new(out);
            writer.write_tag(tags::GRUP)?;
            writer.write_u32(size)?;
            writer.write_bytes(&self.header.label)?;
            writer.write_i32(self.header.group_type)?;
            writer.write_u32(self.header.stamp)?;
            writer.write_u32(self.header.unknown)?;
        }
        for child in &self.children {
            match child {
                GroupChild::Record(record) => record.encode(out)?,
                GroupChild::Group(group) => group.encode(out)?,
            }
        }
        tracing::debug!(label = %self.header.label_tag(), size, "encoded group");
        Ok(())
    }

    /// Decode a group, starting at its `GRUP` tag.
    ///
    /// Returns `None` if `filter` rejected the group.
    pub fn decode(
        reader: &mut StreamReader<'_>,
        decoder: &dyn RecordDecoder,
        ctx: &DecodeContext<'_>,
        filter: &dyn GroupFilter,
    ) -> Result<Option<Self>> {
        let tag = reader.read_tag()?;
        if tag != tags::GRUP {
            return Err(EsmError::UnexpectedTag {
                context: tags::GRUP,
                expected: Some(tags::GRUP),
                found: tag,
            });
        }
        Self::decode_after_tag(reader, decoder, ctx, filter)
    }

    /// Decode a group whose `GRUP` tag has already been consumed.
    pub fn decode_after_tag(
        reader: &mut StreamReader<'_>,
        decoder: &dyn RecordDecoder,
        ctx: &DecodeContext<'_>,
        filter: &dyn GroupFilter,
    ) -> Result<Option<Self>> {
        Self::decode_nested(reader, decoder, ctx, filter, 0)
    }

    fn decode_nested(
        reader: &mut StreamReader<'_>,
        decoder: &dyn RecordDecoder,
        ctx: &DecodeContext<'_>,
        filter: &dyn GroupFilter,
        depth: usize,
    ) -> Result<Option<Self>> {
        if depth >= ctx.config.max_group_depth {
            return Err(EsmError::InvalidValue {
                tag: tags::GRUP,
                reason: format!("groups nested deeper than {}", ctx.config.max_group_depth),
            });
        }

        let size = reader.read_u32()?;
        let header = GroupHeader {
            label: reader.read_array()?,
            group_type: reader.read_i32()?,
            stamp: reader.read_u32()?,
            unknown: reader.read_u32()?,
        };
        let content = size.checked_sub(GROUP_HEADER_SIZE).ok_or_else(|| EsmError::InvalidValue {
            tag: tags::GRUP,
            reason: format!("group size {size} is smaller than its header"),
        })?;
        let content = u64::from(content);

        if !filter.keep(&header) {
            let skipped = reader.skip(content)?;
            if skipped < content {
                return Err(truncated(content, skipped));
            }
            tracing::debug!(label = %header.label_tag(), group_type = header.group_type, size, "skipped group");
            return Ok(None);
        }

        let start = reader.position();
        let end = start + content;
        let mut group = Group::new(header);
        while reader.position() < end {
            let child_start = reader.position();
            let tag = reader
                .read_tag_or_eof()?
                .ok_or_else(|| truncated(content, child_start - start))?;
            if tag == tags::GRUP {
                if let Some(child) = Self::decode_nested(reader, decoder, ctx, filter, depth + 1)? {
                    group.push_group(child);
                }
            } else if let Some(record) = decoder.decode_record(tag, reader, ctx)? {
                group.push_record(record);
            }
            if reader.position() > end {
                return Err(EsmError::CorruptLength {
                    record: tags::GRUP,
                    tag,
                    declared: reader.position() - child_start,
                    remaining: (end - child_start) as usize,
                });
            }
        }

        tracing::debug!(
            label = %group.header.label_tag(),
            size,
            children = group.children.len(),
            "decoded group"
        );
        Ok(Some(group))
    }
}

fn truncated(declared: u64, available: u64) -> EsmError {
    EsmError::TruncatedRecord {
        record: tags::GRUP,
        declared,
        available,
    }
}

fn too_large(size: u64) -> EsmError {
    EsmError::RecordTooLarge {
        record: tags::GRUP,
        size,
        max: u64::from(u32::MAX),
    }
}
