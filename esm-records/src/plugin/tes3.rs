use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use esm_codec::{
    AnyRecord, CodecConfig, DecodeContext, Generation, Record, RecordDecoder, Result,
    StreamReader, Tag, tags,
};

use super::check_registry;
use crate::common::MasterFile;
use crate::registry::Registry;
use crate::tes3::FileHeader;

/// A Morrowind-era plugin: header record plus records in file order.
#[derive(Debug)]
pub struct Tes3Plugin {
    pub header: Record<FileHeader>,
    pub records: Vec<Box<dyn AnyRecord>>,
}

impl Default for Tes3Plugin {
    fn default() -> Self {
        Self {
            header: Record::new(FileHeader::default()),
            records: Vec::new(),
        }
    }
}

impl Tes3Plugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(source: &mut dyn Read, registry: &Registry, config: &CodecConfig) -> Result<Self> {
        check_registry(registry, Generation::Tes3, tags::TES3)?;
        let ctx = DecodeContext::new(config);
        let mut reader = StreamReader::new(source);
        let header = Record::<FileHeader>::decode(&mut reader, &ctx)?;

        let mut records = Vec::new();
        while let Some(tag) = reader.read_tag_or_eof()? {
            if let Some(record) = registry.decode_record(tag, &mut reader, &ctx)? {
                records.push(record);
            }
        }

        if let Some(fields) = header.fields() {
            let declared = fields.data.record_count as usize;
            if declared != records.len() && config.keep_unknown_records {
                tracing::warn!(declared, found = records.len(), "record count mismatch");
            }
        }
        tracing::info!(records = records.len(), bytes = reader.position(), "read TES3 plugin");
        Ok(Self { header, records })
    }

    pub fn load(path: &Path, registry: &Registry, config: &CodecConfig) -> Result<Self> {
        let mut source = BufReader::new(File::open(path)?);
        let plugin = Self::read(&mut source, registry, config)?;
        tracing::info!(path = %path.display(), "loaded plugin");
        Ok(plugin)
    }

    /// Write the header and all records. Call [`sync_record_count`](Self::sync_record_count)
    /// first if records were added or removed.
    pub fn write(&self, out: &mut dyn Write) -> Result<()> {
        self.header.encode(out)?;
        for record in &self.records {
            record.encode(out)?;
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write(&mut out)?;
        out.flush()?;
        tracing::info!(path = %path.display(), records = self.records.len(), "saved plugin");
        Ok(())
    }

    /// Store the current number of records in the header.
    pub fn sync_record_count(&mut self) {
        let count = self.records.len() as u32;
        if let Some(fields) = self.header.fields_mut() {
            fields.data.record_count = count;
        }
    }

    pub fn masters(&self) -> &[MasterFile] {
        self.header
            .fields()
            .map(|fields| fields.masters.as_slice())
            .unwrap_or_default()
    }

    pub fn is_master(&self) -> bool {
        self.header.fields().is_some_and(|fields| fields.data.file_flag & 1 != 0)
    }

    pub fn push(&mut self, record: Box<dyn AnyRecord>) {
        self.records.push(record);
    }

    /// Records with the given tag, in file order.
    pub fn records_of(&self, tag: Tag) -> impl Iterator<Item = &dyn AnyRecord> {
        self.records
            .iter()
            .filter(move |record| record.tag() == tag)
            .map(|record| record.as_ref())
    }
}
