//! `SOUN` sound markers

use std::sync::LazyLock;

use esm_codec::{Generation, RecordSchema, Schema, Tag, ZString, tags};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sound {
    pub editor_id: ZString,
    pub bounds: [u8; 12],
    pub file: Option<ZString>,
    pub data: Option<[u8; 36]>,
    /// Sound descriptor form id
    pub descriptor: u32,
}

impl RecordSchema for Sound {
    const TAG: Tag = tags::SOUN;
    const GENERATION: Generation = Generation::Tes4;

    fn schema() -> &'static Schema<Self> {
        static SCHEMA: LazyLock<Schema<Sound>> = LazyLock::new(|| {
            Schema::<Sound>::builder(tags::SOUN, Generation::Tes4)
                .required(tags::EDID, |s| &s.editor_id, |s| &mut s.editor_id)
                .required(tags::OBND, |s| &s.bounds, |s| &mut s.bounds)
                .optional(tags::FNAM, |s| &s.file, |s| &mut s.file)
                .optional(tags::SNDD, |s| &s.data, |s| &mut s.data)
                .required(tags::SDSC, |s| &s.descriptor, |s| &mut s.descriptor)
                .build()
        });
        &SCHEMA
    }
}
