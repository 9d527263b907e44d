//! `GLOB` global variables

use std::sync::LazyLock;

use esm_codec::{Generation, RecordSchema, Schema, Tag, ZString, tags};

use crate::common::GlobalKind;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Global {
    pub editor_id: ZString,
    pub kind: GlobalKind,
    pub value: f32,
}

impl RecordSchema for Global {
    const TAG: Tag = tags::GLOB;
    const GENERATION: Generation = Generation::Tes4;

    fn schema() -> &'static Schema<Self> {
        static SCHEMA: LazyLock<Schema<Global>> = LazyLock::new(|| {
            Schema::<Global>::builder(tags::GLOB, Generation::Tes4)
                .required(tags::EDID, |g| &g.editor_id, |g| &mut g.editor_id)
                .required(tags::FNAM, |g| &g.kind, |g| &mut g.kind)
                .required(tags::FLTV, |g| &g.value, |g| &mut g.value)
                .build()
        });
        &SCHEMA
    }
}
