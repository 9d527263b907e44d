//! `GLOB` global variables

use std::sync::LazyLock;

use esm_codec::{Generation, RecordSchema, Schema, Tag, ZString, tags};

use crate::common::GlobalKind;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Global {
    pub id: ZString,
    pub kind: GlobalKind,
    /// Stored as a float whatever the kind
    pub value: f32,
}

impl RecordSchema for Global {
    const TAG: Tag = tags::GLOB;
    const GENERATION: Generation = Generation::Tes3;

    fn schema() -> &'static Schema<Self> {
        static SCHEMA: LazyLock<Schema<Global>> = LazyLock::new(|| {
            Schema::<Global>::builder(tags::GLOB, Generation::Tes3)
                .required(tags::NAME, |g| &g.id, |g| &mut g.id)
                .required(tags::FNAM, |g| &g.kind, |g| &mut g.kind)
                .required(tags::FLTV, |g| &g.value, |g| &mut g.value)
                .build()
        });
        &SCHEMA
    }
}
