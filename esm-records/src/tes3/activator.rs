//! `ACTI` activators

use std::sync::LazyLock;

use esm_codec::{Generation, RecordSchema, Schema, Tag, ZString, tags};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Activator {
    pub id: ZString,
    pub model: ZString,
    pub name: ZString,
    pub script: Option<ZString>,
}

impl RecordSchema for Activator {
    const TAG: Tag = tags::ACTI;
    const GENERATION: Generation = Generation::Tes3;

    fn schema() -> &'static Schema<Self> {
        static SCHEMA: LazyLock<Schema<Activator>> = LazyLock::new(|| {
            Schema::<Activator>::builder(tags::ACTI, Generation::Tes3)
                .required(tags::NAME, |a| &a.id, |a| &mut a.id)
                .required(tags::MODL, |a| &a.model, |a| &mut a.model)
                .required(tags::FNAM, |a| &a.name, |a| &mut a.name)
                .optional(tags::SCRI, |a| &a.script, |a| &mut a.script)
                .build()
        });
        &SCHEMA
    }
}
