//! `ACTI` activators

use std::sync::LazyLock;

use esm_codec::{
    Blob, EsmError, Generation, LocalizedString, RecordSchema, Result, Schema, Tag, ZString, tags,
};

use super::components::{DestructionStage, Keywords};
use crate::common::nonzero_form_id;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Activator {
    pub editor_id: ZString,
    /// Script attachments
    pub scripts: Option<Blob>,
    pub bounds: [u8; 12],
    pub name: Option<LocalizedString>,
    pub model: Option<ZString>,
    pub model_textures: Option<Blob>,
    pub model_swaps: Option<Blob>,
    pub destruction: Option<[u8; 8]>,
    pub destruction_stages: Vec<DestructionStage>,
    pub keywords: Option<Keywords>,
    /// Default primitive colour: red, green, blue and one unused byte
    pub marker_color: Option<[u8; 4]>,
    pub looping_sound: Option<u32>,
    pub activate_sound: Option<u32>,
    pub water_type: Option<u32>,
    pub activate_text: Option<LocalizedString>,
    pub flags: Option<u16>,
    pub interaction_keyword: Option<u32>,
}

impl RecordSchema for Activator {
    const TAG: Tag = tags::ACTI;
    const GENERATION: Generation = Generation::Tes4;

    fn schema() -> &'static Schema<Self> {
        static SCHEMA: LazyLock<Schema<Activator>> = LazyLock::new(|| {
            Schema::<Activator>::builder(tags::ACTI, Generation::Tes4)
                .required(tags::EDID, |a| &a.editor_id, |a| &mut a.editor_id)
                .optional(tags::VMAD, |a| &a.scripts, |a| &mut a.scripts)
                .required(tags::OBND, |a| &a.bounds, |a| &mut a.bounds)
                .optional(tags::FULL, |a| &a.name, |a| &mut a.name)
                .optional(tags::MODL, |a| &a.model, |a| &mut a.model)
                .optional(tags::MODT, |a| &a.model_textures, |a| &mut a.model_textures)
                .optional(tags::MODS, |a| &a.model_swaps, |a| &mut a.model_swaps)
                .optional(tags::DEST, |a| &a.destruction, |a| &mut a.destruction)
                .repeated_compound(|a| &a.destruction_stages, |a| &mut a.destruction_stages)
                .optional_compound(|a| &a.keywords, |a| &mut a.keywords)
                .optional(tags::PNAM, |a| &a.marker_color, |a| &mut a.marker_color)
                .optional(tags::SNAM, |a| &a.looping_sound, |a| &mut a.looping_sound)
                .optional(tags::VNAM, |a| &a.activate_sound, |a| &mut a.activate_sound)
                .optional(tags::WNAM, |a| &a.water_type, |a| &mut a.water_type)
                .optional(tags::RNAM, |a| &a.activate_text, |a| &mut a.activate_text)
                .optional(tags::FNAM, |a| &a.flags, |a| &mut a.flags)
                .optional(tags::KNAM, |a| &a.interaction_keyword, |a| &mut a.interaction_keyword)
                .build()
        });
        &SCHEMA
    }

    fn validate(&self) -> Result<()> {
        nonzero_form_id(tags::SNAM, self.looping_sound)?;
        nonzero_form_id(tags::VNAM, self.activate_sound)?;
        nonzero_form_id(tags::WNAM, self.water_type)?;
        nonzero_form_id(tags::KNAM, self.interaction_keyword)?;
        if self.activate_text.as_ref().and_then(LocalizedString::index) == Some(0) {
            return Err(EsmError::InvalidValue {
                tag: tags::RNAM,
                reason: "activation text refers to string index zero".into(),
            });
        }
        Ok(())
    }
}
