//! `WRLD` world spaces
//!
//! Climate, water, flags and the name are typed. The other subrecords are
//! kept as opaque bytes so real world spaces still load and re-encode.

use std::sync::LazyLock;

use esm_codec::{Blob, Generation, LocalizedString, RecordSchema, Schema, Tag, ZString, tags};

const MHDT: Tag = Tag::new(b"MHDT");
const WCTR: Tag = Tag::new(b"WCTR");
const LTMP: Tag = Tag::new(b"LTMP");
const XEZN: Tag = Tag::new(b"XEZN");
const XLCN: Tag = Tag::new(b"XLCN");
const NAM3: Tag = Tag::new(b"NAM3");
const NAM4: Tag = Tag::new(b"NAM4");
const DNAM: Tag = Tag::new(b"DNAM");
const MNAM: Tag = Tag::new(b"MNAM");
const NAMA: Tag = Tag::new(b"NAMA");
const NAM0: Tag = Tag::new(b"NAM0");
const NAM9: Tag = Tag::new(b"NAM9");
const ZNAM: Tag = Tag::new(b"ZNAM");
const TNAM: Tag = Tag::new(b"TNAM");
const UNAM: Tag = Tag::new(b"UNAM");
const XWEM: Tag = Tag::new(b"XWEM");

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldSpace {
    pub editor_id: ZString,
    pub large_references: Vec<Blob>,
    pub max_height: Option<Blob>,
    pub name: Option<LocalizedString>,
    pub center_cell: Option<[u8; 4]>,
    pub interior_lighting: Option<u32>,
    pub encounter_zone: Option<u32>,
    pub climate: Option<u32>,
    pub location: Option<u32>,
    pub parent: Option<u32>,
    pub parent_flags: Option<Blob>,
    pub water: Option<u32>,
    pub lod_water: Option<u32>,
    pub lod_water_height: Option<f32>,
    pub land_data: Option<Blob>,
    pub model: Option<ZString>,
    pub model_textures: Option<Blob>,
    pub map_data: Option<Blob>,
    pub map_offset: Option<Blob>,
    pub distant_lod_multiplier: Option<f32>,
    pub flags: Option<u8>,
    pub bounds_min: Option<Blob>,
    pub bounds_max: Option<Blob>,
    pub music: Option<u32>,
    pub canopy_shadow: Option<ZString>,
    pub water_noise: Option<ZString>,
    pub water_environment_map: Option<ZString>,
    /// Cell offset table; often larger than 65535 bytes
    pub offsets: Option<Blob>,
}

impl RecordSchema for WorldSpace {
    const TAG: Tag = tags::WRLD;
    const GENERATION: Generation = Generation::Tes4;

    fn schema() -> &'static Schema<Self> {
        static SCHEMA: LazyLock<Schema<WorldSpace>> = LazyLock::new(|| {
            Schema::<WorldSpace>::builder(tags::WRLD, Generation::Tes4)
                .required(tags::EDID, |w| &w.editor_id, |w| &mut w.editor_id)
                .repeated(tags::RNAM, |w| &w.large_references, |w| &mut w.large_references)
                .optional(MHDT, |w| &w.max_height, |w| &mut w.max_height)
                .optional(tags::FULL, |w| &w.name, |w| &mut w.name)
                .optional(WCTR, |w| &w.center_cell, |w| &mut w.center_cell)
                .optional(LTMP, |w| &w.interior_lighting, |w| &mut w.interior_lighting)
                .optional(XEZN, |w| &w.encounter_zone, |w| &mut w.encounter_zone)
                .optional(tags::CNAM, |w| &w.climate, |w| &mut w.climate)
                .optional(XLCN, |w| &w.location, |w| &mut w.location)
                .optional(tags::WNAM, |w| &w.parent, |w| &mut w.parent)
                .optional(tags::PNAM, |w| &w.parent_flags, |w| &mut w.parent_flags)
                .optional(tags::NAM2, |w| &w.water, |w| &mut w.water)
                .optional(NAM3, |w| &w.lod_water, |w| &mut w.lod_water)
                .optional(NAM4, |w| &w.lod_water_height, |w| &mut w.lod_water_height)
                .optional(DNAM, |w| &w.land_data, |w| &mut w.land_data)
                .optional(tags::MODL, |w| &w.model, |w| &mut w.model)
                .optional(tags::MODT, |w| &w.model_textures, |w| &mut w.model_textures)
                .optional(MNAM, |w| &w.map_data, |w| &mut w.map_data)
                .optional(tags::ONAM, |w| &w.map_offset, |w| &mut w.map_offset)
                .optional(NAMA, |w| &w.distant_lod_multiplier, |w| &mut w.distant_lod_multiplier)
                .optional(tags::DATA, |w| &w.flags, |w| &mut w.flags)
                .optional(NAM0, |w| &w.bounds_min, |w| &mut w.bounds_min)
                .optional(NAM9, |w| &w.bounds_max, |w| &mut w.bounds_max)
                .optional(ZNAM, |w| &w.music, |w| &mut w.music)
                .optional(TNAM, |w| &w.canopy_shadow, |w| &mut w.canopy_shadow)
                .optional(UNAM, |w| &w.water_noise, |w| &mut w.water_noise)
                .optional(XWEM, |w| &w.water_environment_map, |w| &mut w.water_environment_map)
                .optional(tags::OFST, |w| &w.offsets, |w| &mut w.offsets)
                .build()
        });
        &SCHEMA
    }
}
