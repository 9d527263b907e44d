//! `SOUN` sound definitions

use std::sync::LazyLock;

use esm_codec::{
    ByteWriter, FieldContext, FieldValue, Generation, RecordSchema, Result, Schema, Tag, ZString,
    exact, tags,
};

/// `DATA` of a TES3 sound: volume and attenuation range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SoundData {
    pub volume: u8,
    pub min_range: u8,
    pub max_range: u8,
}

impl FieldValue for SoundData {
    fn decode(tag: Tag, payload: &[u8], _ctx: &FieldContext<'_>) -> Result<Self> {
        let [volume, min_range, max_range] = exact::<3>(tag, payload)?;
        Ok(Self {
            volume,
            min_range,
            max_range,
        })
    }

    fn payload_len(&self) -> usize {
        3
    }

    fn write_payload(&self, out: &mut ByteWriter<'_>) -> Result<()> {
        out.write_bytes(&[self.volume, self.min_range, self.max_range])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sound {
    pub id: ZString,
    pub file: ZString,
    pub data: SoundData,
}

impl RecordSchema for Sound {
    const TAG: Tag = tags::SOUN;
    const GENERATION: Generation = Generation::Tes3;

    fn schema() -> &'static Schema<Self> {
        static SCHEMA: LazyLock<Schema<Sound>> = LazyLock::new(|| {
            Schema::<Sound>::builder(tags::SOUN, Generation::Tes3)
                .required(tags::NAME, |s| &s.id, |s| &mut s.id)
                .required(tags::FNAM, |s| &s.file, |s| &mut s.file)
                .required(tags::DATA, |s| &s.data, |s| &mut s.data)
                .build()
        });
        &SCHEMA
    }
}
