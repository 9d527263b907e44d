//! Multi-subrecord values used by several TES4 object records

use esm_codec::{
    Blob, CompoundValue, EsmError, FieldContext, FieldValue, FormIdList, Generation, Result,
    Subrecord, SubrecordReader, SubrecordWriter, Tag, ZString, subrecord_size, tags,
};

/// Keyword list: `KSIZ` count followed by `KWDA` form ids. An absent list
/// is written as nothing, never as a zero count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keywords(pub Vec<u32>);

impl CompoundValue for Keywords {
    const LEADS: &'static [Tag] = &[tags::KSIZ];

    fn decode(
        first: Subrecord<'_>,
        rest: &mut SubrecordReader<'_>,
        ctx: &FieldContext<'_>,
    ) -> Result<Self> {
        let count = u32::decode(first.tag, first.payload, ctx)?;
        if count == 0 {
            return Err(EsmError::InvalidValue {
                tag: tags::KSIZ,
                reason: "keyword count is zero".into(),
            });
        }
        let data = rest.expect(tags::KWDA)?;
        let FormIdList(ids) = FormIdList::decode(data.tag, data.payload, ctx)?;
        if ids.len() != count as usize {
            return Err(EsmError::InvalidValue {
                tag: tags::KWDA,
                reason: format!("{} keywords, but KSIZ says {count}", ids.len()),
            });
        }
        Ok(Self(ids))
    }

    fn measure(&self, generation: Generation) -> usize {
        subrecord_size(generation, 4) + subrecord_size(generation, self.0.len() * 4)
    }

    fn encode(&self, out: &mut SubrecordWriter<'_>) -> Result<()> {
        if self.0.is_empty() {
            return Err(EsmError::InvalidValue {
                tag: tags::KSIZ,
                reason: "keyword count is zero".into(),
            });
        }
        out.put(tags::KSIZ, &(self.0.len() as u32))?;
        out.write_header(tags::KWDA, self.0.len() * 4)?;
        for &id in &self.0 {
            out.bytes().write_u32(id)?;
        }
        Ok(())
    }
}

/// One destruction stage. Any of `DSTD`, `DMDL`, `DMDT` and `DMDS` opens
/// the stage, each at most once, and an empty `DSTF` closes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestructionStage {
    pub data: Option<[u8; 20]>,
    pub model: Option<ZString>,
    pub textures: Option<Blob>,
    pub swaps: Option<Blob>,
}

impl CompoundValue for DestructionStage {
    const LEADS: &'static [Tag] = &[tags::DSTD, tags::DMDL, tags::DMDT, tags::DMDS];

    fn decode(
        first: Subrecord<'_>,
        rest: &mut SubrecordReader<'_>,
        ctx: &FieldContext<'_>,
    ) -> Result<Self> {
        let mut stage = Self::default();
        let mut sub = first;
        loop {
            match sub.tag {
                tags::DSTF => {
                    if !sub.payload.is_empty() {
                        return Err(EsmError::FieldLength {
                            tag: tags::DSTF,
                            expected: 0,
                            found: sub.payload.len(),
                        });
                    }
                    return Ok(stage);
                }
                tags::DSTD => set_once(&mut stage.data, sub, ctx)?,
                tags::DMDL => set_once(&mut stage.model, sub, ctx)?,
                tags::DMDT => set_once(&mut stage.textures, sub, ctx)?,
                tags::DMDS => set_once(&mut stage.swaps, sub, ctx)?,
                found => {
                    return Err(EsmError::UnexpectedTag {
                        context: ctx.record,
                        expected: Some(tags::DSTF),
                        found,
                    });
                }
            }
            sub = rest
                .next_subrecord()?
                .ok_or(EsmError::MissingRequiredField {
                    record: ctx.record,
                    tag: tags::DSTF,
                })?;
        }
    }

    fn measure(&self, generation: Generation) -> usize {
        let size = |len: usize| subrecord_size(generation, len);
        self.data.map_or(0, |d| size(d.len()))
            + self.model.as_ref().map_or(0, |m| size(m.payload_len()))
            + self.textures.as_ref().map_or(0, |t| size(t.payload_len()))
            + self.swaps.as_ref().map_or(0, |s| size(s.payload_len()))
            + size(0)
    }

    fn encode(&self, out: &mut SubrecordWriter<'_>) -> Result<()> {
        if let Some(data) = &self.data {
            out.put(tags::DSTD, data)?;
        }
        if let Some(model) = &self.model {
            out.put(tags::DMDL, model)?;
        }
        if let Some(textures) = &self.textures {
            out.put(tags::DMDT, textures)?;
        }
        if let Some(swaps) = &self.swaps {
            out.put(tags::DMDS, swaps)?;
        }
        out.write_raw(tags::DSTF, &[])
    }
}

fn set_once<V: FieldValue>(
    slot: &mut Option<V>,
    sub: Subrecord<'_>,
    ctx: &FieldContext<'_>,
) -> Result<()> {
    if slot.is_some() {
        return Err(EsmError::DuplicateSubrecord {
            record: ctx.record,
            tag: sub.tag,
        });
    }
    *slot = Some(V::decode(sub.tag, sub.payload, ctx)?);
    Ok(())
}
