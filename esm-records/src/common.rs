//! Field values shared by both generations

use esm_codec::{
    ByteWriter, CompoundValue, EsmError, FieldContext, FieldValue, Generation, Result, Subrecord,
    SubrecordReader, SubrecordWriter, Tag, ZString, exact, subrecord_size, tags,
};

/// Type of a global variable (`FNAM` of `GLOB`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GlobalKind {
    #[default]
    Short,
    Long,
    Float,
}

impl GlobalKind {
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Short => b's',
            Self::Long => b'l',
            Self::Float => b'f',
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b's' => Some(Self::Short),
            b'l' => Some(Self::Long),
            b'f' => Some(Self::Float),
            _ => None,
        }
    }
}

impl FieldValue for GlobalKind {
    fn decode(tag: Tag, payload: &[u8], _ctx: &FieldContext<'_>) -> Result<Self> {
        let [byte] = exact::<1>(tag, payload)?;
        Self::from_byte(byte).ok_or_else(|| EsmError::InvalidValue {
            tag,
            reason: format!("unknown global type {:?}", byte as char),
        })
    }

    fn payload_len(&self) -> usize {
        1
    }

    fn write_payload(&self, out: &mut ByteWriter<'_>) -> Result<()> {
        out.write_u8(self.as_byte())
    }
}

/// A master file dependency: `MAST` file name followed by `DATA` file size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MasterFile {
    pub name: ZString,
    /// Size of the master when the plugin was saved
    pub size: u64,
}

impl MasterFile {
    pub fn new(name: &str, size: u64) -> Self {
        Self {
            name: ZString::new(name),
            size,
        }
    }
}

impl CompoundValue for MasterFile {
    const LEADS: &'static [Tag] = &[tags::MAST];

    fn decode(
        first: Subrecord<'_>,
        rest: &mut SubrecordReader<'_>,
        ctx: &FieldContext<'_>,
    ) -> Result<Self> {
        let name = ZString::decode(first.tag, first.payload, ctx)?;
        let data = rest.expect(tags::DATA)?;
        let size = u64::decode(data.tag, data.payload, ctx)?;
        Ok(Self { name, size })
    }

    fn measure(&self, generation: Generation) -> usize {
        subrecord_size(generation, self.name.payload_len()) + subrecord_size(generation, 8)
    }

    fn encode(&self, out: &mut SubrecordWriter<'_>) -> Result<()> {
        out.put(tags::MAST, &self.name)?;
        out.put(tags::DATA, &self.size)
    }
}

/// Reject a form id of zero in an optional reference field.
pub(crate) fn nonzero_form_id(tag: Tag, value: Option<u32>) -> Result<()> {
    match value {
        Some(0) => Err(EsmError::InvalidValue {
            tag,
            reason: "form id must not be zero".into(),
        }),
        _ => Ok(()),
    }
}
