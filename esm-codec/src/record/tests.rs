use std::sync::LazyLock;

use super::*;
use crate::field::ZString;
use crate::subrecord::LENGTH_ESCAPE_SIZE;
use crate::tag::tags;

#[derive(Debug, Default, Clone, PartialEq)]
struct Global {
    id: ZString,
    kind: u8,
    value: Option<f32>,
    notes: Vec<u32>,
}

impl RecordSchema for Global {
    const TAG: Tag = tags::GLOB;
    const GENERATION: Generation = Generation::Tes3;

    fn schema() -> &'static Schema<Self> {
        static SCHEMA: LazyLock<Schema<Global>> = LazyLock::new(|| {
            Schema::<Global>::builder(tags::GLOB, Generation::Tes3)
                .required(tags::NAME, |g| &g.id, |g| &mut g.id)
                .required(tags::FNAM, |g| &g.kind, |g| &mut g.kind)
                .optional(tags::FLTV, |g| &g.value, |g| &mut g.value)
                .repeated(tags::INTV, |g| &g.notes, |g| &mut g.notes)
                .build()
        });
        &SCHEMA
    }

    fn validate(&self) -> Result<()> {
        match self.kind {
            b's' | b'l' | b'f' => Ok(()),
            other => Err(EsmError::InvalidValue {
                tag: tags::FNAM,
                reason: format!("unknown global kind {other:#04x}"),
            }),
        }
    }
}

fn record(tag: &[u8; 4], flags: u32, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(tag);
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(&flags.to_le_bytes());
    out.extend_from_slice(body);
    out
}

const NAME: &[u8] = b"NAME\x11\0\0\0NPCVoiceDistance\0";
const FNAM: &[u8] = b"FNAM\x01\0\0\0s";
const FLTV: &[u8] = b"FLTV\x04\0\0\0\x00\x80\x3B\x44";

fn voice_distance() -> Vec<u8> {
    record(b"GLOB", 0, &[NAME, FNAM, FLTV].concat())
}

fn decode(bytes: &[u8]) -> Result<Record<Global>> {
    Record::<Global>::from_bytes(bytes, &DecodeContext::default())
}

#[test]
fn test_decode_global() {
    let bytes = voice_distance();
    assert_eq!(&bytes[4..8], &[0x2Eu8, 0, 0, 0]);

    let record = decode(&bytes).unwrap();
    let global = record.fields().unwrap();
    assert_eq!(global.id, "NPCVoiceDistance");
    assert_eq!(global.kind, b's');
    assert_eq!(global.value, Some(750.0));
    assert!(global.notes.is_empty());
    assert_eq!(record.header, RecordHeader::Tes3 { unknown: 0, flags: 0 });
}

#[test]
fn test_global_roundtrip() {
    let bytes = voice_distance();
    let record = decode(&bytes).unwrap();
    assert_eq!(record.body_size().unwrap(), 0x2E);
    assert_eq!(record.total_written_size().unwrap() as usize, bytes.len());
    assert_eq!(record.to_bytes().unwrap(), bytes);
}

#[test]
fn test_missing_required_fields() {
    let no_name = record(b"GLOB", 0, &[FNAM, FLTV].concat());
    assert!(matches!(
        decode(&no_name),
        Err(EsmError::MissingRequiredField { tag, .. }) if tag == tags::NAME
    ));

    let no_kind = record(b"GLOB", 0, &[NAME, FLTV].concat());
    assert!(matches!(
        decode(&no_kind),
        Err(EsmError::MissingRequiredField { tag, .. }) if tag == tags::FNAM
    ));
}

#[test]
fn test_optional_field_absent() {
    let bytes = record(b"GLOB", 0, &[NAME, FNAM].concat());
    let record = decode(&bytes).unwrap();
    assert_eq!(record.fields().unwrap().value, None);
    assert_eq!(record.to_bytes().unwrap(), bytes);
}

#[test]
fn test_repeated_fields_keep_order() {
    let body = [
        NAME,
        FNAM,
        b"INTV\x04\0\0\0\x02\0\0\0",
        b"INTV\x04\0\0\0\x01\0\0\0",
    ]
    .concat();
    let bytes = record(b"GLOB", 0, &body);
    let record = decode(&bytes).unwrap();
    assert_eq!(record.fields().unwrap().notes, vec![2, 1]);
    assert_eq!(record.to_bytes().unwrap(), bytes);
}

#[test]
fn test_duplicate_field() {
    let bytes = record(b"GLOB", 0, &[NAME, FNAM, FNAM].concat());
    assert!(matches!(
        decode(&bytes),
        Err(EsmError::DuplicateSubrecord { tag, .. }) if tag == tags::FNAM
    ));
}

#[test]
fn test_unknown_subrecord() {
    let bytes = record(b"GLOB", 0, &[NAME, FNAM, b"SCRI\x01\0\0\0\0"].concat());
    assert!(matches!(
        decode(&bytes),
        Err(EsmError::UnexpectedTag { expected: None, found, .. }) if found == tags::SCRI
    ));
}

#[test]
fn test_wrong_record_tag() {
    let bytes = record(b"ACTI", 0, &[NAME, FNAM].concat());
    assert!(matches!(
        decode(&bytes),
        Err(EsmError::UnexpectedTag { found, .. }) if found == tags::ACTI
    ));
}

#[test]
fn test_subrecord_overrun() {
    let bytes = record(b"GLOB", 0, &[NAME, b"FNAM\x09\0\0\0s"].concat());
    assert!(matches!(
        decode(&bytes),
        Err(EsmError::CorruptLength { declared: 9, remaining: 1, .. })
    ));
}

#[test]
fn test_truncated_body() {
    let bytes = voice_distance();
    let short = &bytes[..30];
    assert!(matches!(
        decode(short),
        Err(EsmError::TruncatedRecord {
            declared: 0x2E,
            available: 14,
            ..
        })
    ));
}

#[test]
fn test_validate_runs_after_decode() {
    let bytes = record(b"GLOB", 0, &[NAME, b"FNAM\x01\0\0\0x"].concat());
    assert!(matches!(decode(&bytes), Err(EsmError::InvalidValue { .. })));
}

#[test]
fn test_record_size_cap() {
    let config = CodecConfig {
        max_record_size: 16,
        ..Default::default()
    };
    let ctx = DecodeContext::new(&config);
    let err = Record::<Global>::from_bytes(&voice_distance(), &ctx).unwrap_err();
    assert!(matches!(err, EsmError::RecordTooLarge { size: 0x2E, max: 16, .. }));
}

#[test]
fn test_deleted_record_kept_verbatim() {
    // Deleted records only carry an id and a marker; the schema would reject this
    let body = [NAME, b"DELE\x04\0\0\0\0\0\0\0"].concat();
    let bytes = record(b"GLOB", FLAG_DELETED, &body);

    let record = decode(&bytes).unwrap();
    assert!(record.header.is_deleted());
    assert!(record.fields().is_none());
    assert_eq!(record.body, RecordBody::Verbatim(body));
    assert_eq!(record.to_bytes().unwrap(), bytes);
}

#[test]
fn test_compressed_bit_is_not_special_in_tes3() {
    let bytes = record(b"GLOB", FLAG_COMPRESSED, &[NAME, FNAM].concat());
    let record = decode(&bytes).unwrap();
    assert!(!record.header.is_compressed());
    assert!(record.fields().is_some());
}

#[test]
fn test_new_record_encodes_in_table_order() {
    let global = Global {
        id: ZString::new("NPCVoiceDistance"),
        kind: b's',
        value: Some(750.0),
        notes: Vec::new(),
    };
    assert_eq!(Record::new(global).to_bytes().unwrap(), voice_distance());
}

#[test]
fn test_header_layout_mismatch() {
    let mut record = Record::new(Global::default());
    record.header = RecordHeader::new(Generation::Tes4);
    assert!(matches!(record.to_bytes(), Err(EsmError::InvalidValue { .. })));
}

#[test]
fn test_any_record_downcast() {
    let record: Box<dyn AnyRecord> = Box::new(decode(&voice_distance()).unwrap());
    assert_eq!(record.tag(), tags::GLOB);
    assert_eq!(record.fields::<Global>().unwrap().kind, b's');
    assert!(record.downcast_ref::<GenericRecord>().is_none());

    let mut out = Vec::new();
    record.encode(&mut out).unwrap();
    assert_eq!(out, voice_distance());
}

fn decode_generic(bytes: &[u8], generation: Generation) -> Result<GenericRecord> {
    let mut source = bytes;
    let mut reader = StreamReader::new(&mut source);
    let tag = reader.read_tag()?;
    GenericRecord::decode_after_tag(tag, generation, &mut reader, &DecodeContext::default())
}

#[test]
fn test_generic_tes3_roundtrip() {
    let bytes = voice_distance();
    let record = decode_generic(&bytes, Generation::Tes3).unwrap();
    assert_eq!(record.subrecords().len(), 3);
    assert_eq!(record.editor_id().unwrap(), "NPCVoiceDistance");
    assert_eq!(record.first(tags::FNAM).unwrap().payload, b"s");

    let mut out = Vec::new();
    record.encode(&mut out).unwrap();
    assert_eq!(out, bytes);
}

#[test]
fn test_generic_tes4_large_payload() {
    let mut record = GenericRecord::new(tags::WRLD, Generation::Tes4);
    record.header = RecordHeader::Tes4 {
        flags: 0,
        form_id: 0x0000_003C,
        revision: 0,
        version: 40,
        reserved: 0,
    };
    record.body = RecordBody::Fields(vec![
        RawSubrecord {
            tag: tags::EDID,
            payload: b"Tamriel\0".to_vec(),
        },
        RawSubrecord {
            tag: tags::OFST,
            payload: vec![7; 70_000],
        },
    ]);

    let mut out = Vec::new();
    record.encode(&mut out).unwrap();
    let expected_body = 6 + 8 + LENGTH_ESCAPE_SIZE + 6 + 70_000;
    assert_eq!(out.len(), 24 + expected_body);
    assert_eq!(record.body_size().unwrap() as usize, expected_body);

    let decoded = decode_generic(&out, Generation::Tes4).unwrap();
    assert_eq!(decoded, record);
    assert_eq!(decoded.header.form_id(), Some(0x3C));
    assert_eq!(decoded.editor_id().unwrap(), "Tamriel");
}

#[test]
fn test_generic_compressed_kept_verbatim() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"WRLD");
    bytes.extend_from_slice(&8u32.to_le_bytes());
    bytes.extend_from_slice(&FLAG_COMPRESSED.to_le_bytes());
    bytes.extend_from_slice(&[0; 12]);
    bytes.extend_from_slice(&[0x10, 0, 0, 0, 0x78, 0x9C, 0x01, 0x02]);

    let record = decode_generic(&bytes, Generation::Tes4).unwrap();
    assert!(record.header.is_compressed());
    assert!(record.subrecords().is_empty());

    let mut out = Vec::new();
    record.encode(&mut out).unwrap();
    assert_eq!(out, bytes);
}
