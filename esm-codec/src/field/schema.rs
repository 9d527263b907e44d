//! Field tables and the subrecord dispatch loop

use std::fmt;

use super::{CompoundValue, FieldContext, FieldValue};
use crate::error::{EsmError, Result};
use crate::generation::Generation;
use crate::subrecord::{Subrecord, SubrecordReader, SubrecordWriter, subrecord_size};
use crate::tag::Tag;

/// How often a field may occur in one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Exactly once
    Required,
    /// Zero or one time; presence is tracked with `Option`
    Optional,
    /// Any number of times, order preserved
    Repeated,
}

type Get<R, T> = fn(&R) -> &T;
type GetMut<R, T> = fn(&mut R) -> &mut T;

/// Where a field's value lives inside the record struct.
enum Slot<R, V> {
    Required(Get<R, V>, GetMut<R, V>),
    Optional(Get<R, Option<V>>, GetMut<R, Option<V>>),
    Repeated(Get<R, Vec<V>>, GetMut<R, Vec<V>>),
}

impl<R, V> Slot<R, V> {
    fn cardinality(&self) -> Cardinality {
        match self {
            Self::Required(..) => Cardinality::Required,
            Self::Optional(..) => Cardinality::Optional,
            Self::Repeated(..) => Cardinality::Repeated,
        }
    }

    /// Stored values in encode order.
    fn items<'r>(&self, record: &'r R) -> &'r [V] {
        match self {
            Self::Required(get, _) => std::slice::from_ref(get(record)),
            Self::Optional(get, _) => get(record).as_slice(),
            Self::Repeated(get, _) => get(record).as_slice(),
        }
    }

    fn store(&self, record: &mut R, value: V) {
        match self {
            Self::Required(_, get_mut) => *get_mut(record) = value,
            Self::Optional(_, get_mut) => *get_mut(record) = Some(value),
            Self::Repeated(_, get_mut) => get_mut(record).push(value),
        }
    }
}

/// One row of a schema table, type-erased over the value it stores.
pub trait FieldAccess<R>: Send + Sync {
    /// Tags that start this field. The first one names it in errors.
    fn tags(&self) -> &[Tag];

    fn cardinality(&self) -> Cardinality;

    fn decode(
        &self,
        record: &mut R,
        first: Subrecord<'_>,
        rest: &mut SubrecordReader<'_>,
        ctx: &FieldContext<'_>,
    ) -> Result<()>;

    /// Bytes this field occupies on disk for the given record.
    fn measure(&self, record: &R, generation: Generation) -> usize;

    fn encode(&self, record: &R, out: &mut SubrecordWriter<'_>) -> Result<()>;
}

struct Simple<R, V> {
    tag: [Tag; 1],
    slot: Slot<R, V>,
}

impl<R, V> FieldAccess<R> for Simple<R, V>
where
    V: FieldValue,
{
    fn tags(&self) -> &[Tag] {
        &self.tag
    }

    fn cardinality(&self) -> Cardinality {
        self.slot.cardinality()
    }

    fn decode(
        &self,
        record: &mut R,
        first: Subrecord<'_>,
        _rest: &mut SubrecordReader<'_>,
        ctx: &FieldContext<'_>,
    ) -> Result<()> {
        let value = V::decode(first.tag, first.payload, ctx)?;
        self.slot.store(record, value);
        Ok(())
    }

    fn measure(&self, record: &R, generation: Generation) -> usize {
        self.slot
            .items(record)
            .iter()
            .map(|v| subrecord_size(generation, v.payload_len()))
            .sum()
    }

    fn encode(&self, record: &R, out: &mut SubrecordWriter<'_>) -> Result<()> {
        for value in self.slot.items(record) {
            out.put(self.tag[0], value)?;
        }
        Ok(())
    }
}

struct Compound<R, C> {
    slot: Slot<R, C>,
}

impl<R, C> FieldAccess<R> for Compound<R, C>
where
    C: CompoundValue,
{
    fn tags(&self) -> &[Tag] {
        C::LEADS
    }

    fn cardinality(&self) -> Cardinality {
        self.slot.cardinality()
    }

    fn decode(
        &self,
        record: &mut R,
        first: Subrecord<'_>,
        rest: &mut SubrecordReader<'_>,
        ctx: &FieldContext<'_>,
    ) -> Result<()> {
        let value = C::decode(first, rest, ctx)?;
        self.slot.store(record, value);
        Ok(())
    }

    fn measure(&self, record: &R, generation: Generation) -> usize {
        self.slot
            .items(record)
            .iter()
            .map(|v| v.measure(generation))
            .sum()
    }

    fn encode(&self, record: &R, out: &mut SubrecordWriter<'_>) -> Result<()> {
        for value in self.slot.items(record) {
            value.encode(out)?;
        }
        Ok(())
    }
}

// =============================================================================
// Schema
// =============================================================================

/// Ordered field table for one record type.
///
/// Table order is the encode order. Decoding accepts fields in any order,
/// but byte-exact re-encoding assumes files list them in table order.
pub struct Schema<R> {
    record: Tag,
    generation: Generation,
    fields: Vec<Box<dyn FieldAccess<R>>>,
}

impl<R> fmt::Debug for Schema<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<String> = self
            .fields
            .iter()
            .map(|field| format!("{}:{:?}", field.tags()[0], field.cardinality()))
            .collect();
        f.debug_struct("Schema")
            .field("record", &self.record)
            .field("generation", &self.generation)
            .field("fields", &tags)
            .finish()
    }
}

impl<R: 'static> Schema<R> {
    pub fn builder(record: Tag, generation: Generation) -> SchemaBuilder<R> {
        SchemaBuilder {
            schema: Schema {
                record,
                generation,
                fields: Vec::new(),
            },
        }
    }

    pub fn record(&self) -> Tag {
        self.record
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn fields(&self) -> &[Box<dyn FieldAccess<R>>] {
        &self.fields
    }

    /// Index of the field that a subrecord with `tag` opens.
    pub fn field_index(&self, tag: Tag) -> Option<usize> {
        self.fields.iter().position(|f| f.tags().contains(&tag))
    }

    /// Run the subrecord loop over a record body.
    ///
    /// The tag set is closed: unknown tags fail with `UnexpectedTag`, a
    /// second occurrence of a non-repeated field with `DuplicateSubrecord`,
    /// and an absent required field with `MissingRequiredField`.
    pub fn decode_body(
        &self,
        record: &mut R,
        reader: &mut SubrecordReader<'_>,
        ctx: &FieldContext<'_>,
    ) -> Result<()> {
        let mut seen = vec![false; self.fields.len()];

        while let Some(sub) = reader.next_subrecord()? {
            let index = self
                .field_index(sub.tag)
                .ok_or(EsmError::UnexpectedTag {
                    context: self.record,
                    expected: None,
                    found: sub.tag,
                })?;
            let field = &self.fields[index];
            if seen[index] && field.cardinality() != Cardinality::Repeated {
                return Err(EsmError::DuplicateSubrecord {
                    record: self.record,
                    tag: sub.tag,
                });
            }
            seen[index] = true;
            field.decode(record, sub, reader, ctx)?;
        }

        for (field, &seen) in self.fields.iter().zip(&seen) {
            if !seen && field.cardinality() == Cardinality::Required {
                return Err(EsmError::MissingRequiredField {
                    record: self.record,
                    tag: field.tags()[0],
                });
            }
        }
        Ok(())
    }

    /// Body size in bytes, subrecord headers and escapes included.
    pub fn body_size(&self, record: &R) -> usize {
        self.fields
            .iter()
            .map(|f| f.measure(record, self.generation))
            .sum()
    }

    pub fn encode_body(&self, record: &R, out: &mut SubrecordWriter<'_>) -> Result<()> {
        for field in &self.fields {
            field.encode(record, out)?;
        }
        Ok(())
    }
}

/// Builds a [`Schema`] in encode order.
///
/// Accessors are plain functions, so schemas can live in a `static`:
///
/// ```ignore
/// Schema::builder(tags::GLOB, Generation::Tes3)
///     .required(tags::NAME, |g| &g.id, |g| &mut g.id)
///     .optional(tags::SCRI, |g| &g.script, |g| &mut g.script)
///     .build()
/// ```
pub struct SchemaBuilder<R> {
    schema: Schema<R>,
}

impl<R: 'static> SchemaBuilder<R> {
    pub fn required<V: FieldValue + 'static>(
        self,
        tag: Tag,
        get: Get<R, V>,
        get_mut: GetMut<R, V>,
    ) -> Self {
        self.simple(tag, Slot::Required(get, get_mut))
    }

    pub fn optional<V: FieldValue + 'static>(
        self,
        tag: Tag,
        get: Get<R, Option<V>>,
        get_mut: GetMut<R, Option<V>>,
    ) -> Self {
        self.simple(tag, Slot::Optional(get, get_mut))
    }

    pub fn repeated<V: FieldValue + 'static>(
        self,
        tag: Tag,
        get: Get<R, Vec<V>>,
        get_mut: GetMut<R, Vec<V>>,
    ) -> Self {
        self.simple(tag, Slot::Repeated(get, get_mut))
    }

    pub fn required_compound<C: CompoundValue + 'static>(
        self,
        get: Get<R, C>,
        get_mut: GetMut<R, C>,
    ) -> Self {
        self.compound(Slot::Required(get, get_mut))
    }

    pub fn optional_compound<C: CompoundValue + 'static>(
        self,
        get: Get<R, Option<C>>,
        get_mut: GetMut<R, Option<C>>,
    ) -> Self {
        self.compound(Slot::Optional(get, get_mut))
    }

    pub fn repeated_compound<C: CompoundValue + 'static>(
        self,
        get: Get<R, Vec<C>>,
        get_mut: GetMut<R, Vec<C>>,
    ) -> Self {
        self.compound(Slot::Repeated(get, get_mut))
    }

    pub fn build(self) -> Schema<R> {
        debug_assert!(
            {
                let mut all: Vec<Tag> = self
                    .schema
                    .fields
                    .iter()
                    .flat_map(|f| f.tags().iter().copied())
                    .collect();
                let count = all.len();
                all.sort();
                all.dedup();
                all.len() == count
            },
            "schema for {} binds a tag to more than one field",
            self.schema.record
        );
        self.schema
    }

    fn simple<V: FieldValue + 'static>(mut self, tag: Tag, slot: Slot<R, V>) -> Self {
        self.schema.fields.push(Box::new(Simple { tag: [tag], slot }));
        self
    }

    fn compound<C: CompoundValue + 'static>(mut self, slot: Slot<R, C>) -> Self {
        self.schema.fields.push(Box::new(Compound { slot }));
        self
    }
}
