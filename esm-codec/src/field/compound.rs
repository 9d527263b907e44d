//! Values spanning several consecutive subrecords

use crate::error::Result;
use crate::generation::Generation;
use crate::subrecord::{Subrecord, SubrecordReader, SubrecordWriter};
use crate::tag::Tag;

use super::FieldContext;

/// A logical element made of a run of subrecords, such as a master file
/// entry (`MAST` followed by `DATA`) or a keyword list (`KSIZ` followed by
/// `KWDA`).
///
/// The record codec dispatches on [`LEADS`](Self::LEADS); the
/// implementation then pulls its follower subrecords from the same reader.
/// Follower tags that appear without a lead are rejected by the record
/// codec as unexpected.
pub trait CompoundValue: Sized {
    /// Tags that may open an element.
    const LEADS: &'static [Tag];

    fn decode(
        first: Subrecord<'_>,
        rest: &mut SubrecordReader<'_>,
        ctx: &FieldContext<'_>,
    ) -> Result<Self>;

    /// Bytes the element occupies on disk, subrecord headers included.
    fn measure(&self, generation: Generation) -> usize;

    fn encode(&self, out: &mut SubrecordWriter<'_>) -> Result<()>;
}
