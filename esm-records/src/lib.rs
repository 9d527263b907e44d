//! esm-records: record types and plugin containers for TES3 and TES4 files
//!
//! Record types are [`RecordSchema`](esm_codec::RecordSchema)
//! implementations: a struct plus its field table. A [`Registry`] decides
//! which of them a loader uses; every other record type is kept as a
//! [`GenericRecord`](esm_codec::GenericRecord) and written back unchanged.
//!
//! ```ignore
//! use esm_records::{Registry, Tes4Plugin, tes4};
//!
//! let plugin = Tes4Plugin::load(path, &Registry::tes4(), &CodecConfig::default())?;
//! let global = plugin.find_record(0x0000_0038).and_then(|r| r.fields::<tes4::Global>());
//! ```

mod common;
mod plugin;
mod registry;
pub mod tes3;
pub mod tes4;

pub use common::{GlobalKind, MasterFile};
pub use plugin::{Tes3Plugin, Tes4Plugin, sniff_file, sniff_generation};
pub use registry::{DecodeFn, Registry};
