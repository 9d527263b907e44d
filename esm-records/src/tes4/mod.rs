//! Skyrim-era records (2-byte subrecord lengths, 24-byte headers, groups)

mod activator;
mod components;
mod global;
mod header;
mod sound;
mod world;

pub use activator::Activator;
pub use components::{DestructionStage, Keywords};
pub use global::Global;
pub use header::{FileHeader, HeaderData};
pub use sound::Sound;
pub use world::WorldSpace;
