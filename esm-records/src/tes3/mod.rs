//! Morrowind-era records (4-byte subrecord lengths, 16-byte headers)

mod activator;
mod global;
mod header;
mod sound;

pub use activator::Activator;
pub use global::Global;
pub use header::{FileHeader, HEADER_DATA_LEN, HeaderData};
pub use sound::{Sound, SoundData};
