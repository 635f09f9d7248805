//! WAD file access: directory/lump reader, map-lump parser, and the bridge
//! that turns raw lumps into a [`crate::world::Level`].

pub mod level;
pub mod loader;
pub mod wad;

pub use level::{Level as RawLevel, LevelError};
pub use loader::{load_level, LoadError};
pub use wad::{LumpInfo, Wad, WadError};
