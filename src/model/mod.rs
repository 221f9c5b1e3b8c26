//! World model: sector items, definition dictionaries and map assembly

pub mod assembly;
pub mod defs;
pub mod items;
pub mod output;
pub mod poi;
pub mod sectors;

pub use assembly::{assemble, SplitConfig};
pub use defs::{DefinitionSource, Definitions};
pub use items::{Item, ItemKind, Node};
pub use output::MapData;
pub use poi::{Poi, PoiKind};
pub use sectors::{SectorContent, SectorData, SectorParser};
