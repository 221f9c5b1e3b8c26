//! # truckmaps
//!
//! A pure-Rust library for reading SCS truck-simulator game archives and
//! extracting a unified world map model from them.
//!
//! ## Supported containers
//!
//! - **HashFS v2** - hash-addressed containers with compressed entry and
//!   metadata tables, texture-object synthesis included
//! - **HashFS v1** - the flat-table first revision
//! - **ZIP** - plain zip archives, common for mods
//!
//! ## Quick start
//!
//! ```no_run
//! use truckmaps::archive::{self, Archive};
//!
//! let mut base = archive::open("base.scs")?;
//! base.parse_entries()?;
//! let version = base.read_file("version.sii")?;
//! println!("read {} bytes", version.len());
//! # Ok::<(), truckmaps::Error>(())
//! ```
//!
//! A full extraction run layers base archives and mods into a
//! [`archive::CombinedView`] and drives icons, sectors and map assembly
//! through [`pipeline::MapExtractor`]; see the `cli` feature for the
//! command-line surface.

pub mod archive;
pub mod compression;
pub mod error;
pub mod hash;
pub mod icon;
pub mod locale;
pub mod model;
pub mod pipeline;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::archive::{open, Archive, CombinedView};
    pub use crate::error::{Error, Result};
    pub use crate::icon::{DdsDecoder, RasterIcon, TextureDecoder};
    pub use crate::model::{
        assemble, DefinitionSource, Definitions, MapData, SectorParser, SplitConfig,
    };
    pub use crate::pipeline::{ExtractOptions, Game, MapBundle, MapExtractor};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
