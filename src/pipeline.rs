//! Extraction pipeline
//!
//! Opens the base game archives plus any mod archives, layers them into one
//! combined view (mods shadow base), and drives the extraction passes:
//! version and locale reads, definition loading, icon decoding, sector
//! aggregation and map assembly. Base archives are required; a failing mod
//! is logged, counted and skipped.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;

use crate::archive::{self, Archive, CombinedView};
use crate::error::Result;
use crate::icon::{self, DdsDecoder, RasterIcon, TextureDecoder};
use crate::locale;
use crate::model::assembly::{self, SplitConfig};
use crate::model::defs::DefinitionSource;
use crate::model::sectors::{self, SectorParser};
use crate::model::MapData;

/// Progress callback type
pub type ProgressCallback<'a> = &'a dyn Fn(&ExtractProgress);

/// Which simulation title the archive set belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Game {
    /// American title, platform tag `ats`
    Ats,
    /// European title, platform tag `eut2`
    Eut2,
}

impl Game {
    /// Platform tag as written in game data
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Game::Ats => "ats",
            Game::Eut2 => "eut2",
        }
    }

    /// Map directory used when `map/` lists no subdirectories
    #[must_use]
    pub fn default_map(self) -> &'static str {
        match self {
            Game::Ats => "usa",
            Game::Eut2 => "europe",
        }
    }

    /// Parse a platform tag
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "ats" => Some(Game::Ats),
            "eut2" => Some(Game::Eut2),
            _ => None,
        }
    }
}

/// Phase of an extraction run; each phase reports a monotone counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractPhase {
    OpeningArchives,
    ReadingDefs,
    ReadingIcons,
    ReadingSectors,
    Assembling,
    Complete,
}

impl ExtractPhase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpeningArchives => "Opening archives",
            Self::ReadingDefs => "Reading definitions",
            Self::ReadingIcons => "Reading icons",
            Self::ReadingSectors => "Reading sectors",
            Self::Assembling => "Assembling map",
            Self::Complete => "Complete",
        }
    }
}

/// Progress information during extraction
#[derive(Debug, Clone)]
pub struct ExtractProgress {
    pub phase: ExtractPhase,
    pub current: usize,
    pub total: usize,
    pub current_file: Option<String>,
}

impl ExtractProgress {
    #[must_use]
    pub fn new(phase: ExtractPhase, current: usize, total: usize) -> Self {
        Self {
            phase,
            current,
            total,
            current_file: None,
        }
    }
}

/// Extraction options
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub game: Game,
    /// Emit definition dictionaries only; skip sectors and icons
    pub only_defs: bool,
    /// Mod archives layered over the base set, in activation order
    pub mods: Vec<PathBuf>,
    pub split: SplitConfig,
}

impl ExtractOptions {
    #[must_use]
    pub fn new(game: Game) -> Self {
        Self {
            game,
            only_defs: false,
            mods: Vec::new(),
            split: SplitConfig::default(),
        }
    }
}

/// The emitted bundle: map label, map data and decoded icons
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapBundle {
    pub map: String,
    pub map_data: MapData,
    /// Decoded icon rasters; serialized separately (PNG files), not as JSON
    #[serde(skip)]
    pub icons: IndexMap<String, RasterIcon>,
    /// Pack version identifier, when the archive set carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// True when some sector or mod failed and was skipped
    pub incomplete: bool,
}

/// Drives a full extraction over one archive set
pub struct MapExtractor<D, S> {
    defs_source: D,
    sector_parser: S,
    decoder: Box<dyn TextureDecoder>,
}

impl<D: DefinitionSource, S: SectorParser> MapExtractor<D, S> {
    pub fn new(defs_source: D, sector_parser: S) -> Self {
        Self {
            defs_source,
            sector_parser,
            decoder: Box::new(DdsDecoder),
        }
    }

    /// Replace the texture decoder (tests use fakes)
    #[must_use]
    pub fn with_decoder(mut self, decoder: Box<dyn TextureDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Run the extraction over base archives plus mods.
    ///
    /// # Errors
    /// Fails when a base archive cannot be opened or parsed, or when
    /// definition loading fails. Mod and sector failures are soft: logged,
    /// counted, and flagged on the bundle.
    pub fn extract(
        &self,
        base_archives: &[PathBuf],
        options: &ExtractOptions,
        progress: Option<ProgressCallback>,
    ) -> Result<MapBundle> {
        let progress = progress.unwrap_or(&|_| {});
        let mut incomplete = false;

        let total = base_archives.len() + options.mods.len();
        progress(&ExtractProgress::new(ExtractPhase::OpeningArchives, 0, total));

        let mut view = CombinedView::new();
        for (i, path) in base_archives.iter().enumerate() {
            view.push(open_archive(path)?);
            progress(&ExtractProgress::new(
                ExtractPhase::OpeningArchives,
                i + 1,
                total,
            ));
        }
        // Mods come after base archives so their keys shadow base keys; a
        // broken mod must not stop the remaining ones.
        for (i, path) in options.mods.iter().enumerate() {
            match open_archive(path) {
                Ok(archive) => view.push(archive),
                Err(e) => {
                    tracing::warn!(mod_archive = %path.display(), error = %e, "skipping mod archive");
                    incomplete = true;
                }
            }
            progress(&ExtractProgress::new(
                ExtractPhase::OpeningArchives,
                base_archives.len() + i + 1,
                total,
            ));
        }

        let version = locale::read_version(&mut view)?;
        let locale_table = locale::read_locale(&mut view)?;

        progress(&ExtractProgress::new(ExtractPhase::ReadingDefs, 0, 1));
        let defs = self.defs_source.load(&mut view, &locale_table)?;

        if options.only_defs {
            progress(&ExtractProgress::new(ExtractPhase::Complete, 1, 1));
            let map_data = MapData {
                countries: defs
                    .countries
                    .iter()
                    .map(|(token, def)| {
                        let name = locale::localized_name(
                            &locale_table,
                            &def.name,
                            def.name_localized.as_deref(),
                        );
                        crate::model::output::CountryOut::from_def(token, def, name)
                    })
                    .collect(),
                company_defs: defs
                    .companies
                    .iter()
                    .map(|(token, def)| {
                        (
                            token.clone(),
                            crate::model::output::CompanyDefOut {
                                name: def.name.clone(),
                            },
                        )
                    })
                    .collect(),
                road_looks: defs.road_looks.clone(),
                prefab_descriptions: defs.prefab_descriptions.clone(),
                model_descriptions: defs.model_descriptions.clone(),
                achievements: defs.achievements.clone(),
                routes: defs.routes.clone(),
                mileage_targets: defs.mileage_targets.clone(),
                ..MapData::default()
            };
            return Ok(MapBundle {
                map: options.game.default_map().to_string(),
                map_data,
                icons: IndexMap::new(),
                version,
                incomplete,
            });
        }

        progress(&ExtractProgress::new(ExtractPhase::ReadingIcons, 0, 1));
        let icons = icon::extract_icons(&mut view, self.decoder.as_ref())?;

        progress(&ExtractProgress::new(ExtractPhase::ReadingSectors, 0, 1));
        let sector_data =
            sectors::aggregate(&mut view, &self.sector_parser, options.game.default_map())?;
        incomplete |= sector_data.has_errors();

        progress(&ExtractProgress::new(ExtractPhase::Assembling, 0, 1));
        let map_data = assembly::assemble(
            &sector_data,
            &defs,
            &icons,
            &locale_table,
            &options.split,
        );

        progress(&ExtractProgress::new(ExtractPhase::Complete, 1, 1));
        Ok(MapBundle {
            map: sector_data.map,
            map_data,
            icons,
            version,
            incomplete,
        })
    }
}

/// Open one archive and parse its entries inside a guard that releases the
/// descriptor on every exit path (the archive owns its file handle)
fn open_archive(path: &Path) -> Result<Box<dyn archive::Archive>> {
    let mut archive = archive::open(path)?;
    archive.parse_entries()?;
    tracing::info!(
        archive = %path.display(),
        files = archive.file_count(),
        salt = archive.salt(),
        "opened archive"
    );
    Ok(archive)
}
