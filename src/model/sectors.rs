//! Sector file aggregation
//!
//! Maps are tiled into sectors backed by `.base` and `.aux` files under
//! `map/<name>/`, keyed `sec±DDDD±DDDD`. Each file is read through the
//! archive overlay, handed to the sector parser, and its items and nodes are
//! merged into per-sector maps annotated with the sector coordinates.

use std::collections::{BTreeMap, HashMap};

use crate::archive::CombinedView;
use crate::error::{Error, Result};
use super::items::{Item, Node};

/// Parses one sector file into item and node streams.
///
/// External collaborator; implementations leave sector coordinates zeroed,
/// the aggregator annotates them.
pub trait SectorParser {
    fn parse(&self, data: &[u8], file_name: &str) -> Result<SectorContent>;
}

#[derive(Debug, Default)]
pub struct SectorContent {
    pub items: Vec<Item>,
    pub nodes: Vec<Node>,
}

/// One aggregated sector
#[derive(Debug, Default)]
pub struct Sector {
    pub items: HashMap<u64, Item>,
    pub nodes: HashMap<u64, Node>,
}

/// All sectors of an archive set
#[derive(Debug, Default)]
pub struct SectorData {
    /// Discovered map names joined with `+`
    pub map: String,
    pub sectors: BTreeMap<(i32, i32), Sector>,
    /// Count of sectors that failed to parse; failures never abort the run
    pub errors: usize,
}

impl SectorData {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

/// Parse a `sec±DDDD±DDDD` key into sector coordinates
pub fn parse_sector_key(stem: &str) -> Result<(i32, i32)> {
    let malformed = || Error::MalformedSectorKey(stem.to_string());
    let rest = stem.strip_prefix("sec").ok_or_else(malformed)?;
    let bytes = rest.as_bytes();
    if bytes.len() != 10 {
        return Err(malformed());
    }
    let group = |group: &[u8]| -> Result<i32> {
        let sign = match group[0] {
            b'+' => 1,
            b'-' => -1,
            _ => return Err(malformed()),
        };
        if !group[1..].iter().all(u8::is_ascii_digit) {
            return Err(malformed());
        }
        let digits = std::str::from_utf8(&group[1..]).map_err(|_| malformed())?;
        Ok(sign * digits.parse::<i32>().map_err(|_| malformed())?)
    };
    Ok((group(&bytes[..5])?, group(&bytes[5..])?))
}

/// Discover map names: the subdirectories of `map/`, or the platform default
/// when that directory is absent
fn discover_maps(view: &CombinedView, default_map: &str) -> Vec<String> {
    match view.find_dir("map") {
        Some(dir) if !dir.subdirs.is_empty() => dir.subdirs.clone(),
        _ => vec![default_map.to_string()],
    }
}

/// Aggregate every sector of every discoverable map.
///
/// Malformed sector keys and parser failures are logged and counted; the
/// failing sector contributes nothing.
pub fn aggregate(
    view: &mut CombinedView,
    parser: &dyn SectorParser,
    default_map: &str,
) -> Result<SectorData> {
    let maps = discover_maps(view, default_map);
    let mut data = SectorData {
        map: maps.join("+"),
        ..SectorData::default()
    };

    for map in &maps {
        let dir_path = format!("map/{map}");
        let Some(dir) = view.find_dir(&dir_path) else {
            tracing::warn!(map = %map, "map directory not found");
            continue;
        };

        let sector_files: Vec<String> = dir
            .files
            .iter()
            .filter(|name| name.ends_with(".base") || name.ends_with(".aux"))
            .cloned()
            .collect();

        for name in sector_files {
            let stem = name.rsplit_once('.').map_or(name.as_str(), |(stem, _)| stem);
            let key = match parse_sector_key(stem) {
                Ok(key) => key,
                Err(e) => {
                    tracing::warn!(file = %name, error = %e, "skipping sector file");
                    data.errors += 1;
                    continue;
                }
            };

            let path = format!("{dir_path}/{name}");
            let parsed = view
                .read_file(&path)
                .and_then(|bytes| parser.parse(&bytes, &name));
            match parsed {
                Ok(content) => merge_sector(&mut data, key, content),
                Err(e) => {
                    tracing::warn!(file = %path, error = %e, "sector parse failed");
                    data.errors += 1;
                }
            }
        }
    }

    tracing::info!(
        map = %data.map,
        sectors = data.sectors.len(),
        errors = data.errors,
        "aggregated sector files"
    );
    Ok(data)
}

fn merge_sector(data: &mut SectorData, key: (i32, i32), content: SectorContent) {
    let sector = data.sectors.entry(key).or_default();
    for mut item in content.items {
        item.sector_x = key.0;
        item.sector_y = key.1;
        sector.items.insert(item.uid, item);
    }
    for mut node in content.nodes {
        node.sector_x = key.0;
        node.sector_y = key.1;
        sector.nodes.insert(node.uid, node);
    }
}
