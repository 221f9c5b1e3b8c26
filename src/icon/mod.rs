//! Map icon extraction
//!
//! Scans the UI material directories, resolves each descriptor to its
//! texture payload and decodes it into an RGBA raster keyed by the stripped
//! material name. Road overlays, company logos and the fixed facility icons
//! each come from their own directory with their own name filter.

use indexmap::IndexMap;

use crate::archive::CombinedView;
use crate::error::Result;

pub mod decode;
pub mod mat;

pub use decode::{DdsDecoder, RasterIcon, TextureDecoder};

/// Effect block names the icon pipeline understands
const UI_EFFECTS: [&str; 2] = ["ui.rfx", "ui.sdf.rfx"];

/// Fixed facility/landmark/UI icons under `material/ui/map`
const MAP_ICON_NAMES: [&str; 12] = [
    "viewpoint",
    "photo_sight_captured",
    "parking_ico",
    "gas_ico",
    "service_ico",
    "weigh_station_ico",
    "dealer_ico",
    "garage_large_ico",
    "recruitment_ico",
    "city_names_ico",
    "companies_ico",
    "road_numbers_ico",
];

/// How to select and key material files inside one scanned directory
#[derive(Debug, Clone, Copy)]
enum NameFilter {
    /// Names starting with the prefix; the prefix is stripped from the key
    Prefix(&'static str),
    /// Every `.mat` file
    AllMat,
    /// An explicit allowlist of stems
    Allowlist(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy)]
struct DirSpec {
    dir: &'static str,
    filter: NameFilter,
}

const DEFAULT_SPECS: [DirSpec; 3] = [
    DirSpec {
        dir: "material/ui/map/road",
        filter: NameFilter::Prefix("road_"),
    },
    DirSpec {
        dir: "material/ui/company/small",
        filter: NameFilter::AllMat,
    },
    DirSpec {
        dir: "material/ui/map",
        filter: NameFilter::Allowlist(&MAP_ICON_NAMES),
    },
];

impl NameFilter {
    /// The icon key for a matching file name, or `None` when filtered out
    fn key_for(self, name: &str) -> Option<String> {
        let stem = name.strip_suffix(".mat")?;
        match self {
            NameFilter::Prefix(prefix) => stem.strip_prefix(prefix).map(str::to_string),
            NameFilter::AllMat => Some(stem.to_string()),
            NameFilter::Allowlist(stems) => stems.contains(&stem).then(|| stem.to_string()),
        }
    }
}

/// Extract the default icon set from the archive overlay.
///
/// Soft failures (missing directories, unknown material formats, decode
/// errors) are logged and skipped; the returned map holds every icon that
/// decoded cleanly.
pub fn extract_icons(
    view: &mut CombinedView,
    decoder: &dyn TextureDecoder,
) -> Result<IndexMap<String, RasterIcon>> {
    let mut icons = IndexMap::new();
    for spec in DEFAULT_SPECS {
        extract_dir(view, decoder, &spec, &mut icons)?;
    }
    tracing::info!(count = icons.len(), "decoded map icons");
    Ok(icons)
}

fn extract_dir(
    view: &mut CombinedView,
    decoder: &dyn TextureDecoder,
    spec: &DirSpec,
    icons: &mut IndexMap<String, RasterIcon>,
) -> Result<()> {
    let Some(dir) = view.find_dir(spec.dir) else {
        tracing::warn!(dir = spec.dir, "icon directory not found");
        return Ok(());
    };

    let selected: Vec<(String, String)> = dir
        .files
        .iter()
        .filter_map(|name| {
            spec.filter
                .key_for(name)
                .map(|key| (key, format!("{}/{}", spec.dir, name)))
        })
        .collect();

    for (key, mat_path) in selected {
        match extract_one(view, decoder, &mat_path) {
            Ok(Some(raster)) => {
                icons.insert(key, raster);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(mat = %mat_path, error = %e, "icon extraction failed"),
        }
    }
    Ok(())
}

/// Resolve one material descriptor to a decoded raster
fn extract_one(
    view: &mut CombinedView,
    decoder: &dyn TextureDecoder,
    mat_path: &str,
) -> Result<Option<RasterIcon>> {
    let Some(data) = view.read_file_opt(mat_path)? else {
        tracing::warn!(mat = mat_path, "material descriptor missing");
        return Ok(None);
    };
    let mat = mat::parse(&data)?;

    let (texture, aux) = match describe_texture(&mat) {
        Some(found) => found,
        None => {
            tracing::warn!(mat = mat_path, "unknown material format");
            return Ok(None);
        }
    };

    let mut texture_path = resolve_texture_path(mat_path, texture);
    // V2 texture-object entries synthesize a full container on read; other
    // containers store the texture next to a small descriptor instead.
    if !view.synthesizes_textures(mat_path) {
        if let Some(stem) = texture_path.strip_suffix(".tobj") {
            texture_path = format!("{stem}.dds");
        }
    }

    let Some(container) = view.read_file_opt(&texture_path)? else {
        tracing::warn!(texture = %texture_path, "referenced texture missing");
        return Ok(None);
    };
    let raster = decoder.decode(&container, aux)?;
    Ok(Some(raster))
}

/// The texture reference and SDF aux table of a descriptor, when recognized
fn describe_texture(mat: &mat::MatFile) -> Option<(&str, Option<&[f32]>)> {
    if let Some(effect) = &mat.effect {
        if UI_EFFECTS.contains(&effect.name.as_str()) {
            let aux = (!effect.aux.is_empty()).then_some(effect.aux.as_slice());
            return effect.texture.as_deref().map(|t| (t, aux));
        }
    }
    if let Some(material) = &mat.material {
        if material.name == "ui" {
            return material.texture.as_deref().map(|t| (t, None));
        }
    }
    None
}

/// Texture paths are absolute when they start with `/`, otherwise relative
/// to the material's directory
fn resolve_texture_path(mat_path: &str, texture: &str) -> String {
    if let Some(absolute) = texture.strip_prefix('/') {
        return absolute.to_string();
    }
    match mat_path.rsplit_once('/') {
        Some((dir, _)) => format!("{dir}/{texture}"),
        None => texture.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_filters_strip_keys() {
        assert_eq!(
            NameFilter::Prefix("road_").key_for("road_one.mat").as_deref(),
            Some("one")
        );
        assert_eq!(NameFilter::Prefix("road_").key_for("city.mat"), None);
        assert_eq!(NameFilter::AllMat.key_for("acme_sm.mat").as_deref(), Some("acme_sm"));
        assert_eq!(NameFilter::AllMat.key_for("readme.txt"), None);
        assert_eq!(
            NameFilter::Allowlist(&MAP_ICON_NAMES).key_for("gas_ico.mat").as_deref(),
            Some("gas_ico")
        );
        assert_eq!(NameFilter::Allowlist(&MAP_ICON_NAMES).key_for("other.mat"), None);
    }

    #[test]
    fn texture_paths_resolve_relative_and_absolute() {
        assert_eq!(
            resolve_texture_path("material/ui/map/road/road_one.mat", "road_one.tobj"),
            "material/ui/map/road/road_one.tobj"
        );
        assert_eq!(
            resolve_texture_path("material/ui/map/road/road_one.mat", "/material/ui/x.tobj"),
            "material/ui/x.tobj"
        );
    }

    #[test]
    fn effect_wins_over_material_block() {
        let parsed = mat::parse(
            br#"
effect : "ui.sdf.rfx" {
	aux[0] : ( 1.0 )
	texture : "texture" { source : "a.tobj" }
}
material : "ui" { texture : "b.tobj" }
"#,
        )
        .unwrap();
        let (texture, aux) = describe_texture(&parsed).unwrap();
        assert_eq!(texture, "a.tobj");
        assert_eq!(aux, Some([1.0f32].as_slice()));
    }
}
