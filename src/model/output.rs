//! Emitted map data bundle

use indexmap::IndexMap;
use serde::Serialize;

use super::defs::{CountryDef, MileageTarget, PrefabDescription, RoadLookDef};
use super::poi::Poi;

/// The unified map data structure, JSON-friendly
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapData {
    /// Referenced node positions as rounded integer triples
    pub nodes: Vec<[i64; 3]>,
    /// Elevation node positions as rounded integer triples
    pub elevation: Vec<[i64; 3]>,
    pub roads: Vec<RoadOut>,
    pub ferries: Vec<FerryOut>,
    pub prefabs: Vec<PrefabOut>,
    pub companies: Vec<CompanyOut>,
    pub models: Vec<ModelOut>,
    pub map_areas: Vec<MapAreaOut>,
    pub pois: Vec<Poi>,
    pub dividers: Vec<DividerOut>,
    pub triggers: Vec<TriggerOut>,
    pub trajectories: Vec<TrajectoryOut>,
    pub cutscenes: Vec<CutsceneOut>,
    pub countries: Vec<CountryOut>,
    pub cities: Vec<CityOut>,
    pub company_defs: IndexMap<String, CompanyDefOut>,
    pub road_looks: IndexMap<String, RoadLookDef>,
    pub prefab_descriptions: IndexMap<String, PrefabDescription>,
    pub model_descriptions: IndexMap<String, serde_json::Value>,
    pub achievements: IndexMap<String, serde_json::Value>,
    pub routes: IndexMap<String, serde_json::Value>,
    pub mileage_targets: IndexMap<String, MileageTarget>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadOut {
    pub uid: u64,
    pub road_look_token: String,
    pub start_node_uid: u64,
    pub end_node_uid: u64,
    pub hidden: bool,
    pub dlc_guard: i32,
    /// Set when a terrain divider visually splits this road
    pub maybe_divided: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefabOut {
    pub uid: u64,
    pub token: String,
    pub node_uids: Vec<u64>,
    pub origin: u32,
    pub hidden: bool,
    pub dlc_guard: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyOut {
    pub uid: u64,
    pub token: String,
    pub city_token: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelOut {
    pub uid: u64,
    pub token: String,
    pub node_uid: u64,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapAreaOut {
    pub uid: u64,
    pub node_uids: Vec<u64>,
    pub color: u32,
    pub draw_over: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DividerOut {
    pub uid: u64,
    /// `building` or `curve`; terrain dividers are not emitted
    pub kind: &'static str,
    pub start_node_uid: u64,
    pub end_node_uid: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerOut {
    pub uid: u64,
    pub x: f32,
    pub y: f32,
    pub dlc_guard: i32,
    pub node_uids: Vec<u64>,
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrajectoryOut {
    pub uid: u64,
    pub node_uids: Vec<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CutsceneOut {
    pub uid: u64,
    pub x: f32,
    pub y: f32,
    pub flags: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryOut {
    pub token: String,
    pub name: String,
    pub id: u32,
    pub code: String,
    pub x: f32,
    pub y: f32,
}

impl CountryOut {
    #[must_use]
    pub fn from_def(token: &str, def: &CountryDef, name: String) -> Self {
        Self {
            token: token.to_string(),
            name,
            id: def.id,
            code: def.code.clone(),
            x: def.x,
            y: def.y,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityAreaOut {
    pub uid: u64,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub hidden: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityOut {
    pub token: String,
    pub name: String,
    pub country: String,
    pub x: f32,
    pub y: f32,
    pub areas: Vec<CityAreaOut>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDefOut {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FerryConnectionOut {
    pub token: String,
    pub name: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FerryOut {
    pub token: String,
    pub name: String,
    pub train: bool,
    pub x: f32,
    pub y: f32,
    pub connections: Vec<FerryConnectionOut>,
}
