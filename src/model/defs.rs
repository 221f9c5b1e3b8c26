//! Definition dictionaries
//!
//! The definition-file parser is an external collaborator; it honors these
//! shapes, all token-keyed. Dictionaries the assembly pass never interprets
//! (achievements, routes, model descriptions) stay structured JSON and are
//! passed through to the emitted bundle unchanged.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;

use crate::archive::CombinedView;
use crate::error::Result;
use crate::locale::LocaleTable;

/// Loads the definition dictionaries from an archive overlay
pub trait DefinitionSource {
    fn load(&self, view: &mut CombinedView, locale: &LocaleTable) -> Result<Definitions>;
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Definitions {
    pub road_looks: IndexMap<String, RoadLookDef>,
    pub prefab_descriptions: IndexMap<String, PrefabDescription>,
    pub cities: IndexMap<String, CityDef>,
    pub ferries: IndexMap<String, FerryDef>,
    pub companies: IndexMap<String, CompanyDef>,
    /// Building models placeable as map items
    pub models: IndexMap<String, ModelDef>,
    pub vegetation: IndexMap<String, ModelDef>,
    /// Cutscene item UID to viewpoint label token
    #[serde(skip)]
    pub viewpoints: HashMap<u64, String>,
    pub mileage_targets: IndexMap<String, MileageTarget>,
    pub countries: IndexMap<String, CountryDef>,
    pub achievements: IndexMap<String, serde_json::Value>,
    pub routes: IndexMap<String, serde_json::Value>,
    pub model_descriptions: IndexMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadLookDef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub lanes_left: u32,
    pub lanes_right: u32,
    pub offset: f32,
}

/// A prefab-local node: position and heading in prefab space
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefabNode {
    pub x: f32,
    pub z: f32,
    pub rotation: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SpawnPointKind {
    Gas,
    Service,
    WeighStation,
    TruckDealer,
    Buy,
    Recruitment,
    CompanyPos,
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnPoint {
    pub x: f32,
    pub z: f32,
    pub kind: SpawnPointKind,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerPoint {
    pub x: f32,
    pub z: f32,
    pub action: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefabDescription {
    pub nodes: Vec<PrefabNode>,
    pub spawn_points: Vec<SpawnPoint>,
    pub trigger_points: Vec<TriggerPoint>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityDef {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_localized: Option<String>,
    pub country: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FerryDef {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_localized: Option<String>,
    pub connections: Vec<FerryConnectionDef>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FerryConnectionDef {
    pub target_token: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDef {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MileageTarget {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_uid: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryDef {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_localized: Option<String>,
    pub id: u32,
    pub code: String,
    pub x: f32,
    pub y: f32,
}
