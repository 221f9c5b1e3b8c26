//! Sector items and nodes
//!
//! The per-sector binary parser produces streams of items and nodes keyed by
//! 64-bit UIDs; these are the shapes it honors. Nodes carry world positions
//! (x east, y elevation, z south; the map plane is x/z). Items reference
//! nodes by UID and are annotated with their sector coordinates during
//! aggregation.

/// A world node with position and heading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub uid: u64,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rotation: f32,
    pub sector_x: i32,
    pub sector_y: i32,
}

impl Node {
    /// Map-plane position
    #[must_use]
    pub fn map_pos(&self) -> (f32, f32) {
        (self.x, self.z)
    }
}

/// A world item: UID, sector coordinates and a typed payload
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub uid: u64,
    pub sector_x: i32,
    pub sector_y: i32,
    pub kind: ItemKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    City(CityItem),
    Road(RoadItem),
    Prefab(PrefabItem),
    MapArea(MapAreaItem),
    MapOverlay(MapOverlayItem),
    Ferry(FerryItem),
    Company(CompanyItem),
    Cutscene(CutsceneItem),
    Trigger(TriggerItem),
    Model(ModelItem),
    Terrain(TerrainItem),
    Building(BuildingItem),
    Curve(CurveItem),
    Trajectory(TrajectoryItem),
}

impl ItemKind {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ItemKind::City(_) => "city",
            ItemKind::Road(_) => "road",
            ItemKind::Prefab(_) => "prefab",
            ItemKind::MapArea(_) => "mapArea",
            ItemKind::MapOverlay(_) => "mapOverlay",
            ItemKind::Ferry(_) => "ferry",
            ItemKind::Company(_) => "company",
            ItemKind::Cutscene(_) => "cutscene",
            ItemKind::Trigger(_) => "trigger",
            ItemKind::Model(_) => "model",
            ItemKind::Terrain(_) => "terrain",
            ItemKind::Building(_) => "building",
            ItemKind::Curve(_) => "curve",
            ItemKind::Trajectory(_) => "trajectory",
        }
    }
}

/// A named city area rectangle
#[derive(Debug, Clone, PartialEq)]
pub struct CityItem {
    pub token: String,
    pub x: f32,
    pub z: f32,
    pub width: f32,
    pub height: f32,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoadItem {
    pub road_look_token: String,
    pub start_node_uid: u64,
    pub end_node_uid: u64,
    pub dlc_guard: i32,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrefabItem {
    pub token: String,
    pub node_uids: Vec<u64>,
    /// Index of the placed node that anchors the description's origin node
    pub origin: u32,
    pub dlc_guard: i32,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapAreaItem {
    pub node_uids: Vec<u64>,
    pub color: u32,
    pub draw_over: bool,
}

/// Sub-tag of a map overlay item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    Road,
    Parking,
    Landmark,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapOverlayItem {
    pub token: String,
    pub node_uid: u64,
    pub kind: OverlayKind,
    pub dlc_guard: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FerryItem {
    pub token: String,
    pub node_uid: u64,
    pub train: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompanyItem {
    pub token: String,
    pub city_token: String,
    pub node_uid: u64,
    /// UID of the prefab item the company occupies
    pub prefab_uid: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CutsceneItem {
    pub node_uid: u64,
    pub flags: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerItem {
    pub node_uids: Vec<u64>,
    pub actions: Vec<String>,
    pub dlc_guard: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelItem {
    pub token: String,
    pub node_uid: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TerrainItem {
    pub start_node_uid: u64,
    pub end_node_uid: u64,
    pub length: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildingItem {
    pub start_node_uid: u64,
    pub end_node_uid: u64,
    pub scheme: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurveItem {
    pub start_node_uid: u64,
    pub end_node_uid: u64,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryItem {
    pub node_uids: Vec<u64>,
}
