//! Points of interest extracted from sector items

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PoiKind {
    Facility,
    Road,
    Landmark,
    Company,
    Ferry,
    Train,
    Viewpoint,
}

/// A renderable or queryable map point.
///
/// Parking POIs are facility POIs with the `parking_ico` icon; they
/// additionally record the originating item type and its node UIDs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Poi {
    #[serde(rename = "type")]
    pub kind: PoiKind,
    pub x: f32,
    pub y: f32,
    pub icon: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dlc_guard: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_uid: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_item_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_node_uids: Option<Vec<u64>>,
}

impl Poi {
    #[must_use]
    pub fn facility(x: f32, y: f32, icon: impl Into<String>) -> Self {
        Self {
            kind: PoiKind::Facility,
            x,
            y,
            icon: icon.into(),
            label: None,
            dlc_guard: None,
            node_uid: None,
            from_item_type: None,
            item_node_uids: None,
        }
    }

    /// A parking facility POI tagged with its originating item type
    #[must_use]
    pub fn parking(
        x: f32,
        y: f32,
        dlc_guard: i32,
        from_item_type: &'static str,
        item_node_uids: Vec<u64>,
    ) -> Self {
        Self {
            dlc_guard: Some(dlc_guard),
            from_item_type: Some(from_item_type),
            item_node_uids: Some(item_node_uids),
            ..Self::facility(x, y, "parking_ico")
        }
    }
}
