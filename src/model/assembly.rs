//! Map assembly pass
//!
//! Merges the aggregated sector streams with the definition dictionaries:
//! cross-reference checks, point-of-interest classification, prefab-space
//! projection, city and ferry augmentation, road-split detection and
//! elevation-node collection, emitting the unified [`MapData`] bundle.
//!
//! Reference misses are warnings, never failures; the pass is total over the
//! closed set of item kinds.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use indexmap::IndexMap;

use crate::icon::RasterIcon;
use crate::locale::{localized_name, LocaleTable};
use super::defs::{Definitions, PrefabDescription, SpawnPointKind};
use super::items::{
    CityItem, FerryItem, Item, ItemKind, Node, OverlayKind, PrefabItem, RoadItem,
};
use super::output::{
    CityAreaOut, CityOut, CompanyDefOut, CompanyOut, CountryOut, CutsceneOut, DividerOut,
    FerryConnectionOut, FerryOut, MapAreaOut, MapData, ModelOut, PrefabOut, RoadOut,
    TrajectoryOut, TriggerOut,
};
use super::poi::{Poi, PoiKind};
use super::sectors::SectorData;

/// Road-split divider heuristics.
///
/// The defaults were chosen empirically against shipped map data and may
/// drift with game updates; override them when they do.
#[derive(Debug, Clone)]
pub struct SplitConfig {
    /// Building schemes that act as terrain dividers
    pub building_schemes: Vec<String>,
    /// Curve models that act as terrain dividers
    pub curve_models: Vec<String>,
    /// Maximum map-plane distance between road and divider endpoints
    pub threshold: f32,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            building_schemes: vec!["scheme20".to_string()],
            curve_models: vec!["0i03a".to_string(), "0i03b".to_string()],
            threshold: 2.0,
        }
    }
}

/// Assemble the map data bundle from sectors, definitions, icons and locale
pub fn assemble(
    sectors: &SectorData,
    defs: &Definitions,
    icons: &IndexMap<String, RasterIcon>,
    locale: &LocaleTable,
    split: &SplitConfig,
) -> MapData {
    let mut pass = Assembler::new(sectors, defs, icons, locale, split);
    pass.index_sectors();
    pass.bucket_items();
    pass.detect_road_splits();
    pass.extract_pois();
    pass.emit()
}

struct Assembler<'a> {
    defs: &'a Definitions,
    icons: &'a IndexMap<String, RasterIcon>,
    locale: &'a LocaleTable,
    split: &'a SplitConfig,
    sectors: &'a SectorData,

    items: BTreeMap<u64, &'a Item>,
    nodes: HashMap<u64, &'a Node>,

    referenced: BTreeSet<u64>,
    elevation: BTreeSet<u64>,

    city_areas: HashMap<String, Vec<(u64, &'a CityItem)>>,
    prefabs_by_uid: HashMap<u64, (&'a Item, &'a PrefabItem)>,
    ferry_items: HashMap<String, (u64, &'a FerryItem)>,
    poiful: Vec<&'a Item>,

    roads: Vec<(&'a Item, &'a RoadItem)>,
    maybe_divided: BTreeSet<u64>,

    pois: Vec<Poi>,
    prefabs_out: Vec<PrefabOut>,
    companies_out: Vec<CompanyOut>,
    models_out: Vec<ModelOut>,
    map_areas_out: Vec<MapAreaOut>,
    dividers_out: Vec<DividerOut>,
    triggers_out: Vec<TriggerOut>,
    trajectories_out: Vec<TrajectoryOut>,
    cutscenes_out: Vec<CutsceneOut>,

    /// Company tokens without an icon, so without a POI
    no_poi_companies: BTreeSet<String>,
    /// Company tokens placed from the item node instead of a spawn point
    fallback_poi_companies: BTreeSet<String>,
    warnings: usize,
}

impl<'a> Assembler<'a> {
    fn new(
        sectors: &'a SectorData,
        defs: &'a Definitions,
        icons: &'a IndexMap<String, RasterIcon>,
        locale: &'a LocaleTable,
        split: &'a SplitConfig,
    ) -> Self {
        Self {
            defs,
            icons,
            locale,
            split,
            sectors,
            items: BTreeMap::new(),
            nodes: HashMap::new(),
            referenced: BTreeSet::new(),
            elevation: BTreeSet::new(),
            city_areas: HashMap::new(),
            prefabs_by_uid: HashMap::new(),
            ferry_items: HashMap::new(),
            poiful: Vec::new(),
            roads: Vec::new(),
            maybe_divided: BTreeSet::new(),
            pois: Vec::new(),
            prefabs_out: Vec::new(),
            companies_out: Vec::new(),
            models_out: Vec::new(),
            map_areas_out: Vec::new(),
            dividers_out: Vec::new(),
            triggers_out: Vec::new(),
            trajectories_out: Vec::new(),
            cutscenes_out: Vec::new(),
            no_poi_companies: BTreeSet::new(),
            fallback_poi_companies: BTreeSet::new(),
            warnings: 0,
        }
    }

    fn warn(&mut self, message: String) {
        self.warnings += 1;
        tracing::warn!("{message}");
    }

    fn node_pos(&self, uid: u64) -> Option<(f32, f32)> {
        self.nodes.get(&uid).map(|n| n.map_pos())
    }

    // Stage A: flatten sector streams into global UID indexes
    fn index_sectors(&mut self) {
        for sector in self.sectors.sectors.values() {
            for (uid, item) in &sector.items {
                self.items.insert(*uid, item);
            }
            for (uid, node) in &sector.nodes {
                self.nodes.insert(*uid, node);
            }
        }
    }

    // Stage B: per-kind reference checks and bucketing
    fn bucket_items(&mut self) {
        let items: Vec<&Item> = self.items.values().copied().collect();
        for item in items {
            self.bucket_item(item);
        }
        self.poiful.sort_by_key(|item| item.uid);
    }

    fn bucket_item(&mut self, item: &'a Item) {
        match &item.kind {
            ItemKind::City(city) => {
                if !self.defs.cities.contains_key(&city.token) {
                    self.warn(format!("city item {:#x}: unknown city {}", item.uid, city.token));
                }
                self.city_areas
                    .entry(city.token.clone())
                    .or_default()
                    .push((item.uid, city));
            }
            ItemKind::Road(road) => {
                if !self.defs.road_looks.contains_key(&road.road_look_token) {
                    self.warn(format!(
                        "road item {:#x}: unknown road look {}",
                        item.uid, road.road_look_token
                    ));
                }
                self.referenced.insert(road.start_node_uid);
                self.referenced.insert(road.end_node_uid);
                self.elevation.insert(road.start_node_uid);
                self.elevation.insert(road.end_node_uid);
                self.roads.push((item, road));
            }
            ItemKind::Prefab(prefab) => {
                if !self.defs.prefab_descriptions.contains_key(&prefab.token) {
                    self.warn(format!(
                        "prefab item {:#x}: unknown prefab {}",
                        item.uid, prefab.token
                    ));
                }
                self.referenced.extend(&prefab.node_uids);
                self.elevation.extend(&prefab.node_uids);
                self.prefabs_by_uid.insert(item.uid, (item, prefab));
                self.prefabs_out.push(PrefabOut {
                    uid: item.uid,
                    token: prefab.token.clone(),
                    node_uids: prefab.node_uids.clone(),
                    origin: prefab.origin,
                    hidden: prefab.hidden,
                    dlc_guard: prefab.dlc_guard,
                });
                self.poiful.push(item);
            }
            ItemKind::MapArea(area) => {
                self.referenced.extend(&area.node_uids);
                self.elevation.extend(&area.node_uids);
                self.map_areas_out.push(MapAreaOut {
                    uid: item.uid,
                    node_uids: area.node_uids.clone(),
                    color: area.color,
                    draw_over: area.draw_over,
                });
            }
            ItemKind::MapOverlay(overlay) => {
                self.referenced.insert(overlay.node_uid);
                self.poiful.push(item);
            }
            ItemKind::Ferry(ferry) => {
                if self.defs.ferries.contains_key(&ferry.token) {
                    self.referenced.insert(ferry.node_uid);
                    self.ferry_items
                        .insert(ferry.token.clone(), (item.uid, ferry));
                    self.poiful.push(item);
                } else {
                    self.warn(format!(
                        "ferry item {:#x}: unknown ferry {}",
                        item.uid, ferry.token
                    ));
                }
            }
            ItemKind::Company(company) => {
                if !self.defs.companies.contains_key(&company.token) {
                    self.warn(format!(
                        "company item {:#x}: unknown company {}",
                        item.uid, company.token
                    ));
                }
                self.referenced.insert(company.node_uid);
                self.poiful.push(item);
            }
            ItemKind::Cutscene(cutscene) => {
                self.referenced.insert(cutscene.node_uid);
                if let Some((x, y)) = self.node_pos(cutscene.node_uid) {
                    self.cutscenes_out.push(CutsceneOut {
                        uid: item.uid,
                        x,
                        y,
                        flags: cutscene.flags,
                    });
                }
                self.poiful.push(item);
            }
            ItemKind::Trigger(trigger) => {
                self.referenced.extend(&trigger.node_uids);
                if let Some((x, y)) = trigger
                    .node_uids
                    .first()
                    .and_then(|uid| self.node_pos(*uid))
                {
                    self.triggers_out.push(TriggerOut {
                        uid: item.uid,
                        x,
                        y,
                        dlc_guard: trigger.dlc_guard,
                        node_uids: trigger.node_uids.clone(),
                        actions: trigger.actions.clone(),
                    });
                }
                self.poiful.push(item);
            }
            ItemKind::Model(model) => {
                if self.defs.models.contains_key(&model.token) {
                    self.referenced.insert(model.node_uid);
                    if let Some((x, y)) = self.node_pos(model.node_uid) {
                        self.models_out.push(ModelOut {
                            uid: item.uid,
                            token: model.token.clone(),
                            node_uid: model.node_uid,
                            x,
                            y,
                        });
                    }
                } else if self.defs.vegetation.contains_key(&model.token) {
                    self.elevation.insert(model.node_uid);
                } else {
                    self.warn(format!(
                        "model item {:#x}: unknown model {}",
                        item.uid, model.token
                    ));
                }
            }
            ItemKind::Terrain(terrain) => {
                self.elevation.insert(terrain.start_node_uid);
                self.elevation.insert(terrain.end_node_uid);
            }
            ItemKind::Building(building) => {
                self.elevation.insert(building.start_node_uid);
                self.elevation.insert(building.end_node_uid);
            }
            ItemKind::Curve(curve) => {
                self.elevation.insert(curve.start_node_uid);
                self.elevation.insert(curve.end_node_uid);
            }
            ItemKind::Trajectory(trajectory) => {
                self.referenced.extend(&trajectory.node_uids);
                self.trajectories_out.push(TrajectoryOut {
                    uid: item.uid,
                    node_uids: trajectory.node_uids.clone(),
                });
            }
        }
    }

    // Stage F: flag roads whose endpoints a same-sector divider shadows
    fn detect_road_splits(&mut self) {
        let threshold = self.split.threshold;
        let mut dividers_out = Vec::new();

        for sector in self.sectors.sectors.values() {
            let mut sector_roads: Vec<(u64, (f32, f32), (f32, f32))> = Vec::new();
            let mut sector_dividers: Vec<((f32, f32), (f32, f32))> = Vec::new();

            for (uid, item) in &sector.items {
                match &item.kind {
                    ItemKind::Road(road) => {
                        if let (Some(start), Some(end)) = (
                            self.node_pos(road.start_node_uid),
                            self.node_pos(road.end_node_uid),
                        ) {
                            sector_roads.push((*uid, start, end));
                        }
                    }
                    ItemKind::Terrain(terrain) => {
                        if let Some(ends) =
                            self.divider_ends(terrain.start_node_uid, terrain.end_node_uid)
                        {
                            sector_dividers.push(ends);
                        }
                    }
                    ItemKind::Building(building)
                        if self.split.building_schemes.contains(&building.scheme) =>
                    {
                        if let Some(ends) =
                            self.divider_ends(building.start_node_uid, building.end_node_uid)
                        {
                            sector_dividers.push(ends);
                            dividers_out.push(DividerOut {
                                uid: *uid,
                                kind: "building",
                                start_node_uid: building.start_node_uid,
                                end_node_uid: building.end_node_uid,
                            });
                            self.referenced.insert(building.start_node_uid);
                            self.referenced.insert(building.end_node_uid);
                        }
                    }
                    ItemKind::Curve(curve) if self.split.curve_models.contains(&curve.model) => {
                        if let Some(ends) =
                            self.divider_ends(curve.start_node_uid, curve.end_node_uid)
                        {
                            sector_dividers.push(ends);
                            dividers_out.push(DividerOut {
                                uid: *uid,
                                kind: "curve",
                                start_node_uid: curve.start_node_uid,
                                end_node_uid: curve.end_node_uid,
                            });
                            self.referenced.insert(curve.start_node_uid);
                            self.referenced.insert(curve.end_node_uid);
                        }
                    }
                    _ => {}
                }
            }

            for (uid, start, end) in sector_roads {
                let divided = sector_dividers.iter().any(|(ds, de)| {
                    (distance(start, *ds) <= threshold && distance(end, *de) <= threshold)
                        || (distance(start, *de) <= threshold && distance(end, *ds) <= threshold)
                });
                if divided {
                    self.maybe_divided.insert(uid);
                }
            }
        }

        dividers_out.sort_by_key(|d| d.uid);
        self.dividers_out = dividers_out;
    }

    fn divider_ends(&self, start: u64, end: u64) -> Option<((f32, f32), (f32, f32))> {
        Some((self.node_pos(start)?, self.node_pos(end)?))
    }

    // Stage C: point-of-interest extraction
    fn extract_pois(&mut self) {
        let poiful = std::mem::take(&mut self.poiful);
        for item in poiful {
            match &item.kind {
                ItemKind::Prefab(prefab) => self.prefab_pois(prefab),
                ItemKind::MapOverlay(overlay) => match overlay.kind {
                    OverlayKind::Road => {
                        if overlay.token.is_empty() {
                            continue;
                        }
                        if !self.icons.contains_key(&overlay.token) {
                            self.warn(format!(
                                "overlay item {:#x}: no icon for {}",
                                item.uid, overlay.token
                            ));
                        }
                        if let Some((x, y)) = self.node_pos(overlay.node_uid) {
                            self.pois.push(Poi {
                                kind: PoiKind::Road,
                                x,
                                y,
                                icon: overlay.token.clone(),
                                label: None,
                                dlc_guard: Some(overlay.dlc_guard),
                                node_uid: Some(overlay.node_uid),
                                from_item_type: None,
                                item_node_uids: None,
                            });
                        }
                    }
                    OverlayKind::Parking => {
                        if let Some((x, y)) = self.node_pos(overlay.node_uid) {
                            self.pois.push(Poi::parking(
                                x,
                                y,
                                overlay.dlc_guard,
                                "mapOverlay",
                                vec![overlay.node_uid],
                            ));
                        }
                    }
                    OverlayKind::Landmark => {
                        let key = format!("landmark_{}", overlay.token);
                        let label = match self.locale.get(&key) {
                            Some(label) => label.clone(),
                            None => {
                                self.warn(format!(
                                    "overlay item {:#x}: missing locale entry {key}",
                                    item.uid
                                ));
                                String::new()
                            }
                        };
                        if let Some((x, y)) = self.node_pos(overlay.node_uid) {
                            self.pois.push(Poi {
                                kind: PoiKind::Landmark,
                                x,
                                y,
                                icon: "photo_sight_captured".to_string(),
                                label: Some(label),
                                dlc_guard: Some(overlay.dlc_guard),
                                node_uid: Some(overlay.node_uid),
                                from_item_type: None,
                                item_node_uids: None,
                            });
                        }
                    }
                },
                ItemKind::Company(_) => self.company_poi(item),
                ItemKind::Ferry(ferry) => self.ferry_poi(ferry),
                ItemKind::Cutscene(cutscene) => {
                    if cutscene.flags & 0xff != 0 {
                        continue;
                    }
                    let Some(token) = self.defs.viewpoints.get(&item.uid) else {
                        continue;
                    };
                    let label = match self.locale.get(token) {
                        Some(label) => label.clone(),
                        None => {
                            self.warn(format!(
                                "cutscene item {:#x}: missing locale entry {token}",
                                item.uid
                            ));
                            String::new()
                        }
                    };
                    if let Some((x, y)) = self.node_pos(cutscene.node_uid) {
                        self.pois.push(Poi {
                            kind: PoiKind::Viewpoint,
                            x,
                            y,
                            icon: "viewpoint".to_string(),
                            label: Some(label),
                            dlc_guard: None,
                            node_uid: Some(cutscene.node_uid),
                            from_item_type: None,
                            item_node_uids: None,
                        });
                    }
                }
                ItemKind::Trigger(trigger) => {
                    if !trigger.actions.iter().any(|a| a == "hud_parking") {
                        continue;
                    }
                    if let Some((x, y)) = trigger
                        .node_uids
                        .first()
                        .and_then(|uid| self.node_pos(*uid))
                    {
                        self.pois.push(Poi::parking(
                            x,
                            y,
                            trigger.dlc_guard,
                            "trigger",
                            trigger.node_uids.clone(),
                        ));
                    }
                }
                // Only the kinds above are ever bucketed as POI-bearing
                other => unreachable!("item kind {} cannot carry POIs", other.name()),
            }
        }
    }

    fn prefab_pois(&mut self, prefab: &PrefabItem) {
        let Some(desc) = self.defs.prefab_descriptions.get(&prefab.token) else {
            return;
        };
        let mut pois = Vec::new();
        for spawn in &desc.spawn_points {
            let Some(icon) = facility_icon(spawn.kind) else {
                continue;
            };
            if let Some((x, y)) = to_map_position(prefab, desc, &self.nodes, (spawn.x, spawn.z)) {
                pois.push(Poi::facility(x, y, icon));
            }
        }
        for trigger in &desc.trigger_points {
            if trigger.action != "hud_parking" {
                continue;
            }
            if let Some((x, y)) = to_map_position(prefab, desc, &self.nodes, (trigger.x, trigger.z))
            {
                pois.push(Poi {
                    dlc_guard: Some(prefab.dlc_guard),
                    from_item_type: Some("prefab"),
                    item_node_uids: Some(prefab.node_uids.clone()),
                    ..Poi::facility(x, y, "parking_ico")
                });
            }
        }
        self.pois.extend(pois);
    }

    fn company_poi(&mut self, item: &Item) {
        let ItemKind::Company(company) = &item.kind else {
            return;
        };
        let Some(&(_, prefab)) = self.prefabs_by_uid.get(&company.prefab_uid) else {
            self.warn(format!(
                "company item {:#x}: unknown prefab item {:#x}",
                item.uid, company.prefab_uid
            ));
            return;
        };

        if !self.icons.contains_key(&company.token) {
            self.no_poi_companies.insert(company.token.clone());
            return;
        }

        let spawn_pos = self
            .defs
            .prefab_descriptions
            .get(&prefab.token)
            .and_then(|desc| {
                desc.spawn_points
                    .iter()
                    .find(|spawn| spawn.kind == SpawnPointKind::CompanyPos)
                    .and_then(|spawn| to_map_position(prefab, desc, &self.nodes, (spawn.x, spawn.z)))
            });
        let (x, y) = match spawn_pos {
            Some(pos) => pos,
            None => {
                self.fallback_poi_companies.insert(company.token.clone());
                match self.node_pos(company.node_uid) {
                    Some(pos) => pos,
                    None => {
                        self.warn(format!(
                            "company item {:#x}: node {:#x} not found",
                            item.uid, company.node_uid
                        ));
                        return;
                    }
                }
            }
        };

        let label = match self.defs.companies.get(&company.token) {
            Some(def) => def.name.clone(),
            None => {
                self.warn(format!(
                    "company item {:#x}: no definition for {}",
                    item.uid, company.token
                ));
                company.token.clone()
            }
        };

        self.pois.push(Poi {
            kind: PoiKind::Company,
            x,
            y,
            icon: company.token.clone(),
            label: Some(label),
            dlc_guard: None,
            node_uid: Some(company.node_uid),
            from_item_type: None,
            item_node_uids: None,
        });
        self.companies_out.push(CompanyOut {
            uid: item.uid,
            token: company.token.clone(),
            city_token: company.city_token.clone(),
            x,
            y,
        });
    }

    fn ferry_poi(&mut self, ferry: &FerryItem) {
        let Some((x, y)) = self.node_pos(ferry.node_uid) else {
            return;
        };
        // Token membership was established during bucketing
        let Some(def) = self.defs.ferries.get(&ferry.token) else {
            return;
        };
        let label = localized_name(self.locale, &def.name, def.name_localized.as_deref());
        let (kind, icon) = if ferry.train {
            (PoiKind::Train, "train_ico")
        } else {
            (PoiKind::Ferry, "port_overlay")
        };
        self.pois.push(Poi {
            kind,
            x,
            y,
            icon: icon.to_string(),
            label: Some(label),
            dlc_guard: None,
            node_uid: Some(ferry.node_uid),
            from_item_type: None,
            item_node_uids: None,
        });
    }

    // Stage D: complete city records from definition plus sector areas
    fn emit_cities(&mut self) -> Vec<CityOut> {
        let mut cities = Vec::new();
        for (token, def) in &self.defs.cities {
            let Some(areas) = self.city_areas.get(token).cloned() else {
                continue;
            };
            let Some((_, location)) = areas.iter().find(|(_, area)| !area.hidden) else {
                tracing::warn!(city = %token, "no visible city area");
                self.warnings += 1;
                continue;
            };
            let name = localized_name(self.locale, &def.name, def.name_localized.as_deref());
            let mut area_out: Vec<CityAreaOut> = areas
                .iter()
                .map(|(uid, area)| CityAreaOut {
                    uid: *uid,
                    x: area.x,
                    y: area.z,
                    width: area.width,
                    height: area.height,
                    hidden: area.hidden,
                })
                .collect();
            area_out.sort_by_key(|a| a.uid);
            cities.push(CityOut {
                token: token.clone(),
                name,
                country: def.country.clone(),
                x: location.x,
                y: location.z,
                areas: area_out,
            });
        }
        cities
    }

    // Stage E: complete ferries from definition plus sector ferry items
    fn emit_ferries(&mut self) -> Vec<FerryOut> {
        let mut ferries = Vec::new();
        for (token, def) in &self.defs.ferries {
            let Some(&(_, item)) = self.ferry_items.get(token) else {
                continue;
            };
            let Some((x, y)) = self.node_pos(item.node_uid) else {
                continue;
            };
            let mut connections = Vec::new();
            for connection in &def.connections {
                let Some(&(_, target)) = self.ferry_items.get(&connection.target_token) else {
                    tracing::warn!(
                        ferry = %token,
                        target = %connection.target_token,
                        "ferry connection target has no sector item"
                    );
                    self.warnings += 1;
                    continue;
                };
                let Some((tx, ty)) = self.node_pos(target.node_uid) else {
                    continue;
                };
                let target_name = self
                    .defs
                    .ferries
                    .get(&connection.target_token)
                    .map_or_else(
                        || connection.target_token.clone(),
                        |target_def| {
                            localized_name(
                                self.locale,
                                &target_def.name,
                                target_def.name_localized.as_deref(),
                            )
                        },
                    );
                connections.push(FerryConnectionOut {
                    token: connection.target_token.clone(),
                    name: target_name,
                    x: tx,
                    y: ty,
                });
            }
            ferries.push(FerryOut {
                token: token.clone(),
                name: localized_name(self.locale, &def.name, def.name_localized.as_deref()),
                train: item.train,
                x,
                y,
                connections,
            });
        }
        ferries
    }

    // Stage G: substitute node positions into mileage targets lacking them
    fn emit_mileage_targets(&self) -> IndexMap<String, super::defs::MileageTarget> {
        let mut targets = self.defs.mileage_targets.clone();
        for target in targets.values_mut() {
            if target.x.is_some() && target.y.is_some() {
                continue;
            }
            let Some(node) = target.node_uid.and_then(|uid| self.nodes.get(&uid)) else {
                continue;
            };
            target.x = Some(round2(node.x));
            target.y = Some(round2(node.z));
        }
        targets
    }

    // Stage H: materialize node arrays and the final bundle
    fn emit(mut self) -> MapData {
        let cities = self.emit_cities();
        let ferries = self.emit_ferries();
        let mileage_targets = self.emit_mileage_targets();

        let collect_nodes = |uids: &BTreeSet<u64>, nodes: &HashMap<u64, &Node>| {
            uids.iter()
                .filter_map(|uid| nodes.get(uid))
                .map(|n| {
                    [
                        n.x.round() as i64,
                        n.y.round() as i64,
                        n.z.round() as i64,
                    ]
                })
                .collect::<Vec<_>>()
        };
        let nodes = collect_nodes(&self.referenced, &self.nodes);
        let elevation = collect_nodes(&self.elevation, &self.nodes);

        let mut roads: Vec<RoadOut> = self
            .roads
            .iter()
            .map(|(item, road)| RoadOut {
                uid: item.uid,
                road_look_token: road.road_look_token.clone(),
                start_node_uid: road.start_node_uid,
                end_node_uid: road.end_node_uid,
                hidden: road.hidden,
                dlc_guard: road.dlc_guard,
                maybe_divided: self.maybe_divided.contains(&item.uid),
            })
            .collect();
        roads.sort_by_key(|r| r.uid);

        let countries = self
            .defs
            .countries
            .iter()
            .map(|(token, def)| {
                let name = localized_name(self.locale, &def.name, def.name_localized.as_deref());
                CountryOut::from_def(token, def, name)
            })
            .collect();
        let company_defs = self
            .defs
            .companies
            .iter()
            .map(|(token, def)| (token.clone(), CompanyDefOut { name: def.name.clone() }))
            .collect();

        self.prefabs_out.sort_by_key(|p| p.uid);
        self.models_out.sort_by_key(|m| m.uid);
        self.map_areas_out.sort_by_key(|a| a.uid);
        self.triggers_out.sort_by_key(|t| t.uid);
        self.trajectories_out.sort_by_key(|t| t.uid);
        self.cutscenes_out.sort_by_key(|c| c.uid);

        if !self.no_poi_companies.is_empty() {
            tracing::info!(
                companies = ?self.no_poi_companies,
                "companies without icons were skipped"
            );
        }
        if !self.fallback_poi_companies.is_empty() {
            tracing::info!(
                companies = ?self.fallback_poi_companies,
                "companies placed from item nodes"
            );
        }
        tracing::info!(
            pois = self.pois.len(),
            warnings = self.warnings,
            "assembled map data"
        );

        MapData {
            nodes,
            elevation,
            roads,
            ferries,
            prefabs: self.prefabs_out,
            companies: self.companies_out,
            models: self.models_out,
            map_areas: self.map_areas_out,
            pois: self.pois,
            dividers: self.dividers_out,
            triggers: self.triggers_out,
            trajectories: self.trajectories_out,
            cutscenes: self.cutscenes_out,
            countries,
            cities,
            company_defs,
            road_looks: self.defs.road_looks.clone(),
            prefab_descriptions: self.defs.prefab_descriptions.clone(),
            model_descriptions: self.defs.model_descriptions.clone(),
            achievements: self.defs.achievements.clone(),
            routes: self.defs.routes.clone(),
            mileage_targets,
        }
    }
}

/// Icon for a facility spawn point kind, when it yields a POI
fn facility_icon(kind: SpawnPointKind) -> Option<&'static str> {
    match kind {
        SpawnPointKind::Gas => Some("gas_ico"),
        SpawnPointKind::Service => Some("service_ico"),
        SpawnPointKind::WeighStation => Some("weigh_station_ico"),
        SpawnPointKind::TruckDealer => Some("dealer_ico"),
        SpawnPointKind::Buy => Some("garage_large_ico"),
        SpawnPointKind::Recruitment => Some("recruitment_ico"),
        SpawnPointKind::CompanyPos | SpawnPointKind::Unknown => None,
    }
}

/// Project a prefab-local point into map space.
///
/// The prefab item's first placed node anchors the description node selected
/// by the item's origin index; the local point is translated into that frame
/// and rotated by the heading difference around the anchor.
pub fn to_map_position(
    prefab: &PrefabItem,
    desc: &PrefabDescription,
    nodes: &HashMap<u64, &Node>,
    local: (f32, f32),
) -> Option<(f32, f32)> {
    let anchor = nodes.get(prefab.node_uids.first()?)?;
    let origin = desc.nodes.get(prefab.origin as usize)?;
    let rotation = anchor.rotation - origin.rotation;
    let x = anchor.x - origin.x + local.0;
    let z = anchor.z - origin.z + local.1;
    Some(rotate_point(x, z, rotation, anchor.x, anchor.z))
}

fn rotate_point(x: f32, z: f32, angle: f32, cx: f32, cz: f32) -> (f32, f32) {
    let (sin, cos) = angle.sin_cos();
    let dx = x - cx;
    let dz = z - cz;
    (cx + dx * cos - dz * sin, cz + dx * sin + dz * cos)
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    let dx = a.0 - b.0;
    let dz = a.1 - b.1;
    (dx * dx + dz * dz).sqrt()
}

fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}
