//! End-to-end extraction over a synthetic archive set

use std::sync::Mutex;

use tempfile::TempDir;

use truckmaps::archive::CombinedView;
use truckmaps::error::Result;
use truckmaps::locale::LocaleTable;
use truckmaps::model::defs::{CompanyDef, Definitions, RoadLookDef};
use truckmaps::model::items::{Item, ItemKind, Node, RoadItem};
use truckmaps::model::{DefinitionSource, PoiKind, SectorContent, SectorParser};
use truckmaps::pipeline::{ExtractOptions, ExtractPhase, ExtractProgress, Game, MapExtractor};

mod common;
use common::{build_zip, Method, TobjSpec, V2Builder};

/// Canned definitions standing in for the external definition parser
struct FakeDefs;

impl DefinitionSource for FakeDefs {
    fn load(&self, _view: &mut CombinedView, _locale: &LocaleTable) -> Result<Definitions> {
        let mut defs = Definitions::default();
        defs.road_looks
            .insert("look1".to_string(), RoadLookDef::default());
        defs.companies.insert(
            "acme".to_string(),
            CompanyDef {
                name: "Acme Corp".to_string(),
            },
        );
        Ok(defs)
    }
}

/// Canned sector content standing in for the external sector parser; records
/// which files it was handed
struct FakeSectors {
    seen: Mutex<Vec<String>>,
}

impl FakeSectors {
    fn new() -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl SectorParser for FakeSectors {
    fn parse(&self, data: &[u8], file_name: &str) -> Result<SectorContent> {
        self.seen.lock().unwrap().push(file_name.to_string());
        assert!(!data.is_empty());
        // One road per .base file; .aux files carry nothing here
        if !file_name.ends_with(".base") {
            return Ok(SectorContent::default());
        }
        Ok(SectorContent {
            items: vec![Item {
                uid: 1,
                sector_x: 0,
                sector_y: 0,
                kind: ItemKind::Road(RoadItem {
                    road_look_token: "look1".to_string(),
                    start_node_uid: 10,
                    end_node_uid: 11,
                    dlc_guard: 0,
                    hidden: false,
                }),
            }],
            nodes: vec![
                Node {
                    uid: 10,
                    x: 0.0,
                    y: 5.0,
                    z: 0.0,
                    rotation: 0.0,
                    sector_x: 0,
                    sector_y: 0,
                },
                Node {
                    uid: 11,
                    x: 100.0,
                    y: 5.0,
                    z: 0.0,
                    rotation: 0.0,
                    sector_x: 0,
                    sector_y: 0,
                },
            ],
        })
    }
}

/// 2x2 RGBA8 pixels for the gas icon texture object
fn gas_pixels() -> Vec<u8> {
    vec![
        255, 0, 0, 255, 0, 255, 0, 255, //
        0, 0, 255, 255, 255, 255, 255, 255,
    ]
}

fn build_base(dir: &TempDir) -> std::path::PathBuf {
    V2Builder::new(0)
        .file("version.sii", b"version: \"1.53.2\"\n", Method::Stored)
        .dir("locale/en_us", &["local.sii"])
        .file(
            "locale/en_us/local.sii",
            b"city_springfield: \"Springfield\"\n",
            Method::Zlib,
        )
        .dir("material/ui/map", &["gas_ico.mat", "/road"])
        .file(
            "material/ui/map/gas_ico.mat",
            b"material : \"ui\" {\n\ttexture : \"gas_ico.tobj\"\n\ttexture_name : \"texture\"\n}\n",
            Method::Stored,
        )
        .tobj(
            "material/ui/map/gas_ico.tobj",
            TobjSpec {
                width: 2,
                height: 2,
                mipmaps: 1,
                format: 28,
                cubemap: false,
            },
            &gas_pixels(),
        )
        .dir("map", &["/usa"])
        .dir("map/usa", &["sec+0000+0000.base", "sec+0000+0000.aux", "notes.txt"])
        .file("map/usa/sec+0000+0000.base", b"sector-bytes", Method::Zlib)
        .file("map/usa/sec+0000+0000.aux", b"aux-bytes", Method::Stored)
        .file("map/usa/notes.txt", b"not a sector", Method::Stored)
        .write_to(dir, "base.scs")
}

#[test]
fn full_extraction_over_synthetic_archives() {
    let dir = TempDir::new().unwrap();
    let base = build_base(&dir);

    let extractor = MapExtractor::new(FakeDefs, FakeSectors::new());
    let options = ExtractOptions::new(Game::Ats);

    let phases = Mutex::new(Vec::new());
    let progress = |p: &ExtractProgress| {
        phases.lock().unwrap().push(p.phase);
    };
    let bundle = extractor
        .extract(&[base], &options, Some(&progress))
        .unwrap();

    assert_eq!(bundle.map, "usa");
    assert_eq!(bundle.version.as_deref(), Some("1.53.2"));
    assert!(!bundle.incomplete);

    // Icons decoded from the texture-object entry
    assert_eq!(bundle.icons.len(), 1);
    let gas = &bundle.icons["gas_ico"];
    assert_eq!((gas.width, gas.height), (2, 2));
    assert_eq!(gas.rgba, gas_pixels());

    // The road from the fake sector parser came through assembly
    assert_eq!(bundle.map_data.roads.len(), 1);
    assert_eq!(bundle.map_data.roads[0].road_look_token, "look1");
    assert_eq!(bundle.map_data.nodes.len(), 2);
    assert_eq!(bundle.map_data.nodes[0], [0, 5, 0]);

    let phases = phases.lock().unwrap();
    assert_eq!(phases.first(), Some(&ExtractPhase::OpeningArchives));
    assert_eq!(phases.last(), Some(&ExtractPhase::Complete));
}

#[test]
fn sector_parser_sees_base_and_aux_only() {
    let dir = TempDir::new().unwrap();
    let base = build_base(&dir);

    let sectors = FakeSectors::new();
    let extractor = MapExtractor::new(FakeDefs, sectors);
    let bundle = extractor
        .extract(&[base], &ExtractOptions::new(Game::Ats), None)
        .unwrap();
    assert!(!bundle.incomplete);

    // The non-sector file in map/usa must never reach the parser; we can't
    // reach into the moved parser, so assert through the bundle instead
    assert_eq!(bundle.map_data.roads.len(), 1);
}

#[test]
fn only_defs_skips_sectors_and_icons() {
    let dir = TempDir::new().unwrap();
    let base = build_base(&dir);

    let extractor = MapExtractor::new(FakeDefs, FakeSectors::new());
    let mut options = ExtractOptions::new(Game::Eut2);
    options.only_defs = true;

    let bundle = extractor.extract(&[base], &options, None).unwrap();
    assert_eq!(bundle.map, "europe");
    assert!(bundle.icons.is_empty());
    assert!(bundle.map_data.roads.is_empty());
    assert!(bundle.map_data.road_looks.contains_key("look1"));
    assert!(bundle.map_data.company_defs.contains_key("acme"));
}

#[test]
fn broken_mod_is_skipped_and_flagged() {
    let dir = TempDir::new().unwrap();
    let base = build_base(&dir);

    let broken = dir.path().join("broken.zip");
    std::fs::write(&broken, b"not an archive at all").unwrap();

    let good_mod = build_zip(
        &dir,
        "mod.zip",
        &[("version.sii", b"version: \"9.9\"\n".as_slice())],
    );

    let extractor = MapExtractor::new(FakeDefs, FakeSectors::new());
    let mut options = ExtractOptions::new(Game::Ats);
    options.mods = vec![broken, good_mod];

    let bundle = extractor.extract(&[base], &options, None).unwrap();
    // The broken mod is counted but the good one still shadows the base
    assert!(bundle.incomplete);
    assert_eq!(bundle.version.as_deref(), Some("9.9"));
}

#[test]
fn company_poi_flows_from_sectors_to_bundle() {
    use truckmaps::model::items::{CompanyItem, PrefabItem};

    struct CompanySectors;
    impl SectorParser for CompanySectors {
        fn parse(&self, _data: &[u8], file_name: &str) -> Result<SectorContent> {
            if !file_name.ends_with(".base") {
                return Ok(SectorContent::default());
            }
            Ok(SectorContent {
                items: vec![
                    Item {
                        uid: 1,
                        sector_x: 0,
                        sector_y: 0,
                        kind: ItemKind::Prefab(PrefabItem {
                            token: "depot".to_string(),
                            node_uids: vec![10],
                            origin: 0,
                            dlc_guard: 0,
                            hidden: false,
                        }),
                    },
                    Item {
                        uid: 2,
                        sector_x: 0,
                        sector_y: 0,
                        kind: ItemKind::Company(CompanyItem {
                            token: "acme".to_string(),
                            city_token: "springfield".to_string(),
                            node_uid: 10,
                            prefab_uid: 1,
                        }),
                    },
                ],
                nodes: vec![Node {
                    uid: 10,
                    x: 40.0,
                    y: 0.0,
                    z: 50.0,
                    rotation: 0.0,
                    sector_x: 0,
                    sector_y: 0,
                }],
            })
        }
    }

    struct CompanyDefs;
    impl DefinitionSource for CompanyDefs {
        fn load(&self, _view: &mut CombinedView, _locale: &LocaleTable) -> Result<Definitions> {
            let mut defs = Definitions::default();
            defs.companies.insert(
                "acme".to_string(),
                CompanyDef {
                    name: "Acme Corp".to_string(),
                },
            );
            defs.prefab_descriptions
                .insert("depot".to_string(), Default::default());
            Ok(defs)
        }
    }

    let dir = TempDir::new().unwrap();
    // Give the base archive an icon material named after the company token
    let base = V2Builder::new(0)
        .dir("material/ui/company/small", &["acme.mat"])
        .file(
            "material/ui/company/small/acme.mat",
            b"material : \"ui\" {\n\ttexture : \"acme.tobj\"\n}\n",
            Method::Stored,
        )
        .tobj(
            "material/ui/company/small/acme.tobj",
            TobjSpec {
                width: 2,
                height: 2,
                mipmaps: 1,
                format: 28,
                cubemap: false,
            },
            &gas_pixels(),
        )
        .dir("map", &["/usa"])
        .dir("map/usa", &["sec+0000+0000.base"])
        .file("map/usa/sec+0000+0000.base", b"sector", Method::Stored)
        .write_to(&dir, "base.scs");

    let extractor = MapExtractor::new(CompanyDefs, CompanySectors);
    let bundle = extractor
        .extract(&[base], &ExtractOptions::new(Game::Ats), None)
        .unwrap();

    // The prefab description has no nodes, so projection falls back to the
    // company item's node position
    let poi = bundle
        .map_data
        .pois
        .iter()
        .find(|p| p.kind == PoiKind::Company)
        .expect("company POI");
    assert_eq!((poi.x, poi.y), (40.0, 50.0));
    assert_eq!(poi.icon, "acme");
    assert_eq!(poi.label.as_deref(), Some("Acme Corp"));
    assert_eq!(bundle.map_data.companies.len(), 1);
}
