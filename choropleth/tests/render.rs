//! Tests d'intégration : état applicatif jusqu'au fichier GeoJSON

use std::path::{Path, PathBuf};

use choropleth::export::{export_to_geojson, to_feature_collection};
use choropleth::{AppState, Config, JoinReport, JoinStatus};
use geojoin::{Metric, ParseError, RecordIndex};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../geojoin/tests/fixtures")
        .join(name)
}

fn loaded_state() -> AppState {
    let mut state = AppState::new();
    state
        .load_geo(&std::fs::read(fixture("regions.kml")).unwrap())
        .unwrap();
    state
        .load_table(&std::fs::read(fixture("metrics.csv")).unwrap())
        .unwrap();
    state
}

#[test]
fn test_render_fixture_to_file() {
    let state = loaded_state();
    let snapshot = state.snapshot();
    let empty = RecordIndex::default();
    let presenter = snapshot.presenter(&empty, Config::default().style);
    let geo = snapshot.geo.as_ref().unwrap();

    let output = std::env::temp_dir().join("choropleth_render_fixture.geojson");
    export_to_geojson(&geo.data, &presenter, &output).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    let features = json["features"].as_array().unwrap();
    assert_eq!(features.len(), 4);

    let fills: Vec<_> = features
        .iter()
        .map(|f| f["properties"]["fill"].as_str().unwrap())
        .collect();
    assert_eq!(fills, vec!["#a383c3", "#ede9fe", "#581c87", "#9ca3af"]);

    assert_eq!(features[0]["id"], "R01");
    assert_eq!(features[0]["geometry"]["type"], "Polygon");
    assert_eq!(features[2]["geometry"]["type"], "MultiPolygon");
    // Épaisseur portée par le style KML partagé
    assert_eq!(features[0]["properties"]["stroke-width"], 2.0);
    assert_eq!(features[3]["properties"]["stroke-width"], 3.0);
    assert_eq!(features[3]["properties"]["popup"]["status"], "unmatched");

    std::fs::remove_file(output).ok();
}

#[test]
fn test_metric_switch_and_reset() {
    let mut state = loaded_state();
    state.select_metric(Metric::Cost);

    let snapshot = state.snapshot();
    let empty = RecordIndex::default();
    let presenter = snapshot.presenter(&empty, Config::default().style);
    let fc = to_feature_collection(&snapshot.geo.as_ref().unwrap().data, &presenter).unwrap();
    let occitanie = fc.features[2].properties.as_ref().unwrap();
    assert_eq!(occitanie["fill"], "#581c87");

    state
        .load_table(&std::fs::read(fixture("metrics.csv")).unwrap())
        .unwrap();
    assert_eq!(state.metric(), Metric::Revenue);
    // L'ancien snapshot garde sa métrique
    assert_eq!(snapshot.metric, Metric::Cost);
}

#[test]
fn test_rejected_upload_keeps_render_stable() {
    let mut state = loaded_state();
    let before = state.geo().unwrap().fingerprint.clone();

    assert!(matches!(
        state.load_geo(b"<html><body/></html>"),
        Err(ParseError::Malformed(_))
    ));
    assert_eq!(
        state.load_table(b"name,value\na,1\n").unwrap_err(),
        ParseError::MissingColumns(vec![
            "id".to_string(),
            "revenue".to_string(),
            "cost".to_string()
        ])
    );

    assert_eq!(state.geo().unwrap().fingerprint, before);
    assert_eq!(state.geo().unwrap().data.len(), 4);
}

#[test]
fn test_report_on_fixtures() {
    let state = loaded_state();
    let geo = state.geo().unwrap();
    let table = state.table().unwrap();

    let report = JoinReport::new(&geo.data, &table.data, state.metric());
    assert_eq!(report.status, JoinStatus::Partial);
    assert_eq!(report.matched, 3);
    assert_eq!(report.unused_ids, vec!["R99".to_string()]);
    assert_eq!(report.coercion_warnings.len(), 1);
    assert_eq!(report.unmatched[0].name.as_deref(), Some("Corse"));
}

#[test]
fn test_all_presets_render() {
    let state = loaded_state();
    let snapshot = state.snapshot();
    let empty = RecordIndex::default();

    for preset in choropleth::config::PRESETS {
        let config = Config::from_preset(preset).unwrap();
        let presenter = snapshot.presenter(&empty, config.style);
        let fc = to_feature_collection(&snapshot.geo.as_ref().unwrap().data, &presenter).unwrap();
        let corse = fc.features[3].properties.as_ref().unwrap();
        assert_eq!(corse["fill-opacity"], config.style.fill_opacity);
    }
}
