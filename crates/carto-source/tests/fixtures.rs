//! Loading layers from fixture files and configuration from disk.

use std::sync::Arc;

use carto_core::{DataSource, FetchError, LoadOutcome, MapContext, MemorySurface, SyncPipeline};
use carto_model::Category;
use carto_source::{AppConfig, FixtureSource, SourceError};
use serde_json::json;
use tempfile::TempDir;

fn write(dir: &TempDir, category: Category, body: &str) {
    let path = dir.path().join(format!("{}.json", category.query().table));
    std::fs::write(path, body).unwrap();
}

#[tokio::test]
async fn fixture_source_reads_view_files() {
    let dir = TempDir::new().unwrap();
    let rows = json!([
        {"id_equipe": 1, "nom_equipe": "North", "couleur": "#f0f",
         "geojson": {"type": "Polygon", "coordinates": [[[2.4, 50.9], [2.5, 50.9], [2.5, 51.0], [2.4, 50.9]]]}}
    ]);
    write(&dir, Category::TeamSectors, &rows.to_string());

    let source = FixtureSource::new(dir.path());
    let fetched = source.fetch(Category::TeamSectors.query()).await.unwrap();

    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0]["nom_equipe"], "North");
}

#[tokio::test]
async fn missing_and_malformed_fixtures_fail_that_category_only() {
    let dir = TempDir::new().unwrap();
    write(&dir, Category::Beneficiaries, "[]");
    write(&dir, Category::FieldAgents, r#"{"rows": []}"#);
    write(&dir, Category::AgentSectors, "not json");

    let context = Arc::new(MapContext::new(Arc::new(MemorySurface::new())));
    let pipeline = SyncPipeline::new(context, Arc::new(FixtureSource::new(dir.path())));
    let report = pipeline.load_all().await;

    assert!(report.outcome(Category::Beneficiaries).unwrap().is_applied());
    assert!(matches!(
        report.outcome(Category::FieldAgents),
        Some(LoadOutcome::Failed(FetchError::Payload(_)))
    ));
    assert!(matches!(
        report.outcome(Category::AgentSectors),
        Some(LoadOutcome::Failed(FetchError::Payload(_)))
    ));
    assert!(matches!(
        report.outcome(Category::TeamSectors),
        Some(LoadOutcome::Failed(FetchError::Unavailable(_)))
    ));
}

#[test]
fn config_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[supabase]\nurl = \"https://abcd.supabase.co\"\nanon_key = \"k\"\n\n[map]\nzoom = 11\n",
    )
    .unwrap();

    let config = AppConfig::load(Some(&path)).unwrap();

    assert!(config.validate().is_ok());
    assert_eq!(config.supabase.schema, "projet_carto_amelie");
    assert_eq!(config.map.zoom, 11);
    assert_eq!(config.map.center, [50.969, 2.436]);
}

#[test]
fn explicit_config_path_must_exist() {
    let dir = TempDir::new().unwrap();
    let err = AppConfig::load(Some(&dir.path().join("missing.toml"))).unwrap_err();
    assert!(matches!(err, SourceError::ConfigRead { .. }));
    assert!(err.suggestion().is_some());
}

#[test]
fn invalid_toml_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[supabase\nurl = ").unwrap();
    assert!(matches!(
        AppConfig::load(Some(&path)),
        Err(SourceError::ConfigParse { .. })
    ));
}
