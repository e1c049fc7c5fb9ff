//! The layer panel printed after a fixture sync.

use std::sync::Arc;

use carto_cli::report::render_panel;
use carto_core::{MapContext, MemorySurface, SyncPipeline};
use carto_model::{Category, RecordId};
use carto_source::FixtureSource;
use serde_json::json;
use tempfile::TempDir;

fn write(dir: &TempDir, category: Category, rows: serde_json::Value) {
    let path = dir.path().join(format!("{}.json", category.query().table));
    std::fs::write(path, rows.to_string()).unwrap();
}

fn fixtures() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        Category::Beneficiaries,
        json!([
            {"id_beneficiaire": "b1", "geojson": {"type": "Point", "coordinates": [2.43, 50.96]}, "n_intervenants": 1},
            {"id_beneficiaire": "b2", "geojson": {"type": "Point", "coordinates": [2.44, 50.97]}, "n_intervenants": 3},
        ]),
    );
    write(
        &dir,
        Category::FieldAgents,
        json!([
            {"id_intervenant": 7, "couleur": "#0af", "geojson": {"type": "Point", "coordinates": [2.43, 50.96]}},
            {"id_intervenant": 9, "geojson": {"type": "Point", "coordinates": [2.45, 50.98]}},
        ]),
    );
    write(
        &dir,
        Category::TeamSectors,
        json!([
            {"id_equipe": 1, "nom_equipe": "North", "geojson": {
                "type": "Polygon",
                "coordinates": [[[2.4, 50.9], [2.5, 50.9], [2.5, 51.0], [2.4, 50.9]]]
            }},
        ]),
    );
    dir
}

#[tokio::test]
async fn panel_after_unchecking_an_agent() {
    let dir = fixtures();
    let context = Arc::new(MapContext::new(Arc::new(MemorySurface::new())));
    let pipeline = SyncPipeline::new(
        Arc::clone(&context),
        Arc::new(FixtureSource::new(dir.path())),
    );

    let report = pipeline.load_all().await;
    context
        .toggle_override(Category::FieldAgents, &RecordId::new("9").unwrap(), false)
        .unwrap();
    let views = context.open_panel();

    assert_eq!(report.failures().count(), 1);
    insta::assert_snapshot!(render_panel(&views).trim_end(), @r"
    [x] Beneficiaries (2/2)
    [x] Field agents (1/2)
        [x] 7 #0af
        [ ] 9 #666
    [x] Agent sectors (0/0)
    [x] Team sectors (1/1)
        [x] North #ff22cc
    ");
}

#[tokio::test]
async fn panel_after_teardown_is_empty_and_unchecked() {
    let dir = fixtures();
    let context = Arc::new(MapContext::new(Arc::new(MemorySurface::new())));
    let pipeline = SyncPipeline::new(
        Arc::clone(&context),
        Arc::new(FixtureSource::new(dir.path())),
    );
    pipeline.load_all().await;

    context.teardown();
    let views = context.open_panel();

    insta::assert_snapshot!(render_panel(&views).trim_end(), @r"
    [ ] Beneficiaries (0/0)
    [ ] Field agents (0/0)
    [ ] Agent sectors (0/0)
    [ ] Team sectors (0/0)
    ");
}
