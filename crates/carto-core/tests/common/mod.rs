//! Shared fixtures for the core integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex};

use carto_core::{
    DataSource, FetchError, LifecycleController, MapContext, MemorySurface, SyncPipeline,
};
use carto_model::{Category, TableQuery};
use serde_json::{Value, json};
use tokio::sync::oneshot;

type Response = Result<Vec<Value>, FetchError>;

#[derive(Default)]
struct Script {
    queued: VecDeque<(Option<oneshot::Receiver<()>>, Response)>,
    standing: Option<Response>,
    fetches: usize,
}

/// A data source answering from per-table scripts.
///
/// Queued responses are served first, in order; after that the standing
/// response is repeated. A gated response waits until its sender fires or
/// is dropped.
#[derive(Default)]
pub struct ScriptedSource {
    scripts: Mutex<HashMap<&'static str, Script>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_script<R>(&self, category: Category, f: impl FnOnce(&mut Script) -> R) -> R {
        let mut scripts = self.scripts.lock().unwrap();
        f(scripts.entry(category.query().table).or_default())
    }

    pub fn standing(&self, category: Category, rows: Vec<Value>) {
        self.with_script(category, |s| s.standing = Some(Ok(rows)));
    }

    pub fn fail(&self, category: Category, error: FetchError) {
        self.with_script(category, |s| s.standing = Some(Err(error)));
    }

    /// Queues a response that is held back until the returned sender fires.
    pub fn gate(&self, category: Category, response: Response) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.with_script(category, |s| s.queued.push_back((Some(rx), response)));
        tx
    }

    pub fn fetches(&self, category: Category) -> usize {
        self.with_script(category, |s| s.fetches)
    }

    pub fn total_fetches(&self) -> usize {
        self.scripts.lock().unwrap().values().map(|s| s.fetches).sum()
    }

    /// Yields until at least `n` fetches have been issued.
    pub async fn wait_for_fetches(&self, n: usize) {
        for _ in 0..1_000 {
            if self.total_fetches() >= n {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("expected {n} fetches, saw {}", self.total_fetches());
    }
}

impl DataSource for ScriptedSource {
    fn fetch(&self, query: TableQuery) -> impl Future<Output = Response> + Send {
        let next = {
            let mut scripts = self.scripts.lock().unwrap();
            let script = scripts.entry(query.table).or_default();
            script.fetches += 1;
            script
                .queued
                .pop_front()
                .unwrap_or_else(|| (None, script.standing.clone().unwrap_or(Ok(Vec::new()))))
        };
        async move {
            let (gate, response) = next;
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            response
        }
    }
}

pub struct Harness {
    pub surface: Arc<MemorySurface>,
    pub source: Arc<ScriptedSource>,
    pub context: Arc<MapContext<MemorySurface>>,
    pub pipeline: SyncPipeline<MemorySurface, ScriptedSource>,
}

impl Harness {
    pub fn new() -> Self {
        let surface = Arc::new(MemorySurface::new());
        let source = Arc::new(ScriptedSource::new());
        let context = Arc::new(MapContext::new(Arc::clone(&surface)));
        let pipeline = SyncPipeline::new(Arc::clone(&context), Arc::clone(&source));
        Self {
            surface,
            source,
            context,
            pipeline,
        }
    }

    /// Every category answers with the given identities.
    pub fn with_all(self, ids: &[&str]) -> Self {
        for category in Category::ALL {
            self.source.standing(category, rows_for(category, ids));
        }
        self
    }

    pub fn controller(&self) -> Arc<LifecycleController<MemorySurface, ScriptedSource>> {
        Arc::new(LifecycleController::new(self.pipeline.clone()))
    }

    /// Checks that every layer is attached exactly when the store says so
    /// and that the surface holds nothing else.
    pub fn assert_consistent(&self) {
        let (registered, owned) = self.context.inspect(|state| {
            let mut attached = 0;
            let mut owned = 0;
            for category in Category::ALL {
                for entry in state.registry(category).iter() {
                    let expected = state.store().is_visible(category, entry.id());
                    assert_eq!(
                        entry.is_attached(),
                        expected,
                        "{category} record {} out of sync",
                        entry.id()
                    );
                    assert_eq!(self.surface.is_attached(entry.layer().id()), expected);
                    attached += usize::from(expected);
                    owned += 1;
                }
            }
            (attached, owned)
        });
        assert_eq!(self.surface.attached_count(), registered, "leaked layers");
        assert_eq!(self.surface.live_count(), owned, "unreleased layers");
    }

    pub fn attached_ids(&self, category: Category) -> Vec<String> {
        self.context.inspect(|state| {
            state
                .registry(category)
                .iter()
                .filter(|entry| entry.is_attached())
                .map(|entry| entry.id().to_string())
                .collect()
        })
    }
}

fn point(offset: usize) -> Value {
    json!({"type": "Point", "coordinates": [2.43 + offset as f64 * 0.001, 50.96]})
}

fn square(offset: usize) -> Value {
    let x = 2.40 + offset as f64 * 0.01;
    json!({
        "type": "Polygon",
        "coordinates": [[[x, 50.9], [x + 0.01, 50.9], [x + 0.01, 50.91], [x, 50.9]]]
    })
}

pub fn rows_for(category: Category, ids: &[&str]) -> Vec<Value> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| match category {
            Category::Beneficiaries => json!({
                "id_beneficiaire": id,
                "adresse": format!("{i} rue de la Plage"),
                "geojson": point(i),
                "n_intervenants": 1,
                "couleur1": "#3a7",
            }),
            Category::FieldAgents => json!({
                "id_intervenant": id,
                "couleur": "#0af",
                "id_equipe": 1,
                "geojson": point(i),
            }),
            Category::AgentSectors => json!({
                "id_intervenant": id,
                "couleur": "#fa0",
                "geojson": square(i),
            }),
            Category::TeamSectors => json!({
                "id_equipe": id,
                "nom_equipe": format!("Team {id}"),
                "geojson": square(i),
            }),
        })
        .collect()
}

pub fn id(s: &str) -> carto_model::RecordId {
    carto_model::RecordId::new(s).unwrap()
}
