//! Fetching categories and installing the results.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures_util::future::join_all;
use tracing::{Instrument, debug, info, info_span, warn};

use carto_model::{Category, RecordSet};

use crate::context::MapContext;
use crate::resolver::apply;
use crate::source::{DataSource, FetchError};
use crate::surface::RenderSurface;

/// Result of installing one successful fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadSummary {
    pub records: usize,
    pub skipped: usize,
    /// Hidden records still present after the reload.
    pub carried_overrides: usize,
    /// Hidden records that disappeared and lost their override.
    pub pruned_overrides: usize,
    /// Previously loaded identities absent from this fetch.
    pub dropped: usize,
    pub attached: usize,
}

/// How one category load ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied(LoadSummary),
    /// The fetch failed; the category was left untouched.
    Failed(FetchError),
    /// A teardown happened while the fetch was in flight.
    Stale,
    /// A newer load of the same category was started.
    Superseded,
}

impl LoadOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applied(_) => "applied",
            Self::Failed(_) => "failed",
            Self::Stale => "stale",
            Self::Superseded => "superseded",
        }
    }

    pub fn summary(&self) -> Option<&LoadSummary> {
        match self {
            Self::Applied(summary) => Some(summary),
            _ => None,
        }
    }
}

/// Outcomes of one load pass, in panel order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Epoch the pass started in.
    pub epoch: u64,
    pub outcomes: Vec<(Category, LoadOutcome)>,
    pub duration: Duration,
}

impl LoadReport {
    pub fn outcome(&self, category: Category) -> Option<&LoadOutcome> {
        self.outcomes
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, outcome)| outcome)
    }

    pub fn applied_count(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_applied()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (Category, &FetchError)> {
        self.outcomes.iter().filter_map(|(category, outcome)| match outcome {
            LoadOutcome::Failed(err) => Some((*category, err)),
            _ => None,
        })
    }
}

/// Loads categories from a [`DataSource`] into a [`MapContext`].
pub struct SyncPipeline<S: RenderSurface, D: DataSource> {
    context: Arc<MapContext<S>>,
    source: Arc<D>,
}

impl<S: RenderSurface, D: DataSource> Clone for SyncPipeline<S, D> {
    fn clone(&self) -> Self {
        Self {
            context: Arc::clone(&self.context),
            source: Arc::clone(&self.source),
        }
    }
}

impl<S: RenderSurface, D: DataSource> SyncPipeline<S, D> {
    pub fn new(context: Arc<MapContext<S>>, source: Arc<D>) -> Self {
        Self { context, source }
    }

    pub fn context(&self) -> &Arc<MapContext<S>> {
        &self.context
    }

    pub fn source(&self) -> &Arc<D> {
        &self.source
    }

    /// Fetches one category and installs it if nothing newer happened
    /// in the meantime.
    pub async fn load_category(&self, category: Category) -> LoadOutcome {
        let (epoch, ticket) = {
            let mut state = self.context.lock();
            (state.epoch, state.issue_ticket(category))
        };
        self.fetch_and_install(category, epoch, ticket).await
    }

    /// Turns every master on, then loads every category concurrently.
    pub async fn load_all(&self) -> LoadReport {
        let epoch = self.context.epoch();
        self.load_all_in(epoch).await
    }

    /// Like [`load_all`](Self::load_all) but only if the context is still in
    /// `epoch`. A pass started for an epoch that has already ended reports
    /// every category as stale and changes nothing.
    pub async fn load_all_in(&self, epoch: u64) -> LoadReport {
        let started = Instant::now();
        let tickets = {
            let mut guard = self.context.lock();
            if guard.epoch != epoch {
                None
            } else {
                guard.store.reset_all(true);
                let surface = Arc::clone(self.context.surface());
                for category in Category::ALL {
                    apply(surface.as_ref(), &mut guard, category);
                    self.context.publish(&mut guard, category);
                }
                Some(Category::ALL.map(|category| guard.issue_ticket(category)))
            }
        };

        let Some(tickets) = tickets else {
            debug!(epoch, "load pass started after teardown, skipping");
            return LoadReport {
                epoch,
                outcomes: Category::ALL.map(|c| (c, LoadOutcome::Stale)).to_vec(),
                duration: started.elapsed(),
            };
        };

        info!(epoch, "loading all categories");
        let loads: Vec<_> = Category::ALL
            .into_iter()
            .zip(tickets)
            .map(|(category, ticket)| async move {
                let outcome = self.fetch_and_install(category, epoch, ticket).await;
                (category, outcome)
            })
            .collect();
        let outcomes = join_all(loads).await;

        let report = LoadReport {
            epoch,
            outcomes,
            duration: started.elapsed(),
        };
        info!(
            epoch,
            applied = report.applied_count(),
            failed = report.failures().count(),
            duration_ms = report.duration.as_millis() as u64,
            "load pass settled"
        );
        report
    }

    async fn fetch_and_install(&self, category: Category, epoch: u64, ticket: u64) -> LoadOutcome {
        let query = category.query();
        let span = info_span!("load", category = %category, table = query.table);
        async move {
            let rows = match self.source.fetch(query).await {
                Ok(rows) => rows,
                Err(err) => {
                    warn!(error = %err, "fetch failed, keeping previous layers");
                    return LoadOutcome::Failed(err);
                }
            };

            let set = RecordSet::from_rows(category, &rows);
            for skipped in set.skipped() {
                warn!(row = skipped.index, reason = %skipped.reason, "skipping malformed row");
            }
            self.install(set, epoch, ticket)
        }
        .instrument(span)
        .await
    }

    fn install(&self, set: RecordSet, epoch: u64, ticket: u64) -> LoadOutcome {
        let category = set.category();
        let mut guard = self.context.lock();
        if guard.epoch != epoch {
            debug!(epoch, current = guard.epoch, "discarding fetch from before teardown");
            return LoadOutcome::Stale;
        }
        if guard.latest_ticket(category) != ticket {
            debug!(ticket, latest = guard.latest_ticket(category), "discarding superseded fetch");
            return LoadOutcome::Superseded;
        }

        let state = &mut *guard;
        let surface = Arc::clone(self.context.surface());
        let (records, skipped) = set.into_parts();
        let registry = &mut state.registries[category.index()];
        let previous = registry.replace(records, surface.as_ref());
        let dropped = previous.iter().filter(|id| !registry.contains(id)).count();
        let pruned_overrides = state
            .store
            .retain_overrides(category, |id| registry.contains(id));
        let records = registry.len();
        let carried_overrides = state.store.hidden(category).len();

        let stats = apply(surface.as_ref(), state, category);
        state.loaded_at[category.index()] = Some(Utc::now());
        self.context.publish(state, category);

        let summary = LoadSummary {
            records,
            skipped: skipped.len(),
            carried_overrides,
            pruned_overrides,
            dropped,
            attached: stats.attached,
        };
        info!(
            records = summary.records,
            skipped = summary.skipped,
            carried = summary.carried_overrides,
            pruned = summary.pruned_overrides,
            "category loaded"
        );
        LoadOutcome::Applied(summary)
    }
}
