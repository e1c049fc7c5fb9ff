//! Session-driven orchestration of load passes and teardown.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::context::{MapContext, TeardownSummary};
use crate::error::LifecycleError;
use crate::source::DataSource;
use crate::surface::RenderSurface;
use crate::sync::{LoadReport, SyncPipeline};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// No session. Nothing loaded, every master off after a teardown.
    Unauthenticated,
    /// A load pass is in flight.
    Loading,
    /// The latest load pass settled.
    Populated,
    /// Signed in, but layers were cleared by hand.
    Cleared,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Loading => "loading",
            Self::Populated => "populated",
            Self::Cleared => "cleared",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The signed-in user, as reported by the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub user_id: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Acquired(UserSession),
    Lost,
}

#[derive(Debug)]
struct Phase {
    state: LifecycleState,
    session: Option<UserSession>,
    /// Bumped by every teardown so passes from before it cannot settle
    /// the current one.
    generation: u64,
    in_flight: usize,
}

/// Reacts to session changes by loading or clearing every category.
pub struct LifecycleController<S: RenderSurface, D: DataSource> {
    pipeline: SyncPipeline<S, D>,
    phase: Mutex<Phase>,
}

impl<S: RenderSurface, D: DataSource> LifecycleController<S, D> {
    pub fn new(pipeline: SyncPipeline<S, D>) -> Self {
        Self {
            pipeline,
            phase: Mutex::new(Phase {
                state: LifecycleState::Unauthenticated,
                session: None,
                generation: 0,
                in_flight: 0,
            }),
        }
    }

    /// Lock order is phase, then layer state.
    fn phase(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> LifecycleState {
        self.phase().state
    }

    pub fn session(&self) -> Option<UserSession> {
        self.phase().session.clone()
    }

    pub fn pipeline(&self) -> &SyncPipeline<S, D> {
        &self.pipeline
    }

    pub fn context(&self) -> &Arc<MapContext<S>> {
        self.pipeline.context()
    }

    /// Records the session and runs a full load pass.
    pub async fn session_acquired(&self, session: UserSession) -> LoadReport {
        let (generation, epoch) = self.acquire(session);
        self.run_pass(generation, epoch).await
    }

    /// Records the session and opens a pass in the current epoch. A teardown
    /// after this point fences the pass even if it has not started fetching.
    fn acquire(&self, session: UserSession) -> (u64, u64) {
        info!("session acquired");
        let mut phase = self.phase();
        phase.session = Some(session);
        self.begin_pass(&mut phase)
    }

    async fn run_pass(&self, generation: u64, epoch: u64) -> LoadReport {
        let report = self.pipeline.load_all_in(epoch).await;
        self.finish_pass(generation);
        report
    }

    /// Reloads every category for the current session.
    pub async fn refresh(&self) -> Result<LoadReport, LifecycleError> {
        let (generation, epoch) = {
            let mut phase = self.phase();
            if phase.session.is_none() {
                return Err(LifecycleError::NotAuthenticated);
            }
            self.begin_pass(&mut phase)
        };
        info!("refreshing all categories");
        Ok(self.run_pass(generation, epoch).await)
    }

    /// Forgets the session and tears everything down.
    pub fn session_lost(&self) -> TeardownSummary {
        let mut phase = self.phase();
        phase.session = None;
        phase.state = LifecycleState::Unauthenticated;
        info!("session lost");
        self.teardown_locked(&mut phase)
    }

    /// Tears everything down but keeps the session, so a refresh reloads.
    pub fn clear(&self) -> TeardownSummary {
        let mut phase = self.phase();
        phase.state = if phase.session.is_some() {
            LifecycleState::Cleared
        } else {
            LifecycleState::Unauthenticated
        };
        self.teardown_locked(&mut phase)
    }

    /// Tears down without changing the session. Idempotent.
    pub fn teardown(&self) -> TeardownSummary {
        let mut phase = self.phase();
        self.teardown_locked(&mut phase)
    }

    fn teardown_locked(&self, phase: &mut Phase) -> TeardownSummary {
        phase.generation += 1;
        phase.in_flight = 0;
        self.context().teardown()
    }

    fn begin_pass(&self, phase: &mut Phase) -> (u64, u64) {
        phase.state = LifecycleState::Loading;
        phase.in_flight += 1;
        (phase.generation, self.context().epoch())
    }

    fn finish_pass(&self, generation: u64) {
        let mut phase = self.phase();
        if phase.generation != generation {
            return;
        }
        phase.in_flight = phase.in_flight.saturating_sub(1);
        if phase.in_flight == 0 && phase.state == LifecycleState::Loading {
            phase.state = LifecycleState::Populated;
        }
    }
}

impl<S, D> LifecycleController<S, D>
where
    S: RenderSurface + 'static,
    D: DataSource + 'static,
{
    /// Applies session events until the sender is dropped.
    ///
    /// Load passes run on their own tasks so a `Lost` event is handled while
    /// fetches are still in flight. Returns once every spawned pass settled.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<SessionEvent>) {
        let mut passes = JoinSet::new();
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(SessionEvent::Acquired(session)) => {
                        let (generation, epoch) = self.acquire(session);
                        let controller = Arc::clone(&self);
                        passes.spawn(async move { controller.run_pass(generation, epoch).await });
                    }
                    Some(SessionEvent::Lost) => {
                        self.session_lost();
                    }
                    None => break,
                },
                Some(joined) = passes.join_next(), if !passes.is_empty() => {
                    if let Err(err) = joined {
                        warn!(error = %err, "load pass task failed");
                    }
                }
            }
        }
        while let Some(joined) = passes.join_next().await {
            if let Err(err) = joined {
                warn!(error = %err, "load pass task failed");
            }
        }
    }
}
