//! Coordinator - the main agent
//!
//! One turn:
//!
//! ```text
//! query ─▶ lock session ─▶ read view ─▶ classify ─▶ stages ─▶ specialists
//!                                                              │
//!          response ◀── commit turn ◀── merge ◀────────────────┘
//! ```
//!
//! Turns on the same session are serialized by a per-key async mutex held
//! for the whole turn. The turn body races a [`CancellationToken`]; the
//! session is only written when the turn was not cancelled.

mod classify;
mod context;
mod dispatch;
mod types;


pub use types::{
    CoordinatorConfig, CoordinatorError, LabelScore, MergeStrategy, NewMessage, RoutingDecision,
    TurnResponse,
};

use crate::agents::{AgentKind, AgentRequest, AgentSpec, AgentState, SpecialistAgent, StructuredResult};
use crate::memory::{
    SessionKey, SessionStore, SessionView, Turn, TurnCommit, SCRATCH_LAST_AGENTS,
    SCRATCH_LAST_HARDINESS_ZONE, SCRATCH_LAST_LOCATION, SCRATCH_LAST_PLANT,
};
use classify::ClassifyContext;
use dashmap::DashMap;
use futures::future::join_all;
use plantworks_llm::LlmProvider;
use plantworks_tools::ToolRegistry;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Routes queries to specialists and records turns
pub struct Coordinator {
    config: CoordinatorConfig,
    agents: HashMap<AgentKind, SpecialistAgent>,
    store: Arc<dyn SessionStore>,
    session_locks: DashMap<SessionKey, Arc<Mutex<()>>>,
}

/// Work done for a turn, waiting to be committed
struct PreparedTurn {
    _guard: OwnedMutexGuard<()>,
    response: TurnResponse,
    commit: TurnCommit,
}

impl Coordinator {
    /// Create a coordinator with all four specialists
    pub fn new(
        config: CoordinatorConfig,
        registry: Arc<ToolRegistry>,
        llm: Arc<dyn LlmProvider>,
        store: Arc<dyn SessionStore>,
    ) -> crate::Result<Self> {
        config.validate()?;

        let llm_timeout = Duration::from_millis(config.llm_timeout_ms);
        let agents = AgentKind::ALL
            .into_iter()
            .map(|kind| {
                let agent = SpecialistAgent::new(
                    AgentSpec::for_kind(kind),
                    registry.clone(),
                    llm.clone(),
                    config.model.clone(),
                    llm_timeout,
                );
                (kind, agent)
            })
            .collect();

        info!(
            name = %config.name,
            model = %config.model,
            threshold = config.routing_threshold,
            "Coordinator initialized"
        );

        Ok(Self {
            config,
            agents,
            store,
            session_locks: DashMap::new(),
        })
    }

    /// Coordinator name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Configuration
    #[must_use]
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Session store
    #[must_use]
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Create a session; idempotent
    pub async fn create_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<(), CoordinatorError> {
        let key = SessionKey::new(app_name, user_id, session_id);
        self.store.create(&key).await?;
        debug!(session = %key, "Session ready");
        Ok(())
    }

    /// Run one turn
    pub async fn run(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
        message: NewMessage,
    ) -> Result<TurnResponse, CoordinatorError> {
        self.run_with_cancellation(app_name, user_id, session_id, message, CancellationToken::new())
            .await
    }

    /// Run one turn, abandoning it when `cancel` fires
    ///
    /// A cancelled turn leaves the session untouched.
    #[instrument(skip(self, message, cancel), fields(app = %app_name, user = %user_id, session = %session_id))]
    pub async fn run_with_cancellation(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
        message: NewMessage,
        cancel: CancellationToken,
    ) -> Result<TurnResponse, CoordinatorError> {
        let text = message.text();
        if text.is_empty() {
            return Err(CoordinatorError::EmptyOrUnroutable);
        }

        let key = SessionKey::new(app_name, user_id, session_id);
        let outcome = self.turn(&key, message, &text, cancel).await;
        self.release_session_lock(&key);
        outcome
    }

    async fn turn(
        &self,
        key: &SessionKey,
        message: NewMessage,
        text: &str,
        cancel: CancellationToken,
    ) -> Result<TurnResponse, CoordinatorError> {
        let lock = self.session_lock(key);

        let prepared = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(session = %key, "Turn cancelled");
                return Err(CoordinatorError::Cancelled);
            }
            prepared = self.prepare(lock, key, message, text) => prepared?,
        };

        if cancel.is_cancelled() {
            warn!(session = %key, "Turn cancelled before commit");
            return Err(CoordinatorError::Cancelled);
        }

        let turns = self.store.commit(key, prepared.commit).await?;
        info!(
            session = %key,
            turns,
            strategy = %prepared.response.routing.strategy,
            "Turn committed"
        );
        Ok(prepared.response)
    }

    /// Routing decision for `text` against a session view
    #[must_use]
    pub fn route(&self, text: &str, view: &SessionView) -> RoutingDecision {
        let classify_context = ClassifyContext {
            has_location: context::extract_location(text).is_some(),
            follow_up: context::is_follow_up(text, view),
            previous: view
                .last_agents()
                .iter()
                .filter_map(|label| AgentKind::from_label(label))
                .collect(),
        };
        let scores = classify::score(text, &classify_context);
        let (selected, defaulted) = classify::select(&scores, self.config.routing_threshold);
        let agents: Vec<AgentKind> = dispatch::stages(&selected).into_iter().flatten().collect();

        RoutingDecision {
            strategy: dispatch::strategy(&agents),
            agents,
            scores,
            defaulted,
        }
    }

    fn session_lock(&self, key: &SessionKey) -> Arc<Mutex<()>> {
        self.session_locks.entry(key.clone()).or_default().clone()
    }

    /// Drop the session's lock once no other turn holds or awaits it
    fn release_session_lock(&self, key: &SessionKey) {
        self.session_locks
            .remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
    }

    async fn prepare(
        &self,
        lock: Arc<Mutex<()>>,
        key: &SessionKey,
        message: NewMessage,
        text: &str,
    ) -> Result<PreparedTurn, CoordinatorError> {
        let guard = lock.lock_owned().await;
        let session = self.store.create(key).await?;
        let view = session.view(self.config.history_window);

        let routing = self.route(text, &view);
        let location = context::location_for(text, &view);
        let plant = context::resolve_plant(text, &view);

        info!(
            session = %key,
            agents = ?routing.agents,
            strategy = %routing.strategy,
            defaulted = routing.defaulted,
            location = ?location,
            plant = ?plant,
            "Routing decision"
        );

        let mut base = AgentRequest::new(text);
        base.location = location.clone();
        base.plant_name = plant.clone();

        let results = self.dispatch(&routing.agents, &base, &view).await;

        let resolved_plant = results
            .iter()
            .filter(|r| r.state == AgentState::Done)
            .find_map(|r| r.payload.plant_name().map(str::to_string))
            .or(plant);
        let locale = results
            .iter()
            .find(|r| r.agent == AgentKind::Locale && r.state == AgentState::Done);
        let resolved_location = locale
            .and_then(|r| r.payload.location().map(str::to_string))
            .or(location);
        let hardiness_zone = locale.and_then(|r| r.payload.hardiness_zone().map(str::to_string));

        let summary = summarize(&results);
        let labels: Vec<&str> = routing.agents.iter().map(AgentKind::as_str).collect();

        let mut commit = TurnCommit::default()
            .with_turn(Turn::user(text, message.parts))
            .with_turn(Turn::assistant(&summary))
            .with_scratch(SCRATCH_LAST_AGENTS, json!(labels));
        if let Some(location) = &resolved_location {
            commit = commit.with_scratch(SCRATCH_LAST_LOCATION, json!(location));
        }
        if let Some(plant) = &resolved_plant {
            commit = commit.with_scratch(SCRATCH_LAST_PLANT, json!(plant));
        }
        if let Some(zone) = hardiness_zone {
            commit = commit.with_scratch(SCRATCH_LAST_HARDINESS_ZONE, json!(zone));
        }

        Ok(PreparedTurn {
            _guard: guard,
            response: TurnResponse {
                session: key.clone(),
                routing,
                results,
                resolved_location,
                resolved_plant,
                summary,
            },
            commit,
        })
    }

    /// Run agents stage by stage; agents in a stage run concurrently
    async fn dispatch(
        &self,
        agents: &[AgentKind],
        base: &AgentRequest,
        view: &SessionView,
    ) -> Vec<StructuredResult> {
        let mut results: Vec<StructuredResult> = Vec::with_capacity(agents.len());

        for stage in dispatch::stages(agents) {
            debug!(stage = ?stage, "Dispatching stage");
            let runs = stage.iter().filter_map(|kind| {
                let agent = self.agents.get(kind)?;
                let upstream: Vec<StructuredResult> = results
                    .iter()
                    .filter(|r| {
                        dispatch::AGENT_DEPENDENCIES
                            .iter()
                            .any(|(up, down)| *up == r.agent && down == kind)
                    })
                    .cloned()
                    .collect();
                let request = base.clone().with_upstream(upstream);
                Some(async move { agent.handle(&request, view).await })
            });
            let stage_results = join_all(runs).await;
            results.extend(stage_results);
        }
        results
    }
}

/// Assistant turn text: one line per agent
fn summarize(results: &[StructuredResult]) -> String {
    results
        .iter()
        .map(|r| match r.state {
            AgentState::Done => format!("{}: {}", r.agent.display_name(), r.payload.headline()),
            _ => format!("{}: unavailable ({})", r.agent.display_name(), r.explanation),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
