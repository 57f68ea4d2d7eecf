//! Drives one session through its stages.
//!
//! A run is fire-and-forget: the caller spawns it and walks away. Every
//! change the run makes is a mutation applied through
//! [`SessionStore::update`], so it always lands on the freshest stored
//! record and never overwrites a concurrent cancellation. Cancellation is
//! honored at stage boundaries only; a stage already in flight finishes and
//! its outcome is recorded, but the session stays cancelled.

use std::sync::Arc;

use jiff::Timestamp;
use log::{debug, error, info, warn};
use tokio::task::JoinHandle;

use crate::{
    error::{PipelineError, Result},
    models::{Phase, Session, SessionStatus, StageResults},
    registry::Registry,
    stages::{StagePlan, StageRequest, StageSet},
    store::SessionStore,
};

/// Runs sessions against a fixed table of stages.
#[derive(Clone)]
pub struct Orchestrator {
    store: SessionStore,
    registry: Registry,
    stages: StageSet,
}

/// How a run ended, as far as the orchestrator is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Another run already owns the session
    AlreadyRunning,
    /// No such session in the store
    Missing,
    /// The run stopped with the session in this status
    Finished(SessionStatus),
}

impl Orchestrator {
    pub fn new(store: SessionStore, registry: Registry, stages: StageSet) -> Self {
        Self {
            store,
            registry,
            stages,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Starts a detached run for a session.
    pub fn spawn(&self, session_id: &str) -> JoinHandle<RunOutcome> {
        let orchestrator = self.clone();
        let session_id = session_id.to_string();
        tokio::spawn(async move { orchestrator.run(&session_id).await })
    }

    /// Runs a session to a terminal status, or until it is found cancelled.
    ///
    /// Never fails: problems are logged and reflected in the stored session
    /// where possible. A store error mid-run fails the session.
    pub async fn run(&self, session_id: &str) -> RunOutcome {
        let Some(_run) = self.registry.acquire(session_id) else {
            warn!("Session {session_id} is already being orchestrated");
            return RunOutcome::AlreadyRunning;
        };

        match self.drive(session_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Orchestration of session {session_id} aborted: {e}");
                self.abort(session_id, &e).await
            }
        }
    }

    /// Best-effort close-out after a run failed outside any analyzer.
    async fn abort(&self, session_id: &str, cause: &PipelineError) -> RunOutcome {
        let mut reason = format!("Orchestration aborted: {cause}");
        let mut source = std::error::Error::source(cause);
        while let Some(e) = source {
            reason.push_str(&format!(": {e}"));
            source = e.source();
        }
        match self
            .store
            .update(session_id, move |s| s.abort(&reason, Timestamp::now()).map(drop))
            .await
        {
            Ok(session) => {
                info!("Session {session_id} closed out as {}", session.status.as_str());
                RunOutcome::Finished(session.status)
            }
            Err(PipelineError::SessionNotFound { .. }) => RunOutcome::Missing,
            Err(e) => {
                error!("Could not close out session {session_id}: {e}");
                match self.store.get(session_id).await {
                    Ok(Some(session)) => RunOutcome::Finished(session.status),
                    _ => RunOutcome::Missing,
                }
            }
        }
    }

    async fn drive(&self, session_id: &str) -> Result<RunOutcome> {
        let Some(session) = self.store.get(session_id).await? else {
            warn!("Session {session_id} not found; nothing to run");
            return Ok(RunOutcome::Missing);
        };
        info!("Starting automation for session {session_id}: {}", session.input);

        self.store
            .update(session_id, |s| {
                if s.status != SessionStatus::Active {
                    return Ok(());
                }
                s.begin_step(Phase::Initialization, Timestamp::now())?;
                s.complete_step(Phase::Initialization, None, Timestamp::now())
            })
            .await?;

        for plan in self.stages.iter() {
            let Some(session) = self.begin_stage(session_id, plan).await? else {
                let status = self.store.fetch(session_id).await?.status;
                info!(
                    "Session {session_id} is {}; stopping before {}",
                    status.as_str(),
                    plan.stage.as_str()
                );
                return Ok(RunOutcome::Finished(status));
            };

            match self.analyze(plan, &session).await {
                Ok(data) => {
                    let (stage, checkpoint) = (plan.stage, plan.checkpoint);
                    let session = self
                        .store
                        .update(session_id, move |s| {
                            s.complete_stage(stage, data, checkpoint, Timestamp::now())
                        })
                        .await?;
                    info!(
                        "Session {session_id}: {} completed ({}%)",
                        plan.stage.as_str(),
                        session.progress
                    );
                }
                Err(message) => {
                    error!(
                        "Session {session_id}: {} failed: {message}",
                        plan.stage.as_str()
                    );
                    let session = self.record_failure(session_id, plan, message).await?;
                    return Ok(RunOutcome::Finished(session.status));
                }
            }
        }

        let session = self
            .store
            .update(session_id, |s| {
                if s.status != SessionStatus::Active {
                    return Ok(());
                }
                s.complete(Timestamp::now())
            })
            .await?;

        match session.status {
            SessionStatus::Completed => info!("Automation completed for session {session_id}"),
            status => info!(
                "Session {session_id} finished its stages while {}",
                status.as_str()
            ),
        }
        Ok(RunOutcome::Finished(session.status))
    }

    /// Marks a stage `in_progress` unless the session has left `active`.
    /// Returns the session as stored after the transition.
    async fn begin_stage(&self, session_id: &str, plan: &StagePlan) -> Result<Option<Session>> {
        if self.store.fetch(session_id).await?.status != SessionStatus::Active {
            return Ok(None);
        }

        let phase = plan.stage.phase();
        match self
            .store
            .update(session_id, move |s| s.begin_step(phase, Timestamp::now()))
            .await
        {
            Ok(session) => {
                debug!("Session {session_id}: {} started", plan.stage.as_str());
                Ok(Some(session))
            }
            // Lost a race with a cancellation between the check and the write
            Err(e @ PipelineError::Conflict { .. }) => {
                if self.store.fetch(session_id).await?.status.is_terminal() {
                    Ok(None)
                } else {
                    Err(e)
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Invokes the stage's analyzer on its own task so a panicking analyzer
    /// fails the stage instead of the run.
    async fn analyze(
        &self,
        plan: &StagePlan,
        session: &Session,
    ) -> std::result::Result<serde_json::Value, String> {
        let analyzer = Arc::clone(&plan.analyzer);
        let input = session.input.clone();
        let prior: StageResults = session.results.clone();
        let lucky = session.lucky;

        let joined = tokio::spawn(async move {
            analyzer
                .analyze(StageRequest {
                    input: &input,
                    prior: &prior,
                    lucky,
                })
                .await
        })
        .await;

        match joined {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(format!("{e:#}")),
            Err(e) => Err(format!("{} analyzer crashed: {e}", plan.stage.title())),
        }
    }

    async fn record_failure(
        &self,
        session_id: &str,
        plan: &StagePlan,
        message: String,
    ) -> Result<Session> {
        let phase = plan.stage.phase();
        self.store
            .update(session_id, move |s| {
                let now = Timestamp::now();
                s.fail_step(phase, message, now)?;
                if s.status == SessionStatus::Active {
                    s.fail(now)
                } else {
                    s.metadata.error_count += 1;
                    Ok(())
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    use super::*;
    use crate::{
        models::{Stage, StepStatus},
        stages::StageAnalyzer,
    };

    struct Fixed(std::result::Result<Value, String>);

    #[async_trait]
    impl StageAnalyzer for Fixed {
        async fn analyze(&self, _request: StageRequest<'_>) -> anyhow::Result<Value> {
            self.0.clone().map_err(anyhow::Error::msg)
        }
    }

    struct Panics;

    #[async_trait]
    impl StageAnalyzer for Panics {
        async fn analyze(&self, _request: StageRequest<'_>) -> anyhow::Result<Value> {
            panic!("analyzer exploded")
        }
    }

    /// Cancels the session it is analyzing, then succeeds.
    struct CancelsMidFlight {
        store: SessionStore,
        session_id: String,
    }

    #[async_trait]
    impl StageAnalyzer for CancelsMidFlight {
        async fn analyze(&self, _request: StageRequest<'_>) -> anyhow::Result<Value> {
            self.store
                .update(&self.session_id, |s| s.cancel(Timestamp::now()))
                .await?;
            Ok(json!({ "finished": "after cancel" }))
        }
    }

    fn ok_stages() -> StageSet {
        StageSet::uniform(Arc::new(Fixed(Ok(json!({ "ok": true })))))
    }

    fn setup(stages: StageSet) -> (TempDir, SessionStore, Orchestrator) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = SessionStore::new(temp_dir.path().join("orchestrator.db"));
        let orchestrator = Orchestrator::new(store.clone(), Registry::new(), stages);
        (temp_dir, store, orchestrator)
    }

    #[tokio::test]
    async fn test_successful_run_completes_session() {
        let (_temp_dir, store, orchestrator) = setup(ok_stages());
        let session = store.create("vegan snack subscription", false).await.unwrap();

        let outcome = orchestrator.run(&session.id).await;
        assert_eq!(outcome, RunOutcome::Finished(SessionStatus::Completed));

        let stored = store.fetch(&session.id).await.unwrap();
        assert_eq!(stored.status, SessionStatus::Completed);
        assert_eq!(stored.progress, 100);
        assert_eq!(stored.current_step, Phase::Completed);
        assert_eq!(
            stored.results.keys().copied().collect::<Vec<_>>(),
            Stage::ALL.to_vec()
        );
        assert!(stored.metadata.end_time.is_some());
        assert!(stored.metadata.duration_ms.is_some());
        assert!(stored.steps.iter().all(|s| s.status == StepStatus::Completed));
        assert!(!orchestrator.registry().is_active(&session.id));
    }

    #[tokio::test]
    async fn test_stage_failure_fails_session() {
        let stages = ok_stages().with_analyzer(
            Stage::CompetitiveAnalysis,
            Arc::new(Fixed(Err("rate limited".to_string()))),
        );
        let (_temp_dir, store, orchestrator) = setup(stages);
        let session = store.create("vegan snack subscription", false).await.unwrap();

        let outcome = orchestrator.run(&session.id).await;
        assert_eq!(outcome, RunOutcome::Finished(SessionStatus::Failed));

        let stored = store.fetch(&session.id).await.unwrap();
        assert_eq!(stored.status, SessionStatus::Failed);
        assert_eq!(stored.progress, 20);
        assert_eq!(stored.metadata.error_count, 1);
        assert_eq!(stored.results.len(), 1);
        assert!(stored.metadata.end_time.is_some());

        let failed = stored.step(Phase::CompetitiveAnalysis).unwrap();
        assert_eq!(failed.status, StepStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("rate limited"));
        for phase in [Phase::TrendingAnalysis, Phase::BusinessPlan] {
            assert_eq!(stored.step(phase).unwrap().status, StepStatus::Pending);
        }
    }

    #[tokio::test]
    async fn test_cancelled_before_run_starts_nothing() {
        let (_temp_dir, store, orchestrator) = setup(ok_stages());
        let session = store.create("vegan snack subscription", false).await.unwrap();
        store
            .update(&session.id, |s| s.cancel(Timestamp::now()))
            .await
            .unwrap();

        let outcome = orchestrator.run(&session.id).await;
        assert_eq!(outcome, RunOutcome::Finished(SessionStatus::Cancelled));

        let stored = store.fetch(&session.id).await.unwrap();
        assert_eq!(stored.status, SessionStatus::Cancelled);
        assert!(stored.results.is_empty());
        assert!(stored.steps.iter().all(|s| s.status == StepStatus::Pending));
    }

    #[tokio::test]
    async fn test_cancel_mid_stage_keeps_outcome_and_stops() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::new(temp_dir.path().join("cancel.db"));
        let session = store.create("vegan snack subscription", false).await.unwrap();

        let stages = ok_stages().with_analyzer(
            Stage::MarketResearch,
            Arc::new(CancelsMidFlight {
                store: store.clone(),
                session_id: session.id.clone(),
            }),
        );
        let orchestrator = Orchestrator::new(store.clone(), Registry::new(), stages);

        let outcome = orchestrator.run(&session.id).await;
        assert_eq!(outcome, RunOutcome::Finished(SessionStatus::Cancelled));

        let stored = store.fetch(&session.id).await.unwrap();
        assert_eq!(stored.status, SessionStatus::Cancelled);
        assert_eq!(
            stored.step(Phase::MarketResearch).unwrap().status,
            StepStatus::Completed
        );
        assert_eq!(stored.results[&Stage::MarketResearch]["finished"], "after cancel");
        assert_eq!(
            stored.step(Phase::CompetitiveAnalysis).unwrap().status,
            StepStatus::Pending
        );
        assert_eq!(stored.progress, 20);
    }

    #[tokio::test]
    async fn test_panicking_analyzer_fails_stage() {
        let stages = ok_stages().with_analyzer(Stage::TrendingAnalysis, Arc::new(Panics));
        let (_temp_dir, store, orchestrator) = setup(stages);
        let session = store.create("x", false).await.unwrap();

        let outcome = orchestrator.run(&session.id).await;
        assert_eq!(outcome, RunOutcome::Finished(SessionStatus::Failed));

        let stored = store.fetch(&session.id).await.unwrap();
        let step = stored.step(Phase::TrendingAnalysis).unwrap();
        assert_eq!(step.status, StepStatus::Failed);
        assert!(step.error.as_deref().unwrap().contains("Trending Analysis"));
        assert!(!orchestrator.registry().is_active(&session.id));
    }

    #[tokio::test]
    async fn test_duplicate_run_is_refused() {
        let (_temp_dir, store, orchestrator) = setup(ok_stages());
        let session = store.create("x", false).await.unwrap();

        let _held = orchestrator.registry().acquire(&session.id).unwrap();
        assert_eq!(orchestrator.run(&session.id).await, RunOutcome::AlreadyRunning);

        let stored = store.fetch(&session.id).await.unwrap();
        assert_eq!(stored.status, SessionStatus::Active);
        assert_eq!(stored.progress, 0);
    }

    #[tokio::test]
    async fn test_missing_session() {
        let (_temp_dir, _store, orchestrator) = setup(ok_stages());
        assert_eq!(orchestrator.run("session_nope").await, RunOutcome::Missing);
        assert!(orchestrator.registry().list_active().is_empty());
    }

    #[tokio::test]
    async fn test_spawned_run_finishes() {
        let (_temp_dir, store, orchestrator) = setup(ok_stages());
        let session = store.create("x", true).await.unwrap();

        let outcome = orchestrator.spawn(&session.id).await.unwrap();
        assert_eq!(outcome, RunOutcome::Finished(SessionStatus::Completed));
    }

    #[tokio::test]
    async fn test_store_error_mid_run_fails_session() {
        let (temp_dir, store, orchestrator) = setup(ok_stages());
        let session = store.create("vegan snack subscription", false).await.unwrap();

        // Completing the second stage is rejected by the database itself
        rusqlite::Connection::open(temp_dir.path().join("orchestrator.db"))
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_completion BEFORE UPDATE ON steps
                 WHEN NEW.name = 'competitive_analysis' AND NEW.status = 'completed'
                 BEGIN SELECT RAISE(ABORT, 'disk I/O error'); END;",
            )
            .unwrap();

        let outcome = orchestrator.run(&session.id).await;
        assert_eq!(outcome, RunOutcome::Finished(SessionStatus::Failed));
        assert!(!orchestrator.registry().is_active(&session.id));

        let stored = store.fetch(&session.id).await.unwrap();
        assert_eq!(stored.status, SessionStatus::Failed);
        assert_eq!(stored.metadata.error_count, 1);
        assert!(stored.metadata.end_time.is_some());
        assert_eq!(stored.progress, 20);
        assert_eq!(stored.results.len(), 1);

        let stuck = stored.step(Phase::CompetitiveAnalysis).unwrap();
        assert_eq!(stuck.status, StepStatus::Failed);
        assert!(
            stuck
                .error
                .as_deref()
                .unwrap()
                .starts_with("Orchestration aborted:")
        );
        assert!(stuck.error.as_deref().unwrap().contains("disk I/O error"));
        assert!(
            stored
                .steps
                .iter()
                .all(|step| step.status != StepStatus::InProgress)
        );
    }

    #[tokio::test]
    async fn test_stage_table_checkpoint_drives_progress() {
        let stages = ok_stages()
            .with_checkpoint(Stage::MarketResearch, 30)
            .with_analyzer(
                Stage::CompetitiveAnalysis,
                Arc::new(Fixed(Err("quota exceeded".to_string()))),
            );
        let (_temp_dir, store, orchestrator) = setup(stages);
        let session = store.create("x", false).await.unwrap();

        orchestrator.run(&session.id).await;

        let stored = store.fetch(&session.id).await.unwrap();
        assert_eq!(stored.status, SessionStatus::Failed);
        assert_eq!(stored.progress, 30);
    }
}
