//! Tests for the engine module.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::sync::Semaphore;

use super::*;
use crate::{
    error::PipelineError,
    models::{Phase, Session, SessionStatus, Stage, StepStatus},
    params::{DeleteSession, ExportSession, Id, ListSessions, StartSession},
    stages::{StageAnalyzer, StageRequest, StageSet},
};

const POLL: Duration = Duration::from_millis(5);

/// Holds every stage until the test hands out a permit.
struct Gate {
    permits: Arc<Semaphore>,
}

#[async_trait]
impl StageAnalyzer for Gate {
    async fn analyze(&self, _request: StageRequest<'_>) -> anyhow::Result<Value> {
        self.permits.acquire().await?.forget();
        Ok(json!({ "gated": true }))
    }
}

async fn create_test_engine(stages: StageSet) -> (TempDir, Engine) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let engine = EngineBuilder::new()
        .with_database_path(Some(&db_path))
        .with_analyzers(stages)
        .build()
        .await
        .expect("Failed to create engine");
    (temp_dir, engine)
}

async fn create_gated_engine() -> (TempDir, Engine, Arc<Semaphore>) {
    let permits = Arc::new(Semaphore::new(0));
    let stages = StageSet::uniform(Arc::new(Gate {
        permits: Arc::clone(&permits),
    }));
    let (temp_dir, engine) = create_test_engine(stages).await;
    (temp_dir, engine, permits)
}

fn start(idea: &str) -> StartSession {
    StartSession {
        idea: idea.to_string(),
        lucky: false,
    }
}

async fn poll_until(engine: &Engine, id: &str, done: impl Fn(&Session) -> bool) -> Session {
    for _ in 0..1000 {
        let session = engine.session(&Id::from(id)).await.expect("session exists");
        if done(&session) {
            return session;
        }
        tokio::time::sleep(POLL).await;
    }
    panic!("session {id} never reached the expected state");
}

async fn run_to_end(engine: &Engine, id: &str) -> Session {
    engine
        .wait_for_session(&Id::from(id), POLL, |_| {})
        .await
        .expect("Failed to wait for session")
}

#[tokio::test]
async fn test_start_session_runs_to_completion() {
    let (_temp_dir, engine) = create_test_engine(StageSet::default()).await;

    let session = engine
        .start_session(&start("  vegan snack subscription  "))
        .await
        .expect("Failed to start session");
    assert_eq!(session.input, "vegan snack subscription");
    assert_eq!(session.status, SessionStatus::Active);
    assert!(session.id.starts_with("session_"));

    let finished = run_to_end(&engine, &session.id).await;
    assert_eq!(finished.status, SessionStatus::Completed);
    assert_eq!(finished.progress, 100);
    assert_eq!(finished.results.len(), 4);
    assert!(finished.metadata.end_time.is_some());
    assert!(!engine.is_running(&Id::from(session.id.as_str())));
}

#[tokio::test]
async fn test_start_session_rejects_bad_idea() {
    let (_temp_dir, engine) = create_test_engine(StageSet::default()).await;

    let err = engine.start_session(&start("   ")).await.unwrap_err();
    assert!(matches!(err, PipelineError::InvalidInput { .. }));

    let page = engine.list_sessions(&ListSessions::default()).await.unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn test_cancel_rules() {
    let (_temp_dir, engine) = create_test_engine(StageSet::default()).await;

    let err = engine
        .cancel_session(&Id::from("session_missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::SessionNotFound { .. }));

    let session = engine.start_session(&start("x")).await.unwrap();
    run_to_end(&engine, &session.id).await;

    let err = engine
        .cancel_session(&Id::from(session.id.as_str()))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidState { .. }));
    assert!(err.to_string().contains("already completed"));
}

#[tokio::test]
async fn test_cancel_in_flight_stage() {
    let (_temp_dir, engine, permits) = create_gated_engine().await;
    let session = engine.start_session(&start("x")).await.unwrap();
    let id = Id::from(session.id.as_str());

    poll_until(&engine, &session.id, |s| {
        s.step(Phase::MarketResearch)
            .is_some_and(|step| step.status == StepStatus::InProgress)
    })
    .await;

    let cancelled = engine.cancel_session(&id).await.unwrap();
    assert_eq!(cancelled.status, SessionStatus::Cancelled);

    permits.add_permits(4);
    let finished = run_to_end(&engine, &session.id).await;
    assert_eq!(finished.status, SessionStatus::Cancelled);
    assert_eq!(finished.metadata.end_time, cancelled.metadata.end_time);
    assert!(finished.results.contains_key(&Stage::MarketResearch));
    assert_eq!(
        finished.step(Phase::CompetitiveAnalysis).unwrap().status,
        StepStatus::Pending
    );
    assert!(
        !finished
            .steps
            .iter()
            .any(|step| step.status == StepStatus::InProgress)
    );
}

#[tokio::test]
async fn test_export_requires_completed_session() {
    let (_temp_dir, engine, permits) = create_gated_engine().await;
    let session = engine.start_session(&start("x")).await.unwrap();

    let params = ExportSession {
        id: session.id.clone(),
        format: "md".to_string(),
    };
    let err = engine.export_session(&params).await.unwrap_err();
    assert!(matches!(err, PipelineError::InvalidState { .. }));

    let err = engine
        .export_session(&ExportSession {
            id: "session_missing".to_string(),
            format: "pdf".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::UnsupportedFormat(_)));

    permits.add_permits(4);
    run_to_end(&engine, &session.id).await;

    let first = engine.export_session(&params).await.unwrap();
    let second = engine.export_session(&params).await.unwrap();
    assert_eq!(first.content_type, "text/markdown");
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_delete_session() {
    let (_temp_dir, engine, permits) = create_gated_engine().await;
    let session = engine.start_session(&start("x")).await.unwrap();

    let unconfirmed = DeleteSession {
        id: session.id.clone(),
        confirmed: false,
    };
    assert!(matches!(
        engine.delete_session(&unconfirmed).await,
        Err(PipelineError::InvalidInput { .. })
    ));

    let confirmed = DeleteSession {
        id: session.id.clone(),
        confirmed: true,
    };
    poll_until(&engine, &session.id, |s| s.current_step == Phase::MarketResearch).await;
    assert!(matches!(
        engine.delete_session(&confirmed).await,
        Err(PipelineError::InvalidState { .. })
    ));

    permits.add_permits(4);
    run_to_end(&engine, &session.id).await;

    let deleted = engine.delete_session(&confirmed).await.unwrap();
    assert_eq!(deleted.map(|s| s.id), Some(session.id.clone()));
    assert!(engine.delete_session(&confirmed).await.unwrap().is_none());
    assert!(
        engine
            .get_session(&Id::from(session.id.as_str()))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_list_and_stats() {
    let (_temp_dir, engine) = create_test_engine(StageSet::default()).await;

    let first = engine.start_session(&start("first")).await.unwrap();
    let second = engine.start_session(&start("second")).await.unwrap();
    run_to_end(&engine, &first.id).await;
    run_to_end(&engine, &second.id).await;

    let page = engine.list_sessions(&ListSessions::default()).await.unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.sessions[0].id, second.id);
    assert!(!page.has_more);

    let page = engine
        .list_sessions(&ListSessions {
            status: Some("failed".to_string()),
            ..ListSessions::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 0);

    let stats = engine.stats().await.unwrap();
    assert_eq!(stats.total_sessions, 2);
    assert_eq!(stats.recent_sessions, 2);
    let completed = stats
        .status_breakdown
        .iter()
        .find(|row| row.status == SessionStatus::Completed)
        .expect("completed row");
    assert_eq!(completed.count, 2);
    assert!(completed.avg_duration_ms.is_some());
}

#[tokio::test]
async fn test_active_sessions_tracks_runs() {
    let (_temp_dir, engine, permits) = create_gated_engine().await;
    let session = engine.start_session(&start("x")).await.unwrap();

    poll_until(&engine, &session.id, |s| s.current_step == Phase::MarketResearch).await;
    assert!(engine.active_sessions().contains(&session.id));

    permits.add_permits(4);
    run_to_end(&engine, &session.id).await;
    assert!(engine.active_sessions().is_empty());
    assert_eq!(engine.pending_writes(), 0);
}
