#![allow(dead_code)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use pathfinder_core::{
    Engine, EngineBuilder, Id, Session, Stage, StageAnalyzer, StageRequest, StageSet,
};
use serde_json::{Value, json};
use tempfile::TempDir;

pub const POLL: Duration = Duration::from_millis(5);

/// Helper function to create a test engine
pub async fn create_test_engine(stages: StageSet) -> (TempDir, Engine) {
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

/// Waits until the session is terminal and its run has stopped.
pub async fn wait_until_settled(engine: &Engine, id: &str) -> Session {
    tokio::time::timeout(
        Duration::from_secs(10),
        engine.wait_for_session(&Id::from(id), POLL, |_| {}),
    )
    .await
    .expect("session did not settle in time")
    .expect("Failed to poll session")
}

/// Answers with a fixed result or a fixed error.
pub struct Fixed(pub Result<Value, String>);

impl Fixed {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self(Ok(json!({ "ok": true }))))
    }

    pub fn err(message: &str) -> Arc<Self> {
        Arc::new(Self(Err(message.to_string())))
    }
}

#[async_trait]
impl StageAnalyzer for Fixed {
    async fn analyze(&self, _request: StageRequest<'_>) -> anyhow::Result<Value> {
        self.0.clone().map_err(anyhow::Error::msg)
    }
}

/// Records which prior results each call saw.
#[derive(Default)]
pub struct Recorder {
    pub seen: Mutex<Vec<Vec<Stage>>>,
}

#[async_trait]
impl StageAnalyzer for Recorder {
    async fn analyze(&self, request: StageRequest<'_>) -> anyhow::Result<Value> {
        let prior: Vec<Stage> = request.prior.keys().copied().collect();
        let count = prior.len();
        self.seen.lock().expect("recorder lock").push(prior);
        Ok(json!({ "call": count }))
    }
}
