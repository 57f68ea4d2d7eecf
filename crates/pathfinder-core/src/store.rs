//! Session store: the durable record of each workflow run.
//!
//! Reads go straight to the database and may be slightly stale; every write
//! is funneled through the [`PersistenceQueue`], so staleness is bounded by
//! how long the queue takes to drain.

use std::path::{Path, PathBuf};

use jiff::Timestamp;
use tokio::task;
use uuid::Uuid;

use crate::{
    db::Database,
    error::{PipelineError, Result},
    models::{Session, SessionFilter, SessionPage, SessionStats},
    queue::PersistenceQueue,
};

/// Handle to the session records; cheap to clone.
#[derive(Clone)]
pub struct SessionStore {
    db_path: PathBuf,
    queue: PersistenceQueue,
}

impl SessionStore {
    /// Opens the store over `db_path`, starting its persistence queue.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(db_path: PathBuf) -> Self {
        let queue = PersistenceQueue::new(db_path.clone());
        Self { db_path, queue }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// The queue all writes go through.
    pub fn queue(&self) -> &PersistenceQueue {
        &self.queue
    }

    /// Generates a fresh, unique session identifier.
    pub fn new_session_id() -> String {
        format!("session_{}", Uuid::new_v4().simple())
    }

    /// Creates and stores a new `active` session with every step `pending`.
    pub async fn create(&self, input: &str, lucky: bool) -> Result<Session> {
        let session = Session::new(Self::new_session_id(), input, lucky, Timestamp::now());
        let id = session.id.clone();

        self.queue
            .enqueue(&id, move |db| {
                db.insert_session(&session)?;
                Ok(session)
            })
            .await
    }

    /// Reads the current record for a session, if any.
    pub async fn get(&self, session_id: &str) -> Result<Option<Session>> {
        let db_path = self.db_path.clone();
        let session_id = session_id.to_string();

        task::spawn_blocking(move || {
            let db = Database::new(&db_path)?;
            db.get_session(&session_id)
        })
        .await
        .map_err(PipelineError::join)?
    }

    /// Like [`SessionStore::get`], but a missing record is an error.
    pub async fn fetch(&self, session_id: &str) -> Result<Session> {
        self.get(session_id)
            .await?
            .ok_or_else(|| PipelineError::SessionNotFound {
                id: session_id.to_string(),
            })
    }

    /// Writes a whole session record as given.
    pub async fn persist(&self, mut session: Session) -> Result<Session> {
        let id = session.id.clone();

        self.queue
            .enqueue(&id, move |db| {
                db.save_session(&mut session)?;
                Ok(session)
            })
            .await
    }

    /// Applies `mutate` to the freshest stored copy of a session and writes
    /// the result. Concurrent updates never lose each other's changes.
    pub async fn update<F>(&self, session_id: &str, mutate: F) -> Result<Session>
    where
        F: FnOnce(&mut Session) -> Result<()> + Send + 'static,
    {
        let id = session_id.to_string();

        self.queue
            .enqueue(session_id, move |db| db.update_session(&id, mutate))
            .await
    }

    /// Removes a session record; returns the record as it was.
    pub async fn delete(&self, session_id: &str) -> Result<Session> {
        let id = session_id.to_string();

        self.queue
            .enqueue(session_id, move |db| {
                let session = db
                    .get_session(&id)?
                    .ok_or_else(|| PipelineError::SessionNotFound { id: id.clone() })?;
                db.delete_session(&id)?;
                Ok(session)
            })
            .await
    }

    /// Lists session summaries matching a filter.
    pub async fn list(&self, filter: SessionFilter) -> Result<SessionPage> {
        let db_path = self.db_path.clone();

        task::spawn_blocking(move || {
            let db = Database::new(&db_path)?;
            db.list_sessions(&filter)
        })
        .await
        .map_err(PipelineError::join)?
    }

    /// Aggregate statistics over every stored session.
    pub async fn stats(&self) -> Result<SessionStats> {
        let db_path = self.db_path.clone();

        task::spawn_blocking(move || {
            let db = Database::new(&db_path)?;
            db.session_stats(Timestamp::now())
        })
        .await
        .map_err(PipelineError::join)?
    }
}
