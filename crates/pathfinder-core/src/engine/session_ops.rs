//! Session operations for the Engine.

use std::{collections::BTreeSet, time::Duration};

use jiff::Timestamp;
use log::info;

use super::Engine;
use crate::{
    error::{PipelineError, Result},
    export::{self, Export},
    models::{Session, SessionPage, SessionStats, SessionStatus},
    params::{DeleteSession, ExportSession, Id, ListSessions, StartSession},
};

impl Engine {
    /// Creates a session for an idea and starts running it in the
    /// background. Returns as soon as the session is stored; poll with
    /// [`Engine::session`] to follow along.
    ///
    /// # Errors
    ///
    /// * `PipelineError::InvalidInput` - When the idea is empty or too long
    pub async fn start_session(&self, params: &StartSession) -> Result<Session> {
        let idea = params.validate()?;
        let session = self.store.create(idea, params.lucky).await?;
        info!("Created session {} for: {idea}", session.id);

        // Detached; the run reports through the store
        drop(self.orchestrator.spawn(&session.id));
        Ok(session)
    }

    /// Current state of a session, if it exists.
    pub async fn get_session(&self, params: &Id) -> Result<Option<Session>> {
        self.store.get(&params.id).await
    }

    /// Current state of a session; a missing session is an error.
    pub async fn session(&self, params: &Id) -> Result<Session> {
        self.store.fetch(&params.id).await
    }

    /// Requests cancellation of an active session.
    ///
    /// The run notices at its next stage boundary; a stage already in flight
    /// finishes first.
    ///
    /// # Errors
    ///
    /// * `PipelineError::SessionNotFound` - When no such session exists
    /// * `PipelineError::InvalidState` - When the session already finished
    pub async fn cancel_session(&self, params: &Id) -> Result<Session> {
        let session = self
            .store
            .update(&params.id, |s| s.cancel(Timestamp::now()))
            .await?;
        info!("Cancelled session {} at {}%", session.id, session.progress);
        Ok(session)
    }

    /// Renders a completed session's results.
    ///
    /// # Errors
    ///
    /// * `PipelineError::UnsupportedFormat` - When the format is unknown
    /// * `PipelineError::SessionNotFound` - When no such session exists
    /// * `PipelineError::InvalidState` - When the session is not completed
    pub async fn export_session(&self, params: &ExportSession) -> Result<Export> {
        let format = params.format()?;
        let session = self.store.fetch(&params.id).await?;
        if session.status != SessionStatus::Completed {
            return Err(PipelineError::invalid_state(
                &session.id,
                format!(
                    "is {}; only completed sessions can be exported",
                    session.status
                ),
            ));
        }
        export::export(&session, format)
    }

    /// Lists sessions, newest first.
    pub async fn list_sessions(&self, params: &ListSessions) -> Result<SessionPage> {
        self.store.list(params.to_filter()?).await
    }

    /// Removes a session record for good. Returns the removed session, or
    /// `None` if there was nothing to remove.
    ///
    /// # Errors
    ///
    /// * `PipelineError::InvalidInput` - When the deletion is not confirmed
    /// * `PipelineError::InvalidState` - When a run for the session is in flight
    pub async fn delete_session(&self, params: &DeleteSession) -> Result<Option<Session>> {
        if !params.confirmed {
            return Err(PipelineError::invalid_input("confirmed")
                .with_reason("deleting a session cannot be undone and must be confirmed"));
        }
        if self.registry.is_active(&params.id) {
            return Err(PipelineError::invalid_state(
                &params.id,
                "has a run in flight; cancel it and wait for it to stop first",
            ));
        }

        match self.store.delete(&params.id).await {
            Ok(session) => {
                info!("Deleted session {}", session.id);
                Ok(Some(session))
            }
            Err(PipelineError::SessionNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Aggregate numbers over all stored sessions.
    pub async fn stats(&self) -> Result<SessionStats> {
        self.store.stats().await
    }

    /// IDs of the sessions with a run in flight in this process.
    pub fn active_sessions(&self) -> BTreeSet<String> {
        self.registry.list_active()
    }

    /// Whether a run for the session is in flight in this process.
    pub fn is_running(&self, params: &Id) -> bool {
        self.registry.is_active(&params.id)
    }

    /// Polls until the session is terminal and its run (if any) has stopped,
    /// calling `on_change` whenever the observed progress or step moves.
    pub async fn wait_for_session<F>(
        &self,
        params: &Id,
        interval: Duration,
        mut on_change: F,
    ) -> Result<Session>
    where
        F: FnMut(&Session),
    {
        let mut last = None;
        loop {
            let session = self.session(params).await?;
            let seen = (session.status, session.current_step, session.progress);
            if last != Some(seen) {
                on_change(&session);
                last = Some(seen);
            }
            if session.status.is_terminal() && !self.is_running(params) {
                // Re-read so outcomes recorded after the status flip are seen
                return self.session(params).await;
            }
            tokio::time::sleep(interval).await;
        }
    }
}
