//! High-level engine API: start, poll, cancel, export and manage sessions.
//!
//! The [`Engine`] ties the pieces together: a [`SessionStore`] whose writes
//! are serialized by the persistence queue, a [`Registry`] of in-flight
//! runs, and an [`Orchestrator`] that drives sessions through the stages.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │     Engine      │    │  Orchestrator   │    │  SessionStore   │
//! │ (session_ops)   │───▶│  (detached      │───▶│ (queue ▶ SQLite)│
//! │                 │    │   runs)         │    │                 │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! # Examples
//!
//! ```rust,no_run
//! use pathfinder_core::{EngineBuilder, params::{Id, StartSession}};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = EngineBuilder::new()
//!     .with_database_path(Some("/tmp/pathfinder.db"))
//!     .build()
//!     .await?;
//!
//! let session = engine
//!     .start_session(&StartSession {
//!         idea: "vegan snack subscription".to_string(),
//!         lucky: false,
//!     })
//!     .await?;
//!
//! // The run proceeds in the background; poll for its state.
//! let current = engine.session(&Id { id: session.id }).await?;
//! println!("{}% done", current.progress);
//! # Ok(())
//! # }
//! ```

use std::path::Path;

pub mod builder;
pub mod session_ops;

#[cfg(test)]
mod tests;

pub use builder::EngineBuilder;

use crate::{orchestrator::Orchestrator, registry::Registry, store::SessionStore};

/// Main interface for running and managing sessions.
#[derive(Clone)]
pub struct Engine {
    pub(crate) store: SessionStore,
    pub(crate) registry: Registry,
    pub(crate) orchestrator: Orchestrator,
}

impl Engine {
    pub(crate) fn new(store: SessionStore, orchestrator: Orchestrator) -> Self {
        Self {
            registry: orchestrator.registry().clone(),
            store,
            orchestrator,
        }
    }

    /// Location of the backing database file.
    pub fn db_path(&self) -> &Path {
        self.store.db_path()
    }

    /// Number of writes waiting in the persistence queue.
    pub fn pending_writes(&self) -> usize {
        self.store.queue().pending()
    }
}
