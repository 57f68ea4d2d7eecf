//! Builder for creating and configuring Engine instances.

use std::path::{Path, PathBuf};

use log::debug;
use tokio::task;

use super::Engine;
use crate::{
    db::Database,
    error::{PipelineError, Result},
    orchestrator::Orchestrator,
    registry::Registry,
    stages::StageSet,
    store::SessionStore,
};

/// Builder for creating and configuring Engine instances.
#[derive(Clone, Default)]
pub struct EngineBuilder {
    database_path: Option<PathBuf>,
    stages: Option<StageSet>,
}

impl EngineBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a custom database file path.
    ///
    /// If not specified, uses the XDG Base Directory specification:
    /// `$XDG_DATA_HOME/pathfinder/pathfinder.db` or
    /// `~/.local/share/pathfinder/pathfinder.db`
    pub fn with_database_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.database_path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Sets the analyzers used for the four stages. Defaults to the built-in
    /// offline analyzers with no simulated delay.
    pub fn with_analyzers(mut self, stages: StageSet) -> Self {
        self.stages = Some(stages);
        self
    }

    /// Builds the engine, creating and initializing the database if needed.
    ///
    /// Must be awaited inside a tokio runtime; the persistence queue worker
    /// is spawned onto it.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::XdgDirectory` if no default path can be found
    /// Returns `PipelineError::FileSystem` if the database directory cannot be created
    /// Returns `PipelineError::Database` if database initialization fails
    pub async fn build(self) -> Result<Engine> {
        let db_path = match self.database_path {
            Some(path) => path,
            None => Self::default_database_path()?,
        };

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| PipelineError::FileSystem {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let init_path = db_path.clone();
        task::spawn_blocking(move || Database::new(&init_path).map(|_| ()))
            .await
            .map_err(PipelineError::join)??;
        debug!("Using database at {}", db_path.display());

        let store = SessionStore::new(db_path);
        let orchestrator = Orchestrator::new(
            store.clone(),
            Registry::new(),
            self.stages.unwrap_or_default(),
        );
        Ok(Engine::new(store, orchestrator))
    }

    /// Returns the default database path following XDG Base Directory
    /// specification.
    fn default_database_path() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("pathfinder")
            .place_data_file("pathfinder.db")
            .map_err(|e| PipelineError::XdgDirectory(e.to_string()))
    }
}
