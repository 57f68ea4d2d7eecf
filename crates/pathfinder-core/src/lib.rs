//! Core library for Pathfinder, a session orchestration engine for
//! multi-stage business analysis.
//!
//! Given a business idea, the engine runs four analysis stages in order
//! (market research, competitor analysis, trend analysis, business plan),
//! persists every transition to SQLite, and lets callers poll, cancel and
//! export the evolving session.
//!
//! # Architecture
//!
//! - **Models** ([`models`]): the [`Session`] state machine and its steps
//! - **Store** ([`store`]): durable session records; all writes go through
//!   the single-writer [`PersistenceQueue`]
//! - **Orchestrator** ([`orchestrator`]): drives a session through the
//!   [`StageSet`], honoring cancellation at stage boundaries
//! - **Registry** ([`registry`]): in-memory set of in-flight runs
//! - **Exporter** ([`export`]): JSON, plain text and markdown reports
//! - **Display** ([`display`]): markdown formatting for terminal output
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use pathfinder_core::{
//!     EngineBuilder,
//!     params::{ExportSession, Id, StartSession},
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = EngineBuilder::new()
//!     .with_database_path(Some("test.db"))
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
//! let id = Id { id: session.id.clone() };
//! let finished = engine
//!     .wait_for_session(&id, Duration::from_millis(250), |s| {
//!         println!("{}: {}%", s.current_step, s.progress)
//!     })
//!     .await?;
//! println!("{finished}");
//!
//! let report = engine
//!     .export_session(&ExportSession { id: session.id, format: "md".to_string() })
//!     .await?;
//! println!("{}", report.data);
//! # Ok(())
//! # }
//! ```

pub mod db;
pub mod display;
pub mod engine;
pub mod error;
pub mod export;
pub mod models;
pub mod orchestrator;
pub mod params;
pub mod queue;
pub mod registry;
pub mod stages;
pub mod store;

// Re-export commonly used types
pub use db::Database;
pub use display::{
    CancelResult, CreateResult, DeleteResult, LocalDateTime, OperationStatus, SessionSummaries,
};
pub use engine::{Engine, EngineBuilder};
pub use error::{PipelineError, Result};
pub use export::{Export, ExportFormat};
pub use models::{
    Phase, Session, SessionFilter, SessionPage, SessionStats, SessionStatus, SessionSummary,
    Stage, StageResults, Step, StepStatus,
};
pub use orchestrator::{Orchestrator, RunOutcome};
pub use params::{DeleteSession, ExportSession, Id, ListSessions, StartSession};
pub use queue::PersistenceQueue;
pub use registry::Registry;
pub use stages::{OfflineAnalyzer, StageAnalyzer, StageRequest, StageSet};
pub use store::SessionStore;
