//! Display formatting for sessions and operation results.
//!
//! Domain models implement [`std::fmt::Display`] directly (see [`models`]);
//! collections and operation outcomes get small wrapper types so the same
//! data can be rendered differently per context. Everything here produces
//! markdown, which the CLI renders to the terminal.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │  Domain Models  │    │ Wrappers and    │    │   Formatted     │
//! │ (Session, Step) │───▶│ Reports         │───▶│    Output       │
//! │                 │    │                 │    │ (Terminal/File) │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`collections`]: [`SessionSummaries`] and the session page listing
//! - [`results`]: [`CreateResult`], [`CancelResult`], [`DeleteResult`]
//! - [`status`]: [`OperationStatus`] confirmation messages
//! - [`report`]: the plain-text and markdown result reports used by exports
//! - [`datetime`]: timestamp formatting
//! - [`models`]: Display implementations for domain models
//!
//! # Examples
//!
//! ```rust
//! use jiff::Timestamp;
//! use pathfinder_core::{display::CreateResult, models::Session};
//!
//! let session = Session::new("session_1", "vegan snack subscription", false, Timestamp::now());
//! let output = CreateResult::new(session).to_string();
//! assert!(output.contains("Started session session_1"));
//! ```

pub mod collections;
pub mod datetime;
pub mod models;
pub mod report;
pub mod results;
pub mod status;

pub use collections::SessionSummaries;
pub use datetime::{Elapsed, LocalDateTime};
pub use report::{MarkdownReport, TextReport};
pub use results::{CancelResult, CreateResult, DeleteResult};
pub use status::OperationStatus;
