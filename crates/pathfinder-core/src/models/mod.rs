//! Data models for sessions and their steps.
//!
//! A [`Session`] is one workflow run: an input idea, a status, the phase it
//! is in, a progress figure, one [`Step`] per phase and the structured
//! outputs of the stages that have completed. The state machine lives on
//! [`Session`] itself so every writer goes through the same checks.
//!
//! Display implementations for these models are located in
//! [`crate::display::models`].
//!
//! # Examples
//!
//! ```rust
//! use jiff::Timestamp;
//! use pathfinder_core::models::{Phase, Session, SessionStatus, StepStatus};
//!
//! let now = Timestamp::now();
//! let mut session = Session::new("session_1", "vegan snack subscription", false, now);
//! assert_eq!(session.status, SessionStatus::Active);
//! assert_eq!(session.steps.len(), 5);
//!
//! session.begin_step(Phase::MarketResearch, Timestamp::now()).unwrap();
//! assert_eq!(session.current_step, Phase::MarketResearch);
//! assert_eq!(session.step(Phase::MarketResearch).unwrap().status, StepStatus::InProgress);
//! ```

pub mod filters;
pub mod session;
pub mod stage;
pub mod status;
pub mod step;
pub mod summary;


pub use filters::{DEFAULT_PAGE_SIZE, SessionFilter};
pub use session::{Session, SessionMetadata};
pub use stage::{Phase, Stage, StageResults};
pub use status::{SessionStatus, StepStatus};
pub use step::Step;
pub use summary::{SessionPage, SessionStats, SessionSummary, StatusBreakdown};
