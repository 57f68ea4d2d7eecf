//! Parameter structures for engine operations.
//!
//! These are plain data carriers shared by every interface. Interface layers
//! (the CLI today) define their own framework-specific argument types and
//! convert into these; validation of free-form fields happens here so every
//! interface rejects bad input the same way.

use serde::{Deserialize, Serialize};

use crate::{
    error::{PipelineError, Result},
    export::ExportFormat,
    models::{DEFAULT_PAGE_SIZE, SessionFilter, SessionStatus},
};

/// Longest idea accepted, in characters.
pub const MAX_IDEA_CHARS: usize = 2000;

/// Parameters for operations that need just a session ID.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Id {
    pub id: String,
}

impl From<&str> for Id {
    fn from(id: &str) -> Self {
        Self { id: id.to_string() }
    }
}

/// Parameters for starting a new session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartSession {
    /// The business idea to analyze
    pub idea: String,
    /// Let the analyzers improvise a spotlight idea
    #[serde(default)]
    pub lucky: bool,
}

impl StartSession {
    /// Returns the trimmed idea, or an error if it is empty or too long.
    ///
    /// ```rust
    /// use pathfinder_core::params::StartSession;
    ///
    /// let params = StartSession { idea: "  vegan snacks ".to_string(), lucky: false };
    /// assert_eq!(params.validate().unwrap(), "vegan snacks");
    ///
    /// let params = StartSession { idea: "   ".to_string(), lucky: false };
    /// assert!(params.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<&str> {
        let idea = self.idea.trim();
        if idea.is_empty() {
            return Err(PipelineError::invalid_input("idea").with_reason("must not be empty"));
        }
        let chars = idea.chars().count();
        if chars > MAX_IDEA_CHARS {
            return Err(PipelineError::invalid_input("idea").with_reason(format!(
                "must be at most {MAX_IDEA_CHARS} characters, got {chars}"
            )));
        }
        Ok(idea)
    }
}

/// Parameters for exporting a completed session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportSession {
    pub id: String,
    /// One of `json`, `txt` or `md`
    pub format: String,
}

impl ExportSession {
    pub fn format(&self) -> Result<ExportFormat> {
        self.format.parse()
    }
}

/// Parameters for listing sessions, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSessions {
    /// Only sessions with this status
    pub status: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for ListSessions {
    fn default() -> Self {
        Self {
            status: None,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl ListSessions {
    /// Turns the parameters into a store filter, validating the status.
    pub fn to_filter(&self) -> Result<SessionFilter> {
        if self.limit == 0 {
            return Err(PipelineError::invalid_input("limit").with_reason("must be at least 1"));
        }
        let status = self
            .status
            .as_deref()
            .map(|s| {
                s.parse::<SessionStatus>()
                    .map_err(|e| PipelineError::invalid_input("status").with_reason(e))
            })
            .transpose()?;

        Ok(SessionFilter {
            status,
            limit: self.limit,
            offset: self.offset,
            ..SessionFilter::default()
        })
    }
}

/// Parameters for deleting a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteSession {
    pub id: String,
    /// Must be set; deletion cannot be undone
    #[serde(default)]
    pub confirmed: bool,
}
