//! Filter types for querying sessions.

use jiff::Timestamp;

use super::SessionStatus;

/// Default page size for session listings.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Filter options for querying sessions.
#[derive(Debug, Clone)]
pub struct SessionFilter {
    /// Only sessions with this status
    pub status: Option<SessionStatus>,

    /// Only sessions created at or after this instant
    pub created_after: Option<Timestamp>,

    /// Maximum number of sessions returned
    pub limit: u32,

    /// Number of sessions skipped, newest first
    pub offset: u32,
}

impl Default for SessionFilter {
    fn default() -> Self {
        Self {
            status: None,
            created_after: None,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl SessionFilter {
    /// Filter matching a single status.
    pub fn with_status(status: SessionStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}
