//! Session summary types for list views.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{Phase, Session, SessionStatus};

/// Compact view of a session used in listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    #[serde(rename = "sessionId")]
    pub id: String,
    pub input: String,
    pub status: SessionStatus,
    pub current_step: Phase,
    pub progress: u8,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.clone(),
            input: session.input.clone(),
            status: session.status,
            current_step: session.current_step,
            progress: session.progress,
            start_time: session.metadata.start_time,
            end_time: session.metadata.end_time,
            created_at: session.created_at,
        }
    }
}

/// One page of session summaries plus pagination bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPage {
    pub sessions: Vec<SessionSummary>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
    pub has_more: bool,
}

impl SessionPage {
    /// Builds a page, deriving `has_more` from the totals.
    pub fn new(sessions: Vec<SessionSummary>, total: u64, limit: u32, offset: u32) -> Self {
        Self {
            sessions,
            total,
            limit,
            offset,
            has_more: total > u64::from(offset) + u64::from(limit),
        }
    }
}

/// Count and average duration of sessions sharing a status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusBreakdown {
    pub status: SessionStatus,
    pub count: u64,
    pub avg_duration_ms: Option<f64>,
}

/// Aggregate numbers across all stored sessions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub total_sessions: u64,
    /// Sessions created in the last 24 hours
    pub recent_sessions: u64,
    pub status_breakdown: Vec<StatusBreakdown>,
}
