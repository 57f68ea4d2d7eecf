//! Step model definition and related functionality.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{Phase, StepStatus};

/// One phase of a session's run. Owned by its session; it has no identity
/// of its own beyond its name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Which phase this step records
    pub name: Phase,

    /// Current status of the step
    pub status: StepStatus,

    /// Set on transition to `in_progress`
    pub start_time: Option<Timestamp>,

    /// Set on transition to `completed` or `failed`
    pub end_time: Option<Timestamp>,

    /// Stage output, once completed
    pub data: Option<serde_json::Value>,

    /// Failure message, once failed
    pub error: Option<String>,
}

impl Step {
    /// A fresh `pending` step.
    pub fn pending(name: Phase) -> Self {
        Self {
            name,
            status: StepStatus::Pending,
            start_time: None,
            end_time: None,
            data: None,
            error: None,
        }
    }
}
