//! Status enumerations for sessions and steps.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Type-safe enumeration of session statuses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Session is being (or about to be) orchestrated
    #[default]
    Active,

    /// All stages finished successfully
    Completed,

    /// A stage failed; the session will not continue
    Failed,

    /// Stopped on request at a stage boundary
    Cancelled,
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(SessionStatus::Active),
            "completed" => Ok(SessionStatus::Completed),
            "failed" => Ok(SessionStatus::Failed),
            "cancelled" | "canceled" => Ok(SessionStatus::Cancelled),
            _ => Err(format!("Invalid session status: {s}")),
        }
    }
}

impl SessionStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [SessionStatus; 4] = [
        SessionStatus::Active,
        SessionStatus::Completed,
        SessionStatus::Failed,
        SessionStatus::Cancelled,
    ];

    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
            SessionStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal sessions never transition again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::Active)
    }

    /// Get status with consistent icon formatting for display.
    ///
    /// ```rust
    /// use pathfinder_core::models::SessionStatus;
    ///
    /// assert_eq!(SessionStatus::Completed.with_icon(), "✓ Completed");
    /// assert_eq!(SessionStatus::Cancelled.with_icon(), "⊘ Cancelled");
    /// ```
    pub fn with_icon(&self) -> &'static str {
        match self {
            SessionStatus::Active => "➤ Active",
            SessionStatus::Completed => "✓ Completed",
            SessionStatus::Failed => "✗ Failed",
            SessionStatus::Cancelled => "⊘ Cancelled",
        }
    }
}

/// Type-safe enumeration of step statuses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Step has not started
    #[default]
    Pending,

    /// Step's stage is running
    InProgress,

    /// Step finished with a result
    Completed,

    /// Step's stage raised an error
    Failed,
}

impl FromStr for StepStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(StepStatus::Pending),
            "in_progress" | "inprogress" => Ok(StepStatus::InProgress),
            "completed" => Ok(StepStatus::Completed),
            "failed" => Ok(StepStatus::Failed),
            _ => Err(format!("Invalid step status: {s}")),
        }
    }
}

impl StepStatus {
    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::InProgress => "in_progress",
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
        }
    }

    /// Steps only move `pending → in_progress → {completed|failed}`.
    pub fn can_transition_to(&self, next: StepStatus) -> bool {
        matches!(
            (self, next),
            (StepStatus::Pending, StepStatus::InProgress)
                | (StepStatus::InProgress, StepStatus::Completed)
                | (StepStatus::InProgress, StepStatus::Failed)
        )
    }

    /// Get status with consistent icon formatting for display.
    ///
    /// # Icons Used
    /// - `✓ Completed` - Checkmark for finished steps
    /// - `➤ In Progress` - Arrow for the running step
    /// - `✗ Failed` - Cross for failed steps
    /// - `○ Pending` - Circle for steps not yet started
    pub fn with_icon(&self) -> &'static str {
        match self {
            StepStatus::Completed => "✓ Completed",
            StepStatus::InProgress => "➤ In Progress",
            StepStatus::Failed => "✗ Failed",
            StepStatus::Pending => "○ Pending",
        }
    }
}
