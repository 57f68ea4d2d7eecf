//! Result wrapper types for displaying operation outcomes.

use std::fmt;

use crate::models::Session;

/// Outcome of starting a session.
pub struct CreateResult<T> {
    pub resource: T,
}

impl<T> CreateResult<T> {
    pub fn new(resource: T) -> Self {
        Self { resource }
    }
}

impl fmt::Display for CreateResult<Session> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Started session {}", self.resource.id)?;
        writeln!(f)?;
        write!(f, "{}", self.resource)
    }
}

/// Outcome of a cancellation request.
pub struct CancelResult<T> {
    pub resource: T,
}

impl<T> CancelResult<T> {
    pub fn new(resource: T) -> Self {
        Self { resource }
    }
}

impl fmt::Display for CancelResult<Session> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Cancelled session {} at {}%",
            self.resource.id, self.resource.progress
        )?;
        if let Some(step) = self
            .resource
            .steps
            .iter()
            .find(|step| step.status == crate::models::StepStatus::InProgress)
        {
            writeln!(
                f,
                "\nThe {} stage is still finishing; its outcome will be recorded.",
                step.name
            )?;
        }
        Ok(())
    }
}

/// Outcome of deleting a session.
pub struct DeleteResult<T> {
    pub resource: T,
}

impl<T> DeleteResult<T> {
    pub fn new(resource: T) -> Self {
        Self { resource }
    }
}

impl fmt::Display for DeleteResult<Session> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Deleted session '{}' (ID: {})",
            self.resource.input, self.resource.id
        )
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use super::*;
    use crate::models::Phase;

    #[test]
    fn test_cancel_result_mentions_in_flight_stage() {
        let now = Timestamp::now();
        let mut session = Session::new("session_c", "x", false, now);
        session.begin_step(Phase::TrendingAnalysis, now).unwrap();
        session.cancel(now).unwrap();

        let output = CancelResult::new(session).to_string();
        assert!(output.starts_with("Cancelled session session_c at 0%"));
        assert!(output.contains("trending_analysis stage is still finishing"));
    }

    #[test]
    fn test_delete_result() {
        let session = Session::new("session_x", "old idea", false, Timestamp::now());
        assert_eq!(
            DeleteResult::new(session).to_string(),
            "Deleted session 'old idea' (ID: session_x)\n"
        );
    }
}
