//! Display implementations for domain models.
//!
//! Kept apart from the model definitions; all output is markdown with status
//! icons, ready for the terminal renderer.

use std::fmt;

use super::datetime::{Elapsed, LocalDateTime};
use crate::models::{
    Phase, Session, SessionStats, SessionStatus, SessionSummary, Stage, Step, StepStatus,
};

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# {}", self.input)?;
        writeln!(f)?;

        writeln!(f, "- Session: {}", self.id)?;
        writeln!(f, "- Status: {}", self.status.with_icon())?;
        writeln!(f, "- Current step: {}", self.current_step)?;
        writeln!(f, "- Progress: {}%", self.progress)?;
        if self.lucky {
            writeln!(f, "- Lucky: yes")?;
        }
        writeln!(f, "- Started: {}", LocalDateTime(&self.metadata.start_time))?;
        if let Some(end) = &self.metadata.end_time {
            writeln!(f, "- Ended: {}", LocalDateTime(end))?;
        }
        if let Some(ms) = self.metadata.duration_ms {
            writeln!(f, "- Duration: {}", Elapsed(ms))?;
        }
        if self.metadata.error_count > 0 {
            writeln!(f, "- Errors: {}", self.metadata.error_count)?;
        }

        writeln!(f, "\n## Steps")?;
        writeln!(f)?;
        for step in &self.steps {
            write!(f, "{step}")?;
        }

        Ok(())
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = self.name.stage().map_or("Initialization", |stage| stage.title());
        write!(f, "- **{label}** ({})", self.status.with_icon())?;

        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            write!(
                f,
                " in {}",
                Elapsed(end.as_millisecond() - start.as_millisecond())
            )?;
        }
        writeln!(f)?;

        if self.status == StepStatus::Failed
            && let Some(error) = &self.error
        {
            writeln!(f, "  - Error: {error}")?;
        }

        Ok(())
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## {} ({}%)", self.input, self.progress)?;
        writeln!(f)?;
        writeln!(f, "- **ID**: {}", self.id)?;
        writeln!(f, "- **Status**: {}", self.status.with_icon())?;
        if !self.status.is_terminal() {
            writeln!(f, "- **Step**: {}", self.current_step)?;
        }
        writeln!(f, "- **Created**: {}", LocalDateTime(&self.created_at))?;
        writeln!(f)?;

        Ok(())
    }
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Session statistics")?;
        writeln!(f)?;
        writeln!(f, "- Total sessions: {}", self.total_sessions)?;
        writeln!(f, "- Created in the last 24 hours: {}", self.recent_sessions)?;

        if !self.status_breakdown.is_empty() {
            writeln!(f, "\n## By status")?;
            writeln!(f)?;
            for row in &self.status_breakdown {
                write!(f, "- {}: {}", row.status.with_icon(), row.count)?;
                if let Some(avg) = row.avg_duration_ms {
                    write!(f, " (avg {})", Elapsed(avg.round() as i64))?;
                }
                writeln!(f)?;
            }
        }

        Ok(())
    }
}
