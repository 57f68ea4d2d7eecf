//! Collection wrapper types for displaying groups of sessions.

use std::{fmt, ops::Index};

use crate::models::{SessionPage, SessionSummary};

/// Newtype wrapper for displaying a list of session summaries.
///
/// # Examples
///
/// ```rust
/// use jiff::Timestamp;
/// use pathfinder_core::{
///     display::SessionSummaries,
///     models::{Session, SessionSummary},
/// };
///
/// let session = Session::new("session_1", "vegan snack subscription", false, Timestamp::now());
/// let summaries = SessionSummaries(vec![SessionSummary::from(&session)]);
/// assert!(summaries.to_string().contains("vegan snack subscription"));
/// ```
pub struct SessionSummaries(pub Vec<SessionSummary>);

impl SessionSummaries {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SessionSummary> {
        self.0.iter()
    }
}

impl Index<usize> for SessionSummaries {
    type Output = SessionSummary;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl IntoIterator for SessionSummaries {
    type Item = SessionSummary;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a SessionSummaries {
    type Item = &'a SessionSummary;
    type IntoIter = std::slice::Iter<'a, SessionSummary>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for SessionSummaries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            writeln!(f, "No sessions found.")
        } else {
            for session in &self.0 {
                write!(f, "{session}")?;
            }
            Ok(())
        }
    }
}

impl From<SessionPage> for SessionSummaries {
    fn from(page: SessionPage) -> Self {
        Self(page.sessions)
    }
}

impl fmt::Display for SessionPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sessions.is_empty() {
            return writeln!(f, "No sessions found.");
        }

        for session in &self.sessions {
            write!(f, "{session}")?;
        }

        let first = u64::from(self.offset) + 1;
        let last = u64::from(self.offset) + self.sessions.len() as u64;
        write!(f, "Showing {first}-{last} of {}", self.total)?;
        if self.has_more {
            write!(f, " (more with --offset {last})")?;
        }
        writeln!(f)
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use super::*;
    use crate::models::Session;

    fn summary(id: &str, input: &str) -> SessionSummary {
        let session = Session::new(id, input, false, Timestamp::from_second(1640995200).unwrap());
        SessionSummary::from(&session)
    }

    #[test]
    fn test_session_summaries_display() {
        let summaries = SessionSummaries(vec![
            summary("session_1", "First idea"),
            summary("session_2", "Second idea"),
        ]);
        let output = summaries.to_string();
        assert!(output.contains("## First idea (0%)"));
        assert!(output.contains("- **ID**: session_2"));
        assert!(!output.starts_with("# "));

        assert_eq!(SessionSummaries(vec![]).to_string(), "No sessions found.\n");
    }

    #[test]
    fn test_page_footer() {
        let page = SessionPage::new(vec![summary("session_3", "Third idea")], 5, 1, 2);
        let output = page.to_string();
        assert!(output.contains("Showing 3-3 of 5 (more with --offset 3)"));

        let page = SessionPage::new(vec![summary("session_4", "Last idea")], 1, 20, 0);
        assert!(page.to_string().ends_with("Showing 1-1 of 1\n"));

        let empty = SessionPage::new(vec![], 0, 20, 0);
        assert_eq!(empty.to_string(), "No sessions found.\n");
    }
}
