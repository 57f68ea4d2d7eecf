//! Session CRUD operations and queries.

use jiff::{SignedDuration, Timestamp};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params, types::Type};

use crate::{
    error::{DatabaseResultExt, PipelineError, Result},
    models::{
        Phase, Session, SessionFilter, SessionMetadata, SessionPage, SessionStats,
        SessionStatus, SessionSummary, StageResults, StatusBreakdown, Step, StepStatus,
    },
};

const INSERT_SESSION_SQL: &str = "INSERT INTO sessions (id, input, lucky, status, current_step, progress, results, start_time, end_time, duration_ms, error_count, created_at, created_ms, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)";
const INSERT_STEP_SQL: &str = "INSERT INTO steps (session_id, position, name, status, start_time, end_time, data, error) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";
const SELECT_SESSION_SQL: &str = "SELECT id, input, lucky, status, current_step, progress, results, start_time, end_time, duration_ms, error_count, created_at, updated_at FROM sessions WHERE id = ?1";
const SELECT_STEPS_SQL: &str = "SELECT name, status, start_time, end_time, data, error FROM steps WHERE session_id = ?1 ORDER BY position";
const UPDATE_SESSION_SQL: &str = "UPDATE sessions SET status = ?1, current_step = ?2, progress = ?3, results = ?4, end_time = ?5, duration_ms = ?6, error_count = ?7, updated_at = ?8 WHERE id = ?9";
const UPDATE_STEP_SQL: &str = "UPDATE steps SET status = ?1, start_time = ?2, end_time = ?3, data = ?4, error = ?5 WHERE session_id = ?6 AND position = ?7";
const SELECT_UPDATED_AT_SQL: &str = "SELECT updated_at FROM sessions WHERE id = ?1";
const DELETE_SESSION_SQL: &str = "DELETE FROM sessions WHERE id = ?1";
const SUMMARY_COLUMNS: &str =
    "id, input, status, current_step, progress, start_time, end_time, created_at";
const STATUS_BREAKDOWN_SQL: &str =
    "SELECT status, COUNT(*), AVG(duration_ms) FROM sessions GROUP BY status";
const COUNT_RECENT_SQL: &str = "SELECT COUNT(*) FROM sessions WHERE created_ms >= ?1";

fn parse_timestamp(idx: usize, value: String) -> rusqlite::Result<Timestamp> {
    value
        .parse::<Timestamp>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_optional_timestamp(
    idx: usize,
    value: Option<String>,
) -> rusqlite::Result<Option<Timestamp>> {
    value.map(|v| parse_timestamp(idx, v)).transpose()
}

fn parse_enum<T>(idx: usize, value: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    value
        .parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

fn parse_json<T: serde::de::DeserializeOwned>(idx: usize, value: &str) -> rusqlite::Result<T> {
    serde_json::from_str(value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Helper function to construct a Step from a database row
fn build_step_from_row(row: &rusqlite::Row) -> rusqlite::Result<Step> {
    let data: Option<String> = row.get(4)?;
    Ok(Step {
        name: parse_enum::<Phase>(0, &row.get::<_, String>(0)?)?,
        status: parse_enum::<StepStatus>(1, &row.get::<_, String>(1)?)?,
        start_time: parse_optional_timestamp(2, row.get(2)?)?,
        end_time: parse_optional_timestamp(3, row.get(3)?)?,
        data: data.as_deref().map(|d| parse_json(4, d)).transpose()?,
        error: row.get(5)?,
    })
}

/// Helper function to construct a Session (without steps) from a database row
fn build_session_from_row(row: &rusqlite::Row) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        input: row.get(1)?,
        lucky: row.get(2)?,
        status: parse_enum::<SessionStatus>(3, &row.get::<_, String>(3)?)?,
        current_step: parse_enum::<Phase>(4, &row.get::<_, String>(4)?)?,
        progress: row.get(5)?,
        results: parse_json::<StageResults>(6, &row.get::<_, String>(6)?)?,
        metadata: SessionMetadata {
            start_time: parse_timestamp(7, row.get(7)?)?,
            end_time: parse_optional_timestamp(8, row.get(8)?)?,
            duration_ms: row.get(9)?,
            error_count: row.get(10)?,
        },
        created_at: parse_timestamp(11, row.get(11)?)?,
        updated_at: parse_timestamp(12, row.get(12)?)?,
        steps: Vec::new(),
    })
}

fn build_summary_from_row(row: &rusqlite::Row) -> rusqlite::Result<SessionSummary> {
    Ok(SessionSummary {
        id: row.get(0)?,
        input: row.get(1)?,
        status: parse_enum::<SessionStatus>(2, &row.get::<_, String>(2)?)?,
        current_step: parse_enum::<Phase>(3, &row.get::<_, String>(3)?)?,
        progress: row.get(4)?,
        start_time: parse_timestamp(5, row.get(5)?)?,
        end_time: parse_optional_timestamp(6, row.get(6)?)?,
        created_at: parse_timestamp(7, row.get(7)?)?,
    })
}

fn optional_json(value: Option<&serde_json::Value>) -> Result<Option<String>> {
    Ok(value.map(serde_json::to_string).transpose()?)
}

/// Loads a session and its steps through any connection or transaction.
fn load_session(conn: &Connection, id: &str) -> Result<Option<Session>> {
    let session = conn
        .query_row(SELECT_SESSION_SQL, params![id], build_session_from_row)
        .optional()
        .db_context("Failed to query session")?;

    let Some(mut session) = session else {
        return Ok(None);
    };

    let mut stmt = conn
        .prepare(SELECT_STEPS_SQL)
        .db_context("Failed to prepare steps query")?;
    session.steps = stmt
        .query_map(params![id], build_step_from_row)
        .db_context("Failed to query steps")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .db_context("Failed to read step row")?;

    Ok(Some(session))
}

/// Writes every mutable field of a session and its steps.
fn write_session(conn: &Connection, session: &Session) -> Result<()> {
    let results = serde_json::to_string(&session.results)?;
    let updated = conn
        .execute(
            UPDATE_SESSION_SQL,
            params![
                session.status.as_str(),
                session.current_step.as_str(),
                session.progress,
                results,
                session.metadata.end_time.map(|t| t.to_string()),
                session.metadata.duration_ms,
                session.metadata.error_count,
                session.updated_at.to_string(),
                session.id,
            ],
        )
        .db_context("Failed to update session")?;

    if updated == 0 {
        return Err(PipelineError::conflict(
            &session.id,
            "record no longer exists",
        ));
    }

    for (position, step) in session.steps.iter().enumerate() {
        conn.execute(
            UPDATE_STEP_SQL,
            params![
                step.status.as_str(),
                step.start_time.map(|t| t.to_string()),
                step.end_time.map(|t| t.to_string()),
                optional_json(step.data.as_ref())?,
                step.error,
                session.id,
                position as i64,
            ],
        )
        .db_context("Failed to update step")?;
    }

    Ok(())
}

impl super::Database {
    /// Inserts a freshly created session together with its seeded steps.
    pub fn insert_session(&mut self, session: &Session) -> Result<()> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        tx.execute(
            INSERT_SESSION_SQL,
            params![
                session.id,
                session.input,
                session.lucky,
                session.status.as_str(),
                session.current_step.as_str(),
                session.progress,
                serde_json::to_string(&session.results)?,
                session.metadata.start_time.to_string(),
                session.metadata.end_time.map(|t| t.to_string()),
                session.metadata.duration_ms,
                session.metadata.error_count,
                session.created_at.to_string(),
                session.created_at.as_millisecond(),
                session.updated_at.to_string(),
            ],
        )
        .map_err(|e| PipelineError::database("Failed to insert session").with_source(e))?;

        for (position, step) in session.steps.iter().enumerate() {
            tx.execute(
                INSERT_STEP_SQL,
                params![
                    session.id,
                    position as i64,
                    step.name.as_str(),
                    step.status.as_str(),
                    step.start_time.map(|t| t.to_string()),
                    step.end_time.map(|t| t.to_string()),
                    optional_json(step.data.as_ref())?,
                    step.error,
                ],
            )
            .map_err(|e| PipelineError::database("Failed to insert step").with_source(e))?;
        }

        tx.commit().db_context("Failed to commit transaction")?;
        Ok(())
    }

    /// Retrieves a session with its steps.
    pub fn get_session(&self, id: &str) -> Result<Option<Session>> {
        load_session(&self.connection, id)
    }

    /// Overwrites the stored record with `session`, refreshing its derived
    /// fields first.
    ///
    /// The write is rejected with a conflict when the stored record changed
    /// after `session` was read from it.
    pub fn save_session(&mut self, session: &mut Session) -> Result<()> {
        let tx = self
            .connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .db_context("Failed to begin transaction")?;

        let stored: Option<String> = tx
            .query_row(SELECT_UPDATED_AT_SQL, params![session.id], |row| row.get(0))
            .optional()
            .db_context("Failed to read session version")?;
        let stored = stored.ok_or_else(|| {
            PipelineError::conflict(&session.id, "record no longer exists")
        })?;
        if parse_timestamp(0, stored).db_context("Failed to parse session version")?
            != session.updated_at
        {
            return Err(PipelineError::conflict(
                &session.id,
                "record changed since it was read",
            ));
        }

        session.touch(Timestamp::now());
        write_session(&tx, session)?;
        tx.commit().db_context("Failed to commit transaction")?;
        Ok(())
    }

    /// Loads the freshest stored copy of a session, applies `mutate` to it and
    /// writes it back, all under one write lock. Nothing is written if
    /// `mutate` fails.
    pub fn update_session<F>(&mut self, id: &str, mutate: F) -> Result<Session>
    where
        F: FnOnce(&mut Session) -> Result<()>,
    {
        let tx = self
            .connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .db_context("Failed to begin transaction")?;

        let mut session = load_session(&tx, id)?.ok_or_else(|| PipelineError::SessionNotFound {
            id: id.to_string(),
        })?;
        mutate(&mut session)?;
        session.touch(Timestamp::now());
        write_session(&tx, &session)?;

        tx.commit().db_context("Failed to commit transaction")?;
        Ok(session)
    }

    /// Lists session summaries, newest first, one page at a time.
    pub fn list_sessions(&self, filter: &SessionFilter) -> Result<SessionPage> {
        let mut conditions = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            conditions.push("status = ?");
            params_vec.push(Box::new(status.as_str()));
        }

        if let Some(after) = filter.created_after {
            conditions.push("created_ms >= ?");
            params_vec.push(Box::new(after.as_millisecond()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|b| &**b).collect();

        let total: i64 = self
            .connection
            .query_row(
                &format!("SELECT COUNT(*) FROM sessions{where_clause}"),
                &params_refs[..],
                |row| row.get(0),
            )
            .db_context("Failed to count sessions")?;

        let query = format!(
            "SELECT {SUMMARY_COLUMNS} FROM sessions{where_clause} ORDER BY created_ms DESC, rowid DESC LIMIT {} OFFSET {}",
            filter.limit, filter.offset
        );
        let mut stmt = self
            .connection
            .prepare(&query)
            .db_context("Failed to prepare query")?;
        let sessions = stmt
            .query_map(&params_refs[..], build_summary_from_row)
            .db_context("Failed to query sessions")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .db_context("Failed to read session row")?;

        Ok(SessionPage::new(
            sessions,
            total as u64,
            filter.limit,
            filter.offset,
        ))
    }

    /// Permanently deletes a session and its steps. Returns whether a record
    /// was removed.
    pub fn delete_session(&mut self, id: &str) -> Result<bool> {
        let deleted = self
            .connection
            .execute(DELETE_SESSION_SQL, params![id])
            .db_context("Failed to delete session")?;
        Ok(deleted > 0)
    }

    /// Aggregates counts and durations across all sessions.
    pub fn session_stats(&self, now: Timestamp) -> Result<SessionStats> {
        let mut stmt = self
            .connection
            .prepare(STATUS_BREAKDOWN_SQL)
            .db_context("Failed to prepare stats query")?;
        let mut status_breakdown = stmt
            .query_map([], |row| {
                Ok(StatusBreakdown {
                    status: parse_enum::<SessionStatus>(0, &row.get::<_, String>(0)?)?,
                    count: row.get::<_, i64>(1)? as u64,
                    avg_duration_ms: row.get(2)?,
                })
            })
            .db_context("Failed to query stats")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .db_context("Failed to read stats row")?;
        status_breakdown.sort_by_key(|b| {
            SessionStatus::ALL
                .iter()
                .position(|s| *s == b.status)
                .unwrap_or(usize::MAX)
        });

        let total_sessions = status_breakdown.iter().map(|b| b.count).sum();
        let day_ago = now - SignedDuration::from_hours(24);
        let recent: i64 = self
            .connection
            .query_row(COUNT_RECENT_SQL, params![day_ago.as_millisecond()], |row| {
                row.get(0)
            })
            .db_context("Failed to count recent sessions")?;

        Ok(SessionStats {
            total_sessions,
            recent_sessions: recent as u64,
            status_breakdown,
        })
    }
}
