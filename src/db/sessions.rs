//! Study session persistence

use rusqlite::{params, Connection, OptionalExtension, Result};

use super::{format_ts, parse_ts};
use crate::domain::{SessionRecord, SessionType, SessionUpdate};

const SESSION_COLUMNS: &str = "session_id, user_id, session_type, start_time, end_time, \
                               words_studied, correct_answers, total_answers";

/// Outcome of a partial session update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionWrite {
    Applied,
    /// The session exists but was already closed
    Closed,
    Missing,
}

pub fn insert_session(conn: &Connection, session_id: &str, session: &SessionRecord) -> Result<()> {
    conn.execute(
        r#"
    INSERT INTO study_sessions
      (session_id, user_id, session_type, start_time, end_time,
       words_studied, correct_answers, total_answers)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    "#,
        params![
            session_id,
            session.user_id,
            session.session_type.as_str(),
            format_ts(session.start_time),
            session.end_time.map(format_ts),
            words_to_json(&session.words_studied)?,
            session.correct_answers,
            session.total_answers,
        ],
    )?;
    Ok(())
}

/// Apply the set fields of `update` to an open session
pub fn update_session(conn: &Connection, session_id: &str, update: &SessionUpdate) -> Result<SessionWrite> {
    let words = update
        .words_studied
        .as_ref()
        .map(|w| words_to_json(w))
        .transpose()?;

    let updated = conn.execute(
        r#"
    UPDATE study_sessions
    SET end_time = COALESCE(?1, end_time),
        words_studied = COALESCE(?2, words_studied),
        correct_answers = COALESCE(?3, correct_answers),
        total_answers = COALESCE(?4, total_answers)
    WHERE session_id = ?5 AND end_time IS NULL
    "#,
        params![
            update.end_time.map(format_ts),
            words,
            update.correct_answers,
            update.total_answers,
            session_id,
        ],
    )?;

    if updated > 0 {
        return Ok(SessionWrite::Applied);
    }

    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM study_sessions WHERE session_id = ?1",
        params![session_id],
        |row| row.get(0),
    )?;
    Ok(if exists {
        SessionWrite::Closed
    } else {
        SessionWrite::Missing
    })
}

pub fn get_session(conn: &Connection, session_id: &str) -> Result<Option<SessionRecord>> {
    conn.query_row(
        &format!("SELECT {} FROM study_sessions WHERE session_id = ?1", SESSION_COLUMNS),
        params![session_id],
        row_to_session,
    )
    .optional()
}

/// Most recent sessions of a learner first
pub fn get_user_sessions(conn: &Connection, user_id: &str, limit: usize) -> Result<Vec<SessionRecord>> {
    let mut stmt = conn.prepare(&format!(
        r#"
    SELECT {}
    FROM study_sessions
    WHERE user_id = ?1
    ORDER BY start_time DESC
    LIMIT ?2
    "#,
        SESSION_COLUMNS
    ))?;

    let sessions = stmt
        .query_map(params![user_id, limit as i64], row_to_session)?
        .collect::<Result<Vec<_>>>()?;
    Ok(sessions)
}

fn words_to_json(words: &[String]) -> Result<String> {
    serde_json::to_string(words).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

fn row_to_session(row: &rusqlite::Row) -> Result<SessionRecord> {
    let session_type: String = row.get(2)?;
    let start_time: String = row.get(3)?;
    let end_time: Option<String> = row.get(4)?;
    let words_json: String = row.get(5)?;

    let words_studied: Vec<String> = serde_json::from_str(&words_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(SessionRecord {
        session_id: row.get(0)?,
        user_id: row.get(1)?,
        session_type: SessionType::from_str(&session_type).unwrap_or_default(),
        start_time: parse_ts(3, &start_time)?,
        end_time: end_time.map(|t| parse_ts(4, &t)).transpose()?,
        words_studied,
        correct_answers: row.get(6)?,
        total_answers: row.get(7)?,
    })
}
