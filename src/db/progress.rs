//! Progress record persistence

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result};

use super::{format_ts, parse_ts};
use crate::domain::{AnswerCounters, ProgressRecord};

const PROGRESS_COLUMNS: &str = "user_id, word_id, correct_count, incorrect_count, streak_count, \
                                last_reviewed, next_review";

pub fn get_progress(conn: &Connection, user_id: &str, word_id: &str) -> Result<Option<ProgressRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM user_progress WHERE user_id = ?1 AND word_id = ?2",
        PROGRESS_COLUMNS
    ))?;

    let mut rows = stmt.query(params![user_id, word_id])?;
    if let Some(row) = rows.next()? {
        Ok(Some(row_to_progress(row)?))
    } else {
        Ok(None)
    }
}

/// Write a progress record, creating it on first answer
pub fn upsert_progress(conn: &Connection, record: &ProgressRecord) -> Result<()> {
    let last_reviewed = format_ts(record.last_reviewed());
    let next_review = format_ts(record.next_review());

    // Try to update existing record first
    let updated = conn.execute(
        r#"
    UPDATE user_progress
    SET correct_count = ?1, incorrect_count = ?2, streak_count = ?3,
        last_reviewed = ?4, next_review = ?5, difficulty_level = ?6, is_learned = ?7
    WHERE user_id = ?8 AND word_id = ?9
    "#,
        params![
            record.correct_count(),
            record.incorrect_count(),
            record.streak_count(),
            last_reviewed,
            next_review,
            record.difficulty_level().as_str(),
            record.is_learned(),
            record.user_id(),
            record.word_id(),
        ],
    )?;

    // If no existing row, insert new one
    if updated == 0 {
        conn.execute(
            r#"
      INSERT INTO user_progress
        (user_id, word_id, correct_count, incorrect_count, streak_count,
         last_reviewed, next_review, difficulty_level, is_learned)
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
      "#,
            params![
                record.user_id(),
                record.word_id(),
                record.correct_count(),
                record.incorrect_count(),
                record.streak_count(),
                last_reviewed,
                next_review,
                record.difficulty_level().as_str(),
                record.is_learned(),
            ],
        )?;
    }

    Ok(())
}

/// Records due at or before `due_before`, most overdue first
pub fn get_due_progress(
    conn: &Connection,
    user_id: &str,
    due_before: DateTime<Utc>,
    limit: usize,
) -> Result<Vec<ProgressRecord>> {
    let mut stmt = conn.prepare(&format!(
        r#"
    SELECT {}
    FROM user_progress
    WHERE user_id = ?1 AND next_review <= ?2
    ORDER BY next_review ASC, word_id ASC
    LIMIT ?3
    "#,
        PROGRESS_COLUMNS
    ))?;

    let records = stmt
        .query_map(
            params![user_id, format_ts(due_before), limit as i64],
            row_to_progress,
        )?
        .collect::<Result<Vec<_>>>()?;
    Ok(records)
}

pub fn get_user_progress(conn: &Connection, user_id: &str) -> Result<Vec<ProgressRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM user_progress WHERE user_id = ?1 ORDER BY word_id",
        PROGRESS_COLUMNS
    ))?;

    let records = stmt
        .query_map(params![user_id], row_to_progress)?
        .collect::<Result<Vec<_>>>()?;
    Ok(records)
}

/// Derived columns are not read back: the record recomputes them from the counters
fn row_to_progress(row: &rusqlite::Row) -> Result<ProgressRecord> {
    let user_id: String = row.get(0)?;
    let word_id: String = row.get(1)?;
    let counters = AnswerCounters {
        correct: row.get(2)?,
        incorrect: row.get(3)?,
        streak: row.get(4)?,
    };
    let last_reviewed: String = row.get(5)?;
    let next_review: String = row.get(6)?;

    Ok(ProgressRecord::new(
        user_id,
        word_id,
        counters,
        parse_ts(5, &last_reviewed)?,
        parse_ts(6, &next_review)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::run_migrations;
    use crate::domain::DifficultyLevel;
    use chrono::Duration;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn base_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-05-10T08:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn record(word: &str, correct: u32, incorrect: u32, next_in_days: i64) -> ProgressRecord {
        let now = base_time();
        ProgressRecord::new(
            "u1",
            word,
            AnswerCounters {
                correct,
                incorrect,
                streak: correct.min(1),
            },
            now,
            now + Duration::days(next_in_days),
        )
    }

    #[test]
    fn test_latest_review_date_round_trips() {
        let conn = setup();
        let far = ProgressRecord::new(
            "u1",
            "vecnost",
            AnswerCounters {
                correct: 40,
                incorrect: 0,
                streak: 40,
            },
            base_time(),
            crate::srs::latest_review(),
        );
        upsert_progress(&conn, &far).unwrap();
        upsert_progress(&conn, &record("sutra", 1, 0, 1)).unwrap();

        let stored = get_progress(&conn, "u1", "vecnost").unwrap().unwrap();
        assert_eq!(stored.next_review(), crate::srs::latest_review());

        let due = get_due_progress(&conn, "u1", base_time() + Duration::days(2), 10).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].word_id(), "sutra");
    }

    #[test]
    fn test_missing_progress_is_none() {
        let conn = setup();
        assert!(get_progress(&conn, "u1", "grad").unwrap().is_none());
    }

    #[test]
    fn test_upsert_creates_then_overwrites() {
        let conn = setup();
        upsert_progress(&conn, &record("grad", 1, 0, 2)).unwrap();
        upsert_progress(&conn, &record("grad", 1, 1, 1)).unwrap();

        let stored = get_progress(&conn, "u1", "grad").unwrap().unwrap();
        assert_eq!(stored.correct_count(), 1);
        assert_eq!(stored.incorrect_count(), 1);
        assert_eq!(stored.next_review(), base_time() + Duration::days(1));

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM user_progress", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_stored_flags_are_not_trusted() {
        let conn = setup();
        upsert_progress(&conn, &record("selo", 1, 3, 1)).unwrap();
        conn.execute(
            "UPDATE user_progress SET difficulty_level = 'easy', is_learned = 1",
            [],
        )
        .unwrap();

        let stored = get_progress(&conn, "u1", "selo").unwrap().unwrap();
        assert_eq!(stored.difficulty_level(), DifficultyLevel::Hard);
        assert!(!stored.is_learned());
    }

    #[test]
    fn test_due_progress_ordering() {
        let conn = setup();
        upsert_progress(&conn, &record("a", 1, 0, 3)).unwrap();
        upsert_progress(&conn, &record("b", 1, 0, 1)).unwrap();
        upsert_progress(&conn, &record("c", 1, 0, 10)).unwrap();

        let due = get_due_progress(&conn, "u1", base_time() + Duration::days(5), 10).unwrap();
        let words: Vec<&str> = due.iter().map(|r| r.word_id()).collect();
        assert_eq!(words, vec!["b", "a"]);

        let limited = get_due_progress(&conn, "u1", base_time() + Duration::days(5), 1).unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].word_id(), "b");
    }

    #[test]
    fn test_due_boundary_is_inclusive() {
        let conn = setup();
        upsert_progress(&conn, &record("most", 1, 0, 2)).unwrap();
        let due = get_due_progress(&conn, "u1", base_time() + Duration::days(2), 10).unwrap();
        assert_eq!(due.len(), 1);
    }

    #[test]
    fn test_user_progress_is_scoped() {
        let conn = setup();
        upsert_progress(&conn, &record("a", 1, 0, 1)).unwrap();
        let other = ProgressRecord::new(
            "u2",
            "a",
            AnswerCounters::default().after_answer(true),
            base_time(),
            base_time(),
        );
        upsert_progress(&conn, &other).unwrap();

        assert_eq!(get_user_progress(&conn, "u1").unwrap().len(), 1);
        assert_eq!(get_user_progress(&conn, "u2").unwrap().len(), 1);
    }
}
