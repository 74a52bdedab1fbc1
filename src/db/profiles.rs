//! Learner profile settings

use rusqlite::{params, Connection, OptionalExtension, Result};

use crate::domain::{ReviewStrategy, UserProfile};

/// Raw stored strategy value, if the learner ever picked one
pub fn get_review_strategy_raw(conn: &Connection, user_id: &str) -> Result<Option<String>> {
    let value: Option<Option<String>> = conn
        .query_row(
            "SELECT review_strategy FROM user_profiles WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value.flatten())
}

/// Stored strategy, falling back to the default for unknown values
pub fn get_review_strategy(conn: &Connection, user_id: &str) -> Result<ReviewStrategy> {
    let raw = get_review_strategy_raw(conn, user_id)?;
    Ok(ReviewStrategy::parse_lenient(raw.as_deref()))
}

pub fn set_review_strategy(conn: &Connection, user_id: &str, strategy: ReviewStrategy) -> Result<()> {
    conn.execute(
        r#"
    INSERT INTO user_profiles (user_id, review_strategy) VALUES (?1, ?2)
    ON CONFLICT(user_id) DO UPDATE SET review_strategy = excluded.review_strategy
    "#,
        params![user_id, strategy.as_str()],
    )?;
    Ok(())
}

pub fn increment_sessions_completed(conn: &Connection, user_id: &str) -> Result<u32> {
    conn.execute(
        r#"
    INSERT INTO user_profiles (user_id, total_sessions_completed) VALUES (?1, 1)
    ON CONFLICT(user_id) DO UPDATE SET total_sessions_completed = total_sessions_completed + 1
    "#,
        params![user_id],
    )?;
    conn.query_row(
        "SELECT total_sessions_completed FROM user_profiles WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )
}

/// Profile for a learner; learners without a row get defaults
pub fn get_profile(conn: &Connection, user_id: &str) -> Result<UserProfile> {
    let row: Option<(Option<String>, u32)> = conn
        .query_row(
            "SELECT review_strategy, total_sessions_completed FROM user_profiles WHERE user_id = ?1",
            params![user_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    Ok(match row {
        Some((strategy, completed)) => UserProfile {
            user_id: user_id.to_string(),
            review_strategy: ReviewStrategy::parse_lenient(strategy.as_deref()),
            total_sessions_completed: completed,
        },
        None => UserProfile::new(user_id),
    })
}
