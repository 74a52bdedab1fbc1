use rusqlite::{Connection, Result};

pub fn run_migrations(conn: &Connection) -> Result<()> {
  // Create tables with COMPLETE schema for new databases
  // Migrations below handle upgrades for existing databases
  conn.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS user_progress (
      user_id TEXT NOT NULL,
      word_id TEXT NOT NULL,
      correct_count INTEGER NOT NULL DEFAULT 0,
      incorrect_count INTEGER NOT NULL DEFAULT 0,
      streak_count INTEGER NOT NULL DEFAULT 0,
      last_reviewed TEXT NOT NULL,
      next_review TEXT NOT NULL,
      -- Derived from the counters on every write
      difficulty_level TEXT NOT NULL DEFAULT 'medium',
      is_learned INTEGER NOT NULL DEFAULT 0,
      PRIMARY KEY (user_id, word_id)
    );

    CREATE TABLE IF NOT EXISTS study_sessions (
      session_id TEXT PRIMARY KEY,
      user_id TEXT NOT NULL,
      session_type TEXT NOT NULL DEFAULT 'flashcard',
      start_time TEXT NOT NULL,
      end_time TEXT,
      -- JSON array of word ids in first-answered order
      words_studied TEXT NOT NULL DEFAULT '[]',
      correct_answers INTEGER NOT NULL DEFAULT 0,
      total_answers INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS user_profiles (
      user_id TEXT PRIMARY KEY,
      review_strategy TEXT,
      total_sessions_completed INTEGER NOT NULL DEFAULT 0
    );

    -- Indexes
    CREATE INDEX IF NOT EXISTS idx_user_progress_due ON user_progress(user_id, next_review);
    CREATE INDEX IF NOT EXISTS idx_study_sessions_user ON study_sessions(user_id, start_time);
    "#,
  )?;

  // ============================================================
  // MIGRATIONS FOR EXISTING DATABASES
  // These are no-ops for new databases (columns already exist)
  // ============================================================

  // Migration: profile tables created without the session counter column gain it
  add_column_if_missing(
    conn,
    "user_profiles",
    "total_sessions_completed",
    "INTEGER NOT NULL DEFAULT 0",
  )?;

  Ok(())
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
  conn
    .prepare(&format!("SELECT {} FROM {} LIMIT 1", column, table))
    .is_ok()
}

/// Add a column if it doesn't already exist
fn add_column_if_missing(conn: &Connection, table: &str, column: &str, column_def: &str) -> Result<()> {
  if !column_exists(conn, table, column) {
    conn.execute(
      &format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, column_def),
      [],
    )?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_migrations_are_idempotent() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    run_migrations(&conn).unwrap();
    assert!(column_exists(&conn, "user_progress", "streak_count"));
  }

  #[test]
  fn test_upgrades_old_profiles_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn
      .execute_batch("CREATE TABLE user_profiles (user_id TEXT PRIMARY KEY, review_strategy TEXT);")
      .unwrap();
    conn
      .execute("INSERT INTO user_profiles (user_id, review_strategy) VALUES ('u1', 'sm2')", [])
      .unwrap();

    run_migrations(&conn).unwrap();

    let completed: i64 = conn
      .query_row(
        "SELECT total_sessions_completed FROM user_profiles WHERE user_id = 'u1'",
        [],
        |row| row.get(0),
      )
      .unwrap();
    assert_eq!(completed, 0);
  }
}
