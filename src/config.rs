//! Application configuration constants.
//!
//! This module centralizes the tunable values used by the scheduler,
//! the progress tracker and the server.

use serde::Deserialize;
use std::path::PathBuf;

use crate::paths;

// ==================== Database Configuration ====================

/// Configuration file structure for config.toml
#[derive(Debug, Deserialize)]
struct AppConfig {
    database: Option<DatabaseConfig>,
}

#[derive(Debug, Deserialize)]
struct DatabaseConfig {
    path: Option<String>,
}

/// Load database path with priority: config.toml > .env > default
pub fn load_database_path() -> PathBuf {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Priority 1: config.toml
    if let Some(path) = std::fs::read_to_string("config.toml")
        .ok()
        .and_then(|contents| database_path_from_toml(&contents))
    {
        tracing::info!("Using database from config.toml: {}", path.display());
        return path;
    }

    // Priority 2: .env DATABASE_PATH
    if let Ok(path) = std::env::var("DATABASE_PATH") {
        tracing::info!("Using database from DATABASE_PATH env: {}", path);
        return PathBuf::from(path);
    }

    // Default
    let default = PathBuf::from(paths::db_path());
    tracing::info!("Using default database path: {}", default.display());
    default
}

fn database_path_from_toml(contents: &str) -> Option<PathBuf> {
    match toml::from_str::<AppConfig>(contents) {
        Ok(config) => config.database.and_then(|db| db.path).map(PathBuf::from),
        Err(e) => {
            tracing::warn!("Ignoring unreadable config.toml: {}", e);
            None
        }
    }
}

// ==================== Server Configuration ====================

/// Server address to bind to
pub const SERVER_ADDR: &str = "0.0.0.0";

/// Default server port
pub const SERVER_PORT: u16 = 3000;

/// Server port, overridable with the PORT env var
pub fn server_port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(SERVER_PORT)
}

/// Get the full server bind address
pub fn server_bind_addr() -> String {
    format!("{}:{}", SERVER_ADDR, server_port())
}

// ==================== Session Configuration ====================

/// Hours of inactivity after which an unfinished study session is dropped
/// from memory (the stored record stays open)
pub const SESSION_EXPIRY_HOURS: i64 = 2;

/// Probability threshold for session cleanup (0-255, lower = more frequent)
/// Value of 25 means ~10% chance (25/256) on each registry access
pub const SESSION_CLEANUP_THRESHOLD: u8 = 25;

// ==================== Query Limits ====================

/// Default size of the review queue
pub const DEFAULT_DUE_LIMIT: usize = 20;

/// Upper bound on a requested review queue
pub const MAX_DUE_LIMIT: usize = 500;

/// Default number of recent sessions listed
pub const DEFAULT_SESSIONS_LIMIT: usize = 10;

// ==================== Progress Classification ====================

/// Accuracy strictly above this marks a word easy (and eligible to be learned)
pub const EASY_ACCURACY_THRESHOLD: f64 = 0.8;

/// Accuracy strictly below this marks a word hard
pub const HARD_ACCURACY_THRESHOLD: f64 = 0.5;

/// Minimum number of answers before a word can count as learned
pub const LEARNED_MIN_ATTEMPTS: u32 = 5;

// ==================== Scheduling ====================

/// Latest review date the scheduler hands out: 9999-12-31T23:59:59Z, the last
/// instant stored timestamps can hold with a four-digit year
pub const LATEST_REVIEW_TIMESTAMP: i64 = 253_402_300_799;
