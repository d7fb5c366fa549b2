// ABOUTME: Database connection management, schema migrations, and per-domain managers
// ABOUTME: SQLite pool setup with timestamp helpers shared by every manager
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Database Management
//!
//! [`Database`] owns the `SQLite` pool and runs idempotent migrations on startup.
//! Each domain has its own manager constructed from a clone of the pool.

/// Announcement storage
pub mod announcements;
/// Exercise catalog storage
pub mod exercises;
/// User notification storage
pub mod notifications;
/// Program catalog and enrollment storage
pub mod programs;
/// Streak state, XP totals, and the XP ledger
pub mod progress;
/// Content report storage
pub mod reports;
/// User account storage
pub mod users;
/// Workout log storage
pub mod workouts;

pub use announcements::AnnouncementManager;
pub use exercises::ExerciseManager;
pub use notifications::NotificationManager;
pub use programs::ProgramManager;
pub use progress::ProgressManager;
pub use reports::ReportManager;
pub use users::UserManager;
pub use workouts::WorkoutManager;

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use repforge_core::errors::{AppError, AppResult};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Schema, applied in order on every startup
const MIGRATIONS: &[(&str, &str)] = &[
    (
        "users",
        r"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE COLLATE NOCASE,
            password_hash TEXT NOT NULL,
            display_name TEXT,
            role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'admin')),
            language TEXT NOT NULL DEFAULT 'en',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        ",
    ),
    (
        "user_progress",
        r"
        CREATE TABLE IF NOT EXISTS user_progress (
            user_id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
            current_streak_days INTEGER NOT NULL DEFAULT 0 CHECK (current_streak_days >= 0),
            last_activity_at TEXT NOT NULL,
            total_xp INTEGER NOT NULL DEFAULT 0 CHECK (total_xp >= 0),
            version INTEGER NOT NULL DEFAULT 0
        )
        ",
    ),
    (
        "xp_ledger",
        r"
        CREATE TABLE IF NOT EXISTS xp_ledger (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            action TEXT NOT NULL,
            base_xp INTEGER NOT NULL,
            multiplier REAL NOT NULL,
            awarded_xp INTEGER NOT NULL,
            streak_days INTEGER NOT NULL,
            source_id TEXT,
            created_at TEXT NOT NULL
        )
        ",
    ),
    (
        "idx_xp_ledger_user",
        "CREATE INDEX IF NOT EXISTS idx_xp_ledger_user ON xp_ledger(user_id, created_at)",
    ),
    (
        "exercises",
        r"
        CREATE TABLE IF NOT EXISTS exercises (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE COLLATE NOCASE,
            description TEXT,
            category TEXT NOT NULL,
            level TEXT NOT NULL,
            force TEXT,
            mechanic TEXT,
            equipment TEXT,
            primary_muscles TEXT NOT NULL,
            secondary_muscles TEXT NOT NULL DEFAULT '[]',
            instructions TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        ",
    ),
    (
        "programs",
        r"
        CREATE TABLE IF NOT EXISTS programs (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            level TEXT NOT NULL,
            duration_weeks INTEGER NOT NULL CHECK (duration_weeks >= 1),
            sessions_per_week INTEGER NOT NULL CHECK (sessions_per_week BETWEEN 1 AND 7),
            is_published INTEGER NOT NULL DEFAULT 0,
            sessions TEXT NOT NULL DEFAULT '[]',
            created_by TEXT REFERENCES users(id) ON DELETE SET NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        ",
    ),
    (
        "program_enrollments",
        r"
        CREATE TABLE IF NOT EXISTS program_enrollments (
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            program_id TEXT NOT NULL REFERENCES programs(id) ON DELETE CASCADE,
            enrolled_at TEXT NOT NULL,
            PRIMARY KEY (user_id, program_id)
        )
        ",
    ),
    (
        "workouts",
        r"
        CREATE TABLE IF NOT EXISTS workouts (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            notes TEXT,
            program_id TEXT REFERENCES programs(id) ON DELETE SET NULL,
            session_index INTEGER,
            sets TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            completed_at TEXT
        )
        ",
    ),
    (
        "idx_workouts_user",
        "CREATE INDEX IF NOT EXISTS idx_workouts_user ON workouts(user_id, created_at)",
    ),
    (
        "announcements",
        r"
        CREATE TABLE IF NOT EXISTS announcements (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            published_at TEXT NOT NULL,
            expires_at TEXT,
            created_by TEXT REFERENCES users(id) ON DELETE SET NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        ",
    ),
    (
        "notifications",
        r"
        CREATE TABLE IF NOT EXISTS notifications (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            kind TEXT NOT NULL,
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            data TEXT,
            read_at TEXT,
            created_at TEXT NOT NULL
        )
        ",
    ),
    (
        "idx_notifications_user",
        "CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id, created_at)",
    ),
    (
        "reports",
        r"
        CREATE TABLE IF NOT EXISTS reports (
            id TEXT PRIMARY KEY,
            reporter_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            target_type TEXT NOT NULL,
            target_id TEXT,
            reason TEXT NOT NULL,
            details TEXT,
            status TEXT NOT NULL DEFAULT 'open',
            resolution_note TEXT,
            resolved_by TEXT REFERENCES users(id) ON DELETE SET NULL,
            resolved_at TEXT,
            created_at TEXT NOT NULL
        )
        ",
    ),
];

/// Database manager owning the connection pool
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the database and run migrations
    ///
    /// In-memory URLs get a single connection that never expires, since every new
    /// connection to `:memory:` would see an empty database.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the connection fails, or a migration fails
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let is_memory = database_url.contains(":memory:");
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::config(format!("Invalid DATABASE_URL: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true);

        if !is_memory {
            if let Some(parent) = options.get_filename().parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await.map_err(|e| {
                        AppError::database(format!("Failed to create database directory: {e}"))
                    })?;
                }
            }
        }

        let pool_options = if is_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
                .max_connections(8)
                .acquire_timeout(Duration::from_secs(10))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to database: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;
        info!(memory = is_memory, "Database ready");
        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails
    pub async fn migrate(&self) -> AppResult<()> {
        for (name, statement) in MIGRATIONS {
            debug!(migration = name, "Applying migration");
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Migration {name} failed: {e}")))?;
        }
        Ok(())
    }

    /// Cheap liveness probe used by the readiness endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot serve a query
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Database ping failed: {e}")))?;
        Ok(())
    }

    /// User manager
    #[must_use]
    pub fn users(&self) -> UserManager {
        UserManager::new(self.pool.clone())
    }

    /// Exercise manager
    #[must_use]
    pub fn exercises(&self) -> ExerciseManager {
        ExerciseManager::new(self.pool.clone())
    }

    /// Program manager
    #[must_use]
    pub fn programs(&self) -> ProgramManager {
        ProgramManager::new(self.pool.clone())
    }

    /// Workout manager
    #[must_use]
    pub fn workouts(&self) -> WorkoutManager {
        WorkoutManager::new(self.pool.clone())
    }

    /// Progress manager
    #[must_use]
    pub fn progress(&self) -> ProgressManager {
        ProgressManager::new(self.pool.clone())
    }

    /// Announcement manager
    #[must_use]
    pub fn announcements(&self) -> AnnouncementManager {
        AnnouncementManager::new(self.pool.clone())
    }

    /// Notification manager
    #[must_use]
    pub fn notifications(&self) -> NotificationManager {
        NotificationManager::new(self.pool.clone())
    }

    /// Report manager
    #[must_use]
    pub fn reports(&self) -> ReportManager {
        ReportManager::new(self.pool.clone())
    }
}

/// Fixed-width UTC timestamp so text ordering matches time ordering
pub(crate) fn to_db_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp
pub(crate) fn from_db_timestamp(raw: &str) -> AppResult<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

/// Parse an optional stored timestamp
pub(crate) fn from_db_timestamp_opt(raw: Option<String>) -> AppResult<Option<DateTime<Utc>>> {
    raw.as_deref().map(from_db_timestamp).transpose()
}

/// Parse a stored UUID
pub(crate) fn from_db_uuid(raw: &str) -> AppResult<uuid::Uuid> {
    uuid::Uuid::parse_str(raw)
        .map_err(|e| AppError::database(format!("Invalid stored identifier {raw}: {e}")))
}

/// Parse a stored taxonomy or enum key
pub(crate) fn from_db_key<T: FromStr>(raw: &str, column: &str) -> AppResult<T> {
    raw.parse()
        .map_err(|_| AppError::database(format!("Invalid stored {column}: {raw}")))
}
