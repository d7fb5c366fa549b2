// ABOUTME: Persistence for per-user streak state, XP totals, and the XP audit ledger
// ABOUTME: Version-checked commits give optimistic concurrency for the XP awarder
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use repforge_core::errors::{AppError, AppResult};
use repforge_core::streak::StreakState;
use repforge_core::xp::XpAction;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::{from_db_key, from_db_timestamp, from_db_uuid, to_db_timestamp};

/// Streak state and XP total with the version used for optimistic updates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserProgress {
    /// Owner
    pub user_id: Uuid,
    /// Streak snapshot
    pub streak: StreakState,
    /// Lifetime XP
    pub total_xp: u64,
    /// Row version, bumped on every commit
    pub version: i64,
}

/// One XP award in the audit ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XpLedgerEntry {
    /// Unique identifier
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Triggering action
    pub action: XpAction,
    /// Base XP before the multiplier
    pub base_xp: u32,
    /// Streak multiplier applied
    pub multiplier: f64,
    /// Final XP credited
    pub awarded_xp: u32,
    /// Streak length after the activity
    pub streak_days: u32,
    /// Workout (or other entity) that triggered the award
    pub source_id: Option<Uuid>,
    /// Award time
    pub created_at: DateTime<Utc>,
}

/// Successor state to write if the stored version still matches
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressCommit {
    /// Version read before evaluating
    pub expected_version: i64,
    /// New streak state
    pub streak: StreakState,
    /// Ledger entry; its `awarded_xp` is added to the total
    pub entry: XpLedgerEntry,
}

/// Storage seam for the XP awarder
#[async_trait]
pub trait StreakStore: Send + Sync {
    /// Load the current progress and version for a user
    async fn load_progress(&self, user_id: Uuid) -> AppResult<UserProgress>;

    /// Atomically write streak state, XP total, and ledger entry.
    /// Returns `false` without writing when the version no longer matches.
    async fn commit_progress(&self, user_id: Uuid, commit: &ProgressCommit) -> AppResult<bool>;
}

/// Manager for streak state and XP
pub struct ProgressManager {
    pool: SqlitePool,
}

impl ProgressManager {
    /// Create a new progress manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Ledger entries for a user, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn history(
        &self,
        user_id: Uuid,
        limit: u32,
        offset: u32,
    ) -> AppResult<Vec<XpLedgerEntry>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, action, base_xp, multiplier, awarded_xp, streak_days, source_id, created_at
            FROM xp_ledger
            WHERE user_id = $1
            ORDER BY created_at DESC, rowid DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(user_id.to_string())
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load XP history: {e}")))?;

        rows.iter().map(row_to_ledger_entry).collect()
    }
}

#[async_trait]
impl StreakStore for ProgressManager {
    async fn load_progress(&self, user_id: Uuid) -> AppResult<UserProgress> {
        let row = sqlx::query(
            r"
            SELECT user_id, current_streak_days, last_activity_at, total_xp, version
            FROM user_progress WHERE user_id = $1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load progress: {e}")))?
        .ok_or_else(|| {
            AppError::not_found("User progress").with_resource_id(user_id.to_string())
        })?;

        row_to_progress(&row)
    }

    async fn commit_progress(&self, user_id: Uuid, commit: &ProgressCommit) -> AppResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let updated = sqlx::query(
            r"
            UPDATE user_progress
            SET current_streak_days = $1,
                last_activity_at = $2,
                total_xp = total_xp + $3,
                version = version + 1
            WHERE user_id = $4 AND version = $5
            ",
        )
        .bind(i64::from(commit.streak.current_streak_days))
        .bind(to_db_timestamp(&commit.streak.last_activity_at))
        .bind(i64::from(commit.entry.awarded_xp))
        .bind(user_id.to_string())
        .bind(commit.expected_version)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to update progress: {e}")))?;

        if updated.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| AppError::database(format!("Failed to roll back: {e}")))?;
            return Ok(false);
        }

        let entry = &commit.entry;
        sqlx::query(
            r"
            INSERT INTO xp_ledger (id, user_id, action, base_xp, multiplier, awarded_xp, streak_days, source_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(entry.id.to_string())
        .bind(user_id.to_string())
        .bind(entry.action.as_str())
        .bind(i64::from(entry.base_xp))
        .bind(entry.multiplier)
        .bind(i64::from(entry.awarded_xp))
        .bind(i64::from(entry.streak_days))
        .bind(entry.source_id.map(|id| id.to_string()))
        .bind(to_db_timestamp(&entry.created_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to record XP ledger entry: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit progress: {e}")))?;

        Ok(true)
    }
}

fn row_to_progress(row: &SqliteRow) -> AppResult<UserProgress> {
    let user_id: String = row.get("user_id");
    let current_streak_days: i64 = row.get("current_streak_days");
    let last_activity_at: String = row.get("last_activity_at");
    let total_xp: i64 = row.get("total_xp");

    Ok(UserProgress {
        user_id: from_db_uuid(&user_id)?,
        streak: StreakState {
            current_streak_days: u32::try_from(current_streak_days).unwrap_or(0),
            last_activity_at: from_db_timestamp(&last_activity_at)?,
        },
        total_xp: u64::try_from(total_xp).unwrap_or(0),
        version: row.get("version"),
    })
}

fn row_to_ledger_entry(row: &SqliteRow) -> AppResult<XpLedgerEntry> {
    let id: String = row.get("id");
    let user_id: String = row.get("user_id");
    let action: String = row.get("action");
    let base_xp: i64 = row.get("base_xp");
    let awarded_xp: i64 = row.get("awarded_xp");
    let streak_days: i64 = row.get("streak_days");
    let source_id: Option<String> = row.get("source_id");
    let created_at: String = row.get("created_at");

    Ok(XpLedgerEntry {
        id: from_db_uuid(&id)?,
        user_id: from_db_uuid(&user_id)?,
        action: from_db_key(&action, "action")?,
        base_xp: u32::try_from(base_xp).unwrap_or(0),
        multiplier: row.get("multiplier"),
        awarded_xp: u32::try_from(awarded_xp).unwrap_or(0),
        streak_days: u32::try_from(streak_days).unwrap_or(0),
        source_id: source_id.as_deref().map(from_db_uuid).transpose()?,
        created_at: from_db_timestamp(&created_at)?,
    })
}
