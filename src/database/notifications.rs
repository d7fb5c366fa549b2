// ABOUTME: Database operations for per-user in-app notifications
// ABOUTME: Creation (single user or broadcast), unread filtering, read marking, and deletion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use repforge_core::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::{from_db_key, from_db_timestamp, from_db_timestamp_opt, from_db_uuid, to_db_timestamp};

/// What a notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Reached a new level
    LevelUp,
    /// Entered a new streak multiplier tier
    StreakMilestone,
    /// New announcement
    Announcement,
    /// A report the user filed was handled
    ReportUpdate,
}

impl NotificationKind {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LevelUp => "level_up",
            Self::StreakMilestone => "streak_milestone",
            Self::Announcement => "announcement",
            Self::ReportUpdate => "report_update",
        }
    }
}

impl Display for NotificationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "level_up" => Ok(Self::LevelUp),
            "streak_milestone" => Ok(Self::StreakMilestone),
            "announcement" => Ok(Self::Announcement),
            "report_update" => Ok(Self::ReportUpdate),
            other => Err(AppError::invalid_input(format!(
                "Invalid notification kind: {other}"
            ))),
        }
    }
}

/// Stored notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique identifier
    pub id: Uuid,
    /// Recipient
    pub user_id: Uuid,
    /// Kind
    pub kind: NotificationKind,
    /// Title
    pub title: String,
    /// Body text
    pub body: String,
    /// Structured payload
    pub data: Option<serde_json::Value>,
    /// When it was read
    pub read_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Notification content before it is addressed
#[derive(Debug, Clone)]
pub struct NewNotification {
    /// Kind
    pub kind: NotificationKind,
    /// Title
    pub title: String,
    /// Body text
    pub body: String,
    /// Structured payload
    pub data: Option<serde_json::Value>,
}

/// Manager for notifications
pub struct NotificationManager {
    pool: SqlitePool,
}

const NOTIFICATION_COLUMNS: &str = "id, user_id, kind, title, body, data, read_at, created_at";

impl NotificationManager {
    /// Create a new notification manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Notify one user
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn create(&self, user_id: Uuid, new: NewNotification) -> AppResult<Notification> {
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id,
            kind: new.kind,
            title: new.title,
            body: new.body,
            data: new.data,
            read_at: None,
            created_at: Utc::now(),
        };
        let data = notification
            .data
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            r"
            INSERT INTO notifications (id, user_id, kind, title, body, data, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(notification.id.to_string())
        .bind(user_id.to_string())
        .bind(notification.kind.as_str())
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(data)
        .bind(to_db_timestamp(&notification.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create notification: {e}")))?;

        Ok(notification)
    }

    /// Notify every user. Returns the number of notifications written.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn broadcast(&self, new: &NewNotification) -> AppResult<u64> {
        let user_ids: Vec<String> = sqlx::query_scalar("SELECT id FROM users")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list recipients: {e}")))?;

        let data = new.data.as_ref().map(serde_json::to_string).transpose()?;
        let created_at = to_db_timestamp(&Utc::now());

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;
        for user_id in &user_ids {
            sqlx::query(
                r"
                INSERT INTO notifications (id, user_id, kind, title, body, data, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(user_id)
            .bind(new.kind.as_str())
            .bind(&new.title)
            .bind(&new.body)
            .bind(&data)
            .bind(&created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to broadcast notification: {e}")))?;
        }
        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit broadcast: {e}")))?;

        Ok(user_ids.len() as u64)
    }

    /// A user's notifications, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: u32,
    ) -> AppResult<Vec<Notification>> {
        let unread_clause = if unread_only { "AND read_at IS NULL" } else { "" };
        let query = format!(
            r"
            SELECT {NOTIFICATION_COLUMNS} FROM notifications
            WHERE user_id = $1 {unread_clause}
            ORDER BY created_at DESC, rowid DESC
            LIMIT $2
            "
        );
        let rows = sqlx::query(&query)
            .bind(user_id.to_string())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list notifications: {e}")))?;

        rows.iter().map(row_to_notification).collect()
    }

    /// Number of unread notifications
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn unread_count(&self, user_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read_at IS NULL",
        )
        .bind(user_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to count notifications: {e}")))
    }

    /// Mark one notification read. Returns `false` if it is not the user's.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn mark_read(&self, id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE notifications SET read_at = COALESCE(read_at, $1)
            WHERE id = $2 AND user_id = $3
            ",
        )
        .bind(to_db_timestamp(&Utc::now()))
        .bind(id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to mark notification read: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark every unread notification read. Returns how many changed.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET read_at = $1 WHERE user_id = $2 AND read_at IS NULL",
        )
        .bind(to_db_timestamp(&Utc::now()))
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to mark notifications read: {e}")))?;

        Ok(result.rows_affected())
    }

    /// Delete a notification. Returns `false` if it is not the user's.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete notification: {e}")))?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_notification(row: &SqliteRow) -> AppResult<Notification> {
    let id: String = row.get("id");
    let user_id: String = row.get("user_id");
    let kind: String = row.get("kind");
    let data: Option<String> = row.get("data");
    let read_at: Option<String> = row.get("read_at");
    let created_at: String = row.get("created_at");

    Ok(Notification {
        id: from_db_uuid(&id)?,
        user_id: from_db_uuid(&user_id)?,
        kind: from_db_key(&kind, "notification kind")?,
        title: row.get("title"),
        body: row.get("body"),
        data: data.as_deref().map(serde_json::from_str).transpose()?,
        read_at: from_db_timestamp_opt(read_at)?,
        created_at: from_db_timestamp(&created_at)?,
    })
}
