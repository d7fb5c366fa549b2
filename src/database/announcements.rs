// ABOUTME: Database operations for site-wide announcements
// ABOUTME: Active-window listing for members plus admin create, update, and delete
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use repforge_core::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::{from_db_timestamp, from_db_timestamp_opt, from_db_uuid, to_db_timestamp};

/// Announcement shown to all members while active
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
    /// Unique identifier
    pub id: Uuid,
    /// Title
    pub title: String,
    /// Body text
    pub body: String,
    /// Visible from
    pub published_at: DateTime<Utc>,
    /// Hidden after
    pub expires_at: Option<DateTime<Utc>>,
    /// Author
    pub created_by: Option<Uuid>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Editable announcement fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncementInput {
    /// Title
    pub title: String,
    /// Body text
    pub body: String,
    /// Visible from; defaults to now
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Hidden after
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl AnnouncementInput {
    /// Validate against the effective publish time
    ///
    /// # Errors
    ///
    /// Returns an error if title or body is blank, or `expires_at` does not follow
    /// `published_at`
    pub fn validate(&self, published_at: DateTime<Utc>) -> AppResult<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::missing_field("title"));
        }
        if self.body.trim().is_empty() {
            return Err(AppError::missing_field("body"));
        }
        if let Some(expires_at) = self.expires_at {
            if expires_at <= published_at {
                return Err(AppError::invalid_input(
                    "expires_at must be after published_at",
                ));
            }
        }
        Ok(())
    }
}

/// Manager for announcements
pub struct AnnouncementManager {
    pool: SqlitePool,
}

const ANNOUNCEMENT_COLUMNS: &str =
    "id, title, body, published_at, expires_at, created_by, created_at, updated_at";

impl AnnouncementManager {
    /// Create a new announcement manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Announcements visible at `now`, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list_active(&self, now: DateTime<Utc>) -> AppResult<Vec<Announcement>> {
        let now = to_db_timestamp(&now);
        let query = format!(
            r"
            SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements
            WHERE published_at <= $1 AND (expires_at IS NULL OR expires_at > $1)
            ORDER BY published_at DESC
            "
        );
        let rows = sqlx::query(&query)
            .bind(&now)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list announcements: {e}")))?;

        rows.iter().map(row_to_announcement).collect()
    }

    /// Every announcement including scheduled and expired ones, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list_all(&self) -> AppResult<Vec<Announcement>> {
        let query =
            format!("SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements ORDER BY published_at DESC");
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list announcements: {e}")))?;

        rows.iter().map(row_to_announcement).collect()
    }

    /// Get an announcement by ID
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get(&self, id: Uuid) -> AppResult<Option<Announcement>> {
        let query = format!("SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get announcement: {e}")))?;

        row.map(|r| row_to_announcement(&r)).transpose()
    }

    /// Create an announcement
    ///
    /// # Errors
    ///
    /// Returns a validation error or a database error
    pub async fn create(
        &self,
        input: AnnouncementInput,
        created_by: Uuid,
    ) -> AppResult<Announcement> {
        let now = Utc::now();
        let published_at = input.published_at.unwrap_or(now);
        input.validate(published_at)?;

        let announcement = Announcement {
            id: Uuid::new_v4(),
            title: input.title.trim().to_owned(),
            body: input.body,
            published_at,
            expires_at: input.expires_at,
            created_by: Some(created_by),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r"
            INSERT INTO announcements (id, title, body, published_at, expires_at, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(announcement.id.to_string())
        .bind(&announcement.title)
        .bind(&announcement.body)
        .bind(to_db_timestamp(&announcement.published_at))
        .bind(announcement.expires_at.as_ref().map(to_db_timestamp))
        .bind(created_by.to_string())
        .bind(to_db_timestamp(&now))
        .bind(to_db_timestamp(&now))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create announcement: {e}")))?;

        Ok(announcement)
    }

    /// Replace an announcement's editable fields
    ///
    /// # Errors
    ///
    /// Returns a validation error, `ResourceNotFound`, or a database error
    pub async fn update(&self, id: Uuid, input: AnnouncementInput) -> AppResult<Announcement> {
        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found("Announcement").with_resource_id(id.to_string()))?;
        let published_at = input.published_at.unwrap_or(existing.published_at);
        input.validate(published_at)?;

        let announcement = Announcement {
            title: input.title.trim().to_owned(),
            body: input.body,
            published_at,
            expires_at: input.expires_at,
            updated_at: Utc::now(),
            ..existing
        };

        sqlx::query(
            r"
            UPDATE announcements
            SET title = $1, body = $2, published_at = $3, expires_at = $4, updated_at = $5
            WHERE id = $6
            ",
        )
        .bind(&announcement.title)
        .bind(&announcement.body)
        .bind(to_db_timestamp(&announcement.published_at))
        .bind(announcement.expires_at.as_ref().map(to_db_timestamp))
        .bind(to_db_timestamp(&announcement.updated_at))
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update announcement: {e}")))?;

        Ok(announcement)
    }

    /// Delete an announcement
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM announcements WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete announcement: {e}")))?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_announcement(row: &SqliteRow) -> AppResult<Announcement> {
    let id: String = row.get("id");
    let published_at: String = row.get("published_at");
    let expires_at: Option<String> = row.get("expires_at");
    let created_by: Option<String> = row.get("created_by");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Announcement {
        id: from_db_uuid(&id)?,
        title: row.get("title"),
        body: row.get("body"),
        published_at: from_db_timestamp(&published_at)?,
        expires_at: from_db_timestamp_opt(expires_at)?,
        created_by: created_by.as_deref().map(from_db_uuid).transpose()?,
        created_at: from_db_timestamp(&created_at)?,
        updated_at: from_db_timestamp(&updated_at)?,
    })
}
