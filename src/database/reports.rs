// ABOUTME: Database operations for user-filed content reports and their moderation
// ABOUTME: Filing, per-reporter listing, status-filtered admin listing, and resolution
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use repforge_core::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

use super::{from_db_key, from_db_timestamp, from_db_timestamp_opt, from_db_uuid, to_db_timestamp};

/// Longest accepted report details
pub const MAX_REPORT_DETAILS_LEN: usize = 2000;

/// Generates `as_str` and strict `FromStr` for a report enum
macro_rules! report_enum {
    ($ty:ident, $label:literal, { $($variant:ident => $key:literal),+ $(,)? }) => {
        impl $ty {
            /// Convert to database string representation
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $key,)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($key => Ok(Self::$variant),)+
                    other => Err(AppError::invalid_input(format!("Invalid {}: {other}", $label))),
                }
            }
        }
    };
}

/// What is being reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportTargetType {
    /// Catalog exercise
    Exercise,
    /// Program
    Program,
    /// Another user
    User,
    /// Anything else
    Other,
}

report_enum!(ReportTargetType, "report target type", {
    Exercise => "exercise",
    Program => "program",
    User => "user",
    Other => "other",
});

/// Why it is being reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportReason {
    /// Spam
    Spam,
    /// Inappropriate content
    Inappropriate,
    /// Factually incorrect
    Incorrect,
    /// Anything else
    Other,
}

report_enum!(ReportReason, "report reason", {
    Spam => "spam",
    Inappropriate => "inappropriate",
    Incorrect => "incorrect",
    Other => "other",
});

/// Moderation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Awaiting moderation
    Open,
    /// Acted upon
    Resolved,
    /// Closed without action
    Dismissed,
}

report_enum!(ReportStatus, "report status", {
    Open => "open",
    Resolved => "resolved",
    Dismissed => "dismissed",
});

/// Filed report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Unique identifier
    pub id: Uuid,
    /// Filing user
    pub reporter_id: Uuid,
    /// Target kind
    pub target_type: ReportTargetType,
    /// Target identifier
    pub target_id: Option<String>,
    /// Reason
    pub reason: ReportReason,
    /// Free-form details
    pub details: Option<String>,
    /// Moderation status
    pub status: ReportStatus,
    /// Moderator note
    pub resolution_note: Option<String>,
    /// Moderator
    pub resolved_by: Option<Uuid>,
    /// When it was closed
    pub resolved_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Fields needed to file a report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportInput {
    /// Target kind
    pub target_type: ReportTargetType,
    /// Target identifier
    #[serde(default)]
    pub target_id: Option<String>,
    /// Reason
    pub reason: ReportReason,
    /// Free-form details
    #[serde(default)]
    pub details: Option<String>,
}

impl ReportInput {
    /// Validate the input
    ///
    /// # Errors
    ///
    /// Returns an error if details are too long or a non-`other` target has no ID
    pub fn validate(&self) -> AppResult<()> {
        if self
            .details
            .as_ref()
            .is_some_and(|d| d.chars().count() > MAX_REPORT_DETAILS_LEN)
        {
            return Err(AppError::out_of_range(format!(
                "details must be at most {MAX_REPORT_DETAILS_LEN} characters"
            )));
        }
        if self.target_type != ReportTargetType::Other
            && self.target_id.as_deref().map_or(true, |t| t.trim().is_empty())
        {
            return Err(AppError::missing_field("target_id"));
        }
        Ok(())
    }
}

/// Manager for reports
pub struct ReportManager {
    pool: SqlitePool,
}

const REPORT_COLUMNS: &str = r"
    id, reporter_id, target_type, target_id, reason, details, status,
    resolution_note, resolved_by, resolved_at, created_at
";

impl ReportManager {
    /// Create a new report manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// File a report
    ///
    /// # Errors
    ///
    /// Returns a validation error or a database error
    pub async fn create(&self, reporter_id: Uuid, input: ReportInput) -> AppResult<Report> {
        input.validate()?;
        let report = Report {
            id: Uuid::new_v4(),
            reporter_id,
            target_type: input.target_type,
            target_id: input.target_id.map(|t| t.trim().to_owned()),
            reason: input.reason,
            details: input.details.filter(|d| !d.trim().is_empty()),
            status: ReportStatus::Open,
            resolution_note: None,
            resolved_by: None,
            resolved_at: None,
            created_at: Utc::now(),
        };

        sqlx::query(
            r"
            INSERT INTO reports (id, reporter_id, target_type, target_id, reason, details, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(report.id.to_string())
        .bind(reporter_id.to_string())
        .bind(report.target_type.as_str())
        .bind(&report.target_id)
        .bind(report.reason.as_str())
        .bind(&report.details)
        .bind(report.status.as_str())
        .bind(to_db_timestamp(&report.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create report: {e}")))?;

        Ok(report)
    }

    /// Get a report by ID
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get(&self, id: Uuid) -> AppResult<Option<Report>> {
        let query = format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get report: {e}")))?;

        row.map(|r| row_to_report(&r)).transpose()
    }

    /// Reports filed by a user, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list_for_reporter(&self, reporter_id: Uuid) -> AppResult<Vec<Report>> {
        let query = format!(
            "SELECT {REPORT_COLUMNS} FROM reports WHERE reporter_id = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query(&query)
            .bind(reporter_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list reports: {e}")))?;

        rows.iter().map(row_to_report).collect()
    }

    /// Every report, optionally filtered by status, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list(&self, status: Option<ReportStatus>) -> AppResult<Vec<Report>> {
        let rows = if let Some(status) = status {
            let query = format!(
                "SELECT {REPORT_COLUMNS} FROM reports WHERE status = $1 ORDER BY created_at ASC"
            );
            sqlx::query(&query)
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await
        } else {
            let query = format!("SELECT {REPORT_COLUMNS} FROM reports ORDER BY created_at ASC");
            sqlx::query(&query).fetch_all(&self.pool).await
        }
        .map_err(|e| AppError::database(format!("Failed to list reports: {e}")))?;

        rows.iter().map(row_to_report).collect()
    }

    /// Close a report
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error when `status` is `open`, `ResourceNotFound`,
    /// or a database error
    pub async fn resolve(
        &self,
        id: Uuid,
        status: ReportStatus,
        resolution_note: Option<String>,
        resolved_by: Uuid,
    ) -> AppResult<Report> {
        if status == ReportStatus::Open {
            return Err(AppError::invalid_input(
                "status must be resolved or dismissed",
            ));
        }

        let result = sqlx::query(
            r"
            UPDATE reports
            SET status = $1, resolution_note = $2, resolved_by = $3, resolved_at = $4
            WHERE id = $5
            ",
        )
        .bind(status.as_str())
        .bind(resolution_note.filter(|n| !n.trim().is_empty()))
        .bind(resolved_by.to_string())
        .bind(to_db_timestamp(&Utc::now()))
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to resolve report: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Report").with_resource_id(id.to_string()));
        }

        self.get(id)
            .await?
            .ok_or_else(|| AppError::not_found("Report").with_resource_id(id.to_string()))
    }
}

fn row_to_report(row: &SqliteRow) -> AppResult<Report> {
    let id: String = row.get("id");
    let reporter_id: String = row.get("reporter_id");
    let target_type: String = row.get("target_type");
    let reason: String = row.get("reason");
    let status: String = row.get("status");
    let resolved_by: Option<String> = row.get("resolved_by");
    let resolved_at: Option<String> = row.get("resolved_at");
    let created_at: String = row.get("created_at");

    Ok(Report {
        id: from_db_uuid(&id)?,
        reporter_id: from_db_uuid(&reporter_id)?,
        target_type: from_db_key(&target_type, "target type")?,
        target_id: row.get("target_id"),
        reason: from_db_key(&reason, "reason")?,
        details: row.get("details"),
        status: from_db_key(&status, "status")?,
        resolution_note: row.get("resolution_note"),
        resolved_by: resolved_by.as_deref().map(from_db_uuid).transpose()?,
        resolved_at: from_db_timestamp_opt(resolved_at)?,
        created_at: from_db_timestamp(&created_at)?,
    })
}
