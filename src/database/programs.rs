// ABOUTME: Database operations for training programs and user enrollments
// ABOUTME: Programs store their ordered sessions as JSON; enrollments are a user/program join table
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use repforge_core::errors::{AppError, AppResult};
use repforge_core::taxonomy::Level;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::{from_db_key, from_db_timestamp, from_db_uuid, to_db_timestamp};

/// One prescribed exercise inside a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionExercise {
    /// Catalog exercise
    pub exercise_id: Uuid,
    /// Number of sets
    pub sets: u32,
    /// Target reps per set
    pub reps: u32,
    /// Rest between sets
    #[serde(default)]
    pub rest_seconds: u32,
}

/// One scheduled session of a program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramSession {
    /// Week number, starting at 1
    pub week: u32,
    /// Day within the week, 1 to 7
    pub day: u32,
    /// Session title
    pub title: String,
    /// Prescribed exercises in order
    pub exercises: Vec<SessionExercise>,
}

/// Training program
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    /// Unique identifier
    pub id: Uuid,
    /// Title
    pub title: String,
    /// Optional description
    pub description: Option<String>,
    /// Target level
    pub level: Level,
    /// Length in weeks
    pub duration_weeks: u32,
    /// Sessions per week
    pub sessions_per_week: u32,
    /// Visible to non-admins
    pub is_published: bool,
    /// Ordered sessions
    pub sessions: Vec<ProgramSession>,
    /// Author
    pub created_by: Option<Uuid>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Editable program fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramInput {
    /// Title
    pub title: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Target level
    #[serde(default)]
    pub level: Level,
    /// Length in weeks
    pub duration_weeks: u32,
    /// Sessions per week
    pub sessions_per_week: u32,
    /// Visible to non-admins
    #[serde(default)]
    pub is_published: bool,
    /// Ordered sessions
    #[serde(default)]
    pub sessions: Vec<ProgramSession>,
}

impl ProgramInput {
    /// Validate the structural constraints that do not need the database
    ///
    /// # Errors
    ///
    /// Returns an error describing the first violated constraint
    pub fn validate(&self) -> AppResult<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::missing_field("title"));
        }
        if self.duration_weeks == 0 {
            return Err(AppError::out_of_range("duration_weeks must be >= 1"));
        }
        if !(1..=7).contains(&self.sessions_per_week) {
            return Err(AppError::out_of_range(
                "sessions_per_week must be between 1 and 7",
            ));
        }
        for (index, session) in self.sessions.iter().enumerate() {
            if session.week == 0 || session.week > self.duration_weeks {
                return Err(AppError::out_of_range(format!(
                    "session {index}: week must be between 1 and {}",
                    self.duration_weeks
                )));
            }
            if !(1..=7).contains(&session.day) {
                return Err(AppError::out_of_range(format!(
                    "session {index}: day must be between 1 and 7"
                )));
            }
            if session.title.trim().is_empty() {
                return Err(AppError::missing_field("sessions[].title"));
            }
            if session.exercises.iter().any(|e| e.sets == 0 || e.reps == 0) {
                return Err(AppError::out_of_range(format!(
                    "session {index}: sets and reps must be >= 1"
                )));
            }
        }
        Ok(())
    }

    /// Every exercise ID referenced by the sessions
    #[must_use]
    pub fn exercise_ids(&self) -> Vec<Uuid> {
        self.sessions
            .iter()
            .flat_map(|s| s.exercises.iter().map(|e| e.exercise_id))
            .collect()
    }
}

/// A user's enrollment in a program
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    /// Enrolled program
    pub program_id: Uuid,
    /// Program title at read time
    pub program_title: String,
    /// When the user enrolled
    pub enrolled_at: DateTime<Utc>,
}

/// Manager for programs and enrollments
pub struct ProgramManager {
    pool: SqlitePool,
}

const PROGRAM_COLUMNS: &str = r"
    id, title, description, level, duration_weeks, sessions_per_week, is_published,
    sessions, created_by, created_at, updated_at
";

impl ProgramManager {
    /// Create a new program manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a program by ID
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get(&self, id: Uuid) -> AppResult<Option<Program>> {
        let query = format!("SELECT {PROGRAM_COLUMNS} FROM programs WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get program: {e}")))?;

        row.map(|r| row_to_program(&r)).transpose()
    }

    /// List programs, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list(&self, published_only: bool) -> AppResult<Vec<Program>> {
        let where_clause = if published_only {
            "WHERE is_published = 1"
        } else {
            ""
        };
        let query = format!(
            "SELECT {PROGRAM_COLUMNS} FROM programs {where_clause} ORDER BY created_at DESC"
        );
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list programs: {e}")))?;

        rows.iter().map(row_to_program).collect()
    }

    /// Create a program. Callers validate exercise references first.
    ///
    /// # Errors
    ///
    /// Returns a validation error or a database error
    pub async fn create(&self, input: ProgramInput, created_by: Uuid) -> AppResult<Program> {
        input.validate()?;
        let now = Utc::now();
        let program = build_program(Uuid::new_v4(), input, Some(created_by), now, now);

        sqlx::query(
            r"
            INSERT INTO programs (
                id, title, description, level, duration_weeks, sessions_per_week,
                is_published, sessions, created_by, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ",
        )
        .bind(program.id.to_string())
        .bind(&program.title)
        .bind(&program.description)
        .bind(program.level.as_str())
        .bind(i64::from(program.duration_weeks))
        .bind(i64::from(program.sessions_per_week))
        .bind(program.is_published)
        .bind(serde_json::to_string(&program.sessions)?)
        .bind(program.created_by.map(|id| id.to_string()))
        .bind(to_db_timestamp(&program.created_at))
        .bind(to_db_timestamp(&program.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create program: {e}")))?;

        Ok(program)
    }

    /// Replace a program's editable fields
    ///
    /// # Errors
    ///
    /// Returns a validation error, `ResourceNotFound`, or a database error
    pub async fn update(&self, id: Uuid, input: ProgramInput) -> AppResult<Program> {
        input.validate()?;
        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found("Program").with_resource_id(id.to_string()))?;
        let program = build_program(
            id,
            input,
            existing.created_by,
            existing.created_at,
            Utc::now(),
        );

        sqlx::query(
            r"
            UPDATE programs SET
                title = $1, description = $2, level = $3, duration_weeks = $4,
                sessions_per_week = $5, is_published = $6, sessions = $7, updated_at = $8
            WHERE id = $9
            ",
        )
        .bind(&program.title)
        .bind(&program.description)
        .bind(program.level.as_str())
        .bind(i64::from(program.duration_weeks))
        .bind(i64::from(program.sessions_per_week))
        .bind(program.is_published)
        .bind(serde_json::to_string(&program.sessions)?)
        .bind(to_db_timestamp(&program.updated_at))
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update program: {e}")))?;

        Ok(program)
    }

    /// Delete a program and its enrollments
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM programs WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete program: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// Enroll a user in a program
    ///
    /// # Errors
    ///
    /// Returns `ResourceConflict` if already enrolled, or a database error
    pub async fn enroll(&self, user_id: Uuid, program: &Program) -> AppResult<Enrollment> {
        let enrolled_at = Utc::now();
        sqlx::query(
            "INSERT INTO program_enrollments (user_id, program_id, enrolled_at) VALUES ($1, $2, $3)",
        )
        .bind(user_id.to_string())
        .bind(program.id.to_string())
        .bind(to_db_timestamp(&enrolled_at))
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::conflict("Already enrolled in this program")
            }
            other => AppError::database(format!("Failed to enroll: {other}")),
        })?;

        Ok(Enrollment {
            program_id: program.id,
            program_title: program.title.clone(),
            enrolled_at,
        })
    }

    /// Remove an enrollment
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn unenroll(&self, user_id: Uuid, program_id: Uuid) -> AppResult<bool> {
        let result =
            sqlx::query("DELETE FROM program_enrollments WHERE user_id = $1 AND program_id = $2")
                .bind(user_id.to_string())
                .bind(program_id.to_string())
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to unenroll: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether a user is enrolled in a program
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn is_enrolled(&self, user_id: Uuid, program_id: Uuid) -> AppResult<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM program_enrollments WHERE user_id = $1 AND program_id = $2",
        )
        .bind(user_id.to_string())
        .bind(program_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to check enrollment: {e}")))?;

        Ok(found.is_some())
    }

    /// A user's enrollments, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn enrollments_for(&self, user_id: Uuid) -> AppResult<Vec<Enrollment>> {
        let rows = sqlx::query(
            r"
            SELECT e.program_id, p.title, e.enrolled_at
            FROM program_enrollments e
            JOIN programs p ON p.id = e.program_id
            WHERE e.user_id = $1
            ORDER BY e.enrolled_at DESC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list enrollments: {e}")))?;

        rows.iter()
            .map(|row| {
                let program_id: String = row.get("program_id");
                let enrolled_at: String = row.get("enrolled_at");
                Ok(Enrollment {
                    program_id: from_db_uuid(&program_id)?,
                    program_title: row.get("title"),
                    enrolled_at: from_db_timestamp(&enrolled_at)?,
                })
            })
            .collect()
    }
}

fn build_program(
    id: Uuid,
    input: ProgramInput,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Program {
    let mut sessions = input.sessions;
    sessions.sort_by_key(|s| (s.week, s.day));
    Program {
        id,
        title: input.title.trim().to_owned(),
        description: input.description.filter(|d| !d.trim().is_empty()),
        level: input.level,
        duration_weeks: input.duration_weeks,
        sessions_per_week: input.sessions_per_week,
        is_published: input.is_published,
        sessions,
        created_by,
        created_at,
        updated_at,
    }
}

fn row_to_program(row: &SqliteRow) -> AppResult<Program> {
    let id: String = row.get("id");
    let level: String = row.get("level");
    let duration_weeks: i64 = row.get("duration_weeks");
    let sessions_per_week: i64 = row.get("sessions_per_week");
    let sessions_json: String = row.get("sessions");
    let created_by: Option<String> = row.get("created_by");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Program {
        id: from_db_uuid(&id)?,
        title: row.get("title"),
        description: row.get("description"),
        level: from_db_key(&level, "level")?,
        duration_weeks: u32::try_from(duration_weeks).unwrap_or(1),
        sessions_per_week: u32::try_from(sessions_per_week).unwrap_or(1),
        is_published: row.get("is_published"),
        sessions: serde_json::from_str(&sessions_json)?,
        created_by: created_by.as_deref().map(from_db_uuid).transpose()?,
        created_at: from_db_timestamp(&created_at)?,
        updated_at: from_db_timestamp(&updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> ProgramInput {
        ProgramInput {
            title: "Starter Strength".into(),
            description: None,
            level: Level::Beginner,
            duration_weeks: 4,
            sessions_per_week: 3,
            is_published: true,
            sessions: vec![ProgramSession {
                week: 1,
                day: 1,
                title: "Day A".into(),
                exercises: vec![SessionExercise {
                    exercise_id: Uuid::new_v4(),
                    sets: 3,
                    reps: 5,
                    rest_seconds: 120,
                }],
            }],
        }
    }

    #[test]
    fn test_program_validation() {
        assert!(input().validate().is_ok());

        let mut bad = input();
        bad.sessions_per_week = 8;
        assert!(bad.validate().is_err());

        let mut bad = input();
        bad.sessions[0].week = 5;
        assert!(bad.validate().is_err());

        let mut bad = input();
        bad.sessions[0].exercises[0].reps = 0;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_exercise_ids_flatten_sessions() {
        assert_eq!(input().exercise_ids().len(), 1);
    }
}
