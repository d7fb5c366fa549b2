// ABOUTME: Database operations for logged workouts and their completion
// ABOUTME: Owner-scoped CRUD, one-shot completion marking, and personal record detection
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use repforge_core::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::{from_db_timestamp, from_db_timestamp_opt, from_db_uuid, to_db_timestamp};

/// One performed set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSet {
    /// Catalog exercise
    pub exercise_id: Uuid,
    /// Repetitions performed
    #[serde(default)]
    pub reps: Option<u32>,
    /// Load in kilograms
    #[serde(default)]
    pub weight_kg: Option<f64>,
    /// Duration for timed sets
    #[serde(default)]
    pub duration_seconds: Option<u32>,
}

/// Logged workout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    /// Unique identifier
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Title
    pub title: String,
    /// Free-form notes
    pub notes: Option<String>,
    /// Program this workout follows
    pub program_id: Option<Uuid>,
    /// Index into the program's sessions
    pub session_index: Option<u32>,
    /// Performed sets in order
    pub sets: Vec<WorkoutSet>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Completion timestamp
    pub completed_at: Option<DateTime<Utc>>,
}

impl Workout {
    /// Whether the workout has been completed
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Fields needed to log a workout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutInput {
    /// Title
    pub title: String,
    /// Free-form notes
    #[serde(default)]
    pub notes: Option<String>,
    /// Program this workout follows
    #[serde(default)]
    pub program_id: Option<Uuid>,
    /// Index into the program's sessions
    #[serde(default)]
    pub session_index: Option<u32>,
    /// Performed sets
    #[serde(default)]
    pub sets: Vec<WorkoutSet>,
}

impl WorkoutInput {
    /// Validate the input
    ///
    /// # Errors
    ///
    /// Returns an error if the title is blank, a session index is given without a
    /// program, or a set carries a negative or non-finite weight
    pub fn validate(&self) -> AppResult<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::missing_field("title"));
        }
        if self.session_index.is_some() && self.program_id.is_none() {
            return Err(AppError::invalid_input(
                "session_index requires program_id",
            ));
        }
        if self
            .sets
            .iter()
            .filter_map(|s| s.weight_kg)
            .any(|w| !w.is_finite() || w < 0.0)
        {
            return Err(AppError::out_of_range("weight_kg must be a non-negative number"));
        }
        Ok(())
    }

    /// Every exercise ID referenced by the sets
    #[must_use]
    pub fn exercise_ids(&self) -> Vec<Uuid> {
        self.sets.iter().map(|s| s.exercise_id).collect()
    }
}

/// Manager for logged workouts
pub struct WorkoutManager {
    pool: SqlitePool,
}

const WORKOUT_COLUMNS: &str =
    "id, user_id, title, notes, program_id, session_index, sets, created_at, completed_at";

impl WorkoutManager {
    /// Create a new workout manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Log a workout for `user_id`
    ///
    /// # Errors
    ///
    /// Returns a validation error or a database error
    pub async fn create(&self, user_id: Uuid, input: WorkoutInput) -> AppResult<Workout> {
        input.validate()?;
        let workout = Workout {
            id: Uuid::new_v4(),
            user_id,
            title: input.title.trim().to_owned(),
            notes: input.notes.filter(|n| !n.trim().is_empty()),
            program_id: input.program_id,
            session_index: input.session_index,
            sets: input.sets,
            created_at: Utc::now(),
            completed_at: None,
        };

        sqlx::query(
            r"
            INSERT INTO workouts (id, user_id, title, notes, program_id, session_index, sets, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(workout.id.to_string())
        .bind(user_id.to_string())
        .bind(&workout.title)
        .bind(&workout.notes)
        .bind(workout.program_id.map(|id| id.to_string()))
        .bind(workout.session_index.map(i64::from))
        .bind(serde_json::to_string(&workout.sets)?)
        .bind(to_db_timestamp(&workout.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create workout: {e}")))?;

        Ok(workout)
    }

    /// Get a workout owned by `user_id`
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get_for_user(&self, id: Uuid, user_id: Uuid) -> AppResult<Option<Workout>> {
        let query = format!("SELECT {WORKOUT_COLUMNS} FROM workouts WHERE id = $1 AND user_id = $2");
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get workout: {e}")))?;

        row.map(|r| row_to_workout(&r)).transpose()
    }

    /// A user's workouts, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: u32,
        offset: u32,
    ) -> AppResult<Vec<Workout>> {
        let query = format!(
            "SELECT {WORKOUT_COLUMNS} FROM workouts WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query(&query)
            .bind(user_id.to_string())
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list workouts: {e}")))?;

        rows.iter().map(row_to_workout).collect()
    }

    /// Delete a workout owned by `user_id`
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn delete_for_user(&self, id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM workouts WHERE id = $1 AND user_id = $2")
            .bind(id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete workout: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark a workout completed at `completed_at`. Completion happens once.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the workout is not the user's, `ResourceConflict`
    /// if it is already completed, or a database error
    pub async fn mark_completed(
        &self,
        id: Uuid,
        user_id: Uuid,
        completed_at: DateTime<Utc>,
    ) -> AppResult<Workout> {
        let result = sqlx::query(
            "UPDATE workouts SET completed_at = $1 WHERE id = $2 AND user_id = $3 AND completed_at IS NULL",
        )
        .bind(to_db_timestamp(&completed_at))
        .bind(id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to complete workout: {e}")))?;

        let workout = self
            .get_for_user(id, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Workout").with_resource_id(id.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::conflict("Workout is already completed")
                .with_resource_id(id.to_string()));
        }
        Ok(workout)
    }

    /// Undo a completion recorded at `completed_at`, so the workout can be completed again.
    /// Returns `false` when the workout no longer carries that completion.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn reopen(
        &self,
        id: Uuid,
        user_id: Uuid,
        completed_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE workouts SET completed_at = NULL WHERE id = $1 AND user_id = $2 AND completed_at = $3",
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .bind(to_db_timestamp(&completed_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to reopen workout: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// Exercises in `workout` whose heaviest set beats every earlier completed workout
    /// of the same user. First-ever attempts at an exercise do not count.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn personal_records(&self, workout: &Workout) -> AppResult<Vec<Uuid>> {
        let current = heaviest_by_exercise(&workout.sets);
        if current.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT sets FROM workouts WHERE user_id = $1 AND id != $2 AND completed_at IS NOT NULL",
        )
        .bind(workout.user_id.to_string())
        .bind(workout.id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load workout history: {e}")))?;

        let mut previous: HashMap<Uuid, f64> = HashMap::new();
        for row in &rows {
            let sets_json: String = row.get("sets");
            let sets: Vec<WorkoutSet> = serde_json::from_str(&sets_json)?;
            for (exercise_id, weight) in heaviest_by_exercise(&sets) {
                let best = previous.entry(exercise_id).or_insert(weight);
                *best = best.max(weight);
            }
        }

        let mut records: Vec<Uuid> = current
            .into_iter()
            .filter(|(exercise_id, weight)| {
                previous
                    .get(exercise_id)
                    .is_some_and(|best| weight > best)
            })
            .map(|(exercise_id, _)| exercise_id)
            .collect();
        records.sort();
        Ok(records)
    }
}

fn heaviest_by_exercise(sets: &[WorkoutSet]) -> HashMap<Uuid, f64> {
    let mut heaviest: HashMap<Uuid, f64> = HashMap::new();
    for set in sets {
        if let Some(weight) = set.weight_kg {
            let best = heaviest.entry(set.exercise_id).or_insert(weight);
            *best = best.max(weight);
        }
    }
    heaviest
}

fn row_to_workout(row: &SqliteRow) -> AppResult<Workout> {
    let id: String = row.get("id");
    let user_id: String = row.get("user_id");
    let program_id: Option<String> = row.get("program_id");
    let session_index: Option<i64> = row.get("session_index");
    let sets_json: String = row.get("sets");
    let created_at: String = row.get("created_at");
    let completed_at: Option<String> = row.get("completed_at");

    Ok(Workout {
        id: from_db_uuid(&id)?,
        user_id: from_db_uuid(&user_id)?,
        title: row.get("title"),
        notes: row.get("notes"),
        program_id: program_id.as_deref().map(from_db_uuid).transpose()?,
        session_index: session_index.and_then(|i| u32::try_from(i).ok()),
        sets: serde_json::from_str(&sets_json)?,
        created_at: from_db_timestamp(&created_at)?,
        completed_at: from_db_timestamp_opt(completed_at)?,
    })
}
