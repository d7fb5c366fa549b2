// ABOUTME: Database operations for the exercise catalog
// ABOUTME: Filtered listing over taxonomy columns plus admin create, update, and delete
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use repforge_core::errors::{AppError, AppResult};
use repforge_core::taxonomy::{Equipment, ExerciseCategory, Force, Level, Mechanic, MuscleGroup};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::{from_db_key, from_db_timestamp, from_db_uuid, to_db_timestamp};

/// Default page size for exercise listings
pub const DEFAULT_EXERCISE_LIMIT: u32 = 50;
/// Largest accepted page size
pub const MAX_EXERCISE_LIMIT: u32 = 100;

/// Catalog exercise
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    /// Unique identifier
    pub id: Uuid,
    /// Unique display name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Training discipline
    pub category: ExerciseCategory,
    /// Difficulty
    pub level: Level,
    /// Direction of force
    pub force: Option<Force>,
    /// Joint involvement
    pub mechanic: Option<Mechanic>,
    /// Required equipment
    pub equipment: Option<Equipment>,
    /// Primary muscles (never empty)
    pub primary_muscles: Vec<MuscleGroup>,
    /// Secondary muscles
    pub secondary_muscles: Vec<MuscleGroup>,
    /// Ordered instructions (never empty)
    pub instructions: Vec<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Editable exercise fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseInput {
    /// Unique display name
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Training discipline
    #[serde(default)]
    pub category: ExerciseCategory,
    /// Difficulty
    #[serde(default)]
    pub level: Level,
    /// Direction of force
    #[serde(default)]
    pub force: Option<Force>,
    /// Joint involvement
    #[serde(default)]
    pub mechanic: Option<Mechanic>,
    /// Required equipment
    #[serde(default)]
    pub equipment: Option<Equipment>,
    /// Primary muscles
    pub primary_muscles: Vec<MuscleGroup>,
    /// Secondary muscles
    #[serde(default)]
    pub secondary_muscles: Vec<MuscleGroup>,
    /// Ordered instructions
    pub instructions: Vec<String>,
}

impl ExerciseInput {
    /// Validate the input
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank, no primary muscle is given, or there
    /// are no non-blank instructions
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::missing_field("name"));
        }
        if self.name.trim().len() > 200 {
            return Err(AppError::out_of_range("name must be at most 200 characters"));
        }
        if self.primary_muscles.is_empty() {
            return Err(AppError::invalid_input(
                "At least one primary muscle is required",
            ));
        }
        if self.instructions.iter().all(|s| s.trim().is_empty()) {
            return Err(AppError::invalid_input("At least one instruction is required"));
        }
        Ok(())
    }
}

/// Filter options for listing exercises
#[derive(Debug, Clone, Default)]
pub struct ListExercisesFilter {
    /// Case-insensitive name substring
    pub query: Option<String>,
    /// Primary or secondary muscle
    pub muscle: Option<MuscleGroup>,
    /// Equipment
    pub equipment: Option<Equipment>,
    /// Category
    pub category: Option<ExerciseCategory>,
    /// Level
    pub level: Option<Level>,
    /// Force
    pub force: Option<Force>,
    /// Mechanic
    pub mechanic: Option<Mechanic>,
    /// Maximum number of results
    pub limit: Option<u32>,
    /// Offset for pagination
    pub offset: Option<u32>,
}

/// Manager for the exercise catalog
pub struct ExerciseManager {
    pool: SqlitePool,
}

const EXERCISE_COLUMNS: &str = r"
    id, name, description, category, level, force, mechanic, equipment,
    primary_muscles, secondary_muscles, instructions, created_at, updated_at
";

impl ExerciseManager {
    /// Create a new exercise manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get an exercise by ID
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get(&self, id: Uuid) -> AppResult<Option<Exercise>> {
        let query = format!("SELECT {EXERCISE_COLUMNS} FROM exercises WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get exercise: {e}")))?;

        row.map(|r| row_to_exercise(&r)).transpose()
    }

    /// IDs from `ids` that do not exist in the catalog
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn missing_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Uuid>> {
        let mut missing = Vec::new();
        for id in ids {
            let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM exercises WHERE id = $1")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to check exercise: {e}")))?;
            if exists.is_none() && !missing.contains(id) {
                missing.push(*id);
            }
        }
        Ok(missing)
    }

    /// List exercises with optional filtering, ordered by name
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list(&self, filter: &ListExercisesFilter) -> AppResult<Vec<Exercise>> {
        let limit_val = i64::from(
            filter
                .limit
                .unwrap_or(DEFAULT_EXERCISE_LIMIT)
                .min(MAX_EXERCISE_LIMIT),
        );
        let offset_val = i64::from(filter.offset.unwrap_or(0));

        // Parameterized conditions only; values never reach the SQL text
        let mut conditions = Vec::new();
        let mut bind_values: Vec<String> = Vec::new();

        if let Some(q) = filter.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            conditions.push("name LIKE ? ESCAPE '\\'");
            bind_values.push(format!("%{}%", escape_like(q)));
        }
        if let Some(muscle) = filter.muscle {
            conditions.push("(primary_muscles LIKE ? OR secondary_muscles LIKE ?)");
            let pattern = format!("%\"{}\"%", muscle.as_str());
            bind_values.push(pattern.clone());
            bind_values.push(pattern);
        }
        if let Some(equipment) = filter.equipment {
            conditions.push("equipment = ?");
            bind_values.push(equipment.as_str().to_owned());
        }
        if let Some(category) = filter.category {
            conditions.push("category = ?");
            bind_values.push(category.as_str().to_owned());
        }
        if let Some(level) = filter.level {
            conditions.push("level = ?");
            bind_values.push(level.as_str().to_owned());
        }
        if let Some(force) = filter.force {
            conditions.push("force = ?");
            bind_values.push(force.as_str().to_owned());
        }
        if let Some(mechanic) = filter.mechanic {
            conditions.push("mechanic = ?");
            bind_values.push(mechanic.as_str().to_owned());
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            r"
            SELECT {EXERCISE_COLUMNS}
            FROM exercises
            {where_clause}
            ORDER BY name COLLATE NOCASE ASC
            LIMIT ? OFFSET ?
            "
        );

        let mut sql_query = sqlx::query(&query);
        for value in &bind_values {
            sql_query = sql_query.bind(value);
        }
        sql_query = sql_query.bind(limit_val).bind(offset_val);

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list exercises: {e}")))?;

        rows.iter().map(row_to_exercise).collect()
    }

    /// Create an exercise
    ///
    /// # Errors
    ///
    /// Returns a validation error, `ResourceAlreadyExists` for a duplicate name,
    /// or a database error
    pub async fn create(&self, input: ExerciseInput) -> AppResult<Exercise> {
        input.validate()?;
        let now = Utc::now();
        let exercise = build_exercise(Uuid::new_v4(), input, now, now);

        sqlx::query(
            r"
            INSERT INTO exercises (
                id, name, description, category, level, force, mechanic, equipment,
                primary_muscles, secondary_muscles, instructions, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ",
        )
        .bind(exercise.id.to_string())
        .bind(&exercise.name)
        .bind(&exercise.description)
        .bind(exercise.category.as_str())
        .bind(exercise.level.as_str())
        .bind(exercise.force.map(|f| f.as_str()))
        .bind(exercise.mechanic.map(|m| m.as_str()))
        .bind(exercise.equipment.map(|e| e.as_str()))
        .bind(serde_json::to_string(&exercise.primary_muscles)?)
        .bind(serde_json::to_string(&exercise.secondary_muscles)?)
        .bind(serde_json::to_string(&exercise.instructions)?)
        .bind(to_db_timestamp(&exercise.created_at))
        .bind(to_db_timestamp(&exercise.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(&e, "create"))?;

        Ok(exercise)
    }

    /// Replace an exercise's editable fields
    ///
    /// # Errors
    ///
    /// Returns a validation error, `ResourceNotFound`, `ResourceAlreadyExists` for a
    /// duplicate name, or a database error
    pub async fn update(&self, id: Uuid, input: ExerciseInput) -> AppResult<Exercise> {
        input.validate()?;
        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found("Exercise").with_resource_id(id.to_string()))?;
        let exercise = build_exercise(id, input, existing.created_at, Utc::now());

        sqlx::query(
            r"
            UPDATE exercises SET
                name = $1, description = $2, category = $3, level = $4, force = $5,
                mechanic = $6, equipment = $7, primary_muscles = $8, secondary_muscles = $9,
                instructions = $10, updated_at = $11
            WHERE id = $12
            ",
        )
        .bind(&exercise.name)
        .bind(&exercise.description)
        .bind(exercise.category.as_str())
        .bind(exercise.level.as_str())
        .bind(exercise.force.map(|f| f.as_str()))
        .bind(exercise.mechanic.map(|m| m.as_str()))
        .bind(exercise.equipment.map(|e| e.as_str()))
        .bind(serde_json::to_string(&exercise.primary_muscles)?)
        .bind(serde_json::to_string(&exercise.secondary_muscles)?)
        .bind(serde_json::to_string(&exercise.instructions)?)
        .bind(to_db_timestamp(&exercise.updated_at))
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(&e, "update"))?;

        Ok(exercise)
    }

    /// Delete an exercise
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM exercises WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete exercise: {e}")))?;

        Ok(result.rows_affected() > 0)
    }
}

fn build_exercise(
    id: Uuid,
    input: ExerciseInput,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Exercise {
    Exercise {
        id,
        name: input.name.trim().to_owned(),
        description: input.description.filter(|d| !d.trim().is_empty()),
        category: input.category,
        level: input.level,
        force: input.force,
        mechanic: input.mechanic,
        equipment: input.equipment,
        primary_muscles: input.primary_muscles,
        secondary_muscles: input.secondary_muscles,
        instructions: input
            .instructions
            .into_iter()
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect(),
        created_at,
        updated_at,
    }
}

fn map_write_error(error: &sqlx::Error, operation: &str) -> AppError {
    match error {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::already_exists("An exercise with this name already exists")
        }
        other => AppError::database(format!("Failed to {operation} exercise: {other}")),
    }
}

fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn row_to_exercise(row: &SqliteRow) -> AppResult<Exercise> {
    let id: String = row.get("id");
    let category: String = row.get("category");
    let level: String = row.get("level");
    let force: Option<String> = row.get("force");
    let mechanic: Option<String> = row.get("mechanic");
    let equipment: Option<String> = row.get("equipment");
    let primary_muscles_json: String = row.get("primary_muscles");
    let secondary_muscles_json: String = row.get("secondary_muscles");
    let instructions_json: String = row.get("instructions");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Exercise {
        id: from_db_uuid(&id)?,
        name: row.get("name"),
        description: row.get("description"),
        category: from_db_key(&category, "category")?,
        level: from_db_key(&level, "level")?,
        force: force.map(|f| from_db_key(&f, "force")).transpose()?,
        mechanic: mechanic.map(|m| from_db_key(&m, "mechanic")).transpose()?,
        equipment: equipment.map(|e| from_db_key(&e, "equipment")).transpose()?,
        primary_muscles: serde_json::from_str(&primary_muscles_json)?,
        secondary_muscles: serde_json::from_str(&secondary_muscles_json)?,
        instructions: serde_json::from_str(&instructions_json)?,
        created_at: from_db_timestamp(&created_at)?,
        updated_at: from_db_timestamp(&updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[test]
    fn test_input_validation() {
        let mut input = ExerciseInput {
            name: "Bench Press".into(),
            description: None,
            category: ExerciseCategory::Strength,
            level: Level::Intermediate,
            force: Some(Force::Push),
            mechanic: Some(Mechanic::Compound),
            equipment: Some(Equipment::Barbell),
            primary_muscles: vec![MuscleGroup::Chest],
            secondary_muscles: vec![],
            instructions: vec!["Lie on the bench".into()],
        };
        assert!(input.validate().is_ok());

        input.instructions = vec!["   ".into()];
        assert!(input.validate().is_err());

        input.instructions = vec!["Press".into()];
        input.primary_muscles.clear();
        assert!(input.validate().is_err());
    }
}
