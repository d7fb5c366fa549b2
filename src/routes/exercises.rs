// ABOUTME: Exercise catalog route handlers with taxonomy filtering and admin curation
// ABOUTME: Search by name and taxonomy keys; admins create, update, and delete entries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use repforge_core::errors::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::authenticate;
use crate::database::exercises::{
    Exercise, ExerciseInput, ListExercisesFilter, DEFAULT_EXERCISE_LIMIT, MAX_EXERCISE_LIMIT,
};
use crate::resources::ServerResources;

/// Query parameters for listing exercises. Taxonomy values use their snake_case keys.
#[derive(Debug, Default, Deserialize)]
pub struct ExerciseQuery {
    /// Name substring
    pub q: Option<String>,
    /// Muscle key
    pub muscle: Option<String>,
    /// Equipment key
    pub equipment: Option<String>,
    /// Category key
    pub category: Option<String>,
    /// Level key
    pub level: Option<String>,
    /// Force key
    pub force: Option<String>,
    /// Mechanic key
    pub mechanic: Option<String>,
    /// Page size
    pub limit: Option<u32>,
    /// Page offset
    pub offset: Option<u32>,
}

impl ExerciseQuery {
    fn into_filter(self) -> Result<ListExercisesFilter, AppError> {
        Ok(ListExercisesFilter {
            query: self.q.map(|q| q.trim().to_owned()).filter(|q| !q.is_empty()),
            muscle: parse_key(self.muscle.as_deref())?,
            equipment: parse_key(self.equipment.as_deref())?,
            category: parse_key(self.category.as_deref())?,
            level: parse_key(self.level.as_deref())?,
            force: parse_key(self.force.as_deref())?,
            mechanic: parse_key(self.mechanic.as_deref())?,
            limit: Some(
                self.limit
                    .unwrap_or(DEFAULT_EXERCISE_LIMIT)
                    .clamp(1, MAX_EXERCISE_LIMIT),
            ),
            offset: self.offset,
        })
    }
}

fn parse_key<T: FromStr<Err = AppError>>(raw: Option<&str>) -> Result<Option<T>, AppError> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(T::from_str)
        .transpose()
}

/// Exercise listing
#[derive(Debug, Serialize, Deserialize)]
pub struct ListExercisesResponse {
    /// Matching exercises ordered by name
    pub exercises: Vec<Exercise>,
    /// Number returned
    pub count: usize,
}

/// Exercise routes
pub struct ExerciseRoutes;

impl ExerciseRoutes {
    /// Create all exercise routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/exercises",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route(
                "/api/exercises/:id",
                get(Self::handle_get)
                    .put(Self::handle_update)
                    .delete(Self::handle_delete),
            )
            .with_state(resources)
    }

    /// Handle GET /api/exercises
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<ExerciseQuery>,
    ) -> Result<Response, AppError> {
        authenticate(&headers, &resources).await?;
        let filter = query.into_filter()?;
        let exercises = resources.database.exercises().list(&filter).await?;

        let response = ListExercisesResponse {
            count: exercises.len(),
            exercises,
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /api/exercises/:id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        authenticate(&headers, &resources).await?;
        let exercise = resources
            .database
            .exercises()
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found("Exercise").with_resource_id(id.to_string()))?;

        Ok((StatusCode::OK, Json(exercise)).into_response())
    }

    /// Handle POST /api/exercises (admin)
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<ExerciseInput>,
    ) -> Result<Response, AppError> {
        authenticate(&headers, &resources).await?.require_admin()?;
        let exercise = resources.database.exercises().create(body).await?;
        Ok((StatusCode::CREATED, Json(exercise)).into_response())
    }

    /// Handle PUT /api/exercises/:id (admin)
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
        Json(body): Json<ExerciseInput>,
    ) -> Result<Response, AppError> {
        authenticate(&headers, &resources).await?.require_admin()?;
        let exercise = resources.database.exercises().update(id, body).await?;
        Ok((StatusCode::OK, Json(exercise)).into_response())
    }

    /// Handle DELETE /api/exercises/:id (admin)
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        authenticate(&headers, &resources).await?.require_admin()?;
        if resources.database.exercises().delete(id).await? {
            Ok(StatusCode::NO_CONTENT.into_response())
        } else {
            Err(AppError::not_found("Exercise").with_resource_id(id.to_string()))
        }
    }
}
