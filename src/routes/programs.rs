// ABOUTME: Training program route handlers with publishing rules and user enrollment
// ABOUTME: Members browse published programs and enroll; admins author and publish them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use repforge_core::errors::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ensure_exercises_exist;
use crate::auth::{authenticate, AuthResult};
use crate::database::programs::{Enrollment, Program, ProgramInput};
use crate::resources::ServerResources;

/// Program listing
#[derive(Debug, Serialize, Deserialize)]
pub struct ListProgramsResponse {
    /// Visible programs
    pub programs: Vec<Program>,
    /// Number returned
    pub count: usize,
}

/// Enrollment listing
#[derive(Debug, Serialize, Deserialize)]
pub struct ListEnrollmentsResponse {
    /// Caller's enrollments, newest first
    pub enrollments: Vec<Enrollment>,
}

/// Program routes
pub struct ProgramRoutes;

impl ProgramRoutes {
    /// Create all program routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/programs",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route("/api/programs/enrollments", get(Self::handle_enrollments))
            .route(
                "/api/programs/:id",
                get(Self::handle_get)
                    .put(Self::handle_update)
                    .delete(Self::handle_delete),
            )
            .route(
                "/api/programs/:id/enroll",
                post(Self::handle_enroll).delete(Self::handle_unenroll),
            )
            .with_state(resources)
    }

    /// Load a program the caller is allowed to see. Unpublished programs are
    /// reported as missing to non-admins.
    async fn visible_program(
        resources: &ServerResources,
        auth: &AuthResult,
        id: Uuid,
    ) -> Result<Program, AppError> {
        resources
            .database
            .programs()
            .get(id)
            .await?
            .filter(|p| p.is_published || auth.role.is_admin())
            .ok_or_else(|| AppError::not_found("Program").with_resource_id(id.to_string()))
    }

    /// Handle GET /api/programs
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let programs = resources
            .database
            .programs()
            .list(!auth.role.is_admin())
            .await?;

        let response = ListProgramsResponse {
            count: programs.len(),
            programs,
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /api/programs/:id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let program = Self::visible_program(&resources, &auth, id).await?;
        Ok((StatusCode::OK, Json(program)).into_response())
    }

    /// Handle POST /api/programs (admin)
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<ProgramInput>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        auth.require_admin()?;
        body.validate()?;
        ensure_exercises_exist(&resources, &body.exercise_ids()).await?;

        let program = resources
            .database
            .programs()
            .create(body, auth.user_id)
            .await?;
        Ok((StatusCode::CREATED, Json(program)).into_response())
    }

    /// Handle PUT /api/programs/:id (admin)
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
        Json(body): Json<ProgramInput>,
    ) -> Result<Response, AppError> {
        authenticate(&headers, &resources).await?.require_admin()?;
        body.validate()?;
        ensure_exercises_exist(&resources, &body.exercise_ids()).await?;

        let program = resources.database.programs().update(id, body).await?;
        Ok((StatusCode::OK, Json(program)).into_response())
    }

    /// Handle DELETE /api/programs/:id (admin)
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        authenticate(&headers, &resources).await?.require_admin()?;
        if resources.database.programs().delete(id).await? {
            Ok(StatusCode::NO_CONTENT.into_response())
        } else {
            Err(AppError::not_found("Program").with_resource_id(id.to_string()))
        }
    }

    /// Handle POST /api/programs/:id/enroll
    async fn handle_enroll(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let program = Self::visible_program(&resources, &auth, id).await?;
        if !program.is_published {
            return Err(AppError::invalid_input("Cannot enroll in an unpublished program")
                .with_resource_id(id.to_string()));
        }

        let enrollment = resources
            .database
            .programs()
            .enroll(auth.user_id, &program)
            .await?;
        Ok((StatusCode::CREATED, Json(enrollment)).into_response())
    }

    /// Handle DELETE /api/programs/:id/enroll
    async fn handle_unenroll(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        if resources
            .database
            .programs()
            .unenroll(auth.user_id, id)
            .await?
        {
            Ok(StatusCode::NO_CONTENT.into_response())
        } else {
            Err(AppError::not_found("Enrollment").with_resource_id(id.to_string()))
        }
    }

    /// Handle GET /api/programs/enrollments
    async fn handle_enrollments(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let enrollments = resources
            .database
            .programs()
            .enrollments_for(auth.user_id)
            .await?;
        Ok((StatusCode::OK, Json(ListEnrollmentsResponse { enrollments })).into_response())
    }
}
