// ABOUTME: User profile and admin account-management route handlers
// ABOUTME: Self-service profile read/update plus admin listing, role changes, and deletion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use repforge_core::errors::AppError;
use repforge_core::i18n::Language;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PageQuery;
use crate::auth::authenticate;
use crate::database::users::{UserProfile, UserRole, UserUpdate};
use crate::logging::AppLogger;
use crate::resources::ServerResources;

/// Profile update payload. An empty `display_name` clears it.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    /// New display name
    #[serde(default)]
    pub display_name: Option<String>,
    /// New language
    #[serde(default)]
    pub language: Option<Language>,
}

/// Role change payload
#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    /// New role
    pub role: UserRole,
}

/// Paged user listing
#[derive(Debug, Serialize, Deserialize)]
pub struct ListUsersResponse {
    /// Users on this page
    pub users: Vec<UserProfile>,
    /// Page size used
    pub limit: u32,
    /// Offset used
    pub offset: u32,
}

/// User routes
pub struct UserRoutes;

impl UserRoutes {
    /// Create all user routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/users/me",
                get(Self::handle_get_me).put(Self::handle_update_me),
            )
            .route("/api/users", get(Self::handle_list_users))
            .route("/api/users/:id", axum::routing::delete(Self::handle_delete_user))
            .route("/api/users/:id/role", put(Self::handle_set_role))
            .with_state(resources)
    }

    /// Handle GET /api/users/me
    async fn handle_get_me(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let user = resources
            .database
            .users()
            .get(auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User").with_user_id(auth.user_id))?;

        Ok((StatusCode::OK, Json(UserProfile::from(&user))).into_response())
    }

    /// Handle PUT /api/users/me
    async fn handle_update_me(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<UpdateProfileRequest>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let update = UserUpdate {
            display_name: body.display_name.map(|name| {
                let trimmed = name.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_owned())
            }),
            language: body.language,
        };

        let user = resources
            .database
            .users()
            .update_profile(auth.user_id, update)
            .await?;
        Ok((StatusCode::OK, Json(UserProfile::from(&user))).into_response())
    }

    /// Handle GET /api/users (admin)
    async fn handle_list_users(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(page): Query<PageQuery>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        auth.require_admin()?;

        let (limit, offset) = page.resolve();
        let users = resources.database.users().list(limit, offset).await?;
        let response = ListUsersResponse {
            users: users.iter().map(UserProfile::from).collect(),
            limit,
            offset,
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle PUT /api/users/:id/role (admin)
    async fn handle_set_role(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
        Json(body): Json<SetRoleRequest>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        auth.require_admin()?;

        let users = resources.database.users();
        let target = users
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found("User").with_resource_id(id.to_string()))?;

        if target.role.is_admin() && !body.role.is_admin() && users.count_admins().await? <= 1 {
            return Err(AppError::conflict("Cannot demote the last admin")
                .with_resource_id(id.to_string()));
        }

        let user = users.set_role(id, body.role).await?;
        AppLogger::log_security_event(
            "role_changed",
            "medium",
            &format!("User {id} is now {}", user.role),
            Some(&auth.user_id.to_string()),
        );
        Ok((StatusCode::OK, Json(UserProfile::from(&user))).into_response())
    }

    /// Handle DELETE /api/users/:id (admin)
    async fn handle_delete_user(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        auth.require_admin()?;

        let users = resources.database.users();
        let target = users
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found("User").with_resource_id(id.to_string()))?;

        if target.role.is_admin() && users.count_admins().await? <= 1 {
            return Err(AppError::conflict("Cannot delete the last admin")
                .with_resource_id(id.to_string()));
        }

        users.delete(id).await?;
        AppLogger::log_security_event(
            "user_deleted",
            "medium",
            &format!("User {id} deleted"),
            Some(&auth.user_id.to_string()),
        );
        Ok(StatusCode::NO_CONTENT.into_response())
    }
}
