// ABOUTME: In-app notification route handlers for the authenticated user
// ABOUTME: List with unread filter, mark one or all read, and delete
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use repforge_core::errors::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::authenticate;
use crate::database::notifications::Notification;
use crate::resources::ServerResources;

/// Default and maximum number of notifications returned
pub const MAX_NOTIFICATIONS: u32 = 100;

/// Query parameters for listing notifications
#[derive(Debug, Default, Deserialize)]
pub struct NotificationQuery {
    /// Only unread notifications
    #[serde(default)]
    pub unread_only: bool,
    /// Page size
    pub limit: Option<u32>,
}

/// Notification listing
#[derive(Debug, Serialize, Deserialize)]
pub struct ListNotificationsResponse {
    /// Notifications, newest first
    pub notifications: Vec<Notification>,
    /// Total unread for the user
    pub unread_count: i64,
}

/// Result of marking everything read
#[derive(Debug, Serialize, Deserialize)]
pub struct MarkAllReadResponse {
    /// Notifications changed
    pub marked: u64,
}

/// Notification routes
pub struct NotificationRoutes;

impl NotificationRoutes {
    /// Create all notification routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/notifications", get(Self::handle_list))
            .route("/api/notifications/read-all", post(Self::handle_read_all))
            .route("/api/notifications/:id/read", post(Self::handle_read))
            .route("/api/notifications/:id", delete(Self::handle_delete))
            .with_state(resources)
    }

    /// Handle GET /api/notifications
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<NotificationQuery>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let limit = query.limit.unwrap_or(MAX_NOTIFICATIONS).clamp(1, MAX_NOTIFICATIONS);
        let manager = resources.database.notifications();

        let notifications = manager
            .list_for_user(auth.user_id, query.unread_only, limit)
            .await?;
        let unread_count = manager.unread_count(auth.user_id).await?;

        let response = ListNotificationsResponse {
            notifications,
            unread_count,
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /api/notifications/:id/read
    async fn handle_read(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        if resources
            .database
            .notifications()
            .mark_read(id, auth.user_id)
            .await?
        {
            Ok(StatusCode::NO_CONTENT.into_response())
        } else {
            Err(AppError::not_found("Notification").with_resource_id(id.to_string()))
        }
    }

    /// Handle POST /api/notifications/read-all
    async fn handle_read_all(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let marked = resources
            .database
            .notifications()
            .mark_all_read(auth.user_id)
            .await?;
        Ok((StatusCode::OK, Json(MarkAllReadResponse { marked })).into_response())
    }

    /// Handle DELETE /api/notifications/:id
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        if resources
            .database
            .notifications()
            .delete(id, auth.user_id)
            .await?
        {
            Ok(StatusCode::NO_CONTENT.into_response())
        } else {
            Err(AppError::not_found("Notification").with_resource_id(id.to_string()))
        }
    }
}
