// ABOUTME: Announcement route handlers for members and administrators
// ABOUTME: Members read active announcements; admins publish, edit, and remove them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use chrono::Utc;
use repforge_core::errors::AppError;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::authenticate;
use crate::database::announcements::{Announcement, AnnouncementInput};
use crate::database::notifications::{NewNotification, NotificationKind};
use crate::resources::ServerResources;

/// Announcement listing
#[derive(Debug, Serialize, Deserialize)]
pub struct ListAnnouncementsResponse {
    /// Announcements, newest first
    pub announcements: Vec<Announcement>,
}

/// Announcement routes
pub struct AnnouncementRoutes;

impl AnnouncementRoutes {
    /// Create all announcement routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/announcements",
                get(Self::handle_list_active).post(Self::handle_create),
            )
            .route("/api/announcements/all", get(Self::handle_list_all))
            .route(
                "/api/announcements/:id",
                put(Self::handle_update).delete(Self::handle_delete),
            )
            .with_state(resources)
    }

    /// Handle GET /api/announcements
    async fn handle_list_active(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        authenticate(&headers, &resources).await?;
        let announcements = resources
            .database
            .announcements()
            .list_active(Utc::now())
            .await?;
        Ok((StatusCode::OK, Json(ListAnnouncementsResponse { announcements })).into_response())
    }

    /// Handle GET /api/announcements/all (admin)
    async fn handle_list_all(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        authenticate(&headers, &resources).await?.require_admin()?;
        let announcements = resources.database.announcements().list_all().await?;
        Ok((StatusCode::OK, Json(ListAnnouncementsResponse { announcements })).into_response())
    }

    /// Handle POST /api/announcements (admin)
    ///
    /// Announcements that are already live are pushed to every user's notifications.
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<AnnouncementInput>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        auth.require_admin()?;

        let announcement = resources
            .database
            .announcements()
            .create(body, auth.user_id)
            .await?;

        if announcement.published_at <= Utc::now() {
            let notification = NewNotification {
                kind: NotificationKind::Announcement,
                title: announcement.title.clone(),
                body: announcement.body.clone(),
                data: Some(serde_json::json!({ "announcement_id": announcement.id })),
            };
            match resources.database.notifications().broadcast(&notification).await {
                Ok(count) => info!(
                    announcement.id = %announcement.id,
                    recipients = count,
                    "Announcement broadcast"
                ),
                Err(e) => warn!(
                    announcement.id = %announcement.id,
                    "Failed to broadcast announcement: {e}"
                ),
            }
        }

        Ok((StatusCode::CREATED, Json(announcement)).into_response())
    }

    /// Handle PUT /api/announcements/:id (admin)
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
        Json(body): Json<AnnouncementInput>,
    ) -> Result<Response, AppError> {
        authenticate(&headers, &resources).await?.require_admin()?;
        let announcement = resources.database.announcements().update(id, body).await?;
        Ok((StatusCode::OK, Json(announcement)).into_response())
    }

    /// Handle DELETE /api/announcements/:id (admin)
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        authenticate(&headers, &resources).await?.require_admin()?;
        if resources.database.announcements().delete(id).await? {
            Ok(StatusCode::NO_CONTENT.into_response())
        } else {
            Err(AppError::not_found("Announcement").with_resource_id(id.to_string()))
        }
    }
}
