// ABOUTME: Content report route handlers for members and moderators
// ABOUTME: Members file and review their reports; admins triage and resolve them
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
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::auth::authenticate;
use crate::database::notifications::{NewNotification, NotificationKind};
use crate::database::reports::{Report, ReportInput, ReportStatus};
use crate::resources::ServerResources;

/// Admin listing filter
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    /// Status key
    pub status: Option<String>,
}

/// Resolution payload
#[derive(Debug, Deserialize)]
pub struct ResolveReportRequest {
    /// `resolved` or `dismissed`
    pub status: ReportStatus,
    /// Moderator note shown to the reporter
    #[serde(default)]
    pub resolution_note: Option<String>,
}

/// Report listing
#[derive(Debug, Serialize, Deserialize)]
pub struct ListReportsResponse {
    /// Reports
    pub reports: Vec<Report>,
}

/// Report routes
pub struct ReportRoutes;

impl ReportRoutes {
    /// Create all report routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/reports",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route("/api/reports/mine", get(Self::handle_mine))
            .route("/api/reports/:id", put(Self::handle_resolve))
            .with_state(resources)
    }

    /// Handle POST /api/reports
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<ReportInput>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let report = resources
            .database
            .reports()
            .create(auth.user_id, body)
            .await?;
        Ok((StatusCode::CREATED, Json(report)).into_response())
    }

    /// Handle GET /api/reports/mine
    async fn handle_mine(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let reports = resources
            .database
            .reports()
            .list_for_reporter(auth.user_id)
            .await?;
        Ok((StatusCode::OK, Json(ListReportsResponse { reports })).into_response())
    }

    /// Handle GET /api/reports (admin)
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<ReportQuery>,
    ) -> Result<Response, AppError> {
        authenticate(&headers, &resources).await?.require_admin()?;
        let status = query
            .status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<ReportStatus>)
            .transpose()?;

        let reports = resources.database.reports().list(status).await?;
        Ok((StatusCode::OK, Json(ListReportsResponse { reports })).into_response())
    }

    /// Handle PUT /api/reports/:id (admin)
    async fn handle_resolve(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
        Json(body): Json<ResolveReportRequest>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        auth.require_admin()?;

        let report = resources
            .database
            .reports()
            .resolve(id, body.status, body.resolution_note, auth.user_id)
            .await?;

        let notification = NewNotification {
            kind: NotificationKind::ReportUpdate,
            title: format!("Your report was {}", report.status.as_str()),
            body: report
                .resolution_note
                .clone()
                .unwrap_or_else(|| "Thanks for helping keep the community healthy.".to_owned()),
            data: Some(serde_json::json!({
                "report_id": report.id,
                "status": report.status,
            })),
        };
        if let Err(e) = resources
            .database
            .notifications()
            .create(report.reporter_id, notification)
            .await
        {
            warn!(report.id = %report.id, "Failed to notify reporter: {e}");
        }

        Ok((StatusCode::OK, Json(report)).into_response())
    }
}
