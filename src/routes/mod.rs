// ABOUTME: Route module organization for the RepForge HTTP API
// ABOUTME: Provides per-domain routers and assembles them with CORS, request IDs, and tracing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Route module for the RepForge server
//!
//! Each domain module contains only route definitions and thin handlers that
//! delegate to managers and services.

/// Announcement routes
pub mod announcements;
/// Registration and login routes
pub mod auth;
/// Localized taxonomy tables
pub mod constants;
/// Exercise catalog routes
pub mod exercises;
/// Health check and readiness routes
pub mod health;
/// In-app notification routes
pub mod notifications;
/// Training program and enrollment routes
pub mod programs;
/// Content report routes
pub mod reports;
/// Profile and admin account routes
pub mod users;
/// Workout logging and completion routes
pub mod workouts;
/// XP and streak read routes
pub mod xp;

use std::sync::Arc;

use axum::Router;
use repforge_core::errors::AppError;
use serde::Deserialize;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub use announcements::AnnouncementRoutes;
pub use auth::AuthRoutes;
pub use constants::ConstantsRoutes;
pub use exercises::ExerciseRoutes;
pub use health::HealthRoutes;
pub use notifications::NotificationRoutes;
pub use programs::ProgramRoutes;
pub use reports::ReportRoutes;
pub use users::UserRoutes;
pub use workouts::WorkoutRoutes;
pub use xp::XpRoutes;

use crate::middleware::{make_request_span, setup_cors};
use crate::resources::ServerResources;

/// Default page size for paged listings
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Largest accepted page size
pub const MAX_PAGE_SIZE: u32 = 100;

/// `limit` / `offset` query parameters
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct PageQuery {
    /// Page size
    pub limit: Option<u32>,
    /// Page offset
    pub offset: Option<u32>,
}

impl PageQuery {
    /// Clamp to `(limit, offset)` with defaults applied
    #[must_use]
    pub fn resolve(self) -> (u32, u32) {
        (
            self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            self.offset.unwrap_or(0),
        )
    }
}

/// Fail with `InvalidInput` listing every referenced exercise that does not exist
pub(crate) async fn ensure_exercises_exist(
    resources: &ServerResources,
    ids: &[Uuid],
) -> Result<(), AppError> {
    if ids.is_empty() {
        return Ok(());
    }
    let missing = resources.database.exercises().missing_ids(ids).await?;
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::invalid_input("Unknown exercise IDs referenced")
            .with_details(serde_json::json!({ "missing_exercise_ids": missing })))
    }
}

/// Assemble every domain router into the application router
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    let cors = setup_cors(&resources.config);

    Router::new()
        .merge(HealthRoutes::routes(Arc::clone(&resources)))
        .merge(ConstantsRoutes::routes())
        .merge(AuthRoutes::routes(Arc::clone(&resources)))
        .merge(UserRoutes::routes(Arc::clone(&resources)))
        .merge(ExerciseRoutes::routes(Arc::clone(&resources)))
        .merge(ProgramRoutes::routes(Arc::clone(&resources)))
        .merge(WorkoutRoutes::routes(Arc::clone(&resources)))
        .merge(XpRoutes::routes(Arc::clone(&resources)))
        .merge(AnnouncementRoutes::routes(Arc::clone(&resources)))
        .merge(NotificationRoutes::routes(Arc::clone(&resources)))
        .merge(ReportRoutes::routes(resources))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors)
}
