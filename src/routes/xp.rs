// ABOUTME: XP and streak read endpoints for the authenticated user
// ABOUTME: Current level progress with streak status, and the paged XP ledger history
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use repforge_core::errors::AppError;
use repforge_core::xp::LevelProgress;
use serde::{Deserialize, Serialize};

use super::PageQuery;
use crate::auth::authenticate;
use crate::database::progress::{StreakStore, XpLedgerEntry};
use crate::resources::ServerResources;

/// Current XP standing
#[derive(Debug, Serialize, Deserialize)]
pub struct XpStatusResponse {
    /// Level breakdown
    pub progress: LevelProgress,
    /// Stored streak length
    pub current_streak_days: u32,
    /// Last qualifying activity
    pub last_activity_at: DateTime<Utc>,
    /// Whether an activity now would keep the streak alive
    pub streak_active: bool,
    /// Multiplier the next activity would earn if the streak is kept
    pub multiplier: f64,
}

/// XP ledger page
#[derive(Debug, Serialize, Deserialize)]
pub struct XpHistoryResponse {
    /// Entries, newest first
    pub entries: Vec<XpLedgerEntry>,
    /// Page size used
    pub limit: u32,
    /// Offset used
    pub offset: u32,
}

/// XP routes
pub struct XpRoutes;

impl XpRoutes {
    /// Create all XP routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/xp/me", get(Self::handle_me))
            .route("/api/xp/history", get(Self::handle_history))
            .with_state(resources)
    }

    /// Handle GET /api/xp/me
    async fn handle_me(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let progress = resources
            .database
            .progress()
            .load_progress(auth.user_id)
            .await?;

        let policy = &resources.streak_policy;
        let inactive_days = policy
            .day_boundary()
            .days_between(progress.streak.last_activity_at, Utc::now());
        let streak_active = progress.streak.current_streak_days > 0
            && inactive_days < i64::from(policy.reset_threshold_days());
        let multiplier = if streak_active {
            policy.multiplier_for(progress.streak.current_streak_days)
        } else {
            policy.multiplier_for(0)
        };

        let response = XpStatusResponse {
            progress: resources.level_curve.progress(progress.total_xp),
            current_streak_days: progress.streak.current_streak_days,
            last_activity_at: progress.streak.last_activity_at,
            streak_active,
            multiplier,
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /api/xp/history
    async fn handle_history(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(page): Query<PageQuery>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let (limit, offset) = page.resolve();
        let entries = resources
            .database
            .progress()
            .history(auth.user_id, limit, offset)
            .await?;

        let response = XpHistoryResponse {
            entries,
            limit,
            offset,
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }
}
