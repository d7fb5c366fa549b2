// ABOUTME: Workout logging route handlers and the completion flow that awards streak-scaled XP
// ABOUTME: Completion marks the workout done, awards XP, detects records, and emits notifications
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Workout routes
//!
//! Completing a workout is the only activity that moves a streak. The workout is
//! marked completed first; if the XP award is then rejected because the clock
//! went backwards, the completion stands and the response carries `xp: null`.
//! Any other award failure reopens the workout and returns the error.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use repforge_core::errors::AppError;
use repforge_core::streak::StreakTransition;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::{ensure_exercises_exist, PageQuery};
use crate::auth::authenticate;
use crate::database::notifications::{NewNotification, NotificationKind};
use crate::database::progress::XpLedgerEntry;
use crate::database::workouts::{Workout, WorkoutInput};
use crate::resources::ServerResources;
use crate::services::workout_completion::complete_workout;
use crate::services::xp_awarder::{XpAwardOutcome, XpAwarder};

/// Workout listing
#[derive(Debug, Serialize, Deserialize)]
pub struct ListWorkoutsResponse {
    /// Caller's workouts, newest first
    pub workouts: Vec<Workout>,
    /// Page size used
    pub limit: u32,
    /// Offset used
    pub offset: u32,
}

/// XP granted by one completion
#[derive(Debug, Serialize, Deserialize)]
pub struct XpAwardSummary {
    /// Sum of every entry's awarded XP
    pub awarded_xp: u32,
    /// Streak multiplier applied
    pub multiplier: f64,
    /// Streak length after the completion
    pub streak_days: u32,
    /// How the streak moved
    pub transition: StreakTransition,
    /// Lifetime XP after the completion
    pub total_xp: u64,
    /// Level after the completion
    pub level: u32,
    /// Whether a level boundary was crossed
    pub leveled_up: bool,
    /// Ledger entries written
    pub entries: Vec<XpLedgerEntry>,
}

/// Completion response
#[derive(Debug, Serialize, Deserialize)]
pub struct CompleteWorkoutResponse {
    /// Completed workout
    pub workout: Workout,
    /// XP granted; `null` when the award was skipped
    pub xp: Option<XpAwardSummary>,
    /// Exercises with a new heaviest set
    pub personal_records: Vec<Uuid>,
}

/// Workout routes
pub struct WorkoutRoutes;

impl WorkoutRoutes {
    /// Create all workout routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/workouts",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route(
                "/api/workouts/:id",
                get(Self::handle_get).delete(Self::handle_delete),
            )
            .route("/api/workouts/:id/complete", post(Self::handle_complete))
            .with_state(resources)
    }

    /// Handle POST /api/workouts
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<WorkoutInput>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        body.validate()?;
        ensure_exercises_exist(&resources, &body.exercise_ids()).await?;

        if let Some(program_id) = body.program_id {
            let program = resources
                .database
                .programs()
                .get(program_id)
                .await?
                .filter(|p| p.is_published || auth.role.is_admin())
                .ok_or_else(|| {
                    AppError::not_found("Program").with_resource_id(program_id.to_string())
                })?;
            if let Some(index) = body.session_index {
                if usize::try_from(index).map_or(true, |i| i >= program.sessions.len()) {
                    return Err(AppError::out_of_range(format!(
                        "session_index must be below {}",
                        program.sessions.len()
                    )));
                }
            }
        }

        let workout = resources
            .database
            .workouts()
            .create(auth.user_id, body)
            .await?;
        Ok((StatusCode::CREATED, Json(workout)).into_response())
    }

    /// Handle GET /api/workouts
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(page): Query<PageQuery>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let (limit, offset) = page.resolve();
        let workouts = resources
            .database
            .workouts()
            .list_for_user(auth.user_id, limit, offset)
            .await?;

        let response = ListWorkoutsResponse {
            workouts,
            limit,
            offset,
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /api/workouts/:id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let workout = resources
            .database
            .workouts()
            .get_for_user(id, auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Workout").with_resource_id(id.to_string()))?;
        Ok((StatusCode::OK, Json(workout)).into_response())
    }

    /// Handle DELETE /api/workouts/:id
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        if resources
            .database
            .workouts()
            .delete_for_user(id, auth.user_id)
            .await?
        {
            Ok(StatusCode::NO_CONTENT.into_response())
        } else {
            Err(AppError::not_found("Workout").with_resource_id(id.to_string()))
        }
    }

    /// Handle POST /api/workouts/:id/complete
    async fn handle_complete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let store = resources.database.progress();
        let awarder = XpAwarder::new(
            &store,
            &resources.streak_policy,
            &resources.gamification.xp,
            &resources.level_curve,
        );

        let outcome = complete_workout(
            &resources.database.workouts(),
            &awarder,
            id,
            auth.user_id,
            Utc::now(),
        )
        .await?;

        let Some(completion) = outcome.completion else {
            let response = CompleteWorkoutResponse {
                workout: outcome.workout,
                xp: None,
                personal_records: Vec::new(),
            };
            return Ok((StatusCode::OK, Json(response)).into_response());
        };
        let record = outcome.record;
        let personal_records = outcome.personal_records;
        let workout = outcome.workout;

        let summary = summarize(&completion, record.as_ref());
        notify_progress(&resources, auth.user_id, &completion, &summary).await;

        let response = CompleteWorkoutResponse {
            workout,
            xp: Some(summary),
            personal_records,
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }
}

/// Fold the completion award and an optional record award into one summary
fn summarize(completion: &XpAwardOutcome, record: Option<&XpAwardOutcome>) -> XpAwardSummary {
    let last = record.unwrap_or(completion);
    let mut entries = vec![completion.entry.clone()];
    entries.extend(record.map(|r| r.entry.clone()));

    XpAwardSummary {
        awarded_xp: entries.iter().map(|e| e.awarded_xp).fold(0, u32::saturating_add),
        multiplier: completion.multiplier,
        streak_days: last.streak.current_streak_days,
        transition: completion.transition,
        total_xp: last.total_xp,
        level: last.level_after,
        leveled_up: last.level_after > completion.level_before,
        entries,
    }
}

/// Emit level-up and streak-milestone notifications. Failures are logged only,
/// since the XP is already committed.
async fn notify_progress(
    resources: &ServerResources,
    user_id: Uuid,
    completion: &XpAwardOutcome,
    summary: &XpAwardSummary,
) {
    let notifications = resources.database.notifications();
    let mut pending = Vec::new();

    if summary.leveled_up {
        pending.push(NewNotification {
            kind: NotificationKind::LevelUp,
            title: format!("Level {} reached", summary.level),
            body: format!("You now have {} XP.", summary.total_xp),
            data: Some(serde_json::json!({
                "level": summary.level,
                "total_xp": summary.total_xp,
            })),
        });
    }

    if completion.entered_new_tier() {
        pending.push(NewNotification {
            kind: NotificationKind::StreakMilestone,
            title: format!("{}-day streak", completion.streak.current_streak_days),
            body: format!(
                "Your XP multiplier is now x{}.",
                completion.multiplier
            ),
            data: Some(serde_json::json!({
                "streak_days": completion.streak.current_streak_days,
                "tier": completion.tier_after,
                "multiplier": completion.multiplier,
            })),
        });
    }

    for notification in pending {
        let kind = notification.kind;
        if let Err(e) = notifications.create(user_id, notification).await {
            warn!(user.id = %user_id, kind = %kind, "Failed to create notification: {e}");
        }
    }
}
