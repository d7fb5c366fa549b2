// ABOUTME: Workout completion flow: mark done, award streak-scaled XP, then award personal records
// ABOUTME: A failed completion award rolls the workout back so the client can retry for the XP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use repforge_core::errors::{AppResult, ErrorCode};
use repforge_core::xp::XpAction;
use tracing::{error, warn};
use uuid::Uuid;

use super::xp_awarder::{XpAwardOutcome, XpAwarder};
use crate::database::workouts::{Workout, WorkoutManager};

/// What a completion produced
#[derive(Debug)]
pub struct CompletionOutcome {
    /// The completed workout
    pub workout: Workout,
    /// Completion award; `None` when skipped because the clock went backwards
    pub completion: Option<XpAwardOutcome>,
    /// Personal record award, if one was earned and committed
    pub record: Option<XpAwardOutcome>,
    /// Exercises with a new heaviest set
    pub personal_records: Vec<Uuid>,
}

/// Complete a workout and award its XP
///
/// The completion award either commits or the workout is reopened. Once it has
/// committed, later steps can only shrink the outcome, never fail the request.
///
/// # Errors
///
/// Returns `NotFound` or `ResourceConflict` when the workout is missing or already
/// completed, or the award error after the completion has been rolled back
pub async fn complete_workout(
    workouts: &WorkoutManager,
    awarder: &XpAwarder<'_>,
    workout_id: Uuid,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> AppResult<CompletionOutcome> {
    let workout = workouts.mark_completed(workout_id, user_id, now).await?;

    let action = if workout.program_id.is_some() {
        XpAction::ProgramSessionCompleted
    } else {
        XpAction::WorkoutCompleted
    };

    let completion = match awarder
        .award(user_id, action, now, Some(workout.id))
        .await
    {
        Ok(outcome) => outcome,
        Err(e) if e.code == ErrorCode::InvalidTimestampOrder => {
            warn!(
                user.id = %user_id,
                workout.id = %workout.id,
                "Skipping XP award: {e}"
            );
            return Ok(CompletionOutcome {
                workout,
                completion: None,
                record: None,
                personal_records: Vec::new(),
            });
        }
        Err(e) => {
            match workouts.reopen(workout.id, user_id, now).await {
                Ok(true) => {}
                Ok(false) => warn!(
                    workout.id = %workout.id,
                    "Completion changed before it could be rolled back"
                ),
                Err(reopen_err) => error!(
                    workout.id = %workout.id,
                    "Failed to roll back completion: {reopen_err}"
                ),
            }
            return Err(e);
        }
    };

    let personal_records = match workouts.personal_records(&workout).await {
        Ok(records) => records,
        Err(e) => {
            warn!(workout.id = %workout.id, "Personal record detection failed: {e}");
            Vec::new()
        }
    };

    let record = if personal_records.is_empty() {
        None
    } else {
        match awarder
            .award_follow_up(user_id, XpAction::PersonalRecord, &completion, Some(workout.id))
            .await
        {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!(
                    user.id = %user_id,
                    workout.id = %workout.id,
                    "Personal record XP not awarded: {e}"
                );
                None
            }
        }
    };

    Ok(CompletionOutcome {
        workout,
        completion: Some(completion),
        record,
        personal_records,
    })
}
