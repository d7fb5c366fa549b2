// ABOUTME: Tests for the workout completion service when XP commits fail after completion
// ABOUTME: Verifies rollback on a failed completion award and partial success on record awards
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use common::{create_test_database, create_test_user};
use repforge_core::errors::{AppResult, ErrorCode};
use repforge_core::streak::StreakPolicy;
use repforge_core::taxonomy::{ExerciseCategory, Level, MuscleGroup};
use repforge_core::xp::{LevelCurve, XpTable};
use repforge_server::database::exercises::{Exercise, ExerciseInput};
use repforge_server::database::progress::{
    ProgressCommit, ProgressManager, StreakStore, UserProgress,
};
use repforge_server::database::workouts::{Workout, WorkoutInput, WorkoutSet};
use repforge_server::database::Database;
use repforge_server::services::workout_completion::complete_workout;
use repforge_server::services::xp_awarder::XpAwarder;
use uuid::Uuid;

/// Delegates to the real store but only lets `allowed_commits` commits through
struct LimitedStore {
    inner: ProgressManager,
    allowed_commits: AtomicU32,
}

impl LimitedStore {
    fn new(database: &Database, allowed_commits: u32) -> Self {
        Self {
            inner: database.progress(),
            allowed_commits: AtomicU32::new(allowed_commits),
        }
    }
}

#[async_trait]
impl StreakStore for LimitedStore {
    async fn load_progress(&self, user_id: Uuid) -> AppResult<UserProgress> {
        self.inner.load_progress(user_id).await
    }

    async fn commit_progress(&self, user_id: Uuid, commit: &ProgressCommit) -> AppResult<bool> {
        let remaining = self.allowed_commits.load(Ordering::SeqCst);
        if remaining == 0 {
            return Ok(false);
        }
        self.allowed_commits.store(remaining - 1, Ordering::SeqCst);
        self.inner.commit_progress(user_id, commit).await
    }
}

async fn create_exercise(database: &Database) -> Exercise {
    database
        .exercises()
        .create(ExerciseInput {
            name: "Deadlift".into(),
            description: None,
            category: ExerciseCategory::default(),
            level: Level::default(),
            force: None,
            mechanic: None,
            equipment: None,
            primary_muscles: vec![MuscleGroup::Hamstrings],
            secondary_muscles: Vec::new(),
            instructions: vec!["Pull from the floor".into()],
        })
        .await
        .unwrap()
}

async fn log_workout(database: &Database, user_id: Uuid, exercise_id: Uuid, weight: f64) -> Workout {
    database
        .workouts()
        .create(
            user_id,
            WorkoutInput {
                title: "Pull day".into(),
                notes: None,
                program_id: None,
                session_index: None,
                sets: vec![WorkoutSet {
                    exercise_id,
                    reps: Some(3),
                    weight_kg: Some(weight),
                    duration_seconds: None,
                }],
            },
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_failed_award_reopens_workout_for_retry() {
    let db = create_test_database().await.unwrap();
    let user = create_test_user(&db).await.unwrap();
    let exercise = create_exercise(&db).await;
    let workout = log_workout(&db, user.id, exercise.id, 100.0).await;

    let (policy, table, curve) = (
        StreakPolicy::default(),
        XpTable::default(),
        LevelCurve::default(),
    );

    let contended = LimitedStore::new(&db, 0);
    let awarder = XpAwarder::new(&contended, &policy, &table, &curve);
    let err = complete_workout(&db.workouts(), &awarder, workout.id, user.id, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceConflict);

    let stored = db
        .workouts()
        .get_for_user(workout.id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.is_completed());
    assert_eq!(db.progress().load_progress(user.id).await.unwrap().total_xp, 0);

    let store = db.progress();
    let awarder = XpAwarder::new(&store, &policy, &table, &curve);
    let outcome = complete_workout(&db.workouts(), &awarder, workout.id, user.id, Utc::now())
        .await
        .unwrap();
    assert!(outcome.workout.is_completed());
    assert_eq!(outcome.completion.unwrap().entry.awarded_xp, 100);
}

#[tokio::test]
async fn test_failed_record_award_keeps_completion_award() {
    let db = create_test_database().await.unwrap();
    let user = create_test_user(&db).await.unwrap();
    let exercise = create_exercise(&db).await;

    let (policy, table, curve) = (
        StreakPolicy::default(),
        XpTable::default(),
        LevelCurve::default(),
    );

    let store = db.progress();
    let awarder = XpAwarder::new(&store, &policy, &table, &curve);
    let first = log_workout(&db, user.id, exercise.id, 100.0).await;
    complete_workout(&db.workouts(), &awarder, first.id, user.id, Utc::now())
        .await
        .unwrap();

    let heavier = log_workout(&db, user.id, exercise.id, 110.0).await;
    let one_commit = LimitedStore::new(&db, 1);
    let awarder = XpAwarder::new(&one_commit, &policy, &table, &curve);
    let outcome = complete_workout(&db.workouts(), &awarder, heavier.id, user.id, Utc::now())
        .await
        .unwrap();

    assert!(outcome.completion.is_some());
    assert!(outcome.record.is_none());
    assert_eq!(outcome.personal_records, vec![exercise.id]);
    assert_eq!(db.progress().load_progress(user.id).await.unwrap().total_xp, 200);
}
