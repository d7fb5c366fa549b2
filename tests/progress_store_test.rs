// ABOUTME: Database tests for the streak/XP progress store and workout record detection
// ABOUTME: Verifies version-checked commits, ledger history, and personal record rules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::{Duration, Utc};
use common::{create_test_database, create_test_user};
use repforge_core::streak::StreakState;
use repforge_core::taxonomy::{ExerciseCategory, Level, MuscleGroup};
use repforge_core::xp::XpAction;
use repforge_server::database::exercises::ExerciseInput;
use repforge_server::database::progress::{ProgressCommit, StreakStore, XpLedgerEntry};
use repforge_server::database::workouts::{WorkoutInput, WorkoutSet};
use uuid::Uuid;

fn entry(user_id: Uuid, awarded_xp: u32, streak_days: u32) -> XpLedgerEntry {
    XpLedgerEntry {
        id: Uuid::new_v4(),
        user_id,
        action: XpAction::WorkoutCompleted,
        base_xp: awarded_xp,
        multiplier: 1.0,
        awarded_xp,
        streak_days,
        source_id: None,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_new_user_progress_starts_empty() {
    let db = create_test_database().await.unwrap();
    let user = create_test_user(&db).await.unwrap();

    let progress = db.progress().load_progress(user.id).await.unwrap();
    assert_eq!(progress.streak.current_streak_days, 0);
    assert_eq!(progress.total_xp, 0);
    assert_eq!(progress.version, 0);
    assert!((progress.streak.last_activity_at - user.created_at).num_milliseconds().abs() < 1);
}

#[tokio::test]
async fn test_missing_progress_is_not_found() {
    let db = create_test_database().await.unwrap();
    let err = db.progress().load_progress(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.http_status(), 404);
}

#[tokio::test]
async fn test_commit_applies_once_per_version() {
    let db = create_test_database().await.unwrap();
    let user = create_test_user(&db).await.unwrap();
    let store = db.progress();
    let now = Utc::now();

    let commit = ProgressCommit {
        expected_version: 0,
        streak: StreakState {
            current_streak_days: 1,
            last_activity_at: now,
        },
        entry: entry(user.id, 100, 1),
    };
    assert!(store.commit_progress(user.id, &commit).await.unwrap());

    let stale = ProgressCommit {
        entry: entry(user.id, 100, 1),
        ..commit
    };
    assert!(!store.commit_progress(user.id, &stale).await.unwrap());

    let progress = store.load_progress(user.id).await.unwrap();
    assert_eq!(progress.version, 1);
    assert_eq!(progress.total_xp, 100);
    assert_eq!(progress.streak.current_streak_days, 1);

    let history = store.history(user.id, 10, 0).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].awarded_xp, 100);
}

#[tokio::test]
async fn test_history_is_newest_first_and_paged() {
    let db = create_test_database().await.unwrap();
    let user = create_test_user(&db).await.unwrap();
    let store = db.progress();
    let start = Utc::now();

    for (version, xp) in [(0_i64, 100_u32), (1, 105), (2, 110)] {
        let day = u32::try_from(version).unwrap() + 1;
        let mut ledger_entry = entry(user.id, xp, day);
        ledger_entry.created_at = start + Duration::days(version);
        let commit = ProgressCommit {
            expected_version: version,
            streak: StreakState {
                current_streak_days: day,
                last_activity_at: ledger_entry.created_at,
            },
            entry: ledger_entry,
        };
        assert!(store.commit_progress(user.id, &commit).await.unwrap());
    }

    let page = store.history(user.id, 2, 0).await.unwrap();
    assert_eq!(
        page.iter().map(|e| e.awarded_xp).collect::<Vec<_>>(),
        vec![110, 105]
    );
    let rest = store.history(user.id, 2, 2).await.unwrap();
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].awarded_xp, 100);

    assert_eq!(store.load_progress(user.id).await.unwrap().total_xp, 315);
}

#[tokio::test]
async fn test_personal_records_require_prior_attempt() {
    let db = create_test_database().await.unwrap();
    let user = create_test_user(&db).await.unwrap();
    let exercise = db
        .exercises()
        .create(ExerciseInput {
            name: "Overhead Press".into(),
            description: None,
            category: ExerciseCategory::default(),
            level: Level::default(),
            force: None,
            mechanic: None,
            equipment: None,
            primary_muscles: vec![MuscleGroup::Shoulders],
            secondary_muscles: Vec::new(),
            instructions: vec!["Press overhead".into()],
        })
        .await
        .unwrap();

    let workouts = db.workouts();
    let log = |weight: f64| WorkoutInput {
        title: "Press".into(),
        notes: None,
        program_id: None,
        session_index: None,
        sets: vec![WorkoutSet {
            exercise_id: exercise.id,
            reps: Some(5),
            weight_kg: Some(weight),
            duration_seconds: None,
        }],
    };

    let first = workouts.create(user.id, log(50.0)).await.unwrap();
    let first = workouts
        .mark_completed(first.id, user.id, Utc::now())
        .await
        .unwrap();
    assert!(workouts.personal_records(&first).await.unwrap().is_empty());

    let equal = workouts.create(user.id, log(50.0)).await.unwrap();
    let equal = workouts
        .mark_completed(equal.id, user.id, Utc::now())
        .await
        .unwrap();
    assert!(workouts.personal_records(&equal).await.unwrap().is_empty());

    let heavier = workouts.create(user.id, log(52.5)).await.unwrap();
    let heavier = workouts
        .mark_completed(heavier.id, user.id, Utc::now())
        .await
        .unwrap();
    assert_eq!(
        workouts.personal_records(&heavier).await.unwrap(),
        vec![exercise.id]
    );

    let again = workouts.mark_completed(heavier.id, user.id, Utc::now()).await;
    assert_eq!(again.unwrap_err().http_status(), 409);
}

#[tokio::test]
async fn test_file_database_persists_progress_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("data/repforge.db").display());

    let user_id = {
        let db = repforge_server::database::Database::new(&url).await.unwrap();
        let user = create_test_user(&db).await.unwrap();
        let commit = ProgressCommit {
            expected_version: 0,
            streak: StreakState {
                current_streak_days: 1,
                last_activity_at: Utc::now(),
            },
            entry: entry(user.id, 100, 1),
        };
        assert!(db.progress().commit_progress(user.id, &commit).await.unwrap());
        user.id
    };

    let db = repforge_server::database::Database::new(&url).await.unwrap();
    let progress = db.progress().load_progress(user_id).await.unwrap();
    assert_eq!(progress.total_xp, 100);
    assert_eq!(progress.version, 1);
}
