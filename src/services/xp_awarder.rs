// ABOUTME: Streak-aware XP awarding: evaluate the streak, scale base XP, and commit atomically
// ABOUTME: Retries on optimistic-version conflicts so concurrent completions never lose XP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use repforge_core::errors::{AppError, AppResult};
use repforge_core::streak::{StreakEvaluator, StreakPolicy, StreakState, StreakTransition};
use repforge_core::xp::{scaled_xp, LevelCurve, XpAction, XpTable};
use tracing::debug;
use uuid::Uuid;

use crate::database::progress::{ProgressCommit, StreakStore, XpLedgerEntry};
use crate::logging::AppLogger;

/// Commit attempts before giving up on a contended user
pub const MAX_COMMIT_ATTEMPTS: u32 = 3;

/// Result of a committed award
#[derive(Debug, Clone, PartialEq)]
pub struct XpAwardOutcome {
    /// Ledger entry written
    pub entry: XpLedgerEntry,
    /// Streak state after the award
    pub streak: StreakState,
    /// How the streak moved
    pub transition: StreakTransition,
    /// Multiplier applied
    pub multiplier: f64,
    /// Lifetime XP after the award
    pub total_xp: u64,
    /// Level before the award
    pub level_before: u32,
    /// Level after the award
    pub level_after: u32,
    /// Multiplier tier threshold before the award
    pub tier_before: u32,
    /// Multiplier tier threshold after the award
    pub tier_after: u32,
}

impl XpAwardOutcome {
    /// Whether the award crossed a level boundary
    #[must_use]
    pub const fn leveled_up(&self) -> bool {
        self.level_after > self.level_before
    }

    /// Whether the streak entered a higher multiplier tier
    #[must_use]
    pub const fn entered_new_tier(&self) -> bool {
        self.tier_after > self.tier_before
    }
}

/// Awards XP against a [`StreakStore`]
pub struct XpAwarder<'a> {
    store: &'a dyn StreakStore,
    policy: &'a StreakPolicy,
    table: &'a XpTable,
    curve: &'a LevelCurve,
}

impl<'a> XpAwarder<'a> {
    /// Create an awarder over a store and the active gamification rules
    #[must_use]
    pub const fn new(
        store: &'a dyn StreakStore,
        policy: &'a StreakPolicy,
        table: &'a XpTable,
        curve: &'a LevelCurve,
    ) -> Self {
        Self {
            store,
            policy,
            table,
            curve,
        }
    }

    /// Award XP for `action` performed at `now`
    ///
    /// Each attempt re-reads the stored progress, so a concurrent award is always
    /// evaluated on top of the other's result. After a lost version race the award
    /// is timed no earlier than the rival's committed activity.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTimestampOrder` when `now` precedes the last recorded activity,
    /// `ResourceConflict` when every attempt lost the version race, or a storage error
    pub async fn award(
        &self,
        user_id: Uuid,
        action: XpAction,
        now: DateTime<Utc>,
        source_id: Option<Uuid>,
    ) -> AppResult<XpAwardOutcome> {
        self.award_with_ordering(user_id, action, now, source_id, false)
            .await
    }

    /// Award XP for `action` immediately after an award this request already committed
    ///
    /// The follow-up is timed at the earlier award's activity, or later if another
    /// award has landed since, so it never fails on timestamp order.
    ///
    /// # Errors
    ///
    /// Returns `ResourceConflict` when every attempt lost the version race, or a storage error
    pub async fn award_follow_up(
        &self,
        user_id: Uuid,
        action: XpAction,
        after: &XpAwardOutcome,
        source_id: Option<Uuid>,
    ) -> AppResult<XpAwardOutcome> {
        self.award_with_ordering(user_id, action, after.entry.created_at, source_id, true)
            .await
    }

    async fn award_with_ordering(
        &self,
        user_id: Uuid,
        action: XpAction,
        now: DateTime<Utc>,
        source_id: Option<Uuid>,
        mut clamp_to_stored: bool,
    ) -> AppResult<XpAwardOutcome> {
        let base_xp = self.table.base_for(action);

        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let progress = self.store.load_progress(user_id).await?;
            let at = if clamp_to_stored {
                now.max(progress.streak.last_activity_at)
            } else {
                now
            };
            let evaluation = StreakEvaluator::evaluate(&progress.streak, at, self.policy)?;
            let awarded_xp = scaled_xp(base_xp, evaluation.multiplier);

            let commit = ProgressCommit {
                expected_version: progress.version,
                streak: evaluation.state,
                entry: XpLedgerEntry {
                    id: Uuid::new_v4(),
                    user_id,
                    action,
                    base_xp,
                    multiplier: evaluation.multiplier,
                    awarded_xp,
                    streak_days: evaluation.state.current_streak_days,
                    source_id,
                    created_at: at,
                },
            };

            if !self.store.commit_progress(user_id, &commit).await? {
                debug!(
                    user.id = %user_id,
                    attempt,
                    "XP commit lost version race, retrying"
                );
                // The winner's activity may be later than ours; ours still counts.
                clamp_to_stored = true;
                continue;
            }

            AppLogger::log_xp_award(
                &user_id.to_string(),
                action.as_str(),
                base_xp,
                evaluation.multiplier,
                awarded_xp,
                evaluation.state.current_streak_days,
            );

            let total_xp = progress.total_xp.saturating_add(u64::from(awarded_xp));
            return Ok(XpAwardOutcome {
                entry: commit.entry,
                streak: evaluation.state,
                transition: evaluation.transition,
                multiplier: evaluation.multiplier,
                total_xp,
                level_before: self.curve.level_for(progress.total_xp),
                level_after: self.curve.level_for(total_xp),
                tier_before: self.policy.tier_for(progress.streak.current_streak_days),
                tier_after: self.policy.tier_for(evaluation.state.current_streak_days),
            });
        }

        Err(AppError::conflict(format!(
            "XP award abandoned after {MAX_COMMIT_ATTEMPTS} concurrent update conflicts"
        ))
        .with_user_id(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::progress::UserProgress;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use repforge_core::errors::ErrorCode;
    use std::sync::Mutex;

    struct FakeStore {
        progress: Mutex<UserProgress>,
        forced_conflicts: Mutex<u32>,
        rivals: Mutex<Vec<XpLedgerEntry>>,
        ledger: Mutex<Vec<XpLedgerEntry>>,
    }

    impl FakeStore {
        fn new(streak: StreakState, total_xp: u64) -> Self {
            Self {
                progress: Mutex::new(UserProgress {
                    user_id: Uuid::nil(),
                    streak,
                    total_xp,
                    version: 0,
                }),
                forced_conflicts: Mutex::new(0),
                rivals: Mutex::new(Vec::new()),
                ledger: Mutex::new(Vec::new()),
            }
        }

        /// Queue awards from another request that land just before our next commit
        fn with_rival_awards(self, rivals: Vec<XpLedgerEntry>) -> Self {
            *self.rivals.lock().unwrap() = rivals;
            self
        }

        fn apply(&self, progress: &mut UserProgress, streak: StreakState, entry: XpLedgerEntry) {
            progress.streak = streak;
            progress.total_xp += u64::from(entry.awarded_xp);
            progress.version += 1;
            self.ledger.lock().unwrap().push(entry);
        }

        fn with_conflicts(self, conflicts: u32) -> Self {
            *self.forced_conflicts.lock().unwrap() = conflicts;
            self
        }
    }

    #[async_trait]
    impl StreakStore for FakeStore {
        async fn load_progress(&self, _user_id: Uuid) -> AppResult<UserProgress> {
            Ok(*self.progress.lock().unwrap())
        }

        async fn commit_progress(&self, _user_id: Uuid, commit: &ProgressCommit) -> AppResult<bool> {
            let mut conflicts = self.forced_conflicts.lock().unwrap();
            if *conflicts > 0 {
                *conflicts -= 1;
                return Ok(false);
            }
            let mut progress = self.progress.lock().unwrap();
            if let Some(rival) = self.rivals.lock().unwrap().pop() {
                let streak = StreakState {
                    current_streak_days: rival.streak_days,
                    last_activity_at: rival.created_at,
                };
                self.apply(&mut progress, streak, rival);
            }
            if progress.version != commit.expected_version {
                return Ok(false);
            }
            self.apply(&mut progress, commit.streak, commit.entry.clone());
            Ok(true)
        }
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap()
    }

    fn rules() -> (StreakPolicy, XpTable, LevelCurve) {
        (
            StreakPolicy::default(),
            XpTable::default(),
            LevelCurve::default(),
        )
    }

    #[tokio::test]
    async fn test_consecutive_day_increments_streak() {
        let store = FakeStore::new(
            StreakState {
                current_streak_days: 6,
                last_activity_at: at(1, 18),
            },
            0,
        );
        let (policy, table, curve) = rules();
        let awarder = XpAwarder::new(&store, &policy, &table, &curve);

        let outcome = awarder
            .award(Uuid::nil(), XpAction::WorkoutCompleted, at(2, 7), None)
            .await
            .unwrap();

        assert_eq!(outcome.transition, StreakTransition::Incremented);
        assert_eq!(outcome.streak.current_streak_days, 7);
        assert!((outcome.multiplier - 1.05).abs() < f64::EPSILON);
        assert_eq!(outcome.entry.awarded_xp, 105);
        assert!(outcome.entered_new_tier());
        assert_eq!(store.ledger.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_long_gap_resets_streak() {
        let store = FakeStore::new(
            StreakState {
                current_streak_days: 40,
                last_activity_at: at(1, 12),
            },
            0,
        );
        let (policy, table, curve) = rules();
        let awarder = XpAwarder::new(&store, &policy, &table, &curve);

        let outcome = awarder
            .award(Uuid::nil(), XpAction::WorkoutCompleted, at(5, 12), None)
            .await
            .unwrap();

        assert_eq!(outcome.transition, StreakTransition::Reset);
        assert_eq!(outcome.streak.current_streak_days, 1);
        assert_eq!(outcome.entry.awarded_xp, 100);
        assert!(!outcome.entered_new_tier());
    }

    #[tokio::test]
    async fn test_out_of_order_timestamp_is_rejected_without_commit() {
        let store = FakeStore::new(
            StreakState {
                current_streak_days: 3,
                last_activity_at: at(10, 12),
            },
            0,
        );
        let (policy, table, curve) = rules();
        let awarder = XpAwarder::new(&store, &policy, &table, &curve);

        let err = awarder
            .award(
                Uuid::nil(),
                XpAction::WorkoutCompleted,
                at(10, 12) - Duration::seconds(1),
                None,
            )
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidTimestampOrder);
        assert!(store.ledger.lock().unwrap().is_empty());
        assert_eq!(store.progress.lock().unwrap().version, 0);
    }

    #[tokio::test]
    async fn test_version_conflicts_retry_then_succeed() {
        let store = FakeStore::new(StreakState::new(at(1, 8)), 450).with_conflicts(2);
        let (policy, table, curve) = rules();
        let awarder = XpAwarder::new(&store, &policy, &table, &curve);

        let outcome = awarder
            .award(Uuid::nil(), XpAction::WorkoutCompleted, at(1, 9), None)
            .await
            .unwrap();

        assert_eq!(outcome.total_xp, 550);
        assert!(outcome.leveled_up());
        assert_eq!(outcome.level_after, 2);
    }

    #[tokio::test]
    async fn test_exhausted_retries_report_conflict() {
        let store =
            FakeStore::new(StreakState::new(at(1, 8)), 0).with_conflicts(MAX_COMMIT_ATTEMPTS);
        let (policy, table, curve) = rules();
        let awarder = XpAwarder::new(&store, &policy, &table, &curve);

        let err = awarder
            .award(Uuid::nil(), XpAction::PersonalRecord, at(1, 9), None)
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ResourceConflict);
        assert!(store.ledger.lock().unwrap().is_empty());
    }

    fn rival_award(created_at: DateTime<Utc>, streak_days: u32) -> XpLedgerEntry {
        XpLedgerEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            action: XpAction::WorkoutCompleted,
            base_xp: 100,
            multiplier: 1.0,
            awarded_xp: 100,
            streak_days,
            source_id: None,
            created_at,
        }
    }

    #[tokio::test]
    async fn test_later_rival_commit_does_not_drop_award() {
        let store = FakeStore::new(StreakState::new(at(1, 8)), 0)
            .with_rival_awards(vec![rival_award(at(1, 9) + Duration::milliseconds(5), 1)]);
        let (policy, table, curve) = rules();
        let awarder = XpAwarder::new(&store, &policy, &table, &curve);

        let outcome = awarder
            .award(Uuid::nil(), XpAction::WorkoutCompleted, at(1, 9), None)
            .await
            .unwrap();

        assert_eq!(outcome.transition, StreakTransition::Continued);
        assert_eq!(outcome.entry.awarded_xp, 100);
        assert_eq!(outcome.total_xp, 200);
        assert_eq!(
            outcome.entry.created_at,
            at(1, 9) + Duration::milliseconds(5)
        );

        let progress = *store.progress.lock().unwrap();
        assert_eq!(progress.version, 2);
        assert_eq!(progress.total_xp, 200);
        assert_eq!(store.ledger.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rival_on_next_day_still_counts_both() {
        let store = FakeStore::new(
            StreakState {
                current_streak_days: 6,
                last_activity_at: at(1, 23),
            },
            0,
        )
        .with_rival_awards(vec![rival_award(at(2, 0) + Duration::seconds(1), 7)]);
        let (policy, table, curve) = rules();
        let awarder = XpAwarder::new(&store, &policy, &table, &curve);

        let outcome = awarder
            .award(
                Uuid::nil(),
                XpAction::WorkoutCompleted,
                at(1, 23) + Duration::minutes(59),
                None,
            )
            .await
            .unwrap();

        assert_eq!(outcome.transition, StreakTransition::Continued);
        assert_eq!(outcome.streak.current_streak_days, 7);
        assert_eq!(outcome.entry.awarded_xp, 105);
        assert_eq!(store.progress.lock().unwrap().total_xp, 205);
    }

    #[tokio::test]
    async fn test_follow_up_award_lands_after_rival() {
        let store = FakeStore::new(StreakState::new(at(1, 8)), 0);
        let (policy, table, curve) = rules();
        let awarder = XpAwarder::new(&store, &policy, &table, &curve);

        let completion = awarder
            .award(Uuid::nil(), XpAction::WorkoutCompleted, at(1, 9), None)
            .await
            .unwrap();

        // Another request commits a later activity before the follow-up loads
        {
            let mut progress = store.progress.lock().unwrap();
            let rival = rival_award(at(1, 10), 1);
            let streak = StreakState {
                current_streak_days: 1,
                last_activity_at: rival.created_at,
            };
            store.apply(&mut progress, streak, rival);
        }

        let record = awarder
            .award_follow_up(Uuid::nil(), XpAction::PersonalRecord, &completion, None)
            .await
            .unwrap();

        assert_eq!(record.entry.created_at, at(1, 10));
        assert_eq!(record.entry.awarded_xp, 50);
        assert_eq!(record.total_xp, 250);
    }
}
