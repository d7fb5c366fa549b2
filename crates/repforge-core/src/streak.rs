// ABOUTME: Streak policy and evaluator for consecutive-day activity tracking
// ABOUTME: Decides continue/increment/reset for a user's streak and yields the XP multiplier
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Streak evaluation
//!
//! A streak counts consecutive days with a qualifying activity. [`StreakPolicy`] holds the
//! reset threshold and the multiplier table; [`StreakEvaluator::evaluate`] is a pure function
//! from a [`StreakState`] snapshot and "now" to the successor state and multiplier.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;

/// Default number of inactive days that resets a streak
pub const DEFAULT_RESET_THRESHOLD_DAYS: u32 = 2;

/// Default multiplier tiers as `(minimum_streak_days, multiplier)`
pub const DEFAULT_MULTIPLIER_TIERS: [(u32, f64); 8] = [
    (0, 1.0),
    (7, 1.05),
    (14, 1.1),
    (30, 1.2),
    (60, 1.3),
    (90, 1.35),
    (180, 1.5),
    (365, 2.0),
];

/// Errors produced by streak evaluation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreakError {
    /// `now` precedes the recorded last activity (clock skew or replayed event)
    #[error("activity at {now} precedes last recorded activity at {last_activity_at}")]
    InvalidTimestampOrder {
        /// Last recorded activity
        last_activity_at: DateTime<Utc>,
        /// Rejected evaluation time
        now: DateTime<Utc>,
    },
}

/// How inactive days are counted between two timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayBoundary {
    /// Difference between UTC calendar dates (23:00 then 01:00 next day counts as 1)
    #[default]
    Calendar,
    /// Whole 24-hour periods elapsed (23:00 then 01:00 next day counts as 0)
    Elapsed,
}

impl DayBoundary {
    /// Count inactive days from `from` to `to`. Callers guarantee `from <= to`.
    #[must_use]
    pub fn days_between(self, from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
        match self {
            Self::Calendar => (to.date_naive() - from.date_naive()).num_days(),
            Self::Elapsed => (to - from).num_days(),
        }
    }

    /// Stable string form
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Calendar => "calendar",
            Self::Elapsed => "elapsed",
        }
    }
}

impl FromStr for DayBoundary {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "calendar" => Ok(Self::Calendar),
            "elapsed" => Ok(Self::Elapsed),
            other => Err(ConfigError::Parse(format!("Invalid day boundary: {other}"))),
        }
    }
}

/// Immutable streak configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreakPolicy {
    reset_threshold_days: u32,
    multiplier_table: BTreeMap<u32, f64>,
    day_boundary: DayBoundary,
}

impl StreakPolicy {
    /// Build a policy, validating every table invariant
    ///
    /// # Errors
    ///
    /// Returns an error if the threshold is zero, key `0` is missing or not `1.0`,
    /// a multiplier is below `1.0`, keys repeat or are unsorted, or multipliers decrease.
    pub fn new(
        reset_threshold_days: u32,
        tiers: &[(u32, f64)],
        day_boundary: DayBoundary,
    ) -> Result<Self, ConfigError> {
        if reset_threshold_days == 0 {
            return Err(ConfigError::ValueOutOfRange(
                "streak reset_threshold_days must be >= 1",
            ));
        }

        for pair in tiers.windows(2) {
            if pair[1].0 <= pair[0].0 {
                return Err(ConfigError::InvalidRange(
                    "streak multiplier keys must be sorted ascending without duplicates",
                ));
            }
            if pair[1].1 < pair[0].1 {
                return Err(ConfigError::InvalidRange(
                    "streak multipliers must be non-decreasing",
                ));
            }
        }

        match tiers.first() {
            Some(&(0, multiplier)) if (multiplier - 1.0).abs() < f64::EPSILON => {}
            Some(&(0, _)) => {
                return Err(ConfigError::ValueOutOfRange(
                    "streak multiplier for key 0 must be 1.0",
                ))
            }
            _ => return Err(ConfigError::MissingField("streak multiplier key 0")),
        }

        if tiers.iter().any(|&(_, m)| !m.is_finite() || m < 1.0) {
            return Err(ConfigError::ValueOutOfRange(
                "streak multipliers must be finite and >= 1.0",
            ));
        }

        Ok(Self {
            reset_threshold_days,
            multiplier_table: tiers.iter().copied().collect(),
            day_boundary,
        })
    }

    /// Days of inactivity after which a streak resets
    #[must_use]
    pub const fn reset_threshold_days(&self) -> u32 {
        self.reset_threshold_days
    }

    /// Day-counting rule
    #[must_use]
    pub const fn day_boundary(&self) -> DayBoundary {
        self.day_boundary
    }

    /// Multiplier tiers in ascending key order
    pub fn tiers(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.multiplier_table.iter().map(|(&k, &v)| (k, v))
    }

    /// Multiplier for the largest tier key `<= streak_days`
    #[must_use]
    pub fn multiplier_for(&self, streak_days: u32) -> f64 {
        self.multiplier_table
            .range(..=streak_days)
            .next_back()
            .map_or(1.0, |(_, &m)| m)
    }

    /// Tier key that applies at `streak_days`
    #[must_use]
    pub fn tier_for(&self, streak_days: u32) -> u32 {
        self.multiplier_table
            .range(..=streak_days)
            .next_back()
            .map_or(0, |(&k, _)| k)
    }
}

impl Default for StreakPolicy {
    fn default() -> Self {
        Self {
            reset_threshold_days: DEFAULT_RESET_THRESHOLD_DAYS,
            multiplier_table: DEFAULT_MULTIPLIER_TIERS.into_iter().collect(),
            day_boundary: DayBoundary::default(),
        }
    }
}

/// Per-user streak snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    /// Consecutive active days
    pub current_streak_days: u32,
    /// Time of the last qualifying activity
    pub last_activity_at: DateTime<Utc>,
}

impl StreakState {
    /// Initial state for a user created at `created_at`
    #[must_use]
    pub const fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            current_streak_days: 0,
            last_activity_at: created_at,
        }
    }
}

/// What happened to the streak during an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakTransition {
    /// Same-day repeat, length unchanged
    Continued,
    /// Next-day activity, length +1
    Incremented,
    /// Gap reached the reset threshold, length back to 1
    Reset,
}

impl fmt::Display for StreakTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continued => write!(f, "continued"),
            Self::Incremented => write!(f, "incremented"),
            Self::Reset => write!(f, "reset"),
        }
    }
}

/// Result of evaluating one activity event
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StreakEvaluation {
    /// Successor state to persist
    pub state: StreakState,
    /// XP multiplier for this activity
    pub multiplier: f64,
    /// Branch taken
    pub transition: StreakTransition,
    /// Inactive days observed
    pub inactive_days: i64,
}

/// Stateless streak evaluator
pub struct StreakEvaluator;

impl StreakEvaluator {
    /// Evaluate an activity at `now` against `state`
    ///
    /// # Errors
    ///
    /// Returns [`StreakError::InvalidTimestampOrder`] when `now` precedes
    /// `state.last_activity_at`.
    pub fn evaluate(
        state: &StreakState,
        now: DateTime<Utc>,
        policy: &StreakPolicy,
    ) -> Result<StreakEvaluation, StreakError> {
        if now < state.last_activity_at {
            return Err(StreakError::InvalidTimestampOrder {
                last_activity_at: state.last_activity_at,
                now,
            });
        }

        let inactive_days = policy
            .day_boundary
            .days_between(state.last_activity_at, now);

        let (current_streak_days, transition) =
            if inactive_days >= i64::from(policy.reset_threshold_days) {
                (1, StreakTransition::Reset)
            } else if inactive_days >= 1 {
                (
                    state.current_streak_days.saturating_add(1),
                    StreakTransition::Incremented,
                )
            } else {
                (state.current_streak_days.max(1), StreakTransition::Continued)
            };

        Ok(StreakEvaluation {
            state: StreakState {
                current_streak_days,
                last_activity_at: now,
            },
            multiplier: policy.multiplier_for(current_streak_days),
            transition,
            inactive_days,
        })
    }
}
