// ABOUTME: Experience point math: base values per action, streak-scaled awards, level curve
// ABOUTME: Pure functions consumed by the XP awarder and the progress endpoints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::errors::AppError;

/// Default XP for completing a free-form workout
pub const DEFAULT_WORKOUT_COMPLETED_XP: u32 = 100;
/// Default XP for completing a workout tied to a program session
pub const DEFAULT_PROGRAM_SESSION_COMPLETED_XP: u32 = 150;
/// Default XP for a personal record
pub const DEFAULT_PERSONAL_RECORD_XP: u32 = 50;
/// Default XP needed per level
pub const DEFAULT_XP_PER_LEVEL: u64 = 500;

/// Action that earns experience points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XpAction {
    /// Free-form workout completed
    WorkoutCompleted,
    /// Program session completed
    ProgramSessionCompleted,
    /// Personal record set
    PersonalRecord,
}

impl XpAction {
    /// Storage key
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WorkoutCompleted => "workout_completed",
            Self::ProgramSessionCompleted => "program_session_completed",
            Self::PersonalRecord => "personal_record",
        }
    }
}

impl Display for XpAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for XpAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "workout_completed" => Ok(Self::WorkoutCompleted),
            "program_session_completed" => Ok(Self::ProgramSessionCompleted),
            "personal_record" => Ok(Self::PersonalRecord),
            other => Err(AppError::invalid_input(format!("Invalid XP action: {other}"))),
        }
    }
}

/// Base XP granted per action before the streak multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpTable {
    /// Free-form workout completed
    pub workout_completed: u32,
    /// Program session completed
    pub program_session_completed: u32,
    /// Personal record set
    pub personal_record: u32,
}

impl Default for XpTable {
    fn default() -> Self {
        Self {
            workout_completed: DEFAULT_WORKOUT_COMPLETED_XP,
            program_session_completed: DEFAULT_PROGRAM_SESSION_COMPLETED_XP,
            personal_record: DEFAULT_PERSONAL_RECORD_XP,
        }
    }
}

impl XpTable {
    /// Base XP for `action`
    #[must_use]
    pub const fn base_for(&self, action: XpAction) -> u32 {
        match action {
            XpAction::WorkoutCompleted => self.workout_completed,
            XpAction::ProgramSessionCompleted => self.program_session_completed,
            XpAction::PersonalRecord => self.personal_record,
        }
    }

    /// Validate that every action earns something
    ///
    /// # Errors
    ///
    /// Returns an error if any base value is zero
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.workout_completed == 0
            || self.program_session_completed == 0
            || self.personal_record == 0
        {
            return Err(ConfigError::ValueOutOfRange("XP base values must be > 0"));
        }
        Ok(())
    }
}

/// Scale `base_xp` by a streak multiplier, rounding half away from zero
#[must_use]
pub fn scaled_xp(base_xp: u32, multiplier: f64) -> u32 {
    let scaled = (f64::from(base_xp) * multiplier).round();
    if scaled >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        scaled.max(0.0) as u32
    }
}

/// Linear level curve: every `xp_per_level` points is one level, starting at level 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCurve {
    xp_per_level: u64,
}

impl Default for LevelCurve {
    fn default() -> Self {
        Self {
            xp_per_level: DEFAULT_XP_PER_LEVEL,
        }
    }
}

impl LevelCurve {
    /// Build a curve
    ///
    /// # Errors
    ///
    /// Returns an error if `xp_per_level` is zero
    pub const fn new(xp_per_level: u64) -> Result<Self, ConfigError> {
        if xp_per_level == 0 {
            return Err(ConfigError::ValueOutOfRange("xp_per_level must be > 0"));
        }
        Ok(Self { xp_per_level })
    }

    /// XP per level
    #[must_use]
    pub const fn xp_per_level(&self) -> u64 {
        self.xp_per_level
    }

    /// Level reached with `total_xp`
    #[must_use]
    pub const fn level_for(&self, total_xp: u64) -> u32 {
        let level = total_xp / self.xp_per_level + 1;
        if level > u32::MAX as u64 {
            u32::MAX
        } else {
            level as u32
        }
    }

    /// Progress snapshot for `total_xp`
    #[must_use]
    pub const fn progress(&self, total_xp: u64) -> LevelProgress {
        let level = self.level_for(total_xp);
        let into_level = total_xp % self.xp_per_level;
        LevelProgress {
            level,
            total_xp,
            xp_into_level: into_level,
            xp_to_next_level: self.xp_per_level - into_level,
            next_level_at: total_xp - into_level + self.xp_per_level,
        }
    }
}

/// Where a user sits on the level curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    /// Current level (starts at 1)
    pub level: u32,
    /// Lifetime XP
    pub total_xp: u64,
    /// XP earned inside the current level
    pub xp_into_level: u64,
    /// XP still needed for the next level
    pub xp_to_next_level: u64,
    /// Total XP at which the next level starts
    pub next_level_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_xp_rounds() {
        assert_eq!(scaled_xp(100, 1.0), 100);
        assert_eq!(scaled_xp(100, 1.05), 105);
        assert_eq!(scaled_xp(150, 1.35), 203);
        assert_eq!(scaled_xp(10, 1.05), 11);
        assert_eq!(scaled_xp(u32::MAX, 2.0), u32::MAX);
    }

    #[test]
    fn test_table_lookup_and_validation() {
        let table = XpTable::default();
        assert_eq!(table.base_for(XpAction::WorkoutCompleted), 100);
        assert_eq!(table.base_for(XpAction::ProgramSessionCompleted), 150);
        assert!(table.validate().is_ok());

        let broken = XpTable {
            personal_record: 0,
            ..table
        };
        assert!(broken.validate().is_err());
    }

    #[test]
    fn test_level_curve() {
        let curve = LevelCurve::default();
        assert_eq!(curve.level_for(0), 1);
        assert_eq!(curve.level_for(499), 1);
        assert_eq!(curve.level_for(500), 2);

        let progress = curve.progress(1_205);
        assert_eq!(progress.level, 3);
        assert_eq!(progress.xp_into_level, 205);
        assert_eq!(progress.xp_to_next_level, 295);
        assert_eq!(progress.next_level_at, 1_500);

        assert!(LevelCurve::new(0).is_err());
    }

    #[test]
    fn test_action_parse() {
        assert_eq!(
            "personal_record".parse::<XpAction>().unwrap(),
            XpAction::PersonalRecord
        );
        assert!("pushups".parse::<XpAction>().is_err());
    }
}
