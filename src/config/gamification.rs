// ABOUTME: Gamification configuration for streak policy, XP base values, and level curve
// ABOUTME: Defaults with STREAK_ and XP_ environment overrides, validated before use
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Gamification Configuration Module
//!
//! Holds the streak policy inputs, the base XP for each action, and the level curve.
//! Values can be overridden via environment variables with the `STREAK_` and `XP_` prefixes.

use std::env;
use std::str::FromStr;

use repforge_core::config::ConfigError;
use repforge_core::streak::{
    DayBoundary, StreakPolicy, DEFAULT_MULTIPLIER_TIERS, DEFAULT_RESET_THRESHOLD_DAYS,
};
use repforge_core::xp::{LevelCurve, XpTable, DEFAULT_XP_PER_LEVEL};
use serde::{Deserialize, Serialize};

/// Gamification configuration container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GamificationConfig {
    /// Streak reset threshold, multiplier tiers, and day counting
    pub streak: StreakSettings,
    /// Base XP per action
    pub xp: XpTable,
    /// XP needed per level
    pub xp_per_level: u64,
}

/// Streak policy inputs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakSettings {
    /// Inactive days that reset a streak
    pub reset_threshold_days: u32,
    /// `(minimum_streak_days, multiplier)` tiers in ascending order
    pub multipliers: Vec<(u32, f64)>,
    /// How inactive days are counted
    pub day_boundary: DayBoundary,
}

impl Default for StreakSettings {
    fn default() -> Self {
        Self {
            reset_threshold_days: DEFAULT_RESET_THRESHOLD_DAYS,
            multipliers: DEFAULT_MULTIPLIER_TIERS.to_vec(),
            day_boundary: DayBoundary::default(),
        }
    }
}

impl Default for GamificationConfig {
    fn default() -> Self {
        Self {
            streak: StreakSettings::default(),
            xp: XpTable::default(),
            xp_per_level: DEFAULT_XP_PER_LEVEL,
        }
    }
}

impl GamificationConfig {
    /// Load configuration from environment
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values or validation fails
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::default().apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the streak table, XP table, or level curve is invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.streak_policy()?;
        self.xp.validate()?;
        self.level_curve()?;
        Ok(())
    }

    /// Build the streak policy
    ///
    /// # Errors
    ///
    /// Returns an error if the threshold or multiplier table is invalid
    pub fn streak_policy(&self) -> Result<StreakPolicy, ConfigError> {
        StreakPolicy::new(
            self.streak.reset_threshold_days,
            &self.streak.multipliers,
            self.streak.day_boundary,
        )
    }

    /// Build the level curve
    ///
    /// # Errors
    ///
    /// Returns an error if `xp_per_level` is zero
    pub const fn level_curve(&self) -> Result<LevelCurve, ConfigError> {
        LevelCurve::new(self.xp_per_level)
    }

    /// Helper function to parse and apply an environment variable override
    fn apply_env_var<T: FromStr>(env_var_name: &str, target: &mut T) -> Result<(), ConfigError> {
        if let Ok(val) = env::var(env_var_name) {
            *target = val
                .trim()
                .parse()
                .map_err(|_| ConfigError::Parse(format!("Invalid {env_var_name}")))?;
        }
        Ok(())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut self) -> Result<Self, ConfigError> {
        // Streak policy
        Self::apply_env_var(
            "STREAK_RESET_THRESHOLD_DAYS",
            &mut self.streak.reset_threshold_days,
        )?;
        Self::apply_env_var("STREAK_DAY_BOUNDARY", &mut self.streak.day_boundary)?;
        if let Ok(val) = env::var("STREAK_MULTIPLIERS") {
            self.streak.multipliers = parse_multiplier_tiers(&val)?;
        }

        // XP table
        Self::apply_env_var("XP_WORKOUT_COMPLETED", &mut self.xp.workout_completed)?;
        Self::apply_env_var(
            "XP_PROGRAM_SESSION_COMPLETED",
            &mut self.xp.program_session_completed,
        )?;
        Self::apply_env_var("XP_PERSONAL_RECORD", &mut self.xp.personal_record)?;
        Self::apply_env_var("XP_PER_LEVEL", &mut self.xp_per_level)?;

        Ok(self)
    }
}

/// Parse `"0:1.0,7:1.05,14:1.1"` into `(days, multiplier)` tiers
///
/// # Errors
///
/// Returns an error if an entry is not `days:multiplier`
pub fn parse_multiplier_tiers(raw: &str) -> Result<Vec<(u32, f64)>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (days, multiplier) = entry.split_once(':').ok_or_else(|| {
                ConfigError::Parse(format!("Invalid STREAK_MULTIPLIERS entry: {entry}"))
            })?;
            let days = days.trim().parse::<u32>().map_err(|_| {
                ConfigError::Parse(format!("Invalid streak days in STREAK_MULTIPLIERS: {entry}"))
            })?;
            let multiplier = multiplier.trim().parse::<f64>().map_err(|_| {
                ConfigError::Parse(format!("Invalid multiplier in STREAK_MULTIPLIERS: {entry}"))
            })?;
            Ok((days, multiplier))
        })
        .collect()
}
