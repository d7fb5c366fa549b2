// ABOUTME: Tests for environment-driven server and gamification configuration
// ABOUTME: Runs serially because each test mutates process environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::env;

use repforge_core::streak::DayBoundary;
use repforge_server::config::environment::{Environment, ServerConfig};
use repforge_server::config::gamification::GamificationConfig;
use serial_test::serial;

const SERVER_VARS: &[&str] = &[
    "ENVIRONMENT",
    "JWT_SECRET",
    "HTTP_PORT",
    "DATABASE_URL",
    "JWT_EXPIRY_HOURS",
    "BCRYPT_COST",
    "CORS_ALLOWED_ORIGINS",
];

const GAMIFICATION_VARS: &[&str] = &[
    "STREAK_RESET_THRESHOLD_DAYS",
    "STREAK_DAY_BOUNDARY",
    "STREAK_MULTIPLIERS",
    "XP_WORKOUT_COMPLETED",
    "XP_PROGRAM_SESSION_COMPLETED",
    "XP_PERSONAL_RECORD",
    "XP_PER_LEVEL",
];

fn clear(vars: &[&str]) {
    for var in vars {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_server_config_defaults_in_development() {
    clear(SERVER_VARS);

    let config = ServerConfig::from_env().unwrap();
    assert_eq!(config.environment, Environment::Development);
    assert!(config.auth.jwt_secret.len() >= 32);
    assert!(config.auth.jwt_expiry_hours > 0);
    assert_eq!(config.cors.allowed_origins, "*");
}

#[test]
#[serial]
fn test_server_config_reads_overrides() {
    clear(SERVER_VARS);
    env::set_var("HTTP_PORT", "9191");
    env::set_var("JWT_SECRET", "an-explicit-secret-that-is-long-enough-42");
    env::set_var("JWT_EXPIRY_HOURS", "2");
    env::set_var("BCRYPT_COST", "6");
    env::set_var("CORS_ALLOWED_ORIGINS", "https://app.example.com");

    let config = ServerConfig::from_env().unwrap();
    assert_eq!(config.http_port, 9191);
    assert_eq!(config.auth.jwt_expiry_hours, 2);
    assert_eq!(config.auth.bcrypt_cost, 6);
    assert_eq!(config.cors.allowed_origins, "https://app.example.com");

    clear(SERVER_VARS);
}

#[test]
#[serial]
fn test_server_config_rejects_bad_values() {
    clear(SERVER_VARS);
    env::set_var("HTTP_PORT", "not-a-port");
    assert!(ServerConfig::from_env().is_err());

    clear(SERVER_VARS);
    env::set_var("BCRYPT_COST", "2");
    assert!(ServerConfig::from_env().is_err());

    clear(SERVER_VARS);
    env::set_var("JWT_SECRET", "short");
    assert!(ServerConfig::from_env().is_err());

    clear(SERVER_VARS);
    env::set_var("ENVIRONMENT", "production");
    assert!(ServerConfig::from_env().is_err());

    clear(SERVER_VARS);
}

#[test]
#[serial]
fn test_gamification_defaults() {
    clear(GAMIFICATION_VARS);

    let config = GamificationConfig::load().unwrap();
    let policy = config.streak_policy().unwrap();
    assert_eq!(policy.reset_threshold_days(), 2);
    assert_eq!(policy.day_boundary(), DayBoundary::Calendar);
    assert!((policy.multiplier_for(7) - 1.05).abs() < f64::EPSILON);
    assert!((policy.multiplier_for(365) - 2.0).abs() < f64::EPSILON);
    assert_eq!(config.xp.workout_completed, 100);
    assert_eq!(config.level_curve().unwrap().level_for(1_000), 3);
}

#[test]
#[serial]
fn test_gamification_env_overrides() {
    clear(GAMIFICATION_VARS);
    env::set_var("STREAK_RESET_THRESHOLD_DAYS", "3");
    env::set_var("STREAK_DAY_BOUNDARY", "elapsed");
    env::set_var("STREAK_MULTIPLIERS", "0:1.0,3:1.5");
    env::set_var("XP_WORKOUT_COMPLETED", "40");
    env::set_var("XP_PER_LEVEL", "200");

    let config = GamificationConfig::load().unwrap();
    let policy = config.streak_policy().unwrap();
    assert_eq!(policy.reset_threshold_days(), 3);
    assert_eq!(policy.day_boundary(), DayBoundary::Elapsed);
    assert!((policy.multiplier_for(3) - 1.5).abs() < f64::EPSILON);
    assert_eq!(config.xp.workout_completed, 40);
    assert_eq!(config.level_curve().unwrap().level_for(400), 3);

    clear(GAMIFICATION_VARS);
}

#[test]
#[serial]
fn test_gamification_rejects_invalid_tables() {
    clear(GAMIFICATION_VARS);
    env::set_var("STREAK_MULTIPLIERS", "7:1.05,14:1.1");
    assert!(GamificationConfig::load().is_err());

    clear(GAMIFICATION_VARS);
    env::set_var("STREAK_MULTIPLIERS", "0:1.0,7:0.9");
    assert!(GamificationConfig::load().is_err());

    clear(GAMIFICATION_VARS);
    env::set_var("STREAK_RESET_THRESHOLD_DAYS", "0");
    assert!(GamificationConfig::load().is_err());

    clear(GAMIFICATION_VARS);
    env::set_var("XP_PER_LEVEL", "0");
    assert!(GamificationConfig::load().is_err());

    clear(GAMIFICATION_VARS);
    env::set_var("STREAK_DAY_BOUNDARY", "weekly");
    assert!(GamificationConfig::load().is_err());

    clear(GAMIFICATION_VARS);
}
