// ABOUTME: Configuration management module for centralized server settings and parameters
// ABOUTME: Groups environment-driven server settings and gamification tuning
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//! Configuration module for the RepForge server
//!
//! - **Environment**: ports, database, authentication, and CORS from environment variables
//! - **Gamification**: streak policy, XP base values, and level curve

/// Environment and server configuration
pub mod environment;
/// Streak, XP, and level tuning
pub mod gamification;

pub use environment::{Environment, ServerConfig};
pub use gamification::GamificationConfig;
