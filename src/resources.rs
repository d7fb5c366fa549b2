// ABOUTME: Centralized resource container for dependency injection in the HTTP server
// ABOUTME: Shares the database, auth manager, and resolved gamification rules across handlers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Server Resources
//!
//! Built once at startup and handed to every router as shared state. The streak
//! policy and level curve are resolved from configuration up front so an invalid
//! table fails startup instead of the first workout completion.

use std::sync::Arc;

use repforge_core::errors::AppResult;
use repforge_core::streak::StreakPolicy;
use repforge_core::xp::LevelCurve;

use crate::auth::AuthManager;
use crate::config::environment::ServerConfig;
use crate::config::gamification::GamificationConfig;
use crate::database::Database;

/// Centralized resource container for dependency injection
#[derive(Clone)]
pub struct ServerResources {
    /// Database handle
    pub database: Arc<Database>,
    /// JWT issuer and validator
    pub auth_manager: Arc<AuthManager>,
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Raw gamification settings
    pub gamification: Arc<GamificationConfig>,
    /// Resolved streak policy
    pub streak_policy: Arc<StreakPolicy>,
    /// Resolved level curve
    pub level_curve: LevelCurve,
}

impl ServerResources {
    /// Create server resources, resolving gamification rules
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the streak table, XP table, or level curve is invalid
    pub fn new(
        database: Database,
        config: ServerConfig,
        gamification: GamificationConfig,
    ) -> AppResult<Self> {
        gamification.validate()?;
        let streak_policy = gamification.streak_policy()?;
        let level_curve = gamification.level_curve()?;
        let auth_manager = AuthManager::new(
            config.auth.jwt_secret.as_bytes(),
            config.auth.jwt_expiry_hours,
        );

        Ok(Self {
            database: Arc::new(database),
            auth_manager: Arc::new(auth_manager),
            config: Arc::new(config),
            gamification: Arc::new(gamification),
            streak_policy: Arc::new(streak_policy),
            level_curve,
        })
    }
}
