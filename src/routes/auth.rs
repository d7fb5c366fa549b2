// ABOUTME: Authentication route handlers for account registration and login
// ABOUTME: Issues HS256 session tokens after validating credentials against bcrypt hashes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Authentication routes
//!
//! Registration and login are the only unauthenticated API endpoints besides
//! health checks.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use repforge_core::errors::AppError;
use repforge_core::i18n::Language;
use serde::{Deserialize, Serialize};

use crate::auth::{hash_password, verify_password};
use crate::database::users::{NewUser, User, UserProfile, UserRole};
use crate::logging::AppLogger;
use crate::resources::ServerResources;

/// Shortest accepted password
pub const MIN_PASSWORD_LEN: usize = 8;

/// Registration request payload
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Login email
    pub email: String,
    /// Plain-text password
    pub password: String,
    /// Optional display name
    #[serde(default)]
    pub display_name: Option<String>,
    /// Preferred UI language tag
    #[serde(default)]
    pub language: Option<String>,
}

/// Login request payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login email
    pub email: String,
    /// Plain-text password
    pub password: String,
}

/// Token response for both registration and login
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token
    pub token: String,
    /// Token expiry
    pub expires_at: DateTime<Utc>,
    /// Authenticated user
    pub user: UserProfile,
}

/// Authentication routes
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/auth/register", post(Self::handle_register))
            .route("/api/auth/login", post(Self::handle_login))
            .with_state(resources)
    }

    fn token_response(resources: &ServerResources, user: &User) -> Result<LoginResponse, AppError> {
        Ok(LoginResponse {
            token: resources.auth_manager.generate_token(user)?,
            expires_at: resources.auth_manager.expires_at(),
            user: UserProfile::from(user),
        })
    }

    /// Handle POST /api/auth/register
    async fn handle_register(
        State(resources): State<Arc<ServerResources>>,
        Json(body): Json<RegisterRequest>,
    ) -> Result<Response, AppError> {
        let email = body.email.trim().to_lowercase();
        validate_email(&email)?;
        if body.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::invalid_input(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let password_hash =
            hash_password(body.password, resources.config.auth.bcrypt_cost).await?;
        let user = resources
            .database
            .users()
            .create(NewUser {
                email,
                password_hash,
                display_name: body
                    .display_name
                    .map(|n| n.trim().to_owned())
                    .filter(|n| !n.is_empty()),
                role: UserRole::User,
                language: body
                    .language
                    .as_deref()
                    .map_or_else(Language::default, Language::from_tag),
            })
            .await?;

        AppLogger::log_auth_event(&user.id.to_string(), "register", true, None);
        let response = Self::token_response(&resources, &user)?;
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle POST /api/auth/login
    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        Json(body): Json<LoginRequest>,
    ) -> Result<Response, AppError> {
        let email = body.email.trim().to_lowercase();
        let Some(user) = resources.database.users().get_by_email(&email).await? else {
            AppLogger::log_auth_event(&email, "login", false, Some("unknown email"));
            return Err(AppError::auth_invalid("Invalid email or password"));
        };

        if !verify_password(body.password, user.password_hash.clone()).await? {
            AppLogger::log_auth_event(&user.id.to_string(), "login", false, Some("bad password"));
            return Err(AppError::auth_invalid("Invalid email or password"));
        }

        AppLogger::log_auth_event(&user.id.to_string(), "login", true, None);
        let response = Self::token_response(&resources, &user)?;
        Ok((StatusCode::OK, Json(response)).into_response())
    }
}

/// Minimal structural email check: one `@` with a non-empty local part and a dotted domain
fn validate_email(email: &str) -> Result<(), AppError> {
    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && !domain.contains('@')
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
    });
    if valid {
        Ok(())
    } else {
        Err(AppError::invalid_input("Invalid email address"))
    }
}
