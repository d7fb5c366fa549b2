// ABOUTME: Database operations for user accounts and roles
// ABOUTME: Creates users together with their initial streak state, lists, updates, and deletes them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use repforge_core::errors::{AppError, AppResult};
use repforge_core::i18n::Language;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::{from_db_key, from_db_timestamp, from_db_uuid, to_db_timestamp};

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular member
    #[default]
    User,
    /// Content and account administrator
    Admin,
}

impl UserRole {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Whether this role may manage content and accounts
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl Display for UserRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(AppError::invalid_input(format!("Invalid role: {other}"))),
        }
    }
}

/// Stored user account
#[derive(Debug, Clone)]
pub struct User {
    /// Unique identifier
    pub id: Uuid,
    /// Login email
    pub email: String,
    /// bcrypt hash
    pub password_hash: String,
    /// Optional display name
    pub display_name: Option<String>,
    /// Role
    pub role: UserRole,
    /// Preferred UI language
    pub language: Language,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user, without credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Unique identifier
    pub id: Uuid,
    /// Login email
    pub email: String,
    /// Optional display name
    pub display_name: Option<String>,
    /// Role
    pub role: UserRole,
    /// Preferred UI language
    pub language: Language,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            role: user.role,
            language: user.language,
            created_at: user.created_at,
        }
    }
}

/// Fields needed to create a user
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login email (stored lowercase)
    pub email: String,
    /// bcrypt hash
    pub password_hash: String,
    /// Optional display name
    pub display_name: Option<String>,
    /// Role
    pub role: UserRole,
    /// Preferred UI language
    pub language: Language,
}

/// Partial profile update
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    /// New display name (`Some(None)` clears it)
    pub display_name: Option<Option<String>>,
    /// New language
    pub language: Option<Language>,
}

/// Manager for user accounts
pub struct UserManager {
    pool: SqlitePool,
}

impl UserManager {
    /// Create a new user manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a user and seed its streak state at `created_at`
    ///
    /// # Errors
    ///
    /// Returns `ResourceAlreadyExists` if the email is taken, or a database error
    pub async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email.trim().to_lowercase(),
            password_hash: new_user.password_hash,
            display_name: new_user.display_name,
            role: new_user.role,
            language: new_user.language,
            created_at: now,
            updated_at: now,
        };
        let created_at = to_db_timestamp(&now);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO users (id, email, password_hash, display_name, role, language, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.display_name)
        .bind(user.role.as_str())
        .bind(user.language.code())
        .bind(&created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::already_exists("A user with this email already exists")
            }
            other => AppError::database(format!("Failed to create user: {other}")),
        })?;

        sqlx::query(
            r"
            INSERT INTO user_progress (user_id, current_streak_days, last_activity_at, total_xp, version)
            VALUES ($1, 0, $2, 0, 0)
            ",
        )
        .bind(user.id.to_string())
        .bind(&created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to seed user progress: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit user creation: {e}")))?;

        Ok(user)
    }

    /// Get a user by ID
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query(
            r"
            SELECT id, email, password_hash, display_name, role, language, created_at, updated_at
            FROM users WHERE id = $1
            ",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get user: {e}")))?;

        row.map(|r| row_to_user(&r)).transpose()
    }

    /// Get a user by email (case-insensitive)
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(
            r"
            SELECT id, email, password_hash, display_name, role, language, created_at, updated_at
            FROM users WHERE email = $1
            ",
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get user by email: {e}")))?;

        row.map(|r| row_to_user(&r)).transpose()
    }

    /// List users, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list(&self, limit: u32, offset: u32) -> AppResult<Vec<User>> {
        let rows = sqlx::query(
            r"
            SELECT id, email, password_hash, display_name, role, language, created_at, updated_at
            FROM users
            ORDER BY created_at ASC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list users: {e}")))?;

        rows.iter().map(row_to_user).collect()
    }

    /// Apply a partial profile update
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the user does not exist, or a database error
    pub async fn update_profile(&self, id: Uuid, update: UserUpdate) -> AppResult<User> {
        let mut user = self
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found("User").with_resource_id(id.to_string()))?;

        if let Some(display_name) = update.display_name {
            user.display_name = display_name;
        }
        if let Some(language) = update.language {
            user.language = language;
        }
        user.updated_at = Utc::now();

        sqlx::query(
            "UPDATE users SET display_name = $1, language = $2, updated_at = $3 WHERE id = $4",
        )
        .bind(&user.display_name)
        .bind(user.language.code())
        .bind(to_db_timestamp(&user.updated_at))
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update user: {e}")))?;

        Ok(user)
    }

    /// Change a user's role
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the user does not exist, or a database error
    pub async fn set_role(&self, id: Uuid, role: UserRole) -> AppResult<User> {
        let result = sqlx::query("UPDATE users SET role = $1, updated_at = $2 WHERE id = $3")
            .bind(role.as_str())
            .bind(to_db_timestamp(&Utc::now()))
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to update role: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User").with_resource_id(id.to_string()));
        }

        self.get(id)
            .await?
            .ok_or_else(|| AppError::not_found("User").with_resource_id(id.to_string()))
    }

    /// Delete a user and everything they own
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete user: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// Number of admin accounts
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn count_admins(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin'")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count admins: {e}")))?;
        Ok(count)
    }
}

fn row_to_user(row: &SqliteRow) -> AppResult<User> {
    let id: String = row.get("id");
    let role: String = row.get("role");
    let language: String = row.get("language");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(User {
        id: from_db_uuid(&id)?,
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        display_name: row.get("display_name"),
        role: from_db_key(&role, "role")?,
        language: Language::from_tag(&language),
        created_at: from_db_timestamp(&created_at)?,
        updated_at: from_db_timestamp(&updated_at)?,
    })
}
