// ABOUTME: Configuration error types shared by policy and environment loaders
// ABOUTME: Used when validating streak tables, XP tables, and environment overrides
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use thiserror::Error;

use crate::errors::{AppError, ErrorCode};

/// Configuration validation and parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Ordered values are not in the required order
    #[error("Invalid range: {0}")]
    InvalidRange(&'static str),

    /// A required entry is absent
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// A value could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// A value is outside its accepted bounds
    #[error("Value out of range: {0}")]
    ValueOutOfRange(&'static str),
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        let code = match error {
            ConfigError::MissingField(_) => ErrorCode::ConfigMissing,
            _ => ErrorCode::ConfigInvalid,
        };
        Self::new(code, error.to_string())
    }
}
