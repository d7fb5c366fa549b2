// ABOUTME: Core types and rules for the RepForge fitness tracking platform
// ABOUTME: Foundation crate with error handling, taxonomies, localization, and streak/XP math
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # RepForge Core
//!
//! Foundation crate providing shared types and pure progression rules for the
//! RepForge server. Nothing here performs I/O, so it changes rarely and compiles once.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and HTTP mapping
//! - **config**: Configuration validation errors
//! - **taxonomy**: Exercise constant tables (muscles, equipment, force, mechanic, level, category)
//! - **i18n**: Language negotiation and localized taxonomy labels
//! - **streak**: Streak policy and evaluator
//! - **xp**: XP table, streak-scaled awards, and level curve

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Configuration validation errors
pub mod config;

/// Exercise taxonomy constant tables
pub mod taxonomy;

/// Localized labels for taxonomy constants
pub mod i18n;

/// Consecutive-day streak policy and evaluation
pub mod streak;

/// Experience point math and level curve
pub mod xp;
