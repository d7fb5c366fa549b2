// ABOUTME: Main library entry point for the RepForge fitness tracking API
// ABOUTME: Exposes configuration, persistence, auth, the XP service, and HTTP routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # RepForge Server
//!
//! A fitness tracking backend: an exercise catalog, training programs, logged
//! workouts, and a streak-aware XP system that rewards consistent training.
//!
//! ## Architecture
//!
//! - **Core** (`repforge-core`): errors, taxonomies, localization, streak and XP rules
//! - **Database**: per-domain managers over a `SQLite` pool
//! - **Services**: the XP awarder that ties streak evaluation to persistence
//! - **Routes**: one axum router per domain, merged in [`routes::build_router`]
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use repforge_server::config::environment::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("RepForge configured with port: HTTP={}", config.http_port);
//!     Ok(())
//! }
//! ```

/// JWT issuing, password hashing, and request authentication
pub mod auth;

/// Environment and gamification configuration
pub mod config;

/// `SQLite` persistence and per-domain managers
pub mod database;

/// Structured logging setup and event helpers
pub mod logging;

/// CORS and request tracing middleware
pub mod middleware;

/// Shared server resources
pub mod resources;

/// HTTP routes by domain
pub mod routes;

/// Listener bootstrap and graceful shutdown
pub mod server;

/// Business logic spanning several managers
pub mod services;

pub use repforge_core::errors;
