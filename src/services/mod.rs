// ABOUTME: Domain service layer for business logic extracted from route handlers
// ABOUTME: Provides streak-aware XP awarding and the workout completion flow built on it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Domain service layer
//!
//! Services hold business rules that span more than one manager, keeping route
//! handlers thin.

/// Streak evaluation plus optimistic XP commit with retry
pub mod xp_awarder;

/// Workout completion with rollback when the XP award fails
pub mod workout_completion;
