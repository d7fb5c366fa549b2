// ABOUTME: HTTP middleware for request tracing and cross-origin access
// ABOUTME: Provides request span creation and CORS configuration for the router
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub mod cors;
pub mod tracing;

// CORS configuration
pub use cors::setup_cors;

// Request tracing
pub use self::tracing::{make_request_span, REQUEST_ID_HEADER};
