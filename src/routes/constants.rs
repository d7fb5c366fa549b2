// ABOUTME: Public localized taxonomy tables used by clients to render filters and forms
// ABOUTME: Language comes from `?lang=` first, then `Accept-Language`, then English
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use axum::{
    extract::Query,
    http::{header::ACCEPT_LANGUAGE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use repforge_core::i18n::{Language, LocalizedTaxonomy};
use serde::Deserialize;

/// Query parameters for the constants endpoint
#[derive(Debug, Default, Deserialize)]
pub struct ConstantsQuery {
    /// Language tag such as `fr` or `es-MX`
    pub lang: Option<String>,
}

/// Constants routes
pub struct ConstantsRoutes;

impl ConstantsRoutes {
    /// Create the constants route
    pub fn routes() -> Router {
        Router::new().route("/api/constants", get(Self::handle_constants))
    }

    /// Handle GET /api/constants
    async fn handle_constants(headers: HeaderMap, Query(query): Query<ConstantsQuery>) -> Response {
        let language = resolve_language(query.lang.as_deref(), &headers);
        (StatusCode::OK, Json(LocalizedTaxonomy::build(language))).into_response()
    }
}

fn resolve_language(lang: Option<&str>, headers: &HeaderMap) -> Language {
    if let Some(tag) = lang.map(str::trim).filter(|t| !t.is_empty()) {
        return Language::from_tag(tag);
    }
    headers
        .get(ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
        .map_or_else(Language::default, Language::from_accept_language)
}
