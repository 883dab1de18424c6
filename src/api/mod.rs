//! REST API endpoints.
//!
//! Axum-based HTTP API for player statistics and clan leaderboards.

pub mod routes;
pub mod state;

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::leaderboard::LeaderboardError;
use crate::stats::StatsError;
use crate::storage::StorageError;
use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        error!("Storage failure: {}", e);
        ApiError::Internal(e.to_string())
    }
}

impl From<StatsError> for ApiError {
    fn from(e: StatsError) -> Self {
        match e {
            StatsError::UnknownUser(id) => ApiError::NotFound(format!("user {}", id)),
            StatsError::Storage(e) => e.into(),
        }
    }
}

impl From<LeaderboardError> for ApiError {
    fn from(e: LeaderboardError) -> Self {
        match e {
            LeaderboardError::UnknownClan(id) => ApiError::NotFound(format!("clan {}", id)),
            LeaderboardError::Storage(e) => e.into(),
        }
    }
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origin == "*" {
        return layer.allow_origin(Any);
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            warn!("Invalid CORS origin {:?}, allowing any", origin);
            layer.allow_origin(Any)
        }
    }
}

/// Build the API router.
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    Router::new()
        .route("/api/health", get(routes::health::health))
        .route("/api/users/:user_id/stats/aim", get(routes::stats::aim))
        .route(
            "/api/users/:user_id/stats/overview",
            get(routes::stats::overview),
        )
        .route("/api/users/:user_id/stats/clutch", get(routes::stats::clutch))
        .route("/api/users/:user_id/stats/maps", get(routes::stats::maps))
        .route(
            "/api/users/:user_id/stats/cache",
            axum::routing::delete(routes::stats::invalidate),
        )
        .route(
            "/api/clans/:clan_id/leaderboards/:kind",
            get(routes::leaderboards::show),
        )
        .route(
            "/api/clans/:clan_id/leaderboards/:kind/calculate",
            post(routes::leaderboards::calculate),
        )
        .with_state(state)
        .layer(cors_layer(cors_origin))
        .layer(TraceLayer::new_for_http())
}
