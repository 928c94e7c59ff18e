//! HTTP transport
//!
//! Thin axum layer over [`RaceTracker`]. Every route answers with the
//! `{status, data?, error?}` envelope and an HTTP code derived from `status`,
//! including malformed JSON bodies and query strings.

mod handlers;

use crate::api::ApiResponse;
use crate::core::RaceError;
use crate::tracker::RaceTracker;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub tracker: RaceTracker,
}

impl AppState {
    pub fn new(tracker: RaceTracker) -> Self {
        Self { tracker }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status.http_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Envelope for a request axum could not extract.
pub(crate) fn malformed<T>(rejection: impl std::fmt::Display) -> ApiResponse<T> {
    ApiResponse::failure(&RaceError::invalid_input(format!(
        "Malformed request: {rejection}"
    )))
}

/// Builds the `/api/v1` router. Administrative routes are mounted only when `admin_enabled`.
pub fn build_router(state: AppState, admin_enabled: bool) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/v1/events",
            get(handlers::get_event).post(handlers::create_event),
        )
        .route(
            "/api/v1/runners",
            get(handlers::get_runners).post(handlers::create_runners),
        )
        .route(
            "/api/v1/heats",
            post(handlers::add_heats).delete(handlers::remove_heats),
        )
        .route("/api/v1/heats/start", post(handlers::start_heat))
        .route(
            "/api/v1/checkpoints",
            post(handlers::add_checkpoints).delete(handlers::remove_checkpoints),
        )
        .route("/api/v1/splits", post(handlers::add_splits));

    if admin_enabled {
        router = router.route(
            "/api/v1/admin/documents",
            get(handlers::get_all).delete(handlers::delete_all),
        );
    }

    router
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
