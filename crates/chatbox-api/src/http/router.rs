//! Axum router configuration with middleware.
//!
//! Routes live under `/api/`, plus an unauthenticated `/health`.
//! Middleware: CORS and request tracing. Every completed request is logged
//! with its status, latency and, for message turns, the `x-bot-version`
//! header.

use std::time::Duration;

use axum::extract::State;
use axum::http::{Request, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{Span, info, info_span};

use crate::http::handlers;
use crate::http::handlers::chat::BOT_VERSION_HEADER;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([BOT_VERSION_HEADER]);

    let trace = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            info_span!(
                "http_request",
                method = %request.method(),
                path = %request.uri().path(),
            )
        })
        .on_response(|response: &Response<_>, latency: Duration, _span: &Span| {
            let bot_version = response
                .headers()
                .get(BOT_VERSION_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            info!(
                status = response.status().as_u16(),
                latency_ms = latency.as_millis() as u64,
                bot_version,
                "request completed"
            );
        });

    let api_routes = Router::new()
        // Chat sessions
        .route("/chat/start", post(handlers::chat::start_session))
        .route("/chat/{session_id}", get(handlers::chat::get_session))
        .route(
            "/chat/{session_id}/message",
            post(handlers::chat::send_message),
        )
        .route(
            "/users/{user_id}/sessions",
            get(handlers::user::list_sessions),
        )
        // Personas
        .route(
            "/personas",
            get(handlers::persona::list_personas).post(handlers::persona::create_persona),
        )
        .route(
            "/personas/{id}",
            get(handlers::persona::get_persona)
                .put(handlers::persona::update_persona)
                .delete(handlers::persona::delete_persona),
        )
        // Voices
        .route("/voices", get(handlers::voice::list_voices));

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(trace)
        .with_state(state)
}

/// GET /health - Liveness plus a database round trip.
async fn health_check(State(state): State<AppState>) -> axum::Json<serde_json::Value> {
    let database = match state.db_pool.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "health check database ping failed");
            "unavailable"
        }
    };

    axum::Json(serde_json::json!({
        "status": if database == "ok" { "ok" } else { "degraded" },
        "database": database,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
