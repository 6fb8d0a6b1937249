//! REST endpoints for submitting messages and managing sessions.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::debug;

use super::router::ModeRouter;

/// Shared state for intake routes.
#[derive(Clone)]
pub struct IntakeRouteState {
    pub router: Arc<ModeRouter>,
}

#[derive(Debug, Deserialize)]
struct SubmitRequest {
    #[serde(default)]
    session_id: String,
    #[serde(default)]
    user_input: String,
}

#[derive(Debug, Deserialize)]
struct ResetParams {
    session_id: String,
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "intake-assist"
    }))
}

/// POST /flow/submit
///
/// Feeds one user message to the session and returns the bot's reply.
async fn submit(
    State(state): State<IntakeRouteState>,
    Json(body): Json<SubmitRequest>,
) -> impl IntoResponse {
    debug!(session_id = %body.session_id, "Submit received");
    let reply = state.router.submit(&body.session_id, &body.user_input).await;
    Json(reply)
}

/// POST /flow/reset?session_id=...
async fn reset(
    State(state): State<IntakeRouteState>,
    Query(params): Query<ResetParams>,
) -> impl IntoResponse {
    Json(state.router.reset(&params.session_id).await)
}

/// GET /flow/session/{id}
///
/// Returns the session's current state, or 404 if it does not exist.
async fn get_session(
    State(state): State<IntakeRouteState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.router.snapshot(&id).await {
        Some(session) => Json(serde_json::to_value(session).unwrap_or_default()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Session not found"})),
        )
            .into_response(),
    }
}

/// GET /flow/definition
///
/// The fields the intake flow collects, for UIs that show progress or hints.
async fn get_definition(State(state): State<IntakeRouteState>) -> impl IntoResponse {
    Json(serde_json::to_value(state.router.engine().flow()).unwrap_or_default())
}

/// Build the intake REST routes.
pub fn intake_routes(state: IntakeRouteState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/flow/submit", post(submit))
        .route("/flow/reset", post(reset))
        .route("/flow/session/{id}", get(get_session))
        .route("/flow/definition", get(get_definition))
        .layer(cors)
        .with_state(state)
}
