//! HTTP surface
//!
//! The debugger page plus a small JSON API with one endpoint per
//! controller operation. Step endpoints return the refreshed session
//! snapshot with 200 whether the step succeeded or failed — the error is
//! part of the session and the page renders it in the step's panel.
//! Precondition violations (calling a step the UI hasn't unlocked) are
//! 409 with an error body.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::info;

use crate::flow::{AuthFlowController, ConfigField, FlowError};

/// Shared state: the controller behind one async mutex, which serializes
/// step operations exactly as the original single-threaded page did.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<Mutex<AuthFlowController>>,
    pub started_at: Instant,
}

/// Build the axum router with the page and all API routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/api/session", get(session_snapshot))
        .route("/api/health", get(health))
        .route("/api/config", post(update_config))
        .route("/api/request-token", post(request_token))
        .route("/api/access-token", post(access_token))
        .route("/api/request", post(send_request))
        .with_state(state)
}

async fn index_page() -> Html<&'static str> {
    Html(include_str!("../assets/index.html"))
}

fn json_response(status: StatusCode, body: serde_json::Value) -> Response {
    (
        status,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
        .into_response()
}

/// The session plus its derived stage — everything the page renders from.
fn snapshot(controller: &AuthFlowController) -> serde_json::Value {
    serde_json::json!({
        "stage": controller.session().stage(),
        "session": controller.session(),
    })
}

fn step_response(controller: &AuthFlowController, result: Result<(), FlowError>) -> Response {
    match result {
        Ok(()) => json_response(StatusCode::OK, snapshot(controller)),
        Err(e) => {
            let status = match &e {
                FlowError::MissingRequestToken | FlowError::MissingAccessToken => {
                    StatusCode::CONFLICT
                }
                FlowError::Persist(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            json_response(status, serde_json::json!({"error": e.to_string()}))
        }
    }
}

fn attempt_id() -> String {
    format!("att_{}", uuid::Uuid::new_v4().as_simple())
}

/// GET /api/session — full snapshot. Secrets included: this is a local
/// debugging tool and the session file is plaintext by design.
async fn session_snapshot(State(state): State<AppState>) -> Response {
    let controller = state.controller.lock().await;
    json_response(StatusCode::OK, snapshot(&controller))
}

/// GET /api/health — liveness plus how far the flow has progressed.
async fn health(State(state): State<AppState>) -> Response {
    let controller = state.controller.lock().await;
    json_response(
        StatusCode::OK,
        serde_json::json!({
            "status": "ok",
            "stage": controller.session().stage(),
            "uptime_seconds": state.started_at.elapsed().as_secs(),
        }),
    )
}

#[derive(Deserialize)]
struct ConfigUpdate {
    field: ConfigField,
    value: String,
}

/// POST /api/config — store one configuration field.
async fn update_config(
    State(state): State<AppState>,
    axum::Json(body): axum::Json<ConfigUpdate>,
) -> Response {
    let mut controller = state.controller.lock().await;
    let result = controller.update_configuration(body.field, body.value).await;
    step_response(&controller, result)
}

/// POST /api/request-token — step 1.
async fn request_token(State(state): State<AppState>) -> Response {
    let attempt = attempt_id();
    let mut controller = state.controller.lock().await;
    info!(attempt, "requesting request token");
    let result = controller.request_request_token().await;
    step_response(&controller, result)
}

#[derive(Deserialize)]
struct AccessTokenBody {
    redirected_url: String,
}

/// POST /api/access-token — step 2.
async fn access_token(
    State(state): State<AppState>,
    axum::Json(body): axum::Json<AccessTokenBody>,
) -> Response {
    let attempt = attempt_id();
    let mut controller = state.controller.lock().await;
    info!(attempt, "exchanging verifier for access token");
    let result = controller.request_access_token(&body.redirected_url).await;
    step_response(&controller, result)
}

#[derive(Deserialize)]
struct AuthenticatedRequestBody {
    path: String,
}

/// POST /api/request — step 3.
async fn send_request(
    State(state): State<AppState>,
    axum::Json(body): axum::Json<AuthenticatedRequestBody>,
) -> Response {
    let attempt = attempt_id();
    let mut controller = state.controller.lock().await;
    info!(attempt, path = %body.path, "sending authenticated request");
    let result = controller.send_authenticated_request(&body.path).await;
    step_response(&controller, result)
}
