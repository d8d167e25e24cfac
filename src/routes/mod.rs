//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One router serves the chat page at `/`, accepts websocket upgrades at
//! both `/` (where the page connects) and `/ws`, and exposes `/healthz`.

pub mod ws;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

const INDEX_HTML: &str = include_str!("index.html");

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Upgrade requests become chat connections; plain GETs get the page.
async fn index(State(state): State<AppState>, upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>) -> Response {
    match upgrade {
        Ok(ws) => ws::upgrade(ws, state),
        Err(_) => Html(INDEX_HTML).into_response(),
    }
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
