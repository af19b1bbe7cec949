use axum::extract::State;
use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use domain::models::{ChatRequest, ChatResponse};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::trace_requests;
use crate::state::AppState;

pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/health", get(health))
        .layer(middleware::from_fn(trace_requests))
        .with_state(state)
}

/// `POST /chat`: answer the last user message using retrieved context.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let response = state.rag.chat(&request).await?;
    Ok(Json(response))
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
