//! Chat endpoint.

use axum::{extract::State, routing::post, Extension, Json, Router};
use serde::{Deserialize, Serialize};

use crate::request_id::RequestId;
use crate::AppState;

/// `message` may be absent or `null`; both read as an empty message.
#[derive(Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub response: String,
}

pub fn chat_routes() -> Router<AppState> {
    Router::new().route("/chat", post(chat))
}

async fn chat(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    Json(req): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let message = req.message.unwrap_or_default();
    if let Some(Extension(RequestId(id))) = &request_id {
        tracing::debug!("chat request {} ({} chars)", id, message.chars().count());
    }

    let response = state.assistant.respond(&message).await;
    Json(ChatResponse { response })
}
