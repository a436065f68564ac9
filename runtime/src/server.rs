//! AgentCore Runtime の HTTP 契約（`/ping` と `/invocations`）

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::itsm_agent::ItsmAgent;

pub const SESSION_HEADER: &str = "x-amzn-bedrock-agentcore-runtime-session-id";
const DEFAULT_SESSION: &str = "default";

#[derive(Debug, Default, Deserialize)]
pub struct InvocationRequest {
    #[serde(default)]
    pub prompt: String,
}

pub fn router(agent: Arc<ItsmAgent>) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/invocations", post(invocations))
        .with_state(agent)
}

async fn ping() -> Json<Value> {
    Json(json!({ "status": "Healthy" }))
}

/// エージェントを呼び出す
///
/// 失敗してもステータスは 200 のまま、本文の `error` で知らせる。
/// JSON として読めないボディはプロンプトなしとして扱う。
async fn invocations(
    State(agent): State<Arc<ItsmAgent>>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Value> {
    let request: InvocationRequest = serde_json::from_slice(&body).unwrap_or_else(|e| {
        warn!(error = %e, "invalid invocation body");
        InvocationRequest::default()
    });
    let prompt = request.prompt.trim();
    if prompt.is_empty() {
        return Json(json!({ "error": "No prompt provided" }));
    }

    let session = headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_SESSION);
    info!(session, prompt, "received prompt");

    match agent.respond(session, prompt).await {
        Ok(reply) => Json(json!({
            "message": {
                "role": "assistant",
                "content": [{ "text": reply }],
            }
        })),
        Err(e) => {
            error!(error = %e, session, "agent invocation failed");
            Json(json!({ "error": format!("Failed to process request: {e}") }))
        }
    }
}
