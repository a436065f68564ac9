//! API Gateway 経由で呼ばれる Lambda ハンドラ
//!
//! 各ハンドラはイベントから値を取り出すだけの薄い層で、実際の処理は
//! `*_response` 関数が行う。

use agent::{AgentError, ChatDispatcher, ChatRequest, session};
use lambda_http::http::{Method, StatusCode};
use lambda_http::{Body, Error, Request, RequestExt, Response};
use serde_json::json;
use ticket::{CREATE_FAILED_MESSAGE, LOOKUP_FAILED_MESSAGE, TicketRequest, TicketService};
use tracing::{error, warn};

use crate::http::{json_response, preflight_response};

/// POST /create
pub async fn create_ticket(service: &TicketService, event: Request) -> Result<Response<Body>, Error> {
    create_ticket_response(service, event.body()).await
}

/// チケット作成リクエストのボディを処理する
///
/// # Returns
/// * 200 - `{"ticketNumber", "message"}`
/// * 400 - ボディが JSON として解釈できない場合
/// * 500 - 保存に失敗した場合（詳細は返さない）
pub async fn create_ticket_response(
    service: &TicketService,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let request: TicketRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "invalid create request body");
            return json_response(
                StatusCode::BAD_REQUEST,
                &json!({ "message": "Invalid request body" }),
            );
        }
    };

    match service.create(request).await {
        Ok(created) => json_response(StatusCode::OK, &created),
        Err(_) => json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &json!({ "message": CREATE_FAILED_MESSAGE }),
        ),
    }
}

/// GET /lookup?ticketNumber=...
pub async fn lookup_ticket(service: &TicketService, event: Request) -> Result<Response<Body>, Error> {
    let params = event.query_string_parameters_ref();
    let ticket_number = params.and_then(|p| p.first("ticketNumber"));
    lookup_ticket_response(service, ticket_number).await
}

/// チケット照会を処理する
///
/// 見つからない場合も 200 で `ticketStatus` にメッセージを入れて返す。
pub async fn lookup_ticket_response(
    service: &TicketService,
    ticket_number: Option<&str>,
) -> Result<Response<Body>, Error> {
    let Some(ticket_number) = ticket_number.map(str::trim).filter(|n| !n.is_empty()) else {
        return json_response(
            StatusCode::BAD_REQUEST,
            &json!({ "ticketStatus": "Missing required parameter: ticketNumber" }),
        );
    };

    match service.lookup(ticket_number).await {
        Ok(result) => json_response(StatusCode::OK, &result),
        Err(_) => json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &json!({ "ticketStatus": LOOKUP_FAILED_MESSAGE }),
        ),
    }
}

/// POST /chat
pub async fn chat(dispatcher: &ChatDispatcher, event: Request) -> Result<Response<Body>, Error> {
    if *event.method() == Method::OPTIONS {
        return preflight_response();
    }

    let authorization = event
        .headers()
        .get("authorization")
        .and_then(|value| value.to_str().ok());
    chat_response(dispatcher, event.body(), authorization).await
}

/// チャットリクエストを処理する
///
/// # Returns
/// * 200 - `{"response", "sessionId"}`
/// * 400 - ボディが不正、またはメッセージが空の場合
/// * 401 - 認証必須でトークンがない・不正な場合（バックエンドは呼ばれない）
/// * 500 - バックエンド呼び出しに失敗した場合
pub async fn chat_response(
    dispatcher: &ChatDispatcher,
    body: &[u8],
    authorization: Option<&str>,
) -> Result<Response<Body>, Error> {
    let token = session::bearer_token(authorization);

    let request: ChatRequest = if body.is_empty() {
        ChatRequest::default()
    } else {
        match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "invalid chat request body");
                ChatRequest::default()
            }
        }
    };

    match dispatcher.dispatch(request, token).await {
        Ok(reply) => json_response(StatusCode::OK, &reply),
        Err(AgentError::Unauthorized(_)) => {
            json_response(StatusCode::UNAUTHORIZED, &json!({ "error": "Unauthorized" }))
        }
        Err(AgentError::InvalidRequest(message)) => {
            json_response(StatusCode::BAD_REQUEST, &json!({ "error": message }))
        }
        Err(e) => {
            error!(error = %e, backend = dispatcher.backend_name(), "chat dispatch failed");
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &json!({ "error": "Failed to process chat request" }),
            )
        }
    }
}
