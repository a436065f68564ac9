//! ITSM REST API と OAuth トークンエンドポイントのクライアント

use agent::{ChatReply, ChatRequest};
use anyhow::{Context, Result, bail};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use ticket::TicketRequest;

/// トークンエンドポイントの応答
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub id_token: Option<String>,
    pub access_token: Option<String>,
}

/// 認可コードをトークンに交換する
///
/// # Arguments
/// * `token_endpoint` - OAuth 2.0 トークンエンドポイント
/// * `client_id` - アプリクライアント ID
/// * `redirect_uri` - 認可リクエストで使ったリダイレクト URI
/// * `code` - 認可コード
pub async fn exchange_code(
    http: &reqwest::Client,
    token_endpoint: &str,
    client_id: &str,
    redirect_uri: &str,
    code: &str,
) -> Result<TokenResponse> {
    let response = http
        .post(token_endpoint)
        .form(&[
            ("grant_type", "authorization_code"),
            ("client_id", client_id),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ])
        .send()
        .await
        .context("Failed to reach token endpoint")?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("Token exchange failed ({status}): {body}");
    }
    Ok(response.json().await?)
}

/// ITSM API のクライアント
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(http: reqwest::Client, base_url: &str, token: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POST /chat
    pub async fn chat(&self, message: &str, session_id: &str) -> Result<ChatReply> {
        let mut request = self.http.post(self.url("chat")).json(&ChatRequest {
            message: message.to_string(),
            session_id: Some(session_id.to_string()),
        });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.context("Failed to reach chat API")?;
        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            StatusCode::UNAUTHORIZED => bail!("Unauthorized. Run `itsm-cli login` first."),
            status => {
                let body: Value = response.json().await.unwrap_or_default();
                let message = body["error"].as_str().unwrap_or("unknown error");
                bail!("Chat request failed ({status}): {message}")
            }
        }
    }

    /// POST /create
    pub async fn create_ticket(&self, request: &TicketRequest) -> Result<(StatusCode, Value)> {
        let response = self
            .http
            .post(self.url("create"))
            .json(request)
            .send()
            .await
            .context("Failed to reach create API")?;
        let status = response.status();
        Ok((status, response.json().await?))
    }

    /// GET /lookup?ticketNumber=...
    pub async fn lookup_ticket(&self, ticket_number: &str) -> Result<(StatusCode, Value)> {
        let response = self
            .http
            .get(self.url("lookup"))
            .query(&[("ticketNumber", ticket_number)])
            .send()
            .await
            .context("Failed to reach lookup API")?;
        let status = response.status();
        Ok((status, response.json().await?))
    }
}
