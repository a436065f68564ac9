use aws_config::SdkConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::backend::{self, AgentBackend};
use crate::config::{ConfigError, DispatcherConfig};
use crate::session;

/// ディスパッチャーのエラー型
#[derive(thiserror::Error, Debug)]
pub enum AgentError {
    #[error("AWS Bedrock API error: {0}")]
    BedrockError(String),

    #[error("AWS SDK error: {0}")]
    AwsSdkError(String),

    #[error("Response decoding error: {0}")]
    DecodeError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),
}

/// チャット API のリクエストボディ
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default, alias = "inputText")]
    pub message: String,
    #[serde(default, rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// チャット API のレスポンスボディ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// チャットディスパッチャー
///
/// セッション ID を決定し、設定されたバックエンド（Bedrock Agents または AgentCore）へ
/// メッセージを転送する。呼び出しごとに独立しており、状態は持たない。
pub struct ChatDispatcher {
    backend: Box<dyn AgentBackend>,
    require_auth: bool,
}

impl ChatDispatcher {
    /// 任意のバックエンドでディスパッチャーを作成する
    pub fn new(backend: Box<dyn AgentBackend>, require_auth: bool) -> Self {
        Self {
            backend,
            require_auth,
        }
    }

    /// 設定から AWS クライアントを組み立ててディスパッチャーを作成する
    ///
    /// # Arguments
    /// * `config` - 環境変数から読み込んだ設定
    /// * `sdk_config` - 読み込み済みの AWS SDK 設定
    pub fn from_config(config: &DispatcherConfig, sdk_config: &SdkConfig) -> Self {
        Self::new(
            backend::from_config(&config.backend, sdk_config),
            config.require_auth,
        )
    }

    /// 使用しているバックエンド名を取得する
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// メッセージをバックエンドへ転送し、返信を返す
    ///
    /// # Arguments
    /// * `request` - チャットリクエスト
    /// * `bearer_token` - `Authorization` ヘッダーから取り出したトークン（オプション）
    ///
    /// # Returns
    /// * `Ok(ChatReply)` - 返信とセッション ID
    /// * `Err(AgentError::Unauthorized)` - 認証必須でトークンがない・不正な場合。バックエンドは呼ばれない
    /// * `Err(AgentError::InvalidRequest)` - メッセージが空の場合
    /// * `Err` - バックエンド呼び出しに失敗した場合
    pub async fn dispatch(
        &self,
        request: ChatRequest,
        bearer_token: Option<&str>,
    ) -> Result<ChatReply, AgentError> {
        let session_id = session::resolve_session_id(
            bearer_token,
            request.session_id.as_deref(),
            self.require_auth,
        )
        .inspect_err(|e| warn!(error = %e, "rejecting chat request"))?;

        let message = request.message.trim();
        if message.is_empty() {
            return Err(AgentError::InvalidRequest(
                "Message is required".to_string(),
            ));
        }

        info!(
            backend = self.backend.name(),
            session = %session_id,
            "dispatching chat message"
        );

        let response = self.backend.invoke(&session_id, message).await?;

        Ok(ChatReply {
            response,
            session_id,
        })
    }
}
