//! Bedrock Converse API の呼び出し

use async_trait::async_trait;
use aws_sdk_bedrockruntime::Client;
use aws_sdk_bedrockruntime::types::{
    ConverseOutput, Message, StopReason, SystemContentBlock, ToolConfiguration,
};
use tracing::debug;

use crate::error::RuntimeError;

/// モデルの1ターン分の応答
#[derive(Debug, Clone)]
pub struct ModelTurn {
    pub message: Message,
    pub stop_reason: StopReason,
}

/// 会話モデルの抽象
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// 会話履歴を送信し、アシスタントの次の発話を受け取る
    async fn converse(
        &self,
        system_prompt: &str,
        messages: &[Message],
        tool_config: &ToolConfiguration,
    ) -> Result<ModelTurn, RuntimeError>;
}

/// Bedrock Runtime の Converse API を使う実装
pub struct BedrockModel {
    client: Client,
    model_id: String,
}

impl BedrockModel {
    pub fn new(client: Client, model_id: impl Into<String>) -> Self {
        Self {
            client,
            model_id: model_id.into(),
        }
    }
}

#[async_trait]
impl ModelClient for BedrockModel {
    /// # Performance Note
    /// SDK が所有権を要求するため、呼び出しごとに会話履歴全体をクローンする。
    async fn converse(
        &self,
        system_prompt: &str,
        messages: &[Message],
        tool_config: &ToolConfiguration,
    ) -> Result<ModelTurn, RuntimeError> {
        let output = self
            .client
            .converse()
            .model_id(&self.model_id)
            .system(SystemContentBlock::Text(system_prompt.to_string()))
            .set_messages(Some(messages.to_vec()))
            .tool_config(tool_config.clone())
            .send()
            .await
            .map_err(|e| RuntimeError::BedrockError(e.to_string()))?;

        debug!(stop_reason = ?output.stop_reason, "converse finished");

        match output.output {
            Some(ConverseOutput::Message(message)) => Ok(ModelTurn {
                message,
                stop_reason: output.stop_reason,
            }),
            _ => Err(RuntimeError::EmptyResponse),
        }
    }
}
