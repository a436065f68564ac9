use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_bedrockagentcore::primitives::Blob;
use aws_sdk_bedrockagentruntime::types::ResponseStream;
use tracing::debug;

use crate::agent::AgentError;
use crate::config::BackendConfig;
use crate::reply::extract_reply;
use crate::session::ensure_runtime_session_id;

/// チャットの転送先となるエージェント
///
/// セッション ID と入力テキストを受け取り、返信テキストを返す。
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// ログ出力用の名前
    fn name(&self) -> &'static str;

    async fn invoke(&self, session_id: &str, input_text: &str) -> Result<String, AgentError>;
}

/// 設定に応じたバックエンドを作成する
pub fn from_config(config: &BackendConfig, sdk_config: &SdkConfig) -> Box<dyn AgentBackend> {
    match config {
        BackendConfig::BedrockAgents {
            agent_id,
            agent_alias_id,
        } => Box::new(BedrockAgentBackend::new(
            aws_sdk_bedrockagentruntime::Client::new(sdk_config),
            agent_id.clone(),
            agent_alias_id.clone(),
        )),
        BackendConfig::AgentCore {
            runtime_arn,
            qualifier,
        } => Box::new(AgentCoreBackend::new(
            aws_sdk_bedrockagentcore::Client::new(sdk_config),
            runtime_arn.clone(),
            qualifier.clone(),
        )),
    }
}

/// マネージドな Bedrock Agents を呼び出すバックエンド
pub struct BedrockAgentBackend {
    client: aws_sdk_bedrockagentruntime::Client,
    agent_id: String,
    agent_alias_id: String,
}

impl BedrockAgentBackend {
    pub fn new(
        client: aws_sdk_bedrockagentruntime::Client,
        agent_id: String,
        agent_alias_id: String,
    ) -> Self {
        Self {
            client,
            agent_id,
            agent_alias_id,
        }
    }
}

#[async_trait]
impl AgentBackend for BedrockAgentBackend {
    fn name(&self) -> &'static str {
        "bedrock-agents"
    }

    /// InvokeAgent を呼び出し、ストリームで届くチャンクを1つの返信に連結する
    async fn invoke(&self, session_id: &str, input_text: &str) -> Result<String, AgentError> {
        let mut output = self
            .client
            .invoke_agent()
            .agent_id(&self.agent_id)
            .agent_alias_id(&self.agent_alias_id)
            .session_id(session_id)
            .input_text(input_text)
            .send()
            .await
            .map_err(|e| AgentError::AwsSdkError(e.to_string()))?;

        let mut events = Vec::new();
        while let Some(event) = output
            .completion
            .recv()
            .await
            .map_err(|e| AgentError::BedrockError(e.to_string()))?
        {
            events.push(event);
        }

        let reply = completion_text(events);
        debug!(chars = reply.len(), "agent completion received");
        Ok(reply)
    }
}

/// InvokeAgent のイベント列からチャンクのバイトを連結して返信テキストにする
///
/// マルチバイト文字がチャンクの境界で分かれることがあるため、
/// 全てのバイトを集めてから一度だけ UTF-8 として解釈する。
pub fn completion_text(events: impl IntoIterator<Item = ResponseStream>) -> String {
    let mut bytes = Vec::new();
    for event in events {
        if let ResponseStream::Chunk(part) = event
            && let Some(chunk) = part.bytes()
        {
            bytes.extend_from_slice(chunk.as_ref());
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Bedrock AgentCore 上のカスタムランタイムを呼び出すバックエンド
pub struct AgentCoreBackend {
    client: aws_sdk_bedrockagentcore::Client,
    runtime_arn: String,
    qualifier: String,
}

impl AgentCoreBackend {
    pub fn new(
        client: aws_sdk_bedrockagentcore::Client,
        runtime_arn: String,
        qualifier: String,
    ) -> Self {
        Self {
            client,
            runtime_arn,
            qualifier,
        }
    }
}

#[async_trait]
impl AgentBackend for AgentCoreBackend {
    fn name(&self) -> &'static str {
        "agentcore"
    }

    /// InvokeAgentRuntime を呼び出し、バイトストリームを組み立てて返信を抽出する
    ///
    /// # Note
    /// runtimeSessionId が最小長に満たない場合は生成した ID で補う。
    async fn invoke(&self, session_id: &str, input_text: &str) -> Result<String, AgentError> {
        let runtime_session_id = ensure_runtime_session_id(session_id);
        let payload = serde_json::json!({ "prompt": input_text }).to_string();

        let output = self
            .client
            .invoke_agent_runtime()
            .agent_runtime_arn(&self.runtime_arn)
            .qualifier(&self.qualifier)
            .runtime_session_id(&runtime_session_id)
            .content_type("application/json")
            .accept("application/json")
            .payload(Blob::new(payload.into_bytes()))
            .send()
            .await
            .map_err(|e| AgentError::AwsSdkError(e.to_string()))?;

        let bytes = output
            .response
            .collect()
            .await
            .map_err(|e| AgentError::DecodeError(e.to_string()))?
            .into_bytes();

        let text = String::from_utf8_lossy(&bytes);
        debug!(
            session = %runtime_session_id,
            bytes = bytes.len(),
            "runtime response received"
        );
        Ok(extract_reply(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_bedrockagentruntime::primitives::Blob;
    use aws_sdk_bedrockagentruntime::types::PayloadPart;

    fn chunk(bytes: &[u8]) -> ResponseStream {
        ResponseStream::Chunk(PayloadPart::builder().bytes(Blob::new(bytes.to_vec())).build())
    }

    #[test]
    fn test_completion_text_joins_chunks_in_order() {
        let events = vec![
            chunk(b"Your ticket "),
            chunk(b"INC12345678 "),
            chunk(b"is Pending."),
        ];
        assert_eq!(completion_text(events), "Your ticket INC12345678 is Pending.");
    }

    #[test]
    fn test_completion_text_keeps_characters_split_across_chunks() {
        let text = "パスワードをリセットしました";
        let bytes = text.as_bytes();
        // 「パ」の途中で分割する
        let events = vec![chunk(&bytes[..1]), chunk(&bytes[1..])];
        assert_eq!(completion_text(events), text);
    }

    #[test]
    fn test_completion_text_skips_empty_chunks() {
        let events = vec![ResponseStream::Chunk(PayloadPart::builder().build()), chunk(b"ok")];
        assert_eq!(completion_text(events), "ok");
        assert_eq!(completion_text(Vec::new()), "");
    }
}
