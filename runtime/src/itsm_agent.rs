//! ツール呼び出しを繰り返す ITSM エージェント

use std::collections::HashMap;
use std::sync::Arc;

use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, Message, StopReason, ToolConfiguration, ToolResultBlock,
    ToolResultContentBlock, ToolResultStatus,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::document::{document_to_json, json_to_document};
use crate::error::RuntimeError;
use crate::model::ModelClient;
use crate::tools::ItsmTools;

pub const DEFAULT_MAX_ITERATIONS: usize = 10;

pub const SYSTEM_PROMPT: &str = r#"You are an IT Service Management assistant. You help users with:
1. Creating IT tickets (incidents for problems, requests for services, changes for modifications)
2. Looking up the status of existing tickets
3. Answering questions about IT policies, procedures, and troubleshooting

For ANY question about policies, procedures, or IT information you MUST use the query_knowledge_base tool.
Do not answer such questions from your own knowledge.

When creating tickets:
- Collect ALL required fields before calling create_ticket:
  * tickettype: INC (incident), REQ (request) or CHG (change)
  * description: detailed description of the issue or request
  * impact: High, Medium or Low
  * urgency: High, Medium or Low
- If a field is missing, ask the user for it and keep asking until all four are known
- Pick INC for incidents and problems, REQ for service and access requests, CHG for changes
- Ask clarifying questions to help decide impact and urgency

When answering questions:
- Always call query_knowledge_base first
- Use only the relevant parts of the results and answer clearly and concisely
- If the knowledge base has nothing, say so and offer to create a ticket

Be helpful, professional, and conversational."#;

/// セッションごとの会話履歴を持つエージェント
///
/// 1回の呼び出しで、モデルが `tool_use` で停止する限りツールを実行して結果を返し続ける。
/// 失敗した呼び出しの途中経過は履歴に残さない。
///
/// 同じセッションへの呼び出しはセッションごとのロックで直列化される。
///
/// # Note
/// 履歴は上限なくメモリに保持する。AgentCore はセッションごとに microVM を割り当て、
/// アイドル時に破棄するため、プロセスの寿命がそのまま履歴の寿命になる。
pub struct ItsmAgent {
    model: Arc<dyn ModelClient>,
    tools: ItsmTools,
    tool_config: ToolConfiguration,
    max_iterations: usize,
    sessions: Mutex<HashMap<String, Arc<Mutex<Vec<Message>>>>>,
}

impl ItsmAgent {
    pub fn new(
        model: Arc<dyn ModelClient>,
        tools: ItsmTools,
        max_iterations: usize,
    ) -> Result<Self, RuntimeError> {
        let tool_config = tools.tool_config()?;
        Ok(Self {
            model,
            tools,
            tool_config,
            max_iterations: max_iterations.max(1),
            sessions: Mutex::new(HashMap::new()),
        })
    }

    /// セッションの会話履歴の長さ
    pub async fn history_len(&self, session_key: &str) -> usize {
        let session = self.sessions.lock().await.get(session_key).cloned();
        match session {
            Some(history) => history.lock().await.len(),
            None => 0,
        }
    }

    async fn session(&self, session_key: &str) -> Arc<Mutex<Vec<Message>>> {
        self.sessions
            .lock()
            .await
            .entry(session_key.to_string())
            .or_default()
            .clone()
    }

    /// ユーザーの発話に対する最終的な返答を生成する
    ///
    /// # Arguments
    /// * `session_key` - 会話履歴を区別するキー
    /// * `prompt` - ユーザーの入力テキスト
    ///
    /// # Returns
    /// * `Ok(String)` - アシスタントの返答テキスト
    /// * `Err(RuntimeError)` - モデル呼び出しの失敗、または反復回数の上限到達
    pub async fn respond(&self, session_key: &str, prompt: &str) -> Result<String, RuntimeError> {
        let session = self.session(session_key).await;
        // ターンが終わるまでロックを保持し、成功した場合のみ書き戻す
        let mut stored = session.lock().await;
        let mut history = stored.clone();

        history.push(
            Message::builder()
                .role(ConversationRole::User)
                .content(ContentBlock::Text(prompt.to_string()))
                .build()?,
        );

        for iteration in 1..=self.max_iterations {
            let turn = self
                .model
                .converse(SYSTEM_PROMPT, &history, &self.tool_config)
                .await?;
            history.push(turn.message.clone());

            let results = if turn.stop_reason == StopReason::ToolUse {
                self.run_tools(&turn.message).await?
            } else {
                Vec::new()
            };

            if results.is_empty() {
                info!(session = session_key, iteration, "agent finished");
                let reply = message_text(&turn.message);
                *stored = history;
                return Ok(reply);
            }

            history.push(
                Message::builder()
                    .role(ConversationRole::User)
                    .set_content(Some(results))
                    .build()?,
            );
        }

        warn!(session = session_key, "tool iteration limit reached");
        Err(RuntimeError::IterationLimit(self.max_iterations))
    }

    /// アシスタントのメッセージに含まれる全てのツール呼び出しを実行する
    async fn run_tools(&self, message: &Message) -> Result<Vec<ContentBlock>, RuntimeError> {
        let mut results = Vec::new();
        for block in message.content() {
            let ContentBlock::ToolUse(tool_use) = block else {
                continue;
            };

            let output = self
                .tools
                .call(tool_use.name(), &document_to_json(tool_use.input()))
                .await;
            let status = if output.get("error").is_some() {
                ToolResultStatus::Error
            } else {
                ToolResultStatus::Success
            };

            results.push(ContentBlock::ToolResult(
                ToolResultBlock::builder()
                    .tool_use_id(tool_use.tool_use_id())
                    .content(ToolResultContentBlock::Json(json_to_document(&output)))
                    .status(status)
                    .build()?,
            ));
        }
        Ok(results)
    }
}

/// メッセージ中のテキストブロックを連結する
pub fn message_text(message: &Message) -> String {
    message
        .content()
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text(text) => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}
