//! Bedrock Knowledge Base の検索

use agent::config::ConfigError;
use async_trait::async_trait;
use aws_sdk_bedrockagentruntime::Client;
use aws_sdk_bedrockagentruntime::types::KnowledgeBaseQuery;
use tracing::info;

use crate::error::RuntimeError;

/// 検索でヒットした文書の断片
#[derive(Debug, Clone, PartialEq)]
pub struct Passage {
    pub content: String,
    pub score: Option<f64>,
}

/// ナレッジベース検索の抽象
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// クエリに関連する文書を関連度順に返す
    async fn retrieve(&self, query: &str) -> Result<Vec<Passage>, RuntimeError>;
}

/// `bedrock-agent-runtime:Retrieve` を使う実装
pub struct BedrockKnowledgeBase {
    client: Client,
    knowledge_base_id: String,
}

impl BedrockKnowledgeBase {
    pub fn new(client: Client, knowledge_base_id: impl Into<String>) -> Self {
        Self {
            client,
            knowledge_base_id: knowledge_base_id.into(),
        }
    }
}

#[async_trait]
impl KnowledgeBase for BedrockKnowledgeBase {
    async fn retrieve(&self, query: &str) -> Result<Vec<Passage>, RuntimeError> {
        let output = self
            .client
            .retrieve()
            .knowledge_base_id(&self.knowledge_base_id)
            .retrieval_query(KnowledgeBaseQuery::builder().text(query).build())
            .send()
            .await
            .map_err(|e| RuntimeError::KnowledgeBaseError(e.to_string()))?;

        info!(count = output.retrieval_results().len(), "knowledge base results");

        Ok(output
            .retrieval_results()
            .iter()
            .map(|result| Passage {
                content: result
                    .content()
                    .map(|content| content.text().to_string())
                    .unwrap_or_default(),
                score: result.score(),
            })
            .collect())
    }
}

/// ナレッジベースが設定されていない場合の実装
///
/// 常にエラーを返し、ツール結果として `error` がモデルに渡る。
pub struct UnconfiguredKnowledgeBase;

#[async_trait]
impl KnowledgeBase for UnconfiguredKnowledgeBase {
    async fn retrieve(&self, _query: &str) -> Result<Vec<Passage>, RuntimeError> {
        Err(ConfigError::MissingVariable("KNOWLEDGE_BASE_ID").into())
    }
}
