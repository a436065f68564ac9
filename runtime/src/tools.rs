//! エージェントが呼び出せる ITSM ツール
//!
//! ツールは失敗してもエラーを返さず、`{"error": ...}` を結果として返す。
//! モデルはその内容を見てユーザーへの返答を組み立てる。

use std::sync::Arc;

use aws_sdk_bedrockruntime::types::{Tool, ToolConfiguration, ToolInputSchema, ToolSpecification};
use serde_json::{Value, json};
use ticket::{TicketRequest, TicketService, find_ticket_number, is_valid_ticket_number};
use tracing::{error, info, warn};

use crate::document::json_to_document;
use crate::error::RuntimeError;
use crate::knowledge_base::KnowledgeBase;

pub const CREATE_TICKET: &str = "create_ticket";
pub const LOOKUP_TICKET: &str = "lookup_ticket";
pub const QUERY_KNOWLEDGE_BASE: &str = "query_knowledge_base";

/// ナレッジベース検索結果としてモデルに渡す最大件数
const MAX_KB_RESULTS: usize = 3;

const INVALID_TICKET_NUMBER_MESSAGE: &str =
    "Please provide a valid ticket number (e.g., INC12345678)";

/// チケット操作とナレッジベース検索をまとめたツールセット
pub struct ItsmTools {
    tickets: TicketService,
    knowledge_base: Arc<dyn KnowledgeBase>,
}

impl ItsmTools {
    pub fn new(tickets: TicketService, knowledge_base: Arc<dyn KnowledgeBase>) -> Self {
        Self {
            tickets,
            knowledge_base,
        }
    }

    /// Converse API に渡すツール定義を組み立てる
    pub fn tool_config(&self) -> Result<ToolConfiguration, RuntimeError> {
        let level = json!({
            "type": "string",
            "enum": ["High", "Medium", "Low"],
        });
        let specs = [
            (
                CREATE_TICKET,
                "Create a new IT service management ticket. Call only after collecting all four fields.",
                json!({
                    "type": "object",
                    "properties": {
                        "tickettype": {
                            "type": "string",
                            "enum": ["INC", "REQ", "CHG"],
                            "description": "INC for incidents, REQ for service requests, CHG for changes"
                        },
                        "description": {
                            "type": "string",
                            "description": "Detailed description of the issue or request"
                        },
                        "impact": level,
                        "urgency": level,
                    },
                    "required": ["tickettype", "description", "impact", "urgency"],
                }),
            ),
            (
                LOOKUP_TICKET,
                "Look up an existing ticket by its number, e.g. INC12345678.",
                json!({
                    "type": "object",
                    "properties": {
                        "ticketNumber": {
                            "type": "string",
                            "description": "Ticket number such as INC12345678, REQ12345678 or CHG12345678"
                        },
                        "query": {
                            "type": "string",
                            "description": "The user's words, searched for a ticket number when ticketNumber is not usable"
                        }
                    },
                    "required": ["ticketNumber"],
                }),
            ),
            (
                QUERY_KNOWLEDGE_BASE,
                "Search the IT knowledge base for policies, procedures and troubleshooting steps.",
                json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "The question or search query"
                        }
                    },
                    "required": ["query"],
                }),
            ),
        ];

        let mut builder = ToolConfiguration::builder();
        for (name, description, schema) in specs {
            let spec = ToolSpecification::builder()
                .name(name)
                .description(description)
                .input_schema(ToolInputSchema::Json(json_to_document(&schema)))
                .build()?;
            builder = builder.tools(Tool::ToolSpec(spec));
        }
        Ok(builder.build()?)
    }

    /// 名前でツールを呼び出す
    ///
    /// # Returns
    /// ツールの結果 JSON。失敗時は `{"error": ...}`
    pub async fn call(&self, name: &str, input: &Value) -> Value {
        info!(tool = name, input = %input, "tool called");
        match name {
            CREATE_TICKET => self.create_ticket(input).await,
            LOOKUP_TICKET => self.lookup_ticket(input).await,
            QUERY_KNOWLEDGE_BASE => self.query_knowledge_base(input).await,
            other => {
                warn!(tool = other, "unknown tool requested");
                json!({ "error": format!("Unknown tool: {other}") })
            }
        }
    }

    async fn create_ticket(&self, input: &Value) -> Value {
        let request = TicketRequest {
            tickettype: string_arg(input, "tickettype"),
            description: string_arg(input, "description"),
            impact: string_arg(input, "impact"),
            urgency: string_arg(input, "urgency"),
        };

        let result = match request.normalized() {
            Ok(request) => self.tickets.create(request).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(created) => json!(created),
            Err(e) => {
                error!(error = %e, "create_ticket tool failed");
                json!({ "error": format!("Failed to create ticket: {e}") })
            }
        }
    }

    /// `ticketNumber` が不正な場合は `query` の文中からチケット番号を探す
    async fn lookup_ticket(&self, input: &Value) -> Value {
        let direct = string_arg(input, "ticketNumber").trim().to_uppercase();
        let ticket_number = if is_valid_ticket_number(&direct) {
            direct
        } else if let Some(found) = find_ticket_number(&string_arg(input, "query")) {
            found
        } else {
            return json!({ "error": INVALID_TICKET_NUMBER_MESSAGE });
        };

        match self.tickets.lookup(&ticket_number).await {
            Ok(result) => json!(result),
            Err(e) => {
                error!(error = %e, "lookup_ticket tool failed");
                json!({ "error": format!("Failed to lookup ticket: {e}") })
            }
        }
    }

    async fn query_knowledge_base(&self, input: &Value) -> Value {
        let query = string_arg(input, "query");
        let passages = match self.knowledge_base.retrieve(&query).await {
            Ok(passages) => passages,
            Err(e) => {
                error!(error = %e, "knowledge base query failed");
                return json!({ "error": format!("Failed to query knowledge base: {e}") });
            }
        };

        let contents: Vec<String> = passages
            .into_iter()
            .filter(|p| !p.content.is_empty())
            .map(|p| p.content)
            .collect();

        if contents.is_empty() {
            warn!("no knowledge base results");
            return json!({
                "found": false,
                "message": "No relevant information found in the knowledge base.",
            });
        }

        let total = contents.len();
        let top: Vec<String> = contents.into_iter().take(MAX_KB_RESULTS).collect();
        json!({
            "found": true,
            "results": top,
            "message": format!("Found {total} relevant document(s)."),
        })
    }
}

fn string_arg(input: &Value, name: &str) -> String {
    match input.get(name) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge_base::Passage;
    use async_trait::async_trait;
    use ticket::MemoryTicketStore;

    struct StaticKnowledgeBase(Vec<&'static str>);

    #[async_trait]
    impl KnowledgeBase for StaticKnowledgeBase {
        async fn retrieve(&self, _query: &str) -> Result<Vec<Passage>, RuntimeError> {
            Ok(self
                .0
                .iter()
                .map(|c| Passage {
                    content: c.to_string(),
                    score: Some(0.5),
                })
                .collect())
        }
    }

    fn tools(passages: Vec<&'static str>) -> ItsmTools {
        ItsmTools::new(
            TicketService::new(Arc::new(MemoryTicketStore::new())),
            Arc::new(StaticKnowledgeBase(passages)),
        )
    }

    #[tokio::test]
    async fn test_create_ticket_normalizes_input() {
        let tools = tools(vec![]);
        let created = tools
            .call(
                CREATE_TICKET,
                &json!({"tickettype": "req", "description": "New monitor", "impact": "LOW", "urgency": "whenever"}),
            )
            .await;

        let number = created["ticketNumber"].as_str().unwrap().to_string();
        assert!(number.starts_with("REQ"));

        let found = tools
            .call(LOOKUP_TICKET, &json!({"ticketNumber": number.to_lowercase()}))
            .await;
        assert_eq!(found["ticketStatus"], "Pending");
        assert_eq!(found["ticketImpact"], "Low");
        assert_eq!(found["ticketUrgency"], "Medium");
    }

    #[tokio::test]
    async fn test_create_ticket_requires_description() {
        let result = tools(vec![])
            .call(CREATE_TICKET, &json!({"tickettype": "INC"}))
            .await;
        assert!(
            result["error"]
                .as_str()
                .unwrap()
                .starts_with("Failed to create ticket:")
        );
    }

    #[tokio::test]
    async fn test_lookup_rejects_invalid_number() {
        let result = tools(vec![])
            .call(LOOKUP_TICKET, &json!({"ticketNumber": "TICKET-42"}))
            .await;
        assert_eq!(result, json!({"error": INVALID_TICKET_NUMBER_MESSAGE}));
    }

    #[tokio::test]
    async fn test_lookup_finds_number_in_query() {
        let result = tools(vec![])
            .call(
                LOOKUP_TICKET,
                &json!({"ticketNumber": "", "query": "what happened to inc00001111?"}),
            )
            .await;
        assert_eq!(
            result["ticketStatus"],
            "Ticket not found for ticketNumber: INC00001111"
        );
    }

    #[tokio::test]
    async fn test_knowledge_base_keeps_top_three() {
        let result = tools(vec!["a", "", "b", "c", "d"])
            .call(QUERY_KNOWLEDGE_BASE, &json!({"query": "vpn"}))
            .await;
        assert_eq!(result["found"], true);
        assert_eq!(result["results"], json!(["a", "b", "c"]));
        assert_eq!(result["message"], "Found 4 relevant document(s).");
    }

    #[tokio::test]
    async fn test_knowledge_base_without_results() {
        let result = tools(vec![""])
            .call(QUERY_KNOWLEDGE_BASE, &json!({"query": "printer"}))
            .await;
        assert_eq!(result["found"], false);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let result = tools(vec![]).call("delete_ticket", &json!({})).await;
        assert!(result.get("error").is_some());
    }

    #[test]
    fn test_tool_config_lists_all_tools() {
        let config = tools(vec![]).tool_config().unwrap();
        let names: Vec<&str> = config
            .tools()
            .iter()
            .filter_map(|tool| match tool {
                Tool::ToolSpec(spec) => Some(spec.name()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec![CREATE_TICKET, LOOKUP_TICKET, QUERY_KNOWLEDGE_BASE]);
    }
}
