use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::AttributeValue;
use tokio::sync::RwLock;
use tracing::debug;

use crate::ticket::Ticket;

/// チケットストアのエラー型
#[derive(thiserror::Error, Debug)]
pub enum TicketError {
    #[error("DynamoDB error: {0}")]
    StorageError(String),

    #[error("Invalid ticket item: {0}")]
    InvalidItem(String),

    #[error("Invalid ticket request: {0}")]
    InvalidRequest(String),
}

/// チケットの永続化層
///
/// 1件の put と、キー指定の get のみを提供する。
/// 既存チェックや条件付き書き込み、リトライは行わない。
#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn put_ticket(&self, ticket: &Ticket) -> Result<(), TicketError>;

    async fn get_ticket(&self, ticket_number: &str) -> Result<Option<Ticket>, TicketError>;
}

/// DynamoDB テーブルをバックエンドとするストア
///
/// パーティションキーは `ticketNumber`。
#[derive(Clone)]
pub struct DynamoTicketStore {
    client: Client,
    table_name: String,
}

impl DynamoTicketStore {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

#[async_trait]
impl TicketStore for DynamoTicketStore {
    async fn put_ticket(&self, ticket: &Ticket) -> Result<(), TicketError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(ticket_to_item(ticket)))
            .send()
            .await
            .map_err(|e| TicketError::StorageError(e.to_string()))?;

        debug!(table = %self.table_name, ticket = %ticket.ticket_number, "put_item succeeded");
        Ok(())
    }

    async fn get_ticket(&self, ticket_number: &str) -> Result<Option<Ticket>, TicketError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("ticketNumber", AttributeValue::S(ticket_number.to_string()))
            .send()
            .await
            .map_err(|e| TicketError::StorageError(e.to_string()))?;

        output.item().map(ticket_from_item).transpose()
    }
}

/// チケットを DynamoDB のアイテムに変換する
pub fn ticket_to_item(ticket: &Ticket) -> HashMap<String, AttributeValue> {
    HashMap::from([
        s_attr("ticketNumber", &ticket.ticket_number),
        s_attr("ticketType", &ticket.ticket_type),
        s_attr("ticketDesc", &ticket.description),
        s_attr("ticketImpact", &ticket.impact),
        s_attr("ticketUrgency", &ticket.urgency),
        s_attr("ticketStatus", &ticket.status),
        s_attr("createdAt", &ticket.created_at),
    ])
}

/// DynamoDB のアイテムからチケットを復元する
///
/// `ticketNumber` 以外の属性は欠けていても空文字として扱う。
pub fn ticket_from_item(item: &HashMap<String, AttributeValue>) -> Result<Ticket, TicketError> {
    let ticket_number = string_attr(item, "ticketNumber")
        .ok_or_else(|| TicketError::InvalidItem("missing ticketNumber".to_string()))?;

    Ok(Ticket {
        ticket_number,
        ticket_type: string_attr(item, "ticketType").unwrap_or_default(),
        description: string_attr(item, "ticketDesc").unwrap_or_default(),
        impact: string_attr(item, "ticketImpact").unwrap_or_default(),
        urgency: string_attr(item, "ticketUrgency").unwrap_or_default(),
        status: string_attr(item, "ticketStatus").unwrap_or_default(),
        created_at: string_attr(item, "createdAt").unwrap_or_default(),
    })
}

fn s_attr(name: &str, value: &str) -> (String, AttributeValue) {
    (name.to_string(), AttributeValue::S(value.to_string()))
}

fn string_attr(item: &HashMap<String, AttributeValue>, name: &str) -> Option<String> {
    item.get(name).and_then(|v| v.as_s().ok()).cloned()
}

/// プロセス内メモリに保持するストア
///
/// ローカル実行とテスト用。
#[derive(Default)]
pub struct MemoryTicketStore {
    tickets: RwLock<HashMap<String, Ticket>>,
}

impl MemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tickets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tickets.read().await.is_empty()
    }
}

#[async_trait]
impl TicketStore for MemoryTicketStore {
    async fn put_ticket(&self, ticket: &Ticket) -> Result<(), TicketError> {
        self.tickets
            .write()
            .await
            .insert(ticket.ticket_number.clone(), ticket.clone());
        Ok(())
    }

    async fn get_ticket(&self, ticket_number: &str) -> Result<Option<Ticket>, TicketError> {
        Ok(self.tickets.read().await.get(ticket_number).cloned())
    }
}
