use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::store::{DynamoTicketStore, TicketError, TicketStore};
use crate::ticket::{Ticket, TicketRequest};

/// 保存に失敗した場合にユーザーへ返す固定メッセージ
pub const CREATE_FAILED_MESSAGE: &str = "Failed to create ticket";

/// 取得に失敗した場合にユーザーへ返す固定メッセージ
pub const LOOKUP_FAILED_MESSAGE: &str = "Error retrieving ticket";

/// チケット作成の結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResult {
    pub ticket_number: String,
    pub message: String,
}

impl CreateResult {
    fn from_ticket(ticket: &Ticket) -> Self {
        Self {
            ticket_number: ticket.ticket_number.clone(),
            message: format!(
                "Ticket created successfully. Ticket number: {}",
                ticket.ticket_number
            ),
        }
    }
}

/// チケット照会の結果
///
/// 見つからなかった場合は `ticket_status` にその旨のメッセージだけが入る。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResult {
    pub ticket_status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_impact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_urgency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl LookupResult {
    pub fn not_found(ticket_number: &str) -> Self {
        Self {
            ticket_status: format!("Ticket not found for ticketNumber: {ticket_number}"),
            ticket_desc: None,
            ticket_impact: None,
            ticket_urgency: None,
            created_at: None,
        }
    }

    /// チケットが見つかったかどうか
    pub fn is_found(&self) -> bool {
        self.created_at.is_some()
    }
}

impl From<Ticket> for LookupResult {
    fn from(ticket: Ticket) -> Self {
        Self {
            ticket_status: ticket.status,
            ticket_desc: Some(ticket.description),
            ticket_impact: Some(ticket.impact),
            ticket_urgency: Some(ticket.urgency),
            created_at: Some(ticket.created_at),
        }
    }
}

/// チケットの作成・照会を行うサービス
///
/// Lambda ハンドラ、アクショングループ、AgentCore ランタイムのツールから共有される。
#[derive(Clone)]
pub struct TicketService {
    store: Arc<dyn TicketStore>,
}

impl TicketService {
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        Self { store }
    }

    /// DynamoDB をバックエンドとするサービスを作成する
    ///
    /// # Arguments
    /// * `config` - 読み込み済みの AWS SDK 設定
    /// * `table_name` - チケットテーブル名
    pub fn dynamo(config: &aws_config::SdkConfig, table_name: impl Into<String>) -> Self {
        let client = aws_sdk_dynamodb::Client::new(config);
        Self::new(Arc::new(DynamoTicketStore::new(client, table_name)))
    }

    /// チケットを作成して保存する
    ///
    /// 同じ番号のアイテムが既に存在しても上書きする。
    ///
    /// # Returns
    /// * `Ok(CreateResult)` - 生成されたチケット番号と成功メッセージ
    /// * `Err(TicketError)` - 保存に失敗した場合
    pub async fn create(&self, request: TicketRequest) -> Result<CreateResult, TicketError> {
        let ticket = Ticket::new(request);

        if let Err(e) = self.store.put_ticket(&ticket).await {
            error!(error = %e, "failed to store ticket");
            return Err(e);
        }

        info!(ticket = %ticket.ticket_number, "ticket created");
        Ok(CreateResult::from_ticket(&ticket))
    }

    /// チケット番号でチケットを照会する
    ///
    /// # Returns
    /// * `Ok(LookupResult)` - 見つかった場合は各フィールド、見つからない場合は not found メッセージ
    /// * `Err(TicketError)` - 読み込みに失敗した場合
    pub async fn lookup(&self, ticket_number: &str) -> Result<LookupResult, TicketError> {
        match self.store.get_ticket(ticket_number).await {
            Ok(Some(ticket)) => {
                info!(ticket = %ticket_number, "ticket found");
                Ok(ticket.into())
            }
            Ok(None) => {
                info!(ticket = %ticket_number, "ticket not found");
                Ok(LookupResult::not_found(ticket_number))
            }
            Err(e) => {
                error!(error = %e, ticket = %ticket_number, "failed to read ticket");
                Err(e)
            }
        }
    }
}
