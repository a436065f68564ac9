//! Bedrock Agents のアクショングループ用ハンドラ
//!
//! エージェントから届くイベント（`apiPath` とプロパティ一覧）をチケット操作に変換し、
//! アクショングループのレスポンス形式で結果を返す。

use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use ticket::{TicketError, TicketRequest, TicketService};
use tracing::{error, info};

/// アクショングループ処理のエラー型
#[derive(thiserror::Error, Debug)]
pub enum ActionGroupError {
    #[error("{0}")]
    MissingField(String),

    #[error("Unsupported apiPath: {0}")]
    UnsupportedPath(String),

    #[error("Invalid event: {0}")]
    InvalidEvent(#[from] serde_json::Error),

    #[error(transparent)]
    Ticket(#[from] TicketError),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActionGroupEvent {
    action_group: Option<String>,
    api_path: Option<String>,
    http_method: Option<String>,
    message_version: Option<Value>,
    #[serde(default)]
    request_body: Option<RequestBody>,
}

#[derive(Debug, Default, Deserialize)]
struct RequestBody {
    #[serde(default)]
    content: HashMap<String, MediaContent>,
}

#[derive(Debug, Default, Deserialize)]
struct MediaContent {
    #[serde(default)]
    properties: Vec<Property>,
}

#[derive(Debug, Deserialize)]
struct Property {
    name: String,
    #[serde(default)]
    value: Value,
}

impl ActionGroupEvent {
    /// `requestBody.content["application/json"].properties` から値を探す
    fn property(&self, name: &str) -> Option<String> {
        self.request_body
            .as_ref()?
            .content
            .get("application/json")?
            .properties
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| match &p.value {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
    }
}

fn required(value: Option<String>, name: &str) -> Result<String, ActionGroupError> {
    value.ok_or_else(|| ActionGroupError::MissingField(format!("'{name}'")))
}

/// アクショングループのイベントを処理する
///
/// 必須フィールドの欠落は 400、それ以外の失敗は 500 の形で返し、
/// ハンドラの外にエラーを伝播させない。
pub async fn handle(service: &TicketService, event: Value) -> Value {
    match process(service, event).await {
        Ok(response) => {
            info!(response = %response, "action group response");
            response
        }
        Err(ActionGroupError::MissingField(field)) => {
            error!(field = %field, "missing required field");
            json!({
                "statusCode": 400,
                "body": format!("Error: Missing required field: {field}"),
            })
        }
        Err(e @ ActionGroupError::UnsupportedPath(_)) => {
            error!(error = %e, "unsupported action");
            json!({
                "statusCode": 400,
                "body": format!("Error: {e}"),
            })
        }
        Err(e) => {
            error!(error = %e, "unexpected error");
            json!({
                "statusCode": 500,
                "body": format!("Internal server error: {e}"),
            })
        }
    }
}

async fn process(service: &TicketService, event: Value) -> Result<Value, ActionGroupError> {
    let event: ActionGroupEvent = serde_json::from_value(event)?;

    let action_group = required(event.action_group.clone(), "actionGroup")?;
    let api_path = required(event.api_path.clone(), "apiPath")?;
    let http_method = required(event.http_method.clone(), "httpMethod")?;
    let message_version = event.message_version.clone().unwrap_or(json!(1));

    let response_body = match api_path.trim_start_matches('/') {
        "create" => {
            let request = TicketRequest {
                tickettype: event.property("tickettype").unwrap_or_default(),
                description: event.property("description").unwrap_or_default(),
                impact: event.property("impact").unwrap_or_default(),
                urgency: event.property("urgency").unwrap_or_default(),
            };
            let created = service.create(request).await?;
            json!({
                "application/json": {
                    "ticketNumber": created.ticket_number,
                }
            })
        }
        "lookup" => {
            let ticket_number = required(event.property("ticketNumber"), "ticketNumber")?;
            let result = service.lookup(&ticket_number).await?;
            let or_none = |value: Option<String>| value.unwrap_or_else(|| "None".to_string());
            json!({
                "application/json": {
                    "body": {
                        "ticketStatus": result.ticket_status,
                        "ticketDesc": or_none(result.ticket_desc),
                        "ticketImpact": or_none(result.ticket_impact),
                        "ticketUrgency": or_none(result.ticket_urgency),
                        "createdAt": or_none(result.created_at),
                    }
                }
            })
        }
        other => return Err(ActionGroupError::UnsupportedPath(other.to_string())),
    };

    Ok(json!({
        "response": {
            "actionGroup": action_group,
            "apiPath": api_path,
            "httpMethod": http_method,
            "httpStatusCode": 200,
            "responseBody": response_body,
        },
        "messageVersion": message_version,
    }))
}
