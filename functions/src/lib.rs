pub mod action_group;
pub mod handlers;
pub mod http;
pub mod telemetry;

pub use lambda_http::Error;

/// チケットテーブル名を環境変数 `TABLE_NAME` から取得する
pub fn table_name_from_env() -> Result<String, Error> {
    std::env::var("TABLE_NAME")
        .ok()
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| "TABLE_NAME must be set".into())
}

/// DynamoDB をバックエンドとするチケットサービスを環境から組み立てる
pub async fn ticket_service_from_env() -> Result<ticket::TicketService, Error> {
    let table_name = table_name_from_env()?;
    let sdk_config = agent::config::load_sdk_config(std::env::var("AWS_REGION").ok()).await;
    Ok(ticket::TicketService::dynamo(&sdk_config, table_name))
}
