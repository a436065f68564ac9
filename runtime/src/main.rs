use std::net::SocketAddr;
use std::sync::Arc;

use agent::config::load_sdk_config;
use runtime::{
    BedrockKnowledgeBase, BedrockModel, ItsmAgent, ItsmTools, KnowledgeBase, RuntimeConfig,
    RuntimeError, UnconfiguredKnowledgeBase, server,
};
use ticket::TicketService;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), RuntimeError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .init();

    let config = RuntimeConfig::from_env()?;
    let sdk_config = load_sdk_config(config.region.clone()).await;

    let knowledge_base: Arc<dyn KnowledgeBase> = match &config.knowledge_base_id {
        Some(id) => Arc::new(BedrockKnowledgeBase::new(
            aws_sdk_bedrockagentruntime::Client::new(&sdk_config),
            id,
        )),
        None => {
            warn!("KNOWLEDGE_BASE_ID is not set, knowledge base queries will fail");
            Arc::new(UnconfiguredKnowledgeBase)
        }
    };
    let tools = ItsmTools::new(
        TicketService::dynamo(&sdk_config, &config.table_name),
        knowledge_base,
    );
    let model = BedrockModel::new(
        aws_sdk_bedrockruntime::Client::new(&sdk_config),
        &config.model_id,
    );
    let agent = ItsmAgent::new(Arc::new(model), tools, config.max_iterations)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, model = %config.model_id, "ITSM agent runtime listening");

    axum::serve(listener, server::router(Arc::new(agent))).await?;
    Ok(())
}
