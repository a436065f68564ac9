use agent::config::ConfigError;
use aws_smithy_types::error::operation::BuildError;

/// ランタイムサービスのエラー型
#[derive(thiserror::Error, Debug)]
pub enum RuntimeError {
    #[error("AWS Bedrock API error: {0}")]
    BedrockError(String),

    #[error("Knowledge base error: {0}")]
    KnowledgeBaseError(String),

    #[error("Failed to build request: {0}")]
    BuildError(#[from] BuildError),

    #[error("Model returned no message")]
    EmptyResponse,

    #[error("Reached the maximum of {0} tool iterations without a final answer")]
    IterationLimit(usize),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
