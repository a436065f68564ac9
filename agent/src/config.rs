/// チャットディスパッチャーの設定
///
/// Lambda の環境変数から読み込み、型付きの設定として各コンポーネントに渡す。
use std::str::FromStr;

use aws_config::meta::region::RegionProviderChain;
use aws_config::{BehaviorVersion, SdkConfig};

/// AgentCore ランタイムのデフォルトのエンドポイント修飾子
pub const DEFAULT_QUALIFIER: &str = "DEFAULT";

/// 設定読み込みのエラー型
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown implementation type: {0}")]
    UnknownImplementation(String),

    #[error("Missing environment variable: {0}")]
    MissingVariable(&'static str),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// チャットの転送先となる実装の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImplementationType {
    /// マネージドな Bedrock Agents
    BedrockAgents,
    /// Bedrock AgentCore 上のカスタムランタイム
    AgentCore,
}

impl FromStr for ImplementationType {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bedrock-agents" | "bedrock-agent" | "agents" => Ok(Self::BedrockAgents),
            "agentcore" | "bedrock-agentcore" => Ok(Self::AgentCore),
            other => Err(ConfigError::UnknownImplementation(other.to_string())),
        }
    }
}

/// バックエンドごとの接続設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    BedrockAgents {
        agent_id: String,
        agent_alias_id: String,
    },
    AgentCore {
        runtime_arn: String,
        qualifier: String,
    },
}

impl BackendConfig {
    pub fn implementation(&self) -> ImplementationType {
        match self {
            Self::BedrockAgents { .. } => ImplementationType::BedrockAgents,
            Self::AgentCore { .. } => ImplementationType::AgentCore,
        }
    }
}

/// ディスパッチャー全体の設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    pub backend: BackendConfig,
    /// ベアラートークンを必須とするか
    pub require_auth: bool,
    /// リージョン（オプション）
    pub region: Option<String>,
}

impl DispatcherConfig {
    /// 環境変数から設定を読み込む
    ///
    /// | 変数 | 用途 |
    /// |------|------|
    /// | `IMPLEMENTATION_TYPE` | `bedrock-agents` または `agentcore` |
    /// | `AGENT_ID` / `AGENT_ALIAS_ID` | Bedrock Agents 用 |
    /// | `AGENT_RUNTIME_ARN` / `AGENT_RUNTIME_QUALIFIER` | AgentCore 用 |
    /// | `REQUIRE_AUTH` | `false` で認証を任意にする（デフォルト `true`） |
    /// | `AWS_REGION` | リージョン |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 任意の変数ソースから設定を読み込む
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |name: &'static str| get(name).ok_or(ConfigError::MissingVariable(name));

        let implementation: ImplementationType = require("IMPLEMENTATION_TYPE")?.parse()?;

        let backend = match implementation {
            ImplementationType::BedrockAgents => BackendConfig::BedrockAgents {
                agent_id: require("AGENT_ID")?,
                agent_alias_id: require("AGENT_ALIAS_ID")?,
            },
            ImplementationType::AgentCore => BackendConfig::AgentCore {
                runtime_arn: require("AGENT_RUNTIME_ARN")?,
                qualifier: get("AGENT_RUNTIME_QUALIFIER")
                    .unwrap_or_else(|| DEFAULT_QUALIFIER.to_string()),
            },
        };

        let require_auth = match get("REQUIRE_AUTH") {
            None => true,
            Some(value) => parse_bool("REQUIRE_AUTH", &value)?,
        };

        Ok(Self {
            backend,
            require_auth,
            region: get("AWS_REGION"),
        })
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
        }),
    }
}

/// AWS SDK の設定を読み込む
///
/// # Arguments
/// * `region` - リージョン（オプション）。指定しない場合はデフォルトプロバイダーの設定またはus-east-1を使用
pub async fn load_sdk_config(region: Option<String>) -> SdkConfig {
    let region_provider = RegionProviderChain::first_try(region.map(aws_config::Region::new))
        .or_default_provider()
        .or_else(aws_config::Region::new("us-east-1"));

    aws_config::defaults(BehaviorVersion::latest())
        .region(region_provider)
        .load()
        .await
}
