use agent::config::ConfigError;

use crate::itsm_agent::DEFAULT_MAX_ITERATIONS;

pub const DEFAULT_MODEL_ID: &str = "us.anthropic.claude-sonnet-4-5-20250929-v1:0";
pub const DEFAULT_PORT: u16 = 8080;

/// ランタイムサービスの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// チケットを保存する DynamoDB テーブル
    pub table_name: String,
    /// 未設定の場合、ナレッジベース検索はエラーを返す
    pub knowledge_base_id: Option<String>,
    pub model_id: String,
    pub max_iterations: usize,
    pub port: u16,
    pub region: Option<String>,
}

impl RuntimeConfig {
    /// 環境変数から設定を読み込む
    ///
    /// `TABLE_NAME` は必須。`KNOWLEDGE_BASE_ID`, `MODEL_ID`, `MAX_ITERATIONS`,
    /// `PORT`, `AWS_REGION` は任意。
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let max_iterations = match get("MAX_ITERATIONS") {
            None => DEFAULT_MAX_ITERATIONS,
            Some(value) => parse_number("MAX_ITERATIONS", &value)?,
        };
        let port = match get("PORT") {
            None => DEFAULT_PORT,
            Some(value) => parse_number("PORT", &value)?,
        };

        Ok(Self {
            table_name: get("TABLE_NAME").ok_or(ConfigError::MissingVariable("TABLE_NAME"))?,
            knowledge_base_id: get("KNOWLEDGE_BASE_ID"),
            model_id: get("MODEL_ID").unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
            max_iterations,
            port,
            region: get("AWS_REGION"),
        })
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
    })
}
