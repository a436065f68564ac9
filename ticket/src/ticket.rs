use chrono::{SecondsFormat, Utc};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::store::TicketError;

/// 新規チケットに付与される固定ステータス
pub const PENDING_STATUS: &str = "Pending";

/// チケット番号のプレフィックスとして使うチケット種別の文字数
const PREFIX_LEN: usize = 3;

/// チケット番号に付与するランダムな数字の桁数
const DIGIT_COUNT: usize = 8;

/// 受け付けるチケット種別（インシデント・リクエスト・変更）
pub const TICKET_TYPES: [&str; 3] = ["INC", "REQ", "CHG"];

/// 影響度・緊急度として受け付ける値
pub const LEVELS: [&str; 3] = ["High", "Medium", "Low"];

static TICKET_NUMBER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(INC|REQ|CHG)\d{8}").expect("ticket number pattern is valid"));

static FULL_TICKET_NUMBER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(INC|REQ|CHG)\d{8}$").expect("ticket number pattern is valid"));

/// チケット作成リクエスト
///
/// API Gateway の POST ボディやエージェントのツール引数から組み立てられる。
/// 欠けているフィールドは空文字として扱う。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRequest {
    #[serde(default)]
    pub tickettype: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub impact: String,
    #[serde(default)]
    pub urgency: String,
}

impl TicketRequest {
    /// エージェント経由の入力を正規化する
    ///
    /// - 種別は大文字化し、INC/REQ/CHG 以外は INC に置き換える
    /// - 影響度・緊急度は先頭のみ大文字化し、High/Medium/Low 以外は Medium に置き換える
    ///
    /// # Errors
    /// 説明が空の場合は `TicketError::InvalidRequest`
    pub fn normalized(self) -> Result<Self, TicketError> {
        let description = self.description.trim().to_string();
        if description.is_empty() {
            return Err(TicketError::InvalidRequest(
                "Description is required for ticket creation".to_string(),
            ));
        }

        let tickettype = self.tickettype.trim().to_uppercase();
        let tickettype = if TICKET_TYPES.contains(&tickettype.as_str()) {
            tickettype
        } else {
            "INC".to_string()
        };

        Ok(Self {
            tickettype,
            description,
            impact: normalize_level(&self.impact),
            urgency: normalize_level(&self.urgency),
        })
    }
}

fn normalize_level(value: &str) -> String {
    let titled = title_case(value.trim());
    if LEVELS.contains(&titled.as_str()) {
        titled
    } else {
        "Medium".to_string()
    }
}

fn title_case(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// DynamoDB に保存される ITSM チケット
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub ticket_number: String,
    pub ticket_type: String,
    pub description: String,
    pub impact: String,
    pub urgency: String,
    pub status: String,
    pub created_at: String,
}

impl Ticket {
    /// リクエストから新しいチケットを作成する
    ///
    /// チケット番号は種別の先頭3文字と8桁の乱数から生成されるため、
    /// 一意性は確率的にしか保証されない。
    pub fn new(request: TicketRequest) -> Self {
        let ticket_number = generate_ticket_number(&request.tickettype, &mut rand::thread_rng());
        Self {
            ticket_number,
            ticket_type: request.tickettype,
            description: request.description,
            impact: request.impact,
            urgency: request.urgency,
            status: PENDING_STATUS.to_string(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }
}

/// 種別の先頭3文字に8桁の数字を連結したチケット番号を生成する
pub fn generate_ticket_number<R: Rng + ?Sized>(ticket_type: &str, rng: &mut R) -> String {
    let prefix: String = ticket_type.chars().take(PREFIX_LEN).collect();
    let digits: String = (0..DIGIT_COUNT)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect();
    format!("{prefix}{digits}")
}

/// `INC12345678` 形式のチケット番号かどうか（大文字小文字は区別しない）
pub fn is_valid_ticket_number(value: &str) -> bool {
    FULL_TICKET_NUMBER_PATTERN.is_match(&value.trim().to_uppercase())
}

/// 自由文の中からチケット番号を探す
pub fn find_ticket_number(text: &str) -> Option<String> {
    TICKET_NUMBER_PATTERN
        .find(&text.to_uppercase())
        .map(|m| m.as_str().to_string())
}
