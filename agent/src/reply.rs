//! AgentCore ランタイムの応答からテキストを取り出す
//!
//! ランタイムの応答形式はデプロイされたエージェント次第なので、複数の形を順に試す。

use serde_json::Value;

/// 応答オブジェクトの中で返信テキストを探すキー（優先順）
const REPLY_KEYS: [&str; 5] = ["message", "response", "result", "output", "text"];

/// 再組み立て済みの応答テキストから返信を抽出する
///
/// 1. `data:` で始まる行があれば SSE とみなし、各イベントを個別にデコードして連結する
/// 2. JSON として解釈できれば構造から返信を探す
/// 3. いずれにも当てはまらなければ生のテキストを返す
pub fn extract_reply(raw: &str) -> String {
    let trimmed = raw.trim();

    if is_event_stream(trimmed) {
        return trimmed
            .lines()
            .filter_map(|line| line.trim_start().strip_prefix("data:"))
            .map(str::trim)
            .filter(|data| !data.is_empty())
            .map(decode_fragment)
            .collect();
    }

    decode_fragment(trimmed)
}

fn is_event_stream(text: &str) -> bool {
    text.lines().any(|line| line.trim_start().starts_with("data:"))
}

fn decode_fragment(fragment: &str) -> String {
    match serde_json::from_str::<Value>(fragment) {
        Ok(value) => reply_from_value(&value).unwrap_or_else(|| fragment.to_string()),
        Err(_) => fragment.to_string(),
    }
}

/// JSON 値から返信テキストを探す
///
/// 対応する形:
/// - `"text"`（JSON 文字列。中身がさらに JSON オブジェクトなら再帰的に解釈する）
/// - `{"message": {"role": ..., "content": [{"text": ...}]}}`
/// - `{"message" | "response" | "result" | "output" | "text": ...}`
/// - `{"content": [{"text": ...}]}`
/// - `{"error": "..."}`
pub fn reply_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(inner @ Value::Object(_)) => reply_from_value(&inner).or_else(|| Some(text.clone())),
            _ => Some(text.clone()),
        },
        Value::Object(map) => {
            for key in REPLY_KEYS {
                if let Some(found) = map.get(key)
                    && let Some(text) = reply_from_value(found)
                {
                    return Some(text);
                }
            }
            if let Some(content) = map.get("content")
                && let Some(text) = text_from_content(content)
            {
                return Some(text);
            }
            map.get("error").and_then(Value::as_str).map(str::to_string)
        }
        Value::Array(_) => text_from_content(value),
        _ => None,
    }
}

/// `[{"text": "..."}, ...]` 形式のコンテンツブロックを連結する
fn text_from_content(content: &Value) -> Option<String> {
    let blocks = content.as_array()?;
    let texts: Vec<&str> = blocks
        .iter()
        .filter_map(|block| match block {
            Value::String(text) => Some(text.as_str()),
            other => other.get("text").and_then(Value::as_str),
        })
        .collect();

    (!texts.is_empty()).then(|| texts.concat())
}
