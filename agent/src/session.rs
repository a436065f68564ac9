//! セッション ID の決定
//!
//! ベアラートークン（JWT）からユーザー名を取り出すか、クライアントが送った
//! セッション ID を使う。トークンの署名は検証しない。

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::Value;
use uuid::Uuid;

use crate::agent::AgentError;

/// AgentCore の runtimeSessionId に要求される最小文字数
pub const MIN_RUNTIME_SESSION_ID_LEN: usize = 33;

/// ユーザー名として参照するクレーム（先に見つかったものを使う）
const USERNAME_CLAIMS: [&str; 3] = ["cognito:username", "username", "sub"];

/// `Authorization` ヘッダーからベアラートークンを取り出す
///
/// `Bearer ` プレフィックスは大文字小文字を区別しない。プレフィックスがない場合は
/// ヘッダー値そのものをトークンとみなす。
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let value = header?.trim();
    let token = match value.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => value[7..].trim(),
        _ => value,
    };
    (!token.is_empty()).then_some(token)
}

/// JWT のペイロードをデコードしてユーザー名を取り出す
///
/// # Errors
/// 3パートの JWT でない、ペイロードが JSON オブジェクトでない、
/// ユーザー名クレームがない場合は `AgentError::Unauthorized`
pub fn decode_username(token: &str) -> Result<String, AgentError> {
    let parts: Vec<&str> = token.split('.').collect();
    let [_, payload, _] = parts.as_slice() else {
        return Err(AgentError::Unauthorized("malformed token".to_string()));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AgentError::Unauthorized(format!("invalid token payload: {e}")))?;

    let claims: Value = serde_json::from_slice(&bytes)
        .map_err(|e| AgentError::Unauthorized(format!("invalid token claims: {e}")))?;

    USERNAME_CLAIMS
        .iter()
        .find_map(|claim| claims.get(*claim).and_then(Value::as_str))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AgentError::Unauthorized("token has no username claim".to_string()))
}

/// リクエストのセッション ID を決定する
///
/// # Arguments
/// * `token` - ベアラートークン（オプション）
/// * `client_session_id` - クライアントが生成したセッション ID（オプション）
/// * `require_auth` - トークンを必須とするか
///
/// # Returns
/// * 認証必須の場合はトークンのユーザー名。トークンがない・不正な場合は `AgentError::Unauthorized`
/// * 認証任意の場合はトークンのユーザー名、クライアントのセッション ID、新規 UUID の順に採用
pub fn resolve_session_id(
    token: Option<&str>,
    client_session_id: Option<&str>,
    require_auth: bool,
) -> Result<String, AgentError> {
    if require_auth {
        let token =
            token.ok_or_else(|| AgentError::Unauthorized("missing bearer token".to_string()))?;
        return decode_username(token);
    }

    if let Some(username) = token.and_then(|t| decode_username(t).ok()) {
        return Ok(username);
    }

    Ok(client_session_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string()))
}

/// AgentCore の最小長を満たすセッション ID を返す
///
/// 短い場合は元の ID から導出した UUID を連結する。同じ入力からは常に同じ ID になるため、
/// ランタイム側の会話履歴が維持される。
pub fn ensure_runtime_session_id(session_id: &str) -> String {
    if session_id.chars().count() >= MIN_RUNTIME_SESSION_ID_LEN {
        return session_id.to_string();
    }
    if session_id.is_empty() {
        return Uuid::new_v4().to_string();
    }
    let generated = Uuid::new_v5(&Uuid::NAMESPACE_OID, session_id.as_bytes());
    format!("{session_id}-{generated}")
}
