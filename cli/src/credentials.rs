//! ログイン情報のローカル保存

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// 保存先を上書きする環境変数
pub const CREDENTIALS_FILE_ENV: &str = "ITSM_CREDENTIALS_FILE";

/// ログインで得たトークンとセッション ID
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// ID トークン（チャット API のベアラートークン）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// 最初のログイン時に発行し、以降は使い回す
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl Credentials {
    /// セッション ID を返す。未発行なら新しく発行する
    pub fn ensure_session_id(&mut self) -> &str {
        self.session_id
            .get_or_insert_with(|| uuid::Uuid::new_v4().to_string())
    }
}

/// 認証情報ファイル
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `ITSM_CREDENTIALS_FILE`、なければ `~/.itsm/credentials.json`
    pub fn default_location() -> Self {
        let path = std::env::var_os(CREDENTIALS_FILE_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".itsm")
                    .join("credentials.json")
            });
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 保存された認証情報を読み込む。ファイルがなければ空を返す
    pub fn load(&self) -> Result<Credentials> {
        if !self.path.exists() {
            return Ok(Credentials::default());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid credentials file: {}", self.path.display()))
    }

    pub fn save(&self, credentials: &Credentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(credentials)?)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }

    /// 認証情報を削除する
    ///
    /// # Returns
    /// * `true` - 削除した
    /// * `false` - もともと存在しなかった
    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> CredentialStore {
        CredentialStore::new(dir.path().join("nested").join("credentials.json"))
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(store_in(&dir).load().unwrap(), Credentials::default());
    }

    #[test]
    fn test_save_load_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut credentials = Credentials {
            token: Some("id-token".to_string()),
            access_token: Some("access-token".to_string()),
            session_id: None,
        };
        let session_id = credentials.ensure_session_id().to_string();

        store.save(&credentials).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["token"], "id-token");
        assert_eq!(raw["accessToken"], "access-token");
        assert_eq!(raw["sessionId"], session_id.as_str());

        assert_eq!(store.load().unwrap(), credentials);
        assert!(store.clear().unwrap());
        assert!(!store.clear().unwrap());
    }

    #[test]
    fn test_session_id_is_minted_once() {
        let mut credentials = Credentials::default();
        let first = credentials.ensure_session_id().to_string();
        let second = credentials.ensure_session_id().to_string();
        assert_eq!(first, second);
        assert!(uuid::Uuid::parse_str(&first).is_ok());
    }
}
