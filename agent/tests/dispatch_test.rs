/// ChatDispatcher の統合テスト
///
/// 呼び出しを記録するモックバックエンドを使い、認証とセッション決定の振る舞いを検証します。
use std::sync::{Arc, Mutex};

use agent::{AgentBackend, AgentError, ChatDispatcher, ChatRequest};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// 受け取った (セッション ID, 入力) を記録するバックエンド
#[derive(Clone, Default)]
struct RecordingBackend {
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingBackend {
    fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentBackend for RecordingBackend {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn invoke(&self, session_id: &str, input_text: &str) -> Result<String, AgentError> {
        self.calls
            .lock()
            .unwrap()
            .push((session_id.to_string(), input_text.to_string()));
        Ok(format!("echo: {input_text}"))
    }
}

/// 常に失敗するバックエンド
struct FailingBackend;

#[async_trait]
impl AgentBackend for FailingBackend {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn invoke(&self, _session_id: &str, _input_text: &str) -> Result<String, AgentError> {
        Err(AgentError::AwsSdkError("service unavailable".to_string()))
    }
}

fn token_for(username: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"cognito:username":"{username}"}}"#));
    format!("{header}.{payload}.sig")
}

fn request(message: &str, session_id: Option<&str>) -> ChatRequest {
    ChatRequest {
        message: message.to_string(),
        session_id: session_id.map(str::to_string),
    }
}

#[tokio::test]
async fn test_missing_token_is_rejected_before_backend_call() {
    let backend = RecordingBackend::default();
    let dispatcher = ChatDispatcher::new(Box::new(backend.clone()), true);

    let result = dispatcher
        .dispatch(request("hello", Some("client-session")), None)
        .await;

    assert!(matches!(result, Err(AgentError::Unauthorized(_))));
    assert!(
        backend.calls().is_empty(),
        "認証エラー時はバックエンドを呼び出すべきではない"
    );
}

#[tokio::test]
async fn test_malformed_token_is_rejected() {
    let backend = RecordingBackend::default();
    let dispatcher = ChatDispatcher::new(Box::new(backend.clone()), true);

    let result = dispatcher
        .dispatch(request("hello", None), Some("only-one-part"))
        .await;

    assert!(matches!(result, Err(AgentError::Unauthorized(_))));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_token_username_becomes_session_id() {
    let backend = RecordingBackend::default();
    let dispatcher = ChatDispatcher::new(Box::new(backend.clone()), true);
    let token = token_for("alice");

    let reply = dispatcher
        .dispatch(request("  reset my password ", Some("ignored")), Some(&token))
        .await
        .unwrap();

    assert_eq!(reply.session_id, "alice");
    assert_eq!(reply.response, "echo: reset my password");
    assert_eq!(
        backend.calls(),
        vec![("alice".to_string(), "reset my password".to_string())]
    );
}

#[tokio::test]
async fn test_client_session_id_without_auth() {
    let backend = RecordingBackend::default();
    let dispatcher = ChatDispatcher::new(Box::new(backend.clone()), false);

    let reply = dispatcher
        .dispatch(request("hi", Some("3f2b8c1e-session")), None)
        .await
        .unwrap();

    assert_eq!(reply.session_id, "3f2b8c1e-session");
    assert_eq!(backend.calls().len(), 1);
}

#[tokio::test]
async fn test_empty_message_is_invalid() {
    let backend = RecordingBackend::default();
    let dispatcher = ChatDispatcher::new(Box::new(backend.clone()), false);

    let result = dispatcher.dispatch(request("   ", Some("s")), None).await;

    assert!(matches!(result, Err(AgentError::InvalidRequest(_))));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_backend_errors_propagate() {
    let dispatcher = ChatDispatcher::new(Box::new(FailingBackend), false);

    let result = dispatcher.dispatch(request("hi", Some("s")), None).await;

    assert!(matches!(result, Err(AgentError::AwsSdkError(_))));
}

#[test]
fn test_chat_request_accepts_input_text_alias() {
    let request: ChatRequest =
        serde_json::from_str(r#"{"inputText": "hello", "sessionId": "abc"}"#).unwrap();
    assert_eq!(request.message, "hello");
    assert_eq!(request.session_id.as_deref(), Some("abc"));

    let request: ChatRequest = serde_json::from_str(r#"{"message": "hi"}"#).unwrap();
    assert_eq!(request.session_id, None);
}

#[cfg(test)]
mod real_service_tests {
    use agent::{ChatDispatcher, ChatRequest, DispatcherConfig, config::load_sdk_config};

    /// 実際の Bedrock Agents / AgentCore を使ったテスト
    ///
    /// 実行方法:
    /// ```bash
    /// IMPLEMENTATION_TYPE=agentcore AGENT_RUNTIME_ARN=... REQUIRE_AUTH=false \
    ///   cargo test -p agent --test dispatch_test -- --ignored
    /// ```
    #[tokio::test]
    #[ignore] // デフォルトではスキップ（AWS認証情報が必要）
    async fn test_dispatch_against_configured_backend() {
        let config = DispatcherConfig::from_env().expect("環境変数から設定を読み込めること");
        let sdk_config = load_sdk_config(config.region.clone()).await;
        let dispatcher = ChatDispatcher::from_config(&config, &sdk_config);

        let reply = dispatcher
            .dispatch(
                ChatRequest {
                    message: "How do I reset my VPN password?".to_string(),
                    session_id: Some("integration-test-session".to_string()),
                },
                None,
            )
            .await
            .expect("バックエンドの呼び出しに失敗");

        eprintln!("返信: {}", reply.response);
        assert!(!reply.response.is_empty());
    }
}
