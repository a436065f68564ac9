/// TicketService の統合テスト
///
/// メモリストアと、常に失敗するストアを使って作成・照会の振る舞いを検証します。
use std::sync::Arc;

use async_trait::async_trait;
use ticket::{
    MemoryTicketStore, PENDING_STATUS, Ticket, TicketError, TicketRequest, TicketService,
    TicketStore,
};

/// すべての操作が失敗するストア
struct FailingStore;

#[async_trait]
impl TicketStore for FailingStore {
    async fn put_ticket(&self, _ticket: &Ticket) -> Result<(), TicketError> {
        Err(TicketError::StorageError("throttled".to_string()))
    }

    async fn get_ticket(&self, _ticket_number: &str) -> Result<Option<Ticket>, TicketError> {
        Err(TicketError::StorageError("throttled".to_string()))
    }
}

fn incident() -> TicketRequest {
    TicketRequest {
        tickettype: "INC".to_string(),
        description: "x".to_string(),
        impact: "Low".to_string(),
        urgency: "Low".to_string(),
    }
}

#[tokio::test]
async fn test_create_then_lookup() {
    let store = Arc::new(MemoryTicketStore::new());
    let service = TicketService::new(store.clone());

    let created = service.create(incident()).await.unwrap();
    assert!(created.ticket_number.starts_with("INC"));
    assert_eq!(created.ticket_number.len(), 11);
    assert!(
        created.message.contains(&created.ticket_number),
        "成功メッセージにチケット番号が含まれるべき"
    );
    assert_eq!(store.len().await, 1);

    let found = service.lookup(&created.ticket_number).await.unwrap();
    assert!(found.is_found());
    assert_eq!(found.ticket_status, PENDING_STATUS);
    assert_eq!(found.ticket_desc.as_deref(), Some("x"));
    assert_eq!(found.ticket_impact.as_deref(), Some("Low"));
    assert_eq!(found.ticket_urgency.as_deref(), Some("Low"));
}

#[tokio::test]
async fn test_lookup_unknown_ticket() {
    let service = TicketService::new(Arc::new(MemoryTicketStore::new()));

    let result = service.lookup("INC99999999").await.unwrap();
    assert!(!result.is_found());
    assert_eq!(
        result.ticket_status,
        "Ticket not found for ticketNumber: INC99999999"
    );

    // 見つからない場合は ticketStatus のみがシリアライズされる
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"ticketStatus": "Ticket not found for ticketNumber: INC99999999"})
    );
}

#[tokio::test]
async fn test_storage_errors_are_returned() {
    let service = TicketService::new(Arc::new(FailingStore));

    assert!(matches!(
        service.create(incident()).await,
        Err(TicketError::StorageError(_))
    ));
    assert!(matches!(
        service.lookup("INC12345678").await,
        Err(TicketError::StorageError(_))
    ));
}

#[tokio::test]
async fn test_create_does_not_check_existing_items() {
    let store = Arc::new(MemoryTicketStore::new());
    let service = TicketService::new(store.clone());

    for _ in 0..5 {
        service.create(incident()).await.unwrap();
    }
    // 乱数の衝突がなければ5件すべてが保存される
    assert!(store.len().await >= 4);
}
