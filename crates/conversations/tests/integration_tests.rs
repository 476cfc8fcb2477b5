//! Integration tests for the conversation domain services, run against a
//! real migrated SQLite database.

use sqlx::SqlitePool;
use tempfile::TempDir;

use mediline_config::MediaConfig;
use mediline_conversations::{
    AttachmentService, CallService, ConversationError, ConversationService, HistoryItem,
    MessageService,
};
use mediline_database::{
    run_migrations, AccountType, CallStatus, CallType, CreateUserRequest, UserRepository,
};

struct TestContext {
    pool: SqlitePool,
    media: MediaConfig,
    patient_id: i64,
    doctor_id: i64,
    outsider_id: i64,
    conversation_id: i64,
    _temp_dir: TempDir,
}

impl TestContext {
    async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("conversations.db");
        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

        let pool = SqlitePool::connect(&db_url).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let media = MediaConfig {
            base_url: "http://localhost:7080/media".to_string(),
            storage_dir: temp_dir.path().join("media").display().to_string(),
        };

        let users = UserRepository::new(pool.clone());
        let patient = users
            .create(&CreateUserRequest {
                username: "patient".to_string(),
                first_name: "Paula".to_string(),
                last_name: "Stone".to_string(),
                email: "patient@example.com".to_string(),
                account_type: AccountType::Patient,
            })
            .await
            .unwrap();
        let doctor = users
            .create(&CreateUserRequest {
                username: "doctor".to_string(),
                first_name: "Dana".to_string(),
                last_name: "Reed".to_string(),
                email: "doctor@example.com".to_string(),
                account_type: AccountType::Doctor,
            })
            .await
            .unwrap();
        let outsider = users
            .create(&CreateUserRequest {
                username: "outsider".to_string(),
                first_name: "Oscar".to_string(),
                last_name: "Wild".to_string(),
                email: "outsider@example.com".to_string(),
                account_type: AccountType::Patient,
            })
            .await
            .unwrap();

        let conversation = ConversationService::new(pool.clone(), media.clone())
            .create(patient.id, doctor.id)
            .await
            .unwrap();

        Self {
            pool,
            media,
            patient_id: patient.id,
            doctor_id: doctor.id,
            outsider_id: outsider.id,
            conversation_id: conversation.id,
            _temp_dir: temp_dir,
        }
    }

    fn conversations(&self) -> ConversationService {
        ConversationService::new(self.pool.clone(), self.media.clone())
    }

    fn messages(&self) -> MessageService {
        MessageService::new(self.pool.clone(), self.media.clone())
    }

    fn attachments(&self) -> AttachmentService {
        AttachmentService::new(self.pool.clone(), self.media.clone())
    }

    fn calls(&self) -> CallService {
        CallService::new(self.pool.clone())
    }
}

#[tokio::test]
async fn one_chat_message_persists_exactly_one_row() {
    let ctx = TestContext::new().await;

    ctx.messages()
        .create_message(ctx.conversation_id, ctx.patient_id, "hi")
        .await
        .unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE conversation_id = ?")
        .bind(ctx.conversation_id)
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn non_participant_cannot_send_messages() {
    let ctx = TestContext::new().await;

    let result = ctx
        .messages()
        .create_message(ctx.conversation_id, ctx.outsider_id, "let me in")
        .await;
    assert!(matches!(
        result,
        Err(ConversationError::PermissionDenied { .. })
    ));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_eq!(count, 0, "rejected message must not be persisted");
}

#[tokio::test]
async fn attachment_linking_skips_unknown_ids() {
    let ctx = TestContext::new().await;
    let messages = ctx.messages();

    let uploaded = ctx
        .attachments()
        .store("scan.png", "image/png", b"not-really-a-png")
        .await
        .unwrap();
    assert!(uploaded.message_id.is_none());

    let message = messages
        .create_message(ctx.conversation_id, ctx.patient_id, "see attached")
        .await
        .unwrap();

    // One real id, two that do not exist anywhere.
    messages
        .link_attachments(message.id, &[uploaded.id, 9998, 9999])
        .await
        .unwrap();

    let infos = messages.attachments_for(message.id).await.unwrap();
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].id, uploaded.id);
    assert_eq!(
        infos[0].url,
        format!(
            "http://localhost:7080/media/{}",
            sqlx::query_scalar::<_, String>("SELECT file_path FROM attachments WHERE id = ?")
                .bind(uploaded.id)
                .fetch_one(&ctx.pool)
                .await
                .unwrap()
        )
    );
}

#[tokio::test]
async fn linked_attachments_stay_with_their_first_message() {
    let ctx = TestContext::new().await;
    let messages = ctx.messages();

    let uploaded = ctx
        .attachments()
        .store("scan.png", "image/png", b"bytes")
        .await
        .unwrap();

    let first = messages
        .create_message(ctx.conversation_id, ctx.patient_id, "first")
        .await
        .unwrap();
    let second = messages
        .create_message(ctx.conversation_id, ctx.patient_id, "second")
        .await
        .unwrap();

    messages.link_attachments(first.id, &[uploaded.id]).await.unwrap();
    messages.link_attachments(second.id, &[uploaded.id]).await.unwrap();

    assert_eq!(messages.attachments_for(first.id).await.unwrap().len(), 1);
    assert!(messages.attachments_for(second.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn call_receiver_is_deduced_from_the_conversation() {
    let ctx = TestContext::new().await;

    let call = ctx
        .calls()
        .create(ctx.conversation_id, ctx.patient_id, CallType::Video)
        .await
        .unwrap();
    assert_eq!(call.caller_id, ctx.patient_id);
    assert_eq!(call.receiver_id, ctx.doctor_id);
    assert_eq!(call.call_status, CallStatus::Initiated);

    // The doctor calling deduces the patient as receiver.
    let reverse = ctx
        .calls()
        .create(ctx.conversation_id, ctx.doctor_id, CallType::Audio)
        .await
        .unwrap();
    assert_eq!(reverse.receiver_id, ctx.patient_id);

    let stranger = ctx
        .calls()
        .create(ctx.conversation_id, ctx.outsider_id, CallType::Video)
        .await;
    assert!(matches!(
        stranger,
        Err(ConversationError::PermissionDenied { .. })
    ));
}

#[tokio::test]
async fn call_status_only_moves_forward() {
    let ctx = TestContext::new().await;
    let calls = ctx.calls();

    let call = calls
        .create(ctx.conversation_id, ctx.patient_id, CallType::Video)
        .await
        .unwrap();

    let ongoing = calls
        .update_status(call.id, ctx.doctor_id, CallStatus::Ongoing)
        .await
        .unwrap();
    assert_eq!(ongoing.call_status, CallStatus::Ongoing);
    assert!(ongoing.end_time.is_none());

    let completed = calls
        .update_status(call.id, ctx.patient_id, CallStatus::Completed)
        .await
        .unwrap();
    assert_eq!(completed.call_status, CallStatus::Completed);
    assert!(completed.end_time.is_some(), "terminal status stamps end time");

    // Terminal means terminal: no way back to initiated or anywhere else.
    let reverted = calls
        .update_status(call.id, ctx.patient_id, CallStatus::Initiated)
        .await;
    assert!(matches!(
        reverted,
        Err(ConversationError::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn call_updates_require_a_party_to_the_call() {
    let ctx = TestContext::new().await;
    let calls = ctx.calls();

    let call = calls
        .create(ctx.conversation_id, ctx.patient_id, CallType::Audio)
        .await
        .unwrap();

    let result = calls
        .update_status(call.id, ctx.outsider_id, CallStatus::Completed)
        .await;
    assert!(matches!(
        result,
        Err(ConversationError::PermissionDenied { .. })
    ));

    // The record is unchanged by the rejected update.
    let reloaded = calls.get(call.id).await.unwrap();
    assert_eq!(reloaded.call_status, CallStatus::Initiated);
    assert!(reloaded.end_time.is_none());
}

#[tokio::test]
async fn history_merges_messages_and_calls_ascending() {
    let ctx = TestContext::new().await;

    ctx.messages()
        .create_message(ctx.conversation_id, ctx.patient_id, "before the call")
        .await
        .unwrap();
    ctx.calls()
        .create(ctx.conversation_id, ctx.patient_id, CallType::Video)
        .await
        .unwrap();
    ctx.messages()
        .create_message(ctx.conversation_id, ctx.doctor_id, "after the call")
        .await
        .unwrap();

    let history = ctx
        .conversations()
        .history(ctx.conversation_id, ctx.patient_id)
        .await
        .unwrap();
    assert_eq!(history.len(), 3);

    let mut previous = None;
    for item in &history {
        let key = item.timestamp_key();
        if let Some(prev) = previous {
            assert!(key >= prev, "history must ascend by timestamp");
        }
        previous = Some(key);
    }

    assert!(matches!(history[0], HistoryItem::Message { .. }));
    assert!(matches!(history[1], HistoryItem::Call { .. }));
    assert!(matches!(history[2], HistoryItem::Message { .. }));

    // Outsiders cannot read the history at all.
    let denied = ctx
        .conversations()
        .history(ctx.conversation_id, ctx.outsider_id)
        .await;
    assert!(matches!(
        denied,
        Err(ConversationError::PermissionDenied { .. })
    ));
}
