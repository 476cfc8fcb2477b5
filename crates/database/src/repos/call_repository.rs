//! Repository for call record data access operations.

use crate::entities::{Call, CallStatus, CallType};
use crate::types::DatabaseResult;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::info;

/// Repository for call database operations
pub struct CallRepository {
    pool: SqlitePool,
}

impl CallRepository {
    /// Create a new call repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new call record in `Initiated` status; the start time is
    /// stamped here.
    pub async fn create(
        &self,
        conversation_id: i64,
        caller_id: i64,
        receiver_id: i64,
        call_type: CallType,
    ) -> DatabaseResult<Call> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO calls (conversation_id, caller_id, receiver_id, call_type, call_status, start_time)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(conversation_id)
        .bind(caller_id)
        .bind(receiver_id)
        .bind(call_type.as_str())
        .bind(CallStatus::Initiated.as_str())
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let call_id = result.last_insert_rowid();

        info!(
            call_id = call_id,
            conversation_id = conversation_id,
            caller_id = caller_id,
            receiver_id = receiver_id,
            call_type = %call_type,
            "created new call"
        );

        Ok(Call {
            id: call_id,
            conversation_id,
            caller_id,
            receiver_id,
            call_type,
            call_status: CallStatus::Initiated,
            start_time: now,
            end_time: None,
        })
    }

    /// Find a call by id
    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Call>> {
        let row = sqlx::query(
            "SELECT id, conversation_id, caller_id, receiver_id, call_type, call_status, start_time, end_time
             FROM calls WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| call_from_row(&row))
            .transpose()
            .map_err(Into::into)
    }

    /// List all calls of a conversation in ascending start time order
    pub async fn list_by_conversation(&self, conversation_id: i64) -> DatabaseResult<Vec<Call>> {
        let rows = sqlx::query(
            "SELECT id, conversation_id, caller_id, receiver_id, call_type, call_status, start_time, end_time
             FROM calls WHERE conversation_id = ? ORDER BY start_time ASC, id ASC",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(call_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    /// Write a new status. When `stamp_end_time` is set the end time is
    /// recorded server-side at update time. Transition legality is checked
    /// by the caller against the loaded record.
    pub async fn update_status(
        &self,
        call_id: i64,
        status: CallStatus,
        stamp_end_time: bool,
    ) -> DatabaseResult<Option<Call>> {
        if stamp_end_time {
            let now = chrono::Utc::now().to_rfc3339();
            sqlx::query("UPDATE calls SET call_status = ?, end_time = ? WHERE id = ?")
                .bind(status.as_str())
                .bind(&now)
                .bind(call_id)
                .execute(&self.pool)
                .await?;
        } else {
            sqlx::query("UPDATE calls SET call_status = ? WHERE id = ?")
                .bind(status.as_str())
                .bind(call_id)
                .execute(&self.pool)
                .await?;
        }

        info!(call_id = call_id, status = %status, "updated call status");

        self.find_by_id(call_id).await
    }
}

fn call_from_row(row: &SqliteRow) -> Result<Call, sqlx::Error> {
    let call_type: String = row.try_get("call_type")?;
    let call_status: String = row.try_get("call_status")?;

    Ok(Call {
        id: row.try_get("id")?,
        conversation_id: row.try_get("conversation_id")?,
        caller_id: row.try_get("caller_id")?,
        receiver_id: row.try_get("receiver_id")?,
        call_type: CallType::from(call_type.as_str()),
        call_status: CallStatus::from(call_status.as_str()),
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{AccountType, CreateUserRequest};
    use crate::migrations::run_migrations;
    use crate::repos::{ConversationRepository, UserRepository};
    use tempfile::TempDir;

    async fn create_test_pool() -> (SqlitePool, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test_calls.db");
        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

        let pool = SqlitePool::connect(&db_url).await.unwrap();
        run_migrations(&pool).await.unwrap();
        (pool, temp_dir)
    }

    async fn seed_conversation(pool: &SqlitePool) -> (i64, i64, i64) {
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

        let conversation = ConversationRepository::new(pool.clone())
            .create(patient.id, doctor.id)
            .await
            .unwrap();
        (conversation.id, patient.id, doctor.id)
    }

    #[tokio::test]
    async fn test_create_starts_initiated() {
        let (pool, _temp_dir) = create_test_pool().await;
        let (conversation_id, caller_id, receiver_id) = seed_conversation(&pool).await;
        let repo = CallRepository::new(pool);

        let call = repo
            .create(conversation_id, caller_id, receiver_id, CallType::Audio)
            .await
            .unwrap();
        assert_eq!(call.call_status, CallStatus::Initiated);
        assert!(call.end_time.is_none());
    }

    #[tokio::test]
    async fn test_update_status_stamps_end_time() {
        let (pool, _temp_dir) = create_test_pool().await;
        let (conversation_id, caller_id, receiver_id) = seed_conversation(&pool).await;
        let repo = CallRepository::new(pool);

        let call = repo
            .create(conversation_id, caller_id, receiver_id, CallType::Video)
            .await
            .unwrap();

        let updated = repo
            .update_status(call.id, CallStatus::Completed, true)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.call_status, CallStatus::Completed);
        assert!(updated.end_time.is_some());
    }
}
