//! Repository for user and role-profile data access operations.

use crate::entities::{AccountType, CreateUserRequest, User};
use crate::types::DatabaseResult;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::info;

/// Repository for user database operations
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a user by id
    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, first_name, last_name, email, account_type, created_at, updated_at
             FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| user_from_row(&row)).transpose().map_err(Into::into)
    }

    /// Find a user by username
    pub async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, first_name, last_name, email, account_type, created_at, updated_at
             FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| user_from_row(&row)).transpose().map_err(Into::into)
    }

    /// Create a new user
    pub async fn create(&self, request: &CreateUserRequest) -> DatabaseResult<User> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO users (username, first_name, last_name, email, account_type, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&request.username)
        .bind(&request.first_name)
        .bind(&request.last_name)
        .bind(&request.email)
        .bind(request.account_type.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let user_id = result.last_insert_rowid();

        info!(
            user_id = user_id,
            username = %request.username,
            account_type = %request.account_type,
            "created new user"
        );

        Ok(User {
            id: user_id,
            username: request.username.clone(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            email: request.email.clone(),
            account_type: request.account_type,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Role-conditional avatar lookup: a patient's picture lives on the
    /// patient profile, a doctor's on the doctor profile. Admins have no
    /// profile row.
    pub async fn profile_pic_for(
        &self,
        user_id: i64,
        account_type: AccountType,
    ) -> DatabaseResult<Option<String>> {
        let query = match account_type {
            AccountType::Patient => "SELECT profile_pic FROM patient_profiles WHERE user_id = ?",
            AccountType::Doctor => "SELECT profile_pic FROM doctor_profiles WHERE user_id = ?",
            AccountType::Admin => return Ok(None),
        };

        let row = sqlx::query(query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(row.try_get("profile_pic")?),
            None => Ok(None),
        }
    }

    /// Create a patient profile row for a user
    pub async fn create_patient_profile(
        &self,
        user_id: i64,
        profile_pic: Option<&str>,
    ) -> DatabaseResult<i64> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO patient_profiles (user_id, profile_pic, created_at) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(profile_pic)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Create a doctor profile row for a user
    pub async fn create_doctor_profile(
        &self,
        user_id: i64,
        profile_pic: Option<&str>,
        speciality: Option<&str>,
    ) -> DatabaseResult<i64> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO doctor_profiles (user_id, profile_pic, speciality, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(profile_pic)
        .bind(speciality)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }
}

fn user_from_row(row: &SqliteRow) -> Result<User, sqlx::Error> {
    let account_type: String = row.try_get("account_type")?;

    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        account_type: AccountType::from(account_type.as_str()),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
