//! User repository
//!
//! Direct database access for the accounts table. Constructed once with the
//! pool and handed to handlers through application state.

use crate::auth::Role;
use crate::error::AppError;
use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use serde::Serialize;
use tokio_postgres::Row;

/// User record from the database. The password hash never serializes.
#[derive(Clone, Debug, Serialize)]
pub struct UserRecord {
    pub id: i32,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    fn from_row(row: &Row) -> Result<Self, AppError> {
        let role: String = row.get("role");
        Ok(Self {
            id: row.get("id"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            role: role
                .parse()
                .map_err(|_| AppError::Internal(format!("Unknown role in database: {}", role)))?,
            created_at: row.get("created_at"),
        })
    }
}

/// User repository backed by the shared pool
#[derive(Clone)]
pub struct UserRepository {
    pool: Pool,
}

impl UserRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new user; a racing duplicate email surfaces as a unique
    /// violation and maps to 409 in the error layer.
    pub async fn create(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<UserRecord, AppError> {
        let client = self.pool.get().await?;

        let row = client
            .query_one(
                "INSERT INTO users (email, password_hash, role)
                 VALUES ($1, $2, $3)
                 RETURNING id, email, password_hash, role, created_at",
                &[&email, &password_hash, &role.as_str()],
            )
            .await?;

        UserRecord::from_row(&row)
    }

    /// Find user by email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        let client = self.pool.get().await?;

        let row = client
            .query_opt(
                "SELECT id, email, password_hash, role, created_at
                 FROM users WHERE email = $1",
                &[&email],
            )
            .await?;

        row.as_ref().map(UserRecord::from_row).transpose()
    }

    /// Find user by ID
    pub async fn find_by_id(&self, id: i32) -> Result<Option<UserRecord>, AppError> {
        let client = self.pool.get().await?;

        let row = client
            .query_opt(
                "SELECT id, email, password_hash, role, created_at
                 FROM users WHERE id = $1",
                &[&id],
            )
            .await?;

        row.as_ref().map(UserRecord::from_row).transpose()
    }
}
