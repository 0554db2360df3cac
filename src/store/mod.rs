use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryUserStore;
pub use postgres::PgUserStore;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub trial_start: OffsetDateTime,
    pub trial_end: OffsetDateTime,
    pub trial_active: bool,
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,
    pub reset_expires: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

/// Fields the service provides when creating a user; the store fills in
/// `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub trial_start: OffsetDateTime,
    pub trial_end: OffsetDateTime,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated")]
    UniqueViolation,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Credential store boundary. Postgres backs the binary; the in-memory
/// implementation backs the test suite.
///
/// `consume_reset_token` is the one conditional write: it must only apply
/// when the stored reset token digest still equals the presented one, so
/// that concurrent confirmations cannot both succeed.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn insert(&self, new: NewUser) -> Result<User, StoreError>;

    async fn set_reset_token(
        &self,
        id: Uuid,
        token_digest: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), StoreError>;

    /// Replace the password hash and clear the reset fields in a single
    /// guarded update. Returns false when the guard did not match (token
    /// already consumed or replaced).
    async fn consume_reset_token(
        &self,
        id: Uuid,
        token_digest: &str,
        new_password_hash: &str,
    ) -> Result<bool, StoreError>;

    async fn set_trial_active(&self, id: Uuid, active: bool) -> Result<(), StoreError>;
}
