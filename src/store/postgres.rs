use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{NewUser, StoreError, User, UserStore};

const USER_COLUMNS: &str = "id, name, email, password_hash, trial_start, trial_end, \
                            trial_active, reset_token, reset_expires, created_at";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_insert_err(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return StoreError::UniqueViolation;
        }
    }
    StoreError::Database(e)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn insert(&self, new: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, trial_start, trial_end)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.trial_start)
        .bind(new.trial_end)
        .fetch_one(&self.db)
        .await
        .map_err(map_insert_err)?;
        Ok(user)
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token_digest: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET reset_token = $1, reset_expires = $2 WHERE id = $3")
            .bind(token_digest)
            .bind(expires_at)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn consume_reset_token(
        &self,
        id: Uuid,
        token_digest: &str,
        new_password_hash: &str,
    ) -> Result<bool, StoreError> {
        // The WHERE guard on reset_token makes this a compare-and-swap:
        // a second confirmation with the same token matches zero rows.
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $1, reset_token = NULL, reset_expires = NULL
            WHERE id = $2 AND reset_token = $3
            "#,
        )
        .bind(new_password_hash)
        .bind(id)
        .bind(token_digest)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn set_trial_active(&self, id: Uuid, active: bool) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET trial_active = $1 WHERE id = $2")
            .bind(active)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
