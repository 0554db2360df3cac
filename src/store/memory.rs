use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{NewUser, StoreError, User, UserStore};

/// In-memory credential store. Used by the test suite and handy for
/// running the service without Postgres.
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn insert(&self, new: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == new.email) {
            return Err(StoreError::UniqueViolation);
        }
        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            trial_start: new.trial_start,
            trial_end: new.trial_end,
            trial_active: true,
            reset_token: None,
            reset_expires: None,
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token_digest: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if let Some(user) = users.get_mut(&id) {
            user.reset_token = Some(token_digest.to_string());
            user.reset_expires = Some(expires_at);
        }
        Ok(())
    }

    async fn consume_reset_token(
        &self,
        id: Uuid,
        token_digest: &str,
        new_password_hash: &str,
    ) -> Result<bool, StoreError> {
        // Single write-lock critical section, so at most one caller can
        // observe the matching token.
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(&id) else {
            return Ok(false);
        };
        if user.reset_token.as_deref() != Some(token_digest) {
            return Ok(false);
        }
        user.password_hash = new_password_hash.to_string();
        user.reset_token = None;
        user.reset_expires = None;
        Ok(true)
    }

    async fn set_trial_active(&self, id: Uuid, active: bool) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if let Some(user) = users.get_mut(&id) {
            user.trial_active = active;
        }
        Ok(())
    }
}
