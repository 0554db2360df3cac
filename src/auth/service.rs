use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{jwt::JwtKeys, password, reset, trial},
    error::AuthError,
    store::{NewUser, User, UserStore},
};

const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Argon2 is CPU-bound; run it on the blocking pool so a slow hash cannot
/// stall unrelated requests on the async runtime.
async fn hash_blocking(plain: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || password::hash_password(&plain))
        .await
        .map_err(|e| AuthError::Internal(anyhow::anyhow!(e)))?
        .map_err(AuthError::Internal)
}

async fn verify_blocking(plain: String, hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || password::verify_password(&plain, &hash))
        .await
        .map_err(|e| AuthError::Internal(anyhow::anyhow!(e)))?
        .map_err(AuthError::Internal)
}

/// Orchestrates registration, login, the password-reset flow and request
/// authentication over a [`UserStore`].
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    jwt: JwtKeys,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, jwt: JwtKeys) -> Self {
        Self { store, jwt }
    }

    /// Create a user with a hashed password and a fresh trial window.
    /// The unique-email constraint in the store is the source of truth
    /// for duplicates, so concurrent registrations cannot both win.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        now: OffsetDateTime,
    ) -> Result<User, AuthError> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            warn!(email = %email, "register invalid email");
            return Err(AuthError::InvalidEmail);
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        let password_hash = hash_blocking(password.to_string()).await?;
        let window = trial::start_window(now);
        let user = self
            .store
            .insert(NewUser {
                name: name.trim().to_string(),
                email,
                password_hash,
                trial_start: window.start,
                trial_end: window.end,
            })
            .await?;

        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(user)
    }

    /// Verify credentials and issue a session token. Unknown email and
    /// wrong password fail identically so callers cannot probe which
    /// accounts exist. The trial check runs only after the password is
    /// verified.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        now: OffsetDateTime,
    ) -> Result<(String, User), AuthError> {
        let email = normalize_email(email);
        let Some(user) = self.store.find_by_email(&email).await? else {
            warn!(email = %email, "login unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_blocking(password.to_string(), user.password_hash.clone()).await? {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        if !trial::is_active(user.trial_end, now) {
            if user.trial_active {
                // Persist the observed expiry before denying.
                self.store.set_trial_active(user.id, false).await?;
            }
            warn!(user_id = %user.id, "login after trial expiry");
            return Err(AuthError::TrialExpired);
        }

        let token = self.jwt.sign_session(user.id).map_err(AuthError::Internal)?;
        info!(user_id = %user.id, "user logged in");
        Ok((token, user))
    }

    /// Start a password reset. Returns the one-time token; only its
    /// digest is stored. Delivery to the user is the caller's problem.
    pub async fn request_reset(
        &self,
        email: &str,
        now: OffsetDateTime,
    ) -> Result<String, AuthError> {
        let email = normalize_email(email);
        let Some(user) = self.store.find_by_email(&email).await? else {
            return Err(AuthError::NotFound);
        };

        let token = reset::generate_reset_token();
        let expires_at = now + reset::RESET_TOKEN_TTL;
        self.store
            .set_reset_token(user.id, &reset::token_digest(&token), expires_at)
            .await?;

        info!(user_id = %user.id, "password reset requested");
        Ok(token)
    }

    /// Consume a reset token and set the new password. The guarded store
    /// update makes the token single-use even under concurrent calls: the
    /// loser observes `NoPendingReset`. A wrong token leaves the pending
    /// reset intact for a retry within the window.
    pub async fn confirm_reset(
        &self,
        email: &str,
        token: &str,
        new_password: &str,
        now: OffsetDateTime,
    ) -> Result<(), AuthError> {
        let email = normalize_email(email);
        let Some(user) = self.store.find_by_email(&email).await? else {
            return Err(AuthError::NotFound);
        };
        let Some(stored_digest) = user.reset_token else {
            return Err(AuthError::NoPendingReset);
        };
        let Some(expires_at) = user.reset_expires else {
            return Err(AuthError::NoPendingReset);
        };
        if now > expires_at {
            warn!(user_id = %user.id, "reset token expired");
            return Err(AuthError::Expired);
        }
        let presented_digest = reset::token_digest(token);
        if presented_digest != stored_digest {
            warn!(user_id = %user.id, "reset token mismatch");
            return Err(AuthError::InvalidToken);
        }
        if new_password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        let new_hash = hash_blocking(new_password.to_string()).await?;
        let consumed = self
            .store
            .consume_reset_token(user.id, &presented_digest, &new_hash)
            .await?;
        if !consumed {
            return Err(AuthError::NoPendingReset);
        }

        info!(user_id = %user.id, "password reset confirmed");
        Ok(())
    }

    /// Validate a bearer token and yield the user it identifies.
    pub fn authenticate(&self, token: &str) -> Result<Uuid, AuthError> {
        Ok(self.jwt.verify(token)?.sub)
    }

    /// Load the user behind an already-authenticated id. A stale id (the
    /// user no longer exists) is an authorization failure, not a 404.
    pub async fn current_user(&self, id: Uuid) -> Result<User, AuthError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(AuthError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use crate::store::InMemoryUserStore;
    use time::{macros::datetime, Duration};

    fn service() -> AuthService {
        let jwt = JwtKeys::new(&JwtConfig {
            secret: "unit-test-secret".into(),
            issuer: "autoreport-test".into(),
            audience: "autoreport-test-users".into(),
            ttl_minutes: 5,
        });
        AuthService::new(Arc::new(InMemoryUserStore::new()), jwt)
    }

    fn t0() -> OffsetDateTime {
        datetime!(2024-05-01 08:00 UTC)
    }

    #[tokio::test]
    async fn register_sets_trial_window() {
        let svc = service();
        let user = svc.register("Ann", "ann@example.com", "hunter2hunter2", t0()).await.unwrap();
        assert_eq!(user.trial_start, t0());
        assert_eq!(user.trial_end, t0() + Duration::days(10));
        assert!(user.trial_active);
        assert_ne!(user.password_hash, "hunter2hunter2");
    }

    #[tokio::test]
    async fn register_duplicate_email_fails() {
        let svc = service();
        svc.register("A", "a@x.com", "password-one", t0()).await.unwrap();
        let err = svc.register("B", "a@x.com", "password-two", t0()).await.unwrap_err();
        assert!(matches!(err, AuthError::AlreadyExists));
    }

    #[tokio::test]
    async fn register_normalizes_email() {
        let svc = service();
        svc.register("A", "  Ann@Example.COM ", "password-one", t0()).await.unwrap();
        let (_, user) = svc.login("ann@example.com", "password-one", t0()).await.unwrap();
        assert_eq!(user.email, "ann@example.com");
    }

    #[tokio::test]
    async fn register_rejects_bad_input() {
        let svc = service();
        let err = svc.register("A", "not-an-email", "password-one", t0()).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidEmail));
        let err = svc.register("A", "a@x.com", "short", t0()).await.unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword));
    }

    #[tokio::test]
    async fn login_merges_unknown_email_and_bad_password() {
        let svc = service();
        svc.register("A", "a@x.com", "password-one", t0()).await.unwrap();

        let unknown = svc.login("b@x.com", "password-one", t0()).await.unwrap_err();
        let wrong = svc.login("a@x.com", "wrong-password", t0()).await.unwrap_err();
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert!(matches!(wrong, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_issues_token_bound_to_user() {
        let svc = service();
        let user = svc.register("A", "a@x.com", "password-one", t0()).await.unwrap();
        let (token, _) = svc.login("a@x.com", "password-one", t0()).await.unwrap();
        assert_eq!(svc.authenticate(&token).unwrap(), user.id);
    }

    #[tokio::test]
    async fn login_within_trial_succeeds_after_it_fails() {
        let svc = service();
        let user = svc.register("A", "a@x.com", "password-one", t0()).await.unwrap();

        assert!(svc.login("a@x.com", "password-one", t0() + Duration::days(9)).await.is_ok());

        let err = svc
            .login("a@x.com", "password-one", t0() + Duration::days(11))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TrialExpired));

        // The observed expiry is persisted, and a repeat denial is fine.
        let stored = svc.current_user(user.id).await.unwrap();
        assert!(!stored.trial_active);
        let err = svc
            .login("a@x.com", "password-one", t0() + Duration::days(12))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TrialExpired));
    }

    #[tokio::test]
    async fn expired_trial_is_not_revealed_to_wrong_password() {
        let svc = service();
        svc.register("A", "a@x.com", "password-one", t0()).await.unwrap();
        let err = svc
            .login("a@x.com", "wrong-password", t0() + Duration::days(11))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn request_reset_unknown_email_fails() {
        let svc = service();
        let err = svc.request_reset("ghost@x.com", t0()).await.unwrap_err();
        assert!(matches!(err, AuthError::NotFound));
    }

    #[tokio::test]
    async fn reset_roundtrip_changes_password_once() {
        let svc = service();
        svc.register("A", "a@x.com", "password-one", t0()).await.unwrap();

        let token = svc.request_reset("a@x.com", t0()).await.unwrap();
        svc.confirm_reset("a@x.com", &token, "password-two", t0() + Duration::minutes(5))
            .await
            .unwrap();

        assert!(svc.login("a@x.com", "password-two", t0()).await.is_ok());
        let err = svc.login("a@x.com", "password-one", t0()).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        // Token is single-use.
        let err = svc
            .confirm_reset("a@x.com", &token, "password-three", t0() + Duration::minutes(6))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NoPendingReset));
    }

    #[tokio::test]
    async fn confirm_reset_after_window_fails() {
        let svc = service();
        svc.register("A", "a@x.com", "password-one", t0()).await.unwrap();
        let token = svc.request_reset("a@x.com", t0()).await.unwrap();

        let err = svc
            .confirm_reset("a@x.com", &token, "password-two", t0() + Duration::minutes(16))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Expired));
    }

    #[tokio::test]
    async fn confirm_reset_wrong_token_leaves_pending_intact() {
        let svc = service();
        svc.register("A", "a@x.com", "password-one", t0()).await.unwrap();
        let token = svc.request_reset("a@x.com", t0()).await.unwrap();

        let err = svc
            .confirm_reset("a@x.com", "bogus-token", "password-two", t0() + Duration::minutes(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));

        // The real token still works within the window.
        svc.confirm_reset("a@x.com", &token, "password-two", t0() + Duration::minutes(2))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn confirm_reset_without_request_fails() {
        let svc = service();
        svc.register("A", "a@x.com", "password-one", t0()).await.unwrap();
        let err = svc
            .confirm_reset("a@x.com", "whatever", "password-two", t0())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NoPendingReset));
    }

    #[tokio::test]
    async fn concurrent_confirms_succeed_exactly_once() {
        let svc = service();
        svc.register("A", "a@x.com", "password-one", t0()).await.unwrap();
        let token = svc.request_reset("a@x.com", t0()).await.unwrap();

        let when = t0() + Duration::minutes(1);
        let (first, second) = tokio::join!(
            svc.confirm_reset("a@x.com", &token, "password-two", when),
            svc.confirm_reset("a@x.com", &token, "password-three", when),
        );

        let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        for result in [first, second] {
            if let Err(e) = result {
                assert!(matches!(e, AuthError::NoPendingReset | AuthError::InvalidToken));
            }
        }
    }

    #[tokio::test]
    async fn authenticate_rejects_garbage() {
        let svc = service();
        let err = svc.authenticate("garbage").unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }
}
