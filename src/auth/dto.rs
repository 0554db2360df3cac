use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::store::User;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for starting a password reset.
#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub email: String,
}

/// Request body for consuming a reset token.
#[derive(Debug, Deserialize)]
pub struct ResetConfirmRequest {
    pub email: String,
    pub token: String,
    pub new_password: String,
}

/// Public part of the user returned to the client. Never carries hashes
/// or reset material.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub trial_start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub trial_end: OffsetDateTime,
    pub trial_active: bool,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            trial_start: user.trial_start,
            trial_end: user.trial_end,
            trial_active: user.trial_active,
        }
    }
}

/// Response returned after login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Response to a reset request. The token goes back to the caller, which
/// owns out-of-band delivery.
#[derive(Debug, Serialize)]
pub struct ResetRequestedResponse {
    pub reset_token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
