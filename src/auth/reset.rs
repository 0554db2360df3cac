use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};
use time::Duration;

/// A pending reset is only honored for a short window.
pub const RESET_TOKEN_TTL: Duration = Duration::minutes(15);

const RESET_TOKEN_LEN: usize = 48;

/// Generate the one-time reset token handed to the caller. Only its
/// digest is ever stored.
pub fn generate_reset_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RESET_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// SHA-256 hex digest of a presented token. Deterministic, so the store
/// can match it in a guarded update.
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
