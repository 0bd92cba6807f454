use crate::error::{NewsError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use uuid::Uuid;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());
static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]{3,150}$").unwrap());

const MIN_PASSWORD_LEN: usize = 8;

/// Hash a password with a fresh random salt. Stored as `salt$hexdigest`.
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let digest = salted_digest(&salt, password);
    format!("{salt}${digest}")
}

fn salted_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b"$");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check a candidate password against a stored `salt$hexdigest` hash.
pub fn verify_password(stored: &str, candidate: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, digest)) => salted_digest(salt, candidate) == digest,
        None => false,
    }
}

/// Mint an opaque bearer token for a new session.
pub fn new_session_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Validate registration input before any account is created.
pub fn validate_registration(username: &str, email: &str, password: &str) -> Result<()> {
    if !USERNAME_RE.is_match(username) {
        return Err(NewsError::Validation(
            "username must be 3-150 characters of letters, digits, or _.-".to_string(),
        ));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(NewsError::Validation("invalid email address".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(NewsError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("correct horse battery");
        assert!(verify_password(&hash, "correct horse battery"));
        assert!(!verify_password(&hash, "wrong"));
    }

    #[test]
    fn hashes_are_salted() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }

    #[test]
    fn malformed_stored_hash_never_verifies() {
        assert!(!verify_password("not-a-hash", "anything"));
    }

    #[test]
    fn registration_validation() {
        assert!(validate_registration("alice", "a@example.com", "longenough").is_ok());
        assert!(validate_registration("al", "a@example.com", "longenough").is_err());
        assert!(validate_registration("alice", "not-an-email", "longenough").is_err());
        assert!(validate_registration("alice", "a@example.com", "short").is_err());
        assert!(validate_registration("bad name", "a@example.com", "longenough").is_err());
    }
}
