use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::{debug, error};

use crate::users::errors::UserError;

/// Argon2 hashing with an application-wide pepper appended to every password.
#[derive(Clone)]
pub struct PasswordHasher {
    pepper: String,
}

impl PasswordHasher {
    pub fn new(pepper: impl Into<String>) -> Self {
        Self {
            pepper: pepper.into(),
        }
    }

    fn peppered(&self, plain: &str) -> String {
        format!("{}{}", plain, self.pepper)
    }

    pub fn hash(&self, plain: &str) -> Result<String, UserError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(self.peppered(plain).as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                UserError::Hashing(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// Fails closed: a malformed digest compares as a mismatch.
    pub fn compare(&self, hash: &str, plain: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(e) => {
                debug!(error = %e, "stored password hash is not a valid PHC string");
                return false;
            }
        };
        Argon2::default()
            .verify_password(self.peppered(plain).as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_compare_roundtrip() {
        let hasher = PasswordHasher::new("pepper");
        let hash = hasher.hash("Secur3P@ssw0rd!").expect("hashing should succeed");
        assert!(hasher.compare(&hash, "Secur3P@ssw0rd!"));
    }

    #[test]
    fn compare_rejects_wrong_password() {
        let hasher = PasswordHasher::new("pepper");
        let hash = hasher.hash("correct-horse-battery-staple").expect("hashing should succeed");
        assert!(!hasher.compare(&hash, "wrong-password"));
    }

    #[test]
    fn compare_rejects_other_pepper() {
        let hash = PasswordHasher::new("pepper-a").hash("longenough1").unwrap();
        assert!(!PasswordHasher::new("pepper-b").compare(&hash, "longenough1"));
    }

    #[test]
    fn compare_fails_closed_on_malformed_hash() {
        let hasher = PasswordHasher::new("pepper");
        assert!(!hasher.compare("not-a-valid-hash", "anything"));
        assert!(!hasher.compare("", "anything"));
    }

    #[test]
    fn hashes_are_salted() {
        let hasher = PasswordHasher::new("pepper");
        let a = hasher.hash("longenough1").unwrap();
        let b = hasher.hash("longenough1").unwrap();
        assert_ne!(a, b);
        assert!(!a.contains("longenough1"));
    }
}
