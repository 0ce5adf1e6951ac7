//! Ordered validation and normalization steps run against an in-flight account
//! before anything touches storage. A chain stops at the first failing step.

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::users::{
    errors::UserError, password::PasswordHasher, repo::UserStore, repo_types::Account,
    signing::RememberSigner, token,
};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    RequireName,
    RequireEmail,
    RequirePassword,
    NormalizeEmail,
    EmailFormat,
    PasswordLength,
    EmailAvailable,
    HashPassword,
    RequirePasswordHash,
    GenerateRemember,
    SignRemember,
}

pub const CREATE: &[Step] = &[
    Step::RequireName,
    Step::RequireEmail,
    Step::RequirePassword,
    Step::PasswordLength,
    Step::NormalizeEmail,
    Step::EmailFormat,
    Step::EmailAvailable,
    Step::HashPassword,
    Step::RequirePasswordHash,
    Step::GenerateRemember,
    Step::SignRemember,
];

pub const UPDATE: &[Step] = &[
    Step::RequireName,
    Step::RequireEmail,
    Step::NormalizeEmail,
    Step::EmailFormat,
    Step::PasswordLength,
    Step::HashPassword,
    Step::RequirePasswordHash,
];

pub const AUTHENTICATE: &[Step] = &[Step::RequireEmail, Step::NormalizeEmail, Step::RequirePassword];

pub const LOOKUP_EMAIL: &[Step] = &[Step::RequireEmail, Step::NormalizeEmail];

pub const LOOKUP_REMEMBER: &[Step] = &[Step::SignRemember];

pub const ROTATE_REMEMBER: &[Step] = &[Step::GenerateRemember, Step::SignRemember];

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub struct Validator<S> {
    store: Arc<S>,
    hasher: PasswordHasher,
    signer: RememberSigner,
}

impl<S: UserStore> Validator<S> {
    pub fn new(store: Arc<S>, hasher: PasswordHasher, signer: RememberSigner) -> Self {
        Self {
            store,
            hasher,
            signer,
        }
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    pub async fn run(&self, account: &mut Account, steps: &[Step]) -> Result<(), UserError> {
        for step in steps {
            if let Err(e) = self.apply(*step, account).await {
                debug!(step = ?step, error = %e, "validation chain stopped");
                return Err(e);
            }
        }
        Ok(())
    }

    async fn apply(&self, step: Step, account: &mut Account) -> Result<(), UserError> {
        match step {
            Step::RequireName => {
                if account.name.trim().is_empty() {
                    return Err(UserError::NameMissing);
                }
            }
            Step::RequireEmail => {
                if account.email.trim().is_empty() {
                    return Err(UserError::EmailMissing);
                }
            }
            Step::RequirePassword => {
                if account.password.is_empty() {
                    return Err(UserError::PasswordMissing);
                }
            }
            Step::NormalizeEmail => {
                account.email = normalize_email(&account.email);
            }
            Step::EmailFormat => {
                if !is_valid_email(&account.email) {
                    return Err(UserError::EmailInvalid);
                }
            }
            Step::PasswordLength => {
                // no password means no password change
                if !account.password.is_empty()
                    && account.password.chars().count() < MIN_PASSWORD_LEN
                {
                    return Err(UserError::PasswordTooShort(MIN_PASSWORD_LEN));
                }
            }
            Step::EmailAvailable => {
                if self.store.by_email(&account.email).await?.is_some() {
                    return Err(UserError::EmailTaken);
                }
            }
            Step::HashPassword => {
                if !account.password.is_empty() {
                    account.password_hash = self.hasher.hash(&account.password)?;
                    account.password.clear();
                }
            }
            Step::RequirePasswordHash => {
                if account.password_hash.is_empty() {
                    return Err(UserError::PasswordHashMissing);
                }
            }
            Step::GenerateRemember => {
                account.remember = token::remember_token()?;
            }
            Step::SignRemember => {
                if account.remember.is_empty() {
                    return Err(UserError::RememberMissing);
                }
                account.remember_hash = self.signer.sign(&account.remember);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::memory::InMemoryUserStore;

    fn validator(store: Arc<InMemoryUserStore>) -> Validator<InMemoryUserStore> {
        Validator::new(
            store,
            PasswordHasher::new("test-pepper"),
            RememberSigner::new("test-key").unwrap(),
        )
    }

    #[test]
    fn email_regex_accepts_and_rejects() {
        assert!(is_valid_email("ada@x.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email("ada"));
        assert!(!is_valid_email("ada@x"));
        assert!(!is_valid_email("ada @x.com"));
    }

    #[test]
    fn normalize_lowercases_and_trims() {
        assert_eq!(normalize_email("  A@B.com "), "a@b.com");
        assert_eq!(normalize_email(&normalize_email(" X@Y.Z")), "x@y.z");
    }

    #[tokio::test]
    async fn chain_stops_at_first_failure() {
        let v = validator(Arc::new(InMemoryUserStore::new()));
        let mut account = Account::new("", "", "short");
        let err = v.run(&mut account, CREATE).await.unwrap_err();
        assert!(matches!(err, UserError::NameMissing));
        // later steps never ran
        assert_eq!(account.password, "short");
        assert!(account.password_hash.is_empty());
    }

    #[tokio::test]
    async fn short_password_rejected_before_hashing() {
        let v = validator(Arc::new(InMemoryUserStore::new()));
        let mut account = Account::new("Ada", "ada@x.com", "1234567");
        let err = v.run(&mut account, CREATE).await.unwrap_err();
        assert!(matches!(err, UserError::PasswordTooShort(8)));
        assert!(account.password_hash.is_empty());
    }

    #[tokio::test]
    async fn password_length_counts_characters() {
        let v = validator(Arc::new(InMemoryUserStore::new()));
        // 4 chars, 8 bytes
        let mut account = Account::new("Ada", "ada@x.com", "éééé");
        let err = v.run(&mut account, &[Step::PasswordLength]).await.unwrap_err();
        assert!(matches!(err, UserError::PasswordTooShort(_)));
    }

    #[tokio::test]
    async fn create_chain_produces_storable_record() {
        let v = validator(Arc::new(InMemoryUserStore::new()));
        let mut account = Account::new("Ada", "  Ada@X.com ", "longenough1");
        v.run(&mut account, CREATE).await.unwrap();

        assert_eq!(account.email, "ada@x.com");
        assert!(account.password.is_empty());
        assert!(v.hasher().compare(&account.password_hash, "longenough1"));
        assert!(!account.remember.is_empty());
        assert_eq!(
            account.remember_hash,
            RememberSigner::new("test-key").unwrap().sign(&account.remember)
        );
    }

    #[tokio::test]
    async fn create_chain_rejects_malformed_email() {
        let v = validator(Arc::new(InMemoryUserStore::new()));
        let mut account = Account::new("Ada", "not-an-email", "longenough1");
        let err = v.run(&mut account, CREATE).await.unwrap_err();
        assert!(matches!(err, UserError::EmailInvalid));
    }

    #[tokio::test]
    async fn update_chain_without_password_keeps_hash() {
        let v = validator(Arc::new(InMemoryUserStore::new()));
        let mut account = Account::new("Ada", "ada@x.com", "");
        account.password_hash = "existing-hash".into();
        v.run(&mut account, UPDATE).await.unwrap();
        assert_eq!(account.password_hash, "existing-hash");
        assert!(account.remember.is_empty());
    }

    #[tokio::test]
    async fn update_chain_requires_some_hash() {
        let v = validator(Arc::new(InMemoryUserStore::new()));
        let mut account = Account::new("Ada", "ada@x.com", "");
        let err = v.run(&mut account, UPDATE).await.unwrap_err();
        assert!(matches!(err, UserError::PasswordHashMissing));
        assert!(err.is_internal());
    }

    #[tokio::test]
    async fn sign_remember_requires_token() {
        let v = validator(Arc::new(InMemoryUserStore::new()));
        let mut account = Account::new("", "", "");
        let err = v.run(&mut account, LOOKUP_REMEMBER).await.unwrap_err();
        assert!(matches!(err, UserError::RememberMissing));
    }

    #[tokio::test]
    async fn rotation_issues_new_token() {
        let v = validator(Arc::new(InMemoryUserStore::new()));
        let mut account = Account::new("Ada", "ada@x.com", "");
        v.run(&mut account, ROTATE_REMEMBER).await.unwrap();
        let first = (account.remember.clone(), account.remember_hash.clone());
        v.run(&mut account, ROTATE_REMEMBER).await.unwrap();
        assert_ne!(first.0, account.remember);
        assert_ne!(first.1, account.remember_hash);
    }

    #[tokio::test]
    async fn email_available_sees_existing_account() {
        let store = Arc::new(InMemoryUserStore::new());
        let mut existing = Account::new("Ada", "ada@x.com", "");
        existing.password_hash = "hash".into();
        store.create(&existing).await.unwrap();

        let v = validator(store);
        let mut dup = Account::new("Other", "ada@x.com", "longenough1");
        let err = v.run(&mut dup, &[Step::EmailAvailable]).await.unwrap_err();
        assert!(matches!(err, UserError::EmailTaken));
    }
}
