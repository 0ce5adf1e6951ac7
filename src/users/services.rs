use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::config::AuthConfig;
use crate::users::{
    dto::{LoginRequest, SignupRequest},
    errors::{StoreError, UserError},
    password::PasswordHasher,
    repo::UserStore,
    repo_types::Account,
    signing::RememberSigner,
    validation::{self, Validator},
};

/// Account operations: every write is validated first, then handed to the store.
pub struct UserService<S: UserStore> {
    store: Arc<S>,
    validator: Validator<S>,
}

impl<S: UserStore> UserService<S> {
    pub fn new(store: Arc<S>, auth: &AuthConfig) -> anyhow::Result<Self> {
        let validator = Validator::new(
            store.clone(),
            PasswordHasher::new(auth.pepper.clone()),
            RememberSigner::new(&auth.hmac_key)?,
        );
        Ok(Self { store, validator })
    }

    /// Validates and stores a new account. The returned record carries the
    /// plaintext remember token for the caller's session.
    #[instrument(skip(self, signup))]
    pub async fn create(&self, signup: SignupRequest) -> Result<Account, UserError> {
        let mut account = Account::new(signup.name, signup.email, signup.password);
        self.validator.run(&mut account, validation::CREATE).await?;

        match self.store.create(&account).await {
            Ok(()) => {}
            // another signup won the race after the advisory check
            Err(StoreError::Conflict) => {
                warn!(email = %account.email, "email already registered");
                return Err(UserError::EmailTaken);
            }
            Err(e) => {
                error!(error = %e, "create account failed");
                return Err(e.into());
            }
        }

        info!(user_id = %account.id, email = %account.email, "account created");
        Ok(account)
    }

    /// Re-validates and stores an existing account, identified by its email.
    /// The password hash only changes when `account.password` is set. Identity
    /// and session fields always come from the stored row.
    #[instrument(skip(self, account), fields(email = %account.email))]
    pub async fn update(&self, mut account: Account) -> Result<Account, UserError> {
        self.validator.run(&mut account, validation::UPDATE).await?;

        let stored = self
            .store
            .by_email(&account.email)
            .await?
            .ok_or(UserError::NotFound)?;
        account.id = stored.id;
        account.created_at = stored.created_at;
        account.remember_hash = stored.remember_hash;
        account.remember.clear();

        self.store.update(&account).await.map_err(|e| match e {
            StoreError::NotFound => UserError::NotFound,
            e => {
                error!(error = %e, "update account failed");
                e.into()
            }
        })?;

        info!(user_id = %account.id, "account updated");
        Ok(account)
    }

    #[instrument(skip(self))]
    pub async fn by_email(&self, email: &str) -> Result<Account, UserError> {
        let mut lookup = Account::new("", email, "");
        self.validator.run(&mut lookup, validation::LOOKUP_EMAIL).await?;

        self.store
            .by_email(&lookup.email)
            .await?
            .ok_or(UserError::NotFound)
    }

    /// Looks an account up by the signature of a presented remember token.
    #[instrument(skip(self, token))]
    pub async fn by_remember(&self, token: &str) -> Result<Account, UserError> {
        let mut lookup = Account::new("", "", "");
        lookup.remember = token.to_string();
        self.validator.run(&mut lookup, validation::LOOKUP_REMEMBER).await?;

        self.store
            .by_remember_hash(&lookup.remember_hash)
            .await?
            .ok_or(UserError::NotFound)
    }

    /// Checks an email/password pair. On success the remember token is rotated
    /// and the new plaintext token is returned on the record.
    #[instrument(skip(self, login))]
    pub async fn authenticate(&self, login: LoginRequest) -> Result<Account, UserError> {
        let mut candidate = Account::new("", login.email, login.password);
        self.validator
            .run(&mut candidate, validation::AUTHENTICATE)
            .await?;

        let Some(mut account) = self.store.by_email(&candidate.email).await? else {
            warn!(email = %candidate.email, "login unknown email");
            return Err(UserError::InvalidCredentials);
        };

        if !self
            .validator
            .hasher()
            .compare(&account.password_hash, &candidate.password)
        {
            warn!(user_id = %account.id, "login invalid password");
            return Err(UserError::PasswordInvalid);
        }

        self.validator
            .run(&mut account, validation::ROTATE_REMEMBER)
            .await?;
        self.store
            .update_remember_hash(&account.email, &account.remember_hash)
            .await
            .map_err(|e| {
                error!(error = %e, user_id = %account.id, "persist rotated remember token failed");
                UserError::from(e)
            })?;

        info!(user_id = %account.id, "user logged in");
        Ok(account)
    }

    /// Every stored account. Callers are responsible for access control.
    pub async fn all(&self) -> Result<Vec<Account>, UserError> {
        Ok(self.store.all().await?)
    }
}
