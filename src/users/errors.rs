use thiserror::Error;

const INTERNAL_MESSAGE: &str = "Something went wrong, contact for help";
const CREDENTIALS_MESSAGE: &str = "Invalid email or password";

/// Failures reported by a `UserStore` implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record conflicts with an existing account")]
    Conflict,

    #[error("record not found")]
    NotFound,

    #[error("storage backend: {0}")]
    Backend(#[from] sqlx::Error),
}

/// Everything the account core can reject a request with.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("Please provide your name")]
    NameMissing,

    #[error("Please input your email")]
    EmailMissing,

    #[error("Please provide a valid email address")]
    EmailInvalid,

    #[error("This email is already in use")]
    EmailTaken,

    #[error("Please provide a password")]
    PasswordMissing,

    #[error("The password you provided is too short, minimum of {0} characters")]
    PasswordTooShort(usize),

    #[error("Remember token is missing")]
    RememberMissing,

    #[error("Invalid email and password combination")]
    InvalidCredentials,

    #[error("Incorrect password provided")]
    PasswordInvalid,

    #[error("Account not found")]
    NotFound,

    #[error("No password hash present after hashing")]
    PasswordHashMissing,

    #[error("Secure random source unavailable: {0}")]
    RandomSourceExhausted(#[source] rand::Error),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl UserError {
    /// Errors that indicate a bug or an infrastructure failure rather than bad input.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            UserError::PasswordHashMissing
                | UserError::RandomSourceExhausted(_)
                | UserError::Hashing(_)
                | UserError::Store(_)
        )
    }

    /// Text that is safe to show an end user.
    pub fn public_message(&self) -> String {
        match self {
            e if e.is_internal() => INTERNAL_MESSAGE.to_string(),
            UserError::InvalidCredentials | UserError::PasswordInvalid => {
                CREDENTIALS_MESSAGE.to_string()
            }
            e => e.to_string(),
        }
    }
}
