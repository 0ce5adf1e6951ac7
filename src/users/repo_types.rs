use std::fmt;

use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Account record. `password` and `remember` only live in memory.
#[derive(Clone, Serialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[sqlx(skip)]
    #[serde(skip)]
    pub password: String, // plaintext, cleared once hashed
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 PHC string
    #[sqlx(skip)]
    #[serde(skip)]
    pub remember: String, // plaintext session token, handed to the caller
    #[serde(skip_serializing)]
    pub remember_hash: String, // HMAC of `remember`, the lookup key
    pub title: Option<String>,
    pub summary: Option<String>,
    pub skills: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Account {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            password: password.into(),
            password_hash: String::new(),
            remember: String::new(),
            remember_hash: String::new(),
            title: None,
            summary: None,
            skills: Vec::new(),
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

// Keeps credentials out of `{:?}` output and log fields.
impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("title", &self.title)
            .field("summary", &self.summary)
            .field("skills", &self.skills)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}
