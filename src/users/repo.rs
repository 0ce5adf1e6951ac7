use async_trait::async_trait;
use sqlx::PgPool;

use crate::users::{errors::StoreError, repo_types::Account};

/// Raw persistence for accounts. Implementations do no validation.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, account: &Account) -> Result<(), StoreError>;
    async fn by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;
    async fn by_remember_hash(&self, remember_hash: &str) -> Result<Option<Account>, StoreError>;
    /// Writes the profile and password hash of the row identified by
    /// `account.email`. Leaves `id`, `created_at` and `remember_hash` alone.
    async fn update(&self, account: &Account) -> Result<(), StoreError>;
    /// Replaces the session lookup key of the row identified by `email`.
    async fn update_remember_hash(&self, email: &str, remember_hash: &str)
        -> Result<(), StoreError>;
    async fn all(&self) -> Result<Vec<Account>, StoreError>;
}

/// Postgres-backed store. Expects a `users` table with a unique index on
/// `email` and an index on `remember_hash`.
#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_sqlx(e: sqlx::Error) -> StoreError {
    let unique = e
        .as_database_error()
        .map_or(false, |db| db.is_unique_violation());
    if unique {
        StoreError::Conflict
    } else {
        StoreError::Backend(e)
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, account: &Account) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, remember_hash,
                               title, summary, skills, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(account.id)
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.remember_hash)
        .bind(&account.title)
        .bind(&account.summary)
        .bind(&account.skills)
        .bind(account.created_at)
        .execute(&self.db)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, email, password_hash, remember_hash,
                   title, summary, skills, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(map_sqlx)?;
        Ok(account)
    }

    async fn by_remember_hash(&self, remember_hash: &str) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, email, password_hash, remember_hash,
                   title, summary, skills, created_at
            FROM users
            WHERE remember_hash = $1
            "#,
        )
        .bind(remember_hash)
        .fetch_optional(&self.db)
        .await
        .map_err(map_sqlx)?;
        Ok(account)
    }

    async fn update(&self, account: &Account) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = $2, password_hash = $3,
                title = $4, summary = $5, skills = $6
            WHERE email = $1
            "#,
        )
        .bind(&account.email)
        .bind(&account.name)
        .bind(&account.password_hash)
        .bind(&account.title)
        .bind(&account.summary)
        .bind(&account.skills)
        .execute(&self.db)
        .await
        .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn update_remember_hash(
        &self,
        email: &str,
        remember_hash: &str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(r#"UPDATE users SET remember_hash = $2 WHERE email = $1"#)
            .bind(email)
            .bind(remember_hash)
            .execute(&self.db)
            .await
            .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Account>, StoreError> {
        let rows = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, email, password_hash, remember_hash,
                   title, summary, skills, created_at
            FROM users
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .map_err(map_sqlx)?;
        Ok(rows)
    }
}
