//! In-memory account store for tests and local development.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::users::{errors::StoreError, repo::UserStore, repo_types::Account};

#[derive(Default)]
struct Tables {
    by_email: HashMap<String, Account>,
    /// remember_hash -> email
    remember_index: HashMap<String, String>,
}

/// Keeps accounts keyed by email and enforces email uniqueness like the
/// Postgres unique index does.
#[derive(Default)]
pub struct InMemoryUserStore {
    tables: RwLock<Tables>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn reindex(tables: &mut Tables, old_hash: Option<&str>, account: &Account) {
    if let Some(old) = old_hash {
        tables.remember_index.remove(old);
    }
    if !account.remember_hash.is_empty() {
        tables
            .remember_index
            .insert(account.remember_hash.clone(), account.email.clone());
    }
}

/// Rows as they come back from storage: no transient fields.
fn stored(account: &Account) -> Account {
    let mut row = account.clone();
    row.password.clear();
    row.remember.clear();
    row
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, account: &Account) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.by_email.contains_key(&account.email) {
            return Err(StoreError::Conflict);
        }
        reindex(&mut tables, None, account);
        tables.by_email.insert(account.email.clone(), stored(account));
        Ok(())
    }

    async fn by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.by_email.get(email).cloned())
    }

    async fn by_remember_hash(&self, remember_hash: &str) -> Result<Option<Account>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .remember_index
            .get(remember_hash)
            .and_then(|email| tables.by_email.get(email))
            .cloned())
    }

    async fn update(&self, account: &Account) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let row = tables
            .by_email
            .get_mut(&account.email)
            .ok_or(StoreError::NotFound)?;
        row.name = account.name.clone();
        row.password_hash = account.password_hash.clone();
        row.title = account.title.clone();
        row.summary = account.summary.clone();
        row.skills = account.skills.clone();
        Ok(())
    }

    async fn update_remember_hash(
        &self,
        email: &str,
        remember_hash: &str,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let row = tables.by_email.get_mut(email).ok_or(StoreError::NotFound)?;
        let old_hash = std::mem::replace(&mut row.remember_hash, remember_hash.to_string());
        let updated = row.clone();
        reindex(&mut tables, Some(&old_hash), &updated);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Account>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Account> = tables.by_email.values().cloned().collect();
        rows.sort_by_key(|a| a.created_at);
        Ok(rows)
    }
}
