// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User records and the persistence seam.
//!
//! The identity core only needs to look users up by id or email, create them
//! and update them. [`UserStore`] is that capability; [`InMemoryUserStore`]
//! is the implementation the server ships with.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use unicode_normalization::UnicodeNormalization;

use crate::auth::Role;

pub type UserId = u64;

/// Persisted user record.
///
/// The only type that carries the password hash. Not `Serialize`: responses
/// are built from [`crate::auth::Identity`] or the DTOs in [`crate::models`].
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Fields for a user that does not exist yet.
#[derive(Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("email address already in use")]
    DuplicateEmail,

    #[error("user not found: {0}")]
    NotFound(UserId),

    #[error("user store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Lookup key for an email address: trimmed, NFKC, lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().nfkc().collect::<String>().to_lowercase()
}

/// User persistence capability consumed by the auth core.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>>;

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Insert a user. Fails with [`StoreError::DuplicateEmail`] if the
    /// normalized email is taken; the check and the insert are atomic.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    /// Replace name, email, role and hash of an existing user.
    async fn update_user(&self, user: &User) -> StoreResult<User>;

    async fn health_check(&self) -> StoreResult<()>;
}

#[derive(Default)]
struct Tables {
    next_id: UserId,
    users: HashMap<UserId, User>,
    by_email: HashMap<String, UserId>,
}

/// Process-local user store.
///
/// A single write lock covers the uniqueness check and the insert, so two
/// concurrent registrations for one address cannot both succeed.
#[derive(Default)]
pub struct InMemoryUserStore {
    tables: RwLock<Tables>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_email
            .get(&normalize_email(email))
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let key = normalize_email(&user.email);
        let mut tables = self.tables.write().await;
        if tables.by_email.contains_key(&key) {
            return Err(StoreError::DuplicateEmail);
        }

        tables.next_id += 1;
        let record = User {
            id: tables.next_id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
        };
        tables.by_email.insert(key, record.id);
        tables.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_user(&self, user: &User) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        let previous_key = match tables.users.get(&user.id) {
            Some(existing) => normalize_email(&existing.email),
            None => return Err(StoreError::NotFound(user.id)),
        };

        let key = normalize_email(&user.email);
        if key != previous_key {
            if tables.by_email.contains_key(&key) {
                return Err(StoreError::DuplicateEmail);
            }
            tables.by_email.remove(&previous_key);
            tables.by_email.insert(key, user.id);
        }
        tables.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
