// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential checks against the user store.

use thiserror::Error;

use crate::store::{NewUser, StoreError, User, UserStore};

use super::{
    password::{spawn_hash, spawn_verify, spawn_verify_dummy},
    AuthError, Role,
};

/// Look up `email` and check `password`.
///
/// Unknown email, wrong password and a failing store all come back as
/// [`AuthError::InvalidCredentials`] so the caller cannot tell them apart.
pub async fn authenticate(
    store: &dyn UserStore,
    email: &str,
    password: &str,
) -> Result<User, AuthError> {
    let user = match store.get_user_by_email(email).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "user lookup failed during login");
            None
        }
    };

    match user {
        Some(user) if spawn_verify(&user.password_hash, password).await => Ok(user),
        Some(user) => {
            tracing::info!(user_id = user.id, "login rejected: wrong password");
            Err(AuthError::InvalidCredentials)
        }
        None => {
            spawn_verify_dummy(password).await;
            tracing::info!("login rejected: unknown account");
            Err(AuthError::InvalidCredentials)
        }
    }
}

/// Why a registration or profile change was refused.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AccountError {
    #[error("email address already in use")]
    DuplicateEmail,

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl From<StoreError> for AccountError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => AccountError::DuplicateEmail,
            other => AccountError::Auth(AuthError::InternalError(other.to_string())),
        }
    }
}

/// Hash the password and create the account.
pub async fn register(
    store: &dyn UserStore,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> Result<User, AccountError> {
    let password_hash = spawn_hash(password).await?;
    let user = store
        .create_user(NewUser {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            password_hash,
            role,
        })
        .await?;
    tracing::info!(user_id = user.id, role = %user.role, "account registered");
    Ok(user)
}

/// Replace the stored hash after checking the current password.
pub async fn change_password(
    store: &dyn UserStore,
    user: &User,
    current: &str,
    new_password: &str,
) -> Result<User, AccountError> {
    if !spawn_verify(&user.password_hash, current).await {
        return Err(AccountError::Auth(AuthError::InvalidCredentials));
    }
    let updated = User {
        password_hash: spawn_hash(new_password).await?,
        ..user.clone()
    };
    let saved = store.update_user(&updated).await?;
    tracing::info!(user_id = saved.id, "password changed");
    Ok(saved)
}

/// Create the bootstrap admin account unless the address is already taken.
pub async fn ensure_admin(
    store: &dyn UserStore,
    email: &str,
    password: &str,
) -> Result<User, AccountError> {
    match store.get_user_by_email(email).await? {
        Some(existing) => {
            if existing.role != Role::Admin {
                tracing::warn!(user_id = existing.id, role = %existing.role, "seed admin email belongs to a non-admin account");
            }
            Ok(existing)
        }
        None => register(store, "Administrator", email, password, Role::Admin).await,
    }
}
