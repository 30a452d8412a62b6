// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password hashing and verification.
//!
//! Hashes are argon2id PHC strings with a per-password random salt. The
//! plaintext never leaves this module.
//!
//! Request handlers use [`spawn_hash`] and [`spawn_verify`], which run the
//! argon2 work on tokio's blocking pool.

use std::sync::OnceLock;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use ring::rand::{SecureRandom, SystemRandom};

use super::AuthError;

const SALT_LEN: usize = 16;

/// Hash a plaintext password into a PHC string.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let mut salt_bytes = [0u8; SALT_LEN];
    SystemRandom::new()
        .fill(&mut salt_bytes)
        .map_err(|_| AuthError::InternalError("OS random source unavailable".to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AuthError::InternalError(format!("salt encoding failed: {e}")))?;

    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::InternalError(format!("password hashing failed: {e}")))?
        .to_string();
    Ok(phc)
}

/// Verify a candidate password against a stored hash.
///
/// A stored value that does not parse as a PHC string fails verification.
pub fn verify_password(stored_hash: &str, candidate: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Burn the same work as a real verification when no account matched.
fn verify_against_dummy(candidate: &str) {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    if let Some(hash) = DUMMY.get_or_init(|| hash_password("rx-portal-dummy").ok()) {
        let _ = verify_password(hash, candidate);
    }
}

/// [`hash_password`] on the blocking pool.
pub async fn spawn_hash(password: &str) -> Result<String, AuthError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::InternalError(format!("password hashing task failed: {e}")))?
}

/// [`verify_password`] on the blocking pool. A failed task counts as a mismatch.
pub async fn spawn_verify(stored_hash: &str, candidate: &str) -> bool {
    let (stored_hash, candidate) = (stored_hash.to_string(), candidate.to_string());
    match tokio::task::spawn_blocking(move || verify_password(&stored_hash, &candidate)).await {
        Ok(matches) => matches,
        Err(e) => {
            tracing::error!(error = %e, "password verification task failed");
            false
        }
    }
}

/// [`verify_against_dummy`] on the blocking pool.
pub(crate) async fn spawn_verify_dummy(candidate: &str) {
    let candidate = candidate.to_string();
    if let Err(e) = tokio::task::spawn_blocking(move || verify_against_dummy(&candidate)).await {
        tracing::error!(error = %e, "dummy verification task failed");
    }
}
