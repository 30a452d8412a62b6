// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token issuance and validation.
//!
//! Tokens are HS256 JWTs carrying an [`Identity`] snapshot and an expiry.
//! They are stateless: nothing is recorded at issuance, so a token stays
//! valid until it expires or the secret is rotated.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};

use super::{claims::TokenClaims, AuthError, Identity};
use crate::config::{ConfigError, TokenSettings};

/// Signs and verifies bearer tokens with the process-wide secret.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: Option<String>,
    audience: Option<String>,
    lifetime: Duration,
}

impl TokenIssuer {
    /// Create an issuer. An empty secret is refused.
    pub fn new(settings: &TokenSettings) -> Result<Self, ConfigError> {
        if settings.secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        let secret = settings.secret.as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(ref issuer) = settings.issuer {
            validation.set_issuer(&[issuer]);
        }
        match settings.audience {
            Some(ref audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            issuer: settings.issuer.clone(),
            audience: settings.audience.clone(),
            lifetime: settings.lifetime,
        })
    }

    /// Expiry of a token issued at `issued_at`.
    pub fn expires_at(&self, issued_at: DateTime<Utc>) -> Result<DateTime<Utc>, AuthError> {
        issued_at
            .checked_add_signed(self.lifetime)
            .ok_or_else(|| AuthError::InternalError("token expiry out of range".to_string()))
    }

    /// Issue a token for `identity`, valid from now.
    pub fn issue(&self, identity: &Identity) -> Result<String, AuthError> {
        self.issue_at(identity, Utc::now())
    }

    /// Issue a token as if at `issued_at`.
    pub fn issue_at(&self, identity: &Identity, issued_at: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = TokenClaims {
            sub: identity.user_id.to_string(),
            name: identity.name.clone(),
            email: identity.email.clone(),
            role: identity.role,
            iat: issued_at.timestamp(),
            exp: self.expires_at(issued_at)?.timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InternalError(format!("token signing failed: {e}")))
    }

    /// Verify signature and expiry, returning the embedded identity.
    pub fn validate(&self, token: &str) -> Result<Identity, AuthError> {
        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            let mapped = match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::TokenInvalidSignature,
                ErrorKind::InvalidIssuer => AuthError::TokenInvalidIssuer,
                ErrorKind::InvalidAudience => AuthError::TokenInvalidAudience,
                _ => AuthError::TokenMalformed,
            };
            tracing::debug!(reason = %e, "bearer token rejected");
            mapped
        })?;

        data.claims.identity().ok_or(AuthError::TokenMalformed)
    }
}
