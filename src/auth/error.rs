// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication and authorization error type.
///
/// The token variants are kept apart so callers and logs can tell them
/// apart, but they all render as the same generic 401 to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown email or wrong password
    InvalidCredentials,
    /// No authorization header present
    MissingAuthHeader,
    /// Invalid authorization header format
    InvalidAuthHeader,
    /// Token cannot be parsed
    TokenMalformed,
    /// Token signature does not match
    TokenInvalidSignature,
    /// Token is past its expiry
    TokenExpired,
    /// Token issuer does not match configuration
    TokenInvalidIssuer,
    /// Token audience does not match configuration
    TokenInvalidAudience,
    /// No (or no live) session
    Unauthenticated,
    /// Authenticated but the role is not accepted
    Forbidden,
    /// Internal error
    InternalError(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    message: String,
    error_code: String,
}

impl AuthError {
    /// Whether this error comes from decoding a bearer credential.
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            AuthError::MissingAuthHeader
                | AuthError::InvalidAuthHeader
                | AuthError::TokenMalformed
                | AuthError::TokenInvalidSignature
                | AuthError::TokenExpired
                | AuthError::TokenInvalidIssuer
                | AuthError::TokenInvalidAudience
        )
    }

    /// Error code sent to clients.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::Forbidden => "forbidden",
            AuthError::InternalError(_) => "internal_error",
            _ => "unauthorized",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials => StatusCode::BAD_REQUEST,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Message sent to clients. Never carries the internal reason.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "Email or Password is incorrect",
            AuthError::Forbidden => "Insufficient permissions for this operation",
            AuthError::InternalError(_) => "Internal authentication error",
            _ => "Unauthorized",
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid login credentials"),
            AuthError::MissingAuthHeader => write!(f, "Authorization header is required"),
            AuthError::InvalidAuthHeader => {
                write!(f, "Invalid authorization header format (expected 'Bearer <token>')")
            }
            AuthError::TokenMalformed => write!(f, "Token is malformed"),
            AuthError::TokenInvalidSignature => write!(f, "Token signature is invalid"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::TokenInvalidIssuer => write!(f, "Token issuer is invalid"),
            AuthError::TokenInvalidAudience => write!(f, "Token audience is invalid"),
            AuthError::Unauthenticated => write!(f, "No authenticated session"),
            AuthError::Forbidden => write!(f, "Insufficient permissions for this operation"),
            AuthError::InternalError(msg) => write!(f, "Internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::InternalError(ref reason) = self {
            tracing::error!(%reason, "authentication failed internally");
        }
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            message: self.public_message().to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
