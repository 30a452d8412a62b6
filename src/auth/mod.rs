// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Identity and access control for the portal.
//!
//! ## Auth Flow
//!
//! 1. A login request carries email and password
//! 2. [`service::authenticate`] checks them against the user store
//! 3. [`Identity::from_user`] turns the record into a request identity
//! 4. The identity is wrapped for transport:
//!    - web UI: [`SessionManager::sign_in`] sets a session cookie
//!    - API: [`TokenIssuer::issue`] returns an HS256 bearer token
//! 5. Later requests present the cookie or token; the extractors decode it
//!    back into an [`Identity`] and run [`gate::authorize`] before the handler
//!
//! ## Security
//!
//! - Passwords are argon2id hashed; verification fails closed
//! - Login failures never reveal whether the email exists
//! - Bearer tokens are stateless and valid for 7 days; there is no revocation
//!   list, rotating `JWT_SECRET` invalidates every outstanding token
//! - Session cookies are signed ids into a server-side `tower-sessions`
//!   store; sign-out flushes the session

pub mod claims;
pub mod error;
pub mod extractor;
pub mod gate;
pub mod password;
pub mod roles;
pub mod service;
pub mod session;
pub mod token;

pub use claims::Identity;
pub use error::AuthError;
pub use extractor::{Auth, CurrentSession, OptionalAuth, RequireRole, RequireSession, WebRejection};
pub use gate::{authorize, Decision, DenyReason, Operation, Policy, Requirement};
pub use roles::Role;
pub use session::SessionManager;
pub use token::TokenIssuer;
