// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cookie sessions for the web UI, on top of `tower-sessions`.
//!
//! ## Credential format
//!
//! The cookie carries a random session id, signed with a key derived from
//! `JWT_SECRET`. The identity stays server-side in the session store, so
//! signing out really ends the session.
//!
//! ## Expiry
//!
//! Sliding idle timeout: the store record and cookie are re-extended on every
//! request ([`Expiry::OnInactivity`] with always-save). On top of that, an
//! absolute lifetime counted from sign-in is checked here. A cookie that is
//! absent, tampered with, unknown or expired resolves to "no session".

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use tower_sessions::{
    cookie::{Key, SameSite},
    service::SignedCookie,
    Expiry, MemoryStore, Session, SessionManagerLayer,
};

use super::{AuthError, Identity};
use crate::config::{ConfigError, SessionSettings};

type HmacSha512 = Hmac<Sha512>;

/// Session data key for the signed-in identity.
const SIGNED_IN_KEY: &str = "signed_in";

/// Domain-separation label for deriving the cookie key from the shared secret.
const COOKIE_KEY_LABEL: &[u8] = b"rx-portal/session-cookie/v2";

/// What a signed-in session holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SignedInSession {
    identity: Identity,
    signed_in_at: DateTime<Utc>,
}

/// Issues, resolves and ends cookie sessions.
#[derive(Clone)]
pub struct SessionManager {
    store: MemoryStore,
    key: Key,
    settings: SessionSettings,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(secret: &str, settings: SessionSettings) -> Result<Self, ConfigError> {
        if secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        let mut mac = HmacSha512::new_from_slice(secret.as_bytes())
            .map_err(|_| ConfigError::MissingSecret)?;
        mac.update(COOKIE_KEY_LABEL);
        let derived = mac.finalize().into_bytes();
        let key = Key::try_from(derived.as_slice()).map_err(|_| ConfigError::MissingSecret)?;

        Ok(Self {
            store: MemoryStore::default(),
            key,
            settings,
        })
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Session layer for the router. Every clone shares one store.
    pub fn layer(&self) -> SessionManagerLayer<MemoryStore, SignedCookie> {
        SessionManagerLayer::new(self.store.clone())
            .with_name(self.settings.cookie_name.clone())
            .with_path("/")
            .with_http_only(true)
            .with_same_site(SameSite::Lax)
            .with_secure(self.settings.secure_cookie)
            .with_expiry(self.expiry())
            .with_always_save(true)
            .with_signed(self.key.clone())
    }

    /// Idle expiry applied by the session layer.
    pub fn expiry(&self) -> Expiry {
        let idle = time::Duration::seconds(self.settings.idle_timeout.num_seconds());
        Expiry::OnInactivity(idle)
    }

    /// Start a session for `identity`. The session id is rotated so a
    /// pre-login id never carries over.
    pub async fn sign_in(&self, session: &Session, identity: Identity) -> Result<(), AuthError> {
        self.sign_in_at(session, identity, Utc::now()).await
    }

    pub async fn sign_in_at(
        &self,
        session: &Session,
        identity: Identity,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        session.cycle_id().await.map_err(session_error)?;
        tracing::info!(user_id = identity.user_id, role = %identity.role, "session started");
        session
            .insert(
                SIGNED_IN_KEY,
                SignedInSession {
                    identity,
                    signed_in_at: now,
                },
            )
            .await
            .map_err(session_error)
    }

    /// End the session: data and store record are deleted, the cookie is
    /// cleared on the response.
    pub async fn sign_out(&self, session: &Session) -> Result<(), AuthError> {
        session.flush().await.map_err(session_error)
    }

    /// Identity behind `session`, or `None` if there is none or it outlived
    /// the absolute lifetime.
    pub async fn current_identity(&self, session: &Session) -> Option<Identity> {
        self.current_identity_at(session, Utc::now()).await
    }

    pub async fn current_identity_at(
        &self,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Option<Identity> {
        let signed_in = match session.get::<SignedInSession>(SIGNED_IN_KEY).await {
            Ok(signed_in) => signed_in?,
            Err(e) => {
                tracing::warn!(error = %e, "session lookup failed");
                return None;
            }
        };

        if now - signed_in.signed_in_at >= self.settings.max_lifetime {
            tracing::debug!(user_id = signed_in.identity.user_id, "session reached absolute lifetime");
            if let Err(e) = session.flush().await {
                tracing::warn!(error = %e, "failed to end expired session");
            }
            return None;
        }
        Some(signed_in.identity)
    }
}

fn session_error(e: tower_sessions::session::Error) -> AuthError {
    AuthError::InternalError(format!("session store: {e}"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use super::*;
    use crate::auth::Role;

    fn identity() -> Identity {
        Identity {
            user_id: 7,
            name: "Alice".to_string(),
            email: "a@b.com".to_string(),
            role: Role::Patient,
        }
    }

    fn manager() -> SessionManager {
        SessionManager::new("test-secret", SessionSettings::default()).unwrap()
    }

    fn session(manager: &SessionManager) -> Session {
        Session::new(None, Arc::new(manager.store.clone()), Some(manager.expiry()))
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(matches!(
            SessionManager::new("", SessionSettings::default()),
            Err(ConfigError::MissingSecret)
        ));
    }

    #[tokio::test]
    async fn sign_in_then_resolve() {
        let manager = manager();
        let session = session(&manager);
        manager.sign_in(&session, identity()).await.unwrap();
        assert_eq!(manager.current_identity(&session).await, Some(identity()));
    }

    #[tokio::test]
    async fn fresh_session_has_no_identity() {
        let manager = manager();
        assert_eq!(manager.current_identity(&session(&manager)).await, None);
    }

    #[tokio::test]
    async fn sign_out_ends_session() {
        let manager = manager();
        let session = session(&manager);
        manager.sign_in(&session, identity()).await.unwrap();
        manager.sign_out(&session).await.unwrap();
        assert_eq!(manager.current_identity(&session).await, None);
        assert!(session.is_empty().await);
    }

    #[tokio::test]
    async fn sign_in_replaces_previous_identity() {
        let manager = manager();
        let session = session(&manager);
        manager.sign_in(&session, identity()).await.unwrap();

        let staff = Identity {
            role: Role::Staff,
            ..identity()
        };
        manager.sign_in(&session, staff.clone()).await.unwrap();
        assert_eq!(manager.current_identity(&session).await, Some(staff));
    }

    #[tokio::test]
    async fn absolute_lifetime_caps_session() {
        let manager = manager();
        let max = manager.settings().max_lifetime;
        let session = session(&manager);
        let start = Utc::now();
        manager.sign_in_at(&session, identity(), start).await.unwrap();

        let almost = start + max - Duration::seconds(1);
        assert!(manager.current_identity_at(&session, almost).await.is_some());
        assert_eq!(manager.current_identity_at(&session, start + max).await, None);
        // Once past the cap the session is gone for good.
        assert_eq!(manager.current_identity_at(&session, almost).await, None);
    }

    #[test]
    fn expiry_follows_idle_timeout() {
        let settings = SessionSettings {
            idle_timeout: Duration::minutes(5),
            ..SessionSettings::default()
        };
        let manager = SessionManager::new("s", settings).unwrap();
        assert!(matches!(
            manager.expiry(),
            Expiry::OnInactivity(idle) if idle == time::Duration::minutes(5)
        ));
    }

    #[test]
    fn debug_hides_key() {
        let rendered = format!("{:?}", manager());
        assert!(rendered.contains("SessionManager"));
        assert!(!rendered.contains("key"));
    }
}
