// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for authenticated callers.
//!
//! Two surfaces, two credentials:
//!
//! - REST clients send `Authorization: Bearer <token>`. Use [`Auth`] or
//!   [`RequireRole`]; rejections are JSON [`AuthError`]s (401/403).
//! - Browsers carry the session cookie, resolved by the `tower-sessions`
//!   layer. Use [`CurrentSession`] or [`RequireSession`]; rejections are
//!   redirects ([`WebRejection`]).
//!
//! ```rust,ignore
//! async fn close_request(RequireRole(user, _): RequireRole<StaffOnly>) -> impl IntoResponse {
//!     // only staff get here
//! }
//! ```

use std::marker::PhantomData;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use super::{
    gate::{authorize, Decision, DenyReason, Policy, SignedIn},
    AuthError, Identity,
};
use crate::state::AppState;

/// Where browsers go when no session could be established.
pub const NOT_AUTHENTICATED_PATH: &str = "/user/error/not-authenticated";
/// Where browsers go when signed in with the wrong role.
pub const NOT_AUTHORISED_PATH: &str = "/user/error/not-authorised";

/// Extractor for bearer-authenticated API callers.
pub struct Auth(pub Identity);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // First check if a middleware already resolved the caller
        if let Some(identity) = parts.extensions.get::<Identity>().cloned() {
            return Ok(Auth(identity));
        }

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::InvalidAuthHeader)?;

        let identity = state.tokens.validate(token)?;
        parts.extensions.insert(identity.clone());
        Ok(Auth(identity))
    }
}

/// Bearer authentication that does not reject.
pub struct OptionalAuth(pub Option<Identity>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match Auth::from_request_parts(parts, state).await {
            Ok(Auth(identity)) => Ok(OptionalAuth(Some(identity))),
            Err(_) => Ok(OptionalAuth(None)),
        }
    }
}

/// Bearer authentication plus a policy check.
pub struct RequireRole<P: Policy>(pub Identity, pub PhantomData<P>);

impl<P: Policy> FromRequestParts<AppState> for RequireRole<P> {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(identity) = Auth::from_request_parts(parts, state).await?;

        match authorize(Some(&identity), &P::REQUIREMENT) {
            Decision::Allow => Ok(RequireRole(identity, PhantomData)),
            Decision::Deny(DenyReason::Forbidden) => {
                tracing::debug!(user_id = identity.user_id, role = %identity.role, "api request forbidden");
                Err(AuthError::Forbidden)
            }
            Decision::Deny(DenyReason::Unauthenticated) => Err(AuthError::Unauthenticated),
        }
    }
}

/// The browser's session and the identity it carries, if any.
///
/// Only fails when the router has no session layer.
pub struct CurrentSession {
    pub identity: Option<Identity>,
    pub session: Session,
}

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        let identity = state.sessions.current_identity(&session).await;
        Ok(CurrentSession { identity, session })
    }
}

/// Web-surface denial: a redirect to the matching error page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebRejection {
    NotAuthenticated,
    NotAuthorised,
}

impl From<DenyReason> for WebRejection {
    fn from(reason: DenyReason) -> Self {
        match reason {
            DenyReason::Unauthenticated => WebRejection::NotAuthenticated,
            DenyReason::Forbidden => WebRejection::NotAuthorised,
        }
    }
}

impl IntoResponse for WebRejection {
    fn into_response(self) -> Response {
        let target = match self {
            WebRejection::NotAuthenticated => NOT_AUTHENTICATED_PATH,
            WebRejection::NotAuthorised => NOT_AUTHORISED_PATH,
        };
        Redirect::to(target).into_response()
    }
}

/// Session authentication plus a policy check. Defaults to any signed-in user.
pub struct RequireSession<P: Policy = SignedIn> {
    pub identity: Identity,
    pub session: Session,
    _policy: PhantomData<P>,
}

impl<P: Policy> FromRequestParts<AppState> for RequireSession<P> {
    type Rejection = WebRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let current = match CurrentSession::from_request_parts(parts, state).await {
            Ok(current) => current,
            Err((_, reason)) => {
                tracing::error!(reason, "session layer missing");
                return Err(WebRejection::NotAuthenticated);
            }
        };

        match (authorize(current.identity.as_ref(), &P::REQUIREMENT), current.identity) {
            (Decision::Allow, Some(identity)) => Ok(RequireSession {
                identity,
                session: current.session,
                _policy: PhantomData,
            }),
            (Decision::Deny(reason), _) => Err(reason.into()),
            (Decision::Allow, None) => Err(WebRejection::NotAuthenticated),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request;
    use chrono::Utc;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::auth::{
        gate::{AdminOnly, StaffOnly},
        Role,
    };
    use crate::config::{SessionSettings, TokenSettings};
    use crate::store::InMemoryUserStore;

    fn test_state() -> AppState {
        AppState::new(
            Arc::new(InMemoryUserStore::new()),
            &TokenSettings::with_secret("test-secret"),
            SessionSettings::default(),
        )
        .unwrap()
    }

    fn identity(role: Role) -> Identity {
        Identity {
            user_id: 9,
            name: "Sam".to_string(),
            email: "sam@example.com".to_string(),
            role,
        }
    }

    fn parts_with(header: Option<(&str, String)>) -> Parts {
        let mut builder = Request::builder().uri("/test");
        if let Some((name, value)) = header {
            builder = builder.header(name, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn auth_requires_header() {
        let state = test_state();
        let mut parts = parts_with(None);
        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));
    }

    #[tokio::test]
    async fn auth_rejects_non_bearer_scheme() {
        let state = test_state();
        let mut parts = parts_with(Some(("Authorization", "Basic abc".to_string())));
        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InvalidAuthHeader)));
    }

    #[tokio::test]
    async fn auth_accepts_issued_token() {
        let state = test_state();
        let token = state.tokens.issue(&identity(Role::Patient)).unwrap();
        let mut parts = parts_with(Some(("Authorization", format!("Bearer {token}"))));
        let Auth(who) = Auth::from_request_parts(&mut parts, &state).await.ok().unwrap();
        assert_eq!(who, identity(Role::Patient));
    }

    #[tokio::test]
    async fn auth_rejects_expired_token() {
        let state = test_state();
        let token = state
            .tokens
            .issue_at(&identity(Role::Patient), Utc::now() - chrono::Duration::days(30))
            .unwrap();
        let mut parts = parts_with(Some(("Authorization", format!("Bearer {token}"))));
        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[tokio::test]
    async fn auth_prefers_extensions() {
        let state = test_state();
        let mut parts = parts_with(None);
        parts.extensions.insert(identity(Role::Admin));
        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert_eq!(result.ok().map(|Auth(who)| who.role), Some(Role::Admin));
    }

    #[tokio::test]
    async fn require_role_forbids_wrong_role() {
        let state = test_state();
        let mut parts = parts_with(None);
        parts.extensions.insert(identity(Role::Patient));
        let result = RequireRole::<StaffOnly>::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::Forbidden)));
    }

    #[tokio::test]
    async fn require_role_admits_listed_role() {
        let state = test_state();
        let mut parts = parts_with(None);
        parts.extensions.insert(identity(Role::Staff));
        let result = RequireRole::<StaffOnly>::from_request_parts(&mut parts, &state).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn admin_policy_admits_only_admins() {
        let state = test_state();
        for (role, allowed) in [(Role::Admin, true), (Role::Staff, false), (Role::Patient, false)] {
            let token = state.tokens.issue(&identity(role)).unwrap();
            let mut parts = parts_with(Some(("Authorization", format!("Bearer {token}"))));
            let result = RequireRole::<AdminOnly>::from_request_parts(&mut parts, &state).await;
            assert_eq!(result.is_ok(), allowed, "{role}");
        }
    }

    #[tokio::test]
    async fn optional_auth_returns_none_without_token() {
        let state = test_state();
        let mut parts = parts_with(None);
        let OptionalAuth(who) = OptionalAuth::from_request_parts(&mut parts, &state).await.unwrap();
        assert!(who.is_none());
    }

    fn parts_with_session(session: &Session) -> Parts {
        let mut parts = parts_with(None);
        parts.extensions.insert(session.clone());
        parts
    }

    fn new_session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn require_session_redirects_without_sign_in() {
        let state = test_state();
        let mut parts = parts_with_session(&new_session());
        let result = RequireSession::<SignedIn>::from_request_parts(&mut parts, &state).await;
        assert_eq!(result.err(), Some(WebRejection::NotAuthenticated));
    }

    #[tokio::test]
    async fn missing_session_layer_fails_closed() {
        let state = test_state();
        let mut parts = parts_with(None);
        assert!(CurrentSession::from_request_parts(&mut parts, &state).await.is_err());
        let result = RequireSession::<SignedIn>::from_request_parts(&mut parts, &state).await;
        assert_eq!(result.err(), Some(WebRejection::NotAuthenticated));
    }

    #[tokio::test]
    async fn require_session_distinguishes_forbidden() {
        let state = test_state();
        let session = new_session();
        state.sessions.sign_in(&session, identity(Role::Patient)).await.unwrap();

        let mut parts = parts_with_session(&session);
        let signed_in = RequireSession::<SignedIn>::from_request_parts(&mut parts, &state).await;
        assert_eq!(signed_in.ok().map(|s| s.identity.role), Some(Role::Patient));

        let mut parts = parts_with_session(&session);
        let staff = RequireSession::<StaffOnly>::from_request_parts(&mut parts, &state).await;
        assert_eq!(staff.err(), Some(WebRejection::NotAuthorised));
    }

    #[tokio::test]
    async fn signed_out_session_is_unauthenticated() {
        let state = test_state();
        let session = new_session();
        state.sessions.sign_in(&session, identity(Role::Staff)).await.unwrap();
        state.sessions.sign_out(&session).await.unwrap();

        let mut parts = parts_with_session(&session);
        let current = CurrentSession::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(
            authorize(current.identity.as_ref(), &StaffOnly::REQUIREMENT),
            Decision::Deny(DenyReason::Unauthenticated)
        );
    }

    #[test]
    fn web_rejections_redirect_to_error_pages() {
        let response = WebRejection::NotAuthenticated.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], NOT_AUTHENTICATED_PATH);

        let response = WebRejection::NotAuthorised.into_response();
        assert_eq!(response.headers()["location"], NOT_AUTHORISED_PATH);
    }
}
