// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request identity and bearer token claims.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;
use crate::store::{User, UserId};

/// Who is making the request.
///
/// Derived from a [`User`] at sign-in and reconstructed on every request from
/// the session cookie or the bearer token. Carries no secret material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Identity {
    #[schema(value_type = u64)]
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl Identity {
    /// Build the identity for an authenticated user record.
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }

    pub fn has_role(&self, accepted: &[Role]) -> bool {
        self.role.is_one_of(accepted)
    }
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Identity::from_user(user)
    }
}

/// Claim set embedded in a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: decimal user id
    pub sub: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiry (Unix seconds)
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

impl TokenClaims {
    /// Recover the identity snapshot. `None` if the subject is not a user id.
    pub fn identity(&self) -> Option<Identity> {
        let user_id = self.sub.parse::<UserId>().ok()?;
        Some(Identity {
            user_id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 7,
            name: "Dana".to_string(),
            email: "dana@example.com".to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            role: Role::Staff,
        }
    }

    #[test]
    fn from_user_copies_public_fields() {
        let identity = Identity::from_user(&sample_user());
        assert_eq!(identity.user_id, 7);
        assert_eq!(identity.name, "Dana");
        assert_eq!(identity.email, "dana@example.com");
        assert_eq!(identity.role, Role::Staff);
    }

    #[test]
    fn serialized_identity_has_no_hash() {
        let json = serde_json::to_value(Identity::from_user(&sample_user())).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 4);
        assert!(!json.to_string().contains("argon2"));
        assert_eq!(json["role"], "staff");
    }

    #[test]
    fn claims_identity_parses_subject() {
        let claims = TokenClaims {
            sub: "7".to_string(),
            name: "Dana".to_string(),
            email: "dana@example.com".to_string(),
            role: Role::Staff,
            iat: 0,
            exp: 0,
            iss: None,
            aud: None,
        };
        assert_eq!(claims.identity(), Some(Identity::from_user(&sample_user())));

        let bad = TokenClaims {
            sub: "user_7".to_string(),
            ..claims
        };
        assert_eq!(bad.identity(), None);
    }
}
