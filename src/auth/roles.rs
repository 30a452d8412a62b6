// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles for authorization.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User roles for authorization.
///
/// Every user holds exactly one role. Unlike a privilege ladder there is no
/// implied ordering: a route that wants both staff and admins lists both.
///
/// - `Patient` - submits medicine requests and manages their patient records
/// - `Staff` - resolves and closes medicine requests
/// - `Admin` - operates the portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Staff,
    Admin,
}

impl Role {
    /// Canonical wire form. Role comparisons elsewhere are exact on this value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Staff => "staff",
            Role::Admin => "admin",
        }
    }

    /// Check membership in an accepted role set.
    pub fn is_one_of(&self, accepted: &[Role]) -> bool {
        accepted.contains(self)
    }
}

/// Unknown role name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    /// Exact, case-sensitive parse of the canonical form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patient" => Ok(Role::Patient),
            "staff" => Ok(Role::Staff),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_parses_canonical_names() {
        assert_eq!("patient".parse::<Role>(), Ok(Role::Patient));
        assert_eq!("staff".parse::<Role>(), Ok(Role::Staff));
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
    }

    #[test]
    fn from_str_is_case_sensitive() {
        assert!("Staff".parse::<Role>().is_err());
        assert!("ADMIN".parse::<Role>().is_err());
        assert!(" patient".parse::<Role>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for role in [Role::Patient, Role::Staff, Role::Admin] {
            assert_eq!(role.to_string().parse::<Role>(), Ok(role));
        }
    }

    #[test]
    fn serde_uses_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Staff).unwrap(), r#""staff""#);
        let role: Role = serde_json::from_str(r#""patient""#).unwrap();
        assert_eq!(role, Role::Patient);
        assert!(serde_json::from_str::<Role>(r#""Patient""#).is_err());
    }

    #[test]
    fn is_one_of_checks_membership() {
        assert!(Role::Staff.is_one_of(&[Role::Staff, Role::Admin]));
        assert!(!Role::Patient.is_one_of(&[Role::Staff, Role::Admin]));
        assert!(!Role::Admin.is_one_of(&[]));
    }
}
