// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorization decisions.
//!
//! [`authorize`] is the single decision function: it maps an optional
//! identity and a [`Requirement`] to [`Decision::Allow`] or a
//! [`Decision::Deny`] that says *why*. It is pure and fails closed.

use serde::Serialize;
use utoipa::ToSchema;

use super::{Identity, Role};

/// What an operation demands of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// No check at all (login, registration)
    Anonymous,
    /// Any signed-in identity
    Authenticated,
    /// Signed in with one of these roles
    HasRole(&'static [Role]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No identity could be established; send the caller to log in.
    Unauthenticated,
    /// Signed in, but the role is not accepted.
    Forbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Decide whether `identity` satisfies `requirement`.
pub fn authorize(identity: Option<&Identity>, requirement: &Requirement) -> Decision {
    match (requirement, identity) {
        (Requirement::Anonymous, _) => Decision::Allow,
        (_, None) => Decision::Deny(DenyReason::Unauthenticated),
        (Requirement::Authenticated, Some(_)) => Decision::Allow,
        (Requirement::HasRole(accepted), Some(identity)) => {
            if identity.has_role(accepted) {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::Forbidden)
            }
        }
    }
}

/// A requirement named at the type level, for use as an extractor parameter.
pub trait Policy: Send + Sync + 'static {
    const REQUIREMENT: Requirement;
}

/// Any signed-in user.
pub struct SignedIn;
pub struct PatientOnly;
pub struct StaffOnly;
pub struct AdminOnly;
pub struct PatientOrStaff;

impl Policy for SignedIn {
    const REQUIREMENT: Requirement = Requirement::Authenticated;
}

impl Policy for PatientOnly {
    const REQUIREMENT: Requirement = Requirement::HasRole(&[Role::Patient]);
}

impl Policy for StaffOnly {
    const REQUIREMENT: Requirement = Requirement::HasRole(&[Role::Staff]);
}

impl Policy for AdminOnly {
    const REQUIREMENT: Requirement = Requirement::HasRole(&[Role::Admin]);
}

impl Policy for PatientOrStaff {
    const REQUIREMENT: Requirement = Requirement::HasRole(&[Role::Patient, Role::Staff]);
}

/// Portal operations and who may perform them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Login,
    Register,
    CheckEmail,
    ViewMedicines,
    ViewPatients,
    ManageProfile,
    CreateMedicineRequest,
    CloseMedicineRequest,
    CreatePatient,
    EditPatient,
    DeletePatient,
}

impl Operation {
    pub const ALL: [Operation; 11] = [
        Operation::Login,
        Operation::Register,
        Operation::CheckEmail,
        Operation::ViewMedicines,
        Operation::ViewPatients,
        Operation::ManageProfile,
        Operation::CreateMedicineRequest,
        Operation::CloseMedicineRequest,
        Operation::CreatePatient,
        Operation::EditPatient,
        Operation::DeletePatient,
    ];

    /// Operations `identity` is allowed to perform.
    pub fn permitted_for(identity: Option<&Identity>) -> Vec<Operation> {
        Operation::ALL
            .into_iter()
            .filter(|op| op.authorize(identity).is_allowed())
            .collect()
    }

    pub fn requirement(&self) -> Requirement {
        match self {
            Operation::Login | Operation::Register | Operation::CheckEmail => Requirement::Anonymous,
            Operation::ViewMedicines | Operation::ViewPatients | Operation::ManageProfile => {
                Requirement::Authenticated
            }
            Operation::CreateMedicineRequest | Operation::EditPatient | Operation::DeletePatient => {
                PatientOnly::REQUIREMENT
            }
            Operation::CloseMedicineRequest => StaffOnly::REQUIREMENT,
            Operation::CreatePatient => PatientOrStaff::REQUIREMENT,
        }
    }

    /// Decide whether `identity` may perform this operation.
    pub fn authorize(&self, identity: Option<&Identity>) -> Decision {
        authorize(identity, &self.requirement())
    }
}
