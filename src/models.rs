// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies for the web (form-encoded) and REST (JSON)
//! surfaces. None of the response types has a password or hash field; they
//! are built from [`Identity`] or explicitly from a [`User`]'s public fields.
//!
//! ## Model Categories
//!
//! - **Login**: credentials in, session cookie or bearer token out
//! - **Account forms**: registration, profile and password changes
//! - **Live validation**: email availability and current-password checks

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{Identity, Role};
use crate::store::{User, UserId};

pub const INVALID_LOGIN_MESSAGE: &str = "Invalid Login Credentials";
pub const EMAIL_TAKEN_MESSAGE: &str = "Email Address has already been used. Choose another";

// =============================================================================
// Login
// =============================================================================

/// Login credentials (form body on the web surface, JSON on the API).
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Successful API login: public user fields plus the bearer token.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    #[schema(value_type = u64)]
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl LoginResponse {
    pub fn new(user: &User, token: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            token,
            expires_at,
        }
    }
}

/// Public view of an account.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    #[schema(value_type = u64)]
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<Identity> for ProfileResponse {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.user_id,
            name: identity.name,
            email: identity.email,
            role: identity.role,
        }
    }
}

impl From<&User> for ProfileResponse {
    fn from(user: &User) -> Self {
        ProfileResponse::from(Identity::from_user(user))
    }
}

/// Landing page model.
#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub signed_in: Option<Identity>,
}

// =============================================================================
// Account forms
// =============================================================================

/// Field-level validation errors, keyed by form field.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct FormErrors {
    pub errors: BTreeMap<&'static str, Vec<String>>,
}

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_default().push(message.into());
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Login failure: both fields flagged, neither singled out.
    pub fn invalid_login() -> Self {
        let mut errors = Self::default();
        errors.add("email", INVALID_LOGIN_MESSAGE);
        errors.add("password", INVALID_LOGIN_MESSAGE);
        errors
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
    #[serde(default)]
    pub role: String,
}

impl RegisterForm {
    /// Check required fields and return the requested role.
    pub fn validate(&self) -> Result<Role, FormErrors> {
        let mut errors = FormErrors::default();
        require_name(&mut errors, &self.name);
        require_email(&mut errors, &self.email);
        require_new_password(&mut errors, &self.password, &self.password_confirm);
        let role = self_service_role(&mut errors, &self.role, None);
        match role {
            Some(role) if errors.is_empty() => Ok(role),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
}

impl ProfileForm {
    pub fn validate(&self, current_role: Role) -> Result<Role, FormErrors> {
        let mut errors = FormErrors::default();
        require_name(&mut errors, &self.name);
        require_email(&mut errors, &self.email);
        let role = self_service_role(&mut errors, &self.role, Some(current_role));
        match role {
            Some(role) if errors.is_empty() => Ok(role),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordForm {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

impl PasswordForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        if self.old_password.is_empty() {
            errors.add("old_password", "Current password is required");
        }
        require_new_password(&mut errors, &self.password, &self.password_confirm);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn require_name(errors: &mut FormErrors, name: &str) {
    if name.trim().is_empty() {
        errors.add("name", "Name is required");
    }
}

fn require_email(errors: &mut FormErrors, email: &str) {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    };
    if email.is_empty() {
        errors.add("email", "Email is required");
    } else if !valid {
        errors.add("email", "Email is not a valid email address");
    }
}

fn require_new_password(errors: &mut FormErrors, password: &str, confirm: &str) {
    if password.is_empty() {
        errors.add("password", "Password is required");
    } else if password != confirm {
        errors.add("password_confirm", "Confirm password doesn't match, Try again !");
    }
}

/// Roles a user may pick for themselves. Admin is never self-granted, but an
/// existing admin keeps the role when editing their profile.
fn self_service_role(errors: &mut FormErrors, requested: &str, current: Option<Role>) -> Option<Role> {
    match requested.parse::<Role>() {
        Ok(Role::Admin) if current == Some(Role::Admin) => Some(Role::Admin),
        Ok(Role::Admin) => {
            errors.add("role", "The admin role cannot be self-assigned");
            None
        }
        Ok(role) => Some(role),
        Err(_) => {
            errors.add("role", "Role must be one of: patient, staff");
            None
        }
    }
}

// =============================================================================
// Live validation
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct EmailQuery {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordQuery {
    #[serde(default)]
    pub old_password: String,
}

/// Live-validation answer: `true`, or a message to show under the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Availability {
    Available(bool),
    Conflict(String),
}

impl Availability {
    pub fn available() -> Self {
        Availability::Available(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_form() -> RegisterForm {
        RegisterForm {
            name: "Alice".to_string(),
            email: "a@b.com".to_string(),
            password: "secret1".to_string(),
            password_confirm: "secret1".to_string(),
            role: "patient".to_string(),
        }
    }

    #[test]
    fn valid_registration_returns_role() {
        assert_eq!(register_form().validate(), Ok(Role::Patient));
    }

    #[test]
    fn registration_reports_each_bad_field() {
        let form = RegisterForm {
            name: " ".to_string(),
            email: "not-an-email".to_string(),
            password: "a".to_string(),
            password_confirm: "b".to_string(),
            role: "Staff".to_string(),
        };
        let errors = form.validate().unwrap_err();
        for field in ["name", "email", "password_confirm", "role"] {
            assert!(errors.errors.contains_key(field), "{field}");
        }
    }

    #[test]
    fn admin_cannot_be_self_assigned() {
        let form = RegisterForm {
            role: "admin".to_string(),
            ..register_form()
        };
        assert!(form.validate().unwrap_err().errors.contains_key("role"));

        let profile = ProfileForm {
            name: "Root".to_string(),
            email: "root@b.com".to_string(),
            role: "admin".to_string(),
        };
        assert!(profile.validate(Role::Staff).is_err());
        assert_eq!(profile.validate(Role::Admin), Ok(Role::Admin));
    }

    #[test]
    fn invalid_login_flags_both_fields() {
        let errors = FormErrors::invalid_login();
        assert_eq!(errors.errors["email"], vec![INVALID_LOGIN_MESSAGE.to_string()]);
        assert_eq!(errors.errors["password"], vec![INVALID_LOGIN_MESSAGE.to_string()]);
    }

    #[test]
    fn availability_serializes_as_bare_value() {
        assert_eq!(serde_json::to_string(&Availability::available()).unwrap(), "true");
        assert_eq!(
            serde_json::to_string(&Availability::Conflict("taken".into())).unwrap(),
            r#""taken""#
        );
    }

    #[test]
    fn login_response_has_no_password_field() {
        let user = User {
            id: 1,
            name: "Alice".to_string(),
            email: "a@b.com".to_string(),
            password_hash: "$argon2id$hash".to_string(),
            role: Role::Patient,
        };
        let json = serde_json::to_value(LoginResponse::new(&user, "tok".into(), Utc::now())).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("password_hash").is_none());
        assert!(!json.to_string().contains("argon2"));
        assert_eq!(json["role"], "patient");
    }
}
