// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only API endpoints.
//!
//! These endpoints require a bearer token with the admin role:
//! - Access rules: every portal operation and what it requires
//! - Account lookup by id

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    auth::{gate::AdminOnly, Operation, RequireRole, Requirement, Role},
    error::ApiError,
    models::ProfileResponse,
    state::AppState,
    store::{StoreError, UserId},
};

// ============================================================================
// Response Types
// ============================================================================

/// What an operation requires of its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Anonymous,
    Authenticated,
    Role,
}

/// One row of the access table.
#[derive(Debug, Serialize, ToSchema)]
pub struct AccessRule {
    pub operation: Operation,
    pub access: Access,
    /// Accepted roles when `access` is `role`; empty otherwise.
    pub roles: Vec<Role>,
}

impl From<Operation> for AccessRule {
    fn from(operation: Operation) -> Self {
        let (access, roles) = match operation.requirement() {
            Requirement::Anonymous => (Access::Anonymous, Vec::new()),
            Requirement::Authenticated => (Access::Authenticated, Vec::new()),
            Requirement::HasRole(roles) => (Access::Role, roles.to_vec()),
        };
        Self {
            operation,
            access,
            roles,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccessRulesResponse {
    pub rules: Vec<AccessRule>,
}

// ============================================================================
// Handlers
// ============================================================================

/// List every portal operation and the access it requires. Admin only.
#[utoipa::path(
    get,
    path = "/api/admin/access-rules",
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Access table", body = AccessRulesResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn get_access_rules(
    RequireRole(admin, _): RequireRole<AdminOnly>,
) -> Json<AccessRulesResponse> {
    tracing::debug!(user_id = admin.user_id, "access rules listed");
    Json(AccessRulesResponse {
        rules: Operation::ALL.into_iter().map(AccessRule::from).collect(),
    })
}

/// Look up an account by id. Admin only.
#[utoipa::path(
    get,
    path = "/api/admin/users/{id}",
    tag = "Admin",
    security(("bearer" = [])),
    params(("id" = u64, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account", body = ProfileResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)"),
        (status = 404, description = "Account not found")
    )
)]
pub async fn get_user(
    RequireRole(admin, _): RequireRole<AdminOnly>,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = state
        .users
        .get_user(id)
        .await?
        .ok_or(StoreError::NotFound(id))?;
    tracing::info!(admin_id = admin.user_id, user_id = user.id, "admin account lookup");
    Ok(Json(ProfileResponse::from(&user)))
}
