// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer-token endpoints.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    auth::{service::authenticate, Auth, AuthError, Identity, Operation},
    models::{LoginRequest, LoginResponse, ProfileResponse},
    state::AppState,
};

/// Response for GET /api/user/permissions
#[derive(Debug, Serialize, ToSchema)]
pub struct PermissionsResponse {
    pub operations: Vec<Operation>,
}

/// Exchange email and password for a bearer token.
#[utoipa::path(
    post,
    path = "/api/login",
    tag = "Users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 400, description = "Email or Password is incorrect"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    let user = authenticate(state.users.as_ref(), &request.email, &request.password).await?;

    let issued_at = Utc::now();
    let token = state.tokens.issue_at(&Identity::from_user(&user), issued_at)?;
    let expires_at = state.tokens.expires_at(issued_at)?;
    tracing::info!(user_id = user.id, role = %user.role, "api token issued");

    Ok(Json(LoginResponse::new(&user, token, expires_at)))
}

/// Get the identity carried by the bearer token.
#[utoipa::path(
    get,
    path = "/api/user/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User information", body = ProfileResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn get_current_user(Auth(identity): Auth) -> Json<ProfileResponse> {
    Json(identity.into())
}

/// List the portal operations the caller may perform.
#[utoipa::path(
    get,
    path = "/api/user/permissions",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Permitted operations", body = PermissionsResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn get_permissions(Auth(identity): Auth) -> Json<PermissionsResponse> {
    Json(PermissionsResponse {
        operations: Operation::permitted_for(Some(&identity)),
    })
}
