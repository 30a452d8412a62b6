// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Body,
    http::{HeaderName, Request},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{Operation, Role},
    models::{LoginRequest, LoginResponse, ProfileResponse},
    state::AppState,
};

pub mod admin;
pub mod health;
pub mod users;
pub mod web;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState) -> Router {
    let web_routes = Router::new()
        .route("/", get(web::home))
        .route("/user/login", post(web::login))
        .route("/user/register", post(web::register))
        .route("/user/logout", post(web::logout))
        .route("/user/profile", get(web::profile).post(web::update_profile))
        .route("/user/password", post(web::change_password))
        .route(
            "/user/verify-email",
            get(web::verify_email).post(web::verify_email),
        )
        .route(
            "/user/verify-password",
            get(web::verify_current_password).post(web::verify_current_password),
        )
        .route("/user/error/not-authenticated", get(web::not_authenticated))
        .route("/user/error/not-authorised", get(web::not_authorised))
        .layer(state.sessions.layer());

    let api_routes = Router::new()
        .route("/login", post(users::login))
        .route("/user/me", get(users::get_current_user))
        .route("/user/permissions", get(users::get_permissions))
        .route("/admin/access-rules", get(admin::get_access_rules))
        .route("/admin/users/{id}", get(admin::get_user))
        .layer(CorsLayer::permissive());

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .merge(web_routes)
        .nest("/api", api_routes)
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get(REQUEST_ID_HEADER)
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "http",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id = %request_id,
                    )
                }))
                .layer(PropagateRequestIdLayer::new(request_id)),
        )
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        users::login,
        users::get_current_user,
        users::get_permissions,
        admin::get_access_rules,
        admin::get_user,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            LoginRequest,
            LoginResponse,
            ProfileResponse,
            Role,
            Operation,
            users::PermissionsResponse,
            admin::Access,
            admin::AccessRule,
            admin::AccessRulesResponse,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Users", description = "Bearer-token login and identity"),
        (name = "Admin", description = "Admin-only inspection endpoints"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
