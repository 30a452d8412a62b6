// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Browser endpoints.
//!
//! Bodies are form-encoded. Successful state changes answer with a `303`
//! redirect; validation failures answer `422` with [`FormErrors`] so the page
//! can show them next to the fields.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use tower_sessions::Session;

use crate::{
    auth::{
        password::spawn_verify,
        service::{self, AccountError},
        AuthError, CurrentSession, Identity, RequireSession, WebRejection,
    },
    error::ApiError,
    models::{
        Availability, EmailQuery, FormErrors, HomeResponse, LoginRequest, PasswordForm,
        PasswordQuery, ProfileForm, ProfileResponse, RegisterForm, EMAIL_TAKEN_MESSAGE,
    },
    state::AppState,
    store::{StoreError, User},
};

pub const LOGIN_PATH: &str = "/user/login";
pub const PROFILE_PATH: &str = "/user/profile";
const CURRENT_PASSWORD_MESSAGE: &str = "Please enter current password.";

fn form_errors(errors: FormErrors) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(errors)).into_response()
}

/// Re-issue the session so it carries the user's current details.
async fn reissue_session(state: &AppState, session: &Session, user: &User) -> Result<(), ApiError> {
    state
        .sessions
        .sign_in(session, Identity::from_user(user))
        .await
        .map_err(ApiError::internal)
}

/// The account behind a live session. A session whose account vanished is
/// ended and treated as signed out.
async fn session_user(
    state: &AppState,
    identity: &Identity,
    session: &Session,
) -> Result<User, Response> {
    match state.users.get_user(identity.user_id).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) | Err(StoreError::NotFound(_)) => {
            if let Err(e) = state.sessions.sign_out(session).await {
                tracing::warn!(error = %e, "failed to end orphaned session");
            }
            Err(WebRejection::NotAuthenticated.into_response())
        }
        Err(e) => Err(ApiError::from(e).into_response()),
    }
}

pub async fn home(session: CurrentSession) -> Json<HomeResponse> {
    Json(HomeResponse {
        signed_in: session.identity,
    })
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginRequest>,
) -> Response {
    let user = match service::authenticate(state.users.as_ref(), &form.email, &form.password).await {
        Ok(user) => user,
        Err(_) => return form_errors(FormErrors::invalid_login()),
    };

    match state.sessions.sign_in(&session, Identity::from_user(&user)).await {
        Ok(()) => Redirect::to("/").into_response(),
        Err(e) => ApiError::internal(e).into_response(),
    }
}

pub async fn register(State(state): State<AppState>, Form(form): Form<RegisterForm>) -> Response {
    let role = match form.validate() {
        Ok(role) => role,
        Err(errors) => return form_errors(errors),
    };

    let result = service::register(
        state.users.as_ref(),
        &form.name,
        &form.email,
        &form.password,
        role,
    )
    .await;
    match result {
        Ok(_) => Redirect::to(LOGIN_PATH).into_response(),
        Err(AccountError::DuplicateEmail) => {
            form_errors(FormErrors::single("email", EMAIL_TAKEN_MESSAGE))
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

pub async fn logout(State(state): State<AppState>, session: Session) -> Response {
    match state.sessions.sign_out(&session).await {
        Ok(()) => Redirect::to(LOGIN_PATH).into_response(),
        Err(e) => ApiError::internal(e).into_response(),
    }
}

pub async fn profile(State(state): State<AppState>, session: RequireSession) -> Response {
    match session_user(&state, &session.identity, &session.session).await {
        Ok(user) => Json(ProfileResponse::from(&user)).into_response(),
        Err(response) => response,
    }
}

pub async fn update_profile(
    State(state): State<AppState>,
    session: RequireSession,
    Form(form): Form<ProfileForm>,
) -> Response {
    let user = match session_user(&state, &session.identity, &session.session).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    let role = match form.validate(user.role) {
        Ok(role) => role,
        Err(errors) => return form_errors(errors),
    };

    let changed = User {
        name: form.name.trim().to_string(),
        email: form.email.trim().to_string(),
        role,
        ..user
    };
    let saved = match state.users.update_user(&changed).await {
        Ok(saved) => saved,
        Err(StoreError::DuplicateEmail) => {
            return form_errors(FormErrors::single("email", EMAIL_TAKEN_MESSAGE));
        }
        Err(e) => return ApiError::from(e).into_response(),
    };
    tracing::info!(user_id = saved.id, role = %saved.role, "profile updated");

    match reissue_session(&state, &session.session, &saved).await {
        Ok(()) => Redirect::to(PROFILE_PATH).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn change_password(
    State(state): State<AppState>,
    session: RequireSession,
    Form(form): Form<PasswordForm>,
) -> Response {
    if let Err(errors) = form.validate() {
        return form_errors(errors);
    }
    let user = match session_user(&state, &session.identity, &session.session).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let result = service::change_password(
        state.users.as_ref(),
        &user,
        &form.old_password,
        &form.password,
    )
    .await;
    let saved = match result {
        Ok(saved) => saved,
        Err(AccountError::Auth(AuthError::InvalidCredentials)) => {
            return form_errors(FormErrors::single("old_password", CURRENT_PASSWORD_MESSAGE));
        }
        Err(e) => return ApiError::from(e).into_response(),
    };

    match reissue_session(&state, &session.session, &saved).await {
        Ok(()) => Redirect::to(PROFILE_PATH).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Is `email` free to use? The caller's own address counts as free.
pub async fn verify_email(
    State(state): State<AppState>,
    session: CurrentSession,
    Query(query): Query<EmailQuery>,
) -> Result<Json<Availability>, ApiError> {
    let owner = state.users.get_user_by_email(&query.email).await?;
    let caller = session.identity.as_ref().map(|identity| identity.user_id);

    let answer = match owner {
        Some(user) if Some(user.id) != caller => Availability::Conflict(format!(
            "Email address {} is already in use. Please choose another.",
            query.email
        )),
        _ => Availability::available(),
    };
    Ok(Json(answer))
}

/// Does `old_password` match the signed-in user's current password?
pub async fn verify_current_password(
    State(state): State<AppState>,
    session: CurrentSession,
    Query(query): Query<PasswordQuery>,
) -> Result<Json<Availability>, ApiError> {
    let matches = match session.identity {
        Some(identity) => match state.users.get_user(identity.user_id).await? {
            Some(user) => spawn_verify(&user.password_hash, &query.old_password).await,
            None => false,
        },
        None => false,
    };

    Ok(Json(if matches {
        Availability::available()
    } else {
        Availability::Conflict(CURRENT_PASSWORD_MESSAGE.to_string())
    }))
}

pub async fn not_authenticated() -> Redirect {
    Redirect::to(LOGIN_PATH)
}

pub async fn not_authorised() -> Redirect {
    Redirect::to("/")
}
