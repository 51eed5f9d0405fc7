use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use common::Role;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{organizer, profile, user, user_role};
use crate::error::{AppError, ErrorBody, HOME_ROUTE};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::{
    AccessResponse, LoginRequest, LoginResponse, MeResponse, RegisterRequest, RegisterResponse,
    validate_login_request, validate_register_request,
};
use crate::state::AppState;
use crate::utils::role_gate::{check_role, gated_role, lookup_role};
use crate::utils::{hash, jwt};

/// Whether the role-specific profile exists. Admins have none to complete.
async fn has_profile<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    role: Option<Role>,
) -> Result<bool, AppError> {
    let found = match role {
        Some(Role::Admin) => return Ok(true),
        Some(Role::Organizer) => organizer::Entity::find()
            .filter(organizer::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .is_some(),
        Some(Role::Student) => profile::Entity::find()
            .filter(profile::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .is_some(),
        None => false,
    };
    Ok(found)
}

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    let auth = &state.config.auth;
    Cookie::build((auth.cookie_name.clone(), token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::days(auth.token_ttl_days))
        .build()
}

#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    operation_id = "register",
    summary = "Create an account",
    description = "Signs up a student (default) or organizer. Admin accounts cannot be self-registered.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Email already registered (EMAIL_TAKEN)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let role = validate_register_request(&payload)?;

    let email = payload.email.trim().to_lowercase();
    let hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;
    let now = chrono::Utc::now();

    let txn = state.db.begin().await?;
    let user = user::ActiveModel {
        email: Set(email),
        name: Set(payload.name.trim().to_string()),
        password: Set(hash),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::EmailTaken,
        _ => AppError::from(e),
    })?;

    user_role::ActiveModel {
        user_id: Set(user.id),
        role: Set(role.as_str().to_string()),
        assigned_at: Set(now),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    tracing::info!(user_id = user.id, %role, "Account created");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            email: user.email,
            name: user.name,
            role,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in with email and password",
    description = "Returns a bearer token and sets it as an HttpOnly session cookie. `has_profile` tells the client whether to route to profile completion.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Wrong email or password (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, jar, payload), fields(email = %payload.email))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    validate_login_request(&payload)?;

    let email = payload.email.trim().to_lowercase();
    let user = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let role = lookup_role(&state.db, user.id).await?;
    let has_profile = has_profile(&state.db, user.id, role).await?;

    let auth = &state.config.auth;
    let token = jwt::sign(user.id, &user.email, &auth.jwt_secret, auth.token_ttl_days)
        .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    let jar = jar.add(session_cookie(&state, token.clone()));
    Ok((
        jar,
        Json(LoginResponse {
            token,
            email: user.email,
            name: user.name,
            role,
            has_profile,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/logout",
    tag = "Auth",
    operation_id = "logout",
    summary = "Clear the session cookie",
    responses((status = 204, description = "Signed out")),
)]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build((state.config.auth.cookie_name.clone(), "")).path("/"));
    (jar, StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    operation_id = "me",
    summary = "Current session's identity",
    responses(
        (status = 200, description = "Identity", body = MeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MeResponse>, AppError> {
    let user = user::Entity::find_by_id(auth_user.user_id)
        .one(&state.db)
        .await?
        .ok_or(AppError::TokenInvalid)?;
    let role = lookup_role(&state.db, user.id).await?;
    let has_profile = has_profile(&state.db, user.id, role).await?;

    Ok(Json(MeResponse {
        id: user.id,
        email: user.email,
        name: user.name,
        role,
        has_profile,
    }))
}

#[utoipa::path(
    get,
    path = "/access/{role}",
    tag = "Auth",
    operation_id = "checkAccess",
    summary = "Check whether the session may enter a role-restricted view",
    description = "Reads the caller's role record and compares it with `role`. A denial is a normal 200 response carrying the notice and the route to redirect to.",
    params(("role" = Role, Path, description = "student, organizer or admin")),
    responses(
        (status = 200, description = "Access decision", body = AccessResponse),
        (status = 400, description = "Unknown role (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, %role))]
pub async fn check_access(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(role): Path<String>,
) -> Result<Json<AccessResponse>, AppError> {
    let required: Role = role
        .parse()
        .map_err(|e: common::role::ParseRoleError| AppError::Validation(e.to_string()))?;
    let stored = gated_role(
        lookup_role(&state.db, auth_user.user_id).await,
        auth_user.user_id,
    );

    Ok(Json(match check_role(stored, required) {
        Ok(()) => AccessResponse {
            authorized: true,
            notice: None,
            redirect_to: None,
        },
        Err(AppError::AccessDenied(notice)) => AccessResponse {
            authorized: false,
            notice: Some(notice),
            redirect_to: Some(HOME_ROUTE.to_string()),
        },
        Err(e) => return Err(e),
    }))
}
