use axum::extract::{FromRef, FromRequestParts, OptionalFromRequestParts};
use axum::http::{header, request::Parts};
use axum_extra::extract::CookieJar;

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated session.
///
/// Resolved from `Authorization: Bearer <token>` first, then from the session
/// cookie. Carries identity only; role checks go through
/// [`require_role`](crate::utils::role_gate::require_role), which reads the
/// role from the database.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
}

enum TokenSource {
    Missing,
    Malformed,
    Found(String),
}

fn find_token(parts: &Parts, cookie_name: &str) -> TokenSource {
    if let Some(value) = parts.headers.get(header::AUTHORIZATION) {
        return match value.to_str().ok().and_then(|v| v.strip_prefix("Bearer ")) {
            Some(token) => TokenSource::Found(token.trim().to_string()),
            None => TokenSource::Malformed,
        };
    }
    let jar = CookieJar::from_headers(&parts.headers);
    match jar.get(cookie_name) {
        Some(cookie) if !cookie.value().is_empty() => TokenSource::Found(cookie.value().to_string()),
        _ => TokenSource::Missing,
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let auth = &state.config.auth;

        let token = match find_token(parts, &auth.cookie_name) {
            TokenSource::Found(token) => token,
            TokenSource::Missing => return Err(AppError::TokenMissing),
            TokenSource::Malformed => return Err(AppError::TokenInvalid),
        };

        let claims = jwt::verify(&token, &auth.jwt_secret).map_err(|_| AppError::TokenInvalid)?;

        Ok(AuthUser {
            user_id: claims.uid,
            email: claims.sub,
        })
    }
}

/// `Option<AuthUser>` for endpoints that personalise their response when a
/// session is present. Missing or unusable tokens yield `None`.
impl<S> OptionalFromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        match <AuthUser as FromRequestParts<S>>::from_request_parts(parts, state).await {
            Ok(user) => Ok(Some(user)),
            Err(AppError::TokenMissing | AppError::TokenInvalid) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
