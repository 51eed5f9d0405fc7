use common::Role;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::shared::{check_email, check_name, invalid};

/// Request body for account sign-up.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    /// Display name (1-100 characters).
    #[schema(example = "Ana Lima")]
    pub name: String,
    /// Login email, unique across accounts. Stored lowercase.
    #[schema(example = "ana@uni.edu")]
    pub email: String,
    /// At least 8 characters with an uppercase letter, a lowercase letter and a digit.
    #[schema(example = "Hackath0n!")]
    pub password: String,
    /// Must equal `password`.
    #[schema(example = "Hackath0n!")]
    pub confirm_password: String,
    /// `student` (default) or `organizer`.
    #[serde(default)]
    pub role: Option<Role>,
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < 8 {
        return Err(invalid("Password must be at least 8 characters"));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(invalid("Password must contain at least one uppercase letter"));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(invalid("Password must contain at least one lowercase letter"));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(invalid("Password must contain at least one number"));
    }
    Ok(())
}

/// Validates sign-up fields and resolves the requested role.
pub fn validate_register_request(payload: &RegisterRequest) -> Result<Role, AppError> {
    check_name(&payload.name).map_err(invalid)?;
    check_email(&payload.email).map_err(invalid)?;
    validate_password(&payload.password)?;
    if payload.confirm_password.is_empty() {
        return Err(invalid("Please confirm your password"));
    }
    if payload.password != payload.confirm_password {
        return Err(invalid("Passwords do not match"));
    }
    let role = payload.role.unwrap_or_default();
    if !role.is_self_assignable() {
        return Err(invalid("Role must be student or organizer"));
    }
    Ok(role)
}

/// Request body for login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "ana@uni.edu")]
    pub email: String,
    #[schema(example = "Hackath0n!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    check_email(&payload.email).map_err(invalid)?;
    if payload.password.is_empty() {
        return Err(invalid("Password is required"));
    }
    Ok(())
}

/// Successful sign-up response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RegisterResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "ana@uni.edu")]
    pub email: String,
    #[schema(example = "Ana Lima")]
    pub name: String,
    pub role: Role,
}

/// Successful login response. The token is also set as an HttpOnly cookie.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// JWT bearer token valid for 7 days.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    #[schema(example = "ana@uni.edu")]
    pub email: String,
    #[schema(example = "Ana Lima")]
    pub name: String,
    /// `None` when the role record is missing.
    pub role: Option<Role>,
    /// Whether the role-specific profile exists. Always true for admins.
    pub has_profile: bool,
}

/// Current session's identity.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "ana@uni.edu")]
    pub email: String,
    #[schema(example = "Ana Lima")]
    pub name: String,
    pub role: Option<Role>,
    pub has_profile: bool,
}

/// Outcome of a role check, for clients that gate whole views.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AccessResponse {
    pub authorized: bool,
    /// User-visible denial notice.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "This page is only accessible to organizers")]
    pub notice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "/home")]
    pub redirect_to: Option<String>,
}
