use axum::Json;
use axum::extract::State;
use common::Role;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{organizer, profile};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::profile::*;
use crate::models::shared::non_blank;
use crate::state::AppState;
use crate::utils::event::find_organizer;
use crate::utils::role_gate::require_role;

#[utoipa::path(
    get,
    path = "/profile",
    tag = "Profiles",
    operation_id = "getStudentProfile",
    summary = "Get the caller's student profile",
    responses(
        (status = 200, description = "Profile", body = StudentProfileResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a student (ACCESS_DENIED)", body = ErrorBody),
        (status = 404, description = "Profile not completed yet (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_student_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<StudentProfileResponse>, AppError> {
    require_role(&state.db, &auth_user, Role::Student).await?;
    let model = profile::Entity::find()
        .filter(profile::Column::UserId.eq(auth_user.user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".into()))?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    put,
    path = "/profile",
    tag = "Profiles",
    operation_id = "upsertStudentProfile",
    summary = "Create or replace the caller's student profile",
    request_body = StudentProfileRequest,
    responses(
        (status = 200, description = "Profile saved", body = StudentProfileResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a student (ACCESS_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn upsert_student_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<StudentProfileRequest>,
) -> Result<Json<StudentProfileResponse>, AppError> {
    require_role(&state.db, &auth_user, Role::Student).await?;
    validate_student_profile(&payload)?;

    let now = chrono::Utc::now();
    let model = profile::ActiveModel {
        user_id: Set(auth_user.user_id),
        full_name: Set(payload.full_name.trim().to_string()),
        college_name: Set(payload.college_name.trim().to_string()),
        degree: Set(payload.degree.trim().to_string()),
        passout_year: Set(payload.passout_year),
        heard_from: Set(payload.heard_from.trim().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    profile::Entity::insert(model)
        .on_conflict(
            OnConflict::column(profile::Column::UserId)
                .update_columns([
                    profile::Column::FullName,
                    profile::Column::CollegeName,
                    profile::Column::Degree,
                    profile::Column::PassoutYear,
                    profile::Column::HeardFrom,
                    profile::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(&state.db)
        .await?;

    let saved = profile::Entity::find()
        .filter(profile::Column::UserId.eq(auth_user.user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Internal("Profile vanished after upsert".into()))?;
    Ok(Json(saved.into()))
}

#[utoipa::path(
    get,
    path = "/organizer/profile",
    tag = "Profiles",
    operation_id = "getOrganizerProfile",
    summary = "Get the caller's organizer profile",
    responses(
        (status = 200, description = "Profile", body = OrganizerProfileResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not an organizer (ACCESS_DENIED)", body = ErrorBody),
        (status = 404, description = "Profile not completed yet (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_organizer_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<OrganizerProfileResponse>, AppError> {
    require_role(&state.db, &auth_user, Role::Organizer).await?;
    let model = find_organizer(&state.db, auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Organizer profile not found".into()))?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    put,
    path = "/organizer/profile",
    tag = "Profiles",
    operation_id = "upsertOrganizerProfile",
    summary = "Create or replace the caller's organizer profile",
    request_body = OrganizerProfileRequest,
    responses(
        (status = 200, description = "Profile saved", body = OrganizerProfileResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not an organizer (ACCESS_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn upsert_organizer_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<OrganizerProfileRequest>,
) -> Result<Json<OrganizerProfileResponse>, AppError> {
    require_role(&state.db, &auth_user, Role::Organizer).await?;
    validate_organizer_profile(&payload)?;

    let now = chrono::Utc::now();
    let model = organizer::ActiveModel {
        user_id: Set(auth_user.user_id),
        organization_name: Set(payload.organization_name.trim().to_string()),
        contact_email: Set(payload.contact_email.trim().to_string()),
        contact_phone: Set(non_blank(payload.contact_phone.as_deref())),
        website: Set(non_blank(payload.website.as_deref())),
        description: Set(payload.description.trim().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    organizer::Entity::insert(model)
        .on_conflict(
            OnConflict::column(organizer::Column::UserId)
                .update_columns([
                    organizer::Column::OrganizationName,
                    organizer::Column::ContactEmail,
                    organizer::Column::ContactPhone,
                    organizer::Column::Website,
                    organizer::Column::Description,
                    organizer::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(&state.db)
        .await?;

    let saved = find_organizer(&state.db, auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::Internal("Organizer profile vanished after upsert".into()))?;
    Ok(Json(saved.into()))
}
