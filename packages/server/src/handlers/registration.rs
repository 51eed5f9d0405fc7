use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{PaymentStatus, Role};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{registration, submission, team_member};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::event::EventFlags;
use crate::models::registration::*;
use crate::state::AppState;
use crate::utils::event::{
    decrement_registered, find_approved_event, find_event, try_increment_registered,
};
use crate::utils::role_gate::require_role;

async fn find_registration<C: ConnectionTrait>(
    db: &C,
    event_id: i32,
    user_id: i32,
) -> Result<registration::Model, AppError> {
    registration::Entity::find()
        .filter(registration::Column::EventId.eq(event_id))
        .filter(registration::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Not registered for this event".into()))
}

async fn load_members<C: ConnectionTrait>(
    db: &C,
    registration_id: i32,
) -> Result<Vec<team_member::Model>, DbErr> {
    team_member::Entity::find()
        .filter(team_member::Column::RegistrationId.eq(registration_id))
        .order_by_desc(team_member::Column::IsLeader)
        .order_by_asc(team_member::Column::Id)
        .all(db)
        .await
}

#[utoipa::path(
    post,
    path = "/{id}/registration",
    tag = "Registrations",
    operation_id = "registerForEvent",
    summary = "Register a team for an event",
    description = "Validates the roster against the event's team size bounds and the member rules, then, in one transaction, creates the registration, inserts every member and takes a slot. Any failure rolls back all three writes.",
    params(("id" = i32, Path, description = "Event ID")),
    request_body = RegistrationRequest,
    responses(
        (status = 201, description = "Registered", body = RegistrationResponse),
        (status = 400, description = "Validation error or deadline passed (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a student (ACCESS_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already registered or event full (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, event_id))]
pub async fn register_for_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
    AppJson(payload): AppJson<RegistrationRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_role(&state.db, &auth_user, Role::Student).await?;

    // Validation runs before any write.
    let event = find_approved_event(&state.db, event_id).await?;
    let (team_name, roster) = validate_registration(payload, &event)?;

    let txn = state.db.begin().await?;
    let event = find_approved_event(&txn, event_id).await?;
    let now = chrono::Utc::now();
    if EventFlags::compute(&event, now).deadline_passed {
        return Err(AppError::Validation(
            "Registration deadline has passed".into(),
        ));
    }

    let reg = registration::ActiveModel {
        event_id: Set(event.id),
        user_id: Set(auth_user.user_id),
        team_name: Set(team_name),
        status: Set(registration::STATUS_REGISTERED.to_string()),
        payment_status: Set(PaymentStatus::for_fee(event.registration_fee)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Already registered for this event".into())
        }
        _ => AppError::from(e),
    })?;

    let rows = roster.into_members().into_iter().map(|m| team_member::ActiveModel {
        registration_id: Set(reg.id),
        name: Set(m.name),
        email: Set(m.email),
        phone: Set(m.phone),
        college_name: Set(m.college_name),
        photo_url: Set(m.photo_url),
        is_leader: Set(m.is_leader),
        created_at: Set(now),
        ..Default::default()
    });
    team_member::Entity::insert_many(rows)
        .exec_without_returning(&txn)
        .await?;

    if !try_increment_registered(&txn, event.id).await? {
        return Err(AppError::Conflict("Event is full".into()));
    }

    let members = load_members(&txn, reg.id).await?;
    txn.commit().await?;

    tracing::info!(
        registration_id = reg.id,
        event_id = event.id,
        members = members.len(),
        "Registration created"
    );
    Ok((
        StatusCode::CREATED,
        Json(RegistrationResponse::new(reg, members)),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}/registration",
    tag = "Registrations",
    operation_id = "getMyRegistration",
    summary = "The caller's registration for an event",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Registration with members", body = RegistrationResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a student (ACCESS_DENIED)", body = ErrorBody),
        (status = 404, description = "Not registered (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, event_id))]
pub async fn get_my_registration(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
) -> Result<Json<RegistrationResponse>, AppError> {
    require_role(&state.db, &auth_user, Role::Student).await?;
    let reg = find_registration(&state.db, event_id, auth_user.user_id).await?;
    let members = load_members(&state.db, reg.id).await?;
    Ok(Json(RegistrationResponse::new(reg, members)))
}

#[utoipa::path(
    delete,
    path = "/{id}/registration",
    tag = "Registrations",
    operation_id = "cancelRegistration",
    summary = "Cancel the caller's registration",
    description = "Deletes the registration and its members and releases the slot, in one transaction. Refused once a submission exists or the registration deadline has passed.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 204, description = "Cancelled"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a student (ACCESS_DENIED)", body = ErrorBody),
        (status = 404, description = "Not registered (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Submission exists or deadline passed (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, event_id))]
pub async fn cancel_registration(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    require_role(&state.db, &auth_user, Role::Student).await?;

    let txn = state.db.begin().await?;
    let reg = registration::Entity::find()
        .filter(registration::Column::EventId.eq(event_id))
        .filter(registration::Column::UserId.eq(auth_user.user_id))
        .lock(sea_orm::sea_query::LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Not registered for this event".into()))?;

    let event = find_event(&txn, event_id).await?;
    if EventFlags::compute(&event, chrono::Utc::now()).deadline_passed {
        return Err(AppError::Conflict(
            "Registrations cannot be cancelled after the deadline".into(),
        ));
    }
    let has_submission = submission::Entity::find()
        .filter(submission::Column::RegistrationId.eq(reg.id))
        .one(&txn)
        .await?
        .is_some();
    if has_submission {
        return Err(AppError::Conflict(
            "Registrations with a submission cannot be cancelled".into(),
        ));
    }

    team_member::Entity::delete_many()
        .filter(team_member::Column::RegistrationId.eq(reg.id))
        .exec(&txn)
        .await?;
    registration::Entity::delete_by_id(reg.id).exec(&txn).await?;
    decrement_registered(&txn, event_id).await?;
    txn.commit().await?;

    tracing::info!(registration_id = reg.id, event_id, "Registration cancelled");
    Ok(StatusCode::NO_CONTENT)
}
