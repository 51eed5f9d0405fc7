use axum::Json;
use axum::extract::{Path, Query, State};
use common::{ApprovalStatus, Role};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{event, registration, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::admin::*;
use crate::models::event::{EventDetailResponse, EventFlags, EventListItem, EventResponse};
use crate::state::AppState;
use crate::utils::event::{find_event, find_event_for_update};
use crate::utils::role_gate::require_role;

#[utoipa::path(
    get,
    path = "/events",
    tag = "Admin",
    operation_id = "adminListEvents",
    summary = "All events for review",
    description = "Every event regardless of approval state, newest first, optionally filtered by status.",
    params(AdminEventListQuery),
    responses(
        (status = 200, description = "Events", body = Vec<EventListItem>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not an admin (ACCESS_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_events(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<AdminEventListQuery>,
) -> Result<Json<Vec<EventListItem>>, AppError> {
    require_role(&state.db, &auth_user, Role::Admin).await?;

    let mut select = event::Entity::find();
    if let Some(status) = query.status {
        select = select.filter(event::Column::ApprovalStatus.eq(status));
    }
    let events = select
        .order_by_desc(event::Column::CreatedAt)
        .order_by_desc(event::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(events.into_iter().map(EventListItem::from).collect()))
}

#[utoipa::path(
    get,
    path = "/events/{id}",
    tag = "Admin",
    operation_id = "adminGetEvent",
    summary = "Any event's details",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event details", body = EventDetailResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not an admin (ACCESS_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn get_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<EventDetailResponse>, AppError> {
    require_role(&state.db, &auth_user, Role::Admin).await?;
    let model = find_event(&state.db, id).await?;
    let flags = EventFlags::compute(&model, chrono::Utc::now());
    Ok(Json(EventDetailResponse {
        event: model.into(),
        flags,
        viewer: None,
    }))
}

/// Move a pending event to `next`, storing `reason` for rejections.
async fn review_event(
    state: &AppState,
    id: i32,
    next: ApprovalStatus,
    reason: Option<String>,
) -> Result<event::Model, AppError> {
    let txn = state.db.begin().await?;
    let existing = find_event_for_update(&txn, id).await?;
    ensure_reviewable(existing.approval_status, next)?;

    let mut active: event::ActiveModel = existing.into();
    active.approval_status = Set(next);
    active.rejection_reason = Set(reason);
    active.updated_at = Set(chrono::Utc::now());
    let model = active.update(&txn).await?;
    txn.commit().await?;
    Ok(model)
}

#[utoipa::path(
    post,
    path = "/events/{id}/approve",
    tag = "Admin",
    operation_id = "approveEvent",
    summary = "Approve a pending event",
    description = "Makes the event visible in the public catalog. Terminal: reviewed events cannot be reviewed again.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event approved", body = EventResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not an admin (ACCESS_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already reviewed (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn approve_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<EventResponse>, AppError> {
    require_role(&state.db, &auth_user, Role::Admin).await?;
    let model = review_event(&state, id, ApprovalStatus::Approved, None).await?;
    tracing::info!(event_id = id, "Event approved");
    Ok(Json(model.into()))
}

#[utoipa::path(
    post,
    path = "/events/{id}/reject",
    tag = "Admin",
    operation_id = "rejectEvent",
    summary = "Reject a pending event",
    description = "Requires a non-empty reason, stored verbatim after trimming. Terminal.",
    params(("id" = i32, Path, description = "Event ID")),
    request_body = RejectEventRequest,
    responses(
        (status = 200, description = "Event rejected", body = EventResponse),
        (status = 400, description = "Missing reason (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not an admin (ACCESS_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already reviewed (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, id))]
pub async fn reject_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<RejectEventRequest>,
) -> Result<Json<EventResponse>, AppError> {
    require_role(&state.db, &auth_user, Role::Admin).await?;
    let reason = validate_rejection_reason(&payload.reason)?;
    let model = review_event(&state, id, ApprovalStatus::Rejected, Some(reason)).await?;
    tracing::info!(event_id = id, "Event rejected");
    Ok(Json(model.into()))
}

#[utoipa::path(
    get,
    path = "/stats",
    tag = "Admin",
    operation_id = "adminStats",
    summary = "Dashboard counters",
    responses(
        (status = 200, description = "Counters", body = AdminStats),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not an admin (ACCESS_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn stats(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AdminStats>, AppError> {
    require_role(&state.db, &auth_user, Role::Admin).await?;

    let total_events = event::Entity::find().count(&state.db).await?;
    let pending_approvals = event::Entity::find()
        .filter(event::Column::ApprovalStatus.eq(ApprovalStatus::Pending))
        .count(&state.db)
        .await?;
    let total_users = user::Entity::find().count(&state.db).await?;
    let total_registrations = registration::Entity::find().count(&state.db).await?;

    Ok(Json(AdminStats {
        total_events,
        pending_approvals,
        total_users,
        total_registrations,
    }))
}
