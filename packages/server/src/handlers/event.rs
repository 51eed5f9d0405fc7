use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{ApprovalStatus, Role};
use sea_orm::sea_query::extension::postgres::PgBinOper;
use sea_orm::sea_query::{Expr, ExprTrait, Func, LikeExpr, OnConflict};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{event, recently_viewed, registration, submission, wishlist};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::event::*;
use crate::models::shared::{Pagination, escape_like, page_offset};
use crate::models::submission::PublishedResult;
use crate::state::AppState;
use crate::utils::event::{
    find_approved_event, find_event, find_event_for_update, find_organizer,
    increment_impressions, is_event_owner,
};
use crate::utils::role_gate::{lookup_role, require_role};

fn draft_columns(active: &mut event::ActiveModel, d: EventDraft) {
    active.title = Set(d.title);
    active.organizer = Set(d.organizer);
    active.location = Set(d.location);
    active.event_type = Set(d.event_type);
    active.event_date = Set(d.event_date);
    active.registration_deadline = Set(d.registration_deadline);
    active.team_size_min = Set(d.team_size_min);
    active.team_size_max = Set(d.team_size_max);
    active.total_slots = Set(d.total_slots);
    active.registration_fee = Set(d.registration_fee);
    active.prize_money = Set(d.prize_money);
    active.poster_url = Set(d.poster_url);
    active.description = Set(d.description);
    active.eligibility = Set(d.eligibility);
    active.stages = Set(d.stages);
    active.details = Set(d.details);
    active.dates_deadlines = Set(d.dates_deadlines);
    active.prizes = Set(d.prizes);
    active.tags = Set(serde_json::json!(d.tags));
    active.custom_sections = Set(serde_json::json!(d.custom_sections));
    active.submission_type = Set(d.submission_type);
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Events",
    operation_id = "createEvent",
    summary = "Create an event",
    description = "Creates an event owned by the caller's organizer profile. New events are `pending` until an admin reviews them.",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not an organizer (ACCESS_DENIED)", body = ErrorBody),
        (status = 404, description = "Organizer profile missing (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, title = %payload.title))]
pub async fn create_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_role(&state.db, &auth_user, Role::Organizer).await?;
    let organizer = find_organizer(&state.db, auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Organizer profile not found".into()))?;

    let draft = EventDraft::from(payload);
    validate_event_draft(&draft)?;

    let now = chrono::Utc::now();
    let mut active = event::ActiveModel {
        organizer_id: Set(organizer.id),
        registered_count: Set(0),
        approval_status: Set(ApprovalStatus::Pending),
        rejection_reason: Set(None),
        impressions: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    draft_columns(&mut active, draft);
    let model = active.insert(&state.db).await?;

    tracing::info!(event_id = model.id, organizer_id = organizer.id, "Event submitted for review");
    Ok((StatusCode::CREATED, Json(EventResponse::from(model))))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Events",
    operation_id = "updateEvent",
    summary = "Edit a pending event",
    description = "Partially updates an event owned by the caller. Only events still `pending` review can be edited; cross-field rules are checked against the stored values.",
    params(("id" = i32, Path, description = "Event ID")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Event updated", body = EventResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not an organizer (ACCESS_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Event already reviewed (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, id))]
pub async fn update_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateEventRequest>,
) -> Result<Json<EventResponse>, AppError> {
    require_role(&state.db, &auth_user, Role::Organizer).await?;

    let txn = state.db.begin().await?;
    let existing = find_event_for_update(&txn, id).await?;
    if !is_event_owner(&txn, auth_user.user_id, &existing).await? {
        return Err(AppError::NotFound("Event not found".into()));
    }
    if existing.approval_status != ApprovalStatus::Pending {
        return Err(AppError::Conflict(
            "Only events pending review can be edited".into(),
        ));
    }

    let draft = payload.merge(&existing);
    validate_event_draft(&draft)?;

    let mut active: event::ActiveModel = existing.into();
    draft_columns(&mut active, draft);
    active.updated_at = Set(chrono::Utc::now());
    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Events",
    operation_id = "listEvents",
    summary = "Browse approved events",
    description = "Public catalog of approved events with title search, type and tag filters, sorting and pagination.",
    params(EventListQuery),
    responses(
        (status = 200, description = "Events", body = EventListResponse),
        (status = 400, description = "Bad sort field (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventListQuery>,
) -> Result<Json<EventListResponse>, AppError> {
    let page = Ord::max(query.page.unwrap_or(1), 1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let mut select =
        event::Entity::find().filter(event::Column::ApprovalStatus.eq(ApprovalStatus::Approved));

    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(event::Column::Title)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            );
        }
    }
    if let Some(ref event_type) = query.event_type
        && !event_type.trim().is_empty()
    {
        select = select.filter(event::Column::EventType.eq(event_type.trim()));
    }
    if let Some(ref tag) = query.tag
        && !tag.trim().is_empty()
    {
        select = select.filter(
            Expr::col(event::Column::Tags)
                .binary(PgBinOper::Contains, Expr::val(serde_json::json!([tag.trim()]))),
        );
    }

    let sort_column = match query.sort_by.as_deref().unwrap_or("event_date") {
        "event_date" => event::Column::EventDate,
        "created_at" => event::Column::CreatedAt,
        "prize_money" => event::Column::PrizeMoney,
        "title" => event::Column::Title,
        _ => {
            return Err(AppError::Validation(
                "sort_by must be one of: event_date, created_at, prize_money, title".into(),
            ));
        }
    };
    let sort_order = if query.sort_order.as_deref() == Some("desc") {
        Order::Desc
    } else {
        Order::Asc
    };

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let total_pages = total.div_ceil(per_page);

    let data = select
        .order_by(sort_column, sort_order)
        .order_by_asc(event::Column::Id)
        .offset(Some(page_offset(page, per_page)))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(EventListItem::from)
        .collect();

    Ok(Json(EventListResponse {
        data,
        pagination: Pagination {
            page,
            per_page,
            total,
            total_pages,
        },
    }))
}

/// Whether the caller may see an event that is not (yet) approved.
async fn can_see_unapproved(
    state: &AppState,
    auth_user: Option<&AuthUser>,
    event: &event::Model,
) -> Result<bool, AppError> {
    let Some(user) = auth_user else {
        return Ok(false);
    };
    if lookup_role(&state.db, user.user_id).await? == Some(Role::Admin) {
        return Ok(true);
    }
    is_event_owner(&state.db, user.user_id, event).await
}

async fn viewer_state(
    state: &AppState,
    user_id: i32,
    event_id: i32,
) -> Result<ViewerState, AppError> {
    let registration = registration::Entity::find()
        .filter(registration::Column::EventId.eq(event_id))
        .filter(registration::Column::UserId.eq(user_id))
        .one(&state.db)
        .await?;
    let in_wishlist = wishlist::Entity::find_by_id((user_id, event_id))
        .one(&state.db)
        .await?
        .is_some();

    let result = match &registration {
        Some(reg) => submission::Entity::find()
            .filter(submission::Column::RegistrationId.eq(reg.id))
            .one(&state.db)
            .await?
            .as_ref()
            .and_then(PublishedResult::of),
        None => None,
    };

    Ok(ViewerState {
        is_registered: registration.is_some(),
        in_wishlist,
        result,
    })
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Events",
    operation_id = "getEvent",
    summary = "Event details",
    description = "Approved events are public. Owners and admins also see pending and rejected ones; everyone else gets 404. With a session the response carries the caller's registration, wishlist and published-result state.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event details", body = EventDetailResponse),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_event(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<EventDetailResponse>, AppError> {
    let model = find_event(&state.db, id).await?;
    if model.approval_status != ApprovalStatus::Approved
        && !can_see_unapproved(&state, auth_user.as_ref(), &model).await?
    {
        return Err(AppError::NotFound("Event not found".into()));
    }

    let viewer = match &auth_user {
        Some(user) => Some(viewer_state(&state, user.user_id, model.id).await?),
        None => None,
    };
    let flags = EventFlags::compute(&model, chrono::Utc::now());

    Ok(Json(EventDetailResponse {
        event: model.into(),
        flags,
        viewer,
    }))
}

#[utoipa::path(
    post,
    path = "/{id}/view",
    tag = "Events",
    operation_id = "recordEventView",
    summary = "Record that an event page was opened",
    description = "Counts an impression. With a session, also upserts the caller's recently-viewed entry so repeat views refresh its timestamp instead of duplicating it.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 204, description = "View recorded"),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn record_view(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    find_approved_event(&state.db, id).await?;

    if let Some(user) = auth_user {
        let row = recently_viewed::ActiveModel {
            user_id: Set(user.user_id),
            event_id: Set(id),
            viewed_at: Set(chrono::Utc::now()),
        };
        recently_viewed::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    recently_viewed::Column::UserId,
                    recently_viewed::Column::EventId,
                ])
                .update_column(recently_viewed::Column::ViewedAt)
                .to_owned(),
            )
            .exec_without_returning(&state.db)
            .await?;
    }
    increment_impressions(&state.db, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/organizer/events",
    tag = "Events",
    operation_id = "listOrganizerEvents",
    summary = "The caller's own events",
    description = "All events of the caller's organizer profile, in any approval state, newest first and split into upcoming and past by event date.",
    responses(
        (status = 200, description = "Own events", body = OrganizerEventsResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not an organizer (ACCESS_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_organizer_events(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<OrganizerEventsResponse>, AppError> {
    require_role(&state.db, &auth_user, Role::Organizer).await?;

    let events = match find_organizer(&state.db, auth_user.user_id).await? {
        Some(org) => {
            event::Entity::find()
                .filter(event::Column::OrganizerId.eq(org.id))
                .order_by_desc(event::Column::CreatedAt)
                .order_by_desc(event::Column::Id)
                .all(&state.db)
                .await?
        }
        None => Vec::new(),
    };

    Ok(Json(split_upcoming_past(events, chrono::Utc::now())))
}
