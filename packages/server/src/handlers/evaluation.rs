use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::Role;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{registration, submission, team_member};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::evaluation::*;
use crate::state::AppState;
use crate::utils::event::{find_event, find_owned_event, is_event_owner};
use crate::utils::role_gate::require_role;

#[utoipa::path(
    get,
    path = "/{id}/submissions",
    tag = "Evaluation",
    operation_id = "listEventSubmissions",
    summary = "Submissions of an event for review",
    description = "Every submission of an event owned by the caller, labelled with the team name (falling back to the leader's name, then \"Unknown Team\") and stably sorted by rating. Unrated submissions sort as 0.",
    params(("id" = i32, Path, description = "Event ID"), SubmissionListQuery),
    responses(
        (status = 200, description = "Submissions", body = ReviewListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not an organizer (ACCESS_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id, event_id))]
pub async fn list_event_submissions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
    Query(query): Query<SubmissionListQuery>,
) -> Result<Json<ReviewListResponse>, AppError> {
    require_role(&state.db, &auth_user, Role::Organizer).await?;
    let event = find_owned_event(&state.db, &auth_user, event_id).await?;

    let submissions = submission::Entity::find()
        .filter(submission::Column::EventId.eq(event.id))
        .order_by_asc(submission::Column::CreatedAt)
        .order_by_asc(submission::Column::Id)
        .all(&state.db)
        .await?;

    let registration_ids: Vec<i32> = submissions.iter().map(|s| s.registration_id).collect();
    let team_names: HashMap<i32, Option<String>> = registration::Entity::find()
        .filter(registration::Column::Id.is_in(registration_ids.clone()))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|r| (r.id, r.team_name))
        .collect();
    let mut members: HashMap<i32, Vec<team_member::Model>> = HashMap::new();
    for m in team_member::Entity::find()
        .filter(team_member::Column::RegistrationId.is_in(registration_ids))
        .all(&state.db)
        .await?
    {
        members.entry(m.registration_id).or_default().push(m);
    }

    let mut data: Vec<ReviewRow> = submissions
        .into_iter()
        .map(|s| {
            let team_name = team_names.get(&s.registration_id).cloned().flatten();
            let team = members.get(&s.registration_id).map(Vec::as_slice).unwrap_or(&[]);
            ReviewRow::new(s, team_name.as_deref(), team)
        })
        .collect();
    sort_by_rating(&mut data, query.sort_order.unwrap_or_default());

    Ok(Json(ReviewListResponse {
        event_id: event.id,
        event_title: event.title,
        data,
    }))
}

#[utoipa::path(
    put,
    path = "/{id}/evaluation",
    tag = "Evaluation",
    operation_id = "evaluateSubmission",
    summary = "Rate a submission",
    description = "Stores the rating, the selection flag and optional notes, replacing any previous evaluation. Refused once the event's results are published.",
    params(("id" = i32, Path, description = "Submission ID")),
    request_body = EvaluationRequest,
    responses(
        (status = 200, description = "Evaluation saved", body = EvaluationResponse),
        (status = 400, description = "Invalid rating or notes (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not an organizer (ACCESS_DENIED)", body = ErrorBody),
        (status = 404, description = "Submission not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Results already published (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, submission_id))]
pub async fn evaluate_submission(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(submission_id): Path<i32>,
    AppJson(payload): AppJson<EvaluationRequest>,
) -> Result<Json<EvaluationResponse>, AppError> {
    require_role(&state.db, &auth_user, Role::Organizer).await?;
    let rating = parse_rating(&payload.rating)?;
    let notes = normalize_notes(payload.notes.as_deref())?;

    let txn = state.db.begin().await?;
    let current = submission::Entity::find_by_id(submission_id)
        .lock(sea_orm::sea_query::LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".into()))?;
    let event = find_event(&txn, current.event_id).await?;
    if !is_event_owner(&txn, auth_user.user_id, &event).await? {
        return Err(AppError::NotFound("Submission not found".into()));
    }
    if current.result_published {
        return Err(AppError::Conflict("Results have already been published".into()));
    }

    let mut active: submission::ActiveModel = current.into();
    active.rating = Set(Some(rating));
    active.is_selected_for_next_round = Set(payload.is_selected);
    active.evaluation_notes = Set(notes);
    active.updated_at = Set(chrono::Utc::now());
    let saved = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(submission_id, rating, selected = payload.is_selected, "Submission evaluated");
    Ok(Json(saved.into()))
}

#[utoipa::path(
    post,
    path = "/{id}/submissions/publish",
    tag = "Evaluation",
    operation_id = "publishResults",
    summary = "Publish results for an event",
    description = "Sets the publish flag on every submission of the event, rated or not. Idempotent.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Results published", body = PublishResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not an organizer (ACCESS_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, event_id))]
pub async fn publish_results(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
) -> Result<Json<PublishResponse>, AppError> {
    require_role(&state.db, &auth_user, Role::Organizer).await?;
    let event = find_owned_event(&state.db, &auth_user, event_id).await?;

    submission::Entity::update_many()
        .col_expr(submission::Column::ResultPublished, Expr::value(true))
        .col_expr(submission::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(submission::Column::EventId.eq(event.id))
        .filter(submission::Column::ResultPublished.eq(false))
        .exec(&state.db)
        .await?;
    let published = submission::Entity::find()
        .filter(submission::Column::EventId.eq(event.id))
        .filter(submission::Column::ResultPublished.eq(true))
        .count(&state.db)
        .await?;

    tracing::info!(event_id = event.id, published, "Results published");
    Ok(Json(PublishResponse {
        event_id: event.id,
        published,
    }))
}
