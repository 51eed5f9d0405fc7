use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{event, recently_viewed, registration, wishlist};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::engagement::*;
use crate::models::registration::MyRegistrationItem;
use crate::state::AppState;
use crate::utils::event::find_approved_event;

/// Events keyed by id, for joining user lists against the catalog.
async fn events_by_id<C: ConnectionTrait>(
    db: &C,
    ids: Vec<i32>,
) -> Result<HashMap<i32, event::Model>, DbErr> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(event::Entity::find()
        .filter(event::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|e| (e.id, e))
        .collect())
}

async fn wishlist_items<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    limit: u64,
) -> Result<Vec<TimedEventItem>, DbErr> {
    let rows = wishlist::Entity::find()
        .filter(wishlist::Column::UserId.eq(user_id))
        .order_by_desc(wishlist::Column::CreatedAt)
        .limit(limit)
        .all(db)
        .await?;
    let mut events = events_by_id(db, rows.iter().map(|r| r.event_id).collect()).await?;
    Ok(rows
        .into_iter()
        .filter_map(|r| {
            events.remove(&r.event_id).map(|e| TimedEventItem {
                at: r.created_at,
                event: e.into(),
            })
        })
        .collect())
}

async fn recently_viewed_items<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    limit: u64,
) -> Result<Vec<TimedEventItem>, DbErr> {
    let rows = recently_viewed::Entity::find()
        .filter(recently_viewed::Column::UserId.eq(user_id))
        .order_by_desc(recently_viewed::Column::ViewedAt)
        .limit(limit)
        .all(db)
        .await?;
    let mut events = events_by_id(db, rows.iter().map(|r| r.event_id).collect()).await?;
    Ok(rows
        .into_iter()
        .filter_map(|r| {
            events.remove(&r.event_id).map(|e| TimedEventItem {
                at: r.viewed_at,
                event: e.into(),
            })
        })
        .collect())
}

/// The user's registrations joined with their events, newest registration first.
async fn registration_items<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<Vec<MyRegistrationItem>, DbErr> {
    let rows = registration::Entity::find()
        .filter(registration::Column::UserId.eq(user_id))
        .order_by_desc(registration::Column::CreatedAt)
        .all(db)
        .await?;
    let mut events = events_by_id(db, rows.iter().map(|r| r.event_id).collect()).await?;
    Ok(rows
        .into_iter()
        .filter_map(|r| {
            events.remove(&r.event_id).map(|e| MyRegistrationItem {
                registration_id: r.id,
                team_name: r.team_name,
                payment_status: r.payment_status,
                registered_at: r.created_at,
                event: e.into(),
            })
        })
        .collect())
}

#[utoipa::path(
    put,
    path = "/{id}/wishlist",
    tag = "Engagement",
    operation_id = "addToWishlist",
    summary = "Save an event",
    description = "Idempotent. Only approved events can be saved.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Saved", body = WishlistStatus),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, event_id))]
pub async fn add_to_wishlist(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
) -> Result<Json<WishlistStatus>, AppError> {
    let event = find_approved_event(&state.db, event_id).await?;

    let row = wishlist::ActiveModel {
        user_id: Set(auth_user.user_id),
        event_id: Set(event.id),
        created_at: Set(chrono::Utc::now()),
    };
    let result = wishlist::Entity::insert(row)
        .on_conflict(
            OnConflict::columns([wishlist::Column::UserId, wishlist::Column::EventId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&state.db)
        .await;
    match result {
        Ok(_) | Err(DbErr::RecordNotInserted) => {}
        Err(e) => return Err(e.into()),
    }

    Ok(Json(WishlistStatus {
        event_id: event.id,
        in_wishlist: true,
    }))
}

#[utoipa::path(
    delete,
    path = "/{id}/wishlist",
    tag = "Engagement",
    operation_id = "removeFromWishlist",
    summary = "Unsave an event",
    description = "Idempotent. Removing an event that was never saved succeeds.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Removed", body = WishlistStatus),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, event_id))]
pub async fn remove_from_wishlist(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
) -> Result<Json<WishlistStatus>, AppError> {
    wishlist::Entity::delete_many()
        .filter(wishlist::Column::UserId.eq(auth_user.user_id))
        .filter(wishlist::Column::EventId.eq(event_id))
        .exec(&state.db)
        .await?;

    Ok(Json(WishlistStatus {
        event_id,
        in_wishlist: false,
    }))
}

#[utoipa::path(
    get,
    path = "/wishlist",
    tag = "Engagement",
    operation_id = "listWishlist",
    summary = "Saved events",
    description = "Most recently saved first.",
    params(LimitQuery),
    responses(
        (status = 200, description = "Saved events", body = Vec<TimedEventItem>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_wishlist(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<TimedEventItem>>, AppError> {
    Ok(Json(
        wishlist_items(&state.db, auth_user.user_id, query.resolve()).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/recently-viewed",
    tag = "Engagement",
    operation_id = "listRecentlyViewed",
    summary = "Recently viewed events",
    description = "Most recent view first. Each event appears once.",
    params(LimitQuery),
    responses(
        (status = 200, description = "Viewed events", body = Vec<TimedEventItem>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_recently_viewed(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<TimedEventItem>>, AppError> {
    Ok(Json(
        recently_viewed_items(&state.db, auth_user.user_id, query.resolve()).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/registrations",
    tag = "Engagement",
    operation_id = "listMyRegistrations",
    summary = "Events the caller registered for",
    responses(
        (status = 200, description = "Registrations", body = Vec<MyRegistrationItem>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_my_registrations(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<MyRegistrationItem>>, AppError> {
    Ok(Json(registration_items(&state.db, auth_user.user_id).await?))
}

#[utoipa::path(
    get,
    path = "/home",
    tag = "Engagement",
    operation_id = "homeFeed",
    summary = "Personal home feed",
    description = "Three recently viewed events, three saved events and the three soonest upcoming events the caller is registered for.",
    responses(
        (status = 200, description = "Home feed", body = HomeFeed),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn home_feed(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<HomeFeed>, AppError> {
    let recently_viewed =
        recently_viewed_items(&state.db, auth_user.user_id, HOME_SECTION_SIZE).await?;
    let wishlist = wishlist_items(&state.db, auth_user.user_id, HOME_SECTION_SIZE).await?;

    let now = chrono::Utc::now();
    let mut upcoming_rounds: Vec<MyRegistrationItem> = registration_items(&state.db, auth_user.user_id)
        .await?
        .into_iter()
        .filter(|r| r.event.event_date >= now)
        .collect();
    upcoming_rounds.sort_by_key(|r| r.event.event_date);
    upcoming_rounds.truncate(HOME_SECTION_SIZE as usize);

    Ok(Json(HomeFeed {
        recently_viewed,
        wishlist,
        upcoming_rounds,
    }))
}
