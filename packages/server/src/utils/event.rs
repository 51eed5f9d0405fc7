use common::ApprovalStatus;
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::*;

use crate::entity::{event, organizer};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;

/// Look up an event by ID, returning 404 if not found.
pub async fn find_event<C: ConnectionTrait>(db: &C, id: i32) -> Result<event::Model, AppError> {
    event::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
}

/// Look up an event with a row-level lock (`SELECT ... FOR UPDATE`).
pub async fn find_event_for_update<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<event::Model, AppError> {
    event::Entity::find_by_id(id)
        .lock(sea_orm::sea_query::LockType::Update)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
}

/// Look up an approved event. Unapproved events are reported as missing.
pub async fn find_approved_event<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<event::Model, AppError> {
    let event = find_event(db, id).await?;
    if event.approval_status != ApprovalStatus::Approved {
        return Err(AppError::NotFound("Event not found".into()));
    }
    Ok(event)
}

/// The caller's organizer profile, if any.
pub async fn find_organizer<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<Option<organizer::Model>, AppError> {
    Ok(organizer::Entity::find()
        .filter(organizer::Column::UserId.eq(user_id))
        .one(db)
        .await?)
}

/// Whether `user_id` owns the event through their organizer profile.
pub async fn is_event_owner<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    event: &event::Model,
) -> Result<bool, AppError> {
    Ok(find_organizer(db, user_id)
        .await?
        .is_some_and(|org| org.id == event.organizer_id))
}

/// Look up an event the caller owns. Other organizers' events are 404s.
pub async fn find_owned_event<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    id: i32,
) -> Result<event::Model, AppError> {
    let event = find_event(db, id).await?;
    if !is_event_owner(db, auth_user.user_id, &event).await? {
        return Err(AppError::NotFound("Event not found".into()));
    }
    Ok(event)
}

/// Take one slot: `registered_count + 1` only while below `total_slots`.
///
/// Returns `false` when the event is already full. The check and the write are a
/// single statement, so concurrent registrations cannot overshoot.
pub async fn try_increment_registered<C: ConnectionTrait>(
    db: &C,
    event_id: i32,
) -> Result<bool, DbErr> {
    let result = event::Entity::update_many()
        .col_expr(
            event::Column::RegisteredCount,
            Expr::col(event::Column::RegisteredCount).add(1),
        )
        .col_expr(event::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(event::Column::Id.eq(event_id))
        .filter(Expr::col(event::Column::RegisteredCount).lt(Expr::col(event::Column::TotalSlots)))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

/// Release one slot, never going below zero.
pub async fn decrement_registered<C: ConnectionTrait>(db: &C, event_id: i32) -> Result<(), DbErr> {
    event::Entity::update_many()
        .col_expr(
            event::Column::RegisteredCount,
            Expr::col(event::Column::RegisteredCount).sub(1),
        )
        .col_expr(event::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(event::Column::Id.eq(event_id))
        .filter(event::Column::RegisteredCount.gt(0))
        .exec(db)
        .await?;
    Ok(())
}

/// Atomically count one view of an event.
pub async fn increment_impressions<C: ConnectionTrait>(db: &C, event_id: i32) -> Result<(), DbErr> {
    event::Entity::update_many()
        .col_expr(
            event::Column::Impressions,
            Expr::col(event::Column::Impressions).add(1),
        )
        .filter(event::Column::Id.eq(event_id))
        .exec(db)
        .await?;
    Ok(())
}
