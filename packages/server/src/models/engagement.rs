use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::event::EventListItem;
use crate::models::registration::MyRegistrationItem;

pub const DEFAULT_LIST_LIMIT: u64 = 20;
pub const MAX_LIST_LIMIT: u64 = 100;
/// Items per section on the home feed.
pub const HOME_SECTION_SIZE: u64 = 3;

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitQuery {
    /// Max items (default 20, max 100).
    pub limit: Option<u64>,
}

impl LimitQuery {
    pub fn resolve(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
    }
}

/// An event with the time the user touched it (saved or viewed).
#[derive(Serialize, utoipa::ToSchema)]
pub struct TimedEventItem {
    pub at: DateTime<Utc>,
    pub event: EventListItem,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct WishlistStatus {
    pub event_id: i32,
    pub in_wishlist: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HomeFeed {
    pub recently_viewed: Vec<TimedEventItem>,
    pub wishlist: Vec<TimedEventItem>,
    /// Registered events whose date is still ahead, soonest first.
    pub upcoming_rounds: Vec<MyRegistrationItem>,
}
