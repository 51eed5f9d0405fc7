use common::PaymentStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Status written on every new registration.
pub const STATUS_REGISTERED: &str = "registered";

/// A student's (or team's) enrollment in one event.
///
/// `(event_id, user_id)` is unique; the index is created in `seed::ensure_indexes`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "registration")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub event_id: i32,
    #[sea_orm(belongs_to, from = "event_id", to = "id")]
    pub event: HasOne<super::event::Entity>,

    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    pub team_name: Option<String>,
    pub status: String,
    pub payment_status: PaymentStatus,

    #[sea_orm(has_many)]
    pub members: HasMany<super::team_member::Entity>,

    #[sea_orm(has_one)]
    pub submission: HasOne<super::submission::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
