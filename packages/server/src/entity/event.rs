use common::{ApprovalStatus, SubmissionType};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub organizer_id: i32,
    #[sea_orm(belongs_to, from = "organizer_id", to = "id")]
    pub organizer_ref: HasOne<super::organizer::Entity>,
    /// Display name shown on listings.
    pub organizer: String,

    pub title: String,
    pub location: String,
    pub event_type: String,
    pub event_date: DateTimeUtc,
    pub registration_deadline: DateTimeUtc,

    pub team_size_min: i32,
    pub team_size_max: i32,
    pub total_slots: i32,
    /// Only mutated through conditional `UPDATE ... SET registered_count = registered_count +/- 1`.
    pub registered_count: i32,

    pub registration_fee: i32,
    pub prize_money: Option<i32>,
    pub poster_url: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Text")]
    pub eligibility: String,
    #[sea_orm(column_type = "Text")]
    pub stages: String,
    #[sea_orm(column_type = "Text")]
    pub details: String,
    #[sea_orm(column_type = "Text")]
    pub dates_deadlines: String,
    #[sea_orm(column_type = "Text")]
    pub prizes: String,

    /// JSON array of strings.
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,
    /// JSON array of `{title, description}` objects.
    #[sea_orm(column_type = "JsonBinary")]
    pub custom_sections: Json,

    pub submission_type: SubmissionType,
    pub approval_status: ApprovalStatus,
    pub rejection_reason: Option<String>,
    pub impressions: i64,

    #[sea_orm(has_many)]
    pub registrations: HasMany<super::registration::Entity>,

    #[sea_orm(has_many)]
    pub submissions: HasMany<super::submission::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
