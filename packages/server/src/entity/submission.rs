use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Project artifacts for one registration.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "submission")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub registration_id: i32,
    #[sea_orm(belongs_to, from = "registration_id", to = "id")]
    pub registration: HasOne<super::registration::Entity>,

    pub event_id: i32,
    #[sea_orm(belongs_to, from = "event_id", to = "id")]
    pub event: HasOne<super::event::Entity>,

    pub github_link: Option<String>,
    pub file_url: Option<String>,
    /// Object-store key behind `file_url`.
    pub file_key: Option<String>,
    /// Hex SHA-256 of the uploaded archive.
    pub file_sha256: Option<String>,

    /// 0-100. Non-null locks the submission for its owner.
    pub rating: Option<i32>,
    pub is_selected_for_next_round: bool,
    pub result_published: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub evaluation_notes: Option<String>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
