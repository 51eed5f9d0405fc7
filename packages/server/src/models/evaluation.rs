use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{submission, team_member};
use crate::error::AppError;
use crate::models::shared::{invalid, non_blank};

pub const UNKNOWN_TEAM: &str = "Unknown Team";
const RATING_MESSAGE: &str = "Rating must be an integer between 0 and 100";
const MAX_NOTES: usize = 2000;

/// Request body for rating a submission. Replaces any previous evaluation.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct EvaluationRequest {
    /// Integer 0-100, as a JSON number or a numeric string.
    #[schema(value_type = i32, example = 85)]
    pub rating: serde_json::Value,
    #[serde(default)]
    pub is_selected: bool,
    #[schema(example = "Strong demo, weak docs")]
    pub notes: Option<String>,
}

/// Parse a rating from user input. Accepts `85` or `"85"`, nothing fractional.
pub fn parse_rating(value: &serde_json::Value) -> Result<i32, AppError> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match parsed {
        Some(r @ 0..=100) => Ok(r as i32),
        _ => Err(invalid(RATING_MESSAGE)),
    }
}

/// Trimmed notes; blank becomes `None`.
pub fn normalize_notes(notes: Option<&str>) -> Result<Option<String>, AppError> {
    let notes = non_blank(notes);
    if notes.as_ref().is_some_and(|n| n.chars().count() > MAX_NOTES) {
        return Err(invalid(format!(
            "Notes must be less than {MAX_NOTES} characters"
        )));
    }
    Ok(notes)
}

/// Team name if set, otherwise the leader's name, otherwise "Unknown Team".
pub fn team_display_name(team_name: Option<&str>, members: &[team_member::Model]) -> String {
    non_blank(team_name)
        .or_else(|| members.iter().find(|m| m.is_leader).map(|m| m.name.clone()))
        .unwrap_or_else(|| UNKNOWN_TEAM.to_string())
}

#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SubmissionListQuery {
    /// Rating order, `desc` (default) or `asc`.
    pub sort_order: Option<SortOrder>,
}

/// One row of the organizer's review table.
#[derive(Serialize, Clone, Debug, utoipa::ToSchema)]
pub struct ReviewRow {
    pub id: i32,
    pub registration_id: i32,
    #[schema(example = "Null Pointers")]
    pub team_display_name: String,
    pub github_link: Option<String>,
    pub file_url: Option<String>,
    pub rating: Option<i32>,
    pub is_selected_for_next_round: bool,
    pub result_published: bool,
    pub evaluation_notes: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl ReviewRow {
    pub fn new(
        s: submission::Model,
        team_name: Option<&str>,
        members: &[team_member::Model],
    ) -> Self {
        Self {
            id: s.id,
            registration_id: s.registration_id,
            team_display_name: team_display_name(team_name, members),
            github_link: s.github_link,
            file_url: s.file_url,
            rating: s.rating,
            is_selected_for_next_round: s.is_selected_for_next_round,
            result_published: s.result_published,
            evaluation_notes: s.evaluation_notes,
            submitted_at: s.created_at,
        }
    }
}

/// Stable sort on rating; unrated rows rank as 0. Ties keep their prior order.
pub fn sort_by_rating(rows: &mut [ReviewRow], order: SortOrder) {
    rows.sort_by(|a, b| {
        let ord: Ordering = a.rating.unwrap_or(0).cmp(&b.rating.unwrap_or(0));
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ReviewListResponse {
    pub event_id: i32,
    pub event_title: String,
    pub data: Vec<ReviewRow>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EvaluationResponse {
    pub id: i32,
    pub rating: Option<i32>,
    pub is_selected_for_next_round: bool,
    pub evaluation_notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<submission::Model> for EvaluationResponse {
    fn from(s: submission::Model) -> Self {
        Self {
            id: s.id,
            rating: s.rating,
            is_selected_for_next_round: s.is_selected_for_next_round,
            evaluation_notes: s.evaluation_notes,
            updated_at: s.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PublishResponse {
    pub event_id: i32,
    /// Number of submissions now carrying the publish flag.
    pub published: u64,
}
