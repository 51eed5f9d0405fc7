use chrono::{DateTime, Utc};
use common::{ApprovalStatus, SubmissionType};
use serde::{Deserialize, Serialize};

use crate::entity::event;
use crate::error::AppError;
use crate::models::shared::{
    Pagination, check_name, check_optional_url, check_required, check_text, double_option,
    invalid, non_blank,
};
use crate::models::submission::PublishedResult;

pub const DEFAULT_EVENT_TYPE: &str = "Hackathon";
pub const DEFAULT_ELIGIBILITY: &str = "Everyone can apply";
const MAX_TAGS: usize = 20;
const MAX_TAG_LEN: usize = 50;
const MAX_CUSTOM_SECTIONS: usize = 10;

/// Organizer-defined extra section shown on the event page.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, utoipa::ToSchema)]
pub struct CustomSection {
    #[schema(example = "Judging criteria")]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Request body for creating an event. New events start `pending`.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateEventRequest {
    #[schema(example = "Campus Hack 2026")]
    pub title: String,
    /// Organizer display name.
    #[schema(example = "Campus Coding Club")]
    pub organizer: String,
    #[schema(example = "Main Auditorium")]
    pub location: String,
    /// Defaults to "Hackathon".
    pub event_type: Option<String>,
    pub event_date: DateTime<Utc>,
    /// Must not be after `event_date`.
    pub registration_deadline: DateTime<Utc>,
    #[schema(example = 2)]
    pub team_size_min: i32,
    #[schema(example = 4)]
    pub team_size_max: i32,
    #[schema(example = 100)]
    pub total_slots: i32,
    #[serde(default)]
    #[schema(example = 0)]
    pub registration_fee: i32,
    pub prize_money: Option<i32>,
    pub poster_url: Option<String>,
    pub description: String,
    /// Defaults to "Everyone can apply".
    pub eligibility: Option<String>,
    #[serde(default)]
    pub stages: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub dates_deadlines: String,
    #[serde(default)]
    pub prizes: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub custom_sections: Vec<CustomSection>,
    #[serde(default)]
    pub submission_type: SubmissionType,
}

/// Partial update. Only allowed while the event is pending review.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub organizer: Option<String>,
    pub location: Option<String>,
    pub event_type: Option<String>,
    pub event_date: Option<DateTime<Utc>>,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub team_size_min: Option<i32>,
    pub team_size_max: Option<i32>,
    pub total_slots: Option<i32>,
    pub registration_fee: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub prize_money: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub poster_url: Option<Option<String>>,
    pub description: Option<String>,
    pub eligibility: Option<String>,
    pub stages: Option<String>,
    pub details: Option<String>,
    pub dates_deadlines: Option<String>,
    pub prizes: Option<String>,
    pub tags: Option<Vec<String>>,
    pub custom_sections: Option<Vec<CustomSection>>,
    pub submission_type: Option<SubmissionType>,
}

/// Normalised, validated event fields shared by create and update.
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub title: String,
    pub organizer: String,
    pub location: String,
    pub event_type: String,
    pub event_date: DateTime<Utc>,
    pub registration_deadline: DateTime<Utc>,
    pub team_size_min: i32,
    pub team_size_max: i32,
    pub total_slots: i32,
    pub registration_fee: i32,
    pub prize_money: Option<i32>,
    pub poster_url: Option<String>,
    pub description: String,
    pub eligibility: String,
    pub stages: String,
    pub details: String,
    pub dates_deadlines: String,
    pub prizes: String,
    pub tags: Vec<String>,
    pub custom_sections: Vec<CustomSection>,
    pub submission_type: SubmissionType,
}

impl From<CreateEventRequest> for EventDraft {
    fn from(p: CreateEventRequest) -> Self {
        Self {
            title: p.title.trim().to_string(),
            organizer: p.organizer.trim().to_string(),
            location: p.location.trim().to_string(),
            event_type: non_blank(p.event_type.as_deref())
                .unwrap_or_else(|| DEFAULT_EVENT_TYPE.to_string()),
            event_date: p.event_date,
            registration_deadline: p.registration_deadline,
            team_size_min: p.team_size_min,
            team_size_max: p.team_size_max,
            total_slots: p.total_slots,
            registration_fee: p.registration_fee,
            prize_money: p.prize_money,
            poster_url: non_blank(p.poster_url.as_deref()),
            description: p.description.trim().to_string(),
            eligibility: non_blank(p.eligibility.as_deref())
                .unwrap_or_else(|| DEFAULT_ELIGIBILITY.to_string()),
            stages: p.stages.trim().to_string(),
            details: p.details.trim().to_string(),
            dates_deadlines: p.dates_deadlines.trim().to_string(),
            prizes: p.prizes.trim().to_string(),
            tags: normalize_tags(p.tags),
            custom_sections: normalize_sections(p.custom_sections),
            submission_type: p.submission_type,
        }
    }
}

impl UpdateEventRequest {
    /// Overlay the patch onto the stored event, yielding the full post-update state.
    pub fn merge(self, existing: &event::Model) -> EventDraft {
        let current = EventResponse::from(existing.clone());
        let trimmed = |v: Option<String>, old: String| v.map(|s| s.trim().to_string()).unwrap_or(old);
        EventDraft {
            title: trimmed(self.title, current.title),
            organizer: trimmed(self.organizer, current.organizer),
            location: trimmed(self.location, current.location),
            event_type: match self.event_type {
                Some(v) => non_blank(Some(&v)).unwrap_or_else(|| DEFAULT_EVENT_TYPE.to_string()),
                None => current.event_type,
            },
            event_date: self.event_date.unwrap_or(current.event_date),
            registration_deadline: self
                .registration_deadline
                .unwrap_or(current.registration_deadline),
            team_size_min: self.team_size_min.unwrap_or(current.team_size_min),
            team_size_max: self.team_size_max.unwrap_or(current.team_size_max),
            total_slots: self.total_slots.unwrap_or(current.total_slots),
            registration_fee: self.registration_fee.unwrap_or(current.registration_fee),
            prize_money: self.prize_money.unwrap_or(current.prize_money),
            poster_url: match self.poster_url {
                Some(v) => non_blank(v.as_deref()),
                None => current.poster_url,
            },
            description: trimmed(self.description, current.description),
            eligibility: match self.eligibility {
                Some(v) => non_blank(Some(&v)).unwrap_or_else(|| DEFAULT_ELIGIBILITY.to_string()),
                None => current.eligibility,
            },
            stages: trimmed(self.stages, current.stages),
            details: trimmed(self.details, current.details),
            dates_deadlines: trimmed(self.dates_deadlines, current.dates_deadlines),
            prizes: trimmed(self.prizes, current.prizes),
            tags: self.tags.map(normalize_tags).unwrap_or(current.tags),
            custom_sections: self
                .custom_sections
                .map(normalize_sections)
                .unwrap_or(current.custom_sections),
            submission_type: self.submission_type.unwrap_or(current.submission_type),
        }
    }
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

fn normalize_sections(sections: Vec<CustomSection>) -> Vec<CustomSection> {
    sections
        .into_iter()
        .map(|s| CustomSection {
            title: s.title.trim().to_string(),
            description: s.description.trim().to_string(),
        })
        .collect()
}

pub fn validate_event_draft(d: &EventDraft) -> Result<(), AppError> {
    check_required(&d.title, 200, "Event title").map_err(invalid)?;
    check_name(&d.organizer).map_err(invalid)?;
    check_required(&d.location, 300, "Location").map_err(invalid)?;
    if d.event_type.chars().count() > 100 {
        return Err(invalid("Event type must be less than 100 characters"));
    }
    if d.registration_deadline > d.event_date {
        return Err(invalid(
            "Registration deadline must be on or before the event date",
        ));
    }
    if d.team_size_min < 1 {
        return Err(invalid("Minimum team size must be at least 1"));
    }
    if d.team_size_max < 1 {
        return Err(invalid("Maximum team size must be at least 1"));
    }
    if d.team_size_max < d.team_size_min {
        return Err(invalid(
            "Maximum team size cannot be less than minimum team size",
        ));
    }
    if d.total_slots < 1 {
        return Err(invalid("Total slots must be at least 1"));
    }
    if d.registration_fee < 0 {
        return Err(invalid("Registration fee cannot be negative"));
    }
    if d.prize_money.is_some_and(|p| p < 0) {
        return Err(invalid("Prize money cannot be negative"));
    }
    check_optional_url(d.poster_url.as_deref()).map_err(invalid)?;
    check_required(&d.description, 2000, "Description").map_err(invalid)?;
    for (text, max) in [
        (&d.eligibility, 1000),
        (&d.stages, 1000),
        (&d.details, 2000),
        (&d.dates_deadlines, 1000),
        (&d.prizes, 1000),
    ] {
        check_text(text, max).map_err(invalid)?;
    }
    if d.tags.len() > MAX_TAGS {
        return Err(invalid(format!("At most {MAX_TAGS} tags are allowed")));
    }
    if d
        .tags
        .iter()
        .any(|t| t.is_empty() || t.chars().count() > MAX_TAG_LEN)
    {
        return Err(invalid(format!("Tags must be 1-{MAX_TAG_LEN} characters")));
    }
    if d.custom_sections.len() > MAX_CUSTOM_SECTIONS {
        return Err(invalid(format!(
            "At most {MAX_CUSTOM_SECTIONS} custom sections are allowed"
        )));
    }
    for section in &d.custom_sections {
        check_required(&section.title, 100, "Section title").map_err(invalid)?;
        check_text(&section.description, 2000).map_err(invalid)?;
    }
    Ok(())
}

fn tags_from_json(value: &serde_json::Value) -> Vec<String> {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

fn sections_from_json(value: &serde_json::Value) -> Vec<CustomSection> {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

/// Full event representation.
#[derive(Serialize, Clone, Debug, utoipa::ToSchema)]
pub struct EventResponse {
    pub id: i32,
    pub organizer_id: i32,
    pub title: String,
    pub organizer: String,
    pub location: String,
    pub event_type: String,
    pub event_date: DateTime<Utc>,
    pub registration_deadline: DateTime<Utc>,
    pub team_size_min: i32,
    pub team_size_max: i32,
    pub total_slots: i32,
    pub registered_count: i32,
    pub registration_fee: i32,
    pub prize_money: Option<i32>,
    pub poster_url: Option<String>,
    pub description: String,
    pub eligibility: String,
    pub stages: String,
    pub details: String,
    pub dates_deadlines: String,
    pub prizes: String,
    pub tags: Vec<String>,
    pub custom_sections: Vec<CustomSection>,
    pub submission_type: SubmissionType,
    pub approval_status: ApprovalStatus,
    pub rejection_reason: Option<String>,
    pub impressions: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<event::Model> for EventResponse {
    fn from(m: event::Model) -> Self {
        let tags = tags_from_json(&m.tags);
        let custom_sections = sections_from_json(&m.custom_sections);
        Self {
            id: m.id,
            organizer_id: m.organizer_id,
            title: m.title,
            organizer: m.organizer,
            location: m.location,
            event_type: m.event_type,
            event_date: m.event_date,
            registration_deadline: m.registration_deadline,
            team_size_min: m.team_size_min,
            team_size_max: m.team_size_max,
            total_slots: m.total_slots,
            registered_count: m.registered_count,
            registration_fee: m.registration_fee,
            prize_money: m.prize_money,
            poster_url: m.poster_url,
            description: m.description,
            eligibility: m.eligibility,
            stages: m.stages,
            details: m.details,
            dates_deadlines: m.dates_deadlines,
            prizes: m.prizes,
            tags,
            custom_sections,
            submission_type: m.submission_type,
            approval_status: m.approval_status,
            rejection_reason: m.rejection_reason,
            impressions: m.impressions,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Derived, read-only booleans over an event row.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, utoipa::ToSchema)]
pub struct EventFlags {
    pub deadline_passed: bool,
    pub slots_full: bool,
    /// Team size is fixed at one.
    pub is_individual: bool,
    pub registration_open: bool,
}

impl EventFlags {
    pub fn compute(event: &event::Model, now: DateTime<Utc>) -> Self {
        let deadline_passed = now > event.registration_deadline;
        let slots_full = event.registered_count >= event.total_slots;
        Self {
            deadline_passed,
            slots_full,
            is_individual: event.team_size_max == 1,
            registration_open: !deadline_passed && !slots_full,
        }
    }
}

/// Caller-specific state attached to an event detail when a session is present.
#[derive(Serialize, Debug, utoipa::ToSchema)]
pub struct ViewerState {
    pub is_registered: bool,
    pub in_wishlist: bool,
    /// Present only once the organizer has published results.
    pub result: Option<PublishedResult>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EventDetailResponse {
    #[serde(flatten)]
    pub event: EventResponse,
    pub flags: EventFlags,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer: Option<ViewerState>,
}

/// Card-sized event summary for listings.
#[derive(Serialize, Clone, Debug, utoipa::ToSchema)]
pub struct EventListItem {
    pub id: i32,
    pub title: String,
    pub organizer: String,
    pub location: String,
    pub event_type: String,
    pub event_date: DateTime<Utc>,
    pub registration_deadline: DateTime<Utc>,
    pub team_size_min: i32,
    pub team_size_max: i32,
    pub total_slots: i32,
    pub registered_count: i32,
    pub registration_fee: i32,
    pub prize_money: Option<i32>,
    pub poster_url: Option<String>,
    pub tags: Vec<String>,
    pub submission_type: SubmissionType,
    pub approval_status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
}

impl From<event::Model> for EventListItem {
    fn from(m: event::Model) -> Self {
        let tags = tags_from_json(&m.tags);
        Self {
            id: m.id,
            title: m.title,
            organizer: m.organizer,
            location: m.location,
            event_type: m.event_type,
            event_date: m.event_date,
            registration_deadline: m.registration_deadline,
            team_size_min: m.team_size_min,
            team_size_max: m.team_size_max,
            total_slots: m.total_slots,
            registered_count: m.registered_count,
            registration_fee: m.registration_fee,
            prize_money: m.prize_money,
            poster_url: m.poster_url,
            tags,
            submission_type: m.submission_type,
            approval_status: m.approval_status,
            created_at: m.created_at,
        }
    }
}

/// Query parameters for the public catalog.
#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventListQuery {
    /// Page number (default 1).
    pub page: Option<u64>,
    /// Items per page (default 20, max 100).
    pub per_page: Option<u64>,
    /// Case-insensitive title search.
    pub search: Option<String>,
    /// Exact event type, e.g. "Hackathon".
    pub event_type: Option<String>,
    /// Events carrying this tag.
    pub tag: Option<String>,
    /// `event_date` (default), `created_at`, `prize_money` or `title`.
    pub sort_by: Option<String>,
    /// `asc` (default) or `desc`.
    pub sort_order: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EventListResponse {
    pub data: Vec<EventListItem>,
    pub pagination: Pagination,
}

/// An organizer's events split by whether they are still ahead.
#[derive(Serialize, utoipa::ToSchema)]
pub struct OrganizerEventsResponse {
    pub upcoming: Vec<EventListItem>,
    pub past: Vec<EventListItem>,
}

/// Split events into upcoming (`event_date >= now`) and past, preserving order.
pub fn split_upcoming_past(
    events: Vec<event::Model>,
    now: DateTime<Utc>,
) -> OrganizerEventsResponse {
    let (upcoming, past): (Vec<_>, Vec<_>) =
        events.into_iter().partition(|e| e.event_date >= now);
    OrganizerEventsResponse {
        upcoming: upcoming.into_iter().map(EventListItem::from).collect(),
        past: past.into_iter().map(EventListItem::from).collect(),
    }
}
