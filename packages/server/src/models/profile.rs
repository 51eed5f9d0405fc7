use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{organizer, profile};
use crate::error::AppError;
use crate::models::shared::{
    check_email, check_name, check_optional_url, check_phone, check_required, check_text, invalid,
    non_blank,
};

pub const PASSOUT_YEAR_MIN: i32 = 2020;
pub const PASSOUT_YEAR_MAX: i32 = 2040;

/// Student profile upsert body.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct StudentProfileRequest {
    #[schema(example = "Ana Lima")]
    pub full_name: String,
    #[schema(example = "State Institute of Technology")]
    pub college_name: String,
    #[schema(example = "B.Tech Computer Science")]
    pub degree: String,
    /// 2020-2040.
    #[schema(example = 2026)]
    pub passout_year: i32,
    /// How the student heard about the portal.
    #[schema(example = "A friend")]
    pub heard_from: String,
}

pub fn validate_student_profile(payload: &StudentProfileRequest) -> Result<(), AppError> {
    check_name(&payload.full_name).map_err(invalid)?;
    check_required(&payload.college_name, 200, "College name").map_err(invalid)?;
    check_required(&payload.degree, 100, "Degree").map_err(invalid)?;
    if payload.passout_year < PASSOUT_YEAR_MIN {
        return Err(invalid(format!("Year must be {PASSOUT_YEAR_MIN} or later")));
    }
    if payload.passout_year > PASSOUT_YEAR_MAX {
        return Err(invalid(format!("Year must be {PASSOUT_YEAR_MAX} or earlier")));
    }
    if payload.heard_from.trim().is_empty() {
        return Err(invalid("This field is required"));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct StudentProfileResponse {
    pub full_name: String,
    pub college_name: String,
    pub degree: String,
    pub passout_year: i32,
    pub heard_from: String,
    pub updated_at: DateTime<Utc>,
}

impl From<profile::Model> for StudentProfileResponse {
    fn from(m: profile::Model) -> Self {
        Self {
            full_name: m.full_name,
            college_name: m.college_name,
            degree: m.degree,
            passout_year: m.passout_year,
            heard_from: m.heard_from,
            updated_at: m.updated_at,
        }
    }
}

/// Organizer profile upsert body.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct OrganizerProfileRequest {
    #[schema(example = "Campus Coding Club")]
    pub organization_name: String,
    #[schema(example = "events@codingclub.org")]
    pub contact_email: String,
    /// Exactly 10 digits when present.
    #[schema(example = "9876543210")]
    pub contact_phone: Option<String>,
    #[schema(example = "https://codingclub.org")]
    pub website: Option<String>,
    #[serde(default)]
    pub description: String,
}

pub fn validate_organizer_profile(payload: &OrganizerProfileRequest) -> Result<(), AppError> {
    check_required(&payload.organization_name, 200, "Organization name").map_err(invalid)?;
    check_email(&payload.contact_email).map_err(invalid)?;
    if let Some(phone) = non_blank(payload.contact_phone.as_deref()) {
        check_phone(&phone).map_err(invalid)?;
    }
    check_optional_url(payload.website.as_deref()).map_err(invalid)?;
    check_text(&payload.description, 1000).map_err(invalid)?;
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct OrganizerProfileResponse {
    pub id: i32,
    pub organization_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub website: Option<String>,
    pub description: String,
    pub updated_at: DateTime<Utc>,
}

impl From<organizer::Model> for OrganizerProfileResponse {
    fn from(m: organizer::Model) -> Self {
        Self {
            id: m.id,
            organization_name: m.organization_name,
            contact_email: m.contact_email,
            contact_phone: m.contact_phone,
            website: m.website,
            description: m.description,
            updated_at: m.updated_at,
        }
    }
}
