use common::ApprovalStatus;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::shared::invalid;

const MAX_REASON: usize = 1000;

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminEventListQuery {
    /// Only events in this approval state.
    pub status: Option<ApprovalStatus>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RejectEventRequest {
    #[schema(example = "Missing venue details")]
    pub reason: String,
}

/// Trimmed rejection reason, required and at most 1000 characters.
pub fn validate_rejection_reason(reason: &str) -> Result<String, AppError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(invalid("Please provide a reason for rejection"));
    }
    if reason.chars().count() > MAX_REASON {
        return Err(invalid(format!(
            "Rejection reason must be less than {MAX_REASON} characters"
        )));
    }
    Ok(reason.to_string())
}

/// Refuse any review of an event that has already left `pending`.
pub fn ensure_reviewable(current: ApprovalStatus, next: ApprovalStatus) -> Result<(), AppError> {
    if current.can_transition_to(next) {
        Ok(())
    } else {
        Err(AppError::Conflict("Event has already been reviewed".into()))
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AdminStats {
    pub total_events: u64,
    pub pending_approvals: u64,
    pub total_users: u64,
    pub total_registrations: u64,
}
