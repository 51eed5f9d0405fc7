use std::io::Cursor;

use chrono::{DateTime, Utc};
use common::SubmissionType;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::entity::submission;
use crate::error::AppError;
use crate::models::shared::{check_url, invalid};

/// Where a registration's submission stands, as shown to its owner.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    NotSubmitted,
    Submitted,
    Evaluated,
    ResultPublished,
}

impl SubmissionState {
    pub fn of(submission: Option<&submission::Model>) -> Self {
        match submission {
            None => Self::NotSubmitted,
            Some(s) if s.result_published => Self::ResultPublished,
            Some(s) if s.rating.is_some() => Self::Evaluated,
            Some(_) => Self::Submitted,
        }
    }
}

/// A rated submission can no longer be changed by its owner.
pub fn is_locked(submission: &submission::Model) -> bool {
    submission.rating.is_some()
}

/// Evaluation outcome visible to the student once published.
#[derive(Serialize, Clone, Debug, PartialEq, Eq, utoipa::ToSchema)]
pub struct PublishedResult {
    /// `None` when results were published before this submission was rated.
    pub rating: Option<i32>,
    pub is_selected_for_next_round: bool,
    pub evaluation_notes: Option<String>,
}

impl PublishedResult {
    pub fn of(submission: &submission::Model) -> Option<Self> {
        submission.result_published.then(|| Self {
            rating: submission.rating,
            is_selected_for_next_round: submission.is_selected_for_next_round,
            evaluation_notes: submission.evaluation_notes.clone(),
        })
    }
}

#[derive(Serialize, Clone, Debug, utoipa::ToSchema)]
pub struct SubmissionDetail {
    pub id: i32,
    pub github_link: Option<String>,
    pub file_url: Option<String>,
    pub file_sha256: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The caller's submission for one event.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MySubmissionResponse {
    pub event_id: i32,
    pub submission_type: SubmissionType,
    pub state: SubmissionState,
    /// True once rated; the form must be read-only.
    pub locked: bool,
    pub submission: Option<SubmissionDetail>,
    pub result: Option<PublishedResult>,
}

impl MySubmissionResponse {
    pub fn new(
        event_id: i32,
        submission_type: SubmissionType,
        submission: Option<submission::Model>,
    ) -> Self {
        let state = SubmissionState::of(submission.as_ref());
        let locked = submission.as_ref().is_some_and(is_locked);
        let result = submission.as_ref().and_then(PublishedResult::of);
        Self {
            event_id,
            submission_type,
            state,
            locked,
            result,
            submission: submission.map(|s| SubmissionDetail {
                id: s.id,
                github_link: s.github_link,
                file_url: s.file_url,
                file_sha256: s.file_sha256,
                created_at: s.created_at,
                updated_at: s.updated_at,
            }),
        }
    }
}

/// The parts present in one upload request.
#[derive(Debug, Default)]
pub struct SubmissionParts {
    pub github_link: Option<String>,
    pub has_file: bool,
}

/// Check the upload against the event's submission policy.
///
/// `stored_file` is whether a previous upload already satisfies the file requirement.
pub fn check_submission_policy(
    policy: SubmissionType,
    parts: &SubmissionParts,
    stored_file: bool,
) -> Result<(), AppError> {
    if !policy.accepts_submissions() {
        return Err(invalid("This event does not accept submissions"));
    }
    if parts.github_link.is_some() && !policy.requires_github_link() {
        return Err(invalid("This event does not accept GitHub links"));
    }
    if parts.has_file && !policy.requires_file() {
        return Err(invalid("This event does not accept file uploads"));
    }
    if policy.requires_github_link() && parts.github_link.is_none() {
        return Err(invalid("Please provide a GitHub link"));
    }
    if policy.requires_file() && !parts.has_file && !stored_file {
        return Err(invalid("Please upload a file"));
    }
    if let Some(link) = parts.github_link.as_deref() {
        check_url(link).map_err(invalid)?;
    }
    Ok(())
}

/// Accept only `.zip` filenames whose bytes open as a zip archive.
pub fn validate_zip_upload(filename: Option<&str>, bytes: &[u8]) -> Result<(), AppError> {
    let is_zip_name = filename
        .and_then(|f| f.rsplit_once('.'))
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("zip"));
    if !is_zip_name {
        return Err(invalid("Only .zip files are accepted"));
    }
    if bytes.is_empty() {
        return Err(invalid("Uploaded file is empty"));
    }
    zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|_| invalid("Uploaded file is not a valid zip archive"))?;
    Ok(())
}

/// Object key for an upload: `{user_id}/{event_id}/{unix_millis}.zip`.
pub fn submission_file_key(user_id: i32, event_id: i32, at: DateTime<Utc>) -> String {
    format!("{user_id}/{event_id}/{}.zip", at.timestamp_millis())
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
