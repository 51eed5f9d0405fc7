use axum::Json;
use axum::body::Body;
use axum::extract::multipart::Field;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use common::Role;
use common::storage::ObjectStore;
use sea_orm::*;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::entity::{registration, submission};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::shared::non_blank;
use crate::models::submission::*;
use crate::state::AppState;
use crate::utils::event::find_approved_event;
use crate::utils::role_gate::require_role;

/// Multipart framing and the link field on top of the largest allowed archive.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn submission_body_limit(max_upload_size: u64) -> DefaultBodyLimit {
    let max = usize::try_from(max_upload_size).unwrap_or(usize::MAX);
    DefaultBodyLimit::max(max.saturating_add(MULTIPART_OVERHEAD))
}

/// A file accepted into the object store but not yet referenced by a row.
struct StagedUpload {
    key: String,
    url: String,
    sha256: String,
}

struct ReceivedFile {
    filename: Option<String>,
    bytes: Vec<u8>,
}

/// Read a file part chunk by chunk, refusing to buffer more than `limit` bytes.
async fn read_file_field(mut field: Field<'_>, limit: u64) -> Result<ReceivedFile, AppError> {
    let filename = field.file_name().map(str::to_string);
    let mut bytes = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?
    {
        if (bytes.len() + chunk.len()) as u64 > limit {
            return Err(AppError::PayloadTooLarge(format!(
                "File exceeds the {limit} byte limit"
            )));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(ReceivedFile { filename, bytes })
}

/// Remove an object whose row write failed. Failure only leaves an orphan file.
async fn discard_upload(storage: &dyn ObjectStore, key: &str) {
    match storage.delete(key).await {
        Ok(_) => tracing::warn!(key, "Removed upload after failed submission write"),
        Err(e) => tracing::warn!(key, error = %e, "Failed to remove orphaned upload"),
    }
}

/// The previous object to delete after a replacement. Two uploads in the same
/// millisecond share a key, and then the old object is the new one.
fn superseded_key(replaced: Option<String>, upload: Option<&StagedUpload>) -> Option<String> {
    replaced.filter(|old| upload.is_none_or(|u| u.key != *old))
}

async fn find_submission_for_update<C: ConnectionTrait>(
    db: &C,
    registration_id: i32,
) -> Result<Option<submission::Model>, DbErr> {
    submission::Entity::find()
        .filter(submission::Column::RegistrationId.eq(registration_id))
        .lock(sea_orm::sea_query::LockType::Update)
        .one(db)
        .await
}

fn locked_error() -> AppError {
    AppError::Conflict("Submission has been evaluated and cannot be modified".into())
}

/// Insert or update the row inside one transaction. Returns the saved row, the
/// key of a file it replaced, and whether the row is new.
async fn save_submission(
    db: &DatabaseConnection,
    reg: &registration::Model,
    github_link: Option<String>,
    upload: Option<&StagedUpload>,
    now: DateTime<Utc>,
) -> Result<(submission::Model, Option<String>, bool), AppError> {
    let txn = db.begin().await?;
    let existing = find_submission_for_update(&txn, reg.id).await?;

    let (saved, replaced, created) = match existing {
        Some(current) => {
            if is_locked(&current) {
                return Err(locked_error());
            }
            let replaced = upload.and(current.file_key.clone());
            let mut active: submission::ActiveModel = current.into();
            active.github_link = Set(github_link);
            if let Some(upload) = upload {
                active.file_url = Set(Some(upload.url.clone()));
                active.file_key = Set(Some(upload.key.clone()));
                active.file_sha256 = Set(Some(upload.sha256.clone()));
            }
            active.updated_at = Set(now);
            (active.update(&txn).await?, replaced, false)
        }
        None => {
            let model = submission::ActiveModel {
                registration_id: Set(reg.id),
                event_id: Set(reg.event_id),
                github_link: Set(github_link),
                file_url: Set(upload.map(|u| u.url.clone())),
                file_key: Set(upload.map(|u| u.key.clone())),
                file_sha256: Set(upload.map(|u| u.sha256.clone())),
                rating: Set(None),
                is_selected_for_next_round: Set(false),
                result_published: Set(false),
                evaluation_notes: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(
                    "Submission was modified concurrently, please retry".into(),
                ),
                _ => AppError::from(e),
            })?;
            (model, None, true)
        }
    };

    txn.commit().await?;
    Ok((saved, replaced, created))
}

async fn find_registration(
    db: &DatabaseConnection,
    event_id: i32,
    user_id: i32,
) -> Result<registration::Model, AppError> {
    registration::Entity::find()
        .filter(registration::Column::EventId.eq(event_id))
        .filter(registration::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Not registered for this event".into()))
}

#[utoipa::path(
    get,
    path = "/{id}/submission",
    tag = "Submissions",
    operation_id = "getMySubmission",
    summary = "The caller's submission for an event",
    description = "Returns the stored artifacts, the derived state and whether the form is locked. The evaluation is included only after results are published.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Submission state", body = MySubmissionResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a student (ACCESS_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found or not registered (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, event_id))]
pub async fn get_my_submission(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
) -> Result<Json<MySubmissionResponse>, AppError> {
    require_role(&state.db, &auth_user, Role::Student).await?;
    let event = find_approved_event(&state.db, event_id).await?;
    let reg = find_registration(&state.db, event_id, auth_user.user_id).await?;
    let current = submission::Entity::find()
        .filter(submission::Column::RegistrationId.eq(reg.id))
        .one(&state.db)
        .await?;
    Ok(Json(MySubmissionResponse::new(
        event.id,
        event.submission_type,
        current,
    )))
}

#[utoipa::path(
    put,
    path = "/{id}/submission",
    tag = "Submissions",
    operation_id = "upsertSubmission",
    summary = "Create or update the caller's submission",
    description = "Multipart form with an optional `github_link` text part and an optional `file` part (a .zip archive). \
        Which parts are required follows the event's submission type; a previously uploaded file satisfies the file requirement. \
        Rated submissions are locked. If the row write fails, the freshly uploaded file is removed again.",
    params(("id" = i32, Path, description = "Event ID")),
    request_body(content_type = "multipart/form-data", description = "`github_link` and/or `file`"),
    responses(
        (status = 200, description = "Submission updated", body = MySubmissionResponse),
        (status = 201, description = "Submission created", body = MySubmissionResponse),
        (status = 400, description = "Policy or validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a student (ACCESS_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found or not registered (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Submission locked after evaluation (CONFLICT)", body = ErrorBody),
        (status = 413, description = "File too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id, event_id))]
pub async fn upsert_submission(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    require_role(&state.db, &auth_user, Role::Student).await?;
    let event = find_approved_event(&state.db, event_id).await?;
    let reg = find_registration(&state.db, event_id, auth_user.user_id).await?;

    let existing = submission::Entity::find()
        .filter(submission::Column::RegistrationId.eq(reg.id))
        .one(&state.db)
        .await?;
    if existing.as_ref().is_some_and(is_locked) {
        return Err(locked_error());
    }

    let mut github_link: Option<String> = None;
    let mut file: Option<ReceivedFile> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("github_link") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read github_link: {e}")))?;
                github_link = non_blank(Some(&text));
            }
            Some("file") => {
                let received =
                    read_file_field(field, state.config.storage.max_upload_size).await?;
                // Browsers send an empty part when no file was picked.
                if !received.bytes.is_empty()
                    || received.filename.as_deref().is_some_and(|f| !f.is_empty())
                {
                    file = Some(received);
                }
            }
            _ => {} // Ignore unknown fields.
        }
    }

    let parts = SubmissionParts {
        github_link: github_link.clone(),
        has_file: file.is_some(),
    };
    let stored_file = existing.as_ref().is_some_and(|s| s.file_key.is_some());
    check_submission_policy(event.submission_type, &parts, stored_file)?;

    let now = Utc::now();
    let upload = match file {
        Some(received) => {
            validate_zip_upload(received.filename.as_deref(), &received.bytes)?;
            let key = submission_file_key(auth_user.user_id, event_id, now);
            state.storage.put(&key, &received.bytes).await?;
            Some(StagedUpload {
                url: state.storage.public_url(&key),
                sha256: sha256_hex(&received.bytes),
                key,
            })
        }
        None => None,
    };

    let (saved, replaced, created) =
        match save_submission(&state.db, &reg, github_link, upload.as_ref(), now).await {
            Ok(result) => result,
            Err(e) => {
                if let Some(upload) = &upload {
                    discard_upload(&*state.storage, &upload.key).await;
                }
                return Err(e);
            }
        };

    if let Some(old_key) = superseded_key(replaced, upload.as_ref())
        && let Err(e) = state.storage.delete(&old_key).await
    {
        tracing::warn!(key = %old_key, error = %e, "Failed to delete replaced upload");
    }

    tracing::info!(
        submission_id = saved.id,
        registration_id = reg.id,
        created,
        has_file = saved.file_key.is_some(),
        "Submission saved"
    );

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(MySubmissionResponse::new(
            event.id,
            event.submission_type,
            Some(saved),
        )),
    ))
}

/// Serve a stored object. Target of the public URLs the filesystem backend hands out.
#[instrument(skip(state))]
pub async fn download_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let reader = state.storage.get_stream(&key).await?;
    let content_type = mime_guess::from_path(&key).first_or_octet_stream();
    let filename: String = key
        .rsplit('/')
        .next()
        .unwrap_or("download")
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';'))
        .collect();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.as_ref())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(Body::from_stream(ReaderStream::new(reader)))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
