use common::Role;
use sea_orm::{ConnectionTrait, EntityTrait};

use crate::entity::user_role;
use crate::error::AppError;
use crate::extractors::auth::AuthUser;

pub const UNVERIFIED_ROLE_NOTICE: &str = "Unable to verify your role";

/// Notice shown when a caller reaches a view meant for another role.
pub fn mismatch_notice(required: Role) -> String {
    format!("This page is only accessible to {required}s")
}

/// Decide access from the stored role record. `None` means no usable record.
pub fn check_role(stored: Option<Role>, required: Role) -> Result<(), AppError> {
    match stored {
        None => Err(AppError::AccessDenied(UNVERIFIED_ROLE_NOTICE.into())),
        Some(role) if role == required => Ok(()),
        Some(_) => Err(AppError::AccessDenied(mismatch_notice(required))),
    }
}

/// Read the caller's role record. Rows holding an unknown role name count as missing.
pub async fn lookup_role<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Option<Role>, AppError> {
    let record = user_role::Entity::find_by_id(user_id).one(db).await?;
    Ok(record.and_then(|r| match r.role.parse::<Role>() {
        Ok(role) => Some(role),
        Err(e) => {
            tracing::warn!(user_id, error = %e, "Ignoring unparseable role record");
            None
        }
    }))
}

/// Collapse a role lookup for gating purposes. A failed lookup is treated like a
/// missing record, so the caller is sent home rather than shown a server error.
pub fn gated_role(lookup: Result<Option<Role>, AppError>, user_id: i32) -> Option<Role> {
    lookup.unwrap_or_else(|e| {
        tracing::warn!(user_id, error = ?e, "Role lookup failed");
        None
    })
}

/// Gate a request on the caller's stored role.
///
/// The role is always re-read from the database; a token never carries it.
pub async fn require_role<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    required: Role,
) -> Result<(), AppError> {
    let stored = gated_role(lookup_role(db, auth_user.user_id).await, auth_user.user_id);
    check_role(stored, required).inspect_err(|_| {
        tracing::debug!(user_id = auth_user.user_id, %required, "Role gate denied access");
    })
}
