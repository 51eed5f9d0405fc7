use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)+$")
        .expect("email pattern compiles")
});
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("phone pattern compiles"));
static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://[^\s/?#:@]+(?::[0-9]{1,5})?(?:[/?#]\S*)?$").expect("url pattern compiles")
});

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 20)]
    pub per_page: u64,
    /// Total number of matching items across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// Total number of pages.
    #[schema(example = 3)]
    pub total_pages: u64,
}

/// Row offset for a 1-based page, clamped to what a Postgres `OFFSET` accepts.
pub fn page_offset(page: u64, per_page: u64) -> u64 {
    page.saturating_sub(1)
        .saturating_mul(per_page)
        .min(i64::MAX as u64)
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Trim an optional string; blank becomes `None`.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn invalid(message: impl Into<String>) -> AppError {
    AppError::Validation(message.into())
}

/// Field rules return the bare message; callers decide whether to prefix it.
pub type FieldResult = Result<(), String>;

/// Trimmed, non-empty, at most `max` characters.
pub fn check_required(value: &str, max: usize, label: &str) -> FieldResult {
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("{label} is required"));
    }
    if value.chars().count() > max {
        return Err(format!("{label} must be less than {max} characters"));
    }
    Ok(())
}

/// Optional free text of at most `max` characters.
pub fn check_text(value: &str, max: usize) -> FieldResult {
    if value.trim().chars().count() > max {
        return Err(format!("Text must be less than {max} characters"));
    }
    Ok(())
}

pub fn check_name(value: &str) -> FieldResult {
    check_required(value, 100, "Name")
}

pub fn check_email(value: &str) -> FieldResult {
    let value = value.trim();
    if !EMAIL_RE.is_match(value) {
        return Err("Invalid email address".into());
    }
    if value.chars().count() > 255 {
        return Err("Email must be less than 255 characters".into());
    }
    Ok(())
}

/// Exactly ten ASCII digits.
pub fn check_phone(value: &str) -> FieldResult {
    if !PHONE_RE.is_match(value.trim()) {
        return Err("Phone number must be exactly 10 digits".into());
    }
    Ok(())
}

/// http(s) URL of at most 500 characters.
pub fn check_url(value: &str) -> FieldResult {
    let value = value.trim();
    if !URL_RE.is_match(value) {
        return Err("Invalid URL".into());
    }
    if value.chars().count() > 500 {
        return Err("URL must be less than 500 characters".into());
    }
    Ok(())
}

/// Blank optional URLs are accepted and stored as NULL.
pub fn check_optional_url(value: Option<&str>) -> FieldResult {
    match non_blank(value) {
        Some(url) => check_url(&url),
        None => Ok(()),
    }
}
