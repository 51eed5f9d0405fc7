use super::error::StorageError;

/// Validate an object key.
///
/// Keys are relative `/`-separated paths. Empty segments, `.`/`..` segments,
/// backslashes, NUL and other control characters are rejected so a key can never
/// resolve outside the store's root.
pub fn validate_key(key: &str) -> Result<&str, StorageError> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("key is empty".into()));
    }
    if key.len() > 512 {
        return Err(StorageError::InvalidKey("key is too long".into()));
    }
    if key.chars().any(|c| c.is_control() || c == '\\') {
        return Err(StorageError::InvalidKey(
            "key contains control characters or backslashes".into(),
        ));
    }
    for segment in key.split('/') {
        match segment {
            "" => {
                return Err(StorageError::InvalidKey(
                    "key has an empty or leading segment".into(),
                ));
            }
            "." | ".." => {
                return Err(StorageError::InvalidKey(
                    "key contains a relative segment".into(),
                ));
            }
            _ => {}
        }
    }
    Ok(key)
}
