//! User id handling.
//!
//! Users are opaque strings supplied by the caller. A missing or unusable id
//! is never an error for the caller: it is replaced by the default id.

use crate::error::ValidationError;

pub const DEFAULT_USER_ID: &str = "default_user";

const MAX_USER_ID_LEN: usize = 256;

/// Check a caller-supplied id. Surrounding whitespace is ignored.
pub fn validate_user_id(raw: &str) -> Result<&str, ValidationError> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(ValidationError::EmptyUserId);
    }
    if id.len() > MAX_USER_ID_LEN || id.chars().any(char::is_control) {
        return Err(ValidationError::InvalidUserId(id.to_string()));
    }
    Ok(id)
}

/// Resolve a possibly-missing id, falling back to `fallback`.
pub fn resolve_user_id_or(raw: Option<&str>, fallback: &str) -> String {
    match raw.map(validate_user_id) {
        Some(Ok(id)) => id.to_string(),
        Some(Err(err)) => {
            tracing::debug!(error = %err, fallback, "substituting default user id");
            fallback.to_string()
        }
        None => fallback.to_string(),
    }
}

/// Resolve a possibly-missing id, falling back to [`DEFAULT_USER_ID`].
pub fn resolve_user_id(raw: Option<&str>) -> String {
    resolve_user_id_or(raw, DEFAULT_USER_ID)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_blank_falls_back() {
        assert_eq!(resolve_user_id(None), "default_user");
        assert_eq!(resolve_user_id(Some("")), "default_user");
        assert_eq!(resolve_user_id(Some("   ")), "default_user");
    }

    #[test]
    fn valid_ids_are_trimmed() {
        assert_eq!(resolve_user_id(Some(" alice ")), "alice");
        assert_eq!(resolve_user_id_or(Some("bob"), "team"), "bob");
        assert_eq!(resolve_user_id_or(None, "team"), "team");
    }

    #[test]
    fn malformed_ids_are_rejected() {
        assert_eq!(
            validate_user_id("a\u{0}b"),
            Err(ValidationError::InvalidUserId("a\u{0}b".into()))
        );
        let long = "x".repeat(300);
        assert!(validate_user_id(&long).is_err());
        assert_eq!(resolve_user_id(Some("tab\there")), "default_user");
    }
}
