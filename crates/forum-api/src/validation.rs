use crate::error::{HttpError, ServiceError};

/// Rejects empty or whitespace-only text with `"{field} is required"`.
pub(crate) fn require_text(value: &str, field: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::validation(format!("{field} is required")));
    }
    Ok(())
}

/// Parses the `user_id` query parameter used for ownership checks.
pub(crate) fn parse_user_id(raw: Option<&str>) -> Result<i64, HttpError> {
    let raw = raw
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HttpError::bad_request("user_id query parameter required"))?;
    raw.parse()
        .map_err(|_| HttpError::bad_request("Invalid user_id"))
}
