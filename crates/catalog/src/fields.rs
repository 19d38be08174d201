use hubledger_core::{DomainError, DomainResult};

/// Trim and require a non-empty value of at most `max` characters.
pub(crate) fn required(field: &str, value: &str, max: usize) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    bounded(field, value, max)
}

/// Trim an optional free-text value; empty is allowed.
pub(crate) fn optional(field: &str, value: &str, max: usize) -> DomainResult<String> {
    bounded(field, value.trim(), max)
}

fn bounded(field: &str, value: &str, max: usize) -> DomainResult<String> {
    let len = value.chars().count();
    if len > max {
        return Err(DomainError::validation(format!(
            "{field} must be at most {max} characters (got {len})"
        )));
    }
    Ok(value.to_string())
}
