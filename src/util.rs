//! Input validation and timestamp helpers shared across the service layer.

use chrono::{DateTime, Utc};

use crate::error::CoreError;

/// Format a UTC instant as the canonical stored timestamp.
///
/// Every timestamp written to the database goes through this function so that
/// stored values compare lexicographically in chronological order.
pub fn fmt_utc(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Parse a caller-supplied RFC3339 timestamp and normalize it to UTC.
pub fn parse_utc(value: &str, field: &'static str) -> Result<DateTime<Utc>, CoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| CoreError::invalid(field, format!("not an RFC3339 timestamp: {value}")))
}

/// Validate that a string, after trimming, has a length in `[min, max]`.
/// Returns the trimmed value.
pub fn validate_bounded_string(
    value: &str,
    field: &'static str,
    min: usize,
    max: usize,
) -> Result<String, CoreError> {
    let trimmed = value.trim();
    if trimmed.len() < min {
        return Err(CoreError::invalid(
            field,
            format!("must be at least {min} characters"),
        ));
    }
    if trimmed.len() > max {
        return Err(CoreError::invalid(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

/// Validate an opaque record id: non-empty, bounded, no whitespace or SQL noise.
/// Accepts UUIDs and kebab-case slugs.
pub fn validate_id_slug(value: &str, field: &'static str) -> Result<(), CoreError> {
    if value.is_empty() || value.len() > 64 {
        return Err(CoreError::invalid(
            field,
            "must be 1-64 characters".to_string(),
        ));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(CoreError::invalid(
            field,
            format!("contains invalid characters: {value}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_string_trims() {
        let v = validate_bounded_string("  Jamie  ", "firstName", 1, 80).unwrap();
        assert_eq!(v, "Jamie");
    }

    #[test]
    fn test_bounded_string_rejects_empty() {
        let err = validate_bounded_string("   ", "title", 1, 280).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_bounded_string_rejects_too_long() {
        let long = "x".repeat(300);
        assert!(validate_bounded_string(&long, "title", 1, 280).is_err());
    }

    #[test]
    fn test_id_slug_accepts_uuid() {
        validate_id_slug("5ffdc172-9c9c-4f52-bf37-3a8a762c1f31", "leadId").unwrap();
    }

    #[test]
    fn test_id_slug_rejects_whitespace_and_quotes() {
        assert!(validate_id_slug("bad id", "leadId").is_err());
        assert!(validate_id_slug("bad'id", "leadId").is_err());
        assert!(validate_id_slug("", "leadId").is_err());
    }

    #[test]
    fn test_parse_utc_normalizes_offset() {
        let dt = parse_utc("2025-06-01T02:00:00-05:00", "dueAt").unwrap();
        assert_eq!(fmt_utc(dt), "2025-06-01T07:00:00+00:00");
    }

    #[test]
    fn test_parse_utc_rejects_garbage() {
        assert!(parse_utc("tomorrow", "dueAt").is_err());
        assert!(parse_utc("2025-06-01", "dueAt").is_err());
    }
}
