//! Validation error types

/// Validation error for request payloads
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Field exceeds the column width
    #[error("{field} exceeds maximum length of {max} characters")]
    TooLong { field: &'static str, max: usize },
}

/// Check a free-text field against the width of its column.
///
/// Length is measured in characters, matching `VARCHAR(n)` semantics.
pub(crate) fn bounded_text(
    value: &str,
    field: &'static str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ValidationError::TooLong {
            field: "content",
            max: 255,
        };
        assert_eq!(
            err.to_string(),
            "content exceeds maximum length of 255 characters"
        );
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let snowmen = "☃".repeat(10);
        assert!(bounded_text(&snowmen, "content", 10).is_ok());
        assert_eq!(
            bounded_text(&snowmen, "content", 9),
            Err(ValidationError::TooLong { field: "content", max: 9 })
        );
    }

    #[test]
    fn whitespace_only_is_empty() {
        assert_eq!(
            bounded_text("  \t", "username", 50),
            Err(ValidationError::Empty { field: "username" })
        );
    }
}
