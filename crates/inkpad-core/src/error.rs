use thiserror::Error;

/// Core error types for Inkpad operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid DateTime: {0}")]
    InvalidDateTime(String),

    #[error("Invalid {field}: {message}")]
    InvalidField { field: String, message: String },
}

impl CoreError {
    /// Create a new InvalidDateTime error
    pub fn invalid_date_time(datetime: impl Into<String>) -> Self {
        Self::InvalidDateTime(datetime.into())
    }

    /// Create a new InvalidField error
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidDateTime(_) => ErrorCategory::Parse,
            Self::InvalidField { .. } => ErrorCategory::Validation,
        }
    }
}

/// Error categories for log classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A value could not be read in its wire representation.
    Parse,
    /// A well-formed value broke an input rule.
    Validation,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse => write!(f, "parse"),
            Self::Validation => write!(f, "validation"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_field_error() {
        let err = CoreError::invalid_field("email", "must not be empty");
        assert_eq!(err.to_string(), "Invalid email: must not be empty");
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_unreadable_values_are_parse_errors() {
        assert_eq!(
            CoreError::invalid_date_time("yesterday").category(),
            ErrorCategory::Parse
        );
    }

    #[test]
    fn test_error_categories_display() {
        assert_eq!(ErrorCategory::Validation.to_string(), "validation");
        assert_eq!(ErrorCategory::Parse.to_string(), "parse");
    }
}
