/// Structured error types for studentdb-core.
///
/// Library consumers get `thiserror` enums; the CLI wraps them in `anyhow`.
use thiserror::Error;

use crate::models::ValidationErrors;

/// Main error type for studentdb-core operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration could not be assembled
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// An environment variable held a value that could not be parsed
    #[error("Invalid value for {var}: '{value}' ({reason})")]
    InvalidEnv {
        var: &'static str,
        value: String,
        reason: String,
    },

    /// Data generator asked for a locale it has no word lists for
    #[error("Unsupported locale '{locale}' (supported: {supported})")]
    UnsupportedLocale {
        locale: String,
        supported: &'static str,
    },

    /// A record failed validation
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),
}

/// Result type alias for studentdb-core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Create an invalid environment value error
    pub fn invalid_env(
        var: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidEnv {
            var,
            value: value.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValidationError;

    #[test]
    fn test_error_display() {
        let err = CoreError::invalid_env("DB_PORT", "abc", "invalid digit found in string");
        assert_eq!(
            err.to_string(),
            "Invalid value for DB_PORT: 'abc' (invalid digit found in string)"
        );

        let err = CoreError::config("missing host");
        assert!(err.to_string().contains("missing host"));
    }

    #[test]
    fn test_validation_error_conversion() {
        let errors = ValidationErrors::from(ValidationError::Missing { field: "name" });
        let err: CoreError = errors.into();

        assert!(matches!(err, CoreError::Validation(_)));
        assert!(err.to_string().contains("name is required"));
    }
}
