//! Validation error types

use std::fmt;

/// A single violated rule on a student field
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Required field was not supplied
    Missing { field: &'static str },

    /// Field is empty (or only whitespace) when it shouldn't be
    Empty { field: &'static str },

    /// Field is shorter than its minimum length
    TooShort { field: &'static str, min: usize },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// String doesn't match required format
    InvalidFormat {
        field: &'static str,
        reason: &'static str,
    },

    /// Invalid enum variant
    InvalidVariant { field: &'static str, value: String },

    /// Numeric value outside its allowed range
    OutOfRange {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// Age derived from date of birth is outside the admitted window
    AgeOutOfRange { age: i32, min: i32, max: i32 },

    /// `later` must fall strictly after `earlier`
    DateOrder {
        earlier: &'static str,
        later: &'static str,
    },
}

impl ValidationError {
    /// Name of the field the violation is attached to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Missing { field }
            | Self::Empty { field }
            | Self::TooShort { field, .. }
            | Self::TooLong { field, .. }
            | Self::InvalidFormat { field, .. }
            | Self::InvalidVariant { field, .. }
            | Self::OutOfRange { field, .. } => field,
            Self::AgeOutOfRange { .. } => "date_of_birth",
            Self::DateOrder { later, .. } => later,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { field } => write!(f, "{} is required", field),
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::TooShort { field, min } => {
                write!(f, "{} must be at least {} characters", field, min)
            }
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::InvalidFormat { field, reason } => write!(f, "{}: {}", field, reason),
            Self::InvalidVariant { field, value } => {
                write!(f, "invalid {} value: '{}'", field, value)
            }
            Self::OutOfRange {
                field,
                value,
                reason,
            } => write!(f, "{} {} (got {})", field, reason, value),
            Self::AgeOutOfRange { age, min, max } => write!(
                f,
                "student age must be between {} and {} (got {})",
                min, max, age
            ),
            Self::DateOrder { earlier, later } => {
                write!(f, "{} must be later than {}", later, earlier)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Every rule a record violated, in the order the fields were checked
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    /// True if any violation is attached to `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field() == field)
    }

    pub fn into_vec(self) -> Vec<ValidationError> {
        self.0
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self(vec![error])
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
