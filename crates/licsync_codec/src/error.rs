//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur when validating or naming record fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A field value contains a line break, which the text format cannot carry.
    #[error("value for {field} contains a line break")]
    LineBreakInValue {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A field name did not match any known record field.
    #[error("unknown field: {name}")]
    UnknownField {
        /// The name that was given.
        name: String,
    },

    /// An expiry string could not be parsed.
    #[error("invalid expiry '{value}', expected YYYY-MM-DD HH:MM")]
    InvalidExpiry {
        /// The rejected value.
        value: String,
    },
}

impl CodecError {
    /// Create an unknown field error.
    pub fn unknown_field(name: impl Into<String>) -> Self {
        Self::UnknownField { name: name.into() }
    }

    /// Create an invalid expiry error.
    pub fn invalid_expiry(value: impl Into<String>) -> Self {
        Self::InvalidExpiry {
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CodecError::LineBreakInValue { field: "USER" };
        assert_eq!(err.to_string(), "value for USER contains a line break");

        let err = CodecError::unknown_field("COLOR");
        assert!(err.to_string().contains("COLOR"));
    }
}
