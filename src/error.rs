//! Error types for the validation engine

use thiserror::Error;

use crate::decode::DecodeError;

/// Result type for validation operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Validation engine errors
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Input was decoded and rejected; carries every collected error.
    #[error("Validation failed with {} error(s)", .0.len())]
    Validation(Vec<DecodeError>),

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Duplicate field '{field}' in model {model}")]
    DuplicateField { model: String, field: String },

    #[error("Unknown field '{name}'{}", suggestion_suffix(.suggestion))]
    UnknownField {
        name: String,
        suggestion: Option<String>,
    },

    #[error("Invalid model metadata: {0}")]
    InvalidModel(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SchemaError {
    /// Decode errors carried by a validation failure, if this is one
    pub fn decode_errors(&self) -> Option<&[DecodeError]> {
        match self {
            SchemaError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{}'?)", s),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_field_display() {
        let err = SchemaError::UnknownField {
            name: "emial".to_string(),
            suggestion: Some("email".to_string()),
        };
        assert_eq!(err.to_string(), "Unknown field 'emial' (did you mean 'email'?)");

        let err = SchemaError::UnknownField {
            name: "zzz".to_string(),
            suggestion: None,
        };
        assert_eq!(err.to_string(), "Unknown field 'zzz'");
    }

    #[test]
    fn test_validation_display_counts_errors() {
        let err = SchemaError::Validation(vec![
            DecodeError::new("a"),
            DecodeError::new("b"),
        ]);
        assert_eq!(err.to_string(), "Validation failed with 2 error(s)");
        assert_eq!(err.decode_errors().map(|e| e.len()), Some(2));
    }
}
