//! Validation functionality
//!
//! Provides the [`Validator`] capability consumed by the engine before a payload
//! is decomposed:
//! - Structural validation of column payloads (always available)
//! - JSON Schema validation of config sets (`schema-validation` feature)

#[cfg(feature = "schema-validation")]
pub mod schema;
pub mod structural;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::models::ColumnType;

pub use structural::StructuralValidator;
#[cfg(feature = "schema-validation")]
pub use schema::SchemaValidator;

/// Field-level validation error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Dotted path into the payload, e.g. `R1.neighbors.ipv4`
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Accepts or rejects a column payload against its declared shape
pub trait Validator: Send + Sync {
    /// Validate `payload` (`set_id -> set_data`); an empty list means valid
    fn validate(&self, column: ColumnType, payload: &Value) -> Vec<FieldError>;
}

/// Runs several validators and concatenates their errors
pub struct ChainValidator {
    validators: Vec<Box<dyn Validator>>,
}

impl ChainValidator {
    pub fn new(validators: Vec<Box<dyn Validator>>) -> Self {
        Self { validators }
    }
}

impl Validator for ChainValidator {
    fn validate(&self, column: ColumnType, payload: &Value) -> Vec<FieldError> {
        let mut errors = Vec::new();
        for validator in &self.validators {
            errors.extend(validator.validate(column, payload));
            // later validators assume the structure is sound
            if !errors.is_empty() {
                break;
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct RejectAll;

    impl Validator for RejectAll {
        fn validate(&self, _column: ColumnType, _payload: &Value) -> Vec<FieldError> {
            vec![FieldError::new("root", "rejected")]
        }
    }

    #[test]
    fn test_chain_stops_at_first_failure() {
        let chain = ChainValidator::new(vec![
            Box::new(StructuralValidator::new("_")),
            Box::new(RejectAll),
        ]);

        let errors = chain.validate(ColumnType::Bgp, &json!("not an object"));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "");

        let errors = chain.validate(ColumnType::Bgp, &json!({"R1": {}}));
        assert_eq!(errors, vec![FieldError::new("root", "rejected")]);
    }
}
