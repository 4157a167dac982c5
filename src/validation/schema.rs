//! JSON Schema validation of config sets
//!
//! Each column may register a JSON Schema that every config set of that column
//! must satisfy. Gated by the `schema-validation` feature.

use jsonschema::Validator as CompiledSchema;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use super::{FieldError, Validator};
use crate::models::ColumnType;

/// Format validation error with path information
fn format_validation_error(set_id: &str, error: &jsonschema::ValidationError) -> FieldError {
    let instance_path = error.instance_path().to_string();
    let path = if instance_path == "/" || instance_path.is_empty() {
        set_id.to_string()
    } else {
        format!(
            "{}.{}",
            set_id,
            instance_path.trim_start_matches('/').replace('/', ".")
        )
    };
    FieldError::new(path, error.to_string())
}

/// Validates config sets against per-column JSON Schemas
#[derive(Default)]
pub struct SchemaValidator {
    schemas: BTreeMap<ColumnType, CompiledSchema>,
}

impl SchemaValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the schema every set of `column` must satisfy
    pub fn with_schema(mut self, column: ColumnType, schema: &Value) -> Result<Self, String> {
        let compiled = CompiledSchema::new(schema)
            .map_err(|e| format!("Failed to compile {} schema: {}", column, e))?;
        self.schemas.insert(column, compiled);
        Ok(self)
    }

    /// Load `<column>.schema.json` files from a directory; missing files are skipped
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, String> {
        let dir = dir.as_ref();
        let mut validator = Self::new();
        for column in ColumnType::ALL {
            let path = dir.join(format!("{}.schema.json", column));
            if !path.exists() {
                continue;
            }
            let content = std::fs::read_to_string(&path)
                .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
            let schema: Value = serde_json::from_str(&content)
                .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;
            validator = validator.with_schema(column, &schema)?;
        }
        Ok(validator)
    }
}

impl Validator for SchemaValidator {
    fn validate(&self, column: ColumnType, payload: &Value) -> Vec<FieldError> {
        let (Some(schema), Some(sets)) = (self.schemas.get(&column), payload.as_object()) else {
            return Vec::new();
        };

        sets.iter()
            .filter_map(|(set_id, set)| {
                schema
                    .validate(set)
                    .err()
                    .map(|error| format_validation_error(set_id, &error))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sets_checked_against_column_schema() {
        let validator = SchemaValidator::new()
            .with_schema(
                ColumnType::Interface,
                &json!({
                    "type": "object",
                    "properties": {
                        "interfaces": {
                            "type": "object",
                            "additionalProperties": {
                                "type": "object",
                                "properties": {"mtu": {"type": "integer"}}
                            }
                        }
                    }
                }),
            )
            .unwrap();

        let ok = json!({"R1": {"interfaces": {"et-0/0/0": {"mtu": 9000}}}});
        assert!(validator.validate(ColumnType::Interface, &ok).is_empty());

        let bad = json!({"R1": {"interfaces": {"et-0/0/0": {"mtu": "jumbo"}}}});
        let errors = validator.validate(ColumnType::Interface, &bad);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].path.starts_with("R1.interfaces"));

        // columns without a schema are accepted
        assert!(validator.validate(ColumnType::Bgp, &bad).is_empty());
    }
}
