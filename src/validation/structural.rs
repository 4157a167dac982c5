//! Structural validation of column payloads
//!
//! Checks that a payload matches the shape its column's descriptor declares,
//! so that decomposition never has to guess.

use serde_json::{Map, Value};

use super::{FieldError, Validator};
use crate::models::{CVARS_KEY, CategoryKind, ColumnType, Family, ROLES_KEY};

/// Validates set, category and family nesting for every column type
pub struct StructuralValidator {
    shared_prefix: String,
}

impl StructuralValidator {
    pub fn new(shared_prefix: impl Into<String>) -> Self {
        Self {
            shared_prefix: shared_prefix.into(),
        }
    }

    fn is_shared(&self, set_id: &str) -> bool {
        set_id.starts_with(&self.shared_prefix)
    }

    fn validate_set(
        &self,
        column: ColumnType,
        set_id: &str,
        set: &Value,
        errors: &mut Vec<FieldError>,
    ) {
        let Some(object) = set.as_object() else {
            errors.push(FieldError::new(set_id, "config set must be an object"));
            return;
        };

        if self.is_shared(set_id) {
            match object.get(ROLES_KEY) {
                None => errors.push(FieldError::new(
                    format!("{set_id}.{ROLES_KEY}"),
                    "shared config sets must declare roles",
                )),
                Some(roles) => check_roles(set_id, roles, errors),
            }
        }

        let descriptor = column.descriptor();
        if descriptor.is_flat() {
            if column == ColumnType::Device {
                check_device_entry(set_id, object, errors);
            }
            return;
        }

        for (key, value) in object {
            let path = format!("{set_id}.{key}");
            match descriptor.kind_of(key) {
                CategoryKind::Singleton => {}
                CategoryKind::Keyed => check_elements(&path, value, errors),
                CategoryKind::FamilyKeyed => {
                    let Some(families) = value.as_object() else {
                        errors.push(FieldError::new(
                            path,
                            "category must map address families to elements",
                        ));
                        continue;
                    };
                    for (family, elements) in families {
                        let family_path = format!("{path}.{family}");
                        if family.parse::<Family>().is_err() {
                            errors.push(FieldError::new(
                                family_path,
                                "address family must be 'ipv4' or 'ipv6'",
                            ));
                            continue;
                        }
                        check_elements(&family_path, elements, errors);
                    }
                }
            }
        }
    }
}

fn check_roles(set_id: &str, roles: &Value, errors: &mut Vec<FieldError>) {
    let path = format!("{set_id}.{ROLES_KEY}");
    match roles.as_array() {
        Some(list) if list.is_empty() => {
            errors.push(FieldError::new(path, "roles cannot be empty"));
        }
        Some(list) if list.iter().all(Value::is_string) => {}
        _ => errors.push(FieldError::new(path, "roles must be a list of strings")),
    }
}

fn check_elements(path: &str, value: &Value, errors: &mut Vec<FieldError>) {
    if !value.is_object() {
        errors.push(FieldError::new(
            path,
            "category must map element ids to element data",
        ));
    }
}

fn check_device_entry(set_id: &str, object: &Map<String, Value>, errors: &mut Vec<FieldError>) {
    if let Some(roles) = object.get(ROLES_KEY) {
        let valid = roles
            .as_array()
            .is_some_and(|list| list.iter().all(Value::is_string));
        if !valid {
            errors.push(FieldError::new(
                format!("{set_id}.{ROLES_KEY}"),
                "roles must be a list of strings",
            ));
        }
    }
    if let Some(cvars) = object.get(CVARS_KEY)
        && !cvars.is_object()
    {
        errors.push(FieldError::new(
            format!("{set_id}.{CVARS_KEY}"),
            "cvars must map names to values",
        ));
    }
}

impl Validator for StructuralValidator {
    fn validate(&self, column: ColumnType, payload: &Value) -> Vec<FieldError> {
        let Some(sets) = payload.as_object() else {
            return vec![FieldError::new(
                "",
                "column payload must be an object of config sets",
            )];
        };

        let mut errors = Vec::new();
        for (set_id, set) in sets {
            if set_id.is_empty() {
                errors.push(FieldError::new("", "set id cannot be empty"));
                continue;
            }
            self.validate_set(column, set_id, set, &mut errors);
        }
        errors
    }
}
