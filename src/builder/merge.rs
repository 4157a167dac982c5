//! Merge-by-category rules for folding config sets
//!
//! - Keyed and family-keyed categories: replace per element id
//! - Singletons: shallow key-by-key update
//! - Flat columns: the whole set is one singleton

use serde_json::{Map, Value};

use crate::models::{CategoryKind, ColumnDescriptor, ROLES_KEY};

/// Fold one set payload into the accumulated configuration.
///
/// `skip_roles` drops the `roles` key of shared sets, which selects devices
/// but is not configuration.
pub fn fold_set(
    acc: &mut Map<String, Value>,
    set: &Value,
    descriptor: ColumnDescriptor,
    skip_roles: bool,
) {
    let Some(set) = set.as_object() else {
        return;
    };

    for (key, value) in set {
        if skip_roles && key == ROLES_KEY {
            continue;
        }

        if descriptor.is_flat() {
            acc.insert(key.clone(), value.clone());
            continue;
        }

        match descriptor.kind_of(key) {
            CategoryKind::Singleton => merge_singleton(acc, key, value),
            CategoryKind::Keyed => merge_elements(object_entry(acc, key), value),
            CategoryKind::FamilyKeyed => {
                let Some(families) = value.as_object() else {
                    continue;
                };
                let category = object_entry(acc, key);
                for (family, elements) in families {
                    merge_elements(object_entry(category, family), elements);
                }
            }
        }
    }
}

/// Shallow update when both sides are objects, replacement otherwise
fn merge_singleton(acc: &mut Map<String, Value>, key: &str, value: &Value) {
    match (acc.get_mut(key), value) {
        (Some(Value::Object(existing)), Value::Object(update)) => {
            for (field, field_value) in update {
                existing.insert(field.clone(), field_value.clone());
            }
        }
        _ => {
            acc.insert(key.to_string(), value.clone());
        }
    }
}

/// Later elements replace earlier ones with the same id entirely
fn merge_elements(target: &mut Map<String, Value>, elements: &Value) {
    if let Some(elements) = elements.as_object() {
        for (element_id, data) in elements {
            target.insert(element_id.clone(), data.clone());
        }
    }
}

fn object_entry<'a>(acc: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let slot = acc
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(map) => map,
        _ => unreachable!("slot was just made an object"),
    }
}
