//! Cvar substitution

use serde_json::Value;
use std::collections::BTreeMap;

/// Replace every string equal to `<prefix><name>` with the value of cvar `name`.
///
/// Only whole-value matches are substituted; strings merely containing a token
/// are left alone. Walks nested objects and arrays. Returns the number of
/// substitutions made.
pub fn substitute_cvars(value: &mut Value, cvars: &BTreeMap<String, Value>, prefix: &str) -> usize {
    match value {
        Value::String(s) => {
            let replacement = s.strip_prefix(prefix).and_then(|name| cvars.get(name));
            match replacement {
                Some(replacement) => {
                    *value = replacement.clone();
                    1
                }
                None => 0,
            }
        }
        Value::Array(items) => items
            .iter_mut()
            .map(|item| substitute_cvars(item, cvars, prefix))
            .sum(),
        Value::Object(map) => map
            .values_mut()
            .map(|item| substitute_cvars(item, cvars, prefix))
            .sum(),
        _ => 0,
    }
}
