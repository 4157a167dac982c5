//! Config set merge
//!
//! Assembles one device's effective configuration for a column from the
//! reconciled config sets:
//! 1. every shared set whose roles match the device (or contain the wildcard),
//!    in set id order
//! 2. the device's own set, last so it takes precedence
//! 3. cvar substitution on the merged result

pub mod cvars;
pub mod merge;

use serde_json::{Map, Value};
use tracing::debug;

use crate::config::Settings;
use crate::error::EngineError;
use crate::models::{Device, ROLES_KEY, ResolvedColumn};

pub use cvars::substitute_cvars;
pub use merge::fold_set;

/// Builds per-device configuration from a reconciled column
pub struct ConfigBuilder<'a> {
    settings: &'a Settings,
}

impl<'a> ConfigBuilder<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// Whether a shared set with `roles` applies to `device`
    pub fn roles_match(&self, roles: &Value, device: &Device) -> bool {
        roles.as_array().is_some_and(|roles| {
            roles.iter().filter_map(Value::as_str).any(|role| {
                role == self.settings.wildcard_role || device.has_role(role)
            })
        })
    }

    /// Ids of the shared sets that apply to `device`, in merge order
    pub fn applicable_shared_sets(&self, column: &ResolvedColumn, device: &Device) -> Vec<String> {
        column
            .sets
            .iter()
            .filter(|(set_id, _)| self.settings.is_shared(set_id))
            .filter(|(_, set)| {
                let payload = set.to_payload();
                payload
                    .get(ROLES_KEY)
                    .is_some_and(|roles| self.roles_match(roles, device))
            })
            .map(|(set_id, _)| set_id.clone())
            .collect()
    }

    /// Merge the applicable sets of `column` for `device`.
    ///
    /// Fails with `MissingAttribute` when the device lacks an attribute the
    /// column requires, and with `NoData` when no set applies. A set that
    /// applies but is empty yields an empty object.
    pub fn build(&self, column: &ResolvedColumn, device: &Device) -> Result<Value, EngineError> {
        for attribute in self.settings.required_attributes(column.column) {
            if device.attribute(attribute).is_none() {
                return Err(EngineError::MissingAttribute {
                    id: device.id.clone(),
                    attribute: attribute.clone(),
                });
            }
        }

        let descriptor = column.column.descriptor();
        let mut merged = Map::new();
        let mut applied = 0;

        for set_id in self.applicable_shared_sets(column, device) {
            if let Some(payload) = column.set_payload(&set_id) {
                debug!("{} {}: merging shared set {}", column.column, device.id, set_id);
                fold_set(&mut merged, &payload, descriptor, true);
                applied += 1;
            }
        }

        if !self.settings.is_shared(&device.id)
            && let Some(payload) = column.set_payload(&device.id)
        {
            debug!("{} {}: merging device set", column.column, device.id);
            fold_set(&mut merged, &payload, descriptor, false);
            applied += 1;
        }

        if applied == 0 {
            return Err(EngineError::NoData {
                column: column.column.to_string(),
                device: device.id.clone(),
            });
        }

        let mut config = Value::Object(merged);
        let substituted = substitute_cvars(&mut config, &device.cvars, &self.settings.cvar_prefix);
        debug!(
            "{} {}: merged {} sets, {} cvar substitutions",
            column.column, device.id, applied, substituted
        );
        Ok(config)
    }
}
