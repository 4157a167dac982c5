//! Registered network devices

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::ROLES_KEY;

/// Key holding a device's substitution variables in the device column
pub const CVARS_KEY: &str = "cvars";

/// Known device with its roles, cvars and remaining attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub cvars: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl Device {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_roles<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cvar(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.cvars.insert(name.into(), value.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Build a device from its entry in the device column.
    ///
    /// `roles` and `cvars` are lifted out; every other key is kept as an attribute.
    /// Malformed roles or cvars are ignored since the validator rejects them on write.
    pub fn from_set(id: impl Into<String>, set: &Value) -> Self {
        let mut device = Self::new(id);
        let Some(object) = set.as_object() else {
            return device;
        };

        for (key, value) in object {
            match key.as_str() {
                ROLES_KEY => {
                    device.roles = value
                        .as_array()
                        .map(|roles| {
                            roles
                                .iter()
                                .filter_map(|r| r.as_str().map(str::to_string))
                                .collect()
                        })
                        .unwrap_or_default();
                }
                CVARS_KEY => {
                    if let Some(cvars) = value.as_object() {
                        device.cvars = cvars
                            .iter()
                            .map(|(k, v)| (k.clone(), v.clone()))
                            .collect();
                    }
                }
                _ => {
                    device.attributes.insert(key.clone(), value.clone());
                }
            }
        }

        device
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name).filter(|v| !v.is_null())
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}
