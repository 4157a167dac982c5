//! Device registry
//!
//! Authoritative list of known devices with their roles and cvars:
//! - StaticDeviceRegistry: fixed in-memory set (tests, embedding)
//! - ColumnDeviceRegistry: derived from the reconciled device column

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::EngineError;
use crate::models::Device;

mod column;

pub use column::ColumnDeviceRegistry;

/// Lookup of registered devices
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// Device by id, `None` when it is not registered
    async fn get_device(&self, id: &str) -> Result<Option<Device>, EngineError>;

    /// Ids of every registered device
    async fn list_devices(&self) -> Result<BTreeSet<String>, EngineError>;
}

/// Registry over a fixed set of devices
#[derive(Debug, Clone, Default)]
pub struct StaticDeviceRegistry {
    devices: BTreeMap<String, Device>,
}

impl StaticDeviceRegistry {
    pub fn new<I>(devices: I) -> Self
    where
        I: IntoIterator<Item = Device>,
    {
        Self {
            devices: devices
                .into_iter()
                .map(|device| (device.id.clone(), device))
                .collect(),
        }
    }
}

#[async_trait]
impl DeviceRegistry for StaticDeviceRegistry {
    async fn get_device(&self, id: &str) -> Result<Option<Device>, EngineError> {
        Ok(self.devices.get(id).cloned())
    }

    async fn list_devices(&self) -> Result<BTreeSet<String>, EngineError> {
        Ok(self.devices.keys().cloned().collect())
    }
}
