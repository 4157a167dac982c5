//! Registry derived from the device column

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;

use super::DeviceRegistry;
use crate::config::Settings;
use crate::error::EngineError;
use crate::models::{ColumnType, Device, Filter};
use crate::overrides::reconcile;
use crate::storage::DocumentStore;

/// Devices are the non-shared sets of the reconciled device column,
/// overrides included. `roles` and `cvars` keys become the device's roles
/// and cvars; every other key is an attribute.
pub struct ColumnDeviceRegistry<S: DocumentStore + ?Sized> {
    store: Arc<S>,
    settings: Arc<Settings>,
}

impl<S: DocumentStore + ?Sized> ColumnDeviceRegistry<S> {
    pub fn new(store: Arc<S>, settings: Arc<Settings>) -> Self {
        Self { store, settings }
    }
}

#[async_trait]
impl<S: DocumentStore + ?Sized> DeviceRegistry for ColumnDeviceRegistry<S> {
    async fn get_device(&self, id: &str) -> Result<Option<Device>, EngineError> {
        if self.settings.is_shared(id) {
            return Ok(None);
        }
        let column = reconcile(
            self.store.as_ref(),
            &self.settings,
            ColumnType::Device,
            &Filter::new().set_id(id),
            false,
        )
        .await?;

        Ok(column
            .set_payload(id)
            .map(|payload| Device::from_set(id, &payload)))
    }

    async fn list_devices(&self) -> Result<BTreeSet<String>, EngineError> {
        let column = reconcile(
            self.store.as_ref(),
            &self.settings,
            ColumnType::Device,
            &Filter::new(),
            false,
        )
        .await?;

        Ok(column
            .sets
            .into_keys()
            .filter(|id| !self.settings.is_shared(id))
            .collect())
    }
}
