//! Reconciliation engine
//!
//! Wires the validator, device registry and document store around the codec,
//! override overlay and config-set merge. The engine keeps no mutable state of
//! its own; every operation reads from and writes to the store, so many
//! operations may run concurrently against one engine.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::builder::ConfigBuilder;
use crate::codec::{decompose, recompose};
use crate::config::Settings;
use crate::error::EngineError;
use crate::models::{ColumnType, Filter, Override, ResolvedColumn, ResolvedElement};
use crate::overrides::{locate_target, patched_set_payload, reconcile};
use crate::registry::{ColumnDeviceRegistry, DeviceRegistry};
use crate::storage::DocumentStore;
use crate::validation::{FieldError, Validator};

/// Entry point for every column operation
pub struct Engine<S: DocumentStore + ?Sized> {
    settings: Arc<Settings>,
    store: Arc<S>,
    validator: Arc<dyn Validator>,
    registry: Arc<dyn DeviceRegistry>,
}

impl<S: DocumentStore + ?Sized> Clone for Engine<S> {
    fn clone(&self) -> Self {
        Self {
            settings: Arc::clone(&self.settings),
            store: Arc::clone(&self.store),
            validator: Arc::clone(&self.validator),
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<S: DocumentStore + ?Sized + 'static> Engine<S> {
    /// Engine whose device registry is the reconciled device column of `store`
    pub fn with_column_registry(
        settings: Arc<Settings>,
        store: Arc<S>,
        validator: Arc<dyn Validator>,
    ) -> Self {
        let registry = Arc::new(ColumnDeviceRegistry::new(
            Arc::clone(&store),
            Arc::clone(&settings),
        ));
        Self::new(settings, store, validator, registry)
    }
}

impl<S: DocumentStore + ?Sized> Engine<S> {
    pub fn new(
        settings: Arc<Settings>,
        store: Arc<S>,
        validator: Arc<dyn Validator>,
        registry: Arc<dyn DeviceRegistry>,
    ) -> Self {
        Self {
            settings,
            store,
            validator,
            registry,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Check a payload's shape and that every device set names a registered device
    pub async fn validate(&self, column: ColumnType, payload: &Value) -> Result<(), EngineError> {
        let fields = self.validator.validate(column, payload);
        if !fields.is_empty() {
            warn!("Rejected {} payload: {} field errors", column, fields.len());
            return Err(EngineError::validation(fields));
        }
        self.check_registration(column, payload).await
    }

    async fn check_registration(
        &self,
        column: ColumnType,
        payload: &Value,
    ) -> Result<(), EngineError> {
        // the device column is the registry itself
        if column == ColumnType::Device {
            return Ok(());
        }
        let Some(sets) = payload.as_object() else {
            return Ok(());
        };

        let devices = self.registry.list_devices().await?;
        for set_id in sets.keys() {
            if !self.settings.is_shared(set_id) && !devices.contains(set_id) {
                warn!("Rejected {} payload: device {} is not registered", column, set_id);
                return Err(EngineError::DeviceNotRegistered { id: set_id.clone() });
            }
        }
        Ok(())
    }

    async fn prepare(
        &self,
        column: ColumnType,
        datasource: &str,
        weight: i64,
        payload: &Value,
    ) -> Result<Vec<crate::models::Document>, EngineError> {
        if datasource.is_empty() {
            return Err(EngineError::validation(vec![FieldError::new(
                "datasource",
                "datasource cannot be empty",
            )]));
        }
        self.validate(column, payload).await?;
        decompose(column, payload, datasource, weight, &self.settings)
    }

    /// Atomically replace everything `datasource` holds in `column` with `payload`
    /// and return the reconciled column.
    pub async fn reload(
        &self,
        column: ColumnType,
        datasource: &str,
        weight: i64,
        payload: &Value,
    ) -> Result<ResolvedColumn, EngineError> {
        let documents = self.prepare(column, datasource, weight, payload).await?;
        let inserted = documents.len();
        let removed = self
            .store
            .swap_datasource(column, datasource, documents)
            .await?;
        info!(
            "Reloaded {} from {}: {} documents replaced by {}",
            column, datasource, removed, inserted
        );
        self.fetch(column, &Filter::new(), false).await
    }

    /// Upsert `payload` from `datasource`, keeping its other documents.
    /// Returns the number of documents written.
    pub async fn replace(
        &self,
        column: ColumnType,
        datasource: &str,
        weight: i64,
        payload: &Value,
    ) -> Result<usize, EngineError> {
        let documents = self.prepare(column, datasource, weight, payload).await?;
        let written = self.store.upsert_documents(column, documents).await?;
        info!("Replaced {} documents in {} from {}", written, column, datasource);
        Ok(written)
    }

    /// Reconciled column with overrides applied
    pub async fn fetch(
        &self,
        column: ColumnType,
        filter: &Filter,
        show_hidden: bool,
    ) -> Result<ResolvedColumn, EngineError> {
        reconcile(self.store.as_ref(), &self.settings, column, filter, show_hidden).await
    }

    /// Delete documents matching a non-empty filter
    pub async fn delete(&self, column: ColumnType, filter: &Filter) -> Result<usize, EngineError> {
        if filter.is_empty() {
            return Err(EngineError::EmptyFilter);
        }
        let deleted = self.store.delete_documents(column, filter).await?;
        info!("Deleted {} documents from {}", deleted, column);
        Ok(deleted)
    }

    /// Store an override after checking it targets exactly one element and that
    /// the patched set still validates. Returns the overridden element.
    pub async fn override_upsert(&self, patch: Override) -> Result<ResolvedElement, EngineError> {
        let column = patch.column;
        let set_id = patch.coordinate.set_id.clone();

        // datasource-derived state of the surrounding set, without overrides
        let documents = self
            .store
            .documents(column, &Filter::new().set_id(&set_id))
            .await?;
        let context = recompose(column, &documents, false, &self.settings)?;

        let target = locate_target(&context, &patch.coordinate).inspect_err(|e| {
            warn!("Rejected override {} {}: {}", column, patch.coordinate, e);
        })?;

        let shadowed = context
            .element(&target)
            .map(|element| element.meta.clone())
            .ok_or_else(|| EngineError::NotFound(format!("no {} element at {}", column, target)))?;

        let set_payload = patched_set_payload(&context, &target, &patch.data)
            .ok_or_else(|| EngineError::NotFound(format!("no {} set {}", column, set_id)))?;
        let mut payload = Map::new();
        payload.insert(set_id, set_payload);
        self.validate(column, &Value::Object(payload)).await?;

        let stored = Override {
            coordinate: target.clone(),
            ..patch
        };
        let data = stored.data.clone();
        self.store.upsert_override(stored).await?;
        info!("Stored override {} {}", column, target);

        Ok(ResolvedElement {
            data,
            meta: crate::models::Provenance {
                overridden: true,
                ..shadowed
            },
        })
    }

    /// Overrides of `column` matching `filter`
    pub async fn override_fetch(
        &self,
        column: ColumnType,
        filter: &Filter,
    ) -> Result<Vec<Override>, EngineError> {
        Ok(self.store.overrides(column, filter).await?)
    }

    /// Delete overrides matching a filter with at least one coordinate field
    pub async fn override_delete(
        &self,
        column: ColumnType,
        filter: &Filter,
    ) -> Result<usize, EngineError> {
        if !filter.has_coordinate() {
            return Err(EngineError::EmptyFilter);
        }
        let deleted = self.store.delete_overrides(column, filter).await?;
        info!("Deleted {} overrides from {}", deleted, column);
        Ok(deleted)
    }

    /// Effective configuration of one device for `column`
    pub async fn build_device_config(
        &self,
        column: ColumnType,
        device_id: &str,
    ) -> Result<Value, EngineError> {
        let device = self
            .registry
            .get_device(device_id)
            .await?
            .ok_or_else(|| EngineError::DeviceNotFound {
                id: device_id.to_string(),
            })?;
        let resolved = self.fetch(column, &Filter::new(), false).await?;
        ConfigBuilder::new(&self.settings).build(&resolved, &device)
    }

    /// Effective configuration of every registered device for `column`.
    /// Devices without applicable data are left out.
    pub async fn device_configs(
        &self,
        column: ColumnType,
    ) -> Result<BTreeMap<String, Value>, EngineError> {
        let resolved = self.fetch(column, &Filter::new(), false).await?;
        let builder = ConfigBuilder::new(&self.settings);

        let mut configs = BTreeMap::new();
        for device_id in self.registry.list_devices().await? {
            let Some(device) = self.registry.get_device(&device_id).await? else {
                continue;
            };
            match builder.build(&resolved, &device) {
                Ok(config) => {
                    configs.insert(device_id, config);
                }
                Err(EngineError::NoData { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(configs)
    }
}
