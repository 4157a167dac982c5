//! Network configuration source of truth
//!
//! Reconciles configuration data submitted by several datasources into one
//! authoritative view per column, and builds per-device configuration from it.
//!
//! Provides:
//! - Column taxonomy and document model (`models`)
//! - Payload decomposition and weighted recomposition (`codec`)
//! - Override overlay (`overrides`)
//! - Per-device config set merge with cvar substitution (`builder`)
//! - Pluggable validation, device registry and document storage
//! - `Engine`, tying the above together behind column operations

pub mod builder;
pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod outcome;
pub mod overrides;
pub mod registry;
pub mod storage;
pub mod validation;

pub use builder::ConfigBuilder;
pub use config::{ConfigError, Settings};
pub use engine::Engine;
pub use error::{EngineError, ErrorKind};
pub use outcome::Outcome;
pub use registry::{ColumnDeviceRegistry, DeviceRegistry, StaticDeviceRegistry};
pub use storage::{DocumentStore, MemoryDocumentStore, StorageError};
#[cfg(feature = "native-fs")]
pub use storage::FileSystemDocumentStore;
pub use validation::{ChainValidator, FieldError, StructuralValidator, Validator};
#[cfg(feature = "schema-validation")]
pub use validation::SchemaValidator;

pub use models::{
    ColumnType, Coordinate, Device, Document, Family, Filter, Override, Provenance,
    ResolvedColumn, ResolvedElement,
};
