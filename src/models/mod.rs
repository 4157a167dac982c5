//! Models module
//!
//! Defines the column taxonomy, the storage-normalized documents, operator
//! overrides, devices and the reconciled views produced on read.

pub mod column;
pub mod device;
pub mod document;
pub mod filter;
pub mod overrides;
pub mod resolved;

/// Key holding the role list of a shared config set
pub const ROLES_KEY: &str = "roles";

pub use column::{CategoryKind, CategorySpec, ColumnDescriptor, ColumnType};
pub use device::{CVARS_KEY, Device};
pub use document::{Coordinate, Document, Family};
pub use filter::Filter;
pub use overrides::Override;
pub use resolved::{Provenance, ResolvedCategory, ResolvedColumn, ResolvedElement, ResolvedSet, StructuredSet};
