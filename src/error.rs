//! Error types for engine operations

use serde::Serialize;
use thiserror::Error;

use crate::storage::StorageError;
use crate::validation::FieldError;

/// Errors that can occur while reconciling, overriding or building column data
#[derive(Error, Debug)]
pub enum EngineError {
    /// Column name outside the fixed taxonomy
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// Payload rejected by the validator
    #[error("Validation failed: {}", format_fields(.fields))]
    ValidationFailed { fields: Vec<FieldError> },

    /// Device-scoped set whose id is not a registered device
    #[error("Device not registered: {id}")]
    DeviceNotRegistered { id: String },

    /// Device requested for a build does not exist
    #[error("Device not found: {id}")]
    DeviceNotFound { id: String },

    /// Device lacks an attribute the column requires
    #[error("Device {id} is missing required attribute '{attribute}'")]
    MissingAttribute { id: String, attribute: String },

    /// Delete requested without any filter field
    #[error("Refusing to delete with an empty filter")]
    EmptyFilter,

    /// Override coordinate resolves to more than one element
    #[error("Override is ambiguous: coordinate matches {matches} elements")]
    AmbiguousOverride { matches: usize },

    /// Override target or column data absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Merge produced nothing for the device
    #[error("No data for device {device} in column {column}")]
    NoData { column: String, device: String },

    /// Stored document names a category the column does not declare
    #[error("Unknown category '{category}' in column {column}")]
    UnknownCategory { column: String, category: String },

    /// Stored document does not fit the column shape
    #[error("Corrupt document at {coordinate}: {reason}")]
    CorruptDocument { coordinate: String, reason: String },

    /// Submitted payload cannot be decomposed
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Backing store failure
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Coarse classification of an [`EngineError`] for callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller can fix the input and retry
    InvalidInput,
    /// Nothing to do; usually rendered as an empty result
    Empty,
    /// Store failure or corrupted data
    Internal,
}

impl EngineError {
    /// Classify the error for uniform handling by the caller
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::UnknownColumn(_)
            | EngineError::ValidationFailed { .. }
            | EngineError::DeviceNotRegistered { .. }
            | EngineError::MissingAttribute { .. }
            | EngineError::EmptyFilter
            | EngineError::AmbiguousOverride { .. }
            | EngineError::InvalidPayload(_) => ErrorKind::InvalidInput,
            EngineError::DeviceNotFound { .. }
            | EngineError::NotFound(_)
            | EngineError::NoData { .. } => ErrorKind::Empty,
            EngineError::UnknownCategory { .. }
            | EngineError::CorruptDocument { .. }
            | EngineError::Storage(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn validation(fields: Vec<FieldError>) -> Self {
        EngineError::ValidationFailed { fields }
    }
}

fn format_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
