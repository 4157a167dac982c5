//! CLI error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read {0}: {1}")]
    FileReadError(PathBuf, String),

    #[error("Failed to parse payload: {0}")]
    ParseError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to load schemas: {0}")]
    SchemaError(String),

    #[error("Failed to write output: {0}")]
    OutputError(String),
}
