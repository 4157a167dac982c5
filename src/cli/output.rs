//! Output formatting for CLI

use serde::Serialize;

use crate::error::CliError;
use netconfig_sot::Outcome;

/// Print an outcome as JSON on stdout. Returns whether it succeeded.
pub fn print_outcome<T: Serialize>(outcome: &Outcome<T>, compact: bool) -> Result<bool, CliError> {
    let rendered = if compact {
        serde_json::to_string(outcome)
    } else {
        serde_json::to_string_pretty(outcome)
    }
    .map_err(|e| CliError::OutputError(e.to_string()))?;

    println!("{}", rendered);
    Ok(outcome.success)
}
