//! Datasource commands: validate, reload, replace, fetch, delete

use netconfig_sot::{ColumnType, Filter, Outcome, ResolvedColumn};
use serde_json::Value;

use super::CliEngine;
use crate::error::CliError;
use crate::input::{FilterArgs, read_payload};

/// Arguments for the `reload` and `replace` commands
pub struct WriteArgs {
    pub column: ColumnType,
    pub datasource: String,
    pub weight: i64,
    /// Payload file, or `-` for stdin
    pub input: String,
}

/// Handle the `validate` command
pub async fn handle_validate(
    engine: &CliEngine,
    column: ColumnType,
    input: &str,
) -> Result<Outcome<Value>, CliError> {
    let payload = read_payload(input)?;
    Ok(match engine.validate(column, &payload).await {
        Ok(()) => Outcome::ok_with(Value::Null, "payload is valid"),
        Err(e) => Outcome::failed(&e),
    })
}

/// Handle the `reload` command
pub async fn handle_reload(
    engine: &CliEngine,
    args: &WriteArgs,
) -> Result<Outcome<ResolvedColumn>, CliError> {
    let payload = read_payload(&args.input)?;
    let result = engine
        .reload(args.column, &args.datasource, args.weight, &payload)
        .await;
    Ok(Outcome::from(result))
}

/// Handle the `replace` command
pub async fn handle_replace(
    engine: &CliEngine,
    args: &WriteArgs,
) -> Result<Outcome<usize>, CliError> {
    let payload = read_payload(&args.input)?;
    let result = engine
        .replace(args.column, &args.datasource, args.weight, &payload)
        .await;
    Ok(match result {
        Ok(written) => Outcome::ok_with(written, format!("{} documents written", written)),
        Err(e) => Outcome::failed(&e),
    })
}

/// Handle the `fetch` command
pub async fn handle_fetch(
    engine: &CliEngine,
    column: ColumnType,
    filter: FilterArgs,
    show_hidden: bool,
) -> Result<Outcome<ResolvedColumn>, CliError> {
    let result = engine.fetch(column, &Filter::from(filter), show_hidden).await;
    Ok(match result {
        Ok(resolved) if resolved.is_empty() => Outcome::ok_with(resolved, "no matching documents"),
        other => Outcome::from(other),
    })
}

/// Handle the `delete` command
pub async fn handle_delete(
    engine: &CliEngine,
    column: ColumnType,
    filter: FilterArgs,
) -> Result<Outcome<usize>, CliError> {
    Ok(match engine.delete(column, &Filter::from(filter)).await {
        Ok(deleted) => Outcome::ok_with(deleted, format!("{} documents deleted", deleted)),
        Err(e) => Outcome::failed(&e),
    })
}
