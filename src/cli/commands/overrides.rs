//! Override commands: set, list, delete

use netconfig_sot::{ColumnType, Coordinate, Filter, Outcome, Override, ResolvedElement};

use super::CliEngine;
use crate::error::CliError;
use crate::input::{FilterArgs, read_payload};

/// Arguments for the `override set` command
pub struct OverrideSetArgs {
    pub column: ColumnType,
    /// Partial coordinate; must resolve to exactly one element
    pub target: FilterArgs,
    /// Replacement data file, or `-` for stdin
    pub input: String,
}

/// Handle the `override set` command
pub async fn handle_override_set(
    engine: &CliEngine,
    args: OverrideSetArgs,
) -> Result<Outcome<ResolvedElement>, CliError> {
    let Some(set_id) = args.target.set_id else {
        return Err(CliError::InvalidArgument(
            "--set-id is required for overrides".to_string(),
        ));
    };
    let data = read_payload(&args.input)?;

    let coordinate = Coordinate {
        set_id,
        category: args.target.category,
        family: args.target.family,
        element_id: args.target.element_id,
    };
    let result = engine
        .override_upsert(Override::new(args.column, coordinate, data))
        .await;
    Ok(Outcome::from(result))
}

/// Handle the `override list` command
pub async fn handle_override_list(
    engine: &CliEngine,
    column: ColumnType,
    filter: FilterArgs,
) -> Result<Outcome<Vec<Override>>, CliError> {
    Ok(Outcome::from(
        engine.override_fetch(column, &Filter::from(filter)).await,
    ))
}

/// Handle the `override delete` command
pub async fn handle_override_delete(
    engine: &CliEngine,
    column: ColumnType,
    filter: FilterArgs,
) -> Result<Outcome<usize>, CliError> {
    Ok(
        match engine.override_delete(column, &Filter::from(filter)).await {
            Ok(deleted) => Outcome::ok_with(deleted, format!("{} overrides deleted", deleted)),
            Err(e) => Outcome::failed(&e),
        },
    )
}
