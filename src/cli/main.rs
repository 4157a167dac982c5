//! netconfig-sot command line interface
//!
//! Every command prints its outcome as JSON on stdout and exits non-zero
//! when the outcome is a failure. Logs go to stderr.

mod commands;
mod error;
mod input;
mod output;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use commands::CliEngine;
use commands::data::WriteArgs;
use commands::overrides::OverrideSetArgs;
use error::CliError;
use input::FilterArgs;
use netconfig_sot::config::{StorageBackendKind, StorageSettings};
use netconfig_sot::storage::open_store;
use netconfig_sot::{
    ChainValidator, ColumnType, Engine, Settings, StructuralValidator, Validator,
};
use output::print_outcome;

#[derive(Parser)]
#[command(name = "netconfig-sot")]
#[command(about = "Network configuration source of truth")]
#[command(version)]
struct Cli {
    /// Settings file (TOML); defaults apply when absent
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data directory; selects the filesystem store regardless of settings
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Directory of `<column>.schema.json` files
    #[cfg(feature = "schema-validation")]
    #[arg(long, global = true)]
    schema_dir: Option<PathBuf>,

    /// Single-line JSON output
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a payload without storing it
    Validate {
        column: ColumnType,
        /// Payload file (JSON or YAML), or `-` for stdin
        input: String,
    },
    /// Replace everything a datasource holds in a column
    Reload {
        column: ColumnType,
        #[arg(long)]
        datasource: String,
        #[arg(long)]
        weight: i64,
        input: String,
    },
    /// Upsert a datasource's documents, keeping the rest
    Replace {
        column: ColumnType,
        #[arg(long)]
        datasource: String,
        #[arg(long)]
        weight: i64,
        input: String,
    },
    /// Print the reconciled column
    Fetch {
        column: ColumnType,
        #[command(flatten)]
        filter: FilterArgs,
        /// Include documents with weight below 1
        #[arg(long)]
        show_hidden: bool,
    },
    /// Delete documents matching a non-empty filter
    Delete {
        column: ColumnType,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Manage operator overrides
    Override {
        #[command(subcommand)]
        command: OverrideCommands,
    },
    /// Build effective device configuration
    Build {
        column: ColumnType,
        /// Device id; all registered devices when omitted
        device: Option<String>,
    },
}

#[derive(Subcommand)]
enum OverrideCommands {
    /// Patch exactly one element
    Set {
        column: ColumnType,
        #[command(flatten)]
        target: FilterArgs,
        /// Replacement data file, or `-` for stdin
        input: String,
    },
    /// List overrides
    List {
        column: ColumnType,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Delete overrides
    Delete {
        column: ColumnType,
        #[command(flatten)]
        filter: FilterArgs,
    },
}

fn init_logging(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("Invalid log level '{}'", level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    Ok(())
}

fn build_validator(settings: &Settings, cli: &Cli) -> Result<Arc<dyn Validator>, CliError> {
    let mut validators: Vec<Box<dyn Validator>> =
        vec![Box::new(StructuralValidator::new(&settings.shared_prefix))];
    validators.extend(schema_validator(cli)?);
    Ok(Arc::new(ChainValidator::new(validators)))
}

#[cfg(feature = "schema-validation")]
fn schema_validator(cli: &Cli) -> Result<Option<Box<dyn Validator>>, CliError> {
    let Some(dir) = &cli.schema_dir else {
        return Ok(None);
    };
    let schemas = netconfig_sot::SchemaValidator::from_dir(dir).map_err(CliError::SchemaError)?;
    Ok(Some(Box::new(schemas)))
}

#[cfg(not(feature = "schema-validation"))]
fn schema_validator(_cli: &Cli) -> Result<Option<Box<dyn Validator>>, CliError> {
    Ok(None)
}

async fn run(engine: &CliEngine, command: Commands, compact: bool) -> Result<bool, CliError> {
    match command {
        Commands::Validate { column, input } => {
            let outcome = commands::data::handle_validate(engine, column, &input).await?;
            print_outcome(&outcome, compact)
        }
        Commands::Reload {
            column,
            datasource,
            weight,
            input,
        } => {
            let args = WriteArgs {
                column,
                datasource,
                weight,
                input,
            };
            let outcome = commands::data::handle_reload(engine, &args).await?;
            print_outcome(&outcome, compact)
        }
        Commands::Replace {
            column,
            datasource,
            weight,
            input,
        } => {
            let args = WriteArgs {
                column,
                datasource,
                weight,
                input,
            };
            let outcome = commands::data::handle_replace(engine, &args).await?;
            print_outcome(&outcome, compact)
        }
        Commands::Fetch {
            column,
            filter,
            show_hidden,
        } => {
            let outcome = commands::data::handle_fetch(engine, column, filter, show_hidden).await?;
            print_outcome(&outcome, compact)
        }
        Commands::Delete { column, filter } => {
            let outcome = commands::data::handle_delete(engine, column, filter).await?;
            print_outcome(&outcome, compact)
        }
        Commands::Override { command } => match command {
            OverrideCommands::Set {
                column,
                target,
                input,
            } => {
                let args = OverrideSetArgs {
                    column,
                    target,
                    input,
                };
                let outcome = commands::overrides::handle_override_set(engine, args).await?;
                print_outcome(&outcome, compact)
            }
            OverrideCommands::List { column, filter } => {
                let outcome =
                    commands::overrides::handle_override_list(engine, column, filter).await?;
                print_outcome(&outcome, compact)
            }
            OverrideCommands::Delete { column, filter } => {
                let outcome =
                    commands::overrides::handle_override_delete(engine, column, filter).await?;
                print_outcome(&outcome, compact)
            }
        },
        Commands::Build { column, device } => {
            let outcome = commands::build::handle_build(engine, column, device.as_deref()).await?;
            print_outcome(&outcome, compact)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(dir) = &cli.data_dir {
        settings.storage = StorageSettings {
            backend: StorageBackendKind::Filesystem,
            path: dir.clone(),
        };
    }
    init_logging(&settings.logging.level)?;

    if settings.storage.backend == StorageBackendKind::Memory {
        warn!("Using the memory store; nothing is kept after this command");
    }

    let validator = build_validator(&settings, &cli)?;
    let settings = Arc::new(settings);
    let store = open_store(&settings.storage)?;
    let engine: CliEngine = Engine::with_column_registry(settings, store, validator);

    let success = run(&engine, cli.command, cli.compact).await?;
    if !success {
        std::process::exit(1);
    }
    Ok(())
}
