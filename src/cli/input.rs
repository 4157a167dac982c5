//! Payload and filter input

use clap::Args;
use serde_json::Value;
use std::io::Read;
use std::path::PathBuf;

use crate::error::CliError;
use netconfig_sot::{Family, Filter};

/// Load input content from file or stdin (`-`)
pub fn load_input(input: &str) -> Result<String, CliError> {
    if input == "-" {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .map_err(|e| CliError::InvalidArgument(format!("Failed to read stdin: {}", e)))?;
        Ok(content)
    } else {
        let path = PathBuf::from(input);
        std::fs::read_to_string(&path).map_err(|e| CliError::FileReadError(path, e.to_string()))
    }
}

/// Parse a JSON or YAML document. YAML is a superset of JSON, but JSON is
/// tried first for its better error messages.
pub fn parse_payload(content: &str) -> Result<Value, CliError> {
    match serde_json::from_str(content) {
        Ok(value) => Ok(value),
        Err(json_error) => serde_yaml::from_str(content).map_err(|yaml_error| {
            CliError::ParseError(format!(
                "not JSON ({}) nor YAML ({})",
                json_error, yaml_error
            ))
        }),
    }
}

pub fn read_payload(input: &str) -> Result<Value, CliError> {
    parse_payload(&load_input(input)?)
}

/// Document selection shared by the read and delete commands
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only documents submitted by this datasource
    #[arg(long)]
    pub datasource: Option<String>,
    /// Config set id (device id or shared set)
    #[arg(long)]
    pub set_id: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    /// Address family (ipv4, ipv6)
    #[arg(long)]
    pub family: Option<Family>,
    #[arg(long)]
    pub element_id: Option<String>,
}

impl From<FilterArgs> for Filter {
    fn from(args: FilterArgs) -> Self {
        Filter {
            datasource: args.datasource,
            set_id: args.set_id,
            category: args.category,
            family: args.family,
            element_id: args.element_id,
        }
    }
}
