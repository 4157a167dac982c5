//! Build command

use netconfig_sot::{ColumnType, Outcome};
use serde_json::Value;

use super::CliEngine;
use crate::error::CliError;

/// Handle the `build` command: one device, or every registered device
pub async fn handle_build(
    engine: &CliEngine,
    column: ColumnType,
    device: Option<&str>,
) -> Result<Outcome<Value>, CliError> {
    let outcome = match device {
        Some(device) => Outcome::from(engine.build_device_config(column, device).await),
        None => match engine.device_configs(column).await {
            Ok(configs) => {
                let comment = format!("{} device configs built", configs.len());
                Outcome::ok_with(Value::Object(configs.into_iter().collect()), comment)
            }
            Err(e) => Outcome::failed(&e),
        },
    };
    Ok(outcome)
}
