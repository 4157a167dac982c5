//! CLI command implementations

pub mod build;
pub mod data;
pub mod overrides;

use netconfig_sot::{DocumentStore, Engine};

/// Engine over whichever store the settings selected
pub type CliEngine = Engine<dyn DocumentStore>;
