//! CLI configuration loading

use anyhow::{Context, Result};
use sidecar_spec::SidecarConfig;
use std::collections::BTreeMap;

/// Load the provisioning configuration snapshot.
///
/// A config file is a flat JSON object of string values using the same keys
/// as the deployment configuration source; without one, `SSP_`-prefixed
/// environment variables are consulted (e.g. `SSP_SIDECAR_CPU_REQUEST`).
pub fn load(path: Option<&str>) -> Result<SidecarConfig> {
    let data: BTreeMap<String, String> = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p)
                .with_context(|| format!("Failed to read config file {}", p))?;
            serde_json::from_str(&content).context("Failed to parse config file")?
        }
        None => {
            let source = config::Config::builder()
                .add_source(config::Environment::with_prefix("SSP"))
                .build()
                .context("Failed to read environment configuration")?;
            source.try_deserialize().unwrap_or_default()
        }
    };

    // Environment keys arrive underscore-separated; the config source keys
    // use dashes.
    let data: BTreeMap<String, String> = data
        .into_iter()
        .map(|(k, v)| (k.to_lowercase().replace('_', "-"), v))
        .collect();

    Ok(SidecarConfig::from_map(&data)?)
}
