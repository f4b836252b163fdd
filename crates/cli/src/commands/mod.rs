//! CLI command implementations

pub mod probes;
pub mod resources;

use anyhow::{Context, Result};
use sidecar_spec::WorkloadSpec;

/// Reads a workload spec from a JSON file
pub(crate) fn load_workload(path: &str) -> Result<WorkloadSpec> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read workload spec {}", path))?;
    serde_json::from_str(&content).context("Failed to parse workload spec")
}
