//! Resource allocation command

use anyhow::Result;
use sidecar_spec::{allocate, AllocationBoundaries, ResourceName, SidecarConfig};
use tabled::Tabled;

use crate::output::{print_info, print_warning, OutputFormat};

/// Row for the allocated resources table
#[derive(Tabled)]
struct ResourceRow {
    #[tabled(rename = "Resource")]
    name: String,
    #[tabled(rename = "Request")]
    request: String,
    #[tabled(rename = "Limit")]
    limit: String,
}

/// Derive and print the sidecar's resource requirements
pub fn run(spec_path: &str, cfg: &SidecarConfig, format: OutputFormat) -> Result<()> {
    let spec = super::load_workload(spec_path)?;
    let resources = allocate(
        &cfg.resources,
        &spec.resources,
        &spec.annotations,
        &AllocationBoundaries::default(),
    );

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&resources)?);
        }
        OutputFormat::Table => {
            let rows: Vec<ResourceRow> = [
                ResourceName::Cpu,
                ResourceName::Memory,
                ResourceName::EphemeralStorage,
            ]
            .into_iter()
            .filter_map(|name| {
                let request = resources.requests.get(&name);
                let limit = resources.limits.as_ref().and_then(|l| l.get(&name));
                if request.is_none() && limit.is_none() {
                    return None;
                }
                Some(ResourceRow {
                    name: name.to_string(),
                    request: request.map_or_else(|| "-".to_string(), |q| q.to_string()),
                    limit: limit.map_or_else(|| "-".to_string(), |q| q.to_string()),
                })
            })
            .collect();

            if rows.is_empty() {
                print_warning("No resources allocated");
                return Ok(());
            }

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            if resources.limits.is_none() {
                print_info("No limits asserted");
            }
        }
    }

    Ok(())
}
