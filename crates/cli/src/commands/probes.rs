//! Probe derivation command

use anyhow::Result;
use serde::Serialize;
use sidecar_spec::{
    derive_readiness_probe, derive_startup_probe, encode_probe, normalize_for_exec, Handler,
    Probe, SidecarConfig,
};
use tabled::Tabled;

use crate::output::{print_info, OutputFormat};

/// Row for the derived probes table
#[derive(Tabled)]
struct ProbeRow {
    #[tabled(rename = "Probe")]
    role: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Period")]
    period: String,
    #[tabled(rename = "Timeout")]
    timeout: String,
    #[tabled(rename = "Failures")]
    failure_threshold: String,
}

/// JSON shape of the probes command output
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProbesOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    startup_probe: Option<Probe>,
    readiness_probe: Probe,
    #[serde(skip_serializing_if = "Option::is_none")]
    probe_payload: Option<String>,
}

/// Derive and print the sidecar's startup/readiness probes and the encoded
/// payload for the self-check
pub fn run(spec_path: &str, cfg: &SidecarConfig, format: OutputFormat) -> Result<()> {
    let spec = super::load_workload(spec_path)?;

    let startup = derive_startup_probe(spec.readiness_probe.as_ref(), cfg.progress_deadline);
    let readiness = derive_readiness_probe(spec.readiness_probe.as_ref(), cfg.serving_port);
    let normalized = normalize_for_exec(spec.readiness_probe, cfg.serving_port);
    let payload = normalized.as_ref().map(encode_probe).transpose()?;

    match format {
        OutputFormat::Json => {
            let out = ProbesOutput {
                startup_probe: startup,
                readiness_probe: readiness,
                probe_payload: payload,
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Table => {
            let mut rows = Vec::new();
            if let Some(probe) = &startup {
                rows.push(probe_row("startup", probe));
            }
            rows.push(probe_row("readiness", &readiness));

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);

            if startup.is_none() {
                print_info("No startup probe: the user probe sets an explicit period");
            }
            if let Some(payload) = payload {
                println!("\nProbe payload: {}", payload);
            }
        }
    }

    Ok(())
}

fn probe_row(role: &str, probe: &Probe) -> ProbeRow {
    let (kind, target) = match &probe.handler {
        Handler::HttpGet(http) => (
            "httpGet",
            format!(
                "{}:{}{}",
                if http.host.is_empty() { "<pod>" } else { &http.host },
                http.port,
                http.path
            ),
        ),
        Handler::TcpSocket(tcp) => (
            "tcpSocket",
            format!(
                "{}:{}",
                if tcp.host.is_empty() { "<pod>" } else { &tcp.host },
                tcp.port
            ),
        ),
        Handler::Exec(exec) => ("exec", exec.command.join(" ")),
    };

    ProbeRow {
        role: role.to_string(),
        kind: kind.to_string(),
        target,
        period: format!("{}s", probe.period_seconds),
        timeout: format!("{}s", probe.timeout_seconds),
        failure_threshold: probe.failure_threshold.to_string(),
    }
}
