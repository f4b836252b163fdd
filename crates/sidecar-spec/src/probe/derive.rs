//! Derivation of the sidecar's startup and readiness probes
//!
//! The sidecar fronts the user container, so its probes are derived from the
//! user's readiness probe rather than copied: a single-shot exec probe covers
//! startup (the self-check retries internally at sub-second granularity,
//! faster than the platform's minimum polling period), and a steady-state
//! HTTP probe through the sidecar covers readiness. The original user probe
//! is separately normalized so the self-check can replay it against the
//! sidecar's local view of the user container.

use super::{ExecAction, Handler, HttpGetAction, HttpHeader, Probe, Scheme, TcpSocketAction};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Host the sidecar reaches the user container on
pub const LOCAL_ADDRESS: &str = "127.0.0.1";

/// Name of the sidecar container, used as the probe header value
pub const SIDECAR_NAME: &str = "proxy-sidecar";

/// Header marking a readiness request as an internal health probe
pub const PROBE_HEADER_NAME: &str = "X-Sidecar-Probe";

/// Header appended to the normalized user probe replayed by the self-check
pub const KUBELET_PROBE_HEADER_NAME: &str = "X-Kubelet-Probe";

/// Entry point of the sidecar's self-check
pub const SIDECAR_SELF_CHECK_COMMAND: &str = "/usr/local/bin/proxy-sidecar";

/// Error reported upward when the normalized probe payload cannot be
/// serialized for the env-var transport.
#[derive(Debug, Error)]
#[error("failed to serialize readiness probe: {0}")]
pub struct ProbeEncodeError(#[from] serde_json::Error);

/// Builds the aggressive startup probe, if one should be installed.
///
/// A user probe with an explicit period opts out: the platform's own gating
/// on the readiness probe is relied upon instead. Otherwise the startup probe
/// is a single-shot exec check with the progress deadline as its timeout; the
/// self-check retries internally, so no outer retries are added.
pub fn derive_startup_probe(user: Option<&Probe>, progress_deadline: Duration) -> Option<Probe> {
    if let Some(p) = user {
        if p.period_seconds > 0 {
            debug!(
                period_seconds = p.period_seconds,
                "User probe sets an explicit period, skipping startup probe"
            );
            return None;
        }
    }

    let deadline_secs = progress_deadline.as_secs();
    Some(Probe {
        handler: Handler::Exec(ExecAction {
            command: vec![
                SIDECAR_SELF_CHECK_COMMAND.to_string(),
                "--probe-timeout".to_string(),
                format!("{}s", deadline_secs),
            ],
        }),
        initial_delay_seconds: user.map_or(0, |p| p.initial_delay_seconds),
        timeout_seconds: deadline_secs as i32,
        period_seconds: 1,
        success_threshold: 1,
        failure_threshold: 1,
    })
}

/// Builds the steady-state readiness probe.
///
/// Once the sidecar fronts traffic, readiness is checked through it no matter
/// what kind of check the user declared: the handler is always an HTTP GET
/// against the sidecar port, marked with the internal probe header. The user
/// probe only contributes its timing fields.
pub fn derive_readiness_probe(user: Option<&Probe>, sidecar_port: u16) -> Probe {
    let mut out = Probe::new(Handler::HttpGet(HttpGetAction {
        port: sidecar_port,
        http_headers: vec![HttpHeader {
            name: PROBE_HEADER_NAME.to_string(),
            value: SIDECAR_NAME.to_string(),
        }],
        ..Default::default()
    }));

    if let Some(p) = user {
        out.initial_delay_seconds = p.initial_delay_seconds;
        out.timeout_seconds = p.timeout_seconds;
        out.period_seconds = p.period_seconds;
        out.success_threshold = p.success_threshold;
        out.failure_threshold = p.failure_threshold;
    }

    // Default to the fastest allowed steady-state polling.
    if out.period_seconds == 0 {
        out.period_seconds = 1;
    }

    out
}

/// Rewrites the user probe so the sidecar's self-check can run it.
///
/// The self-check executes inside the sidecar and reaches the user container
/// through the sidecar's observed port on loopback. An exec check cannot be
/// proxied, so it is downgraded to a TCP check; the user's exec probe still
/// runs natively against the user container elsewhere.
pub fn normalize_for_exec(user: Option<Probe>, sidecar_observed_port: u16) -> Option<Probe> {
    let mut probe = user?;

    match &mut probe.handler {
        Handler::HttpGet(http) => {
            http.host = LOCAL_ADDRESS.to_string();
            http.port = sidecar_observed_port;
            if http.scheme.is_none() {
                http.scheme = Some(Scheme::Http);
            }
            http.http_headers.push(HttpHeader {
                name: KUBELET_PROBE_HEADER_NAME.to_string(),
                value: SIDECAR_NAME.to_string(),
            });
        }
        Handler::TcpSocket(tcp) => {
            tcp.host = LOCAL_ADDRESS.to_string();
            tcp.port = sidecar_observed_port;
        }
        Handler::Exec(_) => {
            debug!("Downgrading exec probe to a TCP check for the self-check payload");
            probe.handler = Handler::TcpSocket(TcpSocketAction {
                host: LOCAL_ADDRESS.to_string(),
                port: sidecar_observed_port,
            });
        }
    }

    // The platform forbids a zero timeout once polling is periodic.
    if probe.period_seconds > 0 && probe.timeout_seconds < 1 {
        probe.timeout_seconds = 1;
    }

    Some(probe)
}

/// Serializes a normalized probe for the env-var transport to the sidecar
pub fn encode_probe(probe: &Probe) -> Result<String, ProbeEncodeError> {
    Ok(serde_json::to_string(probe)?)
}
