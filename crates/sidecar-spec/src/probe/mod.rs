//! Health probe model and derivation
//!
//! Probes are a closed set of handler variants (HTTP, TCP socket, exec) so
//! the deriver matches exhaustively; a platform probe kind added later is a
//! compile-time extension, not a silent fallthrough. "No probe" is
//! `Option<Probe>` at every boundary rather than an empty variant.
//!
//! The JSON shape follows the platform's probe encoding (`httpGet` /
//! `tcpSocket` / `exec` keys, camelCase timing fields) so the payload handed
//! to the sidecar process decodes with the same model.

mod derive;

pub use derive::{
    derive_readiness_probe, derive_startup_probe, encode_probe, normalize_for_exec,
    ProbeEncodeError, KUBELET_PROBE_HEADER_NAME, LOCAL_ADDRESS, PROBE_HEADER_NAME, SIDECAR_NAME,
    SIDECAR_SELF_CHECK_COMMAND,
};

use serde::{Deserialize, Serialize};

/// URI scheme for HTTP probes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scheme {
    #[serde(rename = "HTTP")]
    Http,
    #[serde(rename = "HTTPS")]
    Https,
}

/// One HTTP header carried by an HTTP probe request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpHeader {
    pub name: String,
    pub value: String,
}

/// HTTP GET health check
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpGetAction {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub host: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<Scheme>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub http_headers: Vec<HttpHeader>,
}

/// Raw socket health check
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TcpSocketAction {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub host: String,
    pub port: u16,
}

/// Executable health check, run inside the container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecAction {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
}

/// The check a probe performs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Handler {
    #[serde(rename = "httpGet")]
    HttpGet(HttpGetAction),
    #[serde(rename = "tcpSocket")]
    TcpSocket(TcpSocketAction),
    #[serde(rename = "exec")]
    Exec(ExecAction),
}

fn is_zero(v: &i32) -> bool {
    *v == 0
}

/// A health probe: one handler plus shared timing fields.
///
/// Timing fields use zero for "unset", matching the platform encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Probe {
    #[serde(flatten)]
    pub handler: Handler,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub initial_delay_seconds: i32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub timeout_seconds: i32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub period_seconds: i32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub success_threshold: i32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub failure_threshold: i32,
}

impl Probe {
    /// A probe with the given handler and all timing fields unset
    pub fn new(handler: Handler) -> Self {
        Probe {
            handler,
            initial_delay_seconds: 0,
            timeout_seconds: 0,
            period_seconds: 0,
            success_threshold: 0,
            failure_threshold: 0,
        }
    }
}
