//! Provisioning configuration
//!
//! Configuration is an explicitly constructed, immutable snapshot passed into
//! the allocator and deriver at call time. Nothing here reads ambient global
//! state, so tests substitute their own snapshots without mutation. One
//! snapshot is valid for the duration of a single provisioning pass.

use crate::quantity::{Quantity, QuantityParseError};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Default deadline before the platform gives up on a starting revision
pub const DEFAULT_PROGRESS_DEADLINE: Duration = Duration::from_secs(600);

/// Default port the sidecar serves proxied traffic and readiness checks on
pub const DEFAULT_SERVING_PORT: u16 = 8012;

/// Error produced when a configuration value cannot be parsed
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid quantity for {key}: {source}")]
    InvalidQuantity {
        key: &'static str,
        #[source]
        source: QuantityParseError,
    },
    #[error("invalid duration for {key}: {value:?}")]
    InvalidDuration { key: &'static str, value: String },
    #[error("invalid port for {key}: {value:?}")]
    InvalidPort { key: &'static str, value: String },
}

/// Operator-chosen fixed amounts for the sidecar's own footprint.
///
/// These seed the allocator's output; any kind/role left `None` stays absent
/// unless a percentage override fills it in.
#[derive(Debug, Clone, PartialEq)]
pub struct SidecarResourceConfig {
    pub cpu_request: Option<Quantity>,
    pub cpu_limit: Option<Quantity>,
    pub memory_request: Option<Quantity>,
    pub memory_limit: Option<Quantity>,
    pub ephemeral_storage_request: Option<Quantity>,
    pub ephemeral_storage_limit: Option<Quantity>,
}

impl Default for SidecarResourceConfig {
    fn default() -> Self {
        SidecarResourceConfig {
            cpu_request: Some(Quantity::from_milli(25)),
            cpu_limit: None,
            memory_request: None,
            memory_limit: None,
            ephemeral_storage_request: None,
            ephemeral_storage_limit: None,
        }
    }
}

/// One provisioning pass's configuration snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct SidecarConfig {
    pub resources: SidecarResourceConfig,
    /// Flows verbatim into the startup probe's timeout; it is data, not a
    /// control-flow timeout on the computation itself.
    pub progress_deadline: Duration,
    pub serving_port: u16,
}

impl Default for SidecarConfig {
    fn default() -> Self {
        SidecarConfig {
            resources: SidecarResourceConfig::default(),
            progress_deadline: DEFAULT_PROGRESS_DEADLINE,
            serving_port: DEFAULT_SERVING_PORT,
        }
    }
}

const KEY_CPU_REQUEST: &str = "sidecar-cpu-request";
const KEY_CPU_LIMIT: &str = "sidecar-cpu-limit";
const KEY_MEMORY_REQUEST: &str = "sidecar-memory-request";
const KEY_MEMORY_LIMIT: &str = "sidecar-memory-limit";
const KEY_EPHEMERAL_STORAGE_REQUEST: &str = "sidecar-ephemeral-storage-request";
const KEY_EPHEMERAL_STORAGE_LIMIT: &str = "sidecar-ephemeral-storage-limit";
const KEY_PROGRESS_DEADLINE: &str = "progress-deadline";
const KEY_SERVING_PORT: &str = "serving-port";

fn quantity_at(
    data: &BTreeMap<String, String>,
    key: &'static str,
) -> Result<Option<Quantity>, ConfigError> {
    match data.get(key) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|source| ConfigError::InvalidQuantity { key, source }),
        None => Ok(None),
    }
}

impl SidecarConfig {
    /// Builds a snapshot from a flat key/value source.
    ///
    /// Unknown keys are ignored; absent keys keep their defaults. The
    /// progress deadline accepts whole seconds with an optional `s` suffix.
    pub fn from_map(data: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let mut cfg = SidecarConfig::default();

        if let Some(q) = quantity_at(data, KEY_CPU_REQUEST)? {
            cfg.resources.cpu_request = Some(q);
        }
        if let Some(q) = quantity_at(data, KEY_CPU_LIMIT)? {
            cfg.resources.cpu_limit = Some(q);
        }
        if let Some(q) = quantity_at(data, KEY_MEMORY_REQUEST)? {
            cfg.resources.memory_request = Some(q);
        }
        if let Some(q) = quantity_at(data, KEY_MEMORY_LIMIT)? {
            cfg.resources.memory_limit = Some(q);
        }
        if let Some(q) = quantity_at(data, KEY_EPHEMERAL_STORAGE_REQUEST)? {
            cfg.resources.ephemeral_storage_request = Some(q);
        }
        if let Some(q) = quantity_at(data, KEY_EPHEMERAL_STORAGE_LIMIT)? {
            cfg.resources.ephemeral_storage_limit = Some(q);
        }

        if let Some(raw) = data.get(KEY_PROGRESS_DEADLINE) {
            let secs = raw
                .strip_suffix('s')
                .unwrap_or(raw)
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidDuration {
                    key: KEY_PROGRESS_DEADLINE,
                    value: raw.clone(),
                })?;
            cfg.progress_deadline = Duration::from_secs(secs);
        }

        if let Some(raw) = data.get(KEY_SERVING_PORT) {
            cfg.serving_port = raw.parse().map_err(|_| ConfigError::InvalidPort {
                key: KEY_SERVING_PORT,
                value: raw.clone(),
            })?;
        }

        Ok(cfg)
    }
}
