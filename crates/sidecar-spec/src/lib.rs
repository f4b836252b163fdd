//! Sidecar spec provisioning
//!
//! This crate computes the two nontrivial pieces of the proxy sidecar's
//! container spec for one workload revision:
//! - Resource allocation: the sidecar's CPU/memory reservation as a bounded
//!   fraction of the user container's own reservation, with overflow-safe
//!   milli-unit scaling and floor/ceiling clamping
//! - Probe derivation: an aggressive exec startup probe, a steady-state HTTP
//!   readiness probe through the sidecar, and a normalized copy of the user
//!   probe for the self-check's encoded payload
//!
//! Both computations are pure functions of their inputs plus an immutable
//! configuration snapshot; an external assembler merges their outputs into
//! the final container spec.

pub mod config;
pub mod models;
pub mod probe;
pub mod quantity;
pub mod resources;

pub use config::{ConfigError, SidecarConfig, SidecarResourceConfig};
pub use models::{ResourceList, ResourceName, ResourceRequirements, WorkloadSpec};
pub use probe::{
    derive_readiness_probe, derive_startup_probe, encode_probe, normalize_for_exec, ExecAction,
    Handler, HttpGetAction, HttpHeader, Probe, ProbeEncodeError, Scheme, TcpSocketAction,
};
pub use quantity::{Quantity, QuantityParseError};
pub use resources::{
    allocate, fraction_from_percentage, AllocationBoundaries, ResourceBoundary,
    RESOURCE_PERCENTAGE_ANNOTATION,
};
