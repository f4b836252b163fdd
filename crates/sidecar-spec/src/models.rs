//! Core data models for sidecar provisioning

use crate::probe::Probe;
use crate::quantity::Quantity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Resource kinds a container can reserve
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceName {
    #[serde(rename = "cpu")]
    Cpu,
    #[serde(rename = "memory")]
    Memory,
    #[serde(rename = "ephemeral-storage")]
    EphemeralStorage,
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceName::Cpu => write!(f, "cpu"),
            ResourceName::Memory => write!(f, "memory"),
            ResourceName::EphemeralStorage => write!(f, "ephemeral-storage"),
        }
    }
}

/// Mapping from resource kind to amount. A missing key means "unspecified",
/// which is not the same thing as a zero quantity.
pub type ResourceList = BTreeMap<ResourceName, Quantity>;

/// Requested and limited resource amounts for one container.
///
/// `limits` is `None` when no limits are asserted at all; downstream
/// consumers treat an absent limits map differently from an empty one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequirements {
    #[serde(default, skip_serializing_if = "ResourceList::is_empty")]
    pub requests: ResourceList,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<ResourceList>,
}

impl ResourceRequirements {
    /// The requested amount for `name`, or the zero quantity if unspecified
    pub fn request(&self, name: ResourceName) -> Quantity {
        self.requests.get(&name).copied().unwrap_or_default()
    }

    /// The limit for `name`, or the zero quantity if unspecified
    pub fn limit(&self, name: ResourceName) -> Quantity {
        self.limits
            .as_ref()
            .and_then(|l| l.get(&name))
            .copied()
            .unwrap_or_default()
    }
}

/// The user workload container's view consumed by provisioning: its declared
/// resources, its readiness probe, and the annotations on the owning object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadSpec {
    #[serde(default)]
    pub resources: ResourceRequirements,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readiness_probe: Option<Probe>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}
