//! Sidecar resource allocation
//!
//! The sidecar's CPU and memory reservation can be sized as a fraction of the
//! user container's own reservation, so its footprint tracks the workload
//! without per-revision hand tuning. The fraction comes from an annotation on
//! the owning object; fixed operator-configured amounts seed the result and
//! stand wherever no override applies. User-declared quantities are not
//! trusted: the milli-unit scaling saturates instead of overflowing.

mod boundary;

pub use boundary::{AllocationBoundaries, ResourceBoundary};

use crate::config::SidecarResourceConfig;
use crate::models::{ResourceList, ResourceName, ResourceRequirements};
use crate::quantity::Quantity;
use std::collections::BTreeMap;
use tracing::debug;

/// Annotation carrying the sidecar resource percentage (0-100) as text
pub const RESOURCE_PERCENTAGE_ANNOTATION: &str = "sidecar.provisioner.dev/resource-percentage";

/// Reads a percentage annotation as a fraction.
///
/// Absent or non-numeric text is "no override", never an error. Values above
/// 100 are accepted here and clamped later by the boundary profiles only.
pub fn fraction_from_percentage(
    annotations: &BTreeMap<String, String>,
    key: &str,
) -> Option<f64> {
    annotations
        .get(key)
        .and_then(|v| v.parse::<f64>().ok())
        .map(|v| v / 100.0)
}

/// Computes the sidecar's resource requirements.
///
/// Requests and limits are seeded from the fixed configuration; with a
/// percentage annotation present, CPU and memory (never ephemeral storage)
/// are overridden per role by scaling the user container's corresponding
/// quantity and clamping into the matching boundary. The limits map is
/// omitted entirely when empty: "no limits asserted" is not "zero resources".
pub fn allocate(
    fixed: &SidecarResourceConfig,
    user: &ResourceRequirements,
    annotations: &BTreeMap<String, String>,
    boundaries: &AllocationBoundaries,
) -> ResourceRequirements {
    let mut requests = ResourceList::new();
    let mut limits = ResourceList::new();

    for (name, request, limit) in [
        (ResourceName::Cpu, fixed.cpu_request, fixed.cpu_limit),
        (ResourceName::Memory, fixed.memory_request, fixed.memory_limit),
        (
            ResourceName::EphemeralStorage,
            fixed.ephemeral_storage_request,
            fixed.ephemeral_storage_limit,
        ),
    ] {
        if let Some(q) = request {
            requests.insert(name, q);
        }
        if let Some(q) = limit {
            limits.insert(name, q);
        }
    }

    if let Some(fraction) = fraction_from_percentage(annotations, RESOURCE_PERCENTAGE_ANNOTATION) {
        debug!(fraction, "Applying resource percentage override");

        if let Some(q) = scale_within(
            user.request(ResourceName::Cpu),
            fraction,
            &boundaries.cpu_request,
        ) {
            requests.insert(ResourceName::Cpu, q);
        }
        if let Some(q) = scale_within(
            user.limit(ResourceName::Cpu),
            fraction,
            &boundaries.cpu_limit,
        ) {
            limits.insert(ResourceName::Cpu, q);
        }
        if let Some(q) = scale_within(
            user.request(ResourceName::Memory),
            fraction,
            &boundaries.memory_request,
        ) {
            requests.insert(ResourceName::Memory, q);
        }
        if let Some(q) = scale_within(
            user.limit(ResourceName::Memory),
            fraction,
            &boundaries.memory_limit,
        ) {
            limits.insert(ResourceName::Memory, q);
        }
    }

    ResourceRequirements {
        requests,
        limits: if limits.is_empty() { None } else { Some(limits) },
    }
}

/// Scales `source` by `fraction` in milli-units and clamps into `boundary`.
///
/// Returns `None` for a zero (unset) source: no override is applied and the
/// seeded value stands. The scaling is guarded in two stages: a source whose
/// whole-unit value would overflow the milli conversion is substituted with
/// the maximum milli value before multiplying, and the floating product is
/// capped before converting back, since `i64::MAX as f64` rounds above
/// `i64::MAX`.
fn scale_within(
    source: Quantity,
    fraction: f64,
    boundary: &ResourceBoundary,
) -> Option<Quantity> {
    if source.is_zero() {
        return None;
    }

    let milli = if source.value() < i64::MAX / 1000 {
        source.milli_value()
    } else {
        i64::MAX - 1
    };

    let product = milli as f64 * fraction;
    let scaled = if product < i64::MAX as f64 {
        product as i64
    } else {
        i64::MAX
    };

    Some(boundary.apply(Quantity::from_milli(scaled)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::Format;

    fn annotations(percentage: &str) -> BTreeMap<String, String> {
        BTreeMap::from([(
            RESOURCE_PERCENTAGE_ANNOTATION.to_string(),
            percentage.to_string(),
        )])
    }

    fn user_with_cpu_request(cpu: &str) -> ResourceRequirements {
        let mut user = ResourceRequirements::default();
        user.requests
            .insert(ResourceName::Cpu, cpu.parse().unwrap());
        user
    }

    #[test]
    fn test_fraction_parsing() {
        assert_eq!(
            fraction_from_percentage(&annotations("10"), RESOURCE_PERCENTAGE_ANNOTATION),
            Some(0.1)
        );
        assert_eq!(
            fraction_from_percentage(&annotations("0.5"), RESOURCE_PERCENTAGE_ANNOTATION),
            Some(0.005)
        );
        assert_eq!(
            fraction_from_percentage(&annotations("lots"), RESOURCE_PERCENTAGE_ANNOTATION),
            None
        );
        assert_eq!(
            fraction_from_percentage(&BTreeMap::new(), RESOURCE_PERCENTAGE_ANNOTATION),
            None
        );
    }

    #[test]
    fn test_percentage_of_cpu_request() {
        let out = allocate(
            &SidecarResourceConfig::default(),
            &user_with_cpu_request("1000m"),
            &annotations("10"),
            &AllocationBoundaries::default(),
        );
        assert_eq!(out.request(ResourceName::Cpu), Quantity::from_milli(100));
    }

    #[test]
    fn test_out_of_domain_percentage_clamps_to_ceiling() {
        // "200" is numeric but above 100; the result is clamped by the
        // boundary ceiling rather than rejected.
        let out = allocate(
            &SidecarResourceConfig::default(),
            &user_with_cpu_request("2"),
            &annotations("200"),
            &AllocationBoundaries::default(),
        );
        assert_eq!(out.request(ResourceName::Cpu), Quantity::from_milli(1000));
    }

    #[test]
    fn test_malformed_percentage_keeps_fixed_values() {
        let out = allocate(
            &SidecarResourceConfig::default(),
            &user_with_cpu_request("1000m"),
            &annotations("not-a-number"),
            &AllocationBoundaries::default(),
        );
        assert_eq!(out.request(ResourceName::Cpu), Quantity::from_milli(25));
        assert!(out.limits.is_none());
    }

    #[test]
    fn test_zero_source_is_not_overridden() {
        // No CPU request on the user container: the fixed default stands
        // regardless of the fraction.
        let out = allocate(
            &SidecarResourceConfig::default(),
            &ResourceRequirements::default(),
            &annotations("80"),
            &AllocationBoundaries::default(),
        );
        assert_eq!(out.request(ResourceName::Cpu), Quantity::from_milli(25));
        assert!(out.requests.get(&ResourceName::Memory).is_none());
    }

    #[test]
    fn test_memory_scaling_clamps_into_boundary() {
        let mut user = ResourceRequirements::default();
        user.requests
            .insert(ResourceName::Memory, "4Gi".parse().unwrap());
        user.limits = Some(ResourceList::from([(
            ResourceName::Memory,
            "8Gi".parse().unwrap(),
        )]));

        let out = allocate(
            &SidecarResourceConfig::default(),
            &user,
            &annotations("10"),
            &AllocationBoundaries::default(),
        );
        // 10% of 4Gi = 409.6Mi, above the 200Mi request ceiling
        assert_eq!(
            out.request(ResourceName::Memory),
            Quantity::from_value(200 * 1024 * 1024)
        );
        // 10% of 8Gi = 819.2Mi, above the 500Mi limit ceiling
        assert_eq!(
            out.limit(ResourceName::Memory),
            Quantity::from_value(500 * 1024 * 1024)
        );
    }

    #[test]
    fn test_small_fraction_clamps_to_floor() {
        let out = allocate(
            &SidecarResourceConfig::default(),
            &user_with_cpu_request("100m"),
            &annotations("1"),
            &AllocationBoundaries::default(),
        );
        // 1% of 100m = 1m, below the 25m floor
        assert_eq!(out.request(ResourceName::Cpu), Quantity::from_milli(25));
    }

    #[test]
    fn test_overflow_safe_scaling() {
        // A near-maximum source must never produce a negative or wrapped
        // result; with a wide-open boundary the product is the capped maximum.
        let wide = ResourceBoundary::new(Quantity::zero(), Quantity::from_milli(i64::MAX));
        let max = format!("{}", i64::MAX).parse::<Quantity>().unwrap();

        let scaled = scale_within(max, 1.0, &wide).unwrap();
        assert_eq!(scaled, Quantity::from_milli(i64::MAX));
        assert!(scaled.milli_value() > 0);

        let scaled = scale_within(max, 0.5, &wide).unwrap();
        assert!(scaled.milli_value() > 0);
    }

    #[test]
    fn test_overflowing_source_still_lands_in_boundary() {
        let out = allocate(
            &SidecarResourceConfig::default(),
            &user_with_cpu_request(&format!("{}", i64::MAX)),
            &annotations("50"),
            &AllocationBoundaries::default(),
        );
        assert_eq!(out.request(ResourceName::Cpu), Quantity::from_milli(1000));
    }

    #[test]
    fn test_limits_map_omitted_when_empty() {
        let out = allocate(
            &SidecarResourceConfig::default(),
            &user_with_cpu_request("1000m"),
            &annotations("10"),
            &AllocationBoundaries::default(),
        );
        assert!(out.limits.is_none(), "empty limits map must be absent");
    }

    #[test]
    fn test_fixed_limits_pass_through() {
        let fixed = SidecarResourceConfig {
            ephemeral_storage_request: Some("512Mi".parse().unwrap()),
            ephemeral_storage_limit: Some("1Gi".parse().unwrap()),
            ..SidecarResourceConfig::default()
        };
        // Ephemeral storage is never percentage-scaled
        let mut user = ResourceRequirements::default();
        user.requests
            .insert(ResourceName::EphemeralStorage, "100Gi".parse().unwrap());

        let out = allocate(
            &fixed,
            &user,
            &annotations("50"),
            &AllocationBoundaries::default(),
        );
        assert_eq!(
            out.request(ResourceName::EphemeralStorage).to_string(),
            "512Mi"
        );
        assert_eq!(out.limit(ResourceName::EphemeralStorage).to_string(), "1Gi");
    }

    #[test]
    fn test_boundary_property_for_valid_fractions() {
        let boundaries = AllocationBoundaries::default();
        let floor = Quantity::from_milli(25);
        let ceiling = Quantity::from_milli(1000);
        for percentage in ["1", "10", "25", "50", "75", "100"] {
            for cpu in ["1m", "100m", "1", "4", "64"] {
                let out = allocate(
                    &SidecarResourceConfig::default(),
                    &user_with_cpu_request(cpu),
                    &annotations(percentage),
                    &boundaries,
                );
                let got = out.request(ResourceName::Cpu);
                assert!(
                    got >= floor && got <= ceiling,
                    "{}% of {} gave {} outside [{}, {}]",
                    percentage,
                    cpu,
                    got,
                    floor,
                    ceiling
                );
            }
        }
    }

    #[test]
    fn test_scaled_memory_renders_cleanly() {
        let mut user = ResourceRequirements::default();
        user.requests
            .insert(ResourceName::Memory, "1Gi".parse().unwrap());
        let out = allocate(
            &SidecarResourceConfig::default(),
            &user,
            &annotations("10"),
            &AllocationBoundaries::default(),
        );
        // 10% of 1Gi = 107374182.4 millibytes-of-bytes rounds through milli
        // precision and stays within [50Mi, 200Mi]
        let got = out.request(ResourceName::Memory);
        assert!(got >= Quantity::from_value(50 * 1024 * 1024).with_format(Format::BinarySi));
        assert!(got <= Quantity::from_value(200 * 1024 * 1024).with_format(Format::BinarySi));
    }
}
