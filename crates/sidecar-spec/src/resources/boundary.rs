//! Floor/ceiling profiles for computed sidecar resources
//!
//! Percentage-of-user sizing can otherwise produce a useless allocation
//! (1% of a tiny request) or a dangerous one (100% of a huge request), so
//! every computed value is clamped into a per-kind, per-role boundary.

use crate::quantity::{Format, Quantity};

/// A floor and ceiling a computed quantity is clamped into
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceBoundary {
    min: Quantity,
    max: Quantity,
}

impl ResourceBoundary {
    pub fn new(min: Quantity, max: Quantity) -> Self {
        ResourceBoundary { min, max }
    }

    /// Clamps `quantity` into `[min, max]`
    pub fn apply(&self, quantity: Quantity) -> Quantity {
        if quantity < self.min {
            self.min
        } else if quantity > self.max {
            self.max
        } else {
            quantity
        }
    }
}

/// The four boundary profiles used by the allocator. Ephemeral storage has
/// none: it is never percentage-scaled, only passed through from config.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationBoundaries {
    pub cpu_request: ResourceBoundary,
    pub cpu_limit: ResourceBoundary,
    pub memory_request: ResourceBoundary,
    pub memory_limit: ResourceBoundary,
}

fn mib(n: i64) -> Quantity {
    Quantity::from_value(n * 1024 * 1024).with_format(Format::BinarySi)
}

impl Default for AllocationBoundaries {
    fn default() -> Self {
        AllocationBoundaries {
            cpu_request: ResourceBoundary::new(Quantity::from_milli(25), Quantity::from_milli(1000)),
            cpu_limit: ResourceBoundary::new(Quantity::from_milli(40), Quantity::from_milli(500)),
            memory_request: ResourceBoundary::new(mib(50), mib(200)),
            memory_limit: ResourceBoundary::new(mib(200), mib(500)),
        }
    }
}
