//! Boundary to the external demand/pricing service.

/// Supplies the demand multiplier for a skill.
///
/// Implementations must return a finite, positive number; the calculator
/// trusts it.
pub trait DemandPricing: Send + Sync {
    fn demand_multiplier(&self, skill: &str) -> f64;
}

/// A flat multiplier for every skill.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedDemand(pub f64);

impl Default for FixedDemand {
    fn default() -> Self {
        Self(1.0)
    }
}

impl DemandPricing for FixedDemand {
    fn demand_multiplier(&self, _skill: &str) -> f64 {
        self.0
    }
}
