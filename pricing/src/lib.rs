//! Credit pricing for reported trades.
//!
//! - [`compute_credits`]: the pure credit formula, safe to call on every edit.
//! - [`HighValuePolicy`]: flags amounts that need evidence or admin approval
//!   before funds move.
//! - [`DemandPricing`]: boundary to the external demand/pricing service.

pub mod calculator;
pub mod demand;
pub mod policy;

pub use calculator::{complexity_multiplier, compute_credits, CreditCalculator};
pub use demand::{DemandPricing, FixedDemand};
pub use policy::{HighValueAssessment, HighValuePolicy, ReleaseRequirement};
