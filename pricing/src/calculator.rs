//! The credit formula.
//!
//! `credits = round(base_rate_per_hour * hours * complexity_multiplier * demand)`
//! with half-up rounding. Inputs are non-negative, so `f64::round` (half away
//! from zero) is half-up here.

use skillswap_types::{Complexity, Credits, SettlementParams};

/// Fixed multiplier per complexity level.
pub fn complexity_multiplier(complexity: Complexity) -> f64 {
    match complexity {
        Complexity::Simple => 1.0,
        Complexity::Standard => 1.3,
        Complexity::Advanced => 1.6,
    }
}

/// Credit value of a trade.
///
/// `duration_mins` must be positive and `demand_multiplier` finite and
/// positive; callers validate before pricing.
pub fn compute_credits(
    base_rate_per_hour: f64,
    duration_mins: u32,
    complexity: Complexity,
    demand_multiplier: f64,
) -> Credits {
    debug_assert!(duration_mins > 0, "duration must be validated before pricing");
    debug_assert!(
        demand_multiplier.is_finite() && demand_multiplier > 0.0,
        "demand multiplier must be finite and positive"
    );

    let hours = f64::from(duration_mins) / 60.0;
    let raw = base_rate_per_hour * hours * complexity_multiplier(complexity) * demand_multiplier;
    if !raw.is_finite() || raw <= 0.0 {
        return Credits::ZERO;
    }
    // `as` saturates at u64::MAX.
    Credits::new(raw.round() as u64)
}

/// Calculator bound to a configured base rate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CreditCalculator {
    base_rate_per_hour: f64,
}

impl CreditCalculator {
    pub fn new(base_rate_per_hour: f64) -> Self {
        Self { base_rate_per_hour }
    }

    pub fn from_params(params: &SettlementParams) -> Self {
        Self::new(params.base_rate_per_hour)
    }

    pub fn base_rate_per_hour(&self) -> f64 {
        self.base_rate_per_hour
    }

    pub fn credits(
        &self,
        duration_mins: u32,
        complexity: Complexity,
        demand_multiplier: f64,
    ) -> Credits {
        compute_credits(
            self.base_rate_per_hour,
            duration_mins,
            complexity,
            demand_multiplier,
        )
    }
}

impl Default for CreditCalculator {
    fn default() -> Self {
        Self::from_params(&SettlementParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_hour_standard_with_demand() {
        // 25 * 1.0 * 1.3 * 1.1 = 35.75
        assert_eq!(
            compute_credits(25.0, 60, Complexity::Standard, 1.1),
            Credits::new(36)
        );
    }

    #[test]
    fn multipliers_table() {
        assert_eq!(complexity_multiplier(Complexity::Simple), 1.0);
        assert_eq!(complexity_multiplier(Complexity::Standard), 1.3);
        assert_eq!(complexity_multiplier(Complexity::Advanced), 1.6);
    }

    #[test]
    fn rounds_half_up() {
        // 10 * 0.25h * 1.0 * 1.0 = 2.5
        assert_eq!(compute_credits(10.0, 15, Complexity::Simple, 1.0), Credits::new(3));
        // 10 * 0.25h * 1.0 * 0.98 = 2.45
        assert_eq!(compute_credits(10.0, 15, Complexity::Simple, 0.98), Credits::new(2));
    }

    #[test]
    fn longest_advanced_session() {
        // 25 * 8h * 1.6 = 320
        assert_eq!(
            compute_credits(25.0, 480, Complexity::Advanced, 1.0),
            Credits::new(320)
        );
    }

    #[test]
    fn calculator_uses_configured_rate() {
        let calc = CreditCalculator::new(40.0);
        assert_eq!(calc.credits(30, Complexity::Simple, 1.0), Credits::new(20));
        assert_eq!(CreditCalculator::default().base_rate_per_hour(), 25.0);
    }
}
