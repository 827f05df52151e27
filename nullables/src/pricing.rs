//! Nullable demand pricing.

use skillswap_pricing::DemandPricing;
use std::collections::HashMap;
use std::sync::Mutex;

/// Demand multipliers set per skill, with a fallback for everything else.
pub struct NullPricing {
    fallback: f64,
    by_skill: Mutex<HashMap<String, f64>>,
}

impl NullPricing {
    pub fn new(fallback: f64) -> Self {
        Self {
            fallback,
            by_skill: Mutex::new(HashMap::new()),
        }
    }

    pub fn set(&self, skill: &str, multiplier: f64) {
        self.by_skill
            .lock()
            .unwrap()
            .insert(skill.to_ascii_lowercase(), multiplier);
    }
}

impl Default for NullPricing {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl DemandPricing for NullPricing {
    fn demand_multiplier(&self, skill: &str) -> f64 {
        self.by_skill
            .lock()
            .unwrap()
            .get(&skill.to_ascii_lowercase())
            .copied()
            .unwrap_or(self.fallback)
    }
}
