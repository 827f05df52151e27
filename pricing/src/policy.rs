//! High-value trade classification.
//!
//! The policy is advisory: it tells the UI to warn and tells settlement what
//! it must see before releasing funds. Enforcement lives in settlement.

use serde::{Deserialize, Serialize};
use skillswap_types::{Credits, SettlementParams};

/// What settlement needs before credits may move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReleaseRequirement {
    /// Funds move on confirmation.
    None,
    /// Funds move only with photo evidence attached or an admin approval.
    EvidenceOrAdminApproval,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighValueAssessment {
    pub credits: Credits,
    pub high_value: bool,
    pub requirement: ReleaseRequirement,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HighValuePolicy {
    threshold: Credits,
}

impl HighValuePolicy {
    pub fn new(threshold: Credits) -> Self {
        Self { threshold }
    }

    pub fn from_params(params: &SettlementParams) -> Self {
        Self::new(params.high_value_threshold)
    }

    pub fn threshold(&self) -> Credits {
        self.threshold
    }

    /// Inclusive: an amount equal to the threshold is high-value.
    pub fn is_high_value(&self, credits: Credits) -> bool {
        credits >= self.threshold
    }

    pub fn assess(&self, credits: Credits) -> HighValueAssessment {
        let high_value = self.is_high_value(credits);
        if high_value {
            tracing::debug!(%credits, threshold = %self.threshold, "high-value trade");
        }
        HighValueAssessment {
            credits,
            high_value,
            requirement: if high_value {
                ReleaseRequirement::EvidenceOrAdminApproval
            } else {
                ReleaseRequirement::None
            },
        }
    }
}

impl Default for HighValuePolicy {
    fn default() -> Self {
        Self::from_params(&SettlementParams::default())
    }
}
