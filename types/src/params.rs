//! Numeric rules for trade reporting and settlement.

use crate::amount::Credits;
use crate::time::DAY_SECS;
use serde::{Deserialize, Serialize};

/// Tunable settlement parameters shared by the wizard and the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SettlementParams {
    // ── Duration domain ──────────────────────────────────────────────────
    /// Shortest reportable session, in minutes.
    pub min_duration_mins: u32,

    /// Longest reportable session, in minutes.
    pub max_duration_mins: u32,

    /// Durations must be a multiple of this step.
    pub duration_step_mins: u32,

    // ── Pricing ──────────────────────────────────────────────────────────
    /// Credits per hour before complexity and demand multipliers.
    pub base_rate_per_hour: f64,

    /// Trades at or above this amount need evidence or admin approval.
    pub high_value_threshold: Credits,

    // ── Verification tokens ──────────────────────────────────────────────
    /// How long an issued PIN / QR token stays valid. Also the trade expiry.
    pub token_validity_secs: u64,

    /// Generation attempts before issuance gives up with a retryable error.
    pub token_issue_attempts: u32,
}

impl SettlementParams {
    pub fn marketplace_defaults() -> Self {
        Self {
            min_duration_mins: 15,
            max_duration_mins: 480,
            duration_step_mins: 15,
            base_rate_per_hour: 25.0,
            high_value_threshold: Credits::new(100),
            token_validity_secs: DAY_SECS,
            token_issue_attempts: 3,
        }
    }

    /// Whether `mins` lies in the reportable domain.
    pub fn is_valid_duration(&self, mins: u32) -> bool {
        mins >= self.min_duration_mins
            && mins <= self.max_duration_mins
            && self.duration_step_mins != 0
            && mins % self.duration_step_mins == 0
    }
}

impl Default for SettlementParams {
    fn default() -> Self {
        Self::marketplace_defaults()
    }
}
