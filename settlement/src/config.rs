//! Settlement configuration with TOML file support.

use serde::{Deserialize, Serialize};
use skillswap_types::{Credits, SettlementParams, DAY_SECS};

use crate::SettlementError;

/// Configuration for a settlement service.
///
/// Can be loaded from a TOML file via [`SettlementConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SettlementConfig {
    /// Validity window of a verification token, and the trade expiry.
    #[serde(default = "default_token_validity_secs")]
    pub token_validity_secs: u64,

    /// Trades at or above this credit amount need evidence or admin approval.
    #[serde(default = "default_high_value_threshold")]
    pub high_value_threshold: u64,

    /// Credits per hour before multipliers.
    #[serde(default = "default_base_rate_per_hour")]
    pub base_rate_per_hour: f64,

    /// Token generation attempts before a retryable failure.
    #[serde(default = "default_token_issue_attempts")]
    pub token_issue_attempts: u32,

    /// Credits seeded into each simulated account.
    #[serde(default)]
    pub initial_balance: u64,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_token_validity_secs() -> u64 {
    DAY_SECS
}

fn default_high_value_threshold() -> u64 {
    100
}

fn default_base_rate_per_hour() -> f64 {
    25.0
}

fn default_token_issue_attempts() -> u32 {
    3
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl SettlementConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, SettlementError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| SettlementError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, SettlementError> {
        let config: Self = toml::from_str(s).map_err(|e| SettlementError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("SettlementConfig is always serializable to TOML")
    }

    pub fn validate(&self) -> Result<(), SettlementError> {
        if !(self.base_rate_per_hour.is_finite() && self.base_rate_per_hour > 0.0) {
            return Err(SettlementError::Config(format!(
                "base_rate_per_hour must be positive, got {}",
                self.base_rate_per_hour
            )));
        }
        if self.token_validity_secs == 0 {
            return Err(SettlementError::Config(
                "token_validity_secs must be non-zero".to_string(),
            ));
        }
        if self.token_issue_attempts == 0 {
            return Err(SettlementError::Config(
                "token_issue_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The engine parameters this configuration selects.
    pub fn params(&self) -> SettlementParams {
        SettlementParams {
            base_rate_per_hour: self.base_rate_per_hour,
            high_value_threshold: Credits::new(self.high_value_threshold),
            token_validity_secs: self.token_validity_secs,
            token_issue_attempts: self.token_issue_attempts,
            ..SettlementParams::marketplace_defaults()
        }
    }
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            token_validity_secs: default_token_validity_secs(),
            high_value_threshold: default_high_value_threshold(),
            base_rate_per_hour: default_base_rate_per_hour(),
            token_issue_attempts: default_token_issue_attempts(),
            initial_balance: 0,
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}
