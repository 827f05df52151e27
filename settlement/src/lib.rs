//! Trade settlement.
//!
//! Owns the lifecycle of a reported trade from submission to confirmation,
//! dispute or expiry:
//! 1. **Submit**: a verification token is minted and, with escrow enabled,
//!    the payer's credits are held.
//! 2. **Confirm**: the counterparty presents the token; credits move unless
//!    the trade is high-value and still needs evidence or admin approval.
//! 3. **Close**: disputes and the expiry sweep void holds and revoke tokens.
//!
//! Records are never deleted.

pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod record;
pub mod service;

pub use backend::{SubmissionError, TradeBackend};
pub use config::SettlementConfig;
pub use error::{SettlementError, TokenVerificationError};
pub use events::SettlementEvent;
pub use record::{Dispute, FundsState, ReviewState, SettlementPath, TradeRecord};
pub use service::{Confirmation, SettlementService};
