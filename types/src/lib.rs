//! Fundamental types for SkillSwap trade settlement.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! identifiers, credit amounts, timestamps, the trade report forms, trade status,
//! settlement parameters, and the boundary traits for external collaborators.

pub mod amount;
pub mod directory;
pub mod error;
pub mod ids;
pub mod notify;
pub mod params;
pub mod state;
pub mod time;
pub mod trade;

pub use amount::Credits;
pub use directory::{CounterpartyProfile, SkillDirectory, UserDirectory};
pub use error::TypesError;
pub use ids::{HoldId, TradeId, UserId};
pub use notify::{Notice, NoticeLevel, Notifier};
pub use params::SettlementParams;
pub use state::TradeStatus;
pub use time::{Clock, SystemClock, Timestamp, DAY_SECS, HOUR_SECS};
pub use trade::{
    Attachment, Complexity, TradeDetailsForm, TradeRole, TradeVerificationForm,
    VerificationMethod,
};
