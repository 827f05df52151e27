//! The 3-step "log a trade" wizard.
//!
//! [`TradeWizard`] drives a [`WizardState`] through
//! `Details → Verification → Review → Submitted`. Step guards live in
//! [`validation`] and are pure; the machine owns the draft, recomputes
//! proposed credits, and hands a [`SubmissionRequest`] to a
//! [`TradeBackend`](skillswap_settlement::TradeBackend).
//!
//! Validation errors never leave the wizard. Backend failures keep the
//! draft on the review step and are reported as retryable where they are.

pub mod error;
pub mod machine;
pub mod state;
pub mod submission;
pub mod validation;

pub use error::{ValidationError, WizardError};
pub use machine::{CreditQuote, TradeWizard};
pub use state::{TradeDraft, WizardState, WizardStep};
pub use submission::SubmissionRequest;
