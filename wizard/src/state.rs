//! The wizard as a tagged union over its steps.
//!
//! Each transition returns a new state holding a fresh copy of the draft, so
//! every guard here is a pure function of the current value.

use crate::error::WizardError;
use crate::validation::{validate_details, validate_submission};
use serde::{Deserialize, Serialize};
use skillswap_settlement::TradeRecord;
use skillswap_types::{SettlementParams, TradeDetailsForm, TradeVerificationForm};

/// Everything the user has entered so far.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeDraft {
    pub details: TradeDetailsForm,
    pub verification: TradeVerificationForm,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WizardStep {
    Details,
    Verification,
    Review,
    Submitted,
}

impl WizardStep {
    /// 1-based position shown in the progress bar.
    pub fn number(&self) -> u8 {
        match self {
            Self::Details => 1,
            Self::Verification => 2,
            Self::Review | Self::Submitted => 3,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum WizardState {
    Details(TradeDraft),
    Verification(TradeDraft),
    Review(TradeDraft),
    Submitted(Box<TradeRecord>),
}

impl WizardState {
    pub fn step(&self) -> WizardStep {
        match self {
            Self::Details(_) => WizardStep::Details,
            Self::Verification(_) => WizardStep::Verification,
            Self::Review(_) => WizardStep::Review,
            Self::Submitted(_) => WizardStep::Submitted,
        }
    }

    /// The draft, or `None` once submitted.
    pub fn draft(&self) -> Option<&TradeDraft> {
        match self {
            Self::Details(d) | Self::Verification(d) | Self::Review(d) => Some(d),
            Self::Submitted(_) => None,
        }
    }

    /// Details → Verification (guarded), Verification → Review (always).
    /// Review only moves forward by submitting.
    pub fn next(&self, params: &SettlementParams) -> Result<WizardState, WizardError> {
        match self {
            Self::Details(d) => {
                validate_details(&d.details, params)?;
                Ok(Self::Verification(d.clone()))
            }
            Self::Verification(d) => Ok(Self::Review(d.clone())),
            Self::Review(_) => Err(WizardError::WrongStep {
                actual: WizardStep::Review,
            }),
            Self::Submitted(_) => Err(WizardError::AlreadySubmitted),
        }
    }

    /// One step back. Never out of `Submitted`.
    pub fn back(&self) -> Result<WizardState, WizardError> {
        match self {
            Self::Details(_) => Err(WizardError::AtFirstStep),
            Self::Verification(d) => Ok(Self::Details(d.clone())),
            Self::Review(d) => Ok(Self::Verification(d.clone())),
            Self::Submitted(_) => Err(WizardError::AlreadySubmitted),
        }
    }

    /// Review → Submitted, guarded by the terms checkbox.
    pub fn check_submittable(&self) -> Result<&TradeDraft, WizardError> {
        match self {
            Self::Review(d) => {
                validate_submission(&d.verification)?;
                Ok(d)
            }
            Self::Submitted(_) => Err(WizardError::AlreadySubmitted),
            other => Err(WizardError::WrongStep {
                actual: other.step(),
            }),
        }
    }
}
