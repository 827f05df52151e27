use crate::state::WizardStep;
use skillswap_settlement::SubmissionError;
use skillswap_types::UserId;
use thiserror::Error;

/// Per-step validation failure. Blocks the transition and never leaves the
/// wizard.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("choose who you traded with")]
    MissingCounterparty,

    #[error("enter the skill that was exchanged")]
    MissingSkill,

    #[error("enter where the trade took place")]
    MissingLocation,

    #[error("duration must be between 15 minutes and 8 hours in 15-minute steps")]
    InvalidDuration,

    #[error("accept the terms to submit")]
    TermsNotAccepted,
}

impl ValidationError {
    /// Stable snake_case code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCounterparty => "missing_counterparty",
            Self::MissingSkill => "missing_skill",
            Self::MissingLocation => "missing_location",
            Self::InvalidDuration => "invalid_duration",
            Self::TermsNotAccepted => "terms_not_accepted",
        }
    }
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("not allowed on the {actual:?} step")]
    WrongStep { actual: WizardStep },

    #[error("already on the first step")]
    AtFirstStep,

    #[error("trade was already submitted")]
    AlreadySubmitted,

    #[error("a submission is already in flight")]
    SubmissionInFlight,

    #[error("submission failed: {0}")]
    Submission(#[from] SubmissionError),

    #[error("submission response was discarded because the wizard was reset")]
    SubmissionDiscarded,

    #[error("unknown user {0}")]
    UnknownCounterparty(UserId),

    #[error("you cannot log a trade with yourself")]
    SelfTrade,
}

impl WizardError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Submission(e) => e.is_retryable(),
            _ => false,
        }
    }
}
