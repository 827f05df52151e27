//! Pure step guards.

use crate::error::ValidationError;
use skillswap_types::{SettlementParams, TradeDetailsForm, TradeVerificationForm};

/// Guard for leaving the details step. Reports the first problem found.
pub fn validate_details(
    details: &TradeDetailsForm,
    params: &SettlementParams,
) -> Result<(), ValidationError> {
    match detail_errors(details, params).into_iter().next() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Every problem with the details step, in field order, for inline display.
pub fn detail_errors(details: &TradeDetailsForm, params: &SettlementParams) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if !details.counterparty_id.as_ref().is_some_and(|c| c.is_valid()) {
        errors.push(ValidationError::MissingCounterparty);
    }
    if details.skill.trim().is_empty() {
        errors.push(ValidationError::MissingSkill);
    }
    if details.location.trim().is_empty() {
        errors.push(ValidationError::MissingLocation);
    }
    if !params.is_valid_duration(details.duration_mins) {
        errors.push(ValidationError::InvalidDuration);
    }
    errors
}

/// Guard for submitting from the review step.
pub fn validate_submission(verification: &TradeVerificationForm) -> Result<(), ValidationError> {
    if verification.agree_to_terms {
        Ok(())
    } else {
        Err(ValidationError::TermsNotAccepted)
    }
}
