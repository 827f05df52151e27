//! The submission seam between a trade-reporting client and settlement.

use crate::error::SettlementError;
use crate::record::TradeRecord;
use crate::service::SettlementService;
use skillswap_tokens::RandomSource;
use skillswap_types::{TradeDetailsForm, TradeVerificationForm, UserId};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Why a submission did not produce a record. The client keeps its draft.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("settlement backend unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Settlement(#[from] SettlementError),
}

impl SubmissionError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Unavailable(_) => true,
            Self::Settlement(e) => e.is_retryable(),
        }
    }
}

/// Anything that can turn a finished report into a pending trade record.
pub trait TradeBackend {
    fn submit(
        &mut self,
        initiator: &UserId,
        details: &TradeDetailsForm,
        verification: &TradeVerificationForm,
    ) -> Result<TradeRecord, SubmissionError>;
}

impl<R: RandomSource> TradeBackend for SettlementService<R> {
    fn submit(
        &mut self,
        initiator: &UserId,
        details: &TradeDetailsForm,
        verification: &TradeVerificationForm,
    ) -> Result<TradeRecord, SubmissionError> {
        Ok(self.submit_trade(initiator, details, verification)?)
    }
}

/// A service shared between several wizards.
impl<R: RandomSource> TradeBackend for Arc<Mutex<SettlementService<R>>> {
    fn submit(
        &mut self,
        initiator: &UserId,
        details: &TradeDetailsForm,
        verification: &TradeVerificationForm,
    ) -> Result<TradeRecord, SubmissionError> {
        let mut service = self
            .lock()
            .map_err(|_| SubmissionError::Unavailable("settlement lock poisoned".to_string()))?;
        Ok(service.submit_trade(initiator, details, verification)?)
    }
}
