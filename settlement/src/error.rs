use skillswap_escrow::EscrowError;
use skillswap_tokens::TokenError;
use skillswap_types::{TradeId, TradeStatus, UserId};
use thiserror::Error;

/// Why a counterparty's confirmation attempt was refused.
///
/// Final for that attempt; the trade record is not modified.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenVerificationError {
    #[error("invalid token")]
    InvalidToken,

    #[error("verification window has expired")]
    Expired,

    #[error("trade was already confirmed")]
    AlreadyConfirmed,

    #[error("trade is under dispute")]
    Disputed,
}

#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("invalid submission: {0}")]
    InvalidSubmission(String),

    #[error("trade {0} not found")]
    TradeNotFound(TradeId),

    #[error("could not issue verification token: {0}")]
    TokenIssuance(#[source] TokenError),

    #[error("confirmation rejected: {0}")]
    Verification(#[from] TokenVerificationError),

    #[error("escrow error: {0}")]
    Escrow(#[from] EscrowError),

    #[error("trade {trade} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        trade: TradeId,
        from: TradeStatus,
        to: TradeStatus,
    },

    #[error("{user} is not a party to {trade}")]
    NotAParty { trade: TradeId, user: UserId },

    #[error("trade {trade} is closed ({status:?})")]
    TradeClosed { trade: TradeId, status: TradeStatus },

    #[error("trade {0} does not need high-value review")]
    ReviewNotRequired(TradeId),

    #[error("config error: {0}")]
    Config(String),
}

impl SettlementError {
    /// Whether the caller may simply try again with the same input.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::TokenIssuance(e) => e.is_retryable(),
            _ => false,
        }
    }
}
