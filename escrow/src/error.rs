use crate::hold::HoldState;
use skillswap_types::{Credits, HoldId, UserId};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EscrowError {
    #[error("insufficient credits for {user}: need {needed}, have {available}")]
    InsufficientCredits {
        user: UserId,
        needed: Credits,
        available: Credits,
    },

    #[error("hold {0} not found")]
    HoldNotFound(HoldId),

    #[error("hold {hold} is already {state:?}")]
    HoldAlreadySettled { hold: HoldId, state: HoldState },

    #[error("payer and payee are the same user: {0}")]
    SelfTransfer(UserId),

    #[error("balance overflow for {0}")]
    Overflow(UserId),
}
