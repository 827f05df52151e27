//! Escrow hold records.

use serde::{Deserialize, Serialize};
use skillswap_types::{Credits, HoldId, Timestamp, TradeId, UserId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HoldState {
    /// Credits are reserved from the payer.
    Held,
    /// Credits went to the payee.
    Released,
    /// Credits went back to the payer.
    Voided,
}

impl HoldState {
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Held)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowHold {
    pub id: HoldId,
    pub trade_id: TradeId,
    pub payer: UserId,
    pub payee: UserId,
    pub amount: Credits,
    pub state: HoldState,
    pub opened_at: Timestamp,
}
