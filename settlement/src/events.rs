//! Events emitted by the settlement service for the caller to process
//! (notifications, audit log shipping).

use crate::record::FundsState;
use skillswap_types::{Credits, TradeId, UserId};

#[derive(Clone, Debug, PartialEq)]
pub enum SettlementEvent {
    TradeSubmitted {
        trade_id: TradeId,
        initiator: UserId,
        counterparty: UserId,
        credits: Credits,
        high_value: bool,
    },
    TradeConfirmed {
        trade_id: TradeId,
        funds: FundsState,
    },
    /// A confirmation attempt was refused; the record is unchanged.
    ConfirmationRejected {
        trade_id: TradeId,
        reason: String,
    },
    TradeDisputed {
        trade_id: TradeId,
        by: UserId,
    },
    TradeExpired {
        trade_id: TradeId,
    },
    FundsReleased {
        trade_id: TradeId,
        payee: UserId,
        amount: Credits,
    },
    ReviewApproved {
        trade_id: TradeId,
        admin: UserId,
    },
}
