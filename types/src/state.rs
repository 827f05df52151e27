//! Lifecycle state of a submitted trade.

use serde::{Deserialize, Serialize};

/// The status of a trade record.
///
/// Only `PendingVerification` may transition; every other state is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeStatus {
    /// Waiting for the counterparty to present the verification token.
    PendingVerification,
    /// The counterparty confirmed the trade.
    Confirmed,
    /// Nobody confirmed within the validity window.
    Expired,
    /// One side disputed the report.
    Disputed,
}

impl TradeStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::PendingVerification)
    }

    /// Whether `self -> next` is a legal lifecycle step.
    pub fn can_transition_to(&self, next: TradeStatus) -> bool {
        matches!(
            (self, next),
            (
                Self::PendingVerification,
                Self::Confirmed | Self::Expired | Self::Disputed
            )
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [TradeStatus; 4] = [
        TradeStatus::PendingVerification,
        TradeStatus::Confirmed,
        TradeStatus::Expired,
        TradeStatus::Disputed,
    ];

    #[test]
    fn only_pending_leaves() {
        for from in ALL {
            for to in ALL {
                let allowed = from == TradeStatus::PendingVerification
                    && to != TradeStatus::PendingVerification;
                assert_eq!(from.can_transition_to(to), allowed, "{from:?} -> {to:?}");
            }
        }
    }

    #[test]
    fn terminal_states() {
        assert!(!TradeStatus::PendingVerification.is_terminal());
        assert!(TradeStatus::Confirmed.is_terminal());
        assert!(TradeStatus::Expired.is_terminal());
        assert!(TradeStatus::Disputed.is_terminal());
    }
}
