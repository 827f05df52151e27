//! The trade record: the audit trail of a reported trade.
//!
//! Created at submission, mutated only by confirmation, dispute, review
//! approval and the expiry sweep, and never deleted.

use crate::error::SettlementError;
use serde::{Deserialize, Serialize};
use skillswap_pricing::ReleaseRequirement;
use skillswap_tokens::VerificationToken;
use skillswap_types::{
    Credits, HoldId, Timestamp, TradeDetailsForm, TradeId, TradeRole, TradeStatus, UserId,
    VerificationMethod,
};

/// How credits move for this trade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementPath {
    /// Credits were reserved at submission.
    Escrow { hold: HoldId },
    /// Credits move on confirmation with no hold.
    Immediate,
    /// Both sides taught; nothing moves.
    EvenSwap,
}

/// Where the credits are right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FundsState {
    /// Not moved yet (held in escrow, or owed on the immediate path).
    Pending,
    /// Confirmed, but high-value review has not been satisfied.
    AwaitingReview,
    /// Paid to the payee.
    Settled,
    /// Escrow returned to the payer.
    Returned,
    /// Even swap.
    NotApplicable,
}

/// Progress on the high-value release requirement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewState {
    NotRequired,
    /// Photo evidence or admin approval is still needed.
    Required,
    /// Evidence was attached to the report.
    SatisfiedByEvidence,
    ApprovedBy(UserId),
}

impl ReviewState {
    pub fn for_requirement(requirement: ReleaseRequirement, has_evidence: bool) -> Self {
        match requirement {
            ReleaseRequirement::None => Self::NotRequired,
            ReleaseRequirement::EvidenceOrAdminApproval if has_evidence => {
                Self::SatisfiedByEvidence
            }
            ReleaseRequirement::EvidenceOrAdminApproval => Self::Required,
        }
    }

    pub fn blocks_release(&self) -> bool {
        matches!(self, Self::Required)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispute {
    pub raised_by: UserId,
    pub reason: String,
    pub raised_at: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: TradeId,
    pub initiator_id: UserId,
    pub counterparty_id: UserId,
    /// Finalized copy of the wizard's details form.
    pub details: TradeDetailsForm,
    pub credits: Credits,
    /// Exactly one of PIN or QR, matching the chosen verification method.
    pub token: VerificationToken,
    pub escrow_enabled: bool,
    pub settlement: SettlementPath,
    pub funds: FundsState,
    pub high_value: bool,
    pub review: ReviewState,
    pub status: TradeStatus,
    pub started_at: Timestamp,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub confirmed_at: Option<Timestamp>,
    pub dispute: Option<Dispute>,
}

impl TradeRecord {
    pub fn verification_method(&self) -> VerificationMethod {
        self.token.method()
    }

    pub fn pin_code(&self) -> Option<&str> {
        self.token.pin_code()
    }

    pub fn qr_token(&self) -> Option<&str> {
        self.token.qr_token()
    }

    pub fn is_party(&self, user: &UserId) -> bool {
        &self.initiator_id == user || &self.counterparty_id == user
    }

    pub fn is_overdue(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    /// `(payer, payee)`, or `None` for an even swap.
    pub fn parties(&self) -> Option<(&UserId, &UserId)> {
        payer_and_payee(self.details.role, &self.initiator_id, &self.counterparty_id)
    }

    /// Apply a lifecycle step. Terminal states never change.
    pub(crate) fn transition(&mut self, next: TradeStatus) -> Result<(), SettlementError> {
        self.check_transition(next)?;
        tracing::debug!(trade = %self.id, from = ?self.status, to = ?next, "trade status change");
        self.status = next;
        Ok(())
    }

    pub(crate) fn check_transition(&self, next: TradeStatus) -> Result<(), SettlementError> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(SettlementError::InvalidTransition {
                trade: self.id,
                from: self.status,
                to: next,
            })
        }
    }
}

/// Who pays whom for a role reported by the initiator.
pub fn payer_and_payee<'a>(
    role: TradeRole,
    initiator: &'a UserId,
    counterparty: &'a UserId,
) -> Option<(&'a UserId, &'a UserId)> {
    match role {
        TradeRole::Taught => Some((counterparty, initiator)),
        TradeRole::Learned => Some((initiator, counterparty)),
        TradeRole::Both => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_decides_direction() {
        let a = UserId::new("alice");
        let b = UserId::new("bob");
        assert_eq!(payer_and_payee(TradeRole::Taught, &a, &b), Some((&b, &a)));
        assert_eq!(payer_and_payee(TradeRole::Learned, &a, &b), Some((&a, &b)));
        assert_eq!(payer_and_payee(TradeRole::Both, &a, &b), None);
    }

    #[test]
    fn review_requirement_mapping() {
        assert_eq!(
            ReviewState::for_requirement(ReleaseRequirement::None, false),
            ReviewState::NotRequired
        );
        assert_eq!(
            ReviewState::for_requirement(ReleaseRequirement::EvidenceOrAdminApproval, true),
            ReviewState::SatisfiedByEvidence
        );
        let required =
            ReviewState::for_requirement(ReleaseRequirement::EvidenceOrAdminApproval, false);
        assert!(required.blocks_release());
    }
}
