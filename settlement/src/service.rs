//! Settlement service: connects token issuance, the escrow ledger and the
//! high-value policy into the trade record lifecycle.
//!
//! ```text
//! submit ──► PendingVerification ──confirm──► Confirmed
//!                    │  └──dispute──► Disputed
//!                    └──expiry sweep──► Expired
//! ```

use crate::error::{SettlementError, TokenVerificationError};
use crate::events::SettlementEvent;
use crate::record::{
    payer_and_payee, Dispute, FundsState, ReviewState, SettlementPath, TradeRecord,
};
use skillswap_escrow::EscrowLedger;
use skillswap_pricing::HighValuePolicy;
use skillswap_tokens::{RandomSource, TokenError, TokenIssuer, TokenRegistry};
use skillswap_types::{
    Attachment, Clock, Credits, SettlementParams, Timestamp, TradeDetailsForm, TradeId,
    TradeStatus, TradeVerificationForm, UserId,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Result of an accepted confirmation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Confirmation {
    pub trade_id: TradeId,
    pub funds: FundsState,
}

pub struct SettlementService<R> {
    params: SettlementParams,
    policy: HighValuePolicy,
    issuer: TokenIssuer<R>,
    ledger: EscrowLedger,
    clock: Arc<dyn Clock>,
    records: BTreeMap<TradeId, TradeRecord>,
    next_trade: u64,
    /// Pending events for the caller to process.
    pending_events: Vec<SettlementEvent>,
}

impl<R: RandomSource> SettlementService<R> {
    pub fn new(
        params: SettlementParams,
        random: R,
        registry: Arc<TokenRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            policy: HighValuePolicy::from_params(&params),
            issuer: TokenIssuer::new(random, registry, &params),
            params,
            ledger: EscrowLedger::new(),
            clock,
            records: BTreeMap::new(),
            next_trade: 0,
            pending_events: Vec::new(),
        }
    }

    pub fn params(&self) -> &SettlementParams {
        &self.params
    }

    pub fn ledger(&self) -> &EscrowLedger {
        &self.ledger
    }

    /// Seed an account, e.g. from a sign-up bonus.
    pub fn deposit(&mut self, user: &UserId, amount: Credits) -> Result<Credits, SettlementError> {
        Ok(self.ledger.deposit(user, amount)?)
    }

    pub fn get(&self, trade_id: TradeId) -> Option<&TradeRecord> {
        self.records.get(&trade_id)
    }

    /// Every record the user is a party to, oldest first.
    pub fn records_for(&self, user: &UserId) -> Vec<&TradeRecord> {
        self.records.values().filter(|r| r.is_party(user)).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.records
            .values()
            .filter(|r| r.status == TradeStatus::PendingVerification)
            .count()
    }

    /// Take all queued events.
    pub fn drain_events(&mut self) -> Vec<SettlementEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // ── Submission ──────────────────────────────────────────────────────

    /// Accept a trade report, mint its verification token and open the
    /// record in `PendingVerification`.
    pub fn submit_trade(
        &mut self,
        initiator: &UserId,
        details: &TradeDetailsForm,
        verification: &TradeVerificationForm,
    ) -> Result<TradeRecord, SettlementError> {
        let counterparty = self.check_submission(initiator, details, verification)?;
        let now = self.clock.now();
        let id = TradeId::new(self.next_trade + 1);
        let credits = details.credits_proposed;

        let issued = self
            .issuer
            .issue_for(verification.method, &counterparty, id, now)
            .map_err(SettlementError::TokenIssuance)?;

        let settlement = match payer_and_payee(details.role, initiator, &counterparty) {
            None => SettlementPath::EvenSwap,
            Some((payer, payee)) if verification.escrow_enabled => {
                match self.ledger.open_hold(id, credits, payer, payee, now) {
                    Ok(hold) => SettlementPath::Escrow { hold },
                    Err(e) => {
                        self.issuer.registry().revoke(&counterparty, id);
                        return Err(e.into());
                    }
                }
            }
            Some(_) => SettlementPath::Immediate,
        };
        self.next_trade += 1;

        let assessment = self.policy.assess(credits);
        let record = TradeRecord {
            id,
            initiator_id: initiator.clone(),
            counterparty_id: counterparty.clone(),
            details: details.clone(),
            credits,
            token: issued.token,
            escrow_enabled: verification.escrow_enabled,
            settlement,
            funds: match settlement {
                SettlementPath::EvenSwap => FundsState::NotApplicable,
                _ => FundsState::Pending,
            },
            high_value: assessment.high_value,
            review: ReviewState::for_requirement(assessment.requirement, details.has_evidence()),
            status: TradeStatus::PendingVerification,
            started_at: details.started_at.unwrap_or(now),
            created_at: now,
            expires_at: issued.expires_at,
            confirmed_at: None,
            dispute: None,
        };

        tracing::info!(
            trade = %id,
            %initiator,
            %counterparty,
            %credits,
            high_value = assessment.high_value,
            method = %verification.method,
            "trade submitted"
        );
        self.pending_events.push(SettlementEvent::TradeSubmitted {
            trade_id: id,
            initiator: initiator.clone(),
            counterparty,
            credits,
            high_value: assessment.high_value,
        });
        self.records.insert(id, record.clone());
        Ok(record)
    }

    /// The backend re-checks what the wizard already validated; a snapshot
    /// may come from any client.
    fn check_submission(
        &self,
        initiator: &UserId,
        details: &TradeDetailsForm,
        verification: &TradeVerificationForm,
    ) -> Result<UserId, SettlementError> {
        let invalid = |msg: &str| Err(SettlementError::InvalidSubmission(msg.to_string()));

        if !initiator.is_valid() {
            return invalid("missing initiator");
        }
        let counterparty = match &details.counterparty_id {
            Some(c) if c.is_valid() => c.clone(),
            _ => return invalid("missing counterparty"),
        };
        if &counterparty == initiator {
            return invalid("counterparty must differ from initiator");
        }
        if details.skill.trim().is_empty() {
            return invalid("missing skill");
        }
        if details.location.trim().is_empty() {
            return invalid("missing location");
        }
        if !self.params.is_valid_duration(details.duration_mins) {
            return Err(SettlementError::InvalidSubmission(format!(
                "duration {} min outside {}..={} step {}",
                details.duration_mins,
                self.params.min_duration_mins,
                self.params.max_duration_mins,
                self.params.duration_step_mins
            )));
        }
        if !verification.agree_to_terms {
            return invalid("terms not accepted");
        }
        Ok(counterparty)
    }

    // ── Confirmation ────────────────────────────────────────────────────

    /// The counterparty presents the PIN / QR token.
    ///
    /// Rejections leave the record untouched, and so does a failed payout.
    pub fn confirm_trade(
        &mut self,
        trade_id: TradeId,
        presented_token: &str,
    ) -> Result<Confirmation, SettlementError> {
        let now = self.clock.now();
        let record = self
            .records
            .get(&trade_id)
            .ok_or(SettlementError::TradeNotFound(trade_id))?;

        if let Err(reason) = confirmable(record, now) {
            return Err(self.reject(trade_id, reason));
        }

        let settlement = record.settlement;
        let credits = record.credits;
        let counterparty = record.counterparty_id.clone();
        let blocked = record.review.blocks_release() && settlement != SettlementPath::EvenSwap;
        let parties = record
            .parties()
            .map(|(payer, payee)| (payer.clone(), payee.clone()));

        match self
            .issuer
            .registry()
            .verify(&counterparty, trade_id, presented_token, now)
        {
            Ok(()) => {}
            Err(TokenError::Expired) => {
                return Err(self.reject(trade_id, TokenVerificationError::Expired))
            }
            Err(_) => return Err(self.reject(trade_id, TokenVerificationError::InvalidToken)),
        }

        // Funds move before the token is spent; a failed payout leaves it usable.
        let funds = if blocked {
            FundsState::AwaitingReview
        } else {
            self.pay_out(trade_id, settlement, parties, credits)?
        };
        self.issuer.registry().revoke(&counterparty, trade_id);

        let record = self
            .records
            .get_mut(&trade_id)
            .ok_or(SettlementError::TradeNotFound(trade_id))?;
        record.transition(TradeStatus::Confirmed)?;
        record.funds = funds;
        record.confirmed_at = Some(now);

        tracing::info!(trade = %trade_id, ?funds, "trade confirmed");
        self.pending_events
            .push(SettlementEvent::TradeConfirmed { trade_id, funds });
        Ok(Confirmation { trade_id, funds })
    }

    fn reject(&mut self, trade_id: TradeId, reason: TokenVerificationError) -> SettlementError {
        tracing::warn!(trade = %trade_id, %reason, "confirmation rejected");
        self.pending_events.push(SettlementEvent::ConfirmationRejected {
            trade_id,
            reason: reason.to_string(),
        });
        SettlementError::Verification(reason)
    }

    fn pay_out(
        &mut self,
        trade_id: TradeId,
        settlement: SettlementPath,
        parties: Option<(UserId, UserId)>,
        credits: Credits,
    ) -> Result<FundsState, SettlementError> {
        let Some((payer, payee)) = parties else {
            return Ok(FundsState::NotApplicable);
        };
        match settlement {
            SettlementPath::Escrow { hold } => self.ledger.release(hold)?,
            SettlementPath::Immediate => self.ledger.transfer(&payer, &payee, credits)?,
            SettlementPath::EvenSwap => return Ok(FundsState::NotApplicable),
        }
        self.pending_events.push(SettlementEvent::FundsReleased {
            trade_id,
            payee,
            amount: credits,
        });
        Ok(FundsState::Settled)
    }

    // ── High-value review ───────────────────────────────────────────────

    /// An admin signs off a high-value trade. Funds move now if the trade is
    /// already confirmed, otherwise on confirmation.
    ///
    /// If the payout fails the approval is not recorded and may be given again.
    pub fn approve_high_value(
        &mut self,
        trade_id: TradeId,
        admin: &UserId,
    ) -> Result<FundsState, SettlementError> {
        let previous = self.satisfy_review(trade_id, ReviewState::ApprovedBy(admin.clone()))?;
        let funds = match self.release_awaiting_funds(trade_id) {
            Ok(funds) => funds,
            Err(e) => {
                if let Some(record) = self.records.get_mut(&trade_id) {
                    record.review = previous;
                }
                tracing::warn!(trade = %trade_id, %admin, error = %e, "approval payout failed");
                return Err(e);
            }
        };
        self.pending_events.push(SettlementEvent::ReviewApproved {
            trade_id,
            admin: admin.clone(),
        });
        Ok(funds)
    }

    /// A party attaches photo evidence after submission.
    pub fn submit_evidence(
        &mut self,
        trade_id: TradeId,
        by: &UserId,
        attachments: Vec<Attachment>,
    ) -> Result<FundsState, SettlementError> {
        let record = self
            .records
            .get_mut(&trade_id)
            .ok_or(SettlementError::TradeNotFound(trade_id))?;
        if !record.is_party(by) {
            return Err(SettlementError::NotAParty {
                trade: trade_id,
                user: by.clone(),
            });
        }
        if attachments.is_empty() {
            return Err(SettlementError::InvalidSubmission(
                "evidence needs at least one attachment".to_string(),
            ));
        }
        if matches!(record.status, TradeStatus::Expired | TradeStatus::Disputed) {
            return Err(SettlementError::TradeClosed {
                trade: trade_id,
                status: record.status,
            });
        }
        record.details.attachments.extend(attachments);
        if record.review.blocks_release() {
            record.review = ReviewState::SatisfiedByEvidence;
        }
        self.release_awaiting_funds(trade_id)
    }

    /// Replace a blocking review with `to`, returning the old state.
    fn satisfy_review(
        &mut self,
        trade_id: TradeId,
        to: ReviewState,
    ) -> Result<ReviewState, SettlementError> {
        let record = self
            .records
            .get_mut(&trade_id)
            .ok_or(SettlementError::TradeNotFound(trade_id))?;
        if matches!(record.status, TradeStatus::Expired | TradeStatus::Disputed) {
            return Err(SettlementError::TradeClosed {
                trade: trade_id,
                status: record.status,
            });
        }
        if !record.review.blocks_release() {
            return Err(SettlementError::ReviewNotRequired(trade_id));
        }
        Ok(std::mem::replace(&mut record.review, to))
    }

    /// Pay out a confirmed trade whose review is satisfied. Also the retry
    /// path when an earlier payout failed for lack of funds.
    pub fn release_awaiting_funds(
        &mut self,
        trade_id: TradeId,
    ) -> Result<FundsState, SettlementError> {
        let record = self
            .records
            .get(&trade_id)
            .ok_or(SettlementError::TradeNotFound(trade_id))?;
        if record.funds != FundsState::AwaitingReview || record.review.blocks_release() {
            return Ok(record.funds);
        }
        let settlement = record.settlement;
        let credits = record.credits;
        let parties = record
            .parties()
            .map(|(payer, payee)| (payer.clone(), payee.clone()));

        let funds = self.pay_out(trade_id, settlement, parties, credits)?;
        if let Some(record) = self.records.get_mut(&trade_id) {
            record.funds = funds;
        }
        tracing::info!(trade = %trade_id, ?funds, "high-value review satisfied");
        Ok(funds)
    }

    // ── Dispute and expiry ──────────────────────────────────────────────

    /// Either party disputes a pending trade. Escrow goes back to the payer
    /// and the token stops working.
    pub fn dispute_trade(
        &mut self,
        trade_id: TradeId,
        by: &UserId,
        reason: impl Into<String>,
    ) -> Result<(), SettlementError> {
        let now = self.clock.now();
        let record = self
            .records
            .get(&trade_id)
            .ok_or(SettlementError::TradeNotFound(trade_id))?;
        if !record.is_party(by) {
            return Err(SettlementError::NotAParty {
                trade: trade_id,
                user: by.clone(),
            });
        }
        record.check_transition(TradeStatus::Disputed)?;
        let settlement = record.settlement;
        let counterparty = record.counterparty_id.clone();

        // A failed void leaves the trade pending and untouched.
        self.close_pending(trade_id, settlement, &counterparty)?;
        let record = self
            .records
            .get_mut(&trade_id)
            .ok_or(SettlementError::TradeNotFound(trade_id))?;
        record.transition(TradeStatus::Disputed)?;
        record.dispute = Some(Dispute {
            raised_by: by.clone(),
            reason: reason.into(),
            raised_at: now,
        });
        tracing::info!(trade = %trade_id, %by, "trade disputed");
        self.pending_events.push(SettlementEvent::TradeDisputed {
            trade_id,
            by: by.clone(),
        });
        Ok(())
    }

    /// Expire every pending trade past its window. Returns the expired ids.
    pub fn expire_overdue(&mut self) -> Vec<TradeId> {
        let now = self.clock.now();
        let overdue: Vec<TradeId> = self
            .records
            .values()
            .filter(|r| r.status == TradeStatus::PendingVerification && r.is_overdue(now))
            .map(|r| r.id)
            .collect();

        let mut expired = Vec::with_capacity(overdue.len());
        for trade_id in overdue {
            let Some(record) = self.records.get(&trade_id) else {
                continue;
            };
            let settlement = record.settlement;
            let counterparty = record.counterparty_id.clone();
            if let Err(e) = self.close_pending(trade_id, settlement, &counterparty) {
                // Still pending, so the next sweep tries again.
                tracing::warn!(trade = %trade_id, error = %e, "escrow void failed during expiry");
                continue;
            }
            let Some(record) = self.records.get_mut(&trade_id) else {
                continue;
            };
            if let Err(e) = record.transition(TradeStatus::Expired) {
                tracing::warn!(trade = %trade_id, error = %e, "could not expire trade");
                continue;
            }
            self.pending_events
                .push(SettlementEvent::TradeExpired { trade_id });
            expired.push(trade_id);
        }

        let purged = self.issuer.registry().purge_expired(now);
        if !expired.is_empty() || purged > 0 {
            tracing::info!(expired = expired.len(), purged, "expiry sweep");
        }
        expired
    }

    /// Void escrow and revoke the token of a trade that will never confirm.
    /// The token survives a failed void.
    fn close_pending(
        &mut self,
        trade_id: TradeId,
        settlement: SettlementPath,
        counterparty: &UserId,
    ) -> Result<(), SettlementError> {
        if let SettlementPath::Escrow { hold } = settlement {
            self.ledger.void(hold)?;
            if let Some(record) = self.records.get_mut(&trade_id) {
                record.funds = FundsState::Returned;
            }
        }
        self.issuer.registry().revoke(counterparty, trade_id);
        Ok(())
    }
}

/// Whether a confirmation may proceed for this record at `now`.
fn confirmable(record: &TradeRecord, now: Timestamp) -> Result<(), TokenVerificationError> {
    match record.status {
        TradeStatus::Confirmed => Err(TokenVerificationError::AlreadyConfirmed),
        TradeStatus::Expired => Err(TokenVerificationError::Expired),
        TradeStatus::Disputed => Err(TokenVerificationError::Disputed),
        TradeStatus::PendingVerification if record.is_overdue(now) => {
            Err(TokenVerificationError::Expired)
        }
        TradeStatus::PendingVerification => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillswap_escrow::{EscrowError, HoldState};
    use skillswap_nullables::{NullClock, NullRandom};
    use skillswap_types::{TradeRole, VerificationMethod, DAY_SECS};

    const T0: u64 = 1_700_000_000;

    fn alice() -> UserId {
        UserId::new("alice")
    }

    fn bob() -> UserId {
        UserId::new("bob")
    }

    fn service_with(random: NullRandom) -> (SettlementService<NullRandom>, Arc<NullClock>) {
        let clock = Arc::new(NullClock::new(T0));
        let service = SettlementService::new(
            SettlementParams::default(),
            random,
            Arc::new(TokenRegistry::new()),
            clock.clone(),
        );
        (service, clock)
    }

    fn service() -> (SettlementService<NullRandom>, Arc<NullClock>) {
        service_with(NullRandom::counting(1))
    }

    fn details(role: TradeRole, credits: u64) -> TradeDetailsForm {
        TradeDetailsForm {
            counterparty_id: Some(bob()),
            skill: "Rust".to_string(),
            role,
            location: "Central Library".to_string(),
            duration_mins: 60,
            credits_proposed: Credits::new(credits),
            ..TradeDetailsForm::default()
        }
    }

    fn verification(method: VerificationMethod, escrow: bool) -> TradeVerificationForm {
        TradeVerificationForm {
            method,
            escrow_enabled: escrow,
            agree_to_terms: true,
        }
    }

    // ── Submission ──────────────────────────────────────────────────────

    #[test]
    fn submit_opens_pending_record_with_24h_window() {
        let (mut svc, _clock) = service();
        svc.deposit(&alice(), Credits::new(100)).unwrap();
        let record = svc
            .submit_trade(
                &alice(),
                &details(TradeRole::Learned, 36),
                &verification(VerificationMethod::Pin, true),
            )
            .unwrap();

        assert_eq!(record.status, TradeStatus::PendingVerification);
        assert_eq!(record.created_at, Timestamp::new(T0));
        assert_eq!(record.expires_at, Timestamp::new(T0 + DAY_SECS));
        assert_eq!(record.started_at, Timestamp::new(T0));
        let pin = record.pin_code().expect("pin method sets a pin");
        assert_eq!(pin.len(), 6);
        assert!(record.qr_token().is_none());
        assert!(matches!(record.settlement, SettlementPath::Escrow { .. }));
        assert_eq!(svc.ledger().balance(&alice()), Credits::new(64));
        assert_eq!(svc.ledger().held_by(&alice()), Credits::new(36));

        let events = svc.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            SettlementEvent::TradeSubmitted { high_value: false, .. }
        )));
    }

    #[test]
    fn qr_method_sets_only_qr_token() {
        let (mut svc, _clock) = service();
        let record = svc
            .submit_trade(
                &alice(),
                &details(TradeRole::Both, 20),
                &verification(VerificationMethod::Qr, true),
            )
            .unwrap();
        assert!(record.qr_token().is_some());
        assert!(record.pin_code().is_none());
        assert_eq!(record.verification_method(), VerificationMethod::Qr);
    }

    #[test]
    fn boundary_rejects_unaccepted_terms_and_self_trades() {
        let (mut svc, _clock) = service();
        let mut form = verification(VerificationMethod::Qr, false);
        form.agree_to_terms = false;
        let err = svc
            .submit_trade(&alice(), &details(TradeRole::Both, 10), &form)
            .unwrap_err();
        assert!(matches!(err, SettlementError::InvalidSubmission(_)));

        let mut own = details(TradeRole::Both, 10);
        own.counterparty_id = Some(alice());
        let err = svc
            .submit_trade(&alice(), &own, &verification(VerificationMethod::Qr, false))
            .unwrap_err();
        assert!(matches!(err, SettlementError::InvalidSubmission(_)));

        let mut zero = details(TradeRole::Both, 10);
        zero.duration_mins = 0;
        assert!(svc
            .submit_trade(&alice(), &zero, &verification(VerificationMethod::Qr, false))
            .is_err());
        assert!(svc.records_for(&alice()).is_empty());
    }

    #[test]
    fn token_exhaustion_is_retryable_and_creates_nothing() {
        let (mut svc, _clock) = service_with(NullRandom::failing());
        let err = svc
            .submit_trade(
                &alice(),
                &details(TradeRole::Both, 10),
                &verification(VerificationMethod::Pin, false),
            )
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(svc.pending_count(), 0);
    }

    #[test]
    fn insufficient_escrow_revokes_the_fresh_token() {
        let (mut svc, _clock) = service();
        let err = svc
            .submit_trade(
                &alice(),
                &details(TradeRole::Learned, 50),
                &verification(VerificationMethod::Pin, true),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            SettlementError::Escrow(EscrowError::InsufficientCredits { .. })
        ));
        assert_eq!(
            svc.issuer.registry().active_count(&bob(), Timestamp::new(T0)),
            0
        );
        assert!(svc.get(TradeId::new(1)).is_none());
    }

    // ── Confirmation ────────────────────────────────────────────────────

    #[test]
    fn confirm_releases_escrow_to_payee() {
        let (mut svc, _clock) = service();
        svc.deposit(&bob(), Credits::new(100)).unwrap();
        let record = svc
            .submit_trade(
                &alice(),
                &details(TradeRole::Taught, 36),
                &verification(VerificationMethod::Qr, true),
            )
            .unwrap();

        let token = record.token.as_str().to_string();
        let confirmation = svc.confirm_trade(record.id, &token).unwrap();
        assert_eq!(confirmation.funds, FundsState::Settled);

        let stored = svc.get(record.id).unwrap();
        assert_eq!(stored.status, TradeStatus::Confirmed);
        assert_eq!(stored.confirmed_at, Some(Timestamp::new(T0)));
        assert_eq!(svc.ledger().balance(&alice()), Credits::new(36));
        assert_eq!(svc.ledger().balance(&bob()), Credits::new(64));
    }

    #[test]
    fn wrong_token_leaves_record_untouched() {
        let (mut svc, _clock) = service();
        let record = svc
            .submit_trade(
                &alice(),
                &details(TradeRole::Both, 10),
                &verification(VerificationMethod::Pin, true),
            )
            .unwrap();

        let err = svc.confirm_trade(record.id, "not-it").unwrap_err();
        assert!(matches!(
            err,
            SettlementError::Verification(TokenVerificationError::InvalidToken)
        ));
        assert_eq!(svc.get(record.id).unwrap(), &record);

        let pin = record.pin_code().unwrap().to_string();
        svc.confirm_trade(record.id, &pin).unwrap();
    }

    #[test]
    fn second_confirmation_reports_already_confirmed() {
        let (mut svc, _clock) = service();
        let record = svc
            .submit_trade(
                &alice(),
                &details(TradeRole::Both, 10),
                &verification(VerificationMethod::Pin, true),
            )
            .unwrap();
        let pin = record.pin_code().unwrap().to_string();
        svc.confirm_trade(record.id, &pin).unwrap();
        let err = svc.confirm_trade(record.id, &pin).unwrap_err();
        assert!(matches!(
            err,
            SettlementError::Verification(TokenVerificationError::AlreadyConfirmed)
        ));
    }

    #[test]
    fn unknown_trade() {
        let (mut svc, _clock) = service();
        assert!(matches!(
            svc.confirm_trade(TradeId::new(42), "123456"),
            Err(SettlementError::TradeNotFound(_))
        ));
    }

    // ── Expiry ──────────────────────────────────────────────────────────

    #[test]
    fn late_confirmation_is_rejected_and_sweep_expires() {
        let (mut svc, clock) = service();
        svc.deposit(&alice(), Credits::new(40)).unwrap();
        let record = svc
            .submit_trade(
                &alice(),
                &details(TradeRole::Learned, 40),
                &verification(VerificationMethod::Qr, true),
            )
            .unwrap();

        clock.advance(DAY_SECS);
        let token = record.token.as_str().to_string();
        let err = svc.confirm_trade(record.id, &token).unwrap_err();
        assert!(matches!(
            err,
            SettlementError::Verification(TokenVerificationError::Expired)
        ));
        // Rejection does not mutate; the sweep does.
        assert_eq!(
            svc.get(record.id).unwrap().status,
            TradeStatus::PendingVerification
        );

        assert_eq!(svc.expire_overdue(), vec![record.id]);
        let stored = svc.get(record.id).unwrap();
        assert_eq!(stored.status, TradeStatus::Expired);
        assert_eq!(stored.funds, FundsState::Returned);
        assert_eq!(svc.ledger().balance(&alice()), Credits::new(40));

        // Terminal: a second sweep does nothing.
        assert!(svc.expire_overdue().is_empty());
    }

    #[test]
    fn sweep_ignores_trades_inside_window() {
        let (mut svc, clock) = service();
        svc.submit_trade(
            &alice(),
            &details(TradeRole::Both, 10),
            &verification(VerificationMethod::Pin, false),
        )
        .unwrap();
        clock.advance(DAY_SECS - 1);
        assert!(svc.expire_overdue().is_empty());
        assert_eq!(svc.pending_count(), 1);
    }

    // ── Dispute ─────────────────────────────────────────────────────────

    #[test]
    fn dispute_returns_escrow_and_blocks_confirmation() {
        let (mut svc, _clock) = service();
        svc.deposit(&alice(), Credits::new(30)).unwrap();
        let record = svc
            .submit_trade(
                &alice(),
                &details(TradeRole::Learned, 30),
                &verification(VerificationMethod::Pin, true),
            )
            .unwrap();

        assert!(matches!(
            svc.dispute_trade(record.id, &UserId::new("mallory"), "nope"),
            Err(SettlementError::NotAParty { .. })
        ));

        svc.dispute_trade(record.id, &bob(), "never met").unwrap();
        let stored = svc.get(record.id).unwrap();
        assert_eq!(stored.status, TradeStatus::Disputed);
        assert_eq!(stored.funds, FundsState::Returned);
        assert_eq!(stored.dispute.as_ref().unwrap().raised_by, bob());
        assert_eq!(svc.ledger().balance(&alice()), Credits::new(30));

        let pin = record.pin_code().unwrap().to_string();
        assert!(matches!(
            svc.confirm_trade(record.id, &pin),
            Err(SettlementError::Verification(TokenVerificationError::Disputed))
        ));
        assert!(matches!(
            svc.dispute_trade(record.id, &alice(), "again"),
            Err(SettlementError::InvalidTransition { .. })
        ));
    }

    // ── Settlement paths ────────────────────────────────────────────────

    #[test]
    fn immediate_path_transfers_on_confirmation_only() {
        let (mut svc, _clock) = service();
        let record = svc
            .submit_trade(
                &alice(),
                &details(TradeRole::Learned, 25),
                &verification(VerificationMethod::Pin, false),
            )
            .unwrap();
        assert_eq!(record.settlement, SettlementPath::Immediate);
        let pin = record.pin_code().unwrap().to_string();

        // Alice cannot pay yet; the token survives the failed attempt.
        assert!(matches!(
            svc.confirm_trade(record.id, &pin),
            Err(SettlementError::Escrow(EscrowError::InsufficientCredits { .. }))
        ));
        svc.deposit(&alice(), Credits::new(25)).unwrap();
        let confirmation = svc.confirm_trade(record.id, &pin).unwrap();
        assert_eq!(confirmation.funds, FundsState::Settled);
        assert_eq!(svc.ledger().balance(&bob()), Credits::new(25));
    }

    #[test]
    fn even_swap_moves_nothing() {
        let (mut svc, _clock) = service();
        let record = svc
            .submit_trade(
                &alice(),
                &details(TradeRole::Both, 50),
                &verification(VerificationMethod::Qr, true),
            )
            .unwrap();
        assert_eq!(record.settlement, SettlementPath::EvenSwap);
        let token = record.token.as_str().to_string();
        let confirmation = svc.confirm_trade(record.id, &token).unwrap();
        assert_eq!(confirmation.funds, FundsState::NotApplicable);
    }

    // ── High-value review ───────────────────────────────────────────────

    #[test]
    fn high_value_without_evidence_waits_for_admin() {
        let (mut svc, _clock) = service();
        svc.deposit(&alice(), Credits::new(200)).unwrap();
        let record = svc
            .submit_trade(
                &alice(),
                &details(TradeRole::Learned, 100),
                &verification(VerificationMethod::Pin, true),
            )
            .unwrap();
        assert!(record.high_value);
        assert_eq!(record.review, ReviewState::Required);

        let pin = record.pin_code().unwrap().to_string();
        let confirmation = svc.confirm_trade(record.id, &pin).unwrap();
        assert_eq!(confirmation.funds, FundsState::AwaitingReview);
        assert_eq!(svc.ledger().balance(&bob()), Credits::ZERO);

        let admin = UserId::new("admin");
        assert_eq!(
            svc.approve_high_value(record.id, &admin).unwrap(),
            FundsState::Settled
        );
        assert_eq!(svc.ledger().balance(&bob()), Credits::new(100));
        assert_eq!(
            svc.get(record.id).unwrap().review,
            ReviewState::ApprovedBy(admin.clone())
        );
        assert!(matches!(
            svc.approve_high_value(record.id, &admin),
            Err(SettlementError::ReviewNotRequired(_))
        ));
    }

    #[test]
    fn high_value_with_photo_evidence_settles_on_confirmation() {
        let (mut svc, _clock) = service();
        svc.deposit(&alice(), Credits::new(150)).unwrap();
        let mut form = details(TradeRole::Learned, 150);
        form.attachments.push(Attachment {
            name: "session.jpg".into(),
            uri: "file:///tmp/session.jpg".into(),
        });
        let record = svc
            .submit_trade(&alice(), &form, &verification(VerificationMethod::Qr, true))
            .unwrap();
        assert_eq!(record.review, ReviewState::SatisfiedByEvidence);

        let token = record.token.as_str().to_string();
        assert_eq!(
            svc.confirm_trade(record.id, &token).unwrap().funds,
            FundsState::Settled
        );
    }

    #[test]
    fn late_evidence_releases_awaiting_funds() {
        let (mut svc, _clock) = service();
        svc.deposit(&alice(), Credits::new(120)).unwrap();
        let record = svc
            .submit_trade(
                &alice(),
                &details(TradeRole::Learned, 120),
                &verification(VerificationMethod::Pin, true),
            )
            .unwrap();
        let pin = record.pin_code().unwrap().to_string();
        svc.confirm_trade(record.id, &pin).unwrap();

        let photo = Attachment {
            name: "cert.png".into(),
            uri: "file:///tmp/cert.png".into(),
        };
        assert_eq!(
            svc.submit_evidence(record.id, &alice(), vec![photo]).unwrap(),
            FundsState::Settled
        );
        assert_eq!(svc.ledger().balance(&bob()), Credits::new(120));
    }

    // ── Failed fund movements ───────────────────────────────────────────

    #[test]
    fn failed_release_keeps_token_and_hold_for_a_dispute() {
        let (mut svc, _clock) = service();
        svc.deposit(&alice(), Credits::new(u64::MAX - 5)).unwrap();
        svc.deposit(&bob(), Credits::new(100)).unwrap();
        let record = svc
            .submit_trade(
                &alice(),
                &details(TradeRole::Taught, 10),
                &verification(VerificationMethod::Pin, true),
            )
            .unwrap();
        let SettlementPath::Escrow { hold } = record.settlement else {
            panic!("expected escrow, got {:?}", record.settlement);
        };
        let pin = record.pin_code().unwrap().to_string();

        // Alice cannot receive; the same PIN fails the same way twice.
        for _ in 0..2 {
            assert!(matches!(
                svc.confirm_trade(record.id, &pin),
                Err(SettlementError::Escrow(EscrowError::Overflow(_)))
            ));
        }
        assert_eq!(svc.get(record.id).unwrap(), &record);
        assert_eq!(svc.ledger().held_by(&bob()), Credits::new(10));

        svc.dispute_trade(record.id, &bob(), "payment bounced").unwrap();
        assert_eq!(svc.get(record.id).unwrap().status, TradeStatus::Disputed);
        assert_eq!(svc.ledger().hold(hold).unwrap().state, HoldState::Voided);
        assert_eq!(svc.ledger().balance(&bob()), Credits::new(100));
        assert_eq!(svc.ledger().balance(&alice()), Credits::new(u64::MAX - 5));
    }

    #[test]
    fn failed_void_leaves_dispute_unrecorded() {
        let (mut svc, _clock) = service();
        svc.deposit(&alice(), Credits::new(30)).unwrap();
        let record = svc
            .submit_trade(
                &alice(),
                &details(TradeRole::Learned, 30),
                &verification(VerificationMethod::Pin, true),
            )
            .unwrap();
        // The refund would overflow alice's topped-up balance.
        svc.deposit(&alice(), Credits::new(u64::MAX)).unwrap();
        svc.drain_events();

        assert!(matches!(
            svc.dispute_trade(record.id, &bob(), "never met"),
            Err(SettlementError::Escrow(EscrowError::Overflow(_)))
        ));
        let stored = svc.get(record.id).unwrap();
        assert_eq!(stored.status, TradeStatus::PendingVerification);
        assert!(stored.dispute.is_none());
        assert!(svc.drain_events().is_empty());

        // Token still works and the hold still pays bob.
        let pin = record.pin_code().unwrap().to_string();
        assert_eq!(
            svc.confirm_trade(record.id, &pin).unwrap().funds,
            FundsState::Settled
        );
        assert_eq!(svc.ledger().balance(&bob()), Credits::new(30));
    }

    #[test]
    fn sweep_retries_a_failed_refund() {
        let (mut svc, clock) = service();
        svc.deposit(&alice(), Credits::new(40)).unwrap();
        let stuck = svc
            .submit_trade(
                &alice(),
                &details(TradeRole::Learned, 40),
                &verification(VerificationMethod::Qr, true),
            )
            .unwrap();
        svc.deposit(&alice(), Credits::new(u64::MAX)).unwrap();

        clock.advance(DAY_SECS);
        assert!(svc.expire_overdue().is_empty());
        assert_eq!(
            svc.get(stuck.id).unwrap().status,
            TradeStatus::PendingVerification
        );
        assert_eq!(svc.ledger().held_by(&alice()), Credits::new(40));

        // A fresh hold makes room for the refund.
        svc.submit_trade(
            &alice(),
            &details(TradeRole::Learned, 50),
            &verification(VerificationMethod::Pin, true),
        )
        .unwrap();
        assert_eq!(svc.expire_overdue(), vec![stuck.id]);
        let stored = svc.get(stuck.id).unwrap();
        assert_eq!(stored.status, TradeStatus::Expired);
        assert_eq!(stored.funds, FundsState::Returned);
        assert_eq!(svc.ledger().balance(&alice()), Credits::new(u64::MAX - 10));
    }

    #[test]
    fn failed_approval_payout_can_be_approved_again() {
        let (mut svc, _clock) = service();
        let record = svc
            .submit_trade(
                &alice(),
                &details(TradeRole::Learned, 100),
                &verification(VerificationMethod::Pin, false),
            )
            .unwrap();
        assert_eq!(record.settlement, SettlementPath::Immediate);
        let pin = record.pin_code().unwrap().to_string();
        assert_eq!(
            svc.confirm_trade(record.id, &pin).unwrap().funds,
            FundsState::AwaitingReview
        );
        svc.drain_events();

        let admin = UserId::new("admin");
        assert!(matches!(
            svc.approve_high_value(record.id, &admin),
            Err(SettlementError::Escrow(EscrowError::InsufficientCredits { .. }))
        ));
        let stored = svc.get(record.id).unwrap();
        assert_eq!(stored.review, ReviewState::Required);
        assert_eq!(stored.funds, FundsState::AwaitingReview);
        assert!(!svc
            .drain_events()
            .iter()
            .any(|e| matches!(e, SettlementEvent::ReviewApproved { .. })));

        svc.deposit(&alice(), Credits::new(100)).unwrap();
        assert_eq!(
            svc.approve_high_value(record.id, &admin).unwrap(),
            FundsState::Settled
        );
        assert_eq!(svc.ledger().balance(&bob()), Credits::new(100));
        assert!(svc
            .drain_events()
            .iter()
            .any(|e| matches!(e, SettlementEvent::ReviewApproved { .. })));
    }
}
