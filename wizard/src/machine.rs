//! The trade logging wizard.
//!
//! ```text
//! Details ──next──► Verification ──next──► Review ──submit──► Submitted
//!    ◄──back──           ◄──back──
//! cancel (any non-terminal step) ──► Details with a fresh draft
//! ```
//!
//! Field edits are only accepted on the step that owns the field. Changing
//! the duration or complexity recomputes `credits_proposed` and overwrites
//! any manual value.

use crate::error::WizardError;
use crate::state::{TradeDraft, WizardState, WizardStep};
use crate::submission::SubmissionRequest;
use crate::validation::detail_errors;
use crate::ValidationError;
use skillswap_pricing::{CreditCalculator, DemandPricing, HighValueAssessment, HighValuePolicy};
use skillswap_settlement::{SubmissionError, TradeBackend, TradeRecord};
use skillswap_types::{
    Attachment, Complexity, CounterpartyProfile, Credits, Notice, Notifier, SettlementParams,
    SkillDirectory, Timestamp, TradeDetailsForm, TradeRole, TradeVerificationForm, UserDirectory,
    UserId, VerificationMethod,
};
use std::sync::Arc;

/// What the UI shows next to the credits field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreditQuote {
    /// The value that will be submitted.
    pub proposed: Credits,
    /// What the formula gives for the current duration and complexity.
    pub formula: Credits,
    pub assessment: HighValueAssessment,
}

pub struct TradeWizard {
    initiator: UserId,
    prefilled: Option<UserId>,
    params: SettlementParams,
    calculator: CreditCalculator,
    policy: HighValuePolicy,
    pricing: Arc<dyn DemandPricing>,
    notifier: Option<Arc<dyn Notifier>>,
    state: WizardState,
    /// Bumped on every reset; a submission response from an older generation
    /// is discarded.
    generation: u64,
    in_flight: Option<u64>,
}

impl TradeWizard {
    pub fn new(
        initiator: UserId,
        prefilled: Option<UserId>,
        params: SettlementParams,
        pricing: Arc<dyn DemandPricing>,
    ) -> Self {
        let mut wizard = Self {
            initiator,
            prefilled,
            calculator: CreditCalculator::from_params(&params),
            policy: HighValuePolicy::from_params(&params),
            params,
            pricing,
            notifier: None,
            state: WizardState::Details(TradeDraft {
                details: TradeDetailsForm::default(),
                verification: TradeVerificationForm::default(),
            }),
            generation: 0,
            in_flight: None,
        };
        wizard.state = WizardState::Details(wizard.initial_draft());
        wizard
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn initiator(&self) -> &UserId {
        &self.initiator
    }

    pub fn step(&self) -> WizardStep {
        self.state.step()
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    /// The current draft; `None` once submitted.
    pub fn draft(&self) -> Option<&TradeDraft> {
        self.state.draft()
    }

    /// The record created by a successful submission.
    pub fn record(&self) -> Option<&TradeRecord> {
        match &self.state {
            WizardState::Submitted(record) => Some(record),
            _ => None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Inline errors for the details step, empty when it can be left.
    pub fn detail_errors(&self) -> Vec<ValidationError> {
        self.draft()
            .map(|d| detail_errors(&d.details, &self.params))
            .unwrap_or_default()
    }

    /// Current credits plus the high-value assessment for the warning banner.
    pub fn credit_quote(&self) -> Option<CreditQuote> {
        let details = &self.draft()?.details;
        Some(CreditQuote {
            proposed: details.credits_proposed,
            formula: self.formula(&details.skill, details.duration_mins, details.complexity),
            assessment: self.policy.assess(details.credits_proposed),
        })
    }

    // ── Navigation ──────────────────────────────────────────────────────

    pub fn next(&mut self) -> Result<WizardStep, WizardError> {
        self.ensure_idle()?;
        let next = self.state.next(&self.params)?;
        tracing::debug!(from = ?self.state.step(), to = ?next.step(), "wizard advanced");
        self.state = next;
        Ok(self.state.step())
    }

    pub fn back(&mut self) -> Result<WizardStep, WizardError> {
        self.ensure_idle()?;
        let prev = self.state.back()?;
        tracing::debug!(from = ?self.state.step(), to = ?prev.step(), "wizard went back");
        self.state = prev;
        Ok(self.state.step())
    }

    /// Throw the draft away and start over. Allowed on any step except
    /// `Submitted`; a submission still in flight is orphaned.
    pub fn cancel(&mut self) -> Result<(), WizardError> {
        if matches!(self.state, WizardState::Submitted(_)) {
            return Err(WizardError::AlreadySubmitted);
        }
        self.reset();
        tracing::debug!(generation = self.generation, "wizard cancelled");
        Ok(())
    }

    /// Open the wizard again for a new report, from any step.
    pub fn reopen(&mut self, prefilled: Option<UserId>) {
        self.prefilled = prefilled;
        self.reset();
        tracing::debug!(generation = self.generation, "wizard reopened");
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.in_flight = None;
        self.state = WizardState::Details(self.initial_draft());
    }

    /// Defaults, the prefilled counterparty, and credits for the default
    /// duration and complexity.
    fn initial_draft(&self) -> TradeDraft {
        let mut details = TradeDetailsForm {
            counterparty_id: self.prefilled.clone(),
            ..TradeDetailsForm::default()
        };
        details.credits_proposed =
            self.formula(&details.skill, details.duration_mins, details.complexity);
        TradeDraft {
            details,
            verification: TradeVerificationForm::default(),
        }
    }

    // ── Step 1: details ─────────────────────────────────────────────────

    pub fn set_counterparty(&mut self, counterparty: UserId) -> Result<(), WizardError> {
        if counterparty == self.initiator {
            return Err(WizardError::SelfTrade);
        }
        self.details_mut()?.counterparty_id = Some(counterparty);
        Ok(())
    }

    /// Pick a counterparty from the directory; unknown ids are refused.
    pub fn choose_counterparty(
        &mut self,
        directory: &dyn UserDirectory,
        id: &UserId,
    ) -> Result<CounterpartyProfile, WizardError> {
        let profile = directory
            .lookup(id)
            .ok_or_else(|| WizardError::UnknownCounterparty(id.clone()))?;
        self.set_counterparty(profile.id.clone())?;
        Ok(profile)
    }

    /// Directory search that leaves out the initiator.
    pub fn search_counterparties(
        &self,
        directory: &dyn UserDirectory,
        query: &str,
    ) -> Vec<CounterpartyProfile> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        directory
            .search(query)
            .into_iter()
            .filter(|p| p.id != self.initiator)
            .collect()
    }

    pub fn clear_counterparty(&mut self) -> Result<(), WizardError> {
        self.details_mut()?.counterparty_id = None;
        Ok(())
    }

    pub fn set_skill(&mut self, skill: impl Into<String>) -> Result<(), WizardError> {
        self.details_mut()?.skill = skill.into();
        Ok(())
    }

    /// Autocomplete for the skill field.
    pub fn skill_suggestions(&self, skills: &dyn SkillDirectory, limit: usize) -> Vec<String> {
        match self.draft() {
            Some(d) if !d.details.skill.trim().is_empty() => {
                skills.suggest(d.details.skill.trim(), limit)
            }
            _ => Vec::new(),
        }
    }

    /// Returns `false` for blank tags and case-insensitive duplicates.
    pub fn add_skill_tag(&mut self, tag: &str) -> Result<bool, WizardError> {
        let tag = tag.trim();
        let details = self.details_mut()?;
        if tag.is_empty()
            || details
                .skill_tags
                .iter()
                .any(|t| t.to_lowercase() == tag.to_lowercase())
        {
            return Ok(false);
        }
        Ok(details.skill_tags.insert(tag.to_string()))
    }

    pub fn remove_skill_tag(&mut self, tag: &str) -> Result<bool, WizardError> {
        let tag = tag.trim().to_lowercase();
        let details = self.details_mut()?;
        let before = details.skill_tags.len();
        details.skill_tags.retain(|t| t.to_lowercase() != tag);
        Ok(details.skill_tags.len() != before)
    }

    pub fn set_role(&mut self, role: TradeRole) -> Result<(), WizardError> {
        self.details_mut()?.role = role;
        Ok(())
    }

    pub fn set_started_at(&mut self, started_at: Timestamp) -> Result<(), WizardError> {
        self.details_mut()?.started_at = Some(started_at);
        Ok(())
    }

    /// Recomputes `credits_proposed`.
    pub fn set_duration(&mut self, duration_mins: u32) -> Result<Credits, WizardError> {
        let complexity = self.details()?.complexity;
        self.recompute(duration_mins, complexity)
    }

    /// Recomputes `credits_proposed`.
    pub fn set_complexity(&mut self, complexity: Complexity) -> Result<Credits, WizardError> {
        let duration_mins = self.details()?.duration_mins;
        self.recompute(duration_mins, complexity)
    }

    /// Manual override; lasts until the next duration or complexity change.
    pub fn set_credits_proposed(&mut self, credits: Credits) -> Result<(), WizardError> {
        self.details_mut()?.credits_proposed = credits;
        Ok(())
    }

    pub fn set_location(&mut self, location: impl Into<String>) -> Result<(), WizardError> {
        self.details_mut()?.location = location.into();
        Ok(())
    }

    pub fn set_in_person(&mut self, in_person: bool) -> Result<(), WizardError> {
        self.details_mut()?.is_in_person = in_person;
        Ok(())
    }

    /// Blank notes are stored as `None`.
    pub fn set_notes(&mut self, notes: &str) -> Result<(), WizardError> {
        let notes = notes.trim();
        self.details_mut()?.notes = (!notes.is_empty()).then(|| notes.to_string());
        Ok(())
    }

    pub fn add_attachment(&mut self, attachment: Attachment) -> Result<(), WizardError> {
        self.details_mut()?.attachments.push(attachment);
        Ok(())
    }

    pub fn remove_attachment(&mut self, index: usize) -> Result<Option<Attachment>, WizardError> {
        let attachments = &mut self.details_mut()?.attachments;
        Ok((index < attachments.len()).then(|| attachments.remove(index)))
    }

    fn recompute(
        &mut self,
        duration_mins: u32,
        complexity: Complexity,
    ) -> Result<Credits, WizardError> {
        let skill = self.details()?.skill.clone();
        let credits = self.formula(&skill, duration_mins, complexity);
        let details = self.details_mut()?;
        details.duration_mins = duration_mins;
        details.complexity = complexity;
        details.credits_proposed = credits;
        tracing::debug!(duration_mins, %complexity, %credits, "credits recomputed");
        Ok(credits)
    }

    /// Out-of-domain durations never reach the calculator.
    fn formula(&self, skill: &str, duration_mins: u32, complexity: Complexity) -> Credits {
        if !self.params.is_valid_duration(duration_mins) {
            return Credits::ZERO;
        }
        let demand = self.pricing.demand_multiplier(skill.trim());
        self.calculator.credits(duration_mins, complexity, demand)
    }

    fn details(&self) -> Result<&TradeDetailsForm, WizardError> {
        match &self.state {
            WizardState::Details(d) => Ok(&d.details),
            WizardState::Submitted(_) => Err(WizardError::AlreadySubmitted),
            other => Err(WizardError::WrongStep {
                actual: other.step(),
            }),
        }
    }

    fn details_mut(&mut self) -> Result<&mut TradeDetailsForm, WizardError> {
        match &mut self.state {
            WizardState::Details(d) => Ok(&mut d.details),
            WizardState::Submitted(_) => Err(WizardError::AlreadySubmitted),
            other => Err(WizardError::WrongStep {
                actual: other.step(),
            }),
        }
    }

    // ── Steps 2 and 3: verification and terms ───────────────────────────

    pub fn set_method(&mut self, method: VerificationMethod) -> Result<(), WizardError> {
        self.verification_mut()?.method = method;
        Ok(())
    }

    pub fn set_escrow_enabled(&mut self, enabled: bool) -> Result<(), WizardError> {
        self.verification_mut()?.escrow_enabled = enabled;
        Ok(())
    }

    pub fn set_agree_to_terms(&mut self, agree: bool) -> Result<(), WizardError> {
        self.verification_mut()?.agree_to_terms = agree;
        Ok(())
    }

    fn verification_mut(&mut self) -> Result<&mut TradeVerificationForm, WizardError> {
        self.ensure_idle()?;
        match &mut self.state {
            WizardState::Verification(d) | WizardState::Review(d) => Ok(&mut d.verification),
            WizardState::Submitted(_) => Err(WizardError::AlreadySubmitted),
            other => Err(WizardError::WrongStep {
                actual: other.step(),
            }),
        }
    }

    fn ensure_idle(&self) -> Result<(), WizardError> {
        match self.in_flight {
            Some(_) => Err(WizardError::SubmissionInFlight),
            None => Ok(()),
        }
    }

    // ── Submission ──────────────────────────────────────────────────────

    /// Freeze the draft into a request. The wizard stays on `Review` until
    /// the response comes back.
    pub fn begin_submission(&mut self) -> Result<SubmissionRequest, WizardError> {
        self.ensure_idle()?;
        let draft = self.state.check_submittable()?;
        if draft.details.counterparty_id.as_ref() == Some(&self.initiator) {
            return Err(WizardError::SelfTrade);
        }
        let request = SubmissionRequest {
            generation: self.generation,
            initiator: self.initiator.clone(),
            details: draft.details.clone(),
            verification: draft.verification.clone(),
        };
        self.in_flight = Some(self.generation);
        tracing::debug!(generation = self.generation, "submission started");
        Ok(request)
    }

    /// Apply the backend's answer.
    ///
    /// A response for an older generation (the wizard was cancelled or
    /// reopened meanwhile) is discarded. On failure the wizard stays on
    /// `Review` with the draft intact.
    pub fn complete_submission(
        &mut self,
        generation: u64,
        result: Result<TradeRecord, SubmissionError>,
    ) -> Result<TradeRecord, WizardError> {
        if generation != self.generation || self.in_flight != Some(generation) {
            tracing::warn!(
                generation,
                current = self.generation,
                "discarding stale submission response"
            );
            return Err(WizardError::SubmissionDiscarded);
        }
        self.in_flight = None;

        match result {
            Ok(record) => {
                tracing::info!(trade = %record.id, credits = %record.credits, "trade logged");
                self.notify(Notice::success(
                    "Trade logged",
                    format!(
                        "{} must confirm within 24 hours using your {}",
                        record.counterparty_id,
                        match record.verification_method() {
                            VerificationMethod::Pin => "PIN",
                            VerificationMethod::Qr => "QR code",
                        }
                    ),
                ));
                self.state = WizardState::Submitted(Box::new(record.clone()));
                Ok(record)
            }
            Err(e) => {
                tracing::warn!(error = %e, retryable = e.is_retryable(), "trade submission failed");
                self.notify(Notice::error("Could not log trade", e.to_string()));
                Err(WizardError::Submission(e))
            }
        }
    }

    /// Begin, dispatch and complete in one call.
    pub fn submit<B: TradeBackend + ?Sized>(
        &mut self,
        backend: &mut B,
    ) -> Result<TradeRecord, WizardError> {
        let request = self.begin_submission()?;
        let result = request.dispatch(backend);
        self.complete_submission(request.generation, result)
    }

    fn notify(&self, notice: Notice) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(notice);
        }
    }
}
