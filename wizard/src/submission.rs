//! The single in-flight submission of a wizard.

use skillswap_settlement::{SubmissionError, TradeBackend, TradeRecord};
use skillswap_types::{TradeDetailsForm, TradeVerificationForm, UserId};

/// A snapshot of the draft handed to the backend, tagged with the wizard
/// generation it was taken from.
///
/// The response must be fed back through
/// [`TradeWizard::complete_submission`](crate::TradeWizard::complete_submission)
/// with the same generation; a wizard that was cancelled in between discards it.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmissionRequest {
    pub generation: u64,
    pub initiator: UserId,
    pub details: TradeDetailsForm,
    pub verification: TradeVerificationForm,
}

impl SubmissionRequest {
    /// Send the snapshot. No retry here; a failed submission goes back to the
    /// user with the draft intact.
    pub fn dispatch<B: TradeBackend + ?Sized>(
        &self,
        backend: &mut B,
    ) -> Result<TradeRecord, SubmissionError> {
        tracing::debug!(generation = self.generation, initiator = %self.initiator, "dispatching trade report");
        backend.submit(&self.initiator, &self.details, &self.verification)
    }
}
