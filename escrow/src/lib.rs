//! Credit ledger with escrow holds.
//!
//! Two settlement paths exist and are kept distinct:
//! - **Escrow**: credits are reserved at submission ([`EscrowLedger::open_hold`])
//!   and either released to the payee or voided back to the payer, once.
//! - **Immediate**: no hold; credits move on confirmation via
//!   [`EscrowLedger::transfer`].

pub mod error;
pub mod hold;
pub mod ledger;

pub use error::EscrowError;
pub use hold::{EscrowHold, HoldState};
pub use ledger::EscrowLedger;
