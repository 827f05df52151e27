//! Verification tokens for trade confirmation.
//!
//! The initiator's submission mints either a 6-digit PIN or an opaque QR
//! token. The counterparty presents it to confirm the trade.
//!
//! - Tokens are single-use, bound to one trade, and valid for a fixed window.
//! - No two currently-valid tokens for the same counterparty may collide; the
//!   [`TokenRegistry`] performs the check-and-insert atomically so issuers
//!   serving different wizards can share it.
//! - Randomness comes through the [`RandomSource`] seam. [`OsRandom`] is the
//!   production source; tests plug in deterministic ones.

pub mod error;
pub mod issuer;
pub mod random;
pub mod registry;
pub mod token;

pub use error::{RandomError, TokenError};
pub use issuer::{IssuedToken, TokenIssuer, PIN_DIGITS};
pub use random::{OsRandom, RandomSource};
pub use registry::TokenRegistry;
pub use token::{TokenDigest, VerificationToken};
