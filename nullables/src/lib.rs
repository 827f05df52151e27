//! Nullable infrastructure for deterministic testing.
//!
//! All external dependencies (clock, random source, demand pricing, toasts,
//! user/skill directory) sit behind traits. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod directory;
pub mod notifier;
pub mod pricing;
pub mod random;

pub use clock::NullClock;
pub use directory::NullDirectory;
pub use notifier::NullNotifier;
pub use pricing::NullPricing;
pub use random::NullRandom;
