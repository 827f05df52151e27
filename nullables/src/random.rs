//! Nullable random: deterministic bytes for token generation.

use skillswap_tokens::{RandomError, RandomSource};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

enum Mode {
    /// Each fill is the little-endian counter value, repeated.
    Counting(AtomicU64),
    /// Pre-configured outputs, cycled.
    Sequence(Vec<[u8; 8]>, AtomicUsize),
    /// Every fill fails.
    Failing,
}

/// A deterministic random source for testing.
pub struct NullRandom {
    mode: Mode,
    failures_left: Mutex<u32>,
}

impl NullRandom {
    /// Distinct output on every call, starting from `seed`.
    pub fn counting(seed: u64) -> Self {
        Self::with_mode(Mode::Counting(AtomicU64::new(seed)))
    }

    /// Cycle through the given outputs in order.
    pub fn sequence(outputs: Vec<[u8; 8]>) -> Self {
        assert!(!outputs.is_empty(), "sequence needs at least one output");
        Self::with_mode(Mode::Sequence(outputs, AtomicUsize::new(0)))
    }

    /// The same bytes forever, guaranteeing collisions.
    pub fn constant(value: [u8; 8]) -> Self {
        Self::sequence(vec![value])
    }

    /// A source that never produces bytes.
    pub fn failing() -> Self {
        Self::with_mode(Mode::Failing)
    }

    /// Make the next `n` fills fail before normal behaviour resumes.
    pub fn fail_next(self, n: u32) -> Self {
        *self.failures_left.lock().unwrap() = n;
        self
    }

    fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            failures_left: Mutex::new(0),
        }
    }
}

impl RandomSource for NullRandom {
    fn fill(&self, buf: &mut [u8]) -> Result<(), RandomError> {
        {
            let mut left = self.failures_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                return Err(RandomError::Unavailable("null-random scripted failure".into()));
            }
        }
        let pattern = match &self.mode {
            Mode::Counting(counter) => counter.fetch_add(1, Ordering::SeqCst).to_le_bytes(),
            Mode::Sequence(outputs, index) => {
                let i = index.fetch_add(1, Ordering::SeqCst);
                outputs[i % outputs.len()]
            }
            Mode::Failing => {
                return Err(RandomError::Unavailable("null-random always fails".into()))
            }
        };
        for (i, b) in buf.iter_mut().enumerate() {
            *b = pattern[i % pattern.len()];
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "null-random"
    }
}
