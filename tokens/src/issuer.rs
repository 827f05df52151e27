//! Token issuance with bounded retry.

use crate::error::{RandomError, TokenError};
use crate::random::RandomSource;
use crate::registry::TokenRegistry;
use crate::token::VerificationToken;
use serde::{Deserialize, Serialize};
use skillswap_types::{SettlementParams, Timestamp, TradeId, UserId, VerificationMethod};
use std::sync::Arc;

/// Number of digits in a PIN.
pub const PIN_DIGITS: usize = 6;

const PIN_MODULUS: u64 = 1_000_000;

/// Random bytes behind an opaque QR token.
const QR_TOKEN_BYTES: usize = 16;

const QR_PREFIX: &str = "sswq_";

/// A token that has been registered against a trade.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedToken {
    pub token: VerificationToken,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
}

/// Mints PINs and QR tokens and registers them in a shared [`TokenRegistry`].
pub struct TokenIssuer<R> {
    random: R,
    registry: Arc<TokenRegistry>,
    validity_secs: u64,
    max_attempts: u32,
}

impl<R: RandomSource> TokenIssuer<R> {
    pub fn new(random: R, registry: Arc<TokenRegistry>, params: &SettlementParams) -> Self {
        Self {
            random,
            registry,
            validity_secs: params.token_validity_secs,
            max_attempts: params.token_issue_attempts.max(1),
        }
    }

    pub fn registry(&self) -> &Arc<TokenRegistry> {
        &self.registry
    }

    pub fn validity_secs(&self) -> u64 {
        self.validity_secs
    }

    /// A fresh 6-digit numeric PIN. Not registered.
    pub fn issue_pin(&self) -> Result<String, RandomError> {
        let mut buf = [0u8; 8];
        self.random.fill(&mut buf)?;
        // Modulo bias over a u64 is below 2^-44.
        let n = u64::from_le_bytes(buf) % PIN_MODULUS;
        Ok(format!("{:0width$}", n, width = PIN_DIGITS))
    }

    /// A fresh opaque QR token. Not registered.
    pub fn issue_qr_token(&self) -> Result<String, RandomError> {
        let mut buf = [0u8; QR_TOKEN_BYTES];
        self.random.fill(&mut buf)?;
        Ok(format!("{QR_PREFIX}{}", hex::encode(buf)))
    }

    fn generate(&self, method: VerificationMethod) -> Result<VerificationToken, RandomError> {
        match method {
            VerificationMethod::Pin => self.issue_pin().map(VerificationToken::Pin),
            VerificationMethod::Qr => self.issue_qr_token().map(VerificationToken::Qr),
        }
    }

    /// Mint and register a token for `trade_id`, retrying on collisions and
    /// random-source failures up to the configured bound.
    ///
    /// Never returns a token that collides with a live one for `counterparty`.
    pub fn issue_for(
        &self,
        method: VerificationMethod,
        counterparty: &UserId,
        trade_id: TradeId,
        now: Timestamp,
    ) -> Result<IssuedToken, TokenError> {
        let expires_at = now.plus_secs(self.validity_secs);
        let mut last_random_error = None;
        let mut collisions = 0u32;

        for attempt in 1..=self.max_attempts {
            let token = match self.generate(method) {
                Ok(token) => token,
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        source = self.random.name(),
                        error = %e,
                        "token generation failed"
                    );
                    last_random_error = Some(e);
                    continue;
                }
            };

            if self
                .registry
                .try_register(counterparty, &token, trade_id, now, expires_at)
            {
                tracing::debug!(%trade_id, %counterparty, %method, attempt, "issued verification token");
                return Ok(IssuedToken {
                    token,
                    issued_at: now,
                    expires_at,
                });
            }
            collisions += 1;
            tracing::warn!(%trade_id, %counterparty, attempt, "token collided with a live token");
        }

        match last_random_error {
            // Every attempt failed at the source.
            Some(e) if collisions == 0 => Err(TokenError::Random(e)),
            _ => Err(TokenError::Exhausted {
                attempts: self.max_attempts,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Replays scripted byte patterns; `None` entries fail.
    struct Scripted {
        script: Mutex<Vec<Option<u8>>>,
    }

    impl Scripted {
        fn new(mut script: Vec<Option<u8>>) -> Self {
            script.reverse();
            Self {
                script: Mutex::new(script),
            }
        }
    }

    impl RandomSource for Scripted {
        fn fill(&self, buf: &mut [u8]) -> Result<(), RandomError> {
            match self.script.lock().unwrap().pop() {
                Some(Some(byte)) => {
                    buf.fill(byte);
                    Ok(())
                }
                _ => Err(RandomError::Unavailable("scripted failure".into())),
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn issuer<R: RandomSource>(random: R) -> TokenIssuer<R> {
        TokenIssuer::new(random, Arc::new(TokenRegistry::new()), &SettlementParams::default())
    }

    #[test]
    fn pin_is_six_digits() {
        let issuer = issuer(crate::OsRandom);
        for _ in 0..500 {
            let pin = issuer.issue_pin().unwrap();
            assert_eq!(pin.len(), PIN_DIGITS);
            assert!(pin.chars().all(|c| c.is_ascii_digit()), "{pin}");
        }
    }

    #[test]
    fn pin_keeps_leading_zeros() {
        let issuer = issuer(Scripted::new(vec![Some(0)]));
        assert_eq!(issuer.issue_pin().unwrap(), "000000");
    }

    #[test]
    fn qr_tokens_are_distinct_across_ten_thousand() {
        let issuer = issuer(crate::OsRandom);
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let token = issuer.issue_qr_token().unwrap();
            assert!(!token.is_empty());
            assert!(seen.insert(token), "duplicate QR token");
        }
    }

    #[test]
    fn collision_is_retried() {
        let issuer = issuer(Scripted::new(vec![Some(7), Some(7), Some(9)]));
        let bob = UserId::new("bob");
        let now = Timestamp::new(0);
        let first = issuer
            .issue_for(VerificationMethod::Pin, &bob, TradeId::new(1), now)
            .unwrap();
        let second = issuer
            .issue_for(VerificationMethod::Pin, &bob, TradeId::new(2), now)
            .unwrap();
        assert_ne!(first.token, second.token);
        assert_eq!(second.expires_at, now.plus_secs(86_400));
    }

    #[test]
    fn persistent_collision_exhausts_instead_of_duplicating() {
        let issuer = issuer(Scripted::new(vec![Some(3); 4]));
        let bob = UserId::new("bob");
        let now = Timestamp::new(0);
        issuer
            .issue_for(VerificationMethod::Qr, &bob, TradeId::new(1), now)
            .unwrap();
        let err = issuer
            .issue_for(VerificationMethod::Qr, &bob, TradeId::new(2), now)
            .unwrap_err();
        assert_eq!(err, TokenError::Exhausted { attempts: 3 });
        assert!(err.is_retryable());
    }

    #[test]
    fn transient_source_failure_recovers_within_bound() {
        let issuer = issuer(Scripted::new(vec![None, None, Some(5)]));
        let issued = issuer
            .issue_for(VerificationMethod::Pin, &UserId::new("bob"), TradeId::new(1), Timestamp::new(0))
            .unwrap();
        assert_eq!(issued.token.method(), VerificationMethod::Pin);
    }

    #[test]
    fn dead_source_is_retryable_error() {
        let issuer = issuer(Scripted::new(vec![]));
        let err = issuer
            .issue_for(VerificationMethod::Qr, &UserId::new("bob"), TradeId::new(1), Timestamp::new(0))
            .unwrap_err();
        assert!(matches!(err, TokenError::Random(_)));
        assert!(err.is_retryable());
    }
}
