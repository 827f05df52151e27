//! Shared store of currently-valid tokens.
//!
//! Keyed by counterparty. Only digests are kept, so a dump of the registry
//! cannot be replayed as tokens.

use crate::error::TokenError;
use crate::token::{TokenDigest, VerificationToken};
use skillswap_types::{Timestamp, TradeId, UserId, VerificationMethod};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Clone, Debug)]
struct ActiveToken {
    digest: TokenDigest,
    method: VerificationMethod,
    trade_id: TradeId,
    expires_at: Timestamp,
}

impl ActiveToken {
    fn is_live(&self, now: Timestamp) -> bool {
        now < self.expires_at
    }
}

/// Thread-safe registry shared by every issuer.
#[derive(Debug, Default)]
pub struct TokenRegistry {
    by_counterparty: Mutex<HashMap<UserId, Vec<ActiveToken>>>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `token` for `trade_id` unless it collides with a live token
    /// for the same counterparty. Check and insert happen under one lock.
    ///
    /// Returns `false` on collision.
    pub fn try_register(
        &self,
        counterparty: &UserId,
        token: &VerificationToken,
        trade_id: TradeId,
        now: Timestamp,
        expires_at: Timestamp,
    ) -> bool {
        let digest = token.digest();
        let mut map = self.by_counterparty.lock().unwrap();
        let entries = map.entry(counterparty.clone()).or_default();
        entries.retain(|t| t.is_live(now));
        if entries.iter().any(|t| t.digest == digest) {
            return false;
        }
        entries.push(ActiveToken {
            digest,
            method: token.method(),
            trade_id,
            expires_at,
        });
        true
    }

    /// Check `presented` against the token bound to `trade_id` without
    /// consuming it.
    pub fn verify(
        &self,
        counterparty: &UserId,
        trade_id: TradeId,
        presented: &str,
        now: Timestamp,
    ) -> Result<(), TokenError> {
        let map = self.by_counterparty.lock().unwrap();
        let entries = map.get(counterparty).ok_or(TokenError::InvalidToken)?;
        matching(entries, trade_id, presented, now).map(|_| ())
    }

    /// Consume the token bound to `trade_id` if `presented` matches it.
    ///
    /// A mismatch leaves the token in place; a match removes it so it cannot
    /// be used twice.
    pub fn redeem(
        &self,
        counterparty: &UserId,
        trade_id: TradeId,
        presented: &str,
        now: Timestamp,
    ) -> Result<(), TokenError> {
        let mut map = self.by_counterparty.lock().unwrap();
        let entries = map
            .get_mut(counterparty)
            .ok_or(TokenError::InvalidToken)?;
        let idx = matching(entries, trade_id, presented, now)?;
        entries.swap_remove(idx);
        Ok(())
    }

    /// Drop whatever token is bound to `trade_id`. Returns whether one existed.
    pub fn revoke(&self, counterparty: &UserId, trade_id: TradeId) -> bool {
        let mut map = self.by_counterparty.lock().unwrap();
        let Some(entries) = map.get_mut(counterparty) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|t| t.trade_id != trade_id);
        before != entries.len()
    }

    /// Live tokens held for a counterparty.
    pub fn active_count(&self, counterparty: &UserId, now: Timestamp) -> usize {
        let map = self.by_counterparty.lock().unwrap();
        map.get(counterparty)
            .map(|entries| entries.iter().filter(|t| t.is_live(now)).count())
            .unwrap_or(0)
    }

    /// Remove every token whose window has closed. Returns how many were dropped.
    pub fn purge_expired(&self, now: Timestamp) -> usize {
        let mut map = self.by_counterparty.lock().unwrap();
        let mut removed = 0;
        map.retain(|_, entries| {
            let before = entries.len();
            entries.retain(|t| t.is_live(now));
            removed += before - entries.len();
            !entries.is_empty()
        });
        removed
    }
}

/// Index of the live entry for `trade_id` whose digest matches `presented`.
fn matching(
    entries: &[ActiveToken],
    trade_id: TradeId,
    presented: &str,
    now: Timestamp,
) -> Result<usize, TokenError> {
    let idx = entries
        .iter()
        .position(|t| t.trade_id == trade_id)
        .ok_or(TokenError::InvalidToken)?;
    let entry = &entries[idx];
    if !entry.is_live(now) {
        return Err(TokenError::Expired);
    }
    if TokenDigest::of(entry.method, presented) != entry.digest {
        return Err(TokenError::InvalidToken);
    }
    Ok(idx)
}
