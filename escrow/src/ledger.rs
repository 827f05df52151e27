//! Balances and holds.

use crate::error::EscrowError;
use crate::hold::{EscrowHold, HoldState};
use skillswap_types::{Credits, HoldId, Timestamp, TradeId, UserId};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct EscrowLedger {
    balances: HashMap<UserId, Credits>,
    holds: HashMap<HoldId, EscrowHold>,
    next_hold: u64,
}

impl EscrowLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Available (unheld) balance.
    pub fn balance(&self, user: &UserId) -> Credits {
        self.balances.get(user).copied().unwrap_or(Credits::ZERO)
    }

    /// Credits currently reserved from `user` by open holds.
    pub fn held_by(&self, user: &UserId) -> Credits {
        self.holds
            .values()
            .filter(|h| h.state == HoldState::Held && &h.payer == user)
            .fold(Credits::ZERO, |acc, h| acc.saturating_add(h.amount))
    }

    pub fn deposit(&mut self, user: &UserId, amount: Credits) -> Result<Credits, EscrowError> {
        self.credit(user, amount)
    }

    pub fn hold(&self, id: HoldId) -> Option<&EscrowHold> {
        self.holds.get(&id)
    }

    /// Reserve `amount` from `payer` for `trade_id`.
    pub fn open_hold(
        &mut self,
        trade_id: TradeId,
        amount: Credits,
        payer: &UserId,
        payee: &UserId,
        now: Timestamp,
    ) -> Result<HoldId, EscrowError> {
        if payer == payee {
            return Err(EscrowError::SelfTransfer(payer.clone()));
        }
        self.debit(payer, amount)?;

        self.next_hold += 1;
        let id = HoldId::new(self.next_hold);
        self.holds.insert(
            id,
            EscrowHold {
                id,
                trade_id,
                payer: payer.clone(),
                payee: payee.clone(),
                amount,
                state: HoldState::Held,
                opened_at: now,
            },
        );
        tracing::info!(hold = %id, %trade_id, %payer, %amount, "escrow hold opened");
        Ok(id)
    }

    /// Pay the held credits to the payee. Succeeds at most once per hold.
    pub fn release(&mut self, id: HoldId) -> Result<(), EscrowError> {
        let (payee, amount) = self.settle(id, HoldState::Released)?;
        tracing::info!(hold = %id, %payee, %amount, "escrow hold released");
        Ok(())
    }

    /// Return the held credits to the payer. Succeeds at most once per hold.
    pub fn void(&mut self, id: HoldId) -> Result<(), EscrowError> {
        let (payer, amount) = self.settle(id, HoldState::Voided)?;
        tracing::info!(hold = %id, %payer, %amount, "escrow hold voided");
        Ok(())
    }

    /// Move credits directly, with no intermediate hold.
    pub fn transfer(
        &mut self,
        payer: &UserId,
        payee: &UserId,
        amount: Credits,
    ) -> Result<(), EscrowError> {
        if payer == payee {
            return Err(EscrowError::SelfTransfer(payer.clone()));
        }
        let remaining = self.debited(payer, amount)?;
        let received = self.credited(payee, amount)?;
        self.balances.insert(payer.clone(), remaining);
        self.balances.insert(payee.clone(), received);
        tracing::info!(%payer, %payee, %amount, "credits transferred");
        Ok(())
    }

    /// Credit the recipient, then mark the hold settled. A failed credit
    /// leaves the hold open.
    fn settle(&mut self, id: HoldId, to: HoldState) -> Result<(UserId, Credits), EscrowError> {
        let hold = self.holds.get(&id).ok_or(EscrowError::HoldNotFound(id))?;
        if hold.state.is_settled() {
            return Err(EscrowError::HoldAlreadySettled {
                hold: id,
                state: hold.state,
            });
        }
        let recipient = match to {
            HoldState::Released => hold.payee.clone(),
            _ => hold.payer.clone(),
        };
        let amount = hold.amount;

        self.credit(&recipient, amount)?;
        if let Some(hold) = self.holds.get_mut(&id) {
            hold.state = to;
        }
        Ok((recipient, amount))
    }

    fn debit(&mut self, user: &UserId, amount: Credits) -> Result<(), EscrowError> {
        let remaining = self.debited(user, amount)?;
        self.balances.insert(user.clone(), remaining);
        Ok(())
    }

    fn credit(&mut self, user: &UserId, amount: Credits) -> Result<Credits, EscrowError> {
        let updated = self.credited(user, amount)?;
        self.balances.insert(user.clone(), updated);
        Ok(updated)
    }

    fn debited(&self, user: &UserId, amount: Credits) -> Result<Credits, EscrowError> {
        let available = self.balance(user);
        available
            .checked_sub(amount)
            .ok_or_else(|| EscrowError::InsufficientCredits {
                user: user.clone(),
                needed: amount,
                available,
            })
    }

    fn credited(&self, user: &UserId, amount: Credits) -> Result<Credits, EscrowError> {
        self.balance(user)
            .checked_add(amount)
            .ok_or_else(|| EscrowError::Overflow(user.clone()))
    }
}
