//! Balance and allowance accounting engine
//!
//! [`TokenLedger`] owns all state for one token instance. Every mutating
//! operation validates first, then commits balances, allowances and events
//! together. A rejected call leaves state untouched and emits nothing.
//!
//! # Example
//!
//! ```
//! use token_ledger::{AccountId, Amount, InitParams, TokenLedger};
//!
//! let holder = AccountId::from_low_u64(1);
//! let recipient = AccountId::from_low_u64(2);
//! let params = InitParams::new("My Token", "MTKN").with_initial_mint(holder, Amount::from(100));
//! let mut ledger = TokenLedger::initialize(params)?;
//!
//! let events = ledger.transfer(holder, recipient, Amount::from(40))?;
//! assert_eq!(events.len(), 1);
//! assert_eq!(ledger.balance_of(holder), Amount::from(60));
//! # Ok::<(), token_ledger::Error>(())
//! ```
//!
//! # Invariants
//!
//! - Supply conservation: Σ(balances) == total_supply for all time
//! - The zero address never holds a balance or appears in an allowance key
//! - Append-only: events are never modified once logged

use crate::{
    error::{AddressRole, DebitKind},
    types::{AccountId, Amount, InitParams, TokenEvent, TokenMetadata},
    Error, Result,
};
use std::collections::HashMap;

/// Validated balance move, ready to commit
#[derive(Debug, Clone, Copy)]
struct BalanceMove {
    from: AccountId,
    to: AccountId,
    amount: Amount,
    new_from_balance: Amount,
    new_to_balance: Amount,
}

/// Ledger state for a single token instance
#[derive(Debug)]
pub struct TokenLedger {
    /// Name, symbol, decimals
    metadata: TokenMetadata,

    /// Running total of all balances
    total_supply: Amount,

    /// Balance per account (missing = 0)
    balances: HashMap<AccountId, Amount>,

    /// Allowance per (owner, spender) (missing = 0)
    allowances: HashMap<(AccountId, AccountId), Amount>,

    /// Append-only event log, drained by the observer
    events: Vec<TokenEvent>,
}

impl TokenLedger {
    /// Create and initialize a ledger.
    ///
    /// With an initial holder the supply is minted to it and one
    /// `Transfer { from: ZERO, .. }` is logged. Without one nothing is minted.
    pub fn initialize(params: InitParams) -> Result<Self> {
        let InitParams {
            name,
            symbol,
            decimals,
            initial_holder,
            initial_supply,
        } = params;

        if initial_holder.is_none() && !initial_supply.is_zero() {
            return Err(Error::Config(
                "initial supply given without an initial holder".to_string(),
            ));
        }

        let mut ledger = Self {
            metadata: TokenMetadata {
                name,
                symbol,
                decimals,
            },
            total_supply: Amount::zero(),
            balances: HashMap::new(),
            allowances: HashMap::new(),
            events: Vec::new(),
        };

        if let Some(holder) = initial_holder {
            ledger.mint(holder, initial_supply)?;
        }

        tracing::info!(
            name = %ledger.metadata.name,
            symbol = %ledger.metadata.symbol,
            decimals = ledger.metadata.decimals,
            total_supply = %ledger.total_supply,
            "Token ledger initialized"
        );

        Ok(ledger)
    }

    /// Token name
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Token symbol
    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    /// Display decimals
    pub fn decimals(&self) -> u8 {
        self.metadata.decimals
    }

    /// All metadata at once
    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    /// Balance of `account`, zero if unknown
    pub fn balance_of(&self, account: AccountId) -> Amount {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    /// Remaining amount `spender` may move out of `owner`'s balance
    pub fn allowance(&self, owner: AccountId, spender: AccountId) -> Amount {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    /// Sum of all balances
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Committed event log, oldest first
    pub fn events(&self) -> &[TokenEvent] {
        &self.events
    }

    /// Hand the committed log to the observer and start a fresh one
    pub fn drain_events(&mut self) -> Vec<TokenEvent> {
        std::mem::take(&mut self.events)
    }

    /// Move `amount` from `sender` to `to`
    pub fn transfer(
        &mut self,
        sender: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<Vec<TokenEvent>> {
        let plan = self
            .plan_move(sender, to, amount)
            .map_err(|e| rejected("transfer", e))?;

        self.apply_move(&plan);
        tracing::debug!(from = %sender, to = %to, amount = %amount, "Transfer committed");

        Ok(self.emit(vec![TokenEvent::transfer(sender, to, amount)]))
    }

    /// Set `spender`'s allowance over `owner`'s balance, replacing any prior value
    pub fn approve(
        &mut self,
        owner: AccountId,
        spender: AccountId,
        amount: Amount,
    ) -> Result<Vec<TokenEvent>> {
        check_approval_parties(owner, spender).map_err(|e| rejected("approve", e))?;

        Ok(self.set_allowance(owner, spender, amount))
    }

    /// Add `added` to the allowance; the event carries the resulting total
    pub fn increase_allowance(
        &mut self,
        owner: AccountId,
        spender: AccountId,
        added: Amount,
    ) -> Result<Vec<TokenEvent>> {
        let new_allowance = check_approval_parties(owner, spender)
            .and_then(|()| {
                self.allowance(owner, spender)
                    .checked_add(added)
                    .ok_or(Error::Overflow)
            })
            .map_err(|e| rejected("increase_allowance", e))?;

        Ok(self.set_allowance(owner, spender, new_allowance))
    }

    /// Subtract `subtracted` from the allowance; the event carries the
    /// resulting total, zero included.
    ///
    /// The underflow check runs before the address checks.
    pub fn decrease_allowance(
        &mut self,
        owner: AccountId,
        spender: AccountId,
        subtracted: Amount,
    ) -> Result<Vec<TokenEvent>> {
        let current = self.allowance(owner, spender);
        let new_allowance = current
            .checked_sub(subtracted)
            .ok_or(Error::AllowanceUnderflow {
                allowance: current,
                subtracted,
            })
            .and_then(|value| check_approval_parties(owner, spender).map(|()| value))
            .map_err(|e| rejected("decrease_allowance", e))?;

        Ok(self.set_allowance(owner, spender, new_allowance))
    }

    /// Move `amount` from `from` to `to` on `from`'s behalf, spending
    /// `spender`'s allowance.
    ///
    /// Check order: zero `from`, zero `to`, balance, allowance. When both
    /// balance and allowance are short the balance error is returned.
    pub fn transfer_from(
        &mut self,
        spender: AccountId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<Vec<TokenEvent>> {
        let (plan, new_allowance) = self
            .plan_move(from, to, amount)
            .and_then(|plan| {
                let allowance = self.allowance(from, spender);
                if allowance < amount {
                    return Err(Error::InsufficientAllowance {
                        allowance,
                        needed: amount,
                    });
                }
                if spender.is_zero() {
                    return Err(Error::ZeroAddress(AddressRole::ApproveTo));
                }
                Ok((plan, allowance - amount))
            })
            .map_err(|e| rejected("transfer_from", e))?;

        self.apply_move(&plan);
        self.allowances.insert((from, spender), new_allowance);
        tracing::debug!(
            spender = %spender,
            from = %from,
            to = %to,
            amount = %amount,
            remaining = %new_allowance,
            "Delegated transfer committed"
        );

        Ok(self.emit(vec![
            TokenEvent::transfer(from, to, amount),
            TokenEvent::approval(from, spender, new_allowance),
        ]))
    }

    /// Create `amount` new tokens credited to `to`
    pub fn mint(&mut self, to: AccountId, amount: Amount) -> Result<Vec<TokenEvent>> {
        let (new_supply, new_balance) = self
            .plan_mint(to, amount)
            .map_err(|e| rejected("mint", e))?;

        self.total_supply = new_supply;
        self.balances.insert(to, new_balance);
        tracing::debug!(to = %to, amount = %amount, total_supply = %new_supply, "Mint committed");

        Ok(self.emit(vec![TokenEvent::transfer(AccountId::ZERO, to, amount)]))
    }

    /// Destroy `amount` tokens held by `from`
    pub fn burn(&mut self, from: AccountId, amount: Amount) -> Result<Vec<TokenEvent>> {
        let (new_supply, new_balance) = self
            .plan_burn(from, amount)
            .map_err(|e| rejected("burn", e))?;

        self.total_supply = new_supply;
        self.balances.insert(from, new_balance);
        tracing::debug!(
            from = %from,
            amount = %amount,
            total_supply = %new_supply,
            "Burn committed"
        );

        Ok(self.emit(vec![TokenEvent::transfer(from, AccountId::ZERO, amount)]))
    }

    /// Recompute Σ(balances) and compare with the running total
    pub fn check_supply_invariant(&self) -> Result<()> {
        if !self.balance_of(AccountId::ZERO).is_zero() {
            return Err(Error::InvariantViolation(
                "zero address holds a balance".to_string(),
            ));
        }

        let mut sum = Amount::zero();
        for balance in self.balances.values() {
            sum = sum.checked_add(*balance).ok_or_else(|| {
                Error::InvariantViolation("sum of balances overflows".to_string())
            })?;
        }

        if sum != self.total_supply {
            return Err(Error::InvariantViolation(format!(
                "sum of balances {} != total supply {}",
                sum, self.total_supply
            )));
        }

        Ok(())
    }

    fn plan_move(&self, from: AccountId, to: AccountId, amount: Amount) -> Result<BalanceMove> {
        if from.is_zero() {
            return Err(Error::ZeroAddress(AddressRole::TransferFrom));
        }
        if to.is_zero() {
            return Err(Error::ZeroAddress(AddressRole::TransferTo));
        }

        let from_balance = self.balance_of(from);
        let new_from_balance =
            from_balance
                .checked_sub(amount)
                .ok_or(Error::InsufficientBalance {
                    op: DebitKind::Transfer,
                    balance: from_balance,
                    needed: amount,
                })?;

        // Self-transfer credits the already-debited balance
        let to_base = if from == to {
            new_from_balance
        } else {
            self.balance_of(to)
        };
        let new_to_balance = to_base.checked_add(amount).ok_or(Error::Overflow)?;

        Ok(BalanceMove {
            from,
            to,
            amount,
            new_from_balance,
            new_to_balance,
        })
    }

    fn apply_move(&mut self, plan: &BalanceMove) {
        debug_assert!(plan.amount <= plan.new_to_balance);
        self.balances.insert(plan.from, plan.new_from_balance);
        self.balances.insert(plan.to, plan.new_to_balance);
    }

    fn plan_mint(&self, to: AccountId, amount: Amount) -> Result<(Amount, Amount)> {
        if to.is_zero() {
            return Err(Error::ZeroAddress(AddressRole::MintTo));
        }
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        let new_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        Ok((new_supply, new_balance))
    }

    fn plan_burn(&self, from: AccountId, amount: Amount) -> Result<(Amount, Amount)> {
        if from.is_zero() {
            return Err(Error::ZeroAddress(AddressRole::BurnFrom));
        }
        let balance = self.balance_of(from);
        let new_balance = balance
            .checked_sub(amount)
            .ok_or(Error::InsufficientBalance {
                op: DebitKind::Burn,
                balance,
                needed: amount,
            })?;
        let new_supply = self.total_supply.checked_sub(amount).ok_or_else(|| {
            Error::InvariantViolation("burn exceeds total supply".to_string())
        })?;
        Ok((new_supply, new_balance))
    }

    fn set_allowance(
        &mut self,
        owner: AccountId,
        spender: AccountId,
        amount: Amount,
    ) -> Vec<TokenEvent> {
        self.allowances.insert((owner, spender), amount);
        tracing::debug!(owner = %owner, spender = %spender, allowance = %amount, "Allowance set");
        self.emit(vec![TokenEvent::approval(owner, spender, amount)])
    }

    fn emit(&mut self, events: Vec<TokenEvent>) -> Vec<TokenEvent> {
        self.events.extend(events.iter().cloned());
        events
    }
}

fn check_approval_parties(owner: AccountId, spender: AccountId) -> Result<()> {
    if owner.is_zero() {
        return Err(Error::ZeroAddress(AddressRole::ApproveFrom));
    }
    if spender.is_zero() {
        return Err(Error::ZeroAddress(AddressRole::ApproveTo));
    }
    Ok(())
}

fn rejected(op: &'static str, err: Error) -> Error {
    tracing::warn!(op, error = %err, "Operation rejected");
    err
}
