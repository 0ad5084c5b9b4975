//! Actor-based concurrency for the ledger
//!
//! This module implements the single-writer pattern using Tokio actors:
//! - One task owns the [`TokenLedger`]; no locks around balances or allowances
//! - Every call is processed to completion before the next is received
//! - Async message passing with backpressure (bounded mailbox)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  Callers (any task)                  │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │                 LedgerHandle (Clone)                 │
//! │         Sends messages to actor mailbox              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              LedgerActor (Single Task)               │
//! │   validate → mutate → emit, then reply via oneshot   │
//! └──────────────────────────────────────────────────────┘
//! ```

use crate::{
    metrics::Metrics,
    types::{AccountId, Amount, TokenEvent, TokenMetadata},
    Error, Result, TokenLedger,
};
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};

type Reply<T> = oneshot::Sender<T>;

/// Message sent to the ledger actor
#[derive(Debug)]
pub(crate) enum LedgerMessage {
    /// transfer(sender, to, amount)
    Transfer {
        sender: AccountId,
        to: AccountId,
        amount: Amount,
        response: Reply<Result<Vec<TokenEvent>>>,
    },

    /// transfer_from(spender, from, to, amount)
    TransferFrom {
        spender: AccountId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
        response: Reply<Result<Vec<TokenEvent>>>,
    },

    /// approve(owner, spender, amount)
    Approve {
        owner: AccountId,
        spender: AccountId,
        amount: Amount,
        response: Reply<Result<Vec<TokenEvent>>>,
    },

    /// increase_allowance(owner, spender, added)
    IncreaseAllowance {
        owner: AccountId,
        spender: AccountId,
        added: Amount,
        response: Reply<Result<Vec<TokenEvent>>>,
    },

    /// decrease_allowance(owner, spender, subtracted)
    DecreaseAllowance {
        owner: AccountId,
        spender: AccountId,
        subtracted: Amount,
        response: Reply<Result<Vec<TokenEvent>>>,
    },

    /// mint(to, amount)
    Mint {
        to: AccountId,
        amount: Amount,
        response: Reply<Result<Vec<TokenEvent>>>,
    },

    /// burn(from, amount)
    Burn {
        from: AccountId,
        amount: Amount,
        response: Reply<Result<Vec<TokenEvent>>>,
    },

    /// Balance of an account
    BalanceOf {
        account: AccountId,
        response: Reply<Amount>,
    },

    /// Allowance of (owner, spender)
    Allowance {
        owner: AccountId,
        spender: AccountId,
        response: Reply<Amount>,
    },

    /// Total supply
    TotalSupply { response: Reply<Amount> },

    /// Name, symbol, decimals
    Metadata { response: Reply<TokenMetadata> },

    /// Take the committed event log
    DrainEvents { response: Reply<Vec<TokenEvent>> },

    /// Recompute the supply invariant
    CheckInvariant { response: Reply<Result<()>> },

    /// Shutdown actor
    Shutdown,
}

/// Actor that owns the ledger and processes messages one at a time
#[derive(Debug)]
pub(crate) struct LedgerActor {
    /// Ledger state
    ledger: TokenLedger,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<LedgerMessage>,

    /// Operation metrics
    metrics: Metrics,
}

impl LedgerActor {
    /// Create new actor
    pub fn new(
        ledger: TokenLedger,
        mailbox: mpsc::Receiver<LedgerMessage>,
        metrics: Metrics,
    ) -> Self {
        Self {
            ledger,
            mailbox,
            metrics,
        }
    }

    /// Run the actor event loop until shutdown or all handles are dropped.
    ///
    /// Returns the ledger so its final state can be inspected.
    pub async fn run(mut self) -> TokenLedger {
        while let Some(msg) = self.mailbox.recv().await {
            if let LedgerMessage::Shutdown = msg {
                tracing::info!("Ledger actor shutting down");
                break;
            }
            self.handle_message(msg);
        }
        self.ledger
    }

    /// Handle a single message
    fn handle_message(&mut self, msg: LedgerMessage) {
        match msg {
            LedgerMessage::Transfer {
                sender,
                to,
                amount,
                response,
            } => {
                let result = self.mutate("transfer", |l| l.transfer(sender, to, amount));
                reply(response, result);
            }

            LedgerMessage::TransferFrom {
                spender,
                from,
                to,
                amount,
                response,
            } => {
                let result = self.mutate("transfer_from", |l| {
                    l.transfer_from(spender, from, to, amount)
                });
                reply(response, result);
            }

            LedgerMessage::Approve {
                owner,
                spender,
                amount,
                response,
            } => {
                let result = self.mutate("approve", |l| l.approve(owner, spender, amount));
                reply(response, result);
            }

            LedgerMessage::IncreaseAllowance {
                owner,
                spender,
                added,
                response,
            } => {
                let result = self.mutate("increase_allowance", |l| {
                    l.increase_allowance(owner, spender, added)
                });
                reply(response, result);
            }

            LedgerMessage::DecreaseAllowance {
                owner,
                spender,
                subtracted,
                response,
            } => {
                let result = self.mutate("decrease_allowance", |l| {
                    l.decrease_allowance(owner, spender, subtracted)
                });
                reply(response, result);
            }

            LedgerMessage::Mint {
                to,
                amount,
                response,
            } => {
                let result = self.mutate("mint", |l| l.mint(to, amount));
                reply(response, result);
            }

            LedgerMessage::Burn {
                from,
                amount,
                response,
            } => {
                let result = self.mutate("burn", |l| l.burn(from, amount));
                reply(response, result);
            }

            LedgerMessage::BalanceOf { account, response } => {
                reply(response, self.ledger.balance_of(account));
            }

            LedgerMessage::Allowance {
                owner,
                spender,
                response,
            } => {
                reply(response, self.ledger.allowance(owner, spender));
            }

            LedgerMessage::TotalSupply { response } => {
                reply(response, self.ledger.total_supply());
            }

            LedgerMessage::Metadata { response } => {
                reply(response, self.ledger.metadata().clone());
            }

            LedgerMessage::DrainEvents { response } => {
                reply(response, self.ledger.drain_events());
            }

            LedgerMessage::CheckInvariant { response } => {
                reply(response, self.ledger.check_supply_invariant());
            }

            LedgerMessage::Shutdown => {
                // Handled in run loop
            }
        }
    }

    /// Run one mutating operation and record its outcome
    fn mutate(
        &mut self,
        op: &'static str,
        f: impl FnOnce(&mut TokenLedger) -> Result<Vec<TokenEvent>>,
    ) -> Result<Vec<TokenEvent>> {
        let started = Instant::now();
        let result = f(&mut self.ledger);
        self.metrics.record_duration(started.elapsed().as_secs_f64());
        self.metrics.record_outcome(op, &result);
        result
    }
}

fn reply<T>(response: Reply<T>, value: T) {
    if response.send(value).is_err() {
        tracing::error!("Caller dropped before the ledger replied");
    }
}

/// Handle for sending messages to the actor
#[derive(Clone, Debug)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerMessage>,
}

impl LedgerHandle {
    /// Create new handle
    pub(crate) fn new(sender: mpsc::Sender<LedgerMessage>) -> Self {
        Self { sender }
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> LedgerMessage) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Move `amount` from `sender` to `to`
    pub async fn transfer(
        &self,
        sender: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<Vec<TokenEvent>> {
        self.request(|response| LedgerMessage::Transfer {
            sender,
            to,
            amount,
            response,
        })
        .await?
    }

    /// Delegated transfer by `spender`
    pub async fn transfer_from(
        &self,
        spender: AccountId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<Vec<TokenEvent>> {
        self.request(|response| LedgerMessage::TransferFrom {
            spender,
            from,
            to,
            amount,
            response,
        })
        .await?
    }

    /// Replace the allowance of (owner, spender)
    pub async fn approve(
        &self,
        owner: AccountId,
        spender: AccountId,
        amount: Amount,
    ) -> Result<Vec<TokenEvent>> {
        self.request(|response| LedgerMessage::Approve {
            owner,
            spender,
            amount,
            response,
        })
        .await?
    }

    /// Add to the allowance of (owner, spender)
    pub async fn increase_allowance(
        &self,
        owner: AccountId,
        spender: AccountId,
        added: Amount,
    ) -> Result<Vec<TokenEvent>> {
        self.request(|response| LedgerMessage::IncreaseAllowance {
            owner,
            spender,
            added,
            response,
        })
        .await?
    }

    /// Subtract from the allowance of (owner, spender)
    pub async fn decrease_allowance(
        &self,
        owner: AccountId,
        spender: AccountId,
        subtracted: Amount,
    ) -> Result<Vec<TokenEvent>> {
        self.request(|response| LedgerMessage::DecreaseAllowance {
            owner,
            spender,
            subtracted,
            response,
        })
        .await?
    }

    /// Mint `amount` to `to`
    pub async fn mint(&self, to: AccountId, amount: Amount) -> Result<Vec<TokenEvent>> {
        self.request(|response| LedgerMessage::Mint {
            to,
            amount,
            response,
        })
        .await?
    }

    /// Burn `amount` from `from`
    pub async fn burn(&self, from: AccountId, amount: Amount) -> Result<Vec<TokenEvent>> {
        self.request(|response| LedgerMessage::Burn {
            from,
            amount,
            response,
        })
        .await?
    }

    /// Get balance
    pub async fn balance_of(&self, account: AccountId) -> Result<Amount> {
        self.request(|response| LedgerMessage::BalanceOf { account, response })
            .await
    }

    /// Get allowance
    pub async fn allowance(&self, owner: AccountId, spender: AccountId) -> Result<Amount> {
        self.request(|response| LedgerMessage::Allowance {
            owner,
            spender,
            response,
        })
        .await
    }

    /// Get total supply
    pub async fn total_supply(&self) -> Result<Amount> {
        self.request(|response| LedgerMessage::TotalSupply { response })
            .await
    }

    /// Get token metadata
    pub async fn metadata(&self) -> Result<TokenMetadata> {
        self.request(|response| LedgerMessage::Metadata { response })
            .await
    }

    /// Take the committed event log
    pub async fn drain_events(&self) -> Result<Vec<TokenEvent>> {
        self.request(|response| LedgerMessage::DrainEvents { response })
            .await
    }

    /// Recompute the supply invariant inside the actor
    pub async fn check_supply_invariant(&self) -> Result<()> {
        self.request(|response| LedgerMessage::CheckInvariant { response })
            .await?
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(LedgerMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the ledger actor.
///
/// The join handle yields the ledger back once the actor stops.
pub fn spawn_ledger_actor(
    ledger: TokenLedger,
    mailbox_capacity: usize,
    metrics: Metrics,
) -> (LedgerHandle, tokio::task::JoinHandle<TokenLedger>) {
    let (tx, rx) = mpsc::channel(mailbox_capacity);
    let actor = LedgerActor::new(ledger, rx, metrics);

    let task = tokio::spawn(actor.run());

    (LedgerHandle::new(tx), task)
}
