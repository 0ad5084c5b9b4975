//! Token Ledger
//!
//! Balance and allowance accounting engine for a single ERC20-style token.
//!
//! # Architecture
//!
//! - **Explicit State**: One [`TokenLedger`] owns balances, allowances and supply
//! - **Validate, then Commit**: A rejected call changes nothing and emits nothing
//! - **Event Log**: Every commit returns its events and appends them to a drainable log
//! - **Single Writer**: Shared access goes through one actor task
//!
//! # Invariants
//!
//! - Supply conservation: Σ(balances) == total_supply for all time
//! - Zero address: never holds a balance, never a transfer or approval party
//! - Checked arithmetic: 256-bit amounts never wrap or saturate
//! - Deterministic precedence: transfer_from reports balance before allowance

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod ledger;
pub mod error;
pub mod actor;
pub mod config;
pub mod metrics;

// Re-exports
pub use error::{AddressRole, DebitKind, Error, Result};
pub use types::{AccountId, Amount, InitParams, TokenEvent, TokenMetadata};
pub use ledger::TokenLedger;
pub use actor::{spawn_ledger_actor, LedgerHandle};
pub use config::Config;
pub use metrics::Metrics;
