//! Core types for the token ledger
//!
//! All types are designed for:
//! - Fixed-width identities (20-byte addresses, reserved zero address)
//! - Exact arithmetic (256-bit unsigned amounts, checked only)
//! - Stable serialization for external event observers (serde)

use primitive_types::{H160, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Token amount in base units (256-bit unsigned)
pub type Amount = U256;

/// Decimals reported when the initializer does not override them
pub const DEFAULT_DECIMALS: u8 = 18;

/// Account identifier (20-byte address)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AccountId(H160);

impl AccountId {
    /// The reserved zero address. Never a live participant.
    pub const ZERO: AccountId = AccountId(H160([0u8; 20]));

    /// Create from a small integer, big-endian in the low bytes
    pub fn from_low_u64(value: u64) -> Self {
        Self(H160::from_low_u64_be(value))
    }

    /// Whether this is the reserved zero address
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl FromStr for AccountId {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix("0x").unwrap_or(s);
        if hex.len() != 40 {
            return Err(crate::Error::InvalidAddress(s.to_string()));
        }
        H160::from_str(hex)
            .map(Self)
            .map_err(|_| crate::Error::InvalidAddress(s.to_string()))
    }
}

/// Domain event appended to the ledger log by every committed mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum TokenEvent {
    /// Tokens moved. Mints come from, and burns go to, the zero address.
    Transfer {
        /// Debited account
        from: AccountId,
        /// Credited account
        to: AccountId,
        /// Amount moved
        #[serde(with = "decimal_amount")]
        value: Amount,
    },

    /// Allowance set to `value` (always the resulting total, never a delta)
    Approval {
        /// Token owner
        owner: AccountId,
        /// Delegated spender
        spender: AccountId,
        /// Allowance after the call
        #[serde(with = "decimal_amount")]
        value: Amount,
    },
}

impl TokenEvent {
    /// Build a `Transfer` event
    pub fn transfer(from: AccountId, to: AccountId, value: Amount) -> Self {
        TokenEvent::Transfer { from, to, value }
    }

    /// Build an `Approval` event
    pub fn approval(owner: AccountId, spender: AccountId, value: Amount) -> Self {
        TokenEvent::Approval {
            owner,
            spender,
            value,
        }
    }

    /// Event name as observers see it
    pub fn name(&self) -> &'static str {
        match self {
            TokenEvent::Transfer { .. } => "Transfer",
            TokenEvent::Approval { .. } => "Approval",
        }
    }
}

/// Informational token metadata. Does not affect arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Token name
    pub name: String,
    /// Token symbol
    pub symbol: String,
    /// Display decimals
    pub decimals: u8,
}

/// Parameters for the one-time ledger initialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitParams {
    /// Token name
    pub name: String,
    /// Token symbol
    pub symbol: String,
    /// Display decimals
    pub decimals: u8,
    /// Account credited with the initial supply, if any
    pub initial_holder: Option<AccountId>,
    /// Initial supply minted to `initial_holder`
    pub initial_supply: Amount,
}

impl InitParams {
    /// Name and symbol only: default decimals, no initial mint
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals: DEFAULT_DECIMALS,
            initial_holder: None,
            initial_supply: Amount::zero(),
        }
    }

    /// Override display decimals
    pub fn with_decimals(mut self, decimals: u8) -> Self {
        self.decimals = decimals;
        self
    }

    /// Credit `holder` with `supply` at initialization
    pub fn with_initial_mint(mut self, holder: AccountId, supply: Amount) -> Self {
        self.initial_holder = Some(holder);
        self.initial_supply = supply;
        self
    }
}

/// Serde helper encoding an [`Amount`] as a base-10 string.
///
/// Deserialization also accepts plain integers, which keeps small amounts
/// in TOML readable.
pub mod decimal_amount {
    use super::Amount;
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Text(String),
    }

    /// Serialize as a decimal string
    pub fn serialize<S: Serializer>(value: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    /// Deserialize from a decimal string or an integer
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Int(value) => Ok(Amount::from(value)),
            Raw::Text(text) => Amount::from_dec_str(text.trim())
                .map_err(|e| de::Error::custom(format!("invalid amount {text:?}: {e:?}"))),
        }
    }
}
