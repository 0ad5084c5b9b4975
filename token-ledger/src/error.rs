//! Error types for the token ledger
//!
//! Ledger rejections carry the stable ERC20-style messages callers match on
//! (for example `"transfer amount exceeds balance"`).

use crate::types::Amount;
use std::fmt;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Role in which the zero address was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressRole {
    /// Debited side of a transfer
    TransferFrom,
    /// Credited side of a transfer
    TransferTo,
    /// Owner granting an allowance
    ApproveFrom,
    /// Spender receiving an allowance
    ApproveTo,
    /// Mint recipient
    MintTo,
    /// Burn source
    BurnFrom,
}

impl fmt::Display for AddressRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role = match self {
            AddressRole::TransferFrom => "transfer from",
            AddressRole::TransferTo => "transfer to",
            AddressRole::ApproveFrom => "approve from",
            AddressRole::ApproveTo => "approve to",
            AddressRole::MintTo => "mint to",
            AddressRole::BurnFrom => "burn from",
        };
        f.write_str(role)
    }
}

/// Operation that tried to debit a balance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitKind {
    /// transfer / transfer_from
    Transfer,
    /// burn
    Burn,
}

impl fmt::Display for DebitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebitKind::Transfer => f.write_str("transfer"),
            DebitKind::Burn => f.write_str("burn"),
        }
    }
}

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Zero address used where a live participant is required
    #[error("ERC20: {0} the zero address")]
    ZeroAddress(AddressRole),

    /// Transfer or burn would drive a balance negative
    #[error("ERC20: {op} amount exceeds balance")]
    InsufficientBalance {
        /// Debiting operation
        op: DebitKind,
        /// Balance at validation time
        balance: Amount,
        /// Amount requested
        needed: Amount,
    },

    /// Delegated transfer exceeds the remaining allowance
    #[error("ERC20: transfer amount exceeds allowance")]
    InsufficientAllowance {
        /// Allowance at validation time
        allowance: Amount,
        /// Amount requested
        needed: Amount,
    },

    /// decrease_allowance would drive an allowance negative
    #[error("ERC20: decreased allowance below zero")]
    AllowanceUnderflow {
        /// Allowance at validation time
        allowance: Amount,
        /// Amount requested to subtract
        subtracted: Amount,
    },

    /// Result exceeds the 256-bit amount range
    #[error("ERC20: amount overflow")]
    Overflow,

    /// Address string could not be parsed
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Invariant violation (supply conservation, etc.)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short stable label, used as a metrics dimension
    pub fn kind(&self) -> &'static str {
        match self {
            Error::ZeroAddress(_) => "zero_address",
            Error::InsufficientBalance { .. } => "insufficient_balance",
            Error::InsufficientAllowance { .. } => "insufficient_allowance",
            Error::AllowanceUnderflow { .. } => "allowance_underflow",
            Error::Overflow => "overflow",
            Error::InvalidAddress(_) => "invalid_address",
            Error::InvariantViolation(_) => "invariant_violation",
            Error::Concurrency(_) => "concurrency",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_address_messages() {
        assert_eq!(
            Error::ZeroAddress(AddressRole::TransferTo).to_string(),
            "ERC20: transfer to the zero address"
        );
        assert_eq!(
            Error::ZeroAddress(AddressRole::ApproveFrom).to_string(),
            "ERC20: approve from the zero address"
        );
        assert_eq!(
            Error::ZeroAddress(AddressRole::BurnFrom).to_string(),
            "ERC20: burn from the zero address"
        );
    }

    #[test]
    fn test_balance_messages() {
        let err = Error::InsufficientBalance {
            op: DebitKind::Burn,
            balance: Amount::from(100),
            needed: Amount::from(101),
        };
        assert_eq!(err.to_string(), "ERC20: burn amount exceeds balance");
        assert_eq!(err.kind(), "insufficient_balance");

        let err = Error::AllowanceUnderflow {
            allowance: Amount::zero(),
            subtracted: Amount::one(),
        };
        assert!(err.to_string().contains("decreased allowance below zero"));
    }
}
