//! Configuration for the token ledger

use crate::{
    types::{decimal_amount, AccountId, Amount, InitParams, DEFAULT_DECIMALS},
    Error, Result,
};
use serde::{Deserialize, Serialize};

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Token initialization parameters
    pub token: TokenConfig,

    /// Actor configuration
    pub actor: ActorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "token-ledger".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            token: TokenConfig::default(),
            actor: ActorConfig::default(),
        }
    }
}

/// Token initialization parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Token name
    pub name: String,

    /// Token symbol
    pub symbol: String,

    /// Display decimals
    pub decimals: u8,

    /// Account credited with the initial supply (hex address)
    pub initial_holder: Option<AccountId>,

    /// Initial supply in base units (decimal string or integer)
    #[serde(with = "decimal_amount")]
    pub initial_supply: Amount,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: "Token".to_string(),
            symbol: "TKN".to_string(),
            decimals: DEFAULT_DECIMALS,
            initial_holder: None,
            initial_supply: Amount::zero(),
        }
    }
}

/// Actor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Bounded mailbox capacity (messages)
    pub mailbox_capacity: usize,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1000, // Bounded channel for backpressure
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply `TOKEN_LEDGER_*` overrides from `lookup` to the defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(name) = lookup("TOKEN_LEDGER_NAME") {
            config.token.name = name;
        }

        if let Some(symbol) = lookup("TOKEN_LEDGER_SYMBOL") {
            config.token.symbol = symbol;
        }

        if let Some(decimals) = lookup("TOKEN_LEDGER_DECIMALS") {
            config.token.decimals = decimals
                .parse()
                .map_err(|e| Error::Config(format!("Invalid TOKEN_LEDGER_DECIMALS: {}", e)))?;
        }

        if let Some(holder) = lookup("TOKEN_LEDGER_INITIAL_HOLDER") {
            config.token.initial_holder = Some(holder.parse()?);
        }

        if let Some(supply) = lookup("TOKEN_LEDGER_INITIAL_SUPPLY") {
            config.token.initial_supply = Amount::from_dec_str(supply.trim()).map_err(|e| {
                Error::Config(format!("Invalid TOKEN_LEDGER_INITIAL_SUPPLY: {:?}", e))
            })?;
        }

        if let Some(capacity) = lookup("TOKEN_LEDGER_MAILBOX_CAPACITY") {
            config.actor.mailbox_capacity = capacity.parse().map_err(|e| {
                Error::Config(format!("Invalid TOKEN_LEDGER_MAILBOX_CAPACITY: {}", e))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the ledger cannot start from
    pub fn validate(&self) -> Result<()> {
        if self.token.name.is_empty() || self.token.symbol.is_empty() {
            return Err(Error::Config("token name and symbol must be set".to_string()));
        }
        if self.token.initial_holder.is_none() && !self.token.initial_supply.is_zero() {
            return Err(Error::Config(
                "initial_supply requires initial_holder".to_string(),
            ));
        }
        if self.actor.mailbox_capacity == 0 {
            return Err(Error::Config("mailbox_capacity must be positive".to_string()));
        }
        Ok(())
    }

    /// Initialization parameters for [`crate::TokenLedger::initialize`]
    pub fn init_params(&self) -> InitParams {
        let params = InitParams::new(self.token.name.clone(), self.token.symbol.clone())
            .with_decimals(self.token.decimals);
        match self.token.initial_holder {
            Some(holder) => params.with_initial_mint(holder, self.token.initial_supply),
            None => params,
        }
    }
}
