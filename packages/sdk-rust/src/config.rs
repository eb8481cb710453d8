//! Exchanger configuration.
//!
//! [`ExchangeConfig`] is the typed, immutable value every component is
//! handed.  [`ExchangeConfigFile`] is its JSON form: every field optional,
//! keys as base-58 strings, missing fields falling back to a base config.

use std::{path::Path, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::error::{Error, Result};
use crate::state::TokenAccountLayout;
use crate::types::ValidationPolicy;

// ─── Constants ────────────────────────────────────────────────────────────────

pub const DEVNET_RPC:  &str = "https://api.devnet.solana.com";
pub const MAINNET_RPC: &str = "https://api.mainnet-beta.solana.com";

/// Wrapped SOL.
pub const WSOL_MINT: Pubkey = solana_sdk::pubkey!("So11111111111111111111111111111111111111112");

const DEVNET_DESTINATION_MINT:  Pubkey = solana_sdk::pubkey!("BQcdHdAQW1hczDbBi9hiegXAR7A98Q9jx3X3iBBBDiq4");
const DEVNET_POOL_PROGRAM:      Pubkey = solana_sdk::pubkey!("CPMDWBwJDtYax9qW7AyRuVC19Cc4L4Vcy4n2BHAbHkCW");
const DEVNET_POOL_AUTHORITY:    Pubkey = solana_sdk::pubkey!("441dvocuhsZCrW8zkGGmqYrbd9GWn7Y71YpDDkALTkaz");
const DEVNET_POOL_DEST_VAULT:   Pubkey = solana_sdk::pubkey!("6LF1yXthyJE7QjxwKWZv6isRccV76NvRgkwfH3m6YsG4");

pub const DEFAULT_SWAP_AMOUNT: u64 = 5;
pub const DEFAULT_DECIMALS:    u8  = 6;
pub const DEFAULT_TIMEOUT:     Duration = Duration::from_secs(30);

// ─── Typed config ─────────────────────────────────────────────────────────────

/// Accounts of the liquidity pool the swap goes through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolAccounts {
    pub program_id:        Pubkey,
    pub pool:              Pubkey,
    pub authority:         Pubkey,
    /// Pool vault that receives the source mint.
    pub source_vault:      Pubkey,
    /// Pool vault that pays out the destination mint.
    pub destination_vault: Pubkey,
    /// Opaque data for the pool's swap instruction.
    pub instruction_data:  Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeConfig {
    pub rpc_url:           String,
    /// Mint sold into the pool.
    pub source_mint:       Pubkey,
    /// Mint received from the pool.
    pub destination_mint:  Pubkey,
    pub pool:              PoolAccounts,
    /// Atomic units of `source_mint` per swap.
    pub swap_amount:       u64,
    pub decimals:          u8,
    /// Upper bound for each RPC request.
    pub timeout:           Duration,
    pub skip_preflight:    bool,
    pub validation_policy: ValidationPolicy,
    pub account_layout:    TokenAccountLayout,
}

impl ExchangeConfig {
    /// wSOL → devnet test token through the devnet pool.
    pub fn devnet() -> Self {
        Self {
            rpc_url:           DEVNET_RPC.to_string(),
            source_mint:       WSOL_MINT,
            destination_mint:  DEVNET_DESTINATION_MINT,
            pool: PoolAccounts {
                program_id:        DEVNET_POOL_PROGRAM,
                pool:              DEVNET_POOL_PROGRAM,
                authority:         DEVNET_POOL_AUTHORITY,
                source_vault:      WSOL_MINT,
                destination_vault: DEVNET_POOL_DEST_VAULT,
                instruction_data:  Vec::new(),
            },
            swap_amount:       DEFAULT_SWAP_AMOUNT,
            decimals:          DEFAULT_DECIMALS,
            timeout:           DEFAULT_TIMEOUT,
            skip_preflight:    true,
            validation_policy: ValidationPolicy::HardBlock,
            account_layout:    TokenAccountLayout::V1,
        }
    }

    /// Point at a different RPC endpoint.
    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }

    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.validation_policy = policy;
        self
    }

    /// Load a JSON config file on top of [`ExchangeConfig::devnet`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let file: ExchangeConfigFile = serde_json::from_str(raw)
            .map_err(|e| Error::InvalidConfig(format!("malformed config JSON: {e}")))?;
        file.apply(Self::devnet())
    }

    /// Reject values no swap could succeed with.
    pub fn validate(&self) -> Result<()> {
        if self.rpc_url.trim().is_empty() {
            return Err(Error::InvalidConfig("rpc_url is empty".into()));
        }
        if self.timeout.is_zero() {
            return Err(Error::InvalidConfig("timeout must be > 0".into()));
        }
        if self.source_mint == self.destination_mint {
            return Err(Error::InvalidConfig(
                "source_mint and destination_mint must differ".into(),
            ));
        }
        Ok(())
    }
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self::devnet()
    }
}

// ─── File form ────────────────────────────────────────────────────────────────

/// JSON shape of the config file.
///
/// ```json
/// {
///   "rpc_url": "https://api.devnet.solana.com",
///   "source_mint": "So11111111111111111111111111111111111111112",
///   "pool": { "program_id": "…", "authority": "…" },
///   "swap_amount": 5,
///   "validation_policy": "hard-block"
/// }
/// ```
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExchangeConfigFile {
    pub rpc_url:           Option<String>,
    pub source_mint:       Option<String>,
    pub destination_mint:  Option<String>,
    #[serde(default)]
    pub pool:              PoolAccountsFile,
    pub swap_amount:       Option<u64>,
    pub decimals:          Option<u8>,
    pub timeout_secs:      Option<u64>,
    pub skip_preflight:    Option<bool>,
    /// `hard-block` or `warn-only`.
    pub validation_policy: Option<String>,
    /// `v1` or `spl-token`.
    pub account_layout:    Option<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolAccountsFile {
    pub program_id:        Option<String>,
    pub pool:              Option<String>,
    pub authority:         Option<String>,
    pub source_vault:      Option<String>,
    pub destination_vault: Option<String>,
    pub instruction_data:  Option<Vec<u8>>,
}

impl ExchangeConfigFile {
    /// Overlay the fields present in the file onto `base`.
    pub fn apply(self, base: ExchangeConfig) -> Result<ExchangeConfig> {
        let pool = PoolAccounts {
            program_id:        key_or("pool.program_id", self.pool.program_id, base.pool.program_id)?,
            pool:              key_or("pool.pool", self.pool.pool, base.pool.pool)?,
            authority:         key_or("pool.authority", self.pool.authority, base.pool.authority)?,
            source_vault:      key_or("pool.source_vault", self.pool.source_vault, base.pool.source_vault)?,
            destination_vault: key_or(
                "pool.destination_vault",
                self.pool.destination_vault,
                base.pool.destination_vault,
            )?,
            instruction_data:  self.pool.instruction_data.unwrap_or(base.pool.instruction_data),
        };

        let config = ExchangeConfig {
            rpc_url:           self.rpc_url.unwrap_or(base.rpc_url),
            source_mint:       key_or("source_mint", self.source_mint, base.source_mint)?,
            destination_mint:  key_or("destination_mint", self.destination_mint, base.destination_mint)?,
            pool,
            swap_amount:       self.swap_amount.unwrap_or(base.swap_amount),
            decimals:          self.decimals.unwrap_or(base.decimals),
            timeout:           self.timeout_secs.map(Duration::from_secs).unwrap_or(base.timeout),
            skip_preflight:    self.skip_preflight.unwrap_or(base.skip_preflight),
            validation_policy: match self.validation_policy {
                Some(p) => p.parse()?,
                None    => base.validation_policy,
            },
            account_layout:    match self.account_layout {
                Some(l) => l.parse()?,
                None    => base.account_layout,
            },
        };
        config.validate()?;
        Ok(config)
    }
}

fn key_or(field: &str, value: Option<String>, fallback: Pubkey) -> Result<Pubkey> {
    match value {
        Some(s) => Pubkey::from_str(s.trim())
            .map_err(|e| Error::InvalidConfig(format!("{field}: '{s}' is not a valid pubkey ({e})"))),
        None => Ok(fallback),
    }
}

impl FromStr for ValidationPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "hard-block" | "hard" => Ok(ValidationPolicy::HardBlock),
            "warn-only"  | "warn" => Ok(ValidationPolicy::WarnOnly),
            other => Err(Error::InvalidConfig(format!(
                "unknown validation policy '{other}' (expected hard-block or warn-only)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn devnet_defaults_are_valid() {
        let config = ExchangeConfig::devnet();
        config.validate().unwrap();
        assert_eq!(config.swap_amount, 5);
        assert_eq!(config.decimals, 6);
        assert!(config.skip_preflight);
        assert_eq!(config.validation_policy, ValidationPolicy::HardBlock);
        assert_eq!(config.source_mint, WSOL_MINT);
    }

    #[test]
    fn empty_file_keeps_base() {
        assert_eq!(ExchangeConfig::from_json_str("{}").unwrap(), ExchangeConfig::devnet());
    }

    #[test]
    fn file_overrides_fields() {
        let mint = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let raw = format!(
            r#"{{
                "rpc_url": "http://localhost:8899",
                "destination_mint": "{mint}",
                "pool": {{ "authority": "{authority}", "instruction_data": [1, 2] }},
                "swap_amount": 1000,
                "timeout_secs": 3,
                "validation_policy": "warn-only",
                "account_layout": "spl-token"
            }}"#
        );
        let config = ExchangeConfig::from_json_str(&raw).unwrap();

        assert_eq!(config.rpc_url, "http://localhost:8899");
        assert_eq!(config.destination_mint, mint);
        assert_eq!(config.pool.authority, authority);
        assert_eq!(config.pool.instruction_data, vec![1, 2]);
        assert_eq!(config.pool.program_id, ExchangeConfig::devnet().pool.program_id);
        assert_eq!(config.swap_amount, 1000);
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.validation_policy, ValidationPolicy::WarnOnly);
        assert_eq!(config.account_layout, TokenAccountLayout::SplToken);
    }

    #[test]
    fn bad_pubkey_is_rejected() {
        let err = ExchangeConfig::from_json_str(r#"{ "source_mint": "not-a-key" }"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(msg) if msg.contains("source_mint")));
    }

    #[test]
    fn unknown_field_is_rejected() {
        assert!(ExchangeConfig::from_json_str(r#"{ "swap_amout": 5 }"#).is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(ExchangeConfig::from_json_str(r#"{ "timeout_secs": 0 }"#).is_err());
    }

    #[test]
    fn identical_mints_are_rejected() {
        let raw = format!(r#"{{ "destination_mint": "{WSOL_MINT}" }}"#);
        assert!(ExchangeConfig::from_json_str(&raw).is_err());
    }

    #[test]
    fn policy_names() {
        assert_eq!("hard_block".parse::<ValidationPolicy>().unwrap(), ValidationPolicy::HardBlock);
        assert_eq!("WARN".parse::<ValidationPolicy>().unwrap(), ValidationPolicy::WarnOnly);
        assert!("maybe".parse::<ValidationPolicy>().is_err());
    }
}
