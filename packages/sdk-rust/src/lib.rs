//! Exchanger SDK
//!
//! Swaps an SPL token through a liquidity pool on Solana: checks the
//! owner's token accounts, builds a `transfer_checked` + pool instruction
//! pair, stamps it with a fresh blockhash, signs and submits it once.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use exchanger_sdk::{ExchangeClient, ExchangeConfig, SwapOutcome};
//! use solana_sdk::signature::Keypair;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = ExchangeClient::new(ExchangeConfig::devnet());
//!     let owner  = Keypair::new(); // use your funded keypair
//!
//!     let report = client.run_session(&owner).await;
//!     for finding in report.findings() {
//!         println!("check failed: {finding}");
//!     }
//!     match report.outcome {
//!         SwapOutcome::Submitted(receipt) => println!("tx: {}", receipt.signature),
//!         SwapOutcome::Blocked(_)         => println!("swap skipped"),
//!         SwapOutcome::Failed(failure)    => println!("{failure}"),
//!     }
//! }
//! ```
//!
//! # Feature Overview
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`ExchangeClient::check_account`] | Existence + mint check for a token account |
//! | [`ExchangeClient::balance`] | Native balance in SOL |
//! | [`ExchangeClient::blockhash`] | Latest blockhash |
//! | [`ExchangeClient::swap`] | Compose, stamp, sign and submit one swap |
//! | [`ExchangeClient::run_session`] | Validate → balance → swap → balance |

pub mod client;
pub mod config;
pub mod error;
pub mod instructions;
pub mod readers;
pub mod rpc;
pub mod session;
pub mod state;
pub mod swap;
pub mod types;
pub mod validator;

pub use client::ExchangeClient;
pub use config::{ExchangeConfig, ExchangeConfigFile, PoolAccounts};
pub use error::{Error, Result, SwapFailure};
pub use rpc::{LedgerRpc, SolanaRpc};
pub use state::TokenAccountLayout;
pub use types::*;
