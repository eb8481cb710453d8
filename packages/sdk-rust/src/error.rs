//! SDK error type.

use solana_sdk::pubkey::Pubkey;

use crate::types::SwapStage;

/// All errors returned by the exchanger SDK.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // ── RPC / network ────────────────────────────────────────────────────────
    /// A JSON-RPC call failed or timed out.
    #[error("RPC call `{call}` failed: {reason}")]
    RpcUnavailable { call: &'static str, reason: String },

    /// No recent blockhash could be fetched, so nothing was submitted.
    #[error("Could not fetch a recent blockhash — transaction not submitted")]
    BlockhashUnavailable,

    // ── Account validation ───────────────────────────────────────────────────
    #[error("Account {0} does not exist")]
    AccountNotFound(Pubkey),

    #[error("Account {account} holds mint {found}, expected {expected}")]
    WrongMint { account: Pubkey, expected: Pubkey, found: Pubkey },

    /// The account data is too short to be a token account.
    #[error("Account {account} has {len} bytes of data — not a token account")]
    MalformedAccount { account: Pubkey, len: usize },

    // ── Submission ───────────────────────────────────────────────────────────
    /// The ledger refused the signed transaction.
    #[error("Transaction rejected: {0}")]
    SubmissionRejected(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    // ── Byte parsing ─────────────────────────────────────────────────────────
    #[error("Parse error at offset {offset}: {reason}")]
    ParseError { offset: usize, reason: String },

    // ── Configuration ────────────────────────────────────────────────────────
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub(crate) fn rpc(call: &'static str, err: impl std::fmt::Display) -> Self {
        Error::RpcUnavailable { call, reason: err.to_string() }
    }
}

/// A swap attempt that stopped before producing a receipt.
#[derive(Debug, thiserror::Error)]
#[error("swap failed during {stage}: {error}")]
pub struct SwapFailure {
    pub stage: SwapStage,
    #[source]
    pub error: Error,
}

/// Convenience alias so every module can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;
