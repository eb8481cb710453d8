//! Ledger RPC abstraction.
//!
//! The pipeline only needs four remote calls.  [`LedgerRpc`] names them so
//! the orchestrator and session driver can run against the real
//! [`SolanaRpc`] or a test double.

use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use solana_client::{
    client_error::{ClientError, ClientErrorKind},
    nonblocking::rpc_client::RpcClient,
    rpc_config::RpcSendTransactionConfig,
};
use solana_sdk::{
    account::Account,
    commitment_config::CommitmentConfig,
    hash::Hash,
    pubkey::Pubkey,
    signature::Signature,
    transaction::Transaction,
};

use crate::error::{Error, Result};

/// The remote calls the swap pipeline issues.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Native balance of `pubkey` in lamports.
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64>;

    async fn get_latest_blockhash(&self) -> Result<Hash>;

    /// `Ok(None)` when the account does not exist.
    async fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>>;

    /// Submit a signed transaction once.  Never retried here.
    async fn send_transaction(
        &self,
        transaction:    &Transaction,
        skip_preflight: bool,
    ) -> Result<Signature>;
}

/// [`LedgerRpc`] backed by the Solana non-blocking JSON-RPC client.
///
/// Every request is bounded by the timeout given at construction; a timeout
/// surfaces as [`Error::RpcUnavailable`].
pub struct SolanaRpc {
    client: RpcClient,
}

impl SolanaRpc {
    pub fn new(rpc_url: impl Into<String>, timeout: Duration) -> Self {
        Self::new_with_commitment(rpc_url, timeout, CommitmentConfig::confirmed())
    }

    pub fn new_with_commitment(
        rpc_url:    impl Into<String>,
        timeout:    Duration,
        commitment: CommitmentConfig,
    ) -> Self {
        Self {
            client: RpcClient::new_with_timeout_and_commitment(rpc_url.into(), timeout, commitment),
        }
    }

    pub fn url(&self) -> String {
        self.client.url()
    }
}

#[async_trait]
impl LedgerRpc for SolanaRpc {
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64> {
        self.client
            .get_balance(pubkey)
            .await
            .map_err(|e| Error::rpc("get_balance", e))
    }

    async fn get_latest_blockhash(&self) -> Result<Hash> {
        self.client
            .get_latest_blockhash()
            .await
            .map_err(|e| Error::rpc("get_latest_blockhash", e))
    }

    async fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>> {
        self.client
            .get_account_with_commitment(pubkey, self.client.commitment())
            .await
            .map(|response| response.value)
            .map_err(|e| Error::rpc("get_account_info", e))
    }

    async fn send_transaction(
        &self,
        transaction:    &Transaction,
        skip_preflight: bool,
    ) -> Result<Signature> {
        let config = RpcSendTransactionConfig {
            skip_preflight,
            preflight_commitment: Some(self.client.commitment().commitment),
            ..RpcSendTransactionConfig::default()
        };
        self.client
            .send_transaction_with_config(transaction, config)
            .await
            .map_err(classify_send_error)
    }
}

/// Transport failures mean the ledger may never have seen the transaction;
/// anything else is the ledger answering "no".
fn classify_send_error(err: ClientError) -> Error {
    match err.kind() {
        ClientErrorKind::Io(_) | ClientErrorKind::Reqwest(_) => Error::rpc("send_transaction", err),
        _ => Error::SubmissionRejected(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::transaction::TransactionError;

    #[test]
    fn io_errors_are_transport_failures() {
        let err = ClientError::from(std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out"));
        assert!(matches!(
            classify_send_error(err),
            Error::RpcUnavailable { call: "send_transaction", .. }
        ));
    }

    #[test]
    fn transaction_errors_are_rejections() {
        let err = ClientError::from(TransactionError::BlockhashNotFound);
        assert!(matches!(classify_send_error(err), Error::SubmissionRejected(_)));
    }

    #[test]
    fn client_keeps_url() {
        let rpc = SolanaRpc::new("http://127.0.0.1:8899", Duration::from_secs(5));
        assert_eq!(rpc.url(), "http://127.0.0.1:8899");
    }
}
