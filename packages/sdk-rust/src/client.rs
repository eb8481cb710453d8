//! [`ExchangeClient`] — the main entry point for integrations.

use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Keypair};

use crate::{
    config::ExchangeConfig,
    error::{Result, SwapFailure},
    readers::{latest_blockhash, read_balance},
    rpc::{LedgerRpc, SolanaRpc},
    session::{associated_accounts, run_session, session_intent},
    swap::SwapOrchestrator,
    types::{AccountCheck, SessionReport, SwapIntent, SwapReceipt},
    validator::validate_account,
};

// ─── Client ───────────────────────────────────────────────────────────────────

/// Async exchanger client.
///
/// ```rust,no_run
/// # use exchanger_sdk::ExchangeClient;
/// # use solana_sdk::signature::Keypair;
/// # #[tokio::main]
/// # async fn main() {
/// let client = ExchangeClient::devnet();
/// let owner  = Keypair::new(); // use a funded keypair
/// let report = client.run_session(&owner).await;
/// println!("balance before: {:?}", report.balance_before);
/// # }
/// ```
pub struct ExchangeClient<R: LedgerRpc = SolanaRpc> {
    config: ExchangeConfig,
    rpc:    R,
}

impl ExchangeClient<SolanaRpc> {
    /// Create a client talking to `config.rpc_url`.
    pub fn new(config: ExchangeConfig) -> Self {
        let rpc = SolanaRpc::new(config.rpc_url.clone(), config.timeout);
        Self { config, rpc }
    }

    /// Pre-configured client for the devnet pool.
    pub fn devnet() -> Self {
        Self::new(ExchangeConfig::devnet())
    }
}

impl<R: LedgerRpc> ExchangeClient<R> {
    /// Use any [`LedgerRpc`] implementation (a local validator, a test double).
    pub fn with_rpc(config: ExchangeConfig, rpc: R) -> Self {
        Self { config, rpc }
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    // ── Read operations ───────────────────────────────────────────────────────

    /// `(source, destination)` associated token accounts of `owner`.
    pub fn associated_accounts(&self, owner: &Pubkey) -> (Pubkey, Pubkey) {
        associated_accounts(&self.config, owner)
    }

    /// The intent [`ExchangeClient::run_session`] would submit for `owner`.
    pub fn intent_for(&self, owner: &Pubkey) -> SwapIntent {
        session_intent(&self.config, owner)
    }

    pub async fn check_account(
        &self,
        account:       &Pubkey,
        expected_mint: Option<&Pubkey>,
    ) -> Result<AccountCheck> {
        validate_account(&self.rpc, account, expected_mint, self.config.account_layout).await
    }

    /// Native balance in SOL; `None` if the RPC call failed.
    pub async fn balance(&self, account: &Pubkey) -> Option<f64> {
        read_balance(&self.rpc, account).await
    }

    pub async fn blockhash(&self) -> Option<Hash> {
        latest_blockhash(&self.rpc).await
    }

    // ── Write operations ──────────────────────────────────────────────────────

    /// Submit one swap.  Not retried on failure: the first attempt may have
    /// landed even when an error came back.
    pub async fn swap(
        &self,
        owner:  &Keypair,
        intent: &SwapIntent,
    ) -> std::result::Result<SwapReceipt, SwapFailure> {
        SwapOrchestrator::new(&self.rpc, &self.config)
            .execute(owner, intent)
            .await
    }

    /// Full session: validate, read balance, swap, read balance.
    pub async fn run_session(&self, owner: &Keypair) -> SessionReport {
        run_session(&self.rpc, &self.config, owner).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::MockLedgerRpc;
    use solana_sdk::signature::Signer;

    #[test]
    fn devnet_client_uses_config_url() {
        let client = ExchangeClient::devnet();
        assert_eq!(client.rpc().url(), client.config().rpc_url);
    }

    #[test]
    fn intent_matches_associated_accounts() {
        let client = ExchangeClient::with_rpc(ExchangeConfig::devnet(), MockLedgerRpc::new());
        let owner = Keypair::new().pubkey();
        let (source, destination) = client.associated_accounts(&owner);
        let intent = client.intent_for(&owner);
        assert_eq!((intent.source, intent.destination), (source, destination));
    }

    #[tokio::test]
    async fn balance_goes_through_injected_rpc() {
        let mut rpc = MockLedgerRpc::new();
        rpc.expect_get_balance().times(1).returning(|_| Ok(1_500_000_000));
        let client = ExchangeClient::with_rpc(ExchangeConfig::devnet(), rpc);
        assert_eq!(client.balance(&Pubkey::new_unique()).await, Some(1.5));
    }
}
