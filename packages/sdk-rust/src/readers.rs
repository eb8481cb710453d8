//! Best-effort ledger reads.
//!
//! Both readers swallow RPC errors into `None` after logging them; the
//! caller decides whether a missing value matters.

use solana_sdk::{hash::Hash, native_token::LAMPORTS_PER_SOL, pubkey::Pubkey};
use tracing::warn;

use crate::rpc::LedgerRpc;

/// Lamports → SOL.
pub fn lamports_to_display(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// Native balance of `account` in SOL, or `None` if the read failed.
pub async fn read_balance<R: LedgerRpc + ?Sized>(rpc: &R, account: &Pubkey) -> Option<f64> {
    match rpc.get_balance(account).await {
        Ok(lamports) => Some(lamports_to_display(lamports)),
        Err(e) => {
            warn!(%account, error = %e, "balance read failed");
            None
        }
    }
}

/// Most recent blockhash, or `None` if the ledger could not be reached.
pub async fn latest_blockhash<R: LedgerRpc + ?Sized>(rpc: &R) -> Option<Hash> {
    match rpc.get_latest_blockhash().await {
        Ok(hash) => Some(hash),
        Err(e) => {
            warn!(error = %e, "blockhash fetch failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::rpc::MockLedgerRpc;

    #[test]
    fn one_sol() {
        assert_eq!(lamports_to_display(1_000_000_000), 1.0);
        assert_eq!(lamports_to_display(0), 0.0);
        assert_eq!(lamports_to_display(2_500_000_000), 2.5);
    }

    #[tokio::test]
    async fn balance_is_converted() {
        let mut rpc = MockLedgerRpc::new();
        rpc.expect_get_balance().returning(|_| Ok(2_000_000_000));
        assert_eq!(read_balance(&rpc, &Pubkey::new_unique()).await, Some(2.0));
    }

    #[tokio::test]
    async fn balance_error_is_none() {
        let mut rpc = MockLedgerRpc::new();
        rpc.expect_get_balance()
            .returning(|_| Err(Error::rpc("get_balance", "timed out")));
        assert_eq!(read_balance(&rpc, &Pubkey::new_unique()).await, None);
    }

    #[tokio::test]
    async fn blockhash_passthrough_and_failure() {
        let hash = Hash::new_unique();
        let mut ok = MockLedgerRpc::new();
        ok.expect_get_latest_blockhash().returning(move || Ok(hash));
        assert_eq!(latest_blockhash(&ok).await, Some(hash));

        let mut failing = MockLedgerRpc::new();
        failing
            .expect_get_latest_blockhash()
            .returning(|| Err(Error::rpc("get_latest_blockhash", "connection reset")));
        assert_eq!(latest_blockhash(&failing).await, None);
    }
}
