//! Swap orchestration: Compose → Stamp → Sign & Submit.
//!
//! A swap is one transaction with two instructions: a `transfer_checked`
//! moving the input tokens into the pool's vault, then the pool's own swap
//! instruction.  Nothing is sent unless a fresh blockhash was obtained, and
//! at most one `send_transaction` is issued per call.

use solana_sdk::{
    instruction::Instruction,
    message::Message,
    signature::{Keypair, Signer},
    transaction::Transaction,
};
use tracing::{debug, info, instrument, warn};

use crate::{
    config::ExchangeConfig,
    error::{Error, SwapFailure},
    instructions::{pool_swap_ix, transfer_checked_ix},
    readers::latest_blockhash,
    rpc::LedgerRpc,
    types::{SwapIntent, SwapReceipt, SwapStage},
};

/// Drives a single swap attempt against one RPC endpoint.
pub struct SwapOrchestrator<'a, R: LedgerRpc + ?Sized> {
    rpc:    &'a R,
    config: &'a ExchangeConfig,
}

impl<'a, R: LedgerRpc + ?Sized> SwapOrchestrator<'a, R> {
    pub fn new(rpc: &'a R, config: &'a ExchangeConfig) -> Self {
        Self { rpc, config }
    }

    /// Build both instructions for `intent`.  Pure; cannot fail.
    ///
    /// Input tokens go to the pool's source vault, checked against the
    /// configured source mint.
    pub fn compose(&self, intent: &SwapIntent) -> Vec<Instruction> {
        vec![
            transfer_checked_ix(
                &intent.source,
                &self.config.pool.source_vault,
                &self.config.source_mint,
                &intent.owner,
                intent.amount,
                intent.decimals,
            ),
            pool_swap_ix(&self.config.pool, &intent.owner, &intent.source, &intent.destination),
        ]
    }

    /// Run every stage and submit.  Failures are returned with the stage
    /// they happened in; a failed submission is never retried.
    #[instrument(
        level = "debug",
        skip_all,
        fields(owner = %intent.owner, amount = intent.amount, decimals = intent.decimals)
    )]
    pub async fn execute(
        &self,
        owner:  &Keypair,
        intent: &SwapIntent,
    ) -> std::result::Result<SwapReceipt, SwapFailure> {
        debug!(stage = %SwapStage::Compose, "building instructions");
        let instructions = self.compose(intent);

        debug!(stage = %SwapStage::Stamp, "fetching blockhash");
        let Some(blockhash) = latest_blockhash(self.rpc).await else {
            warn!("no blockhash — aborting before submission");
            return Err(SwapFailure { stage: SwapStage::Stamp, error: Error::BlockhashUnavailable });
        };
        let message = Message::new_with_blockhash(&instructions, Some(&intent.owner), &blockhash);

        debug!(stage = %SwapStage::SignAndSubmit, %blockhash, "signing");
        let mut tx = Transaction::new_unsigned(message);
        tx.try_sign(&[owner], blockhash).map_err(|e| SwapFailure {
            stage: SwapStage::SignAndSubmit,
            error: Error::Signing(e.to_string()),
        })?;

        match self.rpc.send_transaction(&tx, self.config.skip_preflight).await {
            Ok(signature) => {
                info!(%signature, "swap submitted");
                Ok(SwapReceipt { signature: signature.to_string() })
            }
            Err(error) => {
                warn!(%error, "swap submission failed");
                Err(SwapFailure { stage: SwapStage::SignAndSubmit, error })
            }
        }
    }
}

/// Convenience wrapper around [`SwapOrchestrator::execute`].
pub async fn submit_swap<R: LedgerRpc + ?Sized>(
    rpc:    &R,
    config: &ExchangeConfig,
    owner:  &Keypair,
    intent: &SwapIntent,
) -> std::result::Result<SwapReceipt, SwapFailure> {
    SwapOrchestrator::new(rpc, config).execute(owner, intent).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::{TransferCheckedData, TRANSFER_CHECKED_DISCRIMINANT};
    use crate::rpc::MockLedgerRpc;
    use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature};

    fn intent_for(owner: &Keypair) -> SwapIntent {
        SwapIntent {
            owner:       owner.pubkey(),
            source:      Pubkey::new_unique(),
            destination: Pubkey::new_unique(),
            amount:      5,
            decimals:    6,
        }
    }

    #[test]
    fn compose_builds_transfer_then_pool_call() {
        let config = ExchangeConfig::devnet();
        let rpc = MockLedgerRpc::new();
        let owner = Keypair::new();
        let intent = intent_for(&owner);

        let ixs = SwapOrchestrator::new(&rpc, &config).compose(&intent);

        assert_eq!(ixs.len(), 2);
        assert_eq!(ixs[0].accounts[0].pubkey, intent.source);
        assert_eq!(ixs[0].accounts[1].pubkey, config.source_mint);
        assert_eq!(ixs[0].accounts[2].pubkey, config.pool.source_vault);
        assert_eq!(
            TransferCheckedData::unpack(&ixs[0].data).unwrap(),
            TransferCheckedData { amount: 5, decimals: 6 }
        );
        assert_eq!(ixs[1].program_id, config.pool.program_id);
        assert_eq!(ixs[1].accounts[4].pubkey, intent.destination);
    }

    #[tokio::test]
    async fn no_blockhash_means_no_submission() {
        let config = ExchangeConfig::devnet();
        let mut rpc = MockLedgerRpc::new();
        rpc.expect_get_latest_blockhash()
            .times(1)
            .returning(|| Err(Error::rpc("get_latest_blockhash", "timed out")));
        rpc.expect_send_transaction().times(0);

        let owner = Keypair::new();
        let failure = submit_swap(&rpc, &config, &owner, &intent_for(&owner))
            .await
            .unwrap_err();

        assert_eq!(failure.stage, SwapStage::Stamp);
        assert!(matches!(failure.error, Error::BlockhashUnavailable));
    }

    #[tokio::test]
    async fn submits_one_signed_two_instruction_transaction() {
        let config = ExchangeConfig::devnet();
        let owner = Keypair::new();
        let owner_key = owner.pubkey();
        let blockhash = Hash::new_unique();
        let signature = Signature::new_unique();

        let mut rpc = MockLedgerRpc::new();
        rpc.expect_get_latest_blockhash().times(1).returning(move || Ok(blockhash));
        rpc.expect_send_transaction()
            .times(1)
            .withf(move |tx, skip_preflight| {
                *skip_preflight
                    && tx.message.recent_blockhash == blockhash
                    && tx.message.account_keys[0] == owner_key
                    && tx.message.instructions.len() == 2
                    && tx.message.instructions[0].data[0] == TRANSFER_CHECKED_DISCRIMINANT
                    && tx.verify().is_ok()
            })
            .returning(move |_, _| Ok(signature));

        let receipt = submit_swap(&rpc, &config, &owner, &intent_for(&owner))
            .await
            .unwrap();

        assert_eq!(receipt.signature, signature.to_string());
        assert!(!receipt.signature.is_empty());
    }

    #[tokio::test]
    async fn rejection_is_reported_not_retried() {
        let config = ExchangeConfig::devnet();
        let mut rpc = MockLedgerRpc::new();
        rpc.expect_get_latest_blockhash().returning(|| Ok(Hash::new_unique()));
        rpc.expect_send_transaction()
            .times(1)
            .returning(|_, _| Err(Error::SubmissionRejected("insufficient funds".into())));

        let owner = Keypair::new();
        let failure = submit_swap(&rpc, &config, &owner, &intent_for(&owner))
            .await
            .unwrap_err();

        assert_eq!(failure.stage, SwapStage::SignAndSubmit);
        assert!(matches!(failure.error, Error::SubmissionRejected(_)));
    }

    #[tokio::test]
    async fn foreign_owner_cannot_sign() {
        let config = ExchangeConfig::devnet();
        let mut rpc = MockLedgerRpc::new();
        rpc.expect_get_latest_blockhash().returning(|| Ok(Hash::new_unique()));
        rpc.expect_send_transaction().times(0);

        let owner = Keypair::new();
        let stranger = Keypair::new();
        let failure = submit_swap(&rpc, &config, &stranger, &intent_for(&owner))
            .await
            .unwrap_err();

        assert_eq!(failure.stage, SwapStage::SignAndSubmit);
        assert!(matches!(failure.error, Error::Signing(_)));
    }
}
