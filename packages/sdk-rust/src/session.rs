//! Exchange session: validate → balance → swap → balance → report.
//!
//! The session never returns an error.  Every step's result, good or bad,
//! ends up in the [`SessionReport`].

use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use tracing::{info, instrument, warn};

use crate::{
    config::ExchangeConfig,
    instructions::derive_ata,
    readers::read_balance,
    rpc::LedgerRpc,
    swap::submit_swap,
    types::{SessionReport, SwapIntent, SwapOutcome, ValidationPolicy},
    validator::validate_account,
};

/// The owner's associated token accounts for the configured mint pair.
pub fn associated_accounts(config: &ExchangeConfig, owner: &Pubkey) -> (Pubkey, Pubkey) {
    (
        derive_ata(owner, &config.source_mint),
        derive_ata(owner, &config.destination_mint),
    )
}

/// The intent a session submits: configured amount and decimals, owner's
/// associated accounts.
pub fn session_intent(config: &ExchangeConfig, owner: &Pubkey) -> SwapIntent {
    let (source, destination) = associated_accounts(config, owner);
    SwapIntent {
        owner: *owner,
        source,
        destination,
        amount: config.swap_amount,
        decimals: config.decimals,
    }
}

/// Run one full exchange session for `owner`.
#[instrument(level = "info", skip_all, fields(owner = %owner.pubkey()))]
pub async fn run_session<R: LedgerRpc + ?Sized>(
    rpc:    &R,
    config: &ExchangeConfig,
    owner:  &Keypair,
) -> SessionReport {
    let owner_key = owner.pubkey();
    let intent = session_intent(config, &owner_key);

    let source_check = validate_account(
        rpc,
        &intent.source,
        Some(&config.source_mint),
        config.account_layout,
    )
    .await;
    let destination_check = validate_account(
        rpc,
        &intent.destination,
        Some(&config.destination_mint),
        config.account_layout,
    )
    .await;

    let mut report = SessionReport {
        owner:               owner_key,
        source_account:      intent.source,
        destination_account: intent.destination,
        source_check,
        destination_check,
        balance_before:      None,
        balance_after:       None,
        outcome:             SwapOutcome::Blocked(Vec::new()),
    };

    let findings = report.findings();
    let blocked = !findings.is_empty() && config.validation_policy == ValidationPolicy::HardBlock;
    if !findings.is_empty() {
        warn!(
            policy = ?config.validation_policy,
            findings = %findings.join("; "),
            "token account validation failed"
        );
    }

    report.balance_before = read_balance(rpc, &owner_key).await;

    report.outcome = if blocked {
        SwapOutcome::Blocked(findings)
    } else {
        match submit_swap(rpc, config, owner, &intent).await {
            Ok(receipt) => SwapOutcome::Submitted(receipt),
            Err(failure) => SwapOutcome::Failed(failure),
        }
    };

    report.balance_after = read_balance(rpc, &owner_key).await;

    info!(
        submitted = report.outcome.receipt().is_some(),
        before = ?report.balance_before,
        after = ?report.balance_after,
        "session finished"
    );
    report
}
