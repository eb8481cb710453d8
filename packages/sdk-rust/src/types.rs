//! Value objects passed between the pipeline stages.

use std::fmt;

use solana_sdk::pubkey::Pubkey;

use crate::error::{Error, Result, SwapFailure};

// ─── Swap ─────────────────────────────────────────────────────────────────────

/// Everything one swap call needs. Lives for the duration of that call only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapIntent {
    /// Wallet that owns `source` and pays the transaction fee.
    pub owner:       Pubkey,
    /// Owner's token account the input tokens leave from.
    pub source:      Pubkey,
    /// Owner's token account that receives the pool's output.
    pub destination: Pubkey,
    /// Atomic units of the source mint.
    pub amount:      u64,
    /// Decimals of the source mint; the token program rejects a mismatch.
    pub decimals:    u8,
}

/// Proof of a submitted swap transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapReceipt {
    /// Base-58 transaction signature, usable with any explorer or
    /// `getSignatureStatuses` poll.
    pub signature: String,
}

/// Orchestrator stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapStage {
    Compose,
    /// Attach blockhash and fee payer.
    Stamp,
    SignAndSubmit,
}

impl fmt::Display for SwapStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SwapStage::Compose       => "compose",
            SwapStage::Stamp         => "stamp",
            SwapStage::SignAndSubmit => "sign-and-submit",
        })
    }
}

// ─── Validation ───────────────────────────────────────────────────────────────

/// Result of checking one token account against the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountCheck {
    Valid,
    NotFound,
    WrongMint { expected: Pubkey, found: Pubkey },
    /// Data blob too short to hold the mint field.
    Malformed { len: usize },
}

impl AccountCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, AccountCheck::Valid)
    }

    /// Turn a failed check into the matching [`Error`] for `account`.
    pub fn into_result(self, account: Pubkey) -> Result<()> {
        match self {
            AccountCheck::Valid => Ok(()),
            AccountCheck::NotFound => Err(Error::AccountNotFound(account)),
            AccountCheck::WrongMint { expected, found } => {
                Err(Error::WrongMint { account, expected, found })
            }
            AccountCheck::Malformed { len } => Err(Error::MalformedAccount { account, len }),
        }
    }
}

/// What to do when either token account fails validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationPolicy {
    /// Skip submission when any account check fails.
    #[default]
    HardBlock,
    /// Log the findings and submit anyway.
    WarnOnly,
}

// ─── Session ──────────────────────────────────────────────────────────────────

/// How the swap step of a session ended.
#[derive(Debug)]
pub enum SwapOutcome {
    Submitted(SwapReceipt),
    /// Validation failed under [`ValidationPolicy::HardBlock`]; nothing was sent.
    Blocked(Vec<String>),
    Failed(SwapFailure),
}

impl SwapOutcome {
    pub fn receipt(&self) -> Option<&SwapReceipt> {
        match self {
            SwapOutcome::Submitted(r) => Some(r),
            _ => None,
        }
    }
}

/// Everything one exchange session observed, in the order it happened.
#[derive(Debug)]
pub struct SessionReport {
    pub owner:               Pubkey,
    pub source_account:      Pubkey,
    pub destination_account: Pubkey,
    /// `Err` when the account could not be queried at all.
    pub source_check:        Result<AccountCheck>,
    pub destination_check:   Result<AccountCheck>,
    /// Owner's native balance in SOL; `None` when the read failed.
    pub balance_before:      Option<f64>,
    pub balance_after:       Option<f64>,
    pub outcome:             SwapOutcome,
}

impl SessionReport {
    pub fn accounts_valid(&self) -> bool {
        check_passed(&self.source_check) && check_passed(&self.destination_check)
    }

    /// Human-readable reasons for every failed account check.
    pub fn findings(&self) -> Vec<String> {
        let mut out = Vec::new();
        for (account, check) in [
            (self.source_account, &self.source_check),
            (self.destination_account, &self.destination_check),
        ] {
            match check {
                Ok(c) => {
                    if let Err(e) = c.into_result(account) {
                        out.push(e.to_string());
                    }
                }
                Err(e) => out.push(e.to_string()),
            }
        }
        out
    }
}

fn check_passed(check: &Result<AccountCheck>) -> bool {
    matches!(check, Ok(AccountCheck::Valid))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_checks_map_to_errors() {
        let account = Pubkey::new_unique();
        let expected = Pubkey::new_unique();
        let found = Pubkey::new_unique();

        assert!(AccountCheck::Valid.into_result(account).is_ok());
        assert!(matches!(
            AccountCheck::NotFound.into_result(account),
            Err(Error::AccountNotFound(a)) if a == account
        ));
        assert!(matches!(
            AccountCheck::WrongMint { expected, found }.into_result(account),
            Err(Error::WrongMint { expected: e, found: f, .. }) if e == expected && f == found
        ));
        assert!(matches!(
            AccountCheck::Malformed { len: 3 }.into_result(account),
            Err(Error::MalformedAccount { len: 3, .. })
        ));
    }

    #[test]
    fn findings_include_rpc_failures() {
        let report = SessionReport {
            owner:               Pubkey::new_unique(),
            source_account:      Pubkey::new_unique(),
            destination_account: Pubkey::new_unique(),
            source_check:        Ok(AccountCheck::Valid),
            destination_check:   Err(Error::rpc("get_account", "connection refused")),
            balance_before:      None,
            balance_after:       None,
            outcome:             SwapOutcome::Blocked(vec![]),
        };
        assert!(!report.accounts_valid());
        let findings = report.findings();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].contains("connection refused"));
    }
}
