//! Pre-flight token-account checks.

use solana_sdk::pubkey::Pubkey;
use tracing::{debug, warn};

use crate::error::Result;
use crate::rpc::LedgerRpc;
use crate::state::{parse_token_account, TokenAccountLayout};
use crate::types::AccountCheck;

/// Check that `account` exists and, when `expected_mint` is given, that it
/// holds that mint.
///
/// Findings about the account come back as [`AccountCheck`]; only a failed
/// RPC call is an `Err`.
pub async fn validate_account<R: LedgerRpc + ?Sized>(
    rpc:           &R,
    account:       &Pubkey,
    expected_mint: Option<&Pubkey>,
    layout:        TokenAccountLayout,
) -> Result<AccountCheck> {
    let Some(info) = rpc.get_account(account).await? else {
        warn!(%account, "account does not exist");
        return Ok(AccountCheck::NotFound);
    };

    let check = match expected_mint {
        None => AccountCheck::Valid,
        Some(expected) => match parse_token_account(&info.data, layout) {
            Err(_) => AccountCheck::Malformed { len: info.data.len() },
            Ok(view) if view.mint != *expected => {
                AccountCheck::WrongMint { expected: *expected, found: view.mint }
            }
            Ok(_) => AccountCheck::Valid,
        },
    };

    match check {
        AccountCheck::Valid => debug!(%account, "account ok"),
        other => warn!(%account, finding = ?other, "account check failed"),
    }
    Ok(check)
}
