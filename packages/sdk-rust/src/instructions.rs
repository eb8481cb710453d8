//! Low-level instruction builders.
//!
//! Each function constructs a [`solana_sdk::instruction::Instruction`] ready
//! to be compiled into a transaction.  Account order is a contract with the
//! program being called and is not checked here.

use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};

use crate::config::PoolAccounts;
use crate::error::{Error, Result};

// ─── Well-known program IDs ───────────────────────────────────────────────────

pub const SPL_TOKEN_PROGRAM_ID: Pubkey = solana_sdk::pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");

pub const ATA_PROGRAM_ID: Pubkey = solana_sdk::pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

// ─── Associated token accounts ────────────────────────────────────────────────

/// Derive the Associated Token Account for a wallet + mint.
pub fn derive_ata(wallet: &Pubkey, mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[wallet.as_ref(), SPL_TOKEN_PROGRAM_ID.as_ref(), mint.as_ref()],
        &ATA_PROGRAM_ID,
    )
    .0
}

// ─── transfer_checked ─────────────────────────────────────────────────────────

/// SPL Token instruction tag for `TransferChecked`.
pub const TRANSFER_CHECKED_DISCRIMINANT: u8 = 12;

/// `tag(1) amount(8, LE) decimals(1)`
pub const TRANSFER_CHECKED_DATA_LEN: usize = 10;

/// Build an SPL Token `TransferChecked` instruction.
///
/// The token program verifies `mint` and `decimals` against the source
/// account before moving funds.  `amount` is in atomic units; keeping it
/// consistent with `decimals` is the caller's job.
pub fn transfer_checked_ix(
    source:      &Pubkey,
    destination: &Pubkey,
    mint:        &Pubkey,
    owner:       &Pubkey,
    amount:      u64,
    decimals:    u8,
) -> Instruction {
    let mut data = Vec::with_capacity(TRANSFER_CHECKED_DATA_LEN);
    data.push(TRANSFER_CHECKED_DISCRIMINANT);
    data.extend_from_slice(&amount.to_le_bytes());
    data.push(decimals);

    Instruction {
        program_id: SPL_TOKEN_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(*source,               false),  // mut
            AccountMeta::new_readonly(*mint,         false),
            AccountMeta::new(*destination,          false),  // mut
            AccountMeta::new_readonly(*owner,        true),   // signer
        ],
        data,
    }
}

/// Decoded `TransferChecked` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferCheckedData {
    pub amount:   u64,
    pub decimals: u8,
}

impl TransferCheckedData {
    /// Decode instruction data produced by [`transfer_checked_ix`].
    pub fn unpack(data: &[u8]) -> Result<Self> {
        if data.len() != TRANSFER_CHECKED_DATA_LEN {
            return Err(Error::ParseError {
                offset: 0,
                reason: format!(
                    "transfer_checked data is {} bytes; expected {}",
                    data.len(),
                    TRANSFER_CHECKED_DATA_LEN
                ),
            });
        }
        if data[0] != TRANSFER_CHECKED_DISCRIMINANT {
            return Err(Error::ParseError {
                offset: 0,
                reason: format!("instruction tag {} is not transfer_checked", data[0]),
            });
        }
        let amount: [u8; 8] = data[1..9]
            .try_into()
            .map_err(|_| Error::ParseError { offset: 1, reason: "slice too short for u64".into() })?;
        Ok(Self { amount: u64::from_le_bytes(amount), decimals: data[9] })
    }
}

// ─── pool swap ────────────────────────────────────────────────────────────────

/// Build the pool invocation that exchanges the deposited tokens.
///
/// The pool program defines `data`; it is passed through untouched.
pub fn pool_swap_ix(
    pool:        &PoolAccounts,
    owner:       &Pubkey,
    source:      &Pubkey,
    destination: &Pubkey,
) -> Instruction {
    Instruction {
        program_id: pool.program_id,
        accounts: vec![
            AccountMeta::new(*owner,                    true),   // mut + signer
            AccountMeta::new(*source,                   false),  // mut
            AccountMeta::new(pool.source_vault,         false),  // mut
            AccountMeta::new(pool.destination_vault,    false),  // mut
            AccountMeta::new(*destination,              false),  // mut
            AccountMeta::new_readonly(pool.pool,        false),
            AccountMeta::new_readonly(pool.authority,   false),
        ],
        data: pool.instruction_data.clone(),
    }
}
