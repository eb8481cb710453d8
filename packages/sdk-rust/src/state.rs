//! Token-account deserialization.
//!
//! The only place that knows where fields sit inside raw token-account
//! bytes.  Each supported format is a [`TokenAccountLayout`] variant; a new
//! ledger format is a new variant plus a match arm below.

use std::str::FromStr;

use solana_sdk::pubkey::Pubkey;

use crate::error::{Error, Result};

// ─── Layouts ──────────────────────────────────────────────────────────────────

/// Known token-account byte layouts.
///
/// ```text
/// V1        owner(32)  mint(32)   …   mint read from bytes 32..64
/// SplToken  mint(32)   owner(32)  amount(8)  …
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenAccountLayout {
    /// The layout the exchanger has always checked against.
    #[default]
    V1,
    /// `spl_token::state::Account` as packed by the SPL Token program (165 bytes).
    SplToken,
}

impl TokenAccountLayout {
    /// Byte offset of the 32-byte mint field.
    pub const fn mint_offset(self) -> usize {
        match self {
            TokenAccountLayout::V1       => 32,
            TokenAccountLayout::SplToken => 0,
        }
    }

    /// Byte offset of the 32-byte owner field.
    pub const fn owner_offset(self) -> usize {
        match self {
            TokenAccountLayout::V1       => 0,
            TokenAccountLayout::SplToken => 32,
        }
    }

    /// Shortest blob that holds every field this layout reads.
    pub const fn min_len(self) -> usize {
        64
    }
}

impl FromStr for TokenAccountLayout {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "v1"                     => Ok(TokenAccountLayout::V1),
            "spl" | "spl-token"      => Ok(TokenAccountLayout::SplToken),
            other => Err(Error::InvalidConfig(format!(
                "unknown account layout '{other}' (expected v1 or spl-token)"
            ))),
        }
    }
}

// ─── Token account ────────────────────────────────────────────────────────────

/// The fields of a token account the pipeline cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAccountView {
    pub mint:  Pubkey,
    pub owner: Pubkey,
}

/// Parse raw token-account bytes according to `layout`.
///
/// Short blobs are an error, never a panic.
pub fn parse_token_account(data: &[u8], layout: TokenAccountLayout) -> Result<TokenAccountView> {
    if data.len() < layout.min_len() {
        return Err(Error::ParseError {
            offset: 0,
            reason: format!(
                "Token account is {} bytes; need at least {}",
                data.len(),
                layout.min_len()
            ),
        });
    }
    Ok(TokenAccountView {
        mint:  read_pubkey(data, layout.mint_offset())?,
        owner: read_pubkey(data, layout.owner_offset())?,
    })
}

// ─── Byte-slice primitives ────────────────────────────────────────────────────

pub(crate) fn read_pubkey(data: &[u8], offset: usize) -> Result<Pubkey> {
    let b: [u8; 32] = data
        .get(offset..offset + 32)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| Error::ParseError {
            offset,
            reason: "slice too short for Pubkey (32 bytes)".into(),
        })?;
    Ok(Pubkey::from(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(first: &Pubkey, second: &Pubkey) -> Vec<u8> {
        let mut data = first.to_bytes().to_vec();
        data.extend_from_slice(&second.to_bytes());
        data.extend_from_slice(&[0u8; 101]);
        data
    }

    #[test]
    fn v1_reads_mint_from_second_field() {
        let (owner, mint) = (Pubkey::new_unique(), Pubkey::new_unique());
        let view = parse_token_account(&blob(&owner, &mint), TokenAccountLayout::V1).unwrap();
        assert_eq!(view.mint, mint);
        assert_eq!(view.owner, owner);
    }

    #[test]
    fn spl_layout_reads_mint_from_first_field() {
        let (mint, owner) = (Pubkey::new_unique(), Pubkey::new_unique());
        let view = parse_token_account(&blob(&mint, &owner), TokenAccountLayout::SplToken).unwrap();
        assert_eq!(view.mint, mint);
        assert_eq!(view.owner, owner);
    }

    #[test]
    fn short_blob_is_an_error() {
        for len in [0, 31, 32, 63] {
            let err = parse_token_account(&vec![1u8; len], TokenAccountLayout::V1).unwrap_err();
            assert!(matches!(err, Error::ParseError { offset: 0, .. }), "len {len}");
        }
    }

    #[test]
    fn exactly_64_bytes_is_enough() {
        assert!(parse_token_account(&[7u8; 64], TokenAccountLayout::V1).is_ok());
    }

    #[test]
    fn layout_names() {
        assert_eq!("V1".parse::<TokenAccountLayout>().unwrap(), TokenAccountLayout::V1);
        assert_eq!("spl-token".parse::<TokenAccountLayout>().unwrap(), TokenAccountLayout::SplToken);
        assert!("v2".parse::<TokenAccountLayout>().is_err());
    }
}
