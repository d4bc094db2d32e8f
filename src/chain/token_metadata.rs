//! Leading fields of a Metaplex Token Metadata account.
//!
//! Only the prefix needed to list an NFT is decoded; everything after
//! `is_mutable` (editions, collection, uses, ...) is ignored.

use borsh::{BorshDeserialize, BorshSerialize};
use thiserror::Error;

use super::Pubkey;

pub const METADATA_V1_KEY: u8 = 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MetadataAccountError {
    #[error("account is not a metadata account (key {key})")]
    WrongKey { key: u8 },

    #[error("failed to decode metadata account: {message}")]
    Decode { message: String },
}

#[derive(Clone, Debug, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct Creator {
    pub address: Pubkey,
    pub verified: bool,
    pub share: u8,
}

#[derive(Clone, Debug, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct Data {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub seller_fee_basis_points: u16,
    pub creators: Option<Vec<Creator>>,
}

#[derive(Clone, Debug, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct MetadataAccount {
    pub key: u8,
    pub update_authority: Pubkey,
    pub mint: Pubkey,
    pub data: Data,
    pub primary_sale_happened: bool,
    pub is_mutable: bool,
}

impl MetadataAccount {
    pub fn decode(bytes: &[u8]) -> Result<Self, MetadataAccountError> {
        let mut buf = bytes;
        let mut account =
            Self::deserialize(&mut buf).map_err(|e| MetadataAccountError::Decode {
                message: e.to_string(),
            })?;
        if account.key != METADATA_V1_KEY {
            return Err(MetadataAccountError::WrongKey { key: account.key });
        }
        account.data.name = trim_padding(&account.data.name);
        account.data.symbol = trim_padding(&account.data.symbol);
        account.data.uri = trim_padding(&account.data.uri);
        Ok(account)
    }
}

// on-chain strings are stored at fixed width and padded with NULs
fn trim_padding(value: &str) -> String {
    value.trim_end_matches('\0').trim().to_string()
}
