pub mod pda;
pub mod rpc;
pub mod token_metadata;

use std::fmt;
use std::str::FromStr;

use borsh::{BorshDeserialize, BorshSerialize};
use thiserror::Error;

pub const PUBKEY_LEN: usize = 32;

pub const TOKEN_PROGRAM_ID: Pubkey = Pubkey::new_from_array([
    6, 221, 246, 225, 215, 101, 161, 147, 217, 203, 225, 70, 206, 235, 121, 172, 28, 180, 133,
    237, 95, 91, 55, 145, 58, 140, 245, 133, 126, 255, 0, 169,
]);

pub const TOKEN_METADATA_PROGRAM_ID: Pubkey = Pubkey::new_from_array([
    11, 112, 101, 177, 227, 209, 124, 69, 56, 157, 82, 127, 107, 4, 195, 205, 88, 184, 108, 115,
    26, 160, 253, 181, 73, 182, 209, 188, 3, 248, 41, 70,
]);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("owner address is empty")]
    Empty,

    #[error("owner address '{value}' is not valid base58: {reason}")]
    NotBase58 { value: String, reason: String },

    #[error("owner address '{value}' decodes to {len} bytes, expected 32")]
    WrongLength { value: String, len: usize },
}

/// A 32-byte Solana account address.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, BorshDeserialize, BorshSerialize,
)]
pub struct Pubkey([u8; PUBKEY_LEN]);

impl Pubkey {
    pub const fn new_from_array(bytes: [u8; PUBKEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Parses a base58 address, rejecting anything that does not decode to
    /// exactly 32 bytes.
    pub fn parse(value: &str) -> Result<Self, IdentityError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(IdentityError::Empty);
        }
        let bytes = bs58::decode(value)
            .into_vec()
            .map_err(|e| IdentityError::NotBase58 {
                value: value.to_string(),
                reason: e.to_string(),
            })?;
        let bytes: [u8; PUBKEY_LEN] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| IdentityError::WrongLength {
                    value: value.to_string(),
                    len: bytes.len(),
                })?;
        Ok(Self(bytes))
    }

    pub const fn to_bytes(self) -> [u8; PUBKEY_LEN] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Pubkey {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({self})")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cluster {
    MainnetBeta,
    Devnet,
    Testnet,
}

impl Cluster {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "mainnet-beta" | "mainnet" => Some(Self::MainnetBeta),
            "devnet" => Some(Self::Devnet),
            "testnet" => Some(Self::Testnet),
            _ => None,
        }
    }

    pub fn rpc_url(self) -> &'static str {
        match self {
            Self::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Self::Devnet => "https://api.devnet.solana.com",
            Self::Testnet => "https://api.testnet.solana.com",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::MainnetBeta => "mainnet-beta",
            Self::Devnet => "devnet",
            Self::Testnet => "testnet",
        }
    }
}
