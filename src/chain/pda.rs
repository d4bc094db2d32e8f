//! Program derived addresses.
//!
//! A PDA is the SHA-256 of the seeds, a bump byte, the owning program and a
//! fixed marker, accepted only when the digest is *not* a valid Ed25519 point.
//! Bumps are tried from 255 downwards and the first off-curve digest wins.

use curve25519_dalek::edwards::CompressedEdwardsY;
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::{Pubkey, TOKEN_METADATA_PROGRAM_ID};

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";
const MAX_SEED_LEN: usize = 32;
const MAX_SEEDS: usize = 16;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PdaError {
    #[error("seed {index} is {len} bytes, max is 32")]
    SeedTooLong { index: usize, len: usize },

    #[error("too many seeds ({count}), max is 16")]
    TooManySeeds { count: usize },

    #[error("no viable bump seed found")]
    NoViableBump,
}

fn is_on_curve(bytes: &[u8; 32]) -> bool {
    CompressedEdwardsY(*bytes).decompress().is_some()
}

pub fn create_program_address(
    seeds: &[&[u8]],
    bump: u8,
    program_id: &Pubkey,
) -> Option<Pubkey> {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update([bump]);
    hasher.update(program_id.as_bytes());
    hasher.update(PDA_MARKER);
    let digest: [u8; 32] = hasher.finalize().into();
    if is_on_curve(&digest) {
        None
    } else {
        Some(Pubkey::new_from_array(digest))
    }
}

pub fn find_program_address(
    seeds: &[&[u8]],
    program_id: &Pubkey,
) -> Result<(Pubkey, u8), PdaError> {
    // the bump occupies one seed slot
    if seeds.len() >= MAX_SEEDS {
        return Err(PdaError::TooManySeeds { count: seeds.len() });
    }
    for (index, seed) in seeds.iter().enumerate() {
        if seed.len() > MAX_SEED_LEN {
            return Err(PdaError::SeedTooLong {
                index,
                len: seed.len(),
            });
        }
    }
    (0..=u8::MAX)
        .rev()
        .find_map(|bump| create_program_address(seeds, bump, program_id).map(|key| (key, bump)))
        .ok_or(PdaError::NoViableBump)
}

/// Address of the Metaplex metadata account for `mint`.
pub fn metadata_address(mint: &Pubkey) -> Result<Pubkey, PdaError> {
    let program = TOKEN_METADATA_PROGRAM_ID;
    find_program_address(
        &[b"metadata", program.as_bytes(), mint.as_bytes()],
        &program,
    )
    .map(|(key, _)| key)
}
