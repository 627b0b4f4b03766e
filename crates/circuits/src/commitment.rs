//! Commitment and nullifier-hash construction.
//!
//! A commitment is `Poseidon(secret, nullifier, amount, asset)` with the
//! arguments absorbed in exactly that order. The nullifier hash is
//! `Poseidon(nullifier, leaf_index)` and therefore only exists once the
//! ledger has assigned the deposit a position in the accumulator.
//!
//! Trust assumption: `secret` and `nullifier` must come from a CSPRNG
//! ([`Secret::random`], [`Nullifier::random`] or
//! [`crate::field::generate_random_element`]). The builder rejects the zero
//! element, but cannot detect other low-entropy or attacker-chosen values;
//! hiding holds only for values the caller sampled uniformly.

use ark_bn254::Fr;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::MalformedInputError;
use crate::field::{parse_field_element, AssetId, Commitment, Nullifier, NullifierHash, Secret};
use crate::poseidon::{poseidon_hash_many, poseidon_hash_two};

/// Derive the commitment for a deposit.
pub fn build_commitment(
    secret: Secret,
    nullifier: Nullifier,
    amount: u64,
    asset_id: AssetId,
) -> Result<Commitment, MalformedInputError> {
    if secret.is_zero() {
        return Err(MalformedInputError::Zero("secret"));
    }
    if nullifier.is_zero() {
        return Err(MalformedInputError::Zero("nullifier"));
    }

    Ok(Commitment(poseidon_hash_many(&[
        secret.0,
        nullifier.0,
        Fr::from(amount),
        asset_id.0,
    ])))
}

/// Same as [`build_commitment`] for raw 32-byte little-endian inputs.
pub fn build_commitment_from_bytes(
    secret: &[u8],
    nullifier: &[u8],
    amount: u64,
    asset_id: &[u8],
) -> Result<Commitment, MalformedInputError> {
    build_commitment(
        Secret(parse_field_element(secret)?),
        Nullifier(parse_field_element(nullifier)?),
        amount,
        AssetId(parse_field_element(asset_id)?),
    )
}

/// Derive the nullifier hash for the deposit stored at `leaf_index`.
pub fn build_nullifier_hash(nullifier: Nullifier, leaf_index: u64) -> NullifierHash {
    NullifierHash(poseidon_hash_two(nullifier.0, Fr::from(leaf_index)))
}

/// Everything a depositor must keep to spend a deposit later.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub secret: Secret,
    pub nullifier: Nullifier,
    pub amount: u64,
    pub asset_id: AssetId,
}

impl Note {
    /// Create a note with fresh secret and nullifier.
    pub fn random<R: RngCore + CryptoRng>(amount: u64, asset_id: AssetId, rng: &mut R) -> Self {
        Self {
            secret: Secret::random(rng),
            nullifier: Nullifier::random(rng),
            amount,
            asset_id,
        }
    }

    pub fn commitment(&self) -> Result<Commitment, MalformedInputError> {
        build_commitment(self.secret, self.nullifier, self.amount, self.asset_id)
    }

    pub fn nullifier_hash(&self, leaf_index: u64) -> NullifierHash {
        build_nullifier_hash(self.nullifier, leaf_index)
    }
}
