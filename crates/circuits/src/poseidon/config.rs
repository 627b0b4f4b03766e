//! Poseidon parameters for the BN254 scalar field.
//!
//! A single parameter set is shared by commitments, nullifier hashes, Merkle
//! nodes and the in-circuit gadgets, so native and in-circuit hashes agree.

use std::sync::OnceLock;

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::{find_poseidon_ark_and_mds, PoseidonConfig};
use ark_ff::PrimeField;

/// Number of full rounds (beginning + end)
pub const FULL_ROUNDS: usize = 8;

/// Number of partial rounds
pub const PARTIAL_ROUNDS: usize = 57;

/// S-box exponent
pub const ALPHA: u64 = 5;

/// Sponge rate (field elements absorbed per permutation)
pub const RATE: usize = 2;

/// Sponge capacity
pub const CAPACITY: usize = 1;

static CONFIG: OnceLock<PoseidonConfig<Fr>> = OnceLock::new();

/// The pool-wide Poseidon configuration, computed on first use.
pub fn poseidon_config() -> &'static PoseidonConfig<Fr> {
    CONFIG.get_or_init(build_config)
}

/// Round constants and MDS matrix from the Grain LFSR of the Poseidon paper,
/// seeded with the field size, width and round counts.
///
/// Every commitment and root depends on these values.
fn build_config() -> PoseidonConfig<Fr> {
    let (ark, mds) = find_poseidon_ark_and_mds::<Fr>(
        Fr::MODULUS_BIT_SIZE as u64,
        RATE,
        FULL_ROUNDS as u64,
        PARTIAL_ROUNDS as u64,
        0,
    );

    PoseidonConfig::new(FULL_ROUNDS, PARTIAL_ROUNDS, ALPHA, mds, ark, RATE, CAPACITY)
}
