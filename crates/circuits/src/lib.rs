//! Cryptographic core of the shielded pool.
//!
//! This crate provides:
//! - Typed field elements (`Commitment`, `NullifierHash`, `Root`, ...)
//! - Commitment and nullifier-hash construction over Poseidon
//! - `MerkleAccumulator`: the append-only commitment tree and its membership proofs
//! - `SpendCircuit`: the reference relation behind withdrawals and private swaps

pub mod commitment;
pub mod error;
pub mod field;
pub mod merkle;
pub mod poseidon;
pub mod spend;

pub use commitment::{build_commitment, build_commitment_from_bytes, build_nullifier_hash, Note};
pub use error::{AccumulatorError, MalformedInputError};
pub use field::{
    field_to_bytes, field_to_hex, generate_random_element, generate_random_element_from_entropy,
    parse_field_element, parse_field_hex, Address, AssetId, Commitment, Nullifier, NullifierHash,
    Root, Secret, FIELD_BYTES,
};
pub use merkle::{MembershipProof, MerkleAccumulator, DEFAULT_DEPTH, DEFAULT_ROOT_HISTORY, MAX_DEPTH};
pub use poseidon::{poseidon_config, poseidon_hash, poseidon_hash_many, poseidon_hash_two};
pub use spend::{SpendCircuit, SpendStatement, SPEND_PUBLIC_INPUTS};

use ark_bn254::Fr;

/// Common type aliases
pub type ConstraintF = Fr;
