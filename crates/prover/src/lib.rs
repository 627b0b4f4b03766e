//! Groth16 backend for the shielded pool.
//!
//! This crate provides utilities for:
//! - Trusted setup for the spend circuit (generating, saving, loading keys)
//! - Building proven withdraw and swap requests from a note and its path
//! - `Groth16Verifier`, the pool's `Prover` over BN254

pub mod prove;
pub mod setup;
pub mod verify;

#[cfg(test)]
mod tests;

pub use prove::{prove_spend, prove_swap, prove_withdraw, ProofWithInputs, ProveError, WithdrawTarget};
pub use setup::{setup_spend_circuit, SetupError, SpendKeys};
pub use verify::{verify_spend, Groth16Verifier, VerifyError};

use ark_bn254::Fr;

/// Common field type for all operations
pub type ConstraintF = Fr;
