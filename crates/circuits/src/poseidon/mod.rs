//! Poseidon hash function for BN254.
//!
//! Wraps arkworks' Poseidon sponge with the pool's parameter set. The native
//! and R1CS versions must stay in lockstep: the accumulator root computed here
//! is the root a spend proof is checked against.

mod config;
mod gadgets;
mod native;


pub use config::poseidon_config;
pub use gadgets::{poseidon_hash_many_var, poseidon_hash_two_var, poseidon_hash_var};
pub use native::{poseidon_hash, poseidon_hash_many, poseidon_hash_two};
