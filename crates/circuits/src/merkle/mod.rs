//! Append-only Merkle accumulator over deposit commitments.
//!
//! This module provides:
//! - The native accumulator (insert, membership proofs, cold-start rebuild)
//! - Membership proof structures
//! - In-circuit path verification gadgets

mod accumulator;
mod gadgets;
mod proof;


pub use accumulator::{
    hash_nodes, zero_values, MerkleAccumulator, DEFAULT_DEPTH, DEFAULT_ROOT_HISTORY, MAX_DEPTH,
    ZERO_LEAF,
};
pub use gadgets::{compute_root_from_path, verify_membership, MembershipProofVar};
pub use proof::MembershipProof;
