//! In-circuit membership verification for the commitment accumulator.

use ark_bn254::Fr;
use ark_r1cs_std::{boolean::Boolean, fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::proof::MembershipProof;
use crate::poseidon::poseidon_hash_two_var;

/// Circuit variable representation of a membership proof.
#[derive(Clone)]
pub struct MembershipProofVar {
    /// Sibling hashes as circuit variables
    siblings: Vec<FpVar<Fr>>,

    /// Direction bits, least significant first; together they spell the leaf index.
    directions: Vec<Boolean<Fr>>,
}

impl MembershipProofVar {
    /// Allocate a membership proof as witness variables.
    pub fn new_witness(
        cs: ConstraintSystemRef<Fr>,
        proof: &MembershipProof,
    ) -> Result<Self, SynthesisError> {
        let siblings = proof
            .siblings
            .iter()
            .map(|h| FpVar::new_witness(cs.clone(), || Ok(*h)))
            .collect::<Result<Vec<_>, _>>()?;

        let directions = proof
            .path_directions
            .iter()
            .map(|&b| Boolean::new_witness(cs.clone(), || Ok(b)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            siblings,
            directions,
        })
    }

    pub fn siblings(&self) -> &[FpVar<Fr>] {
        &self.siblings
    }

    pub fn directions(&self) -> &[Boolean<Fr>] {
        &self.directions
    }

    pub fn depth(&self) -> usize {
        self.siblings.len()
    }

    /// The leaf index encoded by the direction bits.
    pub fn leaf_index(&self) -> Result<FpVar<Fr>, SynthesisError> {
        Boolean::le_bits_to_fp_var(&self.directions)
    }
}

/// Compute the root hash from a leaf and sibling path in-circuit.
pub fn compute_root_from_path(
    cs: ConstraintSystemRef<Fr>,
    leaf: &FpVar<Fr>,
    proof: &MembershipProofVar,
) -> Result<FpVar<Fr>, SynthesisError> {
    let mut current = leaf.clone();

    for (sibling, is_right) in proof.siblings.iter().zip(proof.directions.iter()) {
        // If is_right: H(sibling, current), else H(current, sibling)
        let left = is_right.select(sibling, &current)?;
        let right = is_right.select(&current, sibling)?;

        current = poseidon_hash_two_var(cs.clone(), &left, &right)?;
    }

    Ok(current)
}

/// Constrain `leaf` to sit in the tree committed to by `expected_root`.
pub fn verify_membership(
    cs: ConstraintSystemRef<Fr>,
    expected_root: &FpVar<Fr>,
    leaf: &FpVar<Fr>,
    proof: &MembershipProofVar,
) -> Result<(), SynthesisError> {
    let computed_root = compute_root_from_path(cs, leaf, proof)?;
    computed_root.enforce_equal(expected_root)
}
