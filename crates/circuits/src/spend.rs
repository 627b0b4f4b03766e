//! Reference spend relation shared by withdrawals and private swaps.
//!
//! Public inputs, in order:
//! - `root`: accumulator root the membership path folds to
//! - `nullifier_hash`: `H(nullifier, leaf_index)`
//! - `output_commitment`: new commitment created by a swap (zero for withdrawals)
//! - `recipient`: destination account
//! - `context_hash`: digest of the remaining operation parameters
//!
//! Witnesses:
//! - The spent note (secret, nullifier, amount, asset)
//! - Its membership path, whose direction bits double as the leaf index

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::commitment::Note;
use crate::field::Root;
use crate::merkle::{verify_membership, MembershipProof, MembershipProofVar};
use crate::poseidon::{poseidon_hash_many_var, poseidon_hash_two_var};

/// Number of public inputs exposed by [`SpendCircuit`].
pub const SPEND_PUBLIC_INPUTS: usize = 5;

/// Public half of a spend statement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpendStatement {
    pub root: Fr,
    pub nullifier_hash: Fr,
    pub output_commitment: Fr,
    pub recipient: Fr,
    pub context_hash: Fr,
}

impl SpendStatement {
    /// Public inputs in circuit allocation order.
    pub fn to_field_elements(&self) -> [Fr; SPEND_PUBLIC_INPUTS] {
        [
            self.root,
            self.nullifier_hash,
            self.output_commitment,
            self.recipient,
            self.context_hash,
        ]
    }
}

/// Spend circuit.
///
/// Proves that the prover knows a note whose commitment sits in the tree under
/// `root`, and that `nullifier_hash` was derived from that note's nullifier and
/// position.
#[derive(Clone)]
pub struct SpendCircuit {
    // Public inputs
    pub statement: Option<SpendStatement>,

    // Witnesses
    pub secret: Option<Fr>,
    pub nullifier: Option<Fr>,
    pub amount: Option<u64>,
    pub asset_id: Option<Fr>,
    pub path: MembershipProof,
}

impl SpendCircuit {
    /// Create an empty circuit for setup.
    /// Uses dummy values that produce valid constraint structure.
    pub fn empty(depth: usize) -> Self {
        let zero = Fr::from(0u64);

        Self {
            statement: Some(SpendStatement {
                root: zero,
                nullifier_hash: zero,
                output_commitment: zero,
                recipient: zero,
                context_hash: zero,
            }),
            secret: Some(zero),
            nullifier: Some(zero),
            amount: Some(0),
            asset_id: Some(zero),
            path: MembershipProof {
                leaf_index: 0,
                siblings: vec![zero; depth],
                path_directions: vec![false; depth],
                root: Root::default(),
            },
        }
    }

    /// Create a circuit with all witnesses.
    pub fn new(note: &Note, path: MembershipProof, statement: SpendStatement) -> Self {
        Self {
            statement: Some(statement),
            secret: Some(note.secret.0),
            nullifier: Some(note.nullifier.0),
            amount: Some(note.amount),
            asset_id: Some(note.asset_id.0),
            path,
        }
    }

    pub fn depth(&self) -> usize {
        self.path.depth()
    }
}

impl ConstraintSynthesizer<Fr> for SpendCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let statement = self.statement;
        let public = |select: fn(&SpendStatement) -> Fr| {
            statement
                .as_ref()
                .map(select)
                .ok_or(SynthesisError::AssignmentMissing)
        };

        // === Allocate public inputs ===
        // Order matters: must match SpendStatement::to_field_elements
        let root = FpVar::new_input(cs.clone(), || public(|s| s.root))?;
        let nullifier_hash = FpVar::new_input(cs.clone(), || public(|s| s.nullifier_hash))?;
        let output_commitment =
            FpVar::new_input(cs.clone(), || public(|s| s.output_commitment))?;
        let recipient = FpVar::new_input(cs.clone(), || public(|s| s.recipient))?;
        let context_hash = FpVar::new_input(cs.clone(), || public(|s| s.context_hash))?;

        // === Allocate witnesses ===
        let secret =
            FpVar::new_witness(cs.clone(), || self.secret.ok_or(SynthesisError::AssignmentMissing))?;
        let nullifier = FpVar::new_witness(cs.clone(), || {
            self.nullifier.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let amount = FpVar::new_witness(cs.clone(), || {
            self.amount
                .map(Fr::from)
                .ok_or(SynthesisError::AssignmentMissing)
        })?;
        let asset_id = FpVar::new_witness(cs.clone(), || {
            self.asset_id.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let path = MembershipProofVar::new_witness(cs.clone(), &self.path)?;

        // Commitment = H(secret, nullifier, amount, asset), same order as natively
        let commitment = poseidon_hash_many_var(
            cs.clone(),
            &[secret, nullifier.clone(), amount, asset_id],
        )?;
        verify_membership(cs.clone(), &root, &commitment, &path)?;

        // Nullifier hash is tied to the leaf position proven above
        let leaf_index = path.leaf_index()?;
        let computed_nullifier_hash = poseidon_hash_two_var(cs.clone(), &nullifier, &leaf_index)?;
        computed_nullifier_hash.enforce_equal(&nullifier_hash)?;

        // Bind the remaining public inputs so they cannot be altered after proving
        for input in [&output_commitment, &recipient, &context_hash] {
            input.square()?;
        }

        Ok(())
    }
}
