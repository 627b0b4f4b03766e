//! Proof verification boundary.
//!
//! The pool never builds witnesses or proofs. It assembles the public inputs
//! for a spend and hands them, with the caller's proof bytes, to a [`Prover`].

use ark_bn254::Fr;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shielded_circuits::{
    field_to_bytes, poseidon_hash_many, Address, Commitment, NullifierHash, Root, SpendStatement,
    SPEND_PUBLIC_INPUTS,
};

use crate::error::ProverError;
use crate::request::{PrivateSwapRequest, WithdrawRequest};

/// Opaque serialized proof.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofBytes(pub Vec<u8>);

impl ProofBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Public inputs shared by withdraw and swap proofs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicInputs {
    pub root: Root,
    pub nullifier_hash: NullifierHash,
    /// Present for swaps only.
    pub output_commitment: Option<Commitment>,
    pub recipient: Address,
    pub context_hash: Fr,
}

impl PublicInputs {
    pub fn for_withdraw(request: &WithdrawRequest) -> Self {
        Self {
            root: request.root,
            nullifier_hash: request.nullifier_hash,
            output_commitment: None,
            recipient: request.recipient,
            context_hash: withdraw_context_hash(
                request.commitment_hash,
                request.relayer,
                request.fee,
                request.refund,
            ),
        }
    }

    pub fn for_swap(request: &PrivateSwapRequest) -> Self {
        Self {
            root: request.root,
            nullifier_hash: request.nullifier_hash,
            output_commitment: Some(request.new_commitment),
            recipient: request.recipient,
            context_hash: request.swap.context_hash(),
        }
    }

    pub fn to_statement(&self) -> SpendStatement {
        SpendStatement {
            root: self.root.0,
            nullifier_hash: self.nullifier_hash.0,
            output_commitment: self.output_commitment.map(|c| c.0).unwrap_or_default(),
            recipient: self.recipient.0,
            context_hash: self.context_hash,
        }
    }

    pub fn to_field_elements(&self) -> [Fr; SPEND_PUBLIC_INPUTS] {
        self.to_statement().to_field_elements()
    }
}

/// Context digest for a withdrawal: `H(commitment_hash, relayer, fee, refund)`.
pub fn withdraw_context_hash(
    commitment_hash: Commitment,
    relayer: Address,
    fee: u64,
    refund: u64,
) -> Fr {
    poseidon_hash_many(&[
        commitment_hash.0,
        relayer.0,
        Fr::from(fee),
        Fr::from(refund),
    ])
}

/// Verifies spend proofs.
///
/// `Ok(false)` means the proof does not verify; `Err` means verification could
/// not be carried out at all.
#[async_trait]
pub trait Prover: Send + Sync {
    async fn verify(&self, proof: &ProofBytes, inputs: &PublicInputs)
        -> Result<bool, ProverError>;
}

/// Insecure stand-in whose "proof" is a hash of the public inputs.
///
/// Anyone can produce a valid proof; it only checks that a proof is bound to
/// exactly the public inputs the pool assembled. Use it in tests and simulation.
#[derive(Clone, Copy, Debug, Default)]
pub struct BindingProver;

impl BindingProver {
    pub fn prove(inputs: &PublicInputs) -> ProofBytes {
        let digest = poseidon_hash_many(&inputs.to_field_elements());
        ProofBytes(field_to_bytes(&digest).to_vec())
    }
}

#[async_trait]
impl Prover for BindingProver {
    async fn verify(
        &self,
        proof: &ProofBytes,
        inputs: &PublicInputs,
    ) -> Result<bool, ProverError> {
        Ok(*proof == Self::prove(inputs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> PublicInputs {
        PublicInputs {
            root: Root(Fr::from(1u64)),
            nullifier_hash: NullifierHash(Fr::from(2u64)),
            output_commitment: None,
            recipient: Address(Fr::from(3u64)),
            context_hash: Fr::from(4u64),
        }
    }

    #[test]
    fn test_field_elements_order() {
        let elements = inputs().to_field_elements();
        assert_eq!(
            elements,
            [
                Fr::from(1u64),
                Fr::from(2u64),
                Fr::from(0u64),
                Fr::from(3u64),
                Fr::from(4u64)
            ]
        );
    }

    #[tokio::test]
    async fn test_binding_prover_rejects_other_root() {
        let proof = BindingProver::prove(&inputs());
        assert!(BindingProver.verify(&proof, &inputs()).await.unwrap());

        let mut moved = inputs();
        moved.root = Root(Fr::from(9u64));
        assert!(!BindingProver.verify(&proof, &moved).await.unwrap());
    }

    #[test]
    fn test_withdraw_context_binds_fee() {
        let commitment = Commitment(Fr::from(10u64));
        let relayer = Address(Fr::from(11u64));

        assert_ne!(
            withdraw_context_hash(commitment, relayer, 1, 0),
            withdraw_context_hash(commitment, relayer, 2, 0)
        );
    }
}
