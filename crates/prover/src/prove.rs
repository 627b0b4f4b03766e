//! Wallet-side proof generation for spends out of the pool.
//!
//! Each `prove_*` returns a request ready to hand to `PoolStateMachine`.

use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, Proof, ProvingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use ark_std::rand::{CryptoRng, RngCore};
use thiserror::Error;

use shielded_circuits::{Address, Commitment, MembershipProof, Note, SpendCircuit};
use shielded_pool::{PrivateSwapRequest, ProofBytes, PublicInputs, SwapParameters, WithdrawRequest};

/// Errors during proof generation
#[derive(Error, Debug)]
pub enum ProveError {
    #[error("Proof generation failed: {0}")]
    ProofGeneration(String),
    #[error("Invalid spend: {0}")]
    InvalidState(String),
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

/// A proof with its public inputs
#[derive(Clone)]
pub struct ProofWithInputs {
    pub proof: Proof<Bn254>,
    pub public_inputs: Vec<Fr>,
}

impl ProofWithInputs {
    /// Serialize proof to bytes
    pub fn serialize_proof(&self) -> Result<Vec<u8>, ProveError> {
        let mut bytes = Vec::new();
        self.proof
            .serialize_compressed(&mut bytes)
            .map_err(|e| ProveError::Serialization(e.to_string()))?;
        Ok(bytes)
    }

    /// Deserialize proof from bytes
    pub fn deserialize_proof(bytes: &[u8]) -> Result<Proof<Bn254>, ProveError> {
        Proof::deserialize_compressed(bytes).map_err(|e| ProveError::Serialization(e.to_string()))
    }

    pub fn to_proof_bytes(&self) -> Result<ProofBytes, ProveError> {
        self.serialize_proof().map(ProofBytes)
    }
}

/// Where a withdrawal pays out.
#[derive(Clone, Copy, Debug)]
pub struct WithdrawTarget {
    pub recipient: Address,
    pub relayer: Address,
    pub fee: u64,
    pub refund: u64,
}

/// Prove that `note` sits at `path.leaf_index` under `inputs.root`.
pub fn prove_spend<R: RngCore + CryptoRng>(
    pk: &ProvingKey<Bn254>,
    note: &Note,
    path: &MembershipProof,
    inputs: &PublicInputs,
    rng: &mut R,
) -> Result<ProofWithInputs, ProveError> {
    let commitment = note
        .commitment()
        .map_err(|e| ProveError::InvalidState(e.to_string()))?;

    // Catch bad witnesses here instead of producing a proof that cannot verify
    if !path.verify_against(commitment, &inputs.root) {
        return Err(ProveError::InvalidState(format!(
            "note is not leaf {} under root {}",
            path.leaf_index, inputs.root
        )));
    }
    if note.nullifier_hash(path.leaf_index) != inputs.nullifier_hash {
        return Err(ProveError::InvalidState(
            "nullifier hash does not belong to this note and position".into(),
        ));
    }

    let statement = inputs.to_statement();
    let circuit = SpendCircuit::new(note, path.clone(), statement);

    let proof = Groth16::<Bn254>::prove(pk, circuit, rng)
        .map_err(|e| ProveError::ProofGeneration(e.to_string()))?;

    Ok(ProofWithInputs {
        proof,
        public_inputs: statement.to_field_elements().to_vec(),
    })
}

/// Build a proven withdrawal of `note` against the root `path` was taken at.
pub fn prove_withdraw<R: RngCore + CryptoRng>(
    pk: &ProvingKey<Bn254>,
    note: &Note,
    path: &MembershipProof,
    target: WithdrawTarget,
    rng: &mut R,
) -> Result<WithdrawRequest, ProveError> {
    let mut request = WithdrawRequest {
        root: path.root,
        nullifier_hash: note.nullifier_hash(path.leaf_index),
        commitment_hash: note
            .commitment()
            .map_err(|e| ProveError::InvalidState(e.to_string()))?,
        recipient: target.recipient,
        relayer: target.relayer,
        fee: target.fee,
        refund: target.refund,
        proof: ProofBytes::default(),
    };

    let inputs = PublicInputs::for_withdraw(&request);
    request.proof = prove_spend(pk, note, path, &inputs, rng)?.to_proof_bytes()?;
    Ok(request)
}

/// Build a proven private swap of `note` into `new_commitment`.
pub fn prove_swap<R: RngCore + CryptoRng>(
    pk: &ProvingKey<Bn254>,
    note: &Note,
    path: &MembershipProof,
    new_commitment: Commitment,
    recipient: Address,
    swap: SwapParameters,
    rng: &mut R,
) -> Result<PrivateSwapRequest, ProveError> {
    let mut request = PrivateSwapRequest {
        root: path.root,
        nullifier_hash: note.nullifier_hash(path.leaf_index),
        new_commitment,
        recipient,
        swap,
        proof: ProofBytes::default(),
    };

    let inputs = PublicInputs::for_swap(&request);
    request.proof = prove_spend(pk, note, path, &inputs, rng)?.to_proof_bytes()?;
    Ok(request)
}
