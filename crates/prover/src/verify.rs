//! Groth16 verification of spend proofs.

use std::sync::Arc;

use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, PreparedVerifyingKey, Proof, VerifyingKey};
use ark_serialize::CanonicalDeserialize;
use ark_snark::SNARK;
use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use shielded_pool::{ProofBytes, Prover, ProverError, PublicInputs};

/// Errors during verification
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Verification failed: {0}")]
    Verification(String),
    #[error("Invalid verifying key: {0}")]
    InvalidKey(String),
}

/// Verify a spend proof against its five public inputs.
pub fn verify_spend(
    pvk: &PreparedVerifyingKey<Bn254>,
    proof: &Proof<Bn254>,
    public_inputs: &[Fr],
) -> Result<bool, VerifyError> {
    Groth16::<Bn254>::verify_with_processed_vk(pvk, public_inputs, proof)
        .map_err(|e| VerifyError::Verification(e.to_string()))
}

/// [`Prover`] backed by a Groth16 verifying key for the spend circuit.
#[derive(Clone)]
pub struct Groth16Verifier {
    pvk: Arc<PreparedVerifyingKey<Bn254>>,
}

impl Groth16Verifier {
    pub fn new(vk: &VerifyingKey<Bn254>) -> Result<Self, VerifyError> {
        let pvk = Groth16::<Bn254>::process_vk(vk)
            .map_err(|e| VerifyError::InvalidKey(e.to_string()))?;
        Ok(Self { pvk: Arc::new(pvk) })
    }
}

#[async_trait]
impl Prover for Groth16Verifier {
    async fn verify(
        &self,
        proof: &ProofBytes,
        inputs: &PublicInputs,
    ) -> Result<bool, ProverError> {
        // Garbage bytes are a proof that does not verify, not a backend failure
        let proof = match Proof::<Bn254>::deserialize_compressed(proof.as_bytes()) {
            Ok(proof) => proof,
            Err(e) => {
                debug!(error = %e, "malformed proof bytes");
                return Ok(false);
            }
        };

        let pvk = Arc::clone(&self.pvk);
        let public_inputs = inputs.to_field_elements();

        // Pairing checks are CPU-bound; keep them off the async workers
        tokio::task::spawn_blocking(move || verify_spend(&pvk, &proof, &public_inputs))
            .await
            .map_err(|e| ProverError::Backend(e.to_string()))?
            .map_err(|e| ProverError::Backend(e.to_string()))
    }
}
