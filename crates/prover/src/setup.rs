//! Trusted setup for the spend circuit: generating, saving and loading keys.

use std::fs;
use std::path::Path;

use ark_bn254::Bn254;
use ark_groth16::{Groth16, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use ark_std::rand::{CryptoRng, RngCore};
use thiserror::Error;
use tracing::info;

use shielded_circuits::{SpendCircuit, MAX_DEPTH};

const PROVING_KEY_FILE: &str = "spend.pk";
const VERIFYING_KEY_FILE: &str = "spend.vk";
const DEPTH_FILE: &str = "spend.depth";

/// Errors that can occur during setup
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Circuit setup failed: {0}")]
    CircuitSetup(String),
    #[error("Serialization failed: {0}")]
    Serialization(String),
    #[error("Deserialization failed: {0}")]
    Deserialization(String),
    #[error("Keys were generated for depth {found}, expected {expected}")]
    DepthMismatch { expected: usize, found: usize },
    #[error("Unsupported tree depth {0}")]
    InvalidDepth(usize),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Groth16 keys for the spend circuit at one tree depth.
#[derive(Clone)]
pub struct SpendKeys {
    pub proving_key: ProvingKey<Bn254>,
    pub verifying_key: VerifyingKey<Bn254>,
    pub depth: usize,
}

impl SpendKeys {
    /// Serialize proving key to bytes
    pub fn serialize_pk(&self) -> Result<Vec<u8>, SetupError> {
        let mut bytes = Vec::new();
        self.proving_key
            .serialize_compressed(&mut bytes)
            .map_err(|e| SetupError::Serialization(e.to_string()))?;
        Ok(bytes)
    }

    /// Serialize verifying key to bytes
    pub fn serialize_vk(&self) -> Result<Vec<u8>, SetupError> {
        let mut bytes = Vec::new();
        self.verifying_key
            .serialize_compressed(&mut bytes)
            .map_err(|e| SetupError::Serialization(e.to_string()))?;
        Ok(bytes)
    }

    /// Deserialize proving key from bytes
    pub fn deserialize_pk(bytes: &[u8]) -> Result<ProvingKey<Bn254>, SetupError> {
        ProvingKey::deserialize_compressed(bytes)
            .map_err(|e| SetupError::Deserialization(e.to_string()))
    }

    /// Deserialize verifying key from bytes
    pub fn deserialize_vk(bytes: &[u8]) -> Result<VerifyingKey<Bn254>, SetupError> {
        VerifyingKey::deserialize_compressed(bytes)
            .map_err(|e| SetupError::Deserialization(e.to_string()))
    }

    /// Save keys to a directory
    pub fn save_to_directory(&self, dir: &Path) -> Result<(), SetupError> {
        fs::create_dir_all(dir)?;

        fs::write(dir.join(PROVING_KEY_FILE), self.serialize_pk()?)?;
        fs::write(dir.join(VERIFYING_KEY_FILE), self.serialize_vk()?)?;
        fs::write(dir.join(DEPTH_FILE), self.depth.to_string())?;

        Ok(())
    }

    /// Load keys from a directory
    pub fn load_from_directory(dir: &Path) -> Result<Self, SetupError> {
        let depth_str = fs::read_to_string(dir.join(DEPTH_FILE))?;
        let depth = depth_str
            .trim()
            .parse::<usize>()
            .map_err(|_| SetupError::Deserialization(format!("bad depth file: {depth_str:?}")))?;

        Ok(Self {
            proving_key: Self::deserialize_pk(&fs::read(dir.join(PROVING_KEY_FILE))?)?,
            verifying_key: Self::deserialize_vk(&fs::read(dir.join(VERIFYING_KEY_FILE))?)?,
            depth,
        })
    }

    /// Load keys for `depth` from `dir`, running setup and saving the result
    /// when the directory holds no keys yet.
    pub fn load_or_setup<R: RngCore + CryptoRng>(
        dir: &Path,
        depth: usize,
        rng: &mut R,
    ) -> Result<Self, SetupError> {
        if dir.join(VERIFYING_KEY_FILE).exists() {
            info!(?dir, "loading spend circuit keys");
            let keys = Self::load_from_directory(dir)?;
            if keys.depth != depth {
                return Err(SetupError::DepthMismatch {
                    expected: depth,
                    found: keys.depth,
                });
            }
            return Ok(keys);
        }

        info!(depth, "running spend circuit setup");
        let keys = setup_spend_circuit(depth, rng)?;
        keys.save_to_directory(dir)?;
        info!(?dir, "spend circuit keys saved");
        Ok(keys)
    }
}

/// Run circuit-specific setup for the spend circuit.
///
/// The randomness is toxic waste; production keys need a proper ceremony.
pub fn setup_spend_circuit<R: RngCore + CryptoRng>(
    depth: usize,
    rng: &mut R,
) -> Result<SpendKeys, SetupError> {
    if depth == 0 || depth > MAX_DEPTH {
        return Err(SetupError::InvalidDepth(depth));
    }

    let circuit = SpendCircuit::empty(depth);
    let (proving_key, verifying_key) = Groth16::<Bn254>::circuit_specific_setup(circuit, rng)
        .map_err(|e| SetupError::CircuitSetup(e.to_string()))?;

    Ok(SpendKeys {
        proving_key,
        verifying_key,
        depth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_setup_save_load() {
        let mut rng = StdRng::seed_from_u64(42);
        let keys = setup_spend_circuit(4, &mut rng).unwrap();

        let dir = tempfile::tempdir().unwrap();
        keys.save_to_directory(dir.path()).unwrap();
        let loaded = SpendKeys::load_from_directory(dir.path()).unwrap();

        assert_eq!(loaded.depth, 4);
        assert_eq!(loaded.serialize_vk().unwrap(), keys.serialize_vk().unwrap());
    }

    #[test]
    fn test_load_or_setup_checks_depth() {
        let mut rng = StdRng::seed_from_u64(7);
        let dir = tempfile::tempdir().unwrap();

        let first = SpendKeys::load_or_setup(dir.path(), 3, &mut rng).unwrap();
        let again = SpendKeys::load_or_setup(dir.path(), 3, &mut rng).unwrap();
        assert_eq!(first.serialize_vk().unwrap(), again.serialize_vk().unwrap());

        assert!(matches!(
            SpendKeys::load_or_setup(dir.path(), 5, &mut rng),
            Err(SetupError::DepthMismatch {
                expected: 5,
                found: 3
            })
        ));
    }

    #[test]
    fn test_rejects_bad_depth() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            setup_spend_circuit(0, &mut rng),
            Err(SetupError::InvalidDepth(0))
        ));
    }
}
