//! Error taxonomy for pool transitions.
//!
//! Every variant is terminal for the request that raised it. Nothing here is
//! retried inside the pool; [`LedgerError`] in particular reaches the caller
//! exactly as the ledger reported it.

use shielded_circuits::{AccumulatorError, MalformedInputError, NullifierHash};
use thiserror::Error;

/// Failures reported by a [`crate::LedgerClient`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("transaction rejected: {0}")]
    Rejected(String),
    #[error("transaction reverted: {0}")]
    Reverted(String),
    #[error("timed out waiting for confirmation")]
    Timeout,
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Failures of the proof backend itself, as opposed to a proof that does not verify.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProverError {
    #[error("verifying key not loaded")]
    KeyNotLoaded,
    #[error("verification backend failed: {0}")]
    Backend(String),
}

/// Errors raised by [`crate::PoolStateMachine`] transitions.
#[derive(Error, Debug)]
pub enum PoolError {
    /// Malformed arguments, detected before any external call.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("nullifier hash {0} already spent")]
    DoubleSpend(NullifierHash),

    #[error("proof rejected: {0}")]
    ProofInvalid(String),

    #[error("accumulator is full ({capacity} leaves)")]
    CapacityExceeded { capacity: u64 },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("prover error: {0}")]
    Prover(#[from] ProverError),

    /// Local state could not be brought back in line with the ledger.
    #[error("local state diverged from ledger: {0}")]
    Divergence(String),
}

impl From<MalformedInputError> for PoolError {
    fn from(e: MalformedInputError) -> Self {
        PoolError::Validation(e.to_string())
    }
}

impl From<AccumulatorError> for PoolError {
    fn from(e: AccumulatorError) -> Self {
        match e {
            AccumulatorError::CapacityExceeded { capacity } => {
                PoolError::CapacityExceeded { capacity }
            }
            other => PoolError::Validation(other.to_string()),
        }
    }
}

/// Errors loading or saving pool configuration and event logs.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid contents: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, PoolError>;
