//! Typed spend requests and transition receipts.

use serde::{Deserialize, Serialize};
use shielded_circuits::{Address, Commitment, NullifierHash, Root};

use crate::error::PoolError;
use crate::ledger::TxId;
use crate::prover::ProofBytes;
use crate::swap::SwapParameters;

/// Spend a note out of the pool to `recipient`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawRequest {
    /// Root the proof was generated against.
    pub root: Root,
    pub nullifier_hash: NullifierHash,
    pub commitment_hash: Commitment,
    pub recipient: Address,
    /// Zero when the spender submits directly.
    pub relayer: Address,
    pub fee: u64,
    pub refund: u64,
    pub proof: ProofBytes,
}

impl WithdrawRequest {
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.nullifier_hash.is_zero() {
            return Err(PoolError::Validation("nullifier hash must not be zero".into()));
        }
        if self.recipient.is_zero() {
            return Err(PoolError::Validation("recipient must not be zero".into()));
        }
        if self.fee > 0 && self.relayer.is_zero() {
            return Err(PoolError::Validation("fee requires a relayer".into()));
        }
        if self.proof.is_empty() {
            return Err(PoolError::Validation("proof is empty".into()));
        }
        Ok(())
    }
}

/// Spend a note into a new commitment of another asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateSwapRequest {
    /// Root the proof was generated against.
    pub root: Root,
    pub nullifier_hash: NullifierHash,
    /// Commitment to the swap output, inserted once the ledger confirms.
    pub new_commitment: Commitment,
    pub recipient: Address,
    pub swap: SwapParameters,
    pub proof: ProofBytes,
}

impl PrivateSwapRequest {
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.nullifier_hash.is_zero() {
            return Err(PoolError::Validation("nullifier hash must not be zero".into()));
        }
        if self.new_commitment.is_zero() {
            return Err(PoolError::Validation("new commitment must not be zero".into()));
        }
        if self.recipient.is_zero() {
            return Err(PoolError::Validation("recipient must not be zero".into()));
        }
        if self.proof.is_empty() {
            return Err(PoolError::Validation("proof is empty".into()));
        }
        self.swap.validate()
    }
}

/// Receipts are returned for every transition the ledger confirmed. `synced`
/// is false when the local mirror could not be brought in line with the ledger
/// afterwards; the transition itself still happened, and a later
/// `resync`/`check_sync` catches the pool up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositReceipt {
    pub leaf_index: u64,
    pub root: Root,
    pub synced: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapReceipt {
    pub tx: TxId,
    /// Position of the swap's output commitment.
    pub leaf_index: u64,
    pub root: Root,
    pub synced: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawReceipt {
    pub tx: TxId,
    pub root: Root,
    pub synced: bool,
}
