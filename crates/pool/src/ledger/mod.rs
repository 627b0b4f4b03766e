//! Typed boundary to the authoritative ledger.
//!
//! Each ledger operation takes one request struct and returns one response
//! struct, so argument order and types are checked here rather than at every
//! call site.

pub(crate) mod event_log;
mod memory;

pub use event_log::EventLog;
pub use memory::InMemoryLedger;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shielded_circuits::{Address, AssetId, Commitment, NullifierHash, Root};

use crate::error::LedgerError;
use crate::prover::ProofBytes;

/// Ledger transaction identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(pub u64);

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

/// Value attached to a deposit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetValue {
    pub amount: u64,
    pub asset_id: AssetId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositSubmission {
    pub commitment: Commitment,
    pub value: AssetValue,
}

/// Emitted once per leaf, for deposits and swap outputs alike.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositEvent {
    pub commitment: Commitment,
    pub leaf_index: u64,
    pub timestamp: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapSubmission {
    pub proof: ProofBytes,
    pub encoded_swap_params: Vec<u8>,
    pub nullifier_hash: NullifierHash,
    pub new_commitment: Commitment,
    pub recipient: Address,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapConfirmation {
    pub tx: TxId,
    /// Index the ledger assigned to the new commitment.
    pub leaf_index: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawSubmission {
    pub proof: ProofBytes,
    pub root: Root,
    pub nullifier_hash: NullifierHash,
    pub commitment_hash: Commitment,
    pub recipient: Address,
    pub relayer: Address,
    pub fee: u64,
    pub refund: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    pub tx: TxId,
}

/// Entries of the ledger's ordered event log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    Deposit(DepositEvent),
    NullifierSpent {
        nullifier_hash: NullifierHash,
        timestamp: u64,
    },
}

/// Authoritative store of commitments and spent nullifiers.
///
/// Every method returns once the ledger has a final answer; a returned `Ok`
/// from a submission means the transaction is confirmed.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn deposit(&self, submission: DepositSubmission) -> Result<DepositEvent, LedgerError>;

    async fn private_swap(
        &self,
        submission: SwapSubmission,
    ) -> Result<SwapConfirmation, LedgerError>;

    async fn withdraw(&self, submission: WithdrawSubmission)
        -> Result<Confirmation, LedgerError>;

    async fn is_spent(&self, nullifier_hash: &NullifierHash) -> Result<bool, LedgerError>;

    async fn latest_root(&self) -> Result<Root, LedgerError>;

    /// Events starting at position `from` of the log.
    async fn events(&self, from: usize) -> Result<Vec<LedgerEvent>, LedgerError>;
}
