//! Shielded pool state machine.
//!
//! This crate provides:
//! - `NullifierRegistry`: spent and in-flight nullifier hashes
//! - `PoolState`: accumulator plus registry, the pool's only mutable state
//! - `PoolStateMachine`: deposit, private swap and withdraw transitions
//! - `LedgerClient` / `Prover`: typed boundaries to the ledger and proof backend
//! - `InMemoryLedger` and `EventLog` for tests, simulation and cold start

pub mod config;
pub mod error;
pub mod ledger;
pub mod machine;
pub mod prover;
pub mod registry;
pub mod request;
pub mod state;
pub mod swap;


pub use config::{PoolConfig, RootPolicy};
pub use error::{LedgerError, PersistenceError, PoolError, ProverError};
pub use ledger::{
    AssetValue, Confirmation, DepositEvent, DepositSubmission, EventLog, InMemoryLedger,
    LedgerClient, LedgerEvent, SwapConfirmation, SwapSubmission, TxId, WithdrawSubmission,
};
pub use machine::PoolStateMachine;
pub use prover::{withdraw_context_hash, BindingProver, ProofBytes, Prover, PublicInputs};
pub use registry::NullifierRegistry;
pub use request::{
    DepositReceipt, PrivateSwapRequest, SwapReceipt, WithdrawReceipt, WithdrawRequest,
};
pub use state::{LeafApplication, PoolState};
pub use swap::{SwapParameters, ENCODED_SWAP_LEN};
