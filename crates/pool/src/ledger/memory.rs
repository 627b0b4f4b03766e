//! In-process ledger used by tests and the simulator.
//!
//! Keeps its own accumulator and spent set, so a pool mirroring it can be
//! checked for convergence. Faults and latency can be injected to exercise the
//! pool's error, cancellation and resync paths.

use std::collections::{HashSet, VecDeque};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use parking_lot::Mutex;
use shielded_circuits::{
    AccumulatorError, Commitment, MerkleAccumulator, NullifierHash, Root, DEFAULT_ROOT_HISTORY,
};
use tracing::debug;

use super::{
    Confirmation, DepositEvent, DepositSubmission, EventLog, LedgerClient, LedgerEvent,
    SwapConfirmation, SwapSubmission, TxId, WithdrawSubmission,
};
use crate::error::LedgerError;
use crate::swap::SwapParameters;

struct LedgerInner {
    tree: MerkleAccumulator,
    spent: HashSet<NullifierHash>,
    events: Vec<LedgerEvent>,
    faults: VecDeque<LedgerError>,
    latency: Option<Duration>,
    next_tx: u64,
}

impl LedgerInner {
    fn next_tx(&mut self) -> TxId {
        self.next_tx += 1;
        TxId(self.next_tx)
    }

    fn append_leaf(&mut self, commitment: Commitment) -> Result<DepositEvent, LedgerError> {
        let leaf_index = self.tree.insert(commitment).map_err(|e| match e {
            AccumulatorError::CapacityExceeded { .. } => LedgerError::Reverted(e.to_string()),
            other => LedgerError::Rejected(other.to_string()),
        })?;

        let event = DepositEvent {
            commitment,
            leaf_index,
            timestamp: now(),
        };
        self.events.push(LedgerEvent::Deposit(event));
        Ok(event)
    }

    fn spend(&mut self, nullifier_hash: NullifierHash) -> Result<(), LedgerError> {
        if !self.spent.insert(nullifier_hash) {
            return Err(LedgerError::Reverted(format!(
                "nullifier hash {nullifier_hash} already spent"
            )));
        }
        self.events.push(LedgerEvent::NullifierSpent {
            nullifier_hash,
            timestamp: now(),
        });
        Ok(())
    }
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

pub struct InMemoryLedger {
    inner: Mutex<LedgerInner>,
}

impl InMemoryLedger {
    pub fn new(depth: usize) -> Result<Self, AccumulatorError> {
        Self::with_root_history(depth, DEFAULT_ROOT_HISTORY)
    }

    /// Ledger accepting withdrawals against any of its last `root_history_size` roots.
    pub fn with_root_history(
        depth: usize,
        root_history_size: usize,
    ) -> Result<Self, AccumulatorError> {
        Ok(Self {
            inner: Mutex::new(LedgerInner {
                tree: MerkleAccumulator::with_root_history(depth, root_history_size)?,
                spent: HashSet::new(),
                events: Vec::new(),
                faults: VecDeque::new(),
                latency: None,
                next_tx: 0,
            }),
        })
    }

    /// Rebuild a ledger from a persisted event log.
    pub fn from_event_log(depth: usize, log: &EventLog) -> Result<Self, LedgerError> {
        let leaves = log
            .deposits()
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;
        let tree = MerkleAccumulator::from_leaves(depth, &leaves)
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        Ok(Self {
            inner: Mutex::new(LedgerInner {
                tree,
                spent: log.spent_nullifiers().collect(),
                events: log.events().to_vec(),
                faults: VecDeque::new(),
                latency: None,
                next_tx: 0,
            }),
        })
    }

    /// Make the next submission fail with `error` without applying it.
    pub fn fail_next(&self, error: LedgerError) {
        self.inner.lock().faults.push_back(error);
    }

    /// Delay every submission by `latency` before it is applied.
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.inner.lock().latency = latency;
    }

    /// Append a deposit that did not come through any local pool, as another
    /// client of the same ledger would.
    pub fn inject_foreign_deposit(&self, commitment: Commitment) -> Result<u64, LedgerError> {
        let event = self.inner.lock().append_leaf(commitment)?;
        Ok(event.leaf_index)
    }

    pub fn event_log(&self) -> EventLog {
        EventLog::new(self.inner.lock().events.clone())
    }

    pub fn current_root(&self) -> Root {
        self.inner.lock().tree.current_root()
    }

    pub fn leaf_count(&self) -> u64 {
        self.inner.lock().tree.len()
    }

    pub fn spent_count(&self) -> usize {
        self.inner.lock().spent.len()
    }

    /// Wait out the configured latency, then consume a queued fault if any.
    async fn admit(&self) -> Result<(), LedgerError> {
        let latency = self.inner.lock().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        match self.inner.lock().faults.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn deposit(&self, submission: DepositSubmission) -> Result<DepositEvent, LedgerError> {
        self.admit().await?;
        if submission.value.amount == 0 {
            return Err(LedgerError::Rejected("deposit carries no value".into()));
        }

        let event = self.inner.lock().append_leaf(submission.commitment)?;
        debug!(leaf_index = event.leaf_index, "ledger accepted deposit");
        Ok(event)
    }

    async fn private_swap(
        &self,
        submission: SwapSubmission,
    ) -> Result<SwapConfirmation, LedgerError> {
        self.admit().await?;
        let params = SwapParameters::decode(&submission.encoded_swap_params)
            .map_err(|e| LedgerError::Rejected(format!("bad swap parameters: {e}")))?;

        let mut inner = self.inner.lock();
        if params.deadline < now() {
            return Err(LedgerError::Reverted("swap deadline passed".into()));
        }
        if inner.spent.contains(&submission.nullifier_hash) {
            return Err(LedgerError::Reverted(format!(
                "nullifier hash {} already spent",
                submission.nullifier_hash
            )));
        }
        if inner.tree.is_full() {
            return Err(LedgerError::Reverted("commitment tree is full".into()));
        }

        inner.spend(submission.nullifier_hash)?;
        let event = inner.append_leaf(submission.new_commitment)?;
        let tx = inner.next_tx();
        debug!(%tx, leaf_index = event.leaf_index, "ledger executed swap");

        Ok(SwapConfirmation {
            tx,
            leaf_index: event.leaf_index,
        })
    }

    async fn withdraw(&self, submission: WithdrawSubmission) -> Result<Confirmation, LedgerError> {
        self.admit().await?;

        let mut inner = self.inner.lock();
        if !inner.tree.is_known_root(&submission.root) {
            return Err(LedgerError::Rejected(format!(
                "unknown root {}",
                submission.root
            )));
        }
        inner.spend(submission.nullifier_hash)?;
        let tx = inner.next_tx();
        debug!(%tx, "ledger executed withdrawal");

        Ok(Confirmation { tx })
    }

    async fn is_spent(&self, nullifier_hash: &NullifierHash) -> Result<bool, LedgerError> {
        Ok(self.inner.lock().spent.contains(nullifier_hash))
    }

    async fn latest_root(&self) -> Result<Root, LedgerError> {
        Ok(self.inner.lock().tree.current_root())
    }

    async fn events(&self, from: usize) -> Result<Vec<LedgerEvent>, LedgerError> {
        Ok(self
            .inner
            .lock()
            .events
            .get(from..)
            .map(<[LedgerEvent]>::to_vec)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::AssetValue;
    use ark_bn254::Fr;
    use shielded_circuits::AssetId;

    fn submission(n: u64) -> DepositSubmission {
        DepositSubmission {
            commitment: Commitment(Fr::from(n)),
            value: AssetValue {
                amount: 10,
                asset_id: AssetId::from_u64(1),
            },
        }
    }

    #[tokio::test]
    async fn test_deposits_get_sequential_indices() {
        let ledger = InMemoryLedger::new(4).unwrap();

        assert_eq!(ledger.deposit(submission(1)).await.unwrap().leaf_index, 0);
        assert_eq!(ledger.deposit(submission(2)).await.unwrap().leaf_index, 1);
        assert_eq!(ledger.events(1).await.unwrap().len(), 1);
        assert!(ledger.events(5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_injected_fault_is_returned_once() {
        let ledger = InMemoryLedger::new(4).unwrap();
        ledger.fail_next(LedgerError::Timeout);

        assert_eq!(
            ledger.deposit(submission(1)).await,
            Err(LedgerError::Timeout)
        );
        assert_eq!(ledger.leaf_count(), 0);
        assert!(ledger.deposit(submission(1)).await.is_ok());
    }

    #[tokio::test]
    async fn test_rebuild_from_event_log() {
        let ledger = InMemoryLedger::new(4).unwrap();
        for n in 1..=3 {
            ledger.deposit(submission(n)).await.unwrap();
        }

        let restored = InMemoryLedger::from_event_log(4, &ledger.event_log()).unwrap();
        assert_eq!(restored.current_root(), ledger.current_root());
        assert_eq!(restored.leaf_count(), 3);
    }
}
