//! Spent-nullifier registry.
//!
//! Holds two disjoint sets: nullifier hashes the ledger has confirmed as spent,
//! and hashes reserved by a spend that is still waiting on the prover or the
//! ledger. A reservation makes a concurrent spend of the same hash fail fast
//! instead of racing it to the ledger.

use std::collections::HashSet;

use shielded_circuits::NullifierHash;

use crate::error::PoolError;

#[derive(Clone, Debug, Default)]
pub struct NullifierRegistry {
    spent: HashSet<NullifierHash>,
    pending: HashSet<NullifierHash>,
}

impl NullifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Local view only; see `PoolStateMachine::is_spent` for the ledger-backed check.
    pub fn is_spent(&self, nullifier_hash: &NullifierHash) -> bool {
        self.spent.contains(nullifier_hash)
    }

    pub fn is_pending(&self, nullifier_hash: &NullifierHash) -> bool {
        self.pending.contains(nullifier_hash)
    }

    /// Spent or reserved.
    pub fn contains(&self, nullifier_hash: &NullifierHash) -> bool {
        self.is_spent(nullifier_hash) || self.is_pending(nullifier_hash)
    }

    pub fn ensure_unspent(&self, nullifier_hash: &NullifierHash) -> Result<(), PoolError> {
        if self.contains(nullifier_hash) {
            return Err(PoolError::DoubleSpend(*nullifier_hash));
        }
        Ok(())
    }

    /// Claim `nullifier_hash` for an in-flight spend.
    pub fn reserve(&mut self, nullifier_hash: NullifierHash) -> Result<(), PoolError> {
        self.ensure_unspent(&nullifier_hash)?;
        self.pending.insert(nullifier_hash);
        Ok(())
    }

    /// Drop a reservation without recording a spend.
    pub fn release(&mut self, nullifier_hash: &NullifierHash) {
        self.pending.remove(nullifier_hash);
    }

    /// Record a confirmed spend. Any reservation for the hash is consumed.
    ///
    /// Only call this once the ledger has confirmed the spend.
    pub fn mark_spent(&mut self, nullifier_hash: NullifierHash) -> Result<(), PoolError> {
        self.pending.remove(&nullifier_hash);
        if !self.spent.insert(nullifier_hash) {
            return Err(PoolError::DoubleSpend(nullifier_hash));
        }
        Ok(())
    }

    /// Remember a hash the ledger reported as spent.
    pub fn cache_spent(&mut self, nullifier_hash: NullifierHash) {
        self.spent.insert(nullifier_hash);
    }

    /// Adopt every spent hash from `other`, keeping local reservations.
    pub fn merge_spent(&mut self, other: &NullifierRegistry) {
        self.spent.extend(other.spent.iter().copied());
    }

    /// Number of confirmed spends.
    pub fn len(&self) -> usize {
        self.spent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spent.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn spent(&self) -> impl Iterator<Item = &NullifierHash> + '_ {
        self.spent.iter()
    }

    pub fn clear(&mut self) {
        self.spent.clear();
        self.pending.clear();
    }
}

impl FromIterator<NullifierHash> for NullifierRegistry {
    fn from_iter<I: IntoIterator<Item = NullifierHash>>(iter: I) -> Self {
        Self {
            spent: iter.into_iter().collect(),
            pending: HashSet::new(),
        }
    }
}
