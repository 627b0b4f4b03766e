//! JSON-persisted ledger event log.
//!
//! The log is the only persisted state: replaying it rebuilds the accumulator
//! and the spent-nullifier set from genesis.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use shielded_circuits::{Commitment, NullifierHash};

use super::LedgerEvent;
use crate::error::PersistenceError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<LedgerEvent>,
}

impl EventLog {
    pub fn new(events: Vec<LedgerEvent>) -> Self {
        Self { events }
    }

    pub fn push(&mut self, event: LedgerEvent) {
        self.events.push(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = LedgerEvent>) {
        self.events.extend(events);
    }

    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Leaves in index order.
    ///
    /// Fails unless deposit indices run 0, 1, 2, ... without gaps or repeats.
    pub fn deposits(&self) -> Result<Vec<Commitment>, PersistenceError> {
        ordered_leaves(&self.events)
    }

    pub fn spent_nullifiers(&self) -> impl Iterator<Item = NullifierHash> + '_ {
        self.events.iter().filter_map(|event| match event {
            LedgerEvent::NullifierSpent { nullifier_hash, .. } => Some(*nullifier_hash),
            LedgerEvent::Deposit(_) => None,
        })
    }

    pub fn load(path: &Path) -> Result<Self, PersistenceError> {
        let contents = fs::read_to_string(path)?;
        let log: Self = serde_json::from_str(&contents)?;
        log.deposits()?;
        Ok(log)
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}

pub(crate) fn ordered_leaves(events: &[LedgerEvent]) -> Result<Vec<Commitment>, PersistenceError> {
    let mut leaves = Vec::new();

    for event in events {
        if let LedgerEvent::Deposit(deposit) = event {
            let expected = leaves.len() as u64;
            if deposit.leaf_index != expected {
                return Err(PersistenceError::Invalid(format!(
                    "deposit for leaf {} found where leaf {} was expected",
                    deposit.leaf_index, expected
                )));
            }
            leaves.push(deposit.commitment);
        }
    }

    Ok(leaves)
}
