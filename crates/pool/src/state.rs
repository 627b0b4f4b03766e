//! The pool's only mutable state: accumulator plus spent-nullifier registry.

use shielded_circuits::{AccumulatorError, Commitment, MerkleAccumulator, NullifierHash, Root};
use tracing::warn;

use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::ledger::{event_log::ordered_leaves, LedgerEvent};
use crate::registry::NullifierRegistry;

/// Outcome of mirroring a ledger-assigned leaf locally.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeafApplication {
    /// Inserted at the ledger's index.
    Applied { root: Root },
    /// The same commitment is already at that index.
    AlreadyPresent,
    /// The ledger index is past the next local index; leaves are missing locally.
    Gap { expected: u64, got: u64 },
    /// A different commitment already occupies that index locally.
    Conflict { index: u64 },
}

#[derive(Clone, Debug)]
pub struct PoolState {
    accumulator: MerkleAccumulator,
    nullifiers: NullifierRegistry,
}

impl PoolState {
    pub fn new(config: &PoolConfig) -> Result<Self, PoolError> {
        Ok(Self {
            accumulator: MerkleAccumulator::with_root_history(
                config.depth,
                config.root_history_size,
            )?,
            nullifiers: NullifierRegistry::new(),
        })
    }

    /// Rebuild state from the ledger's ordered event log.
    pub fn replay(config: &PoolConfig, events: &[LedgerEvent]) -> Result<Self, PoolError> {
        let leaves = ordered_leaves(events).map_err(|e| PoolError::Divergence(e.to_string()))?;

        let mut state = Self::new(config)?;
        state.accumulator.rebuild(&leaves)?;
        state.nullifiers = events
            .iter()
            .filter_map(|event| match event {
                LedgerEvent::NullifierSpent { nullifier_hash, .. } => Some(*nullifier_hash),
                LedgerEvent::Deposit(_) => None,
            })
            .collect();

        Ok(state)
    }

    pub fn accumulator(&self) -> &MerkleAccumulator {
        &self.accumulator
    }

    pub fn nullifiers(&self) -> &NullifierRegistry {
        &self.nullifiers
    }

    pub fn nullifiers_mut(&mut self) -> &mut NullifierRegistry {
        &mut self.nullifiers
    }

    pub fn current_root(&self) -> Root {
        self.accumulator.current_root()
    }

    /// Mirror a leaf the ledger placed at `ledger_index`.
    pub fn apply_leaf(
        &mut self,
        commitment: Commitment,
        ledger_index: u64,
    ) -> Result<LeafApplication, AccumulatorError> {
        let expected = self.accumulator.len();

        if ledger_index == expected {
            self.accumulator.insert(commitment)?;
            return Ok(LeafApplication::Applied {
                root: self.accumulator.current_root(),
            });
        }
        if ledger_index > expected {
            return Ok(LeafApplication::Gap {
                expected,
                got: ledger_index,
            });
        }
        if self.accumulator.leaf(ledger_index) == Some(commitment) {
            Ok(LeafApplication::AlreadyPresent)
        } else {
            Ok(LeafApplication::Conflict {
                index: ledger_index,
            })
        }
    }

    /// Record a spend the ledger has confirmed.
    ///
    /// The ledger is authoritative here: a hash already marked locally (for
    /// example by a resync that raced this spend) is logged, not rejected.
    pub fn apply_confirmed_spend(&mut self, nullifier_hash: NullifierHash) {
        if let Err(e) = self.nullifiers.mark_spent(nullifier_hash) {
            warn!(error = %e, "confirmed spend was already recorded locally");
        }
    }

    /// Record a confirmed swap: the spent input and its output leaf change
    /// together, so no reader sees one without the other.
    pub fn apply_confirmed_swap(
        &mut self,
        nullifier_hash: NullifierHash,
        output: Commitment,
        ledger_index: u64,
    ) -> Result<LeafApplication, AccumulatorError> {
        self.apply_confirmed_spend(nullifier_hash);
        self.apply_leaf(output, ledger_index)
    }

    /// Replace the accumulator with a replayed one, merging spent hashes and
    /// keeping in-flight reservations.
    pub fn install(&mut self, replayed: PoolState) {
        self.accumulator = replayed.accumulator;
        self.nullifiers.merge_spent(&replayed.nullifiers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::DepositEvent;
    use ark_bn254::Fr;

    fn commitment(n: u64) -> Commitment {
        Commitment(Fr::from(n))
    }

    fn state() -> PoolState {
        PoolState::new(&PoolConfig::with_depth(4)).unwrap()
    }

    #[test]
    fn test_apply_leaf_outcomes() {
        let mut state = state();

        assert!(matches!(
            state.apply_leaf(commitment(1), 0).unwrap(),
            LeafApplication::Applied { .. }
        ));
        assert_eq!(
            state.apply_leaf(commitment(1), 0).unwrap(),
            LeafApplication::AlreadyPresent
        );
        assert_eq!(
            state.apply_leaf(commitment(2), 0).unwrap(),
            LeafApplication::Conflict { index: 0 }
        );
        assert_eq!(
            state.apply_leaf(commitment(3), 4).unwrap(),
            LeafApplication::Gap {
                expected: 1,
                got: 4
            }
        );
        assert_eq!(state.accumulator().len(), 1);
    }

    #[test]
    fn test_replay_matches_incremental() {
        let mut incremental = state();
        let mut events = Vec::new();

        for n in 0..5u64 {
            incremental.apply_leaf(commitment(n + 1), n).unwrap();
            events.push(LedgerEvent::Deposit(DepositEvent {
                commitment: commitment(n + 1),
                leaf_index: n,
                timestamp: n,
            }));
        }
        events.push(LedgerEvent::NullifierSpent {
            nullifier_hash: NullifierHash(Fr::from(42u64)),
            timestamp: 9,
        });

        let replayed = PoolState::replay(&PoolConfig::with_depth(4), &events).unwrap();

        assert_eq!(replayed.current_root(), incremental.current_root());
        assert!(replayed.nullifiers().is_spent(&NullifierHash(Fr::from(42u64))));
    }

    #[test]
    fn test_confirmed_swap_marks_spent_even_on_gap() {
        let mut state = state();
        state.apply_leaf(commitment(1), 0).unwrap();
        let spent = NullifierHash(Fr::from(11u64));

        let application = state
            .apply_confirmed_swap(spent, commitment(2), 3)
            .unwrap();

        assert_eq!(application, LeafApplication::Gap { expected: 1, got: 3 });
        assert!(state.nullifiers().is_spent(&spent));
        assert_eq!(state.accumulator().len(), 1);
    }

    #[test]
    fn test_confirmed_swap_applies_both_updates() {
        let mut state = state();
        state.apply_leaf(commitment(1), 0).unwrap();
        let spent = NullifierHash(Fr::from(12u64));
        state.nullifiers_mut().reserve(spent).unwrap();

        let application = state
            .apply_confirmed_swap(spent, commitment(2), 1)
            .unwrap();

        assert!(matches!(application, LeafApplication::Applied { .. }));
        assert!(state.nullifiers().is_spent(&spent));
        assert!(!state.nullifiers().is_pending(&spent));
        assert_eq!(state.accumulator().leaf(1), Some(commitment(2)));
    }

    #[test]
    fn test_install_keeps_reservations() {
        let mut local = state();
        let pending = NullifierHash(Fr::from(7u64));
        local.nullifiers_mut().reserve(pending).unwrap();

        let mut replayed = state();
        replayed.apply_leaf(commitment(1), 0).unwrap();
        local.install(replayed);

        assert_eq!(local.accumulator().len(), 1);
        assert!(local.nullifiers().is_pending(&pending));
    }
}
