//! Incremental Merkle accumulator.
//!
//! Leaves are appended at strictly increasing indices. Each insert rewrites
//! only the `depth` nodes on the path from the new leaf to the root; untouched
//! subtrees are represented by precomputed zero values, so an empty tree of any
//! depth has a well-defined root without materialising `2^depth` leaves.
//!
//! [`MerkleAccumulator::rebuild`] recomputes the whole tree level by level and
//! is meant for cold start and resynchronisation from the ledger's event log.

use std::collections::{HashMap, VecDeque};

use ark_bn254::Fr;
use ark_ff::{MontFp, Zero};
use rayon::prelude::*;

use super::proof::MembershipProof;
use crate::error::AccumulatorError;
use crate::field::{Commitment, Root};
use crate::poseidon::poseidon_hash_two;

/// Default tree depth (20 levels = 1,048,576 deposits)
pub const DEFAULT_DEPTH: usize = 20;

/// Deepest supported tree; leaf indices must fit in a `u64`.
pub const MAX_DEPTH: usize = 32;

/// Number of recent roots remembered by default.
pub const DEFAULT_ROOT_HISTORY: usize = 30;

/// Padding value for every leaf slot that has not been filled.
pub const ZERO_LEAF: Fr = MontFp!("0");

/// Hash two child nodes: H(left, right)
pub fn hash_nodes(left: Fr, right: Fr) -> Fr {
    poseidon_hash_two(left, right)
}

/// Zero values per level: `zeros[0]` is the empty leaf,
/// `zeros[i] = H(zeros[i-1], zeros[i-1])`, `zeros[depth]` is the empty root.
pub fn zero_values(depth: usize) -> Vec<Fr> {
    let mut zeros = Vec::with_capacity(depth + 1);
    let mut current = ZERO_LEAF;
    zeros.push(current);

    for _ in 0..depth {
        current = hash_nodes(current, current);
        zeros.push(current);
    }

    zeros
}

/// Fixed-depth, append-only authenticated tree over commitments.
#[derive(Clone, Debug)]
pub struct MerkleAccumulator {
    /// Tree depth (number of levels from leaves to root)
    depth: usize,

    /// Inserted commitments in index order
    leaves: Vec<Commitment>,

    /// Interior nodes: (level, index) -> hash, level 1..=depth.
    /// Missing entries are empty subtrees.
    nodes: HashMap<(usize, u64), Fr>,

    /// Precomputed empty-subtree hashes per level
    zeros: Vec<Fr>,

    /// Most recent roots, oldest first; the back is the current root.
    root_history: VecDeque<Root>,

    /// Maximum length of `root_history`
    root_history_size: usize,
}

impl MerkleAccumulator {
    /// Create an empty accumulator with the default root history.
    pub fn new(depth: usize) -> Result<Self, AccumulatorError> {
        Self::with_root_history(depth, DEFAULT_ROOT_HISTORY)
    }

    /// Create an empty accumulator remembering the last `root_history_size` roots.
    pub fn with_root_history(
        depth: usize,
        root_history_size: usize,
    ) -> Result<Self, AccumulatorError> {
        if depth == 0 || depth > MAX_DEPTH {
            return Err(AccumulatorError::InvalidDepth {
                depth,
                max: MAX_DEPTH,
            });
        }

        let zeros = zero_values(depth);
        let mut root_history = VecDeque::with_capacity(root_history_size.max(1));
        root_history.push_back(Root(zeros[depth]));

        Ok(Self {
            depth,
            leaves: Vec::new(),
            nodes: HashMap::new(),
            zeros,
            root_history,
            root_history_size: root_history_size.max(1),
        })
    }

    /// Build an accumulator holding exactly `leaves`, in order.
    pub fn from_leaves(depth: usize, leaves: &[Commitment]) -> Result<Self, AccumulatorError> {
        let mut tree = Self::new(depth)?;
        tree.rebuild(leaves)?;
        Ok(tree)
    }

    /// Append a commitment at the next free index and return that index.
    pub fn insert(&mut self, commitment: Commitment) -> Result<u64, AccumulatorError> {
        if commitment.is_zero() {
            return Err(AccumulatorError::ZeroLeaf);
        }
        if self.is_full() {
            return Err(AccumulatorError::CapacityExceeded {
                capacity: self.capacity(),
            });
        }

        let index = self.len();
        self.leaves.push(commitment);
        let root = self.recompute_path(index);
        self.record_root(Root(root));

        Ok(index)
    }

    /// Recompute hashes from a leaf up to the root.
    fn recompute_path(&mut self, leaf_index: u64) -> Fr {
        let mut current_index = leaf_index;
        let mut current_hash = self.node(0, leaf_index);

        for level in 0..self.depth {
            let sibling_hash = self.node(level, current_index ^ 1);

            current_hash = if current_index & 1 == 0 {
                hash_nodes(current_hash, sibling_hash)
            } else {
                hash_nodes(sibling_hash, current_hash)
            };
            current_index >>= 1;

            self.nodes.insert((level + 1, current_index), current_hash);
        }

        current_hash
    }

    fn node(&self, level: usize, index: u64) -> Fr {
        if level == 0 {
            return usize::try_from(index)
                .ok()
                .and_then(|i| self.leaves.get(i))
                .map(|c| c.0)
                .unwrap_or(self.zeros[0]);
        }
        self.nodes
            .get(&(level, index))
            .copied()
            .unwrap_or(self.zeros[level])
    }

    fn record_root(&mut self, root: Root) {
        self.root_history.push_back(root);
        while self.root_history.len() > self.root_history_size {
            self.root_history.pop_front();
        }
    }

    /// Sibling path for the leaf at `leaf_index`, taken against the current root.
    pub fn prove_membership(&self, leaf_index: u64) -> Result<MembershipProof, AccumulatorError> {
        if leaf_index >= self.len() {
            return Err(AccumulatorError::LeafNotFound {
                index: leaf_index,
                len: self.len(),
            });
        }

        let mut siblings = Vec::with_capacity(self.depth);
        let mut path_directions = Vec::with_capacity(self.depth);

        let mut current_index = leaf_index;
        for level in 0..self.depth {
            siblings.push(self.node(level, current_index ^ 1));
            path_directions.push(current_index & 1 == 1);
            current_index >>= 1;
        }

        Ok(MembershipProof {
            leaf_index,
            siblings,
            path_directions,
            root: self.current_root(),
        })
    }

    /// Replace the tree contents with `leaves` and return the new root.
    ///
    /// Hashes each level in parallel; the result is identical to inserting the
    /// leaves one by one. Root history restarts from the rebuilt root.
    pub fn rebuild(&mut self, leaves: &[Commitment]) -> Result<Root, AccumulatorError> {
        if leaves.len() as u64 > self.capacity() {
            return Err(AccumulatorError::CapacityExceeded {
                capacity: self.capacity(),
            });
        }
        if leaves.iter().any(Commitment::is_zero) {
            return Err(AccumulatorError::ZeroLeaf);
        }

        let mut nodes = HashMap::new();
        let mut level_hashes: Vec<Fr> = leaves.iter().map(|c| c.0).collect();

        for level in 0..self.depth {
            let zero = self.zeros[level];
            let parents: Vec<Fr> = level_hashes
                .par_chunks(2)
                .map(|pair| hash_nodes(pair[0], pair.get(1).copied().unwrap_or(zero)))
                .collect();

            nodes.extend(
                parents
                    .iter()
                    .enumerate()
                    .map(|(i, hash)| ((level + 1, i as u64), *hash)),
            );
            level_hashes = parents;
        }

        let root = Root(level_hashes.first().copied().unwrap_or(self.zeros[self.depth]));

        self.leaves = leaves.to_vec();
        self.nodes = nodes;
        self.root_history.clear();
        self.root_history.push_back(root);

        Ok(root)
    }

    /// The latest root.
    pub fn current_root(&self) -> Root {
        self.root_history
            .back()
            .copied()
            .unwrap_or(Root(self.zeros[self.depth]))
    }

    /// Whether `root` is the current root or one of the remembered recent roots.
    pub fn is_known_root(&self, root: &Root) -> bool {
        !root.0.is_zero() && self.root_history.iter().rev().any(|r| r == root)
    }

    /// Recent roots, oldest first.
    pub fn root_history(&self) -> impl Iterator<Item = &Root> + '_ {
        self.root_history.iter()
    }

    /// Root of an empty tree of this depth.
    pub fn empty_root(&self) -> Root {
        Root(self.zeros[self.depth])
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of leaf slots (`2^depth`).
    pub fn capacity(&self) -> u64 {
        1u64 << self.depth
    }

    /// Number of inserted leaves, i.e. the anonymity-set size.
    pub fn len(&self) -> u64 {
        self.leaves.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }

    pub fn leaf(&self, index: u64) -> Option<Commitment> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.leaves.get(i))
            .copied()
    }

    pub fn leaves(&self) -> &[Commitment] {
        &self.leaves
    }

    /// Empty-subtree hash at `level`.
    pub fn zero_at_level(&self, level: usize) -> Fr {
        self.zeros[level]
    }
}
