//! Sibling-path membership proofs.

use ark_bn254::Fr;

use super::accumulator::hash_nodes;
use crate::field::{Commitment, Root};

/// Authenticated path from a leaf to the root it was taken against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MembershipProof {
    /// Position of the proven leaf.
    pub leaf_index: u64,

    /// Sibling hashes from leaf level (0) up to level `depth - 1`.
    pub siblings: Vec<Fr>,

    /// Direction at each level: true = current node is the right child.
    pub path_directions: Vec<bool>,

    /// Root of the tree when the proof was produced.
    pub root: Root,
}

impl MembershipProof {
    pub fn depth(&self) -> usize {
        self.siblings.len()
    }

    /// Fold `leaf` up the sibling path.
    pub fn compute_root(&self, leaf: Commitment) -> Root {
        let mut current = leaf.0;

        for (sibling, &is_right) in self.siblings.iter().zip(self.path_directions.iter()) {
            current = if is_right {
                hash_nodes(*sibling, current)
            } else {
                hash_nodes(current, *sibling)
            };
        }

        Root(current)
    }

    /// Check that the directions spell out `leaf_index` bit by bit.
    pub fn directions_match_index(&self) -> bool {
        self.siblings.len() == self.path_directions.len()
            && self
                .path_directions
                .iter()
                .enumerate()
                .all(|(level, &is_right)| ((self.leaf_index >> level) & 1 == 1) == is_right)
    }

    /// Verify `leaf` against the root embedded in the proof.
    pub fn verify(&self, leaf: Commitment) -> bool {
        self.verify_against(leaf, &self.root)
    }

    /// Verify `leaf` against an externally supplied root.
    pub fn verify_against(&self, leaf: Commitment, root: &Root) -> bool {
        self.directions_match_index() && self.compute_root(leaf) == *root
    }
}

#[cfg(test)]
mod proof_tests {
    use super::*;

    fn proof(leaf_index: u64, directions: Vec<bool>) -> MembershipProof {
        MembershipProof {
            leaf_index,
            siblings: vec![Fr::from(1u64); directions.len()],
            path_directions: directions,
            root: Root::default(),
        }
    }

    #[test]
    fn test_directions_follow_index_bits() {
        assert!(proof(5, vec![true, false, true]).directions_match_index());
        assert!(!proof(4, vec![true, false, true]).directions_match_index());
    }

    #[test]
    fn test_compute_root_deterministic() {
        let p = proof(2, vec![false, true]);
        let leaf = Commitment(Fr::from(77u64));

        assert_eq!(p.compute_root(leaf), p.compute_root(leaf));
    }

    #[test]
    fn test_different_leaves_different_roots() {
        let p = proof(0, vec![false, false]);

        assert_ne!(
            p.compute_root(Commitment(Fr::from(1u64))),
            p.compute_root(Commitment(Fr::from(2u64)))
        );
    }
}
