//! # Layered Merkle Cache
//!
//! A binary hash tree kept as explicit layers so that a single leaf change
//! only rehashes its branch.
//!
//! ```text
//! layer 2:            [root]
//! layer 1:     [p0 = H(l0||l1)]  [p1 = H(l2||Z0)]
//! layer 0:   [l0]    [l1]       [l2]
//! ```
//!
//! ## Layout
//!
//! - Layer 0 holds one hash per leaf, index-aligned.
//! - Layer `k + 1` has `ceil(len(layer k) / 2)` entries; the last layer has one.
//! - Pairs are `(2i, 2i + 1)`: the even index is the left child.
//! - A missing right sibling at layer `k` reads as `ZERO_HASHES[k]`, the root
//!   of an empty depth-`k` subtree. At layer 0 this is the 32-byte zero chunk.
//!   The root therefore equals the SSZ merkleization of the leaves padded to
//!   the next power of two.
//!
//! ## Complexity
//!
//! `update_leaf` performs `depth` hash operations, versus `leaf_count - 1` for
//! a rebuild.

use super::ssz::{hash_pair, ZERO_HASHES};
use super::{Hash, StateError, ZERO_HASH};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleCache {
    layers: Vec<Vec<Hash>>,
}

impl MerkleCache {
    /// Build every layer bottom-up.
    ///
    /// An empty leaf set is treated as a single zero leaf.
    pub fn new(leaves: Vec<Hash>) -> Self {
        let leaves = if leaves.is_empty() {
            vec![ZERO_HASH]
        } else {
            leaves
        };

        let mut layers = vec![leaves];
        let mut level = 0;
        while layers[level].len() > 1 {
            let parents: Vec<Hash> = layers[level]
                .chunks(2)
                .map(|pair| {
                    let right = pair.get(1).unwrap_or(&ZERO_HASHES[level]);
                    hash_pair(&pair[0], right)
                })
                .collect();
            layers.push(parents);
            level += 1;
        }

        Self { layers }
    }

    pub fn root(&self) -> Hash {
        self.layers[self.layers.len() - 1][0]
    }

    pub fn leaf(&self, index: usize) -> Option<Hash> {
        self.layers[0].get(index).copied()
    }

    pub fn leaves(&self) -> &[Hash] {
        &self.layers[0]
    }

    pub fn leaf_count(&self) -> usize {
        self.layers[0].len()
    }

    /// Number of layers above the leaves.
    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    pub fn layers(&self) -> &[Vec<Hash>] {
        &self.layers
    }

    fn check_index(&self, index: usize) -> Result<(), StateError> {
        if index >= self.leaf_count() {
            return Err(StateError::LeafIndexOutOfRange {
                index,
                leaf_count: self.leaf_count(),
            });
        }
        Ok(())
    }

    /// Replace one leaf and recompute its branch up to the root.
    pub fn update_leaf(&mut self, index: usize, leaf: Hash) -> Result<(), StateError> {
        self.check_index(index)?;
        self.layers[0][index] = leaf;
        self.recompute_from(index);
        Ok(())
    }

    /// Replace several leaves, rehashing each affected ancestor once.
    ///
    /// All indices are checked before any leaf is written. When an index
    /// repeats, the last hash wins.
    pub fn update_leaves(&mut self, updates: &[(usize, Hash)]) -> Result<(), StateError> {
        for (index, _) in updates {
            self.check_index(*index)?;
        }
        if updates.is_empty() {
            return Ok(());
        }

        let mut dirty: Vec<usize> = Vec::with_capacity(updates.len());
        for (index, leaf) in updates {
            self.layers[0][*index] = *leaf;
            dirty.push(*index);
        }

        for level in 0..self.depth() {
            let mut parents: Vec<usize> = dirty.iter().map(|index| index / 2).collect();
            parents.sort_unstable();
            parents.dedup();

            for &parent in &parents {
                let left = self.layers[level][2 * parent];
                let right = self
                    .layers[level]
                    .get(2 * parent + 1)
                    .copied()
                    .unwrap_or(ZERO_HASHES[level]);
                self.layers[level + 1][parent] = hash_pair(&left, &right);
            }
            dirty = parents;
        }
        Ok(())
    }

    /// Recompute the ancestors of `index`, assuming layer 0 is current.
    fn recompute_from(&mut self, index: usize) {
        let mut current = index;
        let mut node = self.layers[0][index];

        for level in 0..self.depth() {
            let sibling = self.layers[level]
                .get(current ^ 1)
                .copied()
                .unwrap_or(ZERO_HASHES[level]);

            node = if current % 2 == 0 {
                hash_pair(&node, &sibling)
            } else {
                hash_pair(&sibling, &node)
            };

            current /= 2;
            self.layers[level + 1][current] = node;
        }
    }

    /// Sibling branch proving the leaf at `index` against the current root.
    pub fn proof(&self, index: usize) -> Result<FieldProof, StateError> {
        self.check_index(index)?;

        let mut branch = Vec::with_capacity(self.depth());
        let mut current = index;
        for level in 0..self.depth() {
            let sibling = self.layers[level]
                .get(current ^ 1)
                .copied()
                .unwrap_or(ZERO_HASHES[level]);
            branch.push(sibling);
            current /= 2;
        }

        Ok(FieldProof {
            index,
            leaf: self.layers[0][index],
            branch,
        })
    }
}

/// Inclusion proof of a single leaf.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldProof {
    /// Leaf position in layer 0.
    pub index: usize,
    pub leaf: Hash,
    /// Sibling hashes from the leaf layer upward.
    pub branch: Vec<Hash>,
}

impl FieldProof {
    /// Position of the leaf in the padded tree, counting the root as 1.
    pub fn generalized_index(&self) -> u64 {
        (1u64 << self.branch.len()) | self.index as u64
    }

    pub fn compute_root(&self) -> Hash {
        let mut node = self.leaf;
        let mut current = self.index;
        for sibling in &self.branch {
            node = if current % 2 == 0 {
                hash_pair(&node, sibling)
            } else {
                hash_pair(sibling, &node)
            };
            current /= 2;
        }
        node
    }

    pub fn verify(&self, root: &Hash) -> bool {
        self.compute_root() == *root
    }
}
