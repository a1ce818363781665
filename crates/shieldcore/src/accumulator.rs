//! Commitment accumulator.
//!
//! Shielded outputs are appended to an accumulator whose root is an
//! [`Anchor`]. Spend statements may claim that their commitment is a member
//! under some anchor by carrying a [`MerklePath`].
//!
//! The accumulator itself is an external collaborator behind
//! [`CommitmentAccumulator`]. [`MerkleAccumulator`] is an in-memory
//! reference implementation: a depth-[`MERKLE_DEPTH`] binary tree over
//! BLAKE2b-256.
//!
//! ```text
//! leaf  = BLAKE2b-256("Shield-MerkleLea", cm)
//! node  = BLAKE2b-256("Shield-MerkleNod", left || right)
//! empty = 0^32 at the leaves, node(empty, empty) above
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    commitment::Commitment,
    constants::{MERKLE_DEPTH, MERKLE_LEAF_PERSONALIZATION, MERKLE_NODE_PERSONALIZATION},
    primitives::Anchor,
};

/// Append-only set of commitments with membership proofs.
pub trait CommitmentAccumulator {
    /// Append `cm`, returning its leaf position, or `None` when full.
    fn insert(&mut self, cm: Commitment) -> Option<u64>;

    /// Authentication path for `cm` under the current [`root`](Self::root).
    fn membership_proof(&self, cm: &Commitment) -> Option<MerklePath>;

    /// The current anchor.
    fn root(&self) -> Anchor;
}

/// Authentication path from a leaf to an anchor.
///
/// `siblings[i]` is the sibling at height `i`; bit `i` of `position` says
/// whether the running node is the right child at that height.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct MerklePath {
    position: u64,
    siblings: Vec<[u8; 32]>,
}

impl MerklePath {
    /// Construct a path from raw parts. Shape is checked by
    /// [`root`](Self::root), not here.
    #[must_use]
    pub const fn new(position: u64, siblings: Vec<[u8; 32]>) -> Self {
        Self { position, siblings }
    }

    /// Leaf position.
    #[must_use]
    pub const fn position(&self) -> u64 {
        self.position
    }

    /// Sibling hashes, leaf level first.
    #[must_use]
    pub fn siblings(&self) -> &[[u8; 32]] {
        &self.siblings
    }

    /// Recompute the anchor reached from `cm`.
    ///
    /// `None` when the path does not have exactly [`MERKLE_DEPTH`] siblings
    /// or the position does not fit in the tree.
    #[must_use]
    pub fn root(&self, cm: &Commitment) -> Option<Anchor> {
        if self.siblings.len() != usize::from(MERKLE_DEPTH) || self.position >> MERKLE_DEPTH != 0 {
            return None;
        }
        let mut node = leaf_hash(cm);
        for (height, sibling) in self.siblings.iter().enumerate() {
            node = if (self.position >> height) & 1 == 0 {
                node_hash(&node, sibling)
            } else {
                node_hash(sibling, &node)
            };
        }
        Some(Anchor::from(node))
    }

    /// Whether the path leads from `cm` to `anchor`.
    #[must_use]
    pub fn leads_to(&self, cm: &Commitment, anchor: &Anchor) -> bool {
        self.root(cm).as_ref() == Some(anchor)
    }
}

fn leaf_hash(cm: &Commitment) -> [u8; 32] {
    digest(MERKLE_LEAF_PERSONALIZATION, &[&cm.to_bytes()])
}

fn node_hash(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    digest(MERKLE_NODE_PERSONALIZATION, &[left, right])
}

fn digest(personal: &[u8; 16], parts: &[&[u8; 32]]) -> [u8; 32] {
    let mut state = blake2b_simd::Params::new()
        .hash_length(32)
        .personal(personal)
        .to_state();
    for part in parts {
        state.update(part.as_slice());
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(state.finalize().as_bytes());
    out
}

// =============================================================================
// In-memory reference accumulator
// =============================================================================

/// In-memory incremental Merkle tree.
///
/// Every level is materialized, so membership proofs are lookups. Meant
/// for tests and single-process deployments; production accumulators live
/// behind [`CommitmentAccumulator`] in the storage layer.
#[derive(Clone, Debug)]
pub struct MerkleAccumulator {
    /// `levels[0]` are leaf hashes, `levels[MERKLE_DEPTH]` holds the root.
    levels: Vec<Vec<[u8; 32]>>,
    /// Root of an empty subtree at each height.
    empty: Vec<[u8; 32]>,
    positions: HashMap<Commitment, u64>,
}

impl Default for MerkleAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl MerkleAccumulator {
    /// An empty tree.
    #[must_use]
    pub fn new() -> Self {
        let height = usize::from(MERKLE_DEPTH);
        let mut empty = Vec::with_capacity(height + 1);
        let mut node = [0u8; 32];
        empty.push(node);
        for _ in 0..height {
            node = node_hash(&node, &node);
            empty.push(node);
        }
        Self {
            levels: vec![Vec::new(); height + 1],
            empty,
            positions: HashMap::new(),
        }
    }

    /// Number of leaves appended.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    /// Whether no leaf has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sibling(&self, height: usize, index: usize) -> Option<[u8; 32]> {
        let empty = self.empty.get(height).copied()?;
        Some(
            self.levels
                .get(height)?
                .get(index ^ 1)
                .copied()
                .unwrap_or(empty),
        )
    }
}

impl CommitmentAccumulator for MerkleAccumulator {
    fn insert(&mut self, cm: Commitment) -> Option<u64> {
        let position = u64::try_from(self.len()).ok()?;
        if position >> MERKLE_DEPTH != 0 {
            return None;
        }

        let mut node = leaf_hash(&cm);
        let mut index = self.len();
        for height in 0..=usize::from(MERKLE_DEPTH) {
            let sibling = self.sibling(height, index)?;
            let nodes = self.levels.get_mut(height)?;
            match nodes.get_mut(index) {
                Some(slot) => *slot = node,
                None => nodes.push(node),
            }
            node = if index & 1 == 0 {
                node_hash(&node, &sibling)
            } else {
                node_hash(&sibling, &node)
            };
            index >>= 1;
        }

        self.positions.entry(cm).or_insert(position);
        Some(position)
    }

    fn membership_proof(&self, cm: &Commitment) -> Option<MerklePath> {
        let position = *self.positions.get(cm)?;
        let mut index = usize::try_from(position).ok()?;
        let mut siblings = Vec::with_capacity(usize::from(MERKLE_DEPTH));
        for height in 0..usize::from(MERKLE_DEPTH) {
            siblings.push(self.sibling(height, index)?);
            index >>= 1;
        }
        Some(MerklePath::new(position, siblings))
    }

    fn root(&self) -> Anchor {
        let top = usize::from(MERKLE_DEPTH);
        self.levels
            .get(top)
            .and_then(|nodes| nodes.first())
            .or_else(|| self.empty.get(top))
            .copied()
            .map_or(Anchor::from([0u8; 32]), Anchor::from)
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng as _, rngs::StdRng};

    use super::*;
    use crate::{keys::OwnerSecret, params::Params, value::Blinding};

    fn commitments(count: usize, seed: u64) -> Vec<Commitment> {
        let mut rng = StdRng::seed_from_u64(seed);
        let params = Params::derive();
        let owner = OwnerSecret::random(&mut rng);
        (0..count)
            .map(|_| Commitment::commit(&params, 1, &owner, &Blinding::random(&mut rng)).unwrap())
            .collect()
    }

    #[test]
    fn positions_are_sequential() {
        let mut acc = MerkleAccumulator::new();
        for (expected, cm) in (0u64..).zip(commitments(5, 20)) {
            assert_eq!(acc.insert(cm), Some(expected), "append-only positions");
        }
        assert_eq!(acc.len(), 5, "five leaves");
    }

    #[test]
    fn every_member_leads_to_the_root() {
        let mut acc = MerkleAccumulator::new();
        let cms = commitments(7, 21);
        for cm in &cms {
            acc.insert(*cm).unwrap();
        }
        let root = acc.root();
        for cm in &cms {
            let path = acc.membership_proof(cm).unwrap();
            assert!(path.leads_to(cm, &root), "member at {} verifies", path.position());
        }
    }

    #[test]
    fn root_changes_on_insert() {
        let mut acc = MerkleAccumulator::new();
        let empty_root = acc.root();
        let cms = commitments(2, 22);
        acc.insert(cms[0]).unwrap();
        let one = acc.root();
        acc.insert(cms[1]).unwrap();
        assert_ne!(empty_root, one, "first insert moves the root");
        assert_ne!(one, acc.root(), "second insert moves the root");
    }

    /// A member stays provable under later anchors.
    #[test]
    fn membership_survives_appends() {
        let mut acc = MerkleAccumulator::new();
        let cms = commitments(4, 23);
        acc.insert(cms[0]).unwrap();
        let early = acc.membership_proof(&cms[0]).unwrap();
        let early_root = acc.root();
        for cm in &cms[1..] {
            acc.insert(*cm).unwrap();
        }
        assert!(early.leads_to(&cms[0], &early_root), "old path, old anchor");
        let late = acc.membership_proof(&cms[0]).unwrap();
        assert!(late.leads_to(&cms[0], &acc.root()), "new path, new anchor");
    }

    #[test]
    fn wrong_leaf_or_tampered_path_fails() {
        let mut acc = MerkleAccumulator::new();
        let cms = commitments(3, 24);
        for cm in &cms[..2] {
            acc.insert(*cm).unwrap();
        }
        let root = acc.root();
        let path = acc.membership_proof(&cms[0]).unwrap();
        assert!(!path.leads_to(&cms[2], &root), "non-member");
        assert!(acc.membership_proof(&cms[2]).is_none(), "no proof for non-member");

        let mut siblings = path.siblings().to_vec();
        siblings[0][0] ^= 1;
        let tampered = MerklePath::new(path.position(), siblings);
        assert!(!tampered.leads_to(&cms[0], &root), "tampered sibling");

        let short = MerklePath::new(0, path.siblings()[1..].to_vec());
        assert!(short.root(&cms[0]).is_none(), "wrong depth");
        let far = MerklePath::new(1 << MERKLE_DEPTH, path.siblings().to_vec());
        assert!(far.root(&cms[0]).is_none(), "position beyond capacity");
    }
}
