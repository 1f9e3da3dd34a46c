// Copyright (C) 2023, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

//! The UTXO tree: the PATRICIA core instantiated with packed UTXO keys and
//! per-output counts, plus the Merkle overlay that turns it into a single
//! digest for block headers.
//!
//! Hashing is lazy. Mutations only dirty-mark the ancestors they touched;
//! [`UtxoTree::root_hash`] recomputes exactly the dirty subtrees and caches
//! the rest behind each joint's clean flag.

use std::io::{Read, Write};
use std::{fmt, io};

use thiserror::Error;

use crate::key::{UtxoKey, KEY_BYTES};
use crate::logger::debug;
use crate::proof::{Proof, ProofEntry};
use crate::trie::{Cursor, Insertion, Node, NodeId, RadixTree, TrieError};
use crate::trie_hash::{hash_pair, Hasher, TrieHash};

/// Errors surfaced by [`UtxoTree`] operations.
#[derive(Debug, Error)]
pub enum UtxoTreeError {
    /// Reading or writing the serialized form failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    /// A serialized stream carried keys out of ascending order. The tree is
    /// left holding the prefix that loaded before the violation; discard it.
    #[error("utxo keys out of order at entry {0}")]
    KeyOrder(u32),
    /// The node arena could not grow.
    #[error(transparent)]
    Trie(#[from] TrieError),
}

/// Payload of one UTXO leaf: how many identical outputs the key describes.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct UtxoValue {
    /// Number of outputs sharing this key.
    pub count: u64,
}

impl UtxoValue {
    /// `H(key_bytes || count)`, the whole description of the UTXO.
    fn hash(&self, key: &[u8]) -> TrieHash {
        let mut hasher = Hasher::new();
        hasher.update(key);
        hasher.update_u64(self.count);
        hasher.finalize()
    }
}

/// Authenticated in-memory set of unspent outputs.
///
/// Single-threaded; callers serialize access. Cursors produced by
/// [`UtxoTree::find`]/[`UtxoTree::insert`] drive deletion and proof
/// generation without a second root-to-leaf walk.
#[derive(Default, Debug)]
pub struct UtxoTree {
    tree: RadixTree<UtxoValue>,
}

impl UtxoTree {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact lookup. On a hit the cursor ends on the returned leaf; on a
    /// miss it ends on the deepest matching node.
    pub fn find(&self, cursor: &mut Cursor, key: &UtxoKey) -> Option<NodeId> {
        self.tree.find(cursor, key.as_ref(), UtxoKey::BITS)
    }

    /// Find-or-create the leaf for `key`. A created leaf starts at `value`;
    /// an existing leaf keeps its stored value.
    pub fn insert(
        &mut self,
        cursor: &mut Cursor,
        key: &UtxoKey,
        value: UtxoValue,
    ) -> Result<Insertion, TrieError> {
        self.tree.insert(cursor, key.as_ref(), UtxoKey::BITS, value)
    }

    /// Remove the leaf the cursor points at. The cursor is reset.
    pub fn delete(&mut self, cursor: &mut Cursor) {
        self.tree.delete(cursor);
    }

    /// Dirty-mark the cursor's path. Required before editing a found leaf's
    /// value through [`UtxoTree::value_mut`].
    pub fn invalidate(&mut self, cursor: &Cursor) {
        self.tree.invalidate(cursor);
    }

    /// Borrow the value stored at a leaf.
    pub fn value(&self, id: NodeId) -> &UtxoValue {
        self.tree.value(id)
    }

    /// Mutably borrow the value stored at a leaf; see
    /// [`UtxoTree::invalidate`].
    pub fn value_mut(&mut self, id: NodeId) -> &mut UtxoValue {
        self.tree.value_mut(id)
    }

    /// True when the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Number of distinct keys, counted by traversal.
    #[must_use]
    pub fn count(&self) -> usize {
        self.tree.count()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Iterate `(key, value)` pairs in ascending key order.
    pub fn entries(&self) -> impl Iterator<Item = (UtxoKey, UtxoValue)> + '_ {
        self.tree.leaves().map(|leaf| {
            let bytes: [u8; KEY_BYTES] = leaf
                .key()
                .try_into()
                .expect("utxo leaves carry full-width keys");
            (UtxoKey::from(bytes), *leaf.value())
        })
    }

    /// The digest committing to the whole set, [`TrieHash::ZERO`] when
    /// empty. Recomputes only subtrees dirtied since the last call.
    pub fn root_hash(&mut self) -> TrieHash {
        match self.tree.root() {
            Some(root) => self.node_hash(root),
            None => TrieHash::ZERO,
        }
    }

    fn node_hash(&mut self, id: NodeId) -> TrieHash {
        // leaves rehash every time; joints cache behind the clean flag
        if let Node::Leaf(leaf) = self.tree.node(id) {
            let hv = leaf.value().hash(leaf.key());
            self.tree.node_mut(id).set_clean(true);
            return hv;
        }

        let Node::Joint(joint) = self.tree.node(id) else {
            unreachable!()
        };
        if joint.clean {
            return joint.hash;
        }
        let [child0, child1] = joint.children;

        let hv = hash_pair(&self.node_hash(child0), &self.node_hash(child1));
        let Node::Joint(joint) = self.tree.node_mut(id) else {
            unreachable!()
        };
        joint.hash = hv;
        joint.clean = true;
        hv
    }

    /// Build the inclusion proof for the leaf the cursor points at, reusing
    /// the path recorded by the `find`/`insert` that produced the cursor.
    /// Entries run leaf to root; the root itself is not emitted.
    pub fn proof(&mut self, cursor: &Cursor) -> Proof {
        assert!(cursor.depth() > 0, "proof requires a cursor on a leaf");

        let mut proof = Proof::default();
        let mut prev = cursor.path[cursor.path.len() - 1];

        for &ancestor in cursor.path[..cursor.path.len() - 1].iter().rev() {
            let Node::Joint(joint) = self.tree.node(ancestor) else {
                unreachable!("interior path nodes are joints")
            };
            let sibling_on_right = joint.children[0] == prev;
            let sibling = joint.children[usize::from(sibling_on_right)];
            let hash = self.node_hash(sibling);
            proof.push(ProofEntry {
                sibling_on_right,
                sibling: hash,
            });
            prev = ancestor;
        }

        proof
    }

    /// Serialize the set: entry count, then each `(key, value)` pair in
    /// ascending key order. Wire integers are little-endian.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), io::Error> {
        let count = self.count() as u32;
        writer.write_all(&count.to_le_bytes())?;
        for leaf in self.tree.leaves() {
            writer.write_all(leaf.key())?;
            writer.write_all(&leaf.value().count.to_le_bytes())?;
        }
        Ok(())
    }

    /// Replace the set with the serialized form written by
    /// [`UtxoTree::write_to`]. Keys must arrive strictly ascending, which
    /// lets entries stream straight into the trie without sorting; any
    /// violation aborts the load with [`UtxoTreeError::KeyOrder`].
    pub fn read_from<R: Read>(&mut self, reader: &mut R) -> Result<(), UtxoTreeError> {
        self.clear();

        let mut word = [0u8; 4];
        reader.read_exact(&mut word)?;
        let count = u32::from_le_bytes(word);

        let mut cursor = Cursor::new();
        let mut prev: Option<UtxoKey> = None;
        for i in 0..count {
            let mut key_bytes = [0u8; KEY_BYTES];
            reader.read_exact(&mut key_bytes)?;
            let key = UtxoKey::from(key_bytes);
            if prev.is_some_and(|prev| prev >= key) {
                return Err(UtxoTreeError::KeyOrder(i));
            }

            let insertion = self.insert(&mut cursor, &key, UtxoValue::default())?;
            let mut value = [0u8; 8];
            reader.read_exact(&mut value)?;
            self.tree.value_mut(insertion.node).count = u64::from_le_bytes(value);

            prev = Some(key);
        }

        debug!("loaded {count} utxo entries");
        Ok(())
    }
}

impl fmt::Display for UtxoTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UtxoTree({} entries)", self.count())
    }
}
