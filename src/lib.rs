// Copyright (C) 2023, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.
#![warn(missing_debug_implementations, rust_2018_idioms, missing_docs)]
#![forbid(unsafe_code)]

//! # Coppice: an authenticated in-memory UTXO set
//!
//! Coppice holds the current set of unspent transaction outputs of a
//! UTXO-based chain and produces, on demand, a single digest committing to
//! the whole set. The digest is the root of a Merkle tree whose leaves are
//! the UTXO entries in key order, so light clients can check membership of
//! any output with a short sibling path.
//!
//! Two data structures do the work:
//!
//! - [`UtxoTree`], a bitwise PATRICIA trie over packed 41-byte keys
//!   ([`UtxoKey`]). Interior nodes cache their subtree hash behind a clean
//!   flag; mutations dirty-mark only the path they walked, so
//!   [`UtxoTree::root_hash`] recomputes exactly what changed. The [`Cursor`]
//!   recorded by a lookup drives deletion and proof generation without a
//!   second descent.
//! - [`Mmr`], an append-only Merkle Mountain Range for header commitments,
//!   delegating element storage to a pluggable [`MmrStore`].
//!
//! The engine is strictly single-threaded and performs no I/O of its own;
//! durability, validation and networking belong to the surrounding node.

mod key;
mod mmr;
mod proof;
mod trie;
mod trie_hash;
mod utxo;

/// Logger module for handling logging functionality
pub mod logger;

// re-export these so callers don't need to know where they are
pub use key::{UtxoKey, UtxoKeyFields, COMMITMENT_BYTES, KEY_BYTES};
pub use mmr::{MemStore, Mmr, MmrStore};
pub use proof::{Proof, ProofEntry};
pub use trie::{Cursor, Insertion, LeafNode, Leaves, NodeId, RadixTree, TrieError};
pub use trie_hash::{hash_pair, Hasher, TrieHash};
pub use utxo::{UtxoTree, UtxoTreeError, UtxoValue};
