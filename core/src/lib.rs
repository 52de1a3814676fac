//! Validation of membership and non-membership proofs for a binary
//! Merkle-Patricia map.
//!
//! This crate defines the proof schema of the map and a validator that checks
//! a single proof against an expected root hash, in a backend-agnostic manner.
//!
//! Nothing within this crate relies on the standard library.
//!
//! ## Schema
//!
//! The map is a binary radix trie keyed by 256-bit hashed keys, generalized
//! over a 256 bit hash function. Every node in the trie is addressed by a
//! [`DbKey`]: a fixed-width bit path plus a significant-bit count and a kind.
//! Leaf keys use all 256 bits; branch keys use a prefix of them, so a branch
//! may compress a run of single-child nodes into one prefix extension.
//!
//! A proof is a subtree of the map containing one full path from the root to
//! either the requested key's value, some other leaf, or a branch whose
//! subtrees provably cannot contain the requested key. Elided subtrees are
//! replaced by their hashes. The hash of an empty map is [`EMPTY_MAP_HASH`].
//!
//! ## Validation
//!
//! [`MapProofValidator`](validator::MapProofValidator) walks a [`MapProof`],
//! enforces the structural invariants of the proof tree, recomputes the root
//! hash with an injected [`HashFunction`](hasher::HashFunction), and
//! classifies the outcome as a [`Status`](validator::Status). On success it
//! exposes either the value mapped to the requested key or a definitive
//! absence verdict.

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod db_key;
pub mod hasher;
pub mod proof;
pub mod serializer;
pub mod tree_path;
pub mod validator;

pub use db_key::{DbKey, KeyKind};
pub use proof::{MapProof, MapProofNode};
pub use tree_path::TreePath;
pub use validator::{MapProofValidator, Status};

/// The size of a map key, in bytes. All keys are hashed to this width before
/// they index the map.
pub const KEY_SIZE: usize = 32;

/// The size of a map key, in bits. This is also the maximum depth of the trie.
pub const KEY_SIZE_BITS: usize = KEY_SIZE * 8;

/// The size of a digest produced by the injected hash function, in bytes.
pub const HASH_SIZE: usize = 32;

/// A digest produced by the injected hash function. In this schema, it is
/// always 256 bits.
pub type Digest = [u8; HASH_SIZE];

/// The root hash of an empty map. Concretely, a map with no entries hashes to
/// all zeros rather than to any digest the hash function can produce.
pub const EMPTY_MAP_HASH: Digest = [0u8; HASH_SIZE];
