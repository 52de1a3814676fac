//! The proof tree received from the storage engine.
//!
//! A proof is a pruned copy of the map: the single path relevant to the
//! requested key is materialized, and every subtree hanging off that path is
//! replaced by its hash. The node variants split in two tiers. Three variants
//! may only stand alone as a whole proof ([`MapProof::Empty`],
//! [`MapProof::EqualValueAtRoot`], [`MapProof::NonEqualValueAtRoot`]); the
//! remaining four ([`MapProofNode`]) form the inner tree and are the only
//! variants that may appear below another node. The type split makes a
//! root-only variant below the root unrepresentable.
//!
//! Proof trees are immutable and owned by the caller; validation borrows
//! them.

use crate::db_key::DbKey;
use crate::hasher::HashFunction;
use crate::serializer::ValueSerializer;
use crate::validator::MapProofValidator;
use crate::Digest;

use alloc::boxed::Box;
use alloc::vec::Vec;

/// A proof of membership or non-membership of one requested key.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "borsh",
    derive(borsh::BorshSerialize, borsh::BorshDeserialize)
)]
pub enum MapProof {
    /// The map is empty, hence the requested key is absent.
    Empty,
    /// The map holds exactly one entry, at the requested key.
    EqualValueAtRoot {
        /// The leaf key of the single entry. Must equal the requested key.
        key: DbKey,
        /// The serialized value of the single entry.
        value: Vec<u8>,
    },
    /// The map holds exactly one entry, at some other key, hence the
    /// requested key is absent.
    NonEqualValueAtRoot {
        /// The leaf key of the single entry. Must differ from the requested
        /// key.
        key: DbKey,
        /// The hash of the single entry's value.
        value_hash: Digest,
    },
    /// The map holds two or more entries; the root of the proof tree proper.
    Node(MapProofNode),
}

/// An inner node of a proof tree.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "borsh",
    derive(borsh::BorshSerialize, borsh::BorshDeserialize)
)]
pub enum MapProofNode {
    /// A branch whose left subtree continues the path to the requested key.
    /// The right subtree is elided.
    LeftBranch {
        /// The materialized left subtree.
        left: Box<MapProofNode>,
        /// The hash of the elided right subtree.
        right_hash: Digest,
        /// The key of the left child.
        left_key: DbKey,
        /// The key of the right child.
        right_key: DbKey,
    },
    /// A branch whose right subtree continues the path to the requested key.
    /// The left subtree is elided.
    RightBranch {
        /// The hash of the elided left subtree.
        left_hash: Digest,
        /// The materialized right subtree.
        right: Box<MapProofNode>,
        /// The key of the left child.
        left_key: DbKey,
        /// The key of the right child.
        right_key: DbKey,
    },
    /// A branch neither of whose children lie on the path to the requested
    /// key, witnessing that the key is absent from this entire subtree. Both
    /// children are elided.
    MappingNotFound {
        /// The hash of the elided left subtree.
        left_hash: Digest,
        /// The hash of the elided right subtree.
        right_hash: Digest,
        /// The key of the left child.
        left_key: DbKey,
        /// The key of the right child.
        right_key: DbKey,
    },
    /// The leaf holding the requested key's value.
    Leaf {
        /// The serialized value.
        value: Vec<u8>,
    },
}

impl MapProof {
    /// Have the given validator consume this proof.
    ///
    /// Equivalent to [`MapProofValidator::visit`] and subject to the same
    /// one-shot contract.
    pub fn accept<S, F>(&self, validator: &mut MapProofValidator<S, F>)
    where
        S: ValueSerializer,
        F: HashFunction,
    {
        validator.visit(self);
    }
}
