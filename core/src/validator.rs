//! The proof validator state machine.
//!
//! A [`MapProofValidator`] is a one-shot machine: it is constructed for one
//! (expected root hash, requested key) pair, consumes exactly one proof tree,
//! and is read-only afterwards. Walking the tree it enforces the structural
//! invariants of the proof, recomputes the root hash bottom-up, and
//! classifies the outcome as a [`Status`].
//!
//! Two failure regimes are kept apart. Data-dependent proof defects set a
//! non-[`Valid`](Status::Valid) status and short-circuit the walk; callers
//! observe them through [`is_valid`](MapProofValidator::is_valid) and
//! [`status`](MapProofValidator::status). Violations of the usage contract
//! (consuming a second proof, reading the value of an invalid proof,
//! malformed value bytes from a broken producer) panic.

use crate::db_key::{DbKey, KeyKind};
use crate::hasher::{hash_branch_node, hash_leaf_node, HashFunction};
use crate::proof::{MapProof, MapProofNode};
use crate::serializer::ValueSerializer;
use crate::tree_path::TreePath;
use crate::{Digest, EMPTY_MAP_HASH, KEY_SIZE, KEY_SIZE_BITS};

use alloc::format;
use alloc::string::String;
use bitvec::{order::Lsb0, view::BitView};
use core::fmt;

/// Whether validators check the structural consistency of branch keys by
/// default: that the children of a branch are the 0- and 1-successors of the
/// prefix at the branch's position, and that the descent stays on the path to
/// the requested key.
///
/// When disabled, those defects are only caught indirectly, by the recomputed
/// root hash failing to match. [`MapProofValidator::with_correctness_checks`]
/// overrides the default per instance.
pub const PERFORM_TREE_CORRECTNESS_CHECKS: bool = true;

/// Classification of a consumed proof.
///
/// The names printed by the `Display` impl (`NOT_VISITED`, `VALID`, …) are a
/// stable surface: they appear in the panic message of
/// [`MapProofValidator::value`] and callers may match on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// No proof has been consumed yet.
    NotVisited,
    /// The proof is structurally correct. The proof as a whole is only valid
    /// if the recomputed root hash also matches the expected one.
    Valid,
    /// A root variant carries a key that is not a leaf key, or one that
    /// relates to the requested key the wrong way for its variant.
    InvalidDbKeyOfRootNode,
    /// A branch node appears at full key depth, where only leaves can live.
    InvalidBranchNodeDepth,
    /// The path through the proof tree is inconsistent with its branch keys,
    /// or does not lead to the requested key.
    InvalidPathToNode,
    /// An absence witness is inconclusive: one of its subtrees may still
    /// contain the requested key.
    MayContainRequestedValueInSubtrees,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::NotVisited => "NOT_VISITED",
            Status::Valid => "VALID",
            Status::InvalidDbKeyOfRootNode => "INVALID_DB_KEY_OF_ROOT_NODE",
            Status::InvalidBranchNodeDepth => "INVALID_BRANCH_NODE_DEPTH",
            Status::InvalidPathToNode => "INVALID_PATH_TO_NODE",
            Status::MayContainRequestedValueInSubtrees => {
                "MAY_CONTAIN_REQUESTED_VALUE_IN_SUBTREES"
            }
        };
        f.write_str(name)
    }
}

/// Validator of a single map proof against an expected root hash.
pub struct MapProofValidator<S: ValueSerializer, F: HashFunction> {
    expected_root_hash: Digest,
    key: [u8; KEY_SIZE],
    serializer: S,
    hash_function: F,
    perform_checks: bool,

    status: Status,
    path: TreePath,
    value: Option<S::Value>,
    computed_root: Option<Digest>,
}

impl<S: ValueSerializer, F: HashFunction> MapProofValidator<S, F> {
    /// Create a validator for a proof about `key` in the map whose root hash
    /// is `expected_root_hash`, with structural checks at their default
    /// ([`PERFORM_TREE_CORRECTNESS_CHECKS`]).
    pub fn new(
        expected_root_hash: Digest,
        key: [u8; KEY_SIZE],
        serializer: S,
        hash_function: F,
    ) -> Self {
        Self::with_correctness_checks(
            expected_root_hash,
            key,
            serializer,
            hash_function,
            PERFORM_TREE_CORRECTNESS_CHECKS,
        )
    }

    /// Create a validator with an explicit structural-checks setting.
    pub fn with_correctness_checks(
        expected_root_hash: Digest,
        key: [u8; KEY_SIZE],
        serializer: S,
        hash_function: F,
        perform_checks: bool,
    ) -> Self {
        MapProofValidator {
            expected_root_hash,
            key,
            serializer,
            hash_function,
            perform_checks,
            status: Status::NotVisited,
            path: TreePath::new(),
            value: None,
            computed_root: None,
        }
    }

    /// Consume a proof. May be called exactly once per validator; a second
    /// call panics.
    pub fn visit(&mut self, proof: &MapProof) {
        assert!(
            self.status == Status::NotVisited,
            "a map proof validator consumes exactly one proof",
        );
        match proof {
            MapProof::Empty => self.visit_empty_map(),
            MapProof::EqualValueAtRoot { key, value } => {
                self.visit_equal_value_at_root(key, value)
            }
            MapProof::NonEqualValueAtRoot { key, value_hash } => {
                self.visit_non_equal_value_at_root(key, value_hash)
            }
            MapProof::Node(node) => self.visit_node(node, None),
        }
    }

    /// Whether the consumed proof is structurally correct *and* recomputes to
    /// the expected root hash.
    pub fn is_valid(&self) -> bool {
        self.status == Status::Valid && self.computed_root.as_ref() == Some(&self.expected_root_hash)
    }

    /// The structural classification of the consumed proof.
    ///
    /// Note that [`Status::Valid`] alone does not make the proof valid: the
    /// recomputed root hash must also match. Comparing [`status`](Self::status)
    /// and [`is_valid`](Self::is_valid) tells a structural defect apart from
    /// a root hash mismatch.
    pub fn status(&self) -> Status {
        self.status
    }

    /// The requested key this validator proves a fact about.
    pub fn key(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }

    /// The root hash the proof is validated against.
    pub fn expected_root_hash(&self) -> &Digest {
        &self.expected_root_hash
    }

    /// The root hash recomputed from the proof, if the walk got far enough to
    /// produce one.
    pub fn computed_root_hash(&self) -> Option<&Digest> {
        self.computed_root.as_ref()
    }

    /// The value the proof associates with the requested key: `Some` for a
    /// membership proof, `None` for a proven absence.
    ///
    /// Panics if the proof is not valid. The message names the status and
    /// both hashes, so a structurally correct proof failing only on the root
    /// hash reports `status=VALID` with the differing hashes.
    pub fn value(&self) -> Option<&S::Value> {
        self.check_valid();
        self.value.as_ref()
    }

    /// Consume the validator and take ownership of the value, with the same
    /// contract as [`value`](Self::value).
    pub fn into_value(self) -> Option<S::Value> {
        self.check_valid();
        self.value
    }

    fn check_valid(&self) {
        if !self.is_valid() {
            let computed = match &self.computed_root {
                Some(hash) => format!("0x{}", hex::encode(hash)),
                None => String::from("none"),
            };
            panic!(
                "Proof is not valid: expected root hash 0x{}, computed root hash {}, status={}",
                hex::encode(self.expected_root_hash),
                computed,
                self.status,
            );
        }
    }

    fn visit_empty_map(&mut self) {
        self.computed_root = Some(EMPTY_MAP_HASH);
        self.status = Status::Valid;
    }

    fn visit_equal_value_at_root(&mut self, key: &DbKey, value_bytes: &[u8]) {
        if key.kind() != KeyKind::Leaf || key.raw_key() != &self.key {
            self.status = Status::InvalidDbKeyOfRootNode;
            return;
        }
        let value_hash = self.hash_function.hash_bytes(value_bytes);
        self.computed_root = Some(hash_leaf_node(&self.hash_function, key, &value_hash));
        self.value = Some(self.decode_value(value_bytes));
        self.status = Status::Valid;
    }

    fn visit_non_equal_value_at_root(&mut self, key: &DbKey, value_hash: &Digest) {
        if key.kind() != KeyKind::Leaf || key.raw_key() == &self.key {
            self.status = Status::InvalidDbKeyOfRootNode;
            return;
        }
        self.computed_root = Some(hash_leaf_node(&self.hash_function, key, value_hash));
        self.status = Status::Valid;
    }

    /// Walk one node. `parent_key` is the child key the enclosing branch
    /// stored for this subtree; `None` at the root of the proof tree.
    fn visit_node(&mut self, node: &MapProofNode, parent_key: Option<&DbKey>) {
        match node {
            MapProofNode::LeftBranch {
                left,
                right_hash,
                left_key,
                right_key,
            } => self.visit_left_branch(left, right_hash, left_key, right_key),
            MapProofNode::RightBranch {
                left_hash,
                right,
                left_key,
                right_key,
            } => self.visit_right_branch(left_hash, right, left_key, right_key),
            MapProofNode::MappingNotFound {
                left_hash,
                right_hash,
                left_key,
                right_key,
            } => self.visit_mapping_not_found(left_hash, right_hash, left_key, right_key),
            MapProofNode::Leaf { value } => self.visit_leaf(value, parent_key),
        }
    }

    fn visit_left_branch(
        &mut self,
        left: &MapProofNode,
        right_hash: &Digest,
        left_key: &DbKey,
        right_key: &DbKey,
    ) {
        if !self.enter_branch(left_key, right_key) {
            return;
        }
        if self.perform_checks && !left_key.is_prefix_of(&self.key) {
            self.status = Status::InvalidPathToNode;
            return;
        }
        let anchor = self.path.len();
        self.descend(left_key);
        self.visit_node(left, Some(left_key));
        self.path.truncate(anchor);
        if self.status != Status::Valid {
            return;
        }
        // unwrap: the computed hash is always set once the status is VALID.
        let left_hash = self.computed_root.unwrap();
        self.computed_root = Some(hash_branch_node(
            &self.hash_function,
            &left_hash,
            right_hash,
            left_key,
            right_key,
        ));
    }

    fn visit_right_branch(
        &mut self,
        left_hash: &Digest,
        right: &MapProofNode,
        left_key: &DbKey,
        right_key: &DbKey,
    ) {
        if !self.enter_branch(left_key, right_key) {
            return;
        }
        if self.perform_checks && !right_key.is_prefix_of(&self.key) {
            self.status = Status::InvalidPathToNode;
            return;
        }
        let anchor = self.path.len();
        self.descend(right_key);
        self.visit_node(right, Some(right_key));
        self.path.truncate(anchor);
        if self.status != Status::Valid {
            return;
        }
        // unwrap: the computed hash is always set once the status is VALID.
        let right_hash_computed = self.computed_root.unwrap();
        self.computed_root = Some(hash_branch_node(
            &self.hash_function,
            left_hash,
            &right_hash_computed,
            left_key,
            right_key,
        ));
    }

    fn visit_mapping_not_found(
        &mut self,
        left_hash: &Digest,
        right_hash: &Digest,
        left_key: &DbKey,
        right_key: &DbKey,
    ) {
        if !self.enter_branch(left_key, right_key) {
            return;
        }
        // The witness is conclusive only if neither child covers the
        // requested key. This is the semantic core of the absence proof and
        // is checked regardless of the structural-checks setting.
        if left_key.is_prefix_of(&self.key) || right_key.is_prefix_of(&self.key) {
            self.status = Status::MayContainRequestedValueInSubtrees;
            return;
        }
        self.computed_root = Some(hash_branch_node(
            &self.hash_function,
            left_hash,
            right_hash,
            left_key,
            right_key,
        ));
        self.status = Status::Valid;
    }

    fn visit_leaf(&mut self, value_bytes: &[u8], parent_key: Option<&DbKey>) {
        // A single-entry map proves membership with a root variant.
        let Some(leaf_key) = parent_key else {
            self.status = Status::InvalidPathToNode;
            return;
        };
        // The key that selected this node must be a leaf key for the
        // requested key. A branch key of full length descends the same way
        // but authenticates nothing, so the kind is checked regardless of
        // the structural-checks setting.
        if leaf_key.kind() != KeyKind::Leaf || leaf_key.raw_key() != &self.key {
            self.status = Status::InvalidPathToNode;
            return;
        }
        if self.path.bits() != self.key.view_bits::<Lsb0>() {
            self.status = Status::InvalidPathToNode;
            return;
        }
        let value_hash = self.hash_function.hash_bytes(value_bytes);
        self.computed_root = Some(hash_leaf_node(&self.hash_function, leaf_key, &value_hash));
        self.value = Some(self.decode_value(value_bytes));
        self.status = Status::Valid;
    }

    /// Shared entry handling of the three branch variants: the depth bound
    /// and the structural consistency of the child keys.
    fn enter_branch(&mut self, left_key: &DbKey, right_key: &DbKey) -> bool {
        if self.path.len() >= KEY_SIZE_BITS {
            self.status = Status::InvalidBranchNodeDepth;
            return false;
        }
        if self.perform_checks && !self.branch_keys_are_consistent(left_key, right_key) {
            self.status = Status::InvalidPathToNode;
            return false;
        }
        true
    }

    /// Both child keys must extend the current prefix: each starts with the
    /// accumulated path, continues with its side's bit, and is longer than
    /// the path (a branch may extend it by more than one bit, which is how
    /// prefix compression shows up in proofs).
    fn branch_keys_are_consistent(&self, left_key: &DbKey, right_key: &DbKey) -> bool {
        let depth = self.path.len();
        left_key.num_significant_bits() > depth
            && right_key.num_significant_bits() > depth
            && !left_key.bit(depth)
            && right_key.bit(depth)
            && left_key.significant_bits()[..depth] == *self.path.bits()
            && right_key.significant_bits()[..depth] == *self.path.bits()
    }

    /// Append the bits of `child_key` beyond the current path length.
    fn descend(&mut self, child_key: &DbKey) {
        for i in self.path.len()..child_key.num_significant_bits() {
            if child_key.bit(i) {
                self.path.go_right();
            } else {
                self.path.go_left();
            }
        }
    }

    fn decode_value(&self, bytes: &[u8]) -> S::Value {
        match self.serializer.from_bytes(bytes) {
            Ok(value) => value,
            // A correct producer only emits bytes it serialized itself.
            Err(e) => panic!("proof carries malformed value bytes: {}", e),
        }
    }
}

impl<S: ValueSerializer, F: HashFunction> fmt::Debug for MapProofValidator<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MapProofValidator(key=0x{}, expected_root_hash=0x{}, status={}, depth={})",
            hex::encode(self.key),
            hex::encode(self.expected_root_hash),
            self.status,
            self.path.len(),
        )
    }
}
