//! # Graph Store
//!
//! The deterministic graph storage for SignalGraph.
//!
//! All data structures use `BTreeMap` for deterministic ordering.
//! No `HashMap` allowed. Identity of every node and edge is a pure
//! function of normalized content, never of arrival order, so the same
//! facts produce the same store regardless of merge order.

use crate::provenance::ProvenanceSet;
use crate::types::{Confidence, EntityKind, NodeId, RelationLabel, SignalGraphError, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// LABEL SOURCE
// =============================================================================

/// Which extraction event chose a node's display label.
///
/// Persisted so that label resolution stays order-independent: whatever
/// order candidates arrive in, the label is the surface form of the
/// highest-confidence extraction, tie-broken by earliest file path then
/// earliest span start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSource {
    pub confidence: Confidence,
    pub file: String,
    pub span_start: u64,
}

impl LabelSource {
    /// Create a new label source.
    #[must_use]
    pub fn new(confidence: Confidence, file: impl Into<String>, span_start: u64) -> Self {
        Self {
            confidence,
            file: file.into(),
            span_start,
        }
    }

    /// Whether this source wins the display-label policy against `other`.
    ///
    /// Higher confidence wins; ties go to the earliest (file, span start).
    #[must_use]
    pub fn outranks(&self, other: &Self) -> bool {
        if self.confidence != other.confidence {
            return self.confidence > other.confidence;
        }
        (self.file.as_str(), self.span_start) < (other.file.as_str(), other.span_start)
    }
}

// =============================================================================
// NODE
// =============================================================================

/// A node in the knowledge graph: one entity with full provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Content-derived identifier (`kind-tag:normalized-text`).
    pub id: NodeId,
    /// Display string: the winning surface form under the label policy.
    pub label: String,
    /// Entity kind; part of the node's identity.
    pub kind: EntityKind,
    /// The extraction that chose the current label.
    pub label_source: LabelSource,
    /// Every extraction event that produced or confirmed this node.
    pub provenance: ProvenanceSet,
}

// =============================================================================
// EDGE
// =============================================================================

/// Edge identity: (source, target, label). Duplicate extractions of the
/// same triple merge provenance instead of creating a new edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    pub source: NodeId,
    pub target: NodeId,
    pub label: RelationLabel,
}

impl EdgeKey {
    /// Create a directed edge key.
    #[must_use]
    pub fn new(source: NodeId, target: NodeId, label: RelationLabel) -> Self {
        Self {
            source,
            target,
            label,
        }
    }

    /// Create a key for an undirected relation: endpoints are normalized
    /// to ascending id order so either observed direction yields the same
    /// identity.
    #[must_use]
    pub fn symmetric(a: NodeId, b: NodeId, label: RelationLabel) -> Self {
        if a <= b {
            Self::new(a, b, label)
        } else {
            Self::new(b, a, label)
        }
    }
}

/// Edge payload: direction semantics plus provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// True when the stored direction is arbitrary (undirected relation).
    pub symmetric: bool,
    /// Every extraction event that produced or confirmed this edge.
    pub provenance: ProvenanceSet,
}

// =============================================================================
// METADATA
// =============================================================================

/// Store-level metadata: build timestamps and contributing source files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GraphMetadata {
    /// Set on the first merge that changes content; never updated after.
    pub created_at: Option<Timestamp>,
    /// Timestamp of the most recent content-changing merge. A merge that
    /// changes nothing leaves this untouched, which is what keeps
    /// repeated runs over unchanged inputs byte-identical on export.
    pub last_updated: Option<Timestamp>,
    /// Source path -> checksum at last successful merge.
    pub source_files: BTreeMap<String, String>,
}

// =============================================================================
// GRAPH STORE
// =============================================================================

/// The aggregate graph value.
///
/// Created empty or loaded from a prior export; mutated only by the
/// merge engine; exported as an immutable snapshot; consumed read-only
/// by the insights engine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GraphStore {
    nodes: BTreeMap<NodeId, Node>,
    edges: BTreeMap<EdgeKey, Edge>,
    metadata: GraphMetadata,
}

impl GraphStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Total number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether a node exists.
    #[must_use]
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Lookup a node by id.
    #[must_use]
    pub fn get_node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Lookup an edge by identity key.
    #[must_use]
    pub fn get_edge(&self, key: &EdgeKey) -> Option<&Edge> {
        self.edges.get(key)
    }

    /// Iterate nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Iterate edges in (source, target, label) order.
    pub fn edges(&self) -> impl Iterator<Item = (&EdgeKey, &Edge)> {
        self.edges.iter()
    }

    /// Store metadata.
    #[must_use]
    pub fn metadata(&self) -> &GraphMetadata {
        &self.metadata
    }

    // =========================================================================
    // MUTATORS (merge engine and importers only)
    // =========================================================================

    /// Insert a node record. Overwrites any node with the same id; the
    /// merge engine is responsible for provenance union before calling.
    pub fn put_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Mutable access to an existing node.
    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Insert an edge record. Both endpoints must already exist; a
    /// dangling edge is a consistency violation, not a silent skip.
    pub fn put_edge(&mut self, key: EdgeKey, edge: Edge) -> Result<(), SignalGraphError> {
        if !self.nodes.contains_key(&key.source) {
            return Err(SignalGraphError::Consistency(format!(
                "edge {} -[{}]-> {} references missing source node",
                key.source.as_str(),
                key.label.as_str(),
                key.target.as_str()
            )));
        }
        if !self.nodes.contains_key(&key.target) {
            return Err(SignalGraphError::Consistency(format!(
                "edge {} -[{}]-> {} references missing target node",
                key.source.as_str(),
                key.label.as_str(),
                key.target.as_str()
            )));
        }
        self.edges.insert(key, edge);
        Ok(())
    }

    /// Mutable access to an existing edge.
    pub fn edge_mut(&mut self, key: &EdgeKey) -> Option<&mut Edge> {
        self.edges.get_mut(key)
    }

    /// Whether the recorded checksum for a source file matches.
    ///
    /// Orchestration uses this for skip-if-unchanged; the merge engine
    /// itself is safe to call redundantly either way.
    #[must_use]
    pub fn is_file_current(&self, path: &str, checksum: &str) -> bool {
        self.metadata
            .source_files
            .get(path)
            .is_some_and(|recorded| recorded == checksum)
    }

    /// Record a contributing source file. Returns `true` if the metadata
    /// changed (new file, or same file with a new checksum).
    pub fn record_source_file(&mut self, path: &str, checksum: &str) -> bool {
        match self.metadata.source_files.get(path) {
            Some(recorded) if recorded == checksum => false,
            _ => {
                self.metadata
                    .source_files
                    .insert(path.to_string(), checksum.to_string());
                true
            }
        }
    }

    /// Mark a content-changing merge at the given time.
    pub fn touch(&mut self, now: Timestamp) {
        if self.metadata.created_at.is_none() {
            self.metadata.created_at = Some(now);
        }
        self.metadata.last_updated = Some(now);
    }

    /// Restore metadata verbatim (import path only).
    pub fn set_metadata(&mut self, metadata: GraphMetadata) {
        self.metadata = metadata;
    }

    // =========================================================================
    // EQUALITY & CONSISTENCY
    // =========================================================================

    /// Store equality excluding the two timestamps: same node set, same
    /// edge set, same contributing source files.
    #[must_use]
    pub fn logical_eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
            && self.edges == other.edges
            && self.metadata.source_files == other.metadata.source_files
    }

    /// Verify internal invariants.
    ///
    /// A failure here indicates an engine bug, never user error, and is
    /// reported loudly rather than auto-repaired.
    pub fn check_consistency(&self) -> Result<(), SignalGraphError> {
        for (key, edge) in &self.edges {
            if !self.nodes.contains_key(&key.source) || !self.nodes.contains_key(&key.target) {
                return Err(SignalGraphError::Consistency(format!(
                    "dangling edge {} -[{}]-> {}",
                    key.source.as_str(),
                    key.label.as_str(),
                    key.target.as_str()
                )));
            }
            if edge.symmetric && key.source > key.target {
                return Err(SignalGraphError::Consistency(format!(
                    "symmetric edge {} -[{}]-> {} not stored in canonical endpoint order",
                    key.source.as_str(),
                    key.label.as_str(),
                    key.target.as_str()
                )));
            }
            if edge.provenance.is_empty() {
                return Err(SignalGraphError::Consistency(format!(
                    "edge {} -[{}]-> {} has no provenance",
                    key.source.as_str(),
                    key.label.as_str(),
                    key.target.as_str()
                )));
            }
        }

        for (id, node) in &self.nodes {
            if node.id != *id {
                return Err(SignalGraphError::Consistency(format!(
                    "node stored under {} carries id {}",
                    id.as_str(),
                    node.id.as_str()
                )));
            }
            if node.id != NodeId::derive(&node.label, node.kind) {
                return Err(SignalGraphError::Consistency(format!(
                    "node {} label {:?} does not normalize to its id",
                    id.as_str(),
                    node.label
                )));
            }
            if node.provenance.is_empty() {
                return Err(SignalGraphError::Consistency(format!(
                    "node {} has no provenance",
                    id.as_str()
                )));
            }
            if !node
                .provenance
                .contains_file_span(&node.label_source.file, node.label_source.span_start)
            {
                return Err(SignalGraphError::Consistency(format!(
                    "node {} label source {}:{} not present in provenance",
                    id.as_str(),
                    node.label_source.file,
                    node.label_source.span_start
                )));
            }
        }

        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
