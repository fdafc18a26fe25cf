//! # signalgraph-core
//!
//! The deterministic knowledge-graph engine for SignalGraph - THE LOGIC.
//!
//! This crate turns per-file extraction batches into a single
//! provenance-tracked knowledge graph. Same inputs in any order produce
//! the same graph and byte-identical exports; re-running over unchanged
//! inputs changes nothing.
//!
//! ## Architectural Constraints
//!
//! The CORE:
//! - Is pure and synchronous: no async, no network, no file I/O
//! - Never reads the wall clock; callers supply timestamps
//! - Uses integer arithmetic only (no floating-point)
//! - Orders everything with `BTreeMap`/`BTreeSet`; identity is always a
//!   function of content, never of arrival order
//! - Only the merge engine mutates the store; analytics are read-only

// =============================================================================
// MODULES
// =============================================================================

pub mod candidate;
pub mod canonical;
pub mod graph;
pub mod insights;
pub mod merge;
pub mod primitives;
pub mod provenance;
pub mod snapshot;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Confidence, EntityKind, NodeId, RelationLabel, SignalGraphError, Span, Timestamp,
};

// =============================================================================
// RE-EXPORTS: Graph Engine
// =============================================================================

pub use candidate::{EndpointRef, EntityCandidate, FileBatch, RelationCandidate};
pub use canonical::{export_json, import_json};
pub use graph::{Edge, EdgeKey, GraphMetadata, GraphStore, LabelSource, Node};
pub use insights::{
    DegreeRow, InsightsReport, InsightsSummary, MotifRow, connected_components, degree_table,
    density_ppt, frequent_motifs, report,
};
pub use merge::{MergeReport, merge};
pub use provenance::{ProvenanceRecord, ProvenanceSet};

// =============================================================================
// RE-EXPORTS: Snapshot Format
// =============================================================================

pub use snapshot::{SnapshotHeader, store_from_bytes, store_to_bytes};
