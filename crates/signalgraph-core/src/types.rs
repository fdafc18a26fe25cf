//! # Core Type Definitions
//!
//! This module contains all core types for the SignalGraph deterministic
//! graph builder:
//! - Entity identity (`NodeId`, `EntityKind`)
//! - Text positions (`Span`)
//! - Fixed-point extraction confidence (`Confidence`)
//! - Relation vocabulary (`RelationLabel`)
//! - Caller-supplied time (`Timestamp`)
//! - Error types (`SignalGraphError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`
//! - Derive identity purely from content, never from arrival order

use crate::primitives::CONFIDENCE_MAX;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// ENTITY KIND
// =============================================================================

/// The closed set of entity kinds the graph understands.
///
/// Extraction output outside this set maps to `Other`; unknown kinds in
/// persisted data are a format error, keeping downstream analytics
/// exhaustive over a fixed enumeration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Person,
    Org,
    Technology,
    #[default]
    Other,
}

impl EntityKind {
    /// Stable lowercase tag used inside derived node ids.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Org => "org",
            Self::Technology => "technology",
            Self::Other => "other",
        }
    }

    /// All kinds in their canonical order.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Person, Self::Org, Self::Technology, Self::Other]
    }
}

// =============================================================================
// NODE IDENTITY
// =============================================================================

/// Stable node identifier derived from normalized surface text plus kind.
///
/// The id is a pure function of content: `"<kind-tag>:<normalized-text>"`.
/// Re-ingesting the same entity in any order always yields the same id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Derive the canonical id for a surface form and kind.
    ///
    /// Normalization: trim, case-fold, collapse internal whitespace runs
    /// to single spaces. The original surface form is preserved separately
    /// as the node label.
    #[must_use]
    pub fn derive(text: &str, kind: EntityKind) -> Self {
        Self(format!("{}:{}", kind.tag(), normalize_text(text)))
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Normalize entity surface text for identity derivation.
///
/// Trim, case-fold via Unicode lowercasing, collapse whitespace runs.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

// =============================================================================
// SPAN
// =============================================================================

/// Half-open byte range `[start, end)` into a source file's text.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Span {
    pub start: u64,
    pub end: u64,
}

impl Span {
    /// Create a new span.
    #[must_use]
    pub const fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// A span is valid iff it is non-empty and well ordered.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.start < self.end
    }
}

// =============================================================================
// CONFIDENCE
// =============================================================================

/// Extraction confidence as a fixed-point percent in `0..=100`.
///
/// Deterministic rule matches report `Confidence::CERTAIN` (100);
/// model-based extraction reports less. Integer representation keeps the
/// engine free of float arithmetic and makes canonical exports byte-stable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Confidence(pub u8);

impl Confidence {
    /// Confidence of a deterministic rule match (the `1.0` of the
    /// external float contract).
    pub const CERTAIN: Self = Self(CONFIDENCE_MAX);

    /// Create a new confidence value without range checking.
    ///
    /// Range validation happens at the ingestion and import boundaries;
    /// see [`Confidence::is_valid`].
    #[must_use]
    pub const fn new(percent: u8) -> Self {
        Self(percent)
    }

    /// Check the value is within `0..=100`.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.0 <= CONFIDENCE_MAX
    }

    /// Get the raw percent value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

// =============================================================================
// RELATION LABEL
// =============================================================================

/// Relation type from the (extensible) relation vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationLabel(pub String);

impl RelationLabel {
    /// Create a new relation label from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// TIMESTAMP
// =============================================================================

/// Unix seconds supplied by the caller.
///
/// The core never reads the wall clock; orchestration passes time in so
/// that unchanged inputs can re-export byte-identically.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Create a new timestamp from unix seconds.
    #[must_use]
    pub const fn new(unix_seconds: u64) -> Self {
        Self(unix_seconds)
    }

    /// Get the raw unix-seconds value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the SignalGraph engine.
///
/// - `Validation` is recoverable per file: the offending batch is rejected
///   wholesale, reported, and ingestion continues with remaining files.
/// - `Format` is fatal to a single import call and names the offending
///   element; the target store is never partially populated.
/// - `Consistency` signals an internal invariant breach. It indicates a
///   bug, never user error, and is never silently repaired.
#[derive(Debug, Error)]
pub enum SignalGraphError {
    /// A candidate batch failed validation and was rejected wholesale.
    #[error("invalid batch for {file}: {reason}")]
    Validation { file: String, reason: String },

    /// Persisted graph data is corrupt or schema-violating.
    #[error("malformed graph data at {element}: {reason}")]
    Format { element: String, reason: String },

    /// An internal graph invariant was violated.
    #[error("graph consistency violated: {0}")]
    Consistency(String),

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_case_folds_and_collapses_whitespace() {
        let a = NodeId::derive("OpenAI", EntityKind::Org);
        let b = NodeId::derive("  openai ", EntityKind::Org);
        let c = NodeId::derive("Open  AI", EntityKind::Org);

        assert_eq!(a, b);
        assert_eq!(a.as_str(), "org:openai");
        assert_eq!(c.as_str(), "org:open ai");
    }

    #[test]
    fn node_id_includes_kind_tag() {
        let org = NodeId::derive("Rust", EntityKind::Org);
        let tech = NodeId::derive("Rust", EntityKind::Technology);

        assert_ne!(org, tech);
        assert_eq!(tech.as_str(), "technology:rust");
    }

    #[test]
    fn span_validity() {
        assert!(Span::new(0, 6).is_valid());
        assert!(!Span::new(6, 6).is_valid());
        assert!(!Span::new(7, 3).is_valid());
    }

    #[test]
    fn confidence_range() {
        assert!(Confidence::new(0).is_valid());
        assert!(Confidence::CERTAIN.is_valid());
        assert!(!Confidence::new(101).is_valid());
    }

    #[test]
    fn entity_kind_tags_are_stable() {
        assert_eq!(EntityKind::Person.tag(), "person");
        assert_eq!(EntityKind::Other.tag(), "other");
    }
}
