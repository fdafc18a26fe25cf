//! # Candidate Batches
//!
//! The interface contract between extractors and the merge engine.
//!
//! An extractor (the built-in rule extractor, or any external tool that
//! emits the batch JSON) produces one `FileBatch` per source file. The
//! merge engine validates a batch wholesale before touching the store;
//! these types carry per-field validators returning the reason string so
//! the engine can attach file context.

use crate::primitives::{MAX_BATCH_CANDIDATES, MAX_LABEL_LENGTH, MAX_RULE_LENGTH};
use crate::types::{Confidence, EntityKind, NodeId, Span};
use serde::{Deserialize, Serialize};

// =============================================================================
// ENTITY CANDIDATE
// =============================================================================

/// One extracted entity mention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCandidate {
    /// Surface text as it appeared in the source.
    pub text: String,
    pub kind: EntityKind,
    /// Byte span of the mention in the source file.
    pub span: Span,
    /// Extraction rule identifier.
    pub rule: String,
    pub confidence: Confidence,
}

impl EntityCandidate {
    pub fn validate(&self) -> Result<(), String> {
        if self.text.trim().is_empty() {
            return Err("entity text is empty".to_string());
        }
        if self.text.len() > MAX_LABEL_LENGTH {
            return Err(format!(
                "entity text exceeds {MAX_LABEL_LENGTH} byte limit"
            ));
        }
        if !self.span.is_valid() {
            return Err(format!(
                "entity span {}..{} is not a valid half-open range",
                self.span.start, self.span.end
            ));
        }
        if self.rule.is_empty() || self.rule.len() > MAX_RULE_LENGTH {
            return Err("entity rule id is empty or too long".to_string());
        }
        if !self.confidence.is_valid() {
            return Err(format!(
                "entity confidence {} outside 0..=100",
                self.confidence.value()
            ));
        }
        Ok(())
    }
}

// =============================================================================
// RELATION CANDIDATE
// =============================================================================

/// Reference to a relation endpoint by surface form and kind.
///
/// Resolved to a node id at merge time; an endpoint that names a node
/// not yet in the graph causes that node to be created from this
/// reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRef {
    pub text: String,
    pub kind: EntityKind,
}

impl EndpointRef {
    /// Derive the node id this endpoint resolves to.
    #[must_use]
    pub fn node_id(&self) -> NodeId {
        NodeId::derive(&self.text, self.kind)
    }

    fn validate(&self, role: &str) -> Result<(), String> {
        if self.text.trim().is_empty() {
            return Err(format!("relation {role} endpoint text is empty"));
        }
        if self.text.len() > MAX_LABEL_LENGTH {
            return Err(format!(
                "relation {role} endpoint text exceeds {MAX_LABEL_LENGTH} byte limit"
            ));
        }
        Ok(())
    }
}

fn default_directed() -> bool {
    true
}

/// One extracted relation mention between two endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationCandidate {
    pub source: EndpointRef,
    pub target: EndpointRef,
    /// Relation label from the extractor's vocabulary.
    pub label: String,
    /// Byte span of the evidence text in the source file.
    pub span: Span,
    pub rule: String,
    pub confidence: Confidence,
    /// False for symmetric relations; the merge engine then normalizes
    /// endpoint order so both observed directions share one identity.
    #[serde(default = "default_directed")]
    pub directed: bool,
}

impl RelationCandidate {
    pub fn validate(&self) -> Result<(), String> {
        self.source.validate("source")?;
        self.target.validate("target")?;
        if self.label.trim().is_empty() {
            return Err("relation label is empty".to_string());
        }
        if self.label.len() > MAX_LABEL_LENGTH {
            return Err(format!(
                "relation label exceeds {MAX_LABEL_LENGTH} byte limit"
            ));
        }
        if !self.span.is_valid() {
            return Err(format!(
                "relation span {}..{} is not a valid half-open range",
                self.span.start, self.span.end
            ));
        }
        if self.rule.is_empty() || self.rule.len() > MAX_RULE_LENGTH {
            return Err("relation rule id is empty or too long".to_string());
        }
        if !self.confidence.is_valid() {
            return Err(format!(
                "relation confidence {} outside 0..=100",
                self.confidence.value()
            ));
        }
        Ok(())
    }
}

// =============================================================================
// FILE BATCH
// =============================================================================

/// All candidates extracted from one source file.
///
/// The atomic unit of merging: either every candidate in the batch is
/// applied, or the whole batch is rejected and the store is untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileBatch {
    /// Normalized relative path of the source file.
    pub file: String,
    /// SHA-256 checksum of the file contents at extraction time.
    pub checksum: String,
    #[serde(default)]
    pub entities: Vec<EntityCandidate>,
    #[serde(default)]
    pub relations: Vec<RelationCandidate>,
}

impl FileBatch {
    /// Total candidate count across both kinds.
    #[must_use]
    pub fn candidate_count(&self) -> usize {
        self.entities.len().saturating_add(self.relations.len())
    }

    /// Batch-level structural validation. Per-candidate validation is
    /// the merge engine's phase 1; this checks the envelope.
    pub fn validate_envelope(&self) -> Result<(), String> {
        if self.file.is_empty() {
            return Err("batch file path is empty".to_string());
        }
        if self.checksum.is_empty() {
            return Err("batch checksum is empty".to_string());
        }
        if self.candidate_count() > MAX_BATCH_CANDIDATES {
            return Err(format!(
                "batch has {} candidates, exceeding the {MAX_BATCH_CANDIDATES} limit",
                self.candidate_count()
            ));
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
