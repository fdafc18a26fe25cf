//! # Provenance Module
//!
//! Every graph element carries the full set of extraction events that
//! produced or corroborated it. Provenance is a deduplicated ordered
//! sequence keyed by (file, span, rule, checksum): re-inserting an
//! identical record is a set no-op, which makes merge idempotence a
//! mechanical property rather than a convention.

use crate::primitives::{
    MAX_CHECKSUM_LENGTH, MAX_RULE_LENGTH, MAX_SOURCE_PATH_LENGTH,
};
use crate::types::{Confidence, Span};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// PROVENANCE RECORD
// =============================================================================

/// One extraction event: where a fact came from and how sure the
/// extractor was.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    /// Normalized relative path of the source file.
    pub file: String,
    /// Content hash of the source file at extraction time.
    pub checksum: String,
    /// Half-open byte span into the source text.
    pub span: Span,
    /// Identifier of the extraction rule or model that produced the fact.
    pub rule: String,
    /// Fixed-point confidence percent; 100 for deterministic rule matches.
    pub confidence: Confidence,
}

impl ProvenanceRecord {
    /// Create a new provenance record.
    #[must_use]
    pub fn new(
        file: impl Into<String>,
        checksum: impl Into<String>,
        span: Span,
        rule: impl Into<String>,
        confidence: Confidence,
    ) -> Self {
        Self {
            file: file.into(),
            checksum: checksum.into(),
            span,
            rule: rule.into(),
            confidence,
        }
    }

    /// Validate the record's fields. Returns the reason on failure;
    /// callers attach file or element context.
    pub fn validate(&self) -> Result<(), String> {
        if self.file.is_empty() {
            return Err("provenance file path is empty".to_string());
        }
        if self.file.len() > MAX_SOURCE_PATH_LENGTH {
            return Err("provenance file path exceeds length limit".to_string());
        }
        if self.checksum.is_empty() {
            return Err("provenance checksum is empty".to_string());
        }
        if self.checksum.len() > MAX_CHECKSUM_LENGTH {
            return Err("provenance checksum exceeds length limit".to_string());
        }
        if !self.span.is_valid() {
            return Err(format!(
                "provenance span {}..{} is not a valid half-open range",
                self.span.start, self.span.end
            ));
        }
        if self.rule.is_empty() {
            return Err("provenance rule id is empty".to_string());
        }
        if self.rule.len() > MAX_RULE_LENGTH {
            return Err("provenance rule id exceeds length limit".to_string());
        }
        if !self.confidence.is_valid() {
            return Err(format!(
                "confidence {} outside 0..=100",
                self.confidence.value()
            ));
        }
        Ok(())
    }
}

// =============================================================================
// DEDUPLICATION KEY
// =============================================================================

/// Identity key of an extraction event.
///
/// Two records with the same key describe the same extraction; merging
/// them must not append a duplicate. Field order gives the canonical
/// provenance ordering: (file, span.start, span.end, rule, checksum).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct ProvenanceKey {
    file: String,
    span: Span,
    rule: String,
    checksum: String,
}

impl From<&ProvenanceRecord> for ProvenanceKey {
    fn from(record: &ProvenanceRecord) -> Self {
        Self {
            file: record.file.clone(),
            span: record.span,
            rule: record.rule.clone(),
            checksum: record.checksum.clone(),
        }
    }
}

// =============================================================================
// PROVENANCE SET
// =============================================================================

/// Deduplicated, deterministically ordered provenance for one element.
///
/// Implemented as a sorted map rather than a raw list so that idempotence
/// is mechanically enforceable. Iteration order is (file, span.start),
/// the canonical serialization order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<ProvenanceRecord>", into = "Vec<ProvenanceRecord>")]
pub struct ProvenanceSet {
    records: BTreeMap<ProvenanceKey, Confidence>,
}

impl ProvenanceSet {
    /// Create an empty provenance set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set from a single record.
    #[must_use]
    pub fn from_record(record: ProvenanceRecord) -> Self {
        let mut set = Self::new();
        set.insert(record);
        set
    }

    /// Insert a record, deduplicating on (file, span, rule, checksum).
    ///
    /// When the same extraction is observed twice with different
    /// confidence, the higher value wins regardless of arrival order.
    /// Returns `true` if the set changed.
    pub fn insert(&mut self, record: ProvenanceRecord) -> bool {
        let key = ProvenanceKey::from(&record);
        match self.records.get_mut(&key) {
            Some(existing) => {
                if record.confidence > *existing {
                    *existing = record.confidence;
                    true
                } else {
                    false
                }
            }
            None => {
                self.records.insert(key, record.confidence);
                true
            }
        }
    }

    /// Union another set into this one. Returns the number of changes.
    pub fn merge_from(&mut self, other: &Self) -> u64 {
        let mut changed = 0u64;
        for record in other.iter() {
            if self.insert(record) {
                changed = changed.saturating_add(1);
            }
        }
        changed
    }

    /// Number of distinct extraction events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate records in canonical (file, span.start) order.
    pub fn iter(&self) -> impl Iterator<Item = ProvenanceRecord> + '_ {
        self.records.iter().map(|(key, confidence)| ProvenanceRecord {
            file: key.file.clone(),
            checksum: key.checksum.clone(),
            span: key.span,
            rule: key.rule.clone(),
            confidence: *confidence,
        })
    }

    /// Whether any record originates from the given file and span start.
    ///
    /// Used by the consistency check to verify a node's label source
    /// actually appears in its provenance.
    #[must_use]
    pub fn contains_file_span(&self, file: &str, span_start: u64) -> bool {
        self.records
            .keys()
            .any(|key| key.file == file && key.span.start == span_start)
    }
}

impl From<Vec<ProvenanceRecord>> for ProvenanceSet {
    fn from(records: Vec<ProvenanceRecord>) -> Self {
        let mut set = Self::new();
        for record in records {
            set.insert(record);
        }
        set
    }
}

impl From<ProvenanceSet> for Vec<ProvenanceRecord> {
    fn from(set: ProvenanceSet) -> Self {
        set.iter().collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
