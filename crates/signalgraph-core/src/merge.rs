//! # Merge Engine
//!
//! Applies one `FileBatch` to a `GraphStore`, atomically per file.
//!
//! The merge is two-phase: phase 1 validates every candidate in the
//! batch and rejects the whole file on the first problem, leaving the
//! store untouched; phase 2 applies, which cannot fail on input (only
//! on an internal invariant breach).
//!
//! Idempotence and order independence are structural, not checked:
//! identity is content-derived, provenance union is a set operation,
//! and the display-label policy ranks extractions by persisted
//! (confidence, file, span) rather than arrival order.

use crate::candidate::FileBatch;
use crate::graph::{Edge, EdgeKey, GraphStore, LabelSource, Node};
use crate::provenance::{ProvenanceRecord, ProvenanceSet};
use crate::types::{EntityKind, NodeId, RelationLabel, SignalGraphError, Timestamp};
use serde::Serialize;

// =============================================================================
// MERGE REPORT
// =============================================================================

/// What one file merge did to the store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MergeReport {
    pub file: String,
    pub nodes_created: u64,
    pub nodes_updated: u64,
    pub edges_created: u64,
    pub edges_updated: u64,
    pub provenance_added: u64,
    /// False when the batch was a full duplicate of already-stored
    /// content. The store's timestamps are only touched when true.
    pub changed: bool,
}

// =============================================================================
// MERGE
// =============================================================================

/// Merge a file batch into the store.
///
/// Validation failures reject the entire batch with
/// [`SignalGraphError::Validation`] naming the file; the store is not
/// modified. Re-merging an identical batch is a no-op that reports
/// `changed = false` and leaves both store timestamps untouched.
pub fn merge(
    store: &mut GraphStore,
    batch: &FileBatch,
    now: Timestamp,
) -> Result<MergeReport, SignalGraphError> {
    validate_batch(batch)?;

    let mut report = MergeReport {
        file: batch.file.clone(),
        ..MergeReport::default()
    };

    for entity in &batch.entities {
        let record = ProvenanceRecord::new(
            batch.file.clone(),
            batch.checksum.clone(),
            entity.span,
            entity.rule.clone(),
            entity.confidence,
        );
        apply_node(
            store,
            &NodeId::derive(&entity.text, entity.kind),
            entity.text.trim(),
            entity.kind,
            record,
            &mut report,
        );
    }

    for relation in &batch.relations {
        let record = ProvenanceRecord::new(
            batch.file.clone(),
            batch.checksum.clone(),
            relation.span,
            relation.rule.clone(),
            relation.confidence,
        );

        // Endpoints take the same path as direct entity mentions: the
        // relation's provenance lands on both endpoint nodes whether
        // they already exist or not, so node content never depends on
        // which file arrived first.
        for endpoint in [&relation.source, &relation.target] {
            apply_node(
                store,
                &endpoint.node_id(),
                endpoint.text.trim(),
                endpoint.kind,
                record.clone(),
                &mut report,
            );
        }

        let label = RelationLabel::new(relation.label.trim());
        let key = if relation.directed {
            EdgeKey::new(
                relation.source.node_id(),
                relation.target.node_id(),
                label,
            )
        } else {
            EdgeKey::symmetric(
                relation.source.node_id(),
                relation.target.node_id(),
                label,
            )
        };

        if let Some(edge) = store.edge_mut(&key) {
            let mut updated = false;
            if !relation.directed && !edge.symmetric {
                edge.symmetric = true;
                updated = true;
            }
            if edge.provenance.insert(record) {
                report.provenance_added += 1;
                updated = true;
            }
            if updated {
                report.edges_updated += 1;
            }
        } else {
            let edge = Edge {
                symmetric: !relation.directed,
                provenance: ProvenanceSet::from_record(record),
            };
            store.put_edge(key, edge)?;
            report.edges_created += 1;
            report.provenance_added += 1;
        }
    }

    let content_changed = report.nodes_created > 0
        || report.nodes_updated > 0
        || report.edges_created > 0
        || report.edges_updated > 0
        || report.provenance_added > 0;
    let meta_changed = store.record_source_file(&batch.file, &batch.checksum);
    report.changed = content_changed || meta_changed;

    if report.changed {
        store.touch(now);
    }

    store.check_consistency()?;
    Ok(report)
}

// =============================================================================
// PHASE 1: VALIDATION
// =============================================================================

fn validate_batch(batch: &FileBatch) -> Result<(), SignalGraphError> {
    let reject = |reason: String| SignalGraphError::Validation {
        file: batch.file.clone(),
        reason,
    };

    batch.validate_envelope().map_err(reject)?;
    for (index, entity) in batch.entities.iter().enumerate() {
        entity
            .validate()
            .map_err(|reason| reject(format!("entity {index}: {reason}")))?;
    }
    for (index, relation) in batch.relations.iter().enumerate() {
        relation
            .validate()
            .map_err(|reason| reject(format!("relation {index}: {reason}")))?;
    }
    Ok(())
}

// =============================================================================
// PHASE 2: APPLICATION
// =============================================================================

fn apply_node(
    store: &mut GraphStore,
    id: &NodeId,
    surface: &str,
    kind: EntityKind,
    record: ProvenanceRecord,
    report: &mut MergeReport,
) {
    let candidate_source = label_source_of(&record);

    if let Some(node) = store.node_mut(id) {
        let mut updated = false;
        if node.provenance.insert(record) {
            report.provenance_added += 1;
            updated = true;
        }
        if candidate_source.outranks(&node.label_source) {
            node.label = surface.to_string();
            node.label_source = candidate_source;
            updated = true;
        }
        if updated {
            report.nodes_updated += 1;
        }
    } else {
        store.put_node(Node {
            id: id.clone(),
            label: surface.to_string(),
            kind,
            label_source: candidate_source,
            provenance: ProvenanceSet::from_record(record),
        });
        report.nodes_created += 1;
        report.provenance_added += 1;
    }
}

fn label_source_of(record: &ProvenanceRecord) -> LabelSource {
    LabelSource::new(record.confidence, record.file.clone(), record.span.start)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{EndpointRef, EntityCandidate, RelationCandidate};
    use crate::types::{Confidence, Span};

    fn entity(text: &str, kind: EntityKind, start: u64, confidence: u8) -> EntityCandidate {
        EntityCandidate {
            text: text.to_string(),
            kind,
            span: Span::new(start, start + text.len().max(1) as u64),
            rule: "capitalized-noun".to_string(),
            confidence: Confidence::new(confidence),
        }
    }

    fn relation(
        source: (&str, EntityKind),
        target: (&str, EntityKind),
        label: &str,
        start: u64,
        directed: bool,
    ) -> RelationCandidate {
        RelationCandidate {
            source: EndpointRef {
                text: source.0.to_string(),
                kind: source.1,
            },
            target: EndpointRef {
                text: target.0.to_string(),
                kind: target.1,
            },
            label: label.to_string(),
            span: Span::new(start, start + 40),
            rule: "pattern".to_string(),
            confidence: Confidence::CERTAIN,
            directed,
        }
    }

    fn batch(file: &str, entities: Vec<EntityCandidate>, relations: Vec<RelationCandidate>) -> FileBatch {
        FileBatch {
            file: file.to_string(),
            checksum: "c0ffee".to_string(),
            entities,
            relations,
        }
    }

    #[test]
    fn case_folded_mentions_merge_into_one_node() {
        let mut store = GraphStore::new();
        let b = batch(
            "a.txt",
            vec![
                entity("OpenAI", EntityKind::Org, 0, 100),
                entity("openai", EntityKind::Org, 50, 80),
            ],
            vec![],
        );

        let report = merge(&mut store, &b, Timestamp::new(1)).expect("merge");

        assert_eq!(store.node_count(), 1);
        assert_eq!(report.nodes_created, 1);
        let node = store
            .get_node(&NodeId::derive("OpenAI", EntityKind::Org))
            .expect("node");
        assert_eq!(node.label, "OpenAI");
        assert_eq!(node.provenance.len(), 2);
    }

    #[test]
    fn relation_auto_creates_both_endpoints() {
        let mut store = GraphStore::new();
        let b = batch(
            "a.txt",
            vec![],
            vec![relation(
                ("OpenAI", EntityKind::Org),
                ("Sam Altman", EntityKind::Person),
                "FOUNDED_BY",
                0,
                true,
            )],
        );

        let report = merge(&mut store, &b, Timestamp::new(1)).expect("merge");

        assert_eq!(store.node_count(), 2);
        assert_eq!(store.edge_count(), 1);
        assert_eq!(report.nodes_created, 2);
        assert_eq!(report.edges_created, 1);
        assert!(store.check_consistency().is_ok());
    }

    #[test]
    fn remerge_is_noop_and_preserves_timestamps() {
        let mut store = GraphStore::new();
        let b = batch(
            "a.txt",
            vec![entity("OpenAI", EntityKind::Org, 0, 100)],
            vec![],
        );

        let first = merge(&mut store, &b, Timestamp::new(10)).expect("merge");
        assert!(first.changed);

        let second = merge(&mut store, &b, Timestamp::new(99)).expect("merge");
        assert!(!second.changed);
        assert_eq!(second.provenance_added, 0);
        assert_eq!(store.metadata().last_updated, Some(Timestamp::new(10)));
    }

    #[test]
    fn order_independence_of_two_batches() {
        let b1 = batch(
            "a.txt",
            vec![entity("OpenAI", EntityKind::Org, 0, 100)],
            vec![relation(
                ("OpenAI", EntityKind::Org),
                ("Sam Altman", EntityKind::Person),
                "FOUNDED_BY",
                10,
                true,
            )],
        );
        let b2 = FileBatch {
            file: "b.txt".to_string(),
            checksum: "beef".to_string(),
            entities: vec![entity("Sam Altman", EntityKind::Person, 5, 90)],
            relations: vec![],
        };

        let mut forward = GraphStore::new();
        merge(&mut forward, &b1, Timestamp::new(1)).expect("merge");
        merge(&mut forward, &b2, Timestamp::new(2)).expect("merge");

        let mut reverse = GraphStore::new();
        merge(&mut reverse, &b2, Timestamp::new(1)).expect("merge");
        merge(&mut reverse, &b1, Timestamp::new(2)).expect("merge");

        assert!(forward.logical_eq(&reverse));
    }

    #[test]
    fn invalid_candidate_rejects_whole_batch() {
        let mut store = GraphStore::new();
        let mut bad = entity("", EntityKind::Org, 0, 100);
        bad.span = Span::new(0, 1);
        let b = batch(
            "a.txt",
            vec![entity("OpenAI", EntityKind::Org, 0, 100), bad],
            vec![],
        );

        let result = merge(&mut store, &b, Timestamp::new(1));

        assert!(matches!(
            result,
            Err(SignalGraphError::Validation { ref file, .. }) if file == "a.txt"
        ));
        assert_eq!(store.node_count(), 0);
        assert!(store.metadata().source_files.is_empty());
    }

    #[test]
    fn undirected_relation_normalizes_direction() {
        let mut store = GraphStore::new();
        let forward = batch(
            "a.txt",
            vec![],
            vec![relation(
                ("Zeta", EntityKind::Org),
                ("Acme", EntityKind::Org),
                "PARTNERS_WITH",
                0,
                false,
            )],
        );
        merge(&mut store, &forward, Timestamp::new(1)).expect("merge");

        let reverse = FileBatch {
            file: "b.txt".to_string(),
            checksum: "beef".to_string(),
            entities: vec![],
            relations: vec![relation(
                ("Acme", EntityKind::Org),
                ("Zeta", EntityKind::Org),
                "PARTNERS_WITH",
                0,
                false,
            )],
        };
        merge(&mut store, &reverse, Timestamp::new(2)).expect("merge");

        assert_eq!(store.edge_count(), 1);
        let (key, edge) = store.edges().next().expect("edge");
        assert!(edge.symmetric);
        assert!(key.source <= key.target);
        assert_eq!(edge.provenance.len(), 2);
    }

    #[test]
    fn endpoint_provenance_is_order_independent() {
        // One file mentions Rust only as a relation endpoint, another
        // as a direct entity. Both merge orders must leave the node
        // with both provenance records.
        let rel_batch = batch(
            "a.txt",
            vec![],
            vec![relation(
                ("Acme", EntityKind::Org),
                ("Rust", EntityKind::Technology),
                "USES",
                0,
                true,
            )],
        );
        let entity_batch = FileBatch {
            file: "b.txt".to_string(),
            checksum: "beef".to_string(),
            entities: vec![entity("Rust", EntityKind::Technology, 7, 90)],
            relations: vec![],
        };

        let mut forward = GraphStore::new();
        merge(&mut forward, &rel_batch, Timestamp::new(1)).expect("merge");
        merge(&mut forward, &entity_batch, Timestamp::new(2)).expect("merge");

        let mut reverse = GraphStore::new();
        merge(&mut reverse, &entity_batch, Timestamp::new(1)).expect("merge");
        merge(&mut reverse, &rel_batch, Timestamp::new(2)).expect("merge");

        assert!(forward.logical_eq(&reverse));

        let id = NodeId::derive("Rust", EntityKind::Technology);
        for store in [&forward, &reverse] {
            let node = store.get_node(&id).expect("node");
            assert_eq!(node.provenance.len(), 2);
            // The relation's rule match outranks the lower-confidence
            // mention in either order.
            assert_eq!(node.label_source.file, "a.txt");
        }
    }

    #[test]
    fn higher_confidence_label_wins_regardless_of_order() {
        let casual = batch(
            "b.txt",
            vec![entity("openai", EntityKind::Org, 0, 60)],
            vec![],
        );
        let formal = FileBatch {
            file: "a.txt".to_string(),
            checksum: "beef".to_string(),
            entities: vec![entity("OpenAI", EntityKind::Org, 0, 100)],
            relations: vec![],
        };

        let id = NodeId::derive("OpenAI", EntityKind::Org);

        let mut one = GraphStore::new();
        merge(&mut one, &casual, Timestamp::new(1)).expect("merge");
        merge(&mut one, &formal, Timestamp::new(2)).expect("merge");

        let mut two = GraphStore::new();
        merge(&mut two, &formal, Timestamp::new(1)).expect("merge");
        merge(&mut two, &casual, Timestamp::new(2)).expect("merge");

        assert_eq!(one.get_node(&id).expect("node").label, "OpenAI");
        assert_eq!(two.get_node(&id).expect("node").label, "OpenAI");
    }
}
