//! # Merge Scenarios
//!
//! End-to-end scenarios through the public API: ingestion across
//! multiple files, error taxonomy behavior, and the analytics surface.

use signalgraph_core::{
    Confidence, EndpointRef, EntityCandidate, EntityKind, FileBatch, GraphStore, NodeId,
    RelationCandidate, SignalGraphError, Span, Timestamp, export_json, import_json, merge, report,
};

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
        rule: "founded-by".to_string(),
        confidence: Confidence::CERTAIN,
        directed: true,
    }
}

// =============================================================================
// SCENARIO: CASE-FOLDED MENTIONS ACROSS FILES
// =============================================================================

#[test]
fn mentions_across_files_collapse_to_one_node_with_ordered_provenance() {
    let mut store = GraphStore::new();

    let file_a = FileBatch {
        file: "docs/a.txt".to_string(),
        checksum: "sum-a".to_string(),
        entities: vec![entity("OpenAI", EntityKind::Org, 10, 100)],
        relations: vec![],
    };
    let file_b = FileBatch {
        file: "docs/b.txt".to_string(),
        checksum: "sum-b".to_string(),
        entities: vec![entity("openai", EntityKind::Org, 3, 100)],
        relations: vec![],
    };

    merge(&mut store, &file_a, Timestamp::new(1)).expect("merge a");
    merge(&mut store, &file_b, Timestamp::new(2)).expect("merge b");

    assert_eq!(store.node_count(), 1);
    let node = store
        .get_node(&NodeId::derive("OpenAI", EntityKind::Org))
        .expect("node");
    assert_eq!(node.provenance.len(), 2);

    // Canonical provenance order is (file, span.start).
    let files: Vec<String> = node.provenance.iter().map(|r| r.file).collect();
    assert_eq!(files, vec!["docs/a.txt".to_string(), "docs/b.txt".to_string()]);

    // Equal confidence: earliest (file, span) wins the label.
    assert_eq!(node.label, "OpenAI");
}

// =============================================================================
// SCENARIO: RELATION BEFORE ENTITIES
// =============================================================================

#[test]
fn relation_creates_endpoints_that_later_mentions_enrich() {
    let mut store = GraphStore::new();

    let first = FileBatch {
        file: "docs/a.txt".to_string(),
        checksum: "sum-a".to_string(),
        entities: vec![],
        relations: vec![relation(
            ("Acme", EntityKind::Org),
            ("Ada Lovelace", EntityKind::Person),
            "FOUNDED_BY",
            0,
        )],
    };
    merge(&mut store, &first, Timestamp::new(1)).expect("merge");
    assert_eq!(store.node_count(), 2);

    // A later direct mention merges into the auto-created node.
    let second = FileBatch {
        file: "docs/b.txt".to_string(),
        checksum: "sum-b".to_string(),
        entities: vec![entity("Ada Lovelace", EntityKind::Person, 0, 100)],
        relations: vec![],
    };
    merge(&mut store, &second, Timestamp::new(2)).expect("merge");

    assert_eq!(store.node_count(), 2);
    let ada = store
        .get_node(&NodeId::derive("Ada Lovelace", EntityKind::Person))
        .expect("node");
    assert_eq!(ada.provenance.len(), 2);
}

// =============================================================================
// SCENARIO: PER-FILE FAILURE DOES NOT POISON THE RUN
// =============================================================================

#[test]
fn failed_batch_leaves_store_usable_for_remaining_files() {
    let mut store = GraphStore::new();

    let good = FileBatch {
        file: "docs/a.txt".to_string(),
        checksum: "sum-a".to_string(),
        entities: vec![entity("Acme", EntityKind::Org, 0, 100)],
        relations: vec![],
    };
    let bad = FileBatch {
        file: "docs/b.txt".to_string(),
        checksum: "sum-b".to_string(),
        entities: vec![entity("", EntityKind::Org, 0, 100)],
        relations: vec![],
    };
    let later = FileBatch {
        file: "docs/c.txt".to_string(),
        checksum: "sum-c".to_string(),
        entities: vec![entity("Globex", EntityKind::Org, 0, 100)],
        relations: vec![],
    };

    merge(&mut store, &good, Timestamp::new(1)).expect("merge good");

    let err = merge(&mut store, &bad, Timestamp::new(2)).expect_err("bad batch");
    assert!(matches!(
        err,
        SignalGraphError::Validation { ref file, .. } if file == "docs/b.txt"
    ));
    // The failed file left no trace.
    assert_eq!(store.node_count(), 1);
    assert!(!store.metadata().source_files.contains_key("docs/b.txt"));
    assert_eq!(store.metadata().last_updated, Some(Timestamp::new(1)));

    merge(&mut store, &later, Timestamp::new(3)).expect("merge later");
    assert_eq!(store.node_count(), 2);
    assert!(store.check_consistency().is_ok());
}

// =============================================================================
// SCENARIO: SKIP-IF-UNCHANGED SUPPORT
// =============================================================================

#[test]
fn checksum_tracking_supports_skip_if_unchanged() {
    let mut store = GraphStore::new();
    let batch = FileBatch {
        file: "docs/a.txt".to_string(),
        checksum: "sum-a".to_string(),
        entities: vec![entity("Acme", EntityKind::Org, 0, 100)],
        relations: vec![],
    };
    merge(&mut store, &batch, Timestamp::new(1)).expect("merge");

    assert!(store.is_file_current("docs/a.txt", "sum-a"));
    assert!(!store.is_file_current("docs/a.txt", "sum-a2"));
    assert!(!store.is_file_current("docs/missing.txt", "sum-a"));
}

// =============================================================================
// SCENARIO: IMPORT NEVER PARTIALLY POPULATES
// =============================================================================

#[test]
fn import_with_duplicate_node_fails_without_side_effects() {
    let mut store = GraphStore::new();
    let batch = FileBatch {
        file: "docs/a.txt".to_string(),
        checksum: "sum-a".to_string(),
        entities: vec![entity("Acme", EntityKind::Org, 0, 100)],
        relations: vec![],
    };
    merge(&mut store, &batch, Timestamp::new(1)).expect("merge");

    let bytes = export_json(&store).expect("export");
    let text = String::from_utf8(bytes).expect("utf8");

    // Duplicate the single node entry in the document.
    let nodes_start = text.find("\"nodes\": [").expect("nodes key");
    let entry_start = text[nodes_start..].find('{').expect("entry") + nodes_start;
    let entry_end = text[entry_start..]
        .find("\n    }")
        .expect("entry end")
        + entry_start
        + "\n    }".len();
    let entry = &text[entry_start..entry_end];
    let doctored = text.replacen(entry, &format!("{entry},\n    {entry}"), 1);

    let err = import_json(doctored.as_bytes()).expect_err("duplicate id");
    assert!(matches!(
        err,
        SignalGraphError::Format { ref reason, .. } if reason.contains("duplicate")
    ));
}

// =============================================================================
// SCENARIO: ANALYTICS OVER A MERGED STORE
// =============================================================================

#[test]
fn insights_report_reflects_merged_content() {
    let mut store = GraphStore::new();
    let batch = FileBatch {
        file: "docs/a.txt".to_string(),
        checksum: "sum-a".to_string(),
        entities: vec![],
        relations: vec![
            relation(
                ("Acme", EntityKind::Org),
                ("Ada", EntityKind::Person),
                "FOUNDED_BY",
                0,
            ),
            relation(
                ("Globex", EntityKind::Org),
                ("Grace", EntityKind::Person),
                "FOUNDED_BY",
                50,
            ),
        ],
    };
    merge(&mut store, &batch, Timestamp::new(1)).expect("merge");

    let insights = report(&store, 2);
    assert_eq!(insights.summary.node_count, 4);
    assert_eq!(insights.summary.edge_count, 2);
    assert_eq!(insights.summary.nodes_by_kind.get("org"), Some(&2));
    assert_eq!(insights.summary.nodes_by_kind.get("person"), Some(&2));
    assert_eq!(insights.components.len(), 2);
    assert_eq!(insights.motifs.len(), 1);
    assert_eq!(insights.motifs[0].count, 2);
}
