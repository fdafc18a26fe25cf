//! # Canonical Serializer
//!
//! The external JSON contract: logically identical graphs serialize to
//! byte-identical documents regardless of merge order.
//!
//! Canonical form:
//! - top-level keys `nodes`, `edges`, `metadata` in that order
//! - nodes sorted by id; edges sorted by (source, target, label)
//! - provenance arrays sorted by (file, span.start)
//! - `source_files` as a sorted map
//! - two-space pretty printing, stable field order
//!
//! Import performs full validation and returns a fresh store or an
//! error naming the offending element; it never partially populates.

use crate::graph::{Edge, EdgeKey, GraphMetadata, GraphStore, LabelSource, Node};
use crate::primitives::{MAX_IMPORT_EDGE_COUNT, MAX_IMPORT_NODE_COUNT};
use crate::provenance::{ProvenanceRecord, ProvenanceSet};
use crate::types::{EntityKind, NodeId, RelationLabel, SignalGraphError};
use serde::{Deserialize, Serialize};

// =============================================================================
// DOCUMENT SHAPE
// =============================================================================

/// Serialized node. Field order here is the canonical field order.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct NodeDoc {
    id: NodeId,
    label: String,
    kind: EntityKind,
    label_source: LabelSource,
    provenance: Vec<ProvenanceRecord>,
}

/// Serialized edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EdgeDoc {
    source: NodeId,
    target: NodeId,
    label: RelationLabel,
    symmetric: bool,
    provenance: Vec<ProvenanceRecord>,
}

/// The whole canonical document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct GraphDocument {
    nodes: Vec<NodeDoc>,
    edges: Vec<EdgeDoc>,
    metadata: GraphMetadata,
}

// =============================================================================
// EXPORT
// =============================================================================

/// Lower a store into its canonical document. Iteration over the
/// store's BTreeMaps already yields the canonical orderings.
pub(crate) fn to_document(store: &GraphStore) -> GraphDocument {
    let nodes = store
        .nodes()
        .map(|node| NodeDoc {
            id: node.id.clone(),
            label: node.label.clone(),
            kind: node.kind,
            label_source: node.label_source.clone(),
            provenance: node.provenance.iter().collect(),
        })
        .collect();

    let edges = store
        .edges()
        .map(|(key, edge)| EdgeDoc {
            source: key.source.clone(),
            target: key.target.clone(),
            label: key.label.clone(),
            symmetric: edge.symmetric,
            provenance: edge.provenance.iter().collect(),
        })
        .collect();

    GraphDocument {
        nodes,
        edges,
        metadata: store.metadata().clone(),
    }
}

/// Serialize a store to canonical pretty-printed JSON bytes.
pub fn export_json(store: &GraphStore) -> Result<Vec<u8>, SignalGraphError> {
    let document = to_document(store);
    serde_json::to_vec_pretty(&document)
        .map_err(|e| SignalGraphError::Serialization(e.to_string()))
}

// =============================================================================
// IMPORT
// =============================================================================

/// Rehydrate a validated document into a store.
///
/// Every structural rule is checked before the store is returned;
/// violations are [`SignalGraphError::Format`] naming the element.
pub(crate) fn from_document(document: GraphDocument) -> Result<GraphStore, SignalGraphError> {
    if document.nodes.len() > MAX_IMPORT_NODE_COUNT {
        return Err(SignalGraphError::Format {
            element: "nodes".to_string(),
            reason: format!(
                "{} nodes exceeds the {MAX_IMPORT_NODE_COUNT} import limit",
                document.nodes.len()
            ),
        });
    }
    if document.edges.len() > MAX_IMPORT_EDGE_COUNT {
        return Err(SignalGraphError::Format {
            element: "edges".to_string(),
            reason: format!(
                "{} edges exceeds the {MAX_IMPORT_EDGE_COUNT} import limit",
                document.edges.len()
            ),
        });
    }

    let mut store = GraphStore::new();

    for node_doc in document.nodes {
        let element = format!("node {}", node_doc.id.as_str());
        let format_err = |reason: String| SignalGraphError::Format {
            element: element.clone(),
            reason,
        };

        if store.contains_node(&node_doc.id) {
            return Err(format_err("duplicate node id".to_string()));
        }
        if node_doc.id != NodeId::derive(&node_doc.label, node_doc.kind) {
            return Err(format_err(format!(
                "label {:?} does not normalize to the node id",
                node_doc.label
            )));
        }

        let provenance = validated_provenance(node_doc.provenance, &element)?;
        if !provenance
            .contains_file_span(&node_doc.label_source.file, node_doc.label_source.span_start)
        {
            return Err(format_err(format!(
                "label source {}:{} not present in provenance",
                node_doc.label_source.file, node_doc.label_source.span_start
            )));
        }
        if !node_doc.label_source.confidence.is_valid() {
            return Err(format_err("label source confidence outside 0..=100".to_string()));
        }

        store.put_node(Node {
            id: node_doc.id,
            label: node_doc.label,
            kind: node_doc.kind,
            label_source: node_doc.label_source,
            provenance,
        });
    }

    for edge_doc in document.edges {
        let element = format!(
            "edge {} -[{}]-> {}",
            edge_doc.source.as_str(),
            edge_doc.label.as_str(),
            edge_doc.target.as_str()
        );
        let format_err = |reason: String| SignalGraphError::Format {
            element: element.clone(),
            reason,
        };

        if !store.contains_node(&edge_doc.source) {
            return Err(format_err("source node does not exist".to_string()));
        }
        if !store.contains_node(&edge_doc.target) {
            return Err(format_err("target node does not exist".to_string()));
        }
        if edge_doc.symmetric && edge_doc.source > edge_doc.target {
            return Err(format_err(
                "symmetric edge endpoints not in canonical order".to_string(),
            ));
        }

        let key = EdgeKey::new(edge_doc.source, edge_doc.target, edge_doc.label);
        if store.get_edge(&key).is_some() {
            return Err(format_err("duplicate edge key".to_string()));
        }

        let provenance = validated_provenance(edge_doc.provenance, &element)?;
        store.put_edge(
            key,
            Edge {
                symmetric: edge_doc.symmetric,
                provenance,
            },
        )?;
    }

    store.set_metadata(document.metadata);
    Ok(store)
}

fn validated_provenance(
    records: Vec<ProvenanceRecord>,
    element: &str,
) -> Result<ProvenanceSet, SignalGraphError> {
    if records.is_empty() {
        return Err(SignalGraphError::Format {
            element: element.to_string(),
            reason: "provenance is empty".to_string(),
        });
    }
    let mut set = ProvenanceSet::new();
    for record in records {
        record.validate().map_err(|reason| SignalGraphError::Format {
            element: element.to_string(),
            reason,
        })?;
        set.insert(record);
    }
    Ok(set)
}

/// Parse and validate canonical JSON bytes into a fresh store.
pub fn import_json(bytes: &[u8]) -> Result<GraphStore, SignalGraphError> {
    let document: GraphDocument =
        serde_json::from_slice(bytes).map_err(|e| SignalGraphError::Format {
            element: "document".to_string(),
            reason: e.to_string(),
        })?;
    from_document(document)
}

// =============================================================================
// TESTS
// =============================================================================
