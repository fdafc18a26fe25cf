//! # Insights Engine
//!
//! Pure read-only analytics over a `GraphStore`.
//!
//! Everything here is integer arithmetic; ratio metrics are reported in
//! parts per thousand. Every output vector is explicitly sorted before
//! emission so reports are deterministic byte-for-byte. CSV or table
//! formatting is the CLI's job; the core only produces data.

use crate::graph::GraphStore;
use crate::primitives::RATIO_SCALE;
use crate::types::{EntityKind, NodeId, RelationLabel};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// DEGREE TABLE
// =============================================================================

/// Per-node degree statistics.
///
/// In/out degrees follow the stored edge direction (a symmetric edge
/// contributes out-degree to its canonical source and in-degree to its
/// canonical target); centrality uses total incident edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DegreeRow {
    pub id: NodeId,
    pub in_degree: u64,
    pub out_degree: u64,
    pub total: u64,
    /// Degree centrality: `total * 1000 / (n - 1)`, 0 for graphs with
    /// fewer than two nodes.
    pub centrality_ppt: u64,
}

/// Compute the degree table, rows sorted by node id.
#[must_use]
pub fn degree_table(store: &GraphStore) -> Vec<DegreeRow> {
    let mut in_degrees: BTreeMap<&NodeId, u64> = BTreeMap::new();
    let mut out_degrees: BTreeMap<&NodeId, u64> = BTreeMap::new();

    for (key, _) in store.edges() {
        *out_degrees.entry(&key.source).or_insert(0) += 1;
        *in_degrees.entry(&key.target).or_insert(0) += 1;
    }

    let node_count = store.node_count() as u64;
    store
        .nodes()
        .map(|node| {
            let in_degree = in_degrees.get(&node.id).copied().unwrap_or(0);
            let out_degree = out_degrees.get(&node.id).copied().unwrap_or(0);
            let total = in_degree.saturating_add(out_degree);
            let centrality_ppt = if node_count > 1 {
                total.saturating_mul(RATIO_SCALE) / (node_count - 1)
            } else {
                0
            };
            DegreeRow {
                id: node.id.clone(),
                in_degree,
                out_degree,
                total,
                centrality_ppt,
            }
        })
        .collect()
}

// =============================================================================
// CONNECTED COMPONENTS
// =============================================================================

/// Connected components of the undirected view of the graph.
///
/// Each component is a sorted vector of member ids; the component list
/// is ordered by smallest member. Isolated nodes form singleton
/// components.
#[must_use]
pub fn connected_components(store: &GraphStore) -> Vec<Vec<NodeId>> {
    let mut adjacency: BTreeMap<&NodeId, BTreeSet<&NodeId>> = BTreeMap::new();
    for node in store.nodes() {
        adjacency.entry(&node.id).or_default();
    }
    for (key, _) in store.edges() {
        adjacency.entry(&key.source).or_default().insert(&key.target);
        adjacency.entry(&key.target).or_default().insert(&key.source);
    }

    let mut visited: BTreeSet<&NodeId> = BTreeSet::new();
    let mut components = Vec::new();

    // Iterating the adjacency map in key order makes each component
    // start from its smallest member, so the output order is canonical
    // without a final sort of the component list.
    for start in adjacency.keys().copied() {
        if visited.contains(start) {
            continue;
        }
        let mut members = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            members.push(current.clone());
            if let Some(neighbors) = adjacency.get(current) {
                for neighbor in neighbors.iter().rev() {
                    if !visited.contains(*neighbor) {
                        stack.push(*neighbor);
                    }
                }
            }
        }
        members.sort();
        components.push(members);
    }

    components
}

// =============================================================================
// FREQUENT MOTIFS
// =============================================================================

/// One (source kind, relation label, target kind) pattern and its count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MotifRow {
    pub source_kind: EntityKind,
    pub label: RelationLabel,
    pub target_kind: EntityKind,
    pub count: u64,
}

/// Count edge-type motifs with support of at least `min_support`.
///
/// Rows are sorted by descending count, then lexically by
/// (source kind, label, target kind).
#[must_use]
pub fn frequent_motifs(store: &GraphStore, min_support: u64) -> Vec<MotifRow> {
    let mut counts: BTreeMap<(EntityKind, &RelationLabel, EntityKind), u64> = BTreeMap::new();

    for (key, _) in store.edges() {
        let (Some(source), Some(target)) =
            (store.get_node(&key.source), store.get_node(&key.target))
        else {
            // Unreachable in a consistent store; skipping keeps the
            // function total.
            continue;
        };
        *counts
            .entry((source.kind, &key.label, target.kind))
            .or_insert(0) += 1;
    }

    let mut rows: Vec<MotifRow> = counts
        .into_iter()
        .filter(|(_, count)| *count >= min_support)
        .map(|((source_kind, label, target_kind), count)| MotifRow {
            source_kind,
            label: label.clone(),
            target_kind,
            count,
        })
        .collect();

    rows.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.source_kind.tag().cmp(b.source_kind.tag()))
            .then_with(|| a.label.cmp(&b.label))
            .then_with(|| a.target_kind.tag().cmp(b.target_kind.tag()))
    });
    rows
}

// =============================================================================
// REPORT
// =============================================================================

/// Headline totals for the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsightsSummary {
    pub node_count: u64,
    pub edge_count: u64,
    /// Node count per entity kind, keyed by the kind tag.
    pub nodes_by_kind: BTreeMap<String, u64>,
    /// Directed graph density in parts per thousand.
    pub density_ppt: u64,
}

/// The full analytics report, serializable for the CLI's JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsightsReport {
    pub summary: InsightsSummary,
    pub degrees: Vec<DegreeRow>,
    pub components: Vec<Vec<NodeId>>,
    pub motifs: Vec<MotifRow>,
}

/// Directed density in parts per thousand: `edges * 1000 / (n * (n-1))`.
#[must_use]
pub fn density_ppt(store: &GraphStore) -> u64 {
    let n = store.node_count() as u64;
    if n < 2 {
        return 0;
    }
    let possible = n.saturating_mul(n - 1);
    (store.edge_count() as u64).saturating_mul(RATIO_SCALE) / possible
}

/// Build the full report.
#[must_use]
pub fn report(store: &GraphStore, min_support: u64) -> InsightsReport {
    let mut nodes_by_kind: BTreeMap<String, u64> = BTreeMap::new();
    for kind in EntityKind::all() {
        nodes_by_kind.insert(kind.tag().to_string(), 0);
    }
    for node in store.nodes() {
        *nodes_by_kind.entry(node.kind.tag().to_string()).or_insert(0) += 1;
    }

    InsightsReport {
        summary: InsightsSummary {
            node_count: store.node_count() as u64,
            edge_count: store.edge_count() as u64,
            nodes_by_kind,
            density_ppt: density_ppt(store),
        },
        degrees: degree_table(store),
        components: connected_components(store),
        motifs: frequent_motifs(store, min_support),
    }
}

// =============================================================================
// TESTS
// =============================================================================
