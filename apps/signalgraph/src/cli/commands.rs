//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! All file I/O lives here; the core engine only sees bytes and
//! batches. Per-file ingest failures are collected and reported without
//! aborting the run, and the process exit code reflects them.

use crate::config::AppConfig;
use crate::discover;
use crate::extract::Extractor;
use signalgraph_core::{
    FileBatch, GraphStore, MergeReport, SignalGraphError, Timestamp, export_json, import_json,
    merge, store_from_bytes, store_to_bytes,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum file size for batch JSON files (100 MB).
///
/// This prevents memory exhaustion from malicious or accidental large files.
const MAX_BATCH_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Maximum file size for import (500 MB).
///
/// Import files can be larger since they contain a whole graph.
const MAX_IMPORT_FILE_SIZE: u64 = 500 * 1024 * 1024;

// =============================================================================
// RUN STATUS
// =============================================================================

/// Overall outcome of a command for exit-code purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Everything succeeded.
    Clean,
    /// The command completed but some files failed to ingest.
    PartialFailures,
}

/// Per-file ingest outcome.
enum Outcome {
    Merged(MergeReport),
    Skipped,
    Failed(String),
}

// =============================================================================
// PATH AND SIZE VALIDATION
// =============================================================================

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), SignalGraphError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| SignalGraphError::Io(format!("cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(SignalGraphError::Io(format!(
            "file size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Validate an input file path.
///
/// Canonicalizes the path to resolve symlinks and "..", ensures it
/// exists, and ensures it is a regular file. This prevents path
/// traversal from reaching outside the working tree.
fn validate_file_path(path: &Path) -> Result<PathBuf, SignalGraphError> {
    let canonical = path.canonicalize().map_err(|e| {
        SignalGraphError::Io(format!("invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(SignalGraphError::Io(format!(
            "path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Validate an output path: the parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, SignalGraphError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        SignalGraphError::Io(format!(
            "invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(SignalGraphError::Io(format!(
            "output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| SignalGraphError::Io("output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// DATABASE LOAD/SAVE
// =============================================================================

/// Current wall-clock time as unix seconds. The only clock read in the
/// whole system; the core takes time as a parameter.
fn now_timestamp() -> Timestamp {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    Timestamp::new(secs)
}

/// Load the snapshot database, or start empty when it does not exist.
fn load_store(db_path: &Path) -> Result<GraphStore, SignalGraphError> {
    if !db_path.exists() {
        tracing::info!(database = %db_path.display(), "no database found, starting empty");
        return Ok(GraphStore::new());
    }

    validate_file_size(db_path, MAX_IMPORT_FILE_SIZE)?;
    let bytes = std::fs::read(db_path)
        .map_err(|e| SignalGraphError::Io(format!("read database: {}", e)))?;
    store_from_bytes(&bytes)
}

/// Persist the store as a snapshot database.
fn save_store(store: &GraphStore, db_path: &Path) -> Result<(), SignalGraphError> {
    let bytes = store_to_bytes(store)?;
    std::fs::write(db_path, bytes)
        .map_err(|e| SignalGraphError::Io(format!("write database: {}", e)))
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new empty graph database.
pub fn cmd_init(db_path: &Path, force: bool) -> Result<(), SignalGraphError> {
    if db_path.exists() && !force {
        return Err(SignalGraphError::Io(format!(
            "database '{}' already exists (use --force to overwrite)",
            db_path.display()
        )));
    }

    save_store(&GraphStore::new(), db_path)?;
    println!("Initialized empty graph database at {}", db_path.display());
    Ok(())
}

// =============================================================================
// INGEST COMMAND
// =============================================================================

/// Discover, extract, and merge sources into the graph.
///
/// Failures are per file: one bad file is reported and skipped while
/// the rest of the run continues. The returned status is
/// [`RunStatus::PartialFailures`] when any file failed.
pub fn cmd_ingest(
    db_path: &Path,
    config: &AppConfig,
    data_dir: Option<&Path>,
    batch_files: &[PathBuf],
    json_mode: bool,
) -> Result<RunStatus, SignalGraphError> {
    if data_dir.is_none() && batch_files.is_empty() {
        return Err(SignalGraphError::Io(
            "nothing to ingest: pass --data-dir and/or --batch".to_string(),
        ));
    }

    let mut store = load_store(db_path)?;
    // One clock read per run; every merged file gets the same timestamp.
    let now = now_timestamp();
    let mut outcomes: Vec<(String, Outcome)> = Vec::new();

    if let Some(dir) = data_dir {
        let extractor = Extractor::from_config(&config.extractor)?;
        for source in discover::discover_files(dir)? {
            if store.is_file_current(&source.path, &source.checksum) {
                tracing::debug!(file = %source.path, "unchanged, skipping");
                outcomes.push((source.path.clone(), Outcome::Skipped));
                continue;
            }
            let batch = extractor.extract(&source);
            apply_batch(&mut store, &batch, now, &mut outcomes);
        }
    }

    for batch_file in batch_files {
        match load_batches(batch_file) {
            Ok(batches) => {
                for batch in batches {
                    if store.is_file_current(&batch.file, &batch.checksum) {
                        tracing::debug!(file = %batch.file, "unchanged, skipping");
                        outcomes.push((batch.file.clone(), Outcome::Skipped));
                        continue;
                    }
                    apply_batch(&mut store, &batch, now, &mut outcomes);
                }
            }
            Err(e) => {
                tracing::warn!(file = %batch_file.display(), error = %e, "batch file rejected");
                outcomes.push((batch_file.display().to_string(), Outcome::Failed(e.to_string())));
            }
        }
    }

    save_store(&store, db_path)?;
    report_ingest(&store, &outcomes, json_mode);

    let failed = outcomes
        .iter()
        .any(|(_, outcome)| matches!(outcome, Outcome::Failed(_)));
    Ok(if failed {
        RunStatus::PartialFailures
    } else {
        RunStatus::Clean
    })
}

/// Merge one batch, recording the outcome instead of propagating
/// per-file validation failures.
fn apply_batch(
    store: &mut GraphStore,
    batch: &FileBatch,
    now: Timestamp,
    outcomes: &mut Vec<(String, Outcome)>,
) {
    match merge(store, batch, now) {
        Ok(report) => {
            tracing::info!(
                file = %batch.file,
                nodes_created = report.nodes_created,
                edges_created = report.edges_created,
                changed = report.changed,
                "merged"
            );
            outcomes.push((batch.file.clone(), Outcome::Merged(report)));
        }
        Err(SignalGraphError::Validation { file, reason }) => {
            tracing::warn!(file = %file, reason = %reason, "batch rejected");
            outcomes.push((file, Outcome::Failed(reason)));
        }
        Err(other) => {
            // Consistency and serialization errors are engine-level and
            // still only poison this one file's merge attempt.
            tracing::error!(file = %batch.file, error = %other, "merge failed");
            outcomes.push((batch.file.clone(), Outcome::Failed(other.to_string())));
        }
    }
}

/// Read and parse one extraction-batch JSON file (an array of batches).
fn load_batches(path: &Path) -> Result<Vec<FileBatch>, SignalGraphError> {
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, MAX_BATCH_FILE_SIZE)?;

    let contents = std::fs::read(&validated)
        .map_err(|e| SignalGraphError::Io(format!("read batch file: {}", e)))?;
    serde_json::from_slice(&contents).map_err(|e| SignalGraphError::Validation {
        file: path.display().to_string(),
        reason: format!("invalid batch JSON: {}", e),
    })
}

fn report_ingest(store: &GraphStore, outcomes: &[(String, Outcome)], json_mode: bool) {
    let merged = outcomes
        .iter()
        .filter(|(_, o)| matches!(o, Outcome::Merged(_)))
        .count();
    let skipped = outcomes
        .iter()
        .filter(|(_, o)| matches!(o, Outcome::Skipped))
        .count();
    let failures: Vec<(&String, &String)> = outcomes
        .iter()
        .filter_map(|(file, o)| match o {
            Outcome::Failed(reason) => Some((file, reason)),
            _ => None,
        })
        .collect();

    if json_mode {
        let files: Vec<serde_json::Value> = outcomes
            .iter()
            .map(|(file, outcome)| match outcome {
                Outcome::Merged(report) => serde_json::json!({
                    "file": file,
                    "status": "merged",
                    "report": report,
                }),
                Outcome::Skipped => serde_json::json!({
                    "file": file,
                    "status": "skipped",
                }),
                Outcome::Failed(reason) => serde_json::json!({
                    "file": file,
                    "status": "failed",
                    "reason": reason,
                }),
            })
            .collect();
        let output = serde_json::json!({
            "merged": merged,
            "skipped": skipped,
            "failed": failures.len(),
            "files": files,
            "node_count": store.node_count(),
            "edge_count": store.edge_count(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return;
    }

    println!(
        "Ingest complete: {} merged, {} skipped (unchanged), {} failed",
        merged,
        skipped,
        failures.len()
    );
    for (file, reason) in &failures {
        println!("  failed {}: {}", file, reason);
    }
    println!(
        "Graph now has {} nodes, {} edges",
        store.node_count(),
        store.edge_count()
    );
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show graph status.
pub fn cmd_status(db_path: &Path, json_mode: bool) -> Result<(), SignalGraphError> {
    let store = load_store(db_path)?;
    let metadata = store.metadata();

    if json_mode {
        let output = serde_json::json!({
            "database": db_path.to_string_lossy(),
            "node_count": store.node_count(),
            "edge_count": store.edge_count(),
            "source_files": metadata.source_files.len(),
            "density_per_thousand": signalgraph_core::density_ppt(&store),
            "created_at": metadata.created_at.map(Timestamp::value),
            "last_updated": metadata.last_updated.map(Timestamp::value),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("SignalGraph Status");
    println!("==================");
    println!("Database: {}", db_path.display());
    println!();
    println!("Nodes:        {}", store.node_count());
    println!("Edges:        {}", store.edge_count());
    println!("Sources:      {}", metadata.source_files.len());
    println!(
        "Density:      {} per thousand",
        signalgraph_core::density_ppt(&store)
    );
    if let Some(created) = metadata.created_at {
        println!("Created:      {} (unix)", created.value());
    }
    if let Some(updated) = metadata.last_updated {
        println!("Last Update:  {} (unix)", updated.value());
    }

    Ok(())
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// Export the graph to canonical JSON or a binary snapshot.
pub fn cmd_export(db_path: &Path, output: &Path, format: &str) -> Result<(), SignalGraphError> {
    let store = load_store(db_path)?;
    let validated = validate_output_path(output)?;

    let bytes = match format {
        "json" => export_json(&store)?,
        "snapshot" => store_to_bytes(&store)?,
        _ => {
            return Err(SignalGraphError::Io(format!(
                "unknown export format: {} (expected 'json' or 'snapshot')",
                format
            )));
        }
    };

    std::fs::write(&validated, &bytes)
        .map_err(|e| SignalGraphError::Io(format!("write export: {}", e)))?;

    println!(
        "Exported {} nodes, {} edges to {} ({} bytes, {})",
        store.node_count(),
        store.edge_count(),
        validated.display(),
        bytes.len(),
        format
    );
    Ok(())
}

// =============================================================================
// IMPORT COMMAND
// =============================================================================

/// Import a graph, replacing the database.
pub fn cmd_import(db_path: &Path, input: &Path, format: &str) -> Result<(), SignalGraphError> {
    let validated = validate_file_path(input)?;
    validate_file_size(&validated, MAX_IMPORT_FILE_SIZE)?;

    let bytes = std::fs::read(&validated)
        .map_err(|e| SignalGraphError::Io(format!("read import: {}", e)))?;

    let store = match format {
        "json" => import_json(&bytes)?,
        "snapshot" => store_from_bytes(&bytes)?,
        _ => {
            return Err(SignalGraphError::Io(format!(
                "unknown import format: {} (expected 'json' or 'snapshot')",
                format
            )));
        }
    };

    save_store(&store, db_path)?;
    println!(
        "Imported {} nodes, {} edges into {}",
        store.node_count(),
        store.edge_count(),
        db_path.display()
    );
    Ok(())
}

// =============================================================================
// INSIGHTS COMMAND
// =============================================================================

/// Compute and print the analytics report.
pub fn cmd_insights(
    db_path: &Path,
    min_support: u64,
    json_mode: bool,
) -> Result<(), SignalGraphError> {
    let store = load_store(db_path)?;
    let report = signalgraph_core::report(&store, min_support);

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_default()
        );
        return Ok(());
    }

    println!("SignalGraph Insights");
    println!("====================");
    println!();
    println!("Nodes:   {}", report.summary.node_count);
    println!("Edges:   {}", report.summary.edge_count);
    println!("Density: {} per thousand", report.summary.density_ppt);
    for (kind, count) in &report.summary.nodes_by_kind {
        println!("  {:<12} {}", kind, count);
    }

    println!();
    println!("Degree (top by total):");
    let mut rows = report.degrees.clone();
    rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.id.cmp(&b.id)));
    for row in rows.iter().take(20) {
        println!(
            "  {:<40} in={} out={} total={} centrality={}ppt",
            row.id.as_str(),
            row.in_degree,
            row.out_degree,
            row.total,
            row.centrality_ppt
        );
    }

    println!();
    println!("Connected components: {}", report.components.len());
    for (index, component) in report.components.iter().enumerate() {
        println!("  component {} ({} members)", index, component.len());
    }

    println!();
    println!("Frequent motifs (support >= {}):", min_support);
    if report.motifs.is_empty() {
        println!("  none");
    }
    for motif in &report.motifs {
        println!(
            "  {} -[{}]-> {}  x{}",
            motif.source_kind.tag(),
            motif.label.as_str(),
            motif.target_kind.tag(),
            motif.count
        );
    }

    Ok(())
}

// =============================================================================
// VERIFY COMMAND
// =============================================================================

/// Verify consistency and canonical export stability.
pub fn cmd_verify(db_path: &Path) -> Result<(), SignalGraphError> {
    let store = load_store(db_path)?;

    store.check_consistency()?;

    let first = export_json(&store)?;
    let restored = import_json(&first)?;
    let second = export_json(&restored)?;

    if first != second {
        return Err(SignalGraphError::Consistency(
            "canonical export is not stable across a round-trip".to_string(),
        ));
    }
    if !store.logical_eq(&restored) {
        return Err(SignalGraphError::Consistency(
            "round-tripped graph differs from the stored graph".to_string(),
        ));
    }

    println!(
        "OK: {} nodes, {} edges, canonical export stable ({} bytes)",
        store.node_count(),
        store.edge_count(),
        first.len()
    );
    Ok(())
}
