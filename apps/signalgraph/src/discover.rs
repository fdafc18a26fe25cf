//! # Source Discovery
//!
//! Deterministic discovery of text files under a data directory.
//!
//! Files are collected recursively, filtered to text extensions, and
//! returned sorted by their normalized relative path. The order is a
//! pure function of directory contents, never of filesystem iteration
//! order, so repeated runs visit files identically.

use sha2::{Digest, Sha256};
use signalgraph_core::SignalGraphError;
use std::path::Path;

/// Extensions treated as ingestible text.
const TEXT_EXTENSIONS: [&str; 3] = ["txt", "md", "text"];

/// One discovered source file, read and checksummed.
pub struct SourceFile {
    /// Relative path from the data directory, with `/` separators.
    pub path: String,
    /// Hex-encoded SHA-256 of the raw file contents.
    pub checksum: String,
    /// File contents decoded as UTF-8 (lossy).
    pub text: String,
}

/// Recursively discover text files under `dir`, sorted by relative path.
pub fn discover_files(dir: &Path) -> Result<Vec<SourceFile>, SignalGraphError> {
    if !dir.is_dir() {
        return Err(SignalGraphError::Io(format!(
            "data directory '{}' does not exist or is not a directory",
            dir.display()
        )));
    }

    let mut relative_paths = Vec::new();
    collect_paths(dir, dir, &mut relative_paths)?;
    relative_paths.sort();

    let mut sources = Vec::with_capacity(relative_paths.len());
    for relative in relative_paths {
        let absolute = dir.join(&relative);
        let bytes = std::fs::read(&absolute).map_err(|e| {
            SignalGraphError::Io(format!("read '{}': {}", absolute.display(), e))
        })?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let checksum = format!("{:x}", hasher.finalize());

        sources.push(SourceFile {
            path: relative,
            checksum,
            text: String::from_utf8_lossy(&bytes).into_owned(),
        });
    }

    Ok(sources)
}

/// Walk the tree, collecting normalized relative paths of text files.
fn collect_paths(
    root: &Path,
    dir: &Path,
    out: &mut Vec<String>,
) -> Result<(), SignalGraphError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| SignalGraphError::Io(format!("read dir '{}': {}", dir.display(), e)))?;

    for entry in entries {
        let entry =
            entry.map_err(|e| SignalGraphError::Io(format!("read dir entry: {}", e)))?;
        let path = entry.path();

        if path.is_dir() {
            collect_paths(root, &path, out)?;
            continue;
        }

        let is_text = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext.to_lowercase().as_str()));
        if !is_text {
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(&path);
        let normalized = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        out.push(normalized);
    }

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
