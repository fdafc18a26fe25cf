//! # Snapshot Format
//!
//! Binary serialization for the CLI's working database.
//!
//! Format: Header (5 bytes) + postcard-serialized canonical document.
//! - 4 bytes: Magic ("SGDB")
//! - 1 byte: Version
//!
//! The snapshot is an internal convenience; canonical JSON remains the
//! sole external contract. All size and header validation occurs BEFORE
//! payload deserialization so corrupted data cannot trigger
//! allocation-based memory exhaustion.

use crate::canonical;
use crate::graph::GraphStore;
use crate::primitives::{FORMAT_VERSION, MAGIC_BYTES, MAX_SNAPSHOT_PAYLOAD_SIZE};
use crate::types::SignalGraphError;

/// Minimum valid file size (header only).
const MIN_FILE_SIZE: usize = 5;

// =============================================================================
// FILE HEADER
// =============================================================================

/// The snapshot header precedes all graph data.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl SnapshotHeader {
    /// Create a new header with the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *MAGIC_BYTES,
            version: FORMAT_VERSION,
        }
    }

    /// Validate the header.
    pub fn validate(&self) -> Result<(), SignalGraphError> {
        if &self.magic != MAGIC_BYTES {
            return Err(SignalGraphError::Serialization(
                "invalid magic bytes".to_string(),
            ));
        }
        if self.version != FORMAT_VERSION {
            return Err(SignalGraphError::Serialization(format!(
                "unsupported snapshot version: {} (expected {})",
                self.version, FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Write the header to bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 5] {
        let mut bytes = [0u8; 5];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Read a header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignalGraphError> {
        if bytes.len() < MIN_FILE_SIZE {
            return Err(SignalGraphError::Serialization(
                "header too short".to_string(),
            ));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a store to snapshot bytes (header + payload).
///
/// Pure transformation, no file I/O. save -> load -> save is bit-exact
/// because the payload is the canonical document.
pub fn store_to_bytes(store: &GraphStore) -> Result<Vec<u8>, SignalGraphError> {
    let header = SnapshotHeader::new();
    let document = canonical::to_document(store);

    let payload = postcard::to_stdvec(&document)
        .map_err(|e| SignalGraphError::Serialization(e.to_string()))?;

    let mut result = Vec::with_capacity(MIN_FILE_SIZE + payload.len());
    result.extend_from_slice(&header.to_bytes());
    result.extend_from_slice(&payload);

    Ok(result)
}

/// Deserialize a store from snapshot bytes.
///
/// Validates minimum size, maximum size, and the header before touching
/// the payload; the payload then goes through the same element-level
/// validation as a JSON import, so a corrupt snapshot can never yield an
/// inconsistent store.
pub fn store_from_bytes(bytes: &[u8]) -> Result<GraphStore, SignalGraphError> {
    if bytes.len() < MIN_FILE_SIZE {
        return Err(SignalGraphError::Serialization(
            "data too short: minimum 5 bytes required".to_string(),
        ));
    }

    if bytes.len() > MAX_SNAPSHOT_PAYLOAD_SIZE {
        return Err(SignalGraphError::Serialization(format!(
            "data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_SNAPSHOT_PAYLOAD_SIZE
        )));
    }

    let header = SnapshotHeader::from_bytes(bytes)?;
    header.validate()?;

    let payload = &bytes[MIN_FILE_SIZE..];
    let document = postcard::from_bytes(payload).map_err(|e| {
        SignalGraphError::Serialization(format!("failed to deserialize snapshot payload: {e}"))
    })?;

    canonical::from_document(document).map_err(|e| match e {
        SignalGraphError::Format { element, reason } => SignalGraphError::Serialization(format!(
            "snapshot payload invalid at {element}: {reason}"
        )),
        other => other,
    })
}

// =============================================================================
// TESTS
// =============================================================================
