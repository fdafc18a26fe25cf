//! # Innate Primitives
//!
//! Hardcoded runtime constants for the SignalGraph engine.
//!
//! These limits are compiled into the binary and immutable at runtime.
//! They bound every ingestion and import path so that malformed or
//! malicious input cannot exhaust memory.

/// Magic bytes for the SignalGraph binary snapshot header.
///
/// File Header = Magic Bytes ("SGDB") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"SGDB";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the snapshot format.
pub const FORMAT_VERSION: u8 = 1;

/// Maximum confidence percent. Extraction confidence is fixed-point
/// `0..=100`; a deterministic rule match is exactly 100.
pub const CONFIDENCE_MAX: u8 = 100;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for entity surface text and display labels.
pub const MAX_LABEL_LENGTH: usize = 512;

/// Maximum length for extraction rule identifiers.
pub const MAX_RULE_LENGTH: usize = 128;

/// Maximum length for source file paths recorded in provenance.
pub const MAX_SOURCE_PATH_LENGTH: usize = 1024;

/// Maximum length for source checksums (hex SHA-256 is 64).
pub const MAX_CHECKSUM_LENGTH: usize = 128;

/// Maximum number of candidates (entities plus relations) in one file batch.
///
/// Batches larger than this are rejected to prevent DoS.
pub const MAX_BATCH_CANDIDATES: usize = 10_000;

// =============================================================================
// IMPORT LIMITS
// =============================================================================

/// Maximum allowed node count in imports.
///
/// Validated before the store is populated to prevent memory exhaustion
/// from malicious or corrupted data.
pub const MAX_IMPORT_NODE_COUNT: usize = 1_000_000;

/// Maximum allowed edge count in imports.
pub const MAX_IMPORT_EDGE_COUNT: usize = 10_000_000;

/// Maximum allowed snapshot payload size (500 MB).
///
/// Validated BEFORE attempting deserialization to prevent allocation-based
/// DoS from corrupted headers.
pub const MAX_SNAPSHOT_PAYLOAD_SIZE: usize = 500 * 1024 * 1024;

// =============================================================================
// INSIGHTS DEFAULTS
// =============================================================================

/// Default minimum support for frequent motif reporting.
pub const DEFAULT_MIN_SUPPORT: u64 = 2;

/// Scale for integer ratio metrics (centrality, density): parts per thousand.
pub const RATIO_SCALE: u64 = 1000;
