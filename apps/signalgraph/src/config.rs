//! # Application Configuration
//!
//! Optional `signalgraph.toml` tuning the built-in extractor and the
//! insights defaults. Every field has a compiled-in default; a missing
//! config file is not an error.
//!
//! ```toml
//! [extractor]
//! technologies = ["rust", "postgresql"]
//! org_suffixes = ["Inc", "Labs"]
//!
//! [insights]
//! min_support = 3
//! ```

use serde::Deserialize;
use signalgraph_core::SignalGraphError;
use signalgraph_core::primitives::DEFAULT_MIN_SUPPORT;
use std::path::Path;

/// Default config file name looked up in the working directory.
const DEFAULT_CONFIG_FILE: &str = "signalgraph.toml";

// =============================================================================
// CONFIG TYPES
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub extractor: ExtractorConfig,
    pub insights: InsightsConfig,
}

/// Vocabulary for the built-in rule extractor.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractorConfig {
    /// Known technology names, matched case-insensitively.
    pub technologies: Vec<String>,
    /// Trailing tokens that mark a capitalized run as an organization.
    pub org_suffixes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InsightsConfig {
    /// Minimum support for frequent motif reporting.
    pub min_support: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            extractor: ExtractorConfig::default(),
            insights: InsightsConfig::default(),
        }
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            technologies: [
                "rust",
                "python",
                "java",
                "javascript",
                "postgresql",
                "kubernetes",
                "docker",
                "linux",
                "tensorflow",
                "react",
                "graphql",
                "redis",
            ]
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
            org_suffixes: ["Inc", "Corp", "Labs", "Ltd", "LLC", "GmbH"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            min_support: DEFAULT_MIN_SUPPORT,
        }
    }
}

// =============================================================================
// LOADING
// =============================================================================

impl AppConfig {
    /// Load configuration.
    ///
    /// An explicit `--config` path must exist; the implicit
    /// `./signalgraph.toml` is used only when present.
    pub fn load(path: Option<&Path>) -> Result<Self, SignalGraphError> {
        let path = match path {
            Some(explicit) => explicit.to_path_buf(),
            None => {
                let implicit = Path::new(DEFAULT_CONFIG_FILE);
                if !implicit.exists() {
                    return Ok(Self::default());
                }
                implicit.to_path_buf()
            }
        };

        let contents = std::fs::read_to_string(&path).map_err(|e| {
            SignalGraphError::Io(format!("read config '{}': {}", path.display(), e))
        })?;
        toml::from_str(&contents).map_err(|e| SignalGraphError::Validation {
            file: path.display().to_string(),
            reason: format!("invalid config: {}", e),
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
