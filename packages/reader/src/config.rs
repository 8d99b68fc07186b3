//! Configuration for the reader.
//!
//! Limits are compile-time constants; per-session behaviour is controlled by
//! [`ReaderOptions`], which can be built in code or loaded from YAML.
//!
//! # Security Considerations
//!
//! The limits guard against:
//! - Deeply nested compositions (stack overflow)
//! - Reference chains without stable ids (unbounded recursion)
//! - Oversized input files (memory exhaustion)

use std::path::Path;

use serde::Deserialize;

use crate::error::{ReaderError, Result};

/// Default maximum nesting depth of instance construction.
///
/// Every nested INSTANCE (composition, structured attribute, followed
/// reference) adds one level. Real annotation blocks rarely go beyond 10.
pub const MAX_BUILD_DEPTH: usize = 128;

/// Maximum size in bytes of a document read from disk (256 MB).
///
/// TABLEDATA payloads are kept in memory next to the DOM, so the limit is
/// generous but finite.
pub const MAX_DOCUMENT_SIZE: u64 = 256 * 1024 * 1024;

/// Tag of an instance region.
pub const INSTANCE_TAG: &str = "INSTANCE";
/// Tag of an attribute role region.
pub const ATTRIBUTE_TAG: &str = "ATTRIBUTE";
/// Tag of a reference role region.
pub const REFERENCE_TAG: &str = "REFERENCE";
/// Tag of a composition role region.
pub const COMPOSITION_TAG: &str = "COMPOSITION";

/// Per-session reader behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReaderOptions {
    /// Maximum instance nesting depth before the parse fails.
    pub max_depth: usize,

    /// Fail when a field resolves to fewer values than its `min_occurs`.
    ///
    /// Off by default: lower bounds are informational only.
    pub strict_multiplicity: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            max_depth: MAX_BUILD_DEPTH,
            strict_multiplicity: false,
        }
    }
}

impl ReaderOptions {
    /// Create default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum build depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Enable or disable strict multiplicity checking.
    #[must_use]
    pub fn with_strict_multiplicity(mut self, strict: bool) -> Self {
        self.strict_multiplicity = strict;
        self
    }

    /// Check the options for values no parse can run with.
    ///
    /// # Errors
    /// Returns `Config` when `max_depth` is 0.
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(ReaderError::Config(
                "max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse options from a YAML string. Missing keys keep their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let options: Self = serde_yaml_ng::from_str(yaml)?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }
}
