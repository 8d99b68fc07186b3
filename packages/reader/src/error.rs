//! Error types for the reader.
//!
//! Only structural problems that make the object graph impossible to build
//! are errors. Recoverable conditions (dangling references, ambiguous roles,
//! missing column definitions) are reported as [`crate::context::Diagnostic`]
//! values instead.

use thiserror::Error;

/// Main error type for the reader library.
#[derive(Debug, Error)]
pub enum ReaderError {
    /// A declared model type id has no descriptor in the registry.
    #[error("Unknown model type: '{0}'")]
    UnknownType(String),

    /// A COLUMN points at a FIELD that is not inside a TABLE.
    #[error("COLUMN '{column}' points to a FIELD that does not have a TABLE parent")]
    OrphanColumn { column: String },

    /// Instance nesting exceeded the configured limit.
    #[error("Maximum build depth {max} exceeded while building '{type_id}'")]
    DepthExceeded { max: usize, type_id: String },

    /// A mapping element lacks an attribute it cannot be read without.
    #[error("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },

    /// A LITERAL declares a value type the coercion layer does not know.
    #[error("Unknown value type: '{0}'")]
    UnknownValueType(String),

    /// A literal could not be converted to its declared value type.
    #[error("Cannot convert '{value}' to {value_type}: {reason}")]
    Coercion {
        value: String,
        value_type: String,
        reason: String,
    },

    /// The table payload could not be decoded.
    #[error("Cannot decode table '{table}': {reason}")]
    TableDecode { table: String, reason: String },

    /// Strict mode only: fewer values than the declared lower bound.
    #[error("Role '{role}' requires at least {min} value(s), found {found}")]
    MultiplicityViolation { role: String, min: u32, found: usize },

    /// A model catalog is malformed.
    #[error("Invalid catalog: {0}")]
    Catalog(String),

    /// Reader options are out of range.
    #[error("Invalid reader options: {0}")]
    Config(String),

    /// XML parsing failed.
    #[error("XML parsing failed: {0}")]
    Xml(#[from] roxmltree::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML deserialization error.
    #[error("YAML parsing failed: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

/// Result type alias for reader operations.
pub type Result<T> = std::result::Result<T, ReaderError>;
