//! Error types for galley.
//!
//! Resolution failures (`NotFound`, `Cycle`, `VersionConstraint`) are distinct
//! variants so adapters can map them onto their own conventions.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for galley operations.
pub type GalleyResult<T> = Result<T, GalleyError>;

/// Main error type for galley operations.
#[derive(Error, Debug)]
pub enum GalleyError {
    /// No definition stored under this slug
    #[error("recipe not found: {slug}")]
    NotFound { slug: String },

    /// No snapshot stored for this slug and date
    #[error("iteration not found: {slug}@{date}")]
    IterationNotFound { slug: String, date: String },

    /// A slug was re-entered while still being resolved
    #[error("cycle detected in recipe dependencies: {}", chain.join(" -> "))]
    Cycle { chain: Vec<String> },

    /// A resolved dependency does not satisfy the declared constraint
    #[error("{dependent}: {dependency} version {actual} does not satisfy {required}")]
    VersionConstraint {
        dependent: String,
        dependency: String,
        required: String,
        actual: String,
    },

    /// Overlaying a patch produced a record of the wrong shape
    #[error("patch for '{id}' produced an invalid record: {source}")]
    Patch {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    /// Date key is not a YYYY-MM-DD calendar date
    #[error("invalid date '{date}': use YYYY-MM-DD")]
    InvalidDate { date: String },

    /// Slug contains characters not allowed in a directory name
    #[error("invalid slug '{slug}': use lowercase letters, digits, '-' and '_'")]
    InvalidSlug { slug: String },

    /// Refusing to overwrite an existing recipe directory
    #[error("already exists: {path}")]
    AlreadyExists { path: PathBuf },

    /// Filesystem error
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON record
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Stored record does not have the shape of a definition
    #[error("recipe {slug} has an invalid definition: {source}")]
    InvalidRecord {
        slug: String,
        #[source]
        source: serde_json::Error,
    },

    /// Serializing a document for output failed
    #[error("cannot serialize {what}: {message}")]
    Serialize { what: &'static str, message: String },

    /// Malformed galley.toml
    #[error("invalid config {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// One or more recipes failed validation
    #[error("{failed} recipe(s) failed validation")]
    ValidationFailed { failed: usize },

    /// Live definitions differ from their latest snapshot
    #[error("{count} recipe(s) drifted from their latest snapshot")]
    Drifted { count: usize },
}

impl GalleyError {
    /// True for a missing recipe or a missing snapshot.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::IterationNotFound { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
