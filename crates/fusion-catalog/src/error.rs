//! Catalog error types.

use std::path::PathBuf;

use fusion_models::MAX_CHARACTERS;
use thiserror::Error;

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors raised while aggregating, resolving or materializing.
///
/// Only [`CatalogError::is_fatal`] errors abort a run; everything else is
/// reported for the offending unit and the run continues.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Character capacity exceeded: cannot create more than {} characters", MAX_CHARACTERS)]
    CapacityExceeded,

    #[error("Entity name '{0}' is empty after normalization")]
    EmptyName(String),

    #[error("Malformed document {path}: {reason}")]
    MalformedDocument { path: PathBuf, reason: String },

    #[error("Malformed character table row {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    #[error("Unreadable character table {path}: {reason}")]
    MalformedTable { path: PathBuf, reason: String },

    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl CatalogError {
    pub fn malformed_document(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed_row(line: u64, reason: impl Into<String>) -> Self {
        Self::MalformedRow {
            line,
            reason: reason.into(),
        }
    }

    pub fn malformed_table(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedTable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error must abort the run.
    ///
    /// Exhausting the id space is an invariant violation. An unreadable table
    /// header would otherwise renumber every character and overwrite the
    /// table, so it aborts as well.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CatalogError::CapacityExceeded | CatalogError::MalformedTable { .. }
        )
    }
}
