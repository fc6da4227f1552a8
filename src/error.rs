//! Error taxonomy for the extraction core.
//!
//! Everything here is fatal: the run aborts with the message and no ruleset
//! is printed. Glue code (store, CSV, child process) uses `anyhow` and wraps
//! these via `?`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Error connecting to the database, invalid or missing {0}")]
    InvalidConnection(String),

    #[error("the specified classifier `{0}` is invalid; choose one of CART, RIPPERk, IREP")]
    UnsupportedAlgorithm(String),

    #[error("missing-value threshold must lie in [0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("class attribute `{attribute}` must have exactly two distinct values, found {found}")]
    ClassDomain { attribute: String, found: usize },

    #[error("couldn't translate attribute `{name}` of type {kind}")]
    UnsupportedAttribute { name: String, kind: String },

    #[error("attribute `{0}` is not present in the dataset")]
    MissingAttribute(String),

    #[error("dataset is empty after conditioning ({rows} rows, {columns} feature columns)")]
    EmptyDataset { rows: usize, columns: usize },

    #[error("malformed decision tree: {0}")]
    MalformedTree(String),

    #[error("malformed rule `{line}`: {reason}")]
    MalformedRule { line: String, reason: String },
}

impl ExtractError {
    /// Invalid inputs from the caller: connection, algorithm, class domain,
    /// attribute types.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ExtractError::InvalidConnection(_)
                | ExtractError::UnsupportedAlgorithm(_)
                | ExtractError::InvalidThreshold(_)
                | ExtractError::ClassDomain { .. }
                | ExtractError::UnsupportedAttribute { .. }
                | ExtractError::MissingAttribute(_)
        )
    }

    pub fn is_data_quality(&self) -> bool {
        matches!(self, ExtractError::EmptyDataset { .. })
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;
