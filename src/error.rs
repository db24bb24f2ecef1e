//! Error types for permutation indexing and model loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building permutation tables.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PermutationError {
    /// A character outside the `o`/`w`/`h`/`l` alphabet.
    #[error("unknown role label {label:?} at position {position}")]
    UnknownRoleLabel { label: char, position: usize },

    /// The label string does not hold exactly two W, one H and one L tag.
    #[error("invalid role composition {labels:?}: {message}")]
    InvalidComposition { labels: String, message: String },

    /// Table columns that break the row invariant.
    #[error("invalid permutation table for {n_jets} jets: {message}")]
    InvalidTable { n_jets: usize, message: String },

    #[error("invalid indexer configuration: {0}")]
    InvalidConfig(String),

    /// The cached N=4 table no longer matches what the enumeration produces.
    #[error("reference table for {n_jets} jets diverges from the enumerated table")]
    ReferenceMismatch { n_jets: usize },
}

/// Errors raised while reading a tree ensemble from disk.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("line {line}: feature {name:?} is not one of the model inputs")]
    UnknownFeature { line: usize, name: String },

    /// A split references a child node the dump never defines.
    #[error("tree {tree}: node {node} is referenced but not defined")]
    MissingNode { tree: usize, node: usize },
}
