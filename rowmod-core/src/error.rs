//! Error types for the row-modification kernel.

use thiserror::Error;

/// Errors surfaced by factor construction and the row-modification kernel.
///
/// All errors are terminal for the call: no partially updated output is
/// ever returned, and the inputs are never mutated.
#[derive(Error, Debug)]
pub enum RowModError {
    /// The factor matrix is not square
    #[error("matrix is not square: {rows}x{cols}")]
    NotSquare {
        /// Number of rows
        rows: usize,
        /// Number of columns
        cols: usize,
    },

    /// Dimension mismatch between the factor and an update column
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// An update column is not a single-column matrix
    #[error("update column must have exactly one column, got {cols}")]
    NotColumnVector {
        /// Actual number of columns
        cols: usize,
    },

    /// Invalid compressed-column structure (colptr or row indices)
    #[error("invalid compressed-column structure: {0}")]
    InvalidStructure(String),

    /// A factor column does not store its diagonal entry first
    #[error("column {col} has no stored diagonal entry")]
    MissingDiagonal {
        /// Offending column
        col: usize,
    },

    /// The pivot index is outside the matrix dimension
    #[error("pivot index {k} out of range for dimension {n}")]
    PivotOutOfRange {
        /// Requested pivot index
        k: usize,
        /// Matrix dimension
        n: usize,
    },

    /// Nonzero patterns of the update columns and the factor disagree
    #[error("sparsity pattern mismatch: {0}")]
    PatternMismatch(String),

    /// The update columns have no explicit entry at the pivot row
    #[error("update column has no entry at pivot row {k}")]
    MissingPivotEntry {
        /// Pivot index
        k: usize,
    },
}
