//! Rowmod: incremental row/column modification of sparse LDL^T factorizations
//!
//! Given a factorization L·D·L^T = C of a symmetric matrix and a change to
//! one row and the matching column of C that preserves the sparsity
//! pattern, this library recomputes the factor values directly instead of
//! refactorizing, using the Davis-Hager row-modification algorithm:
//!
//! - forward substitution of the column delta through the unchanged
//!   leading block corrects `l12` and the pivot;
//! - a single pass of interleaved rank-1 update/downdate hyperbolic
//!   rotations propagates the change through the trailing block.
//!
//! The cost is proportional to the nonzeros touched by column k's
//! subtree rather than the whole factorization, which is what makes
//! repeated single-column changes (e.g. inside an iterative inference or
//! active-set loop) cheap.
//!
//! The kernel never mutates its inputs: it returns a freshly allocated
//! factor sharing the input's pattern. Pattern-changing updates are out of
//! scope and rejected, as is factorizing from scratch.
//!
//! # Example
//!
//! ```
//! use rowmod_core::{row_modify, LdlFactor, SparseColMat};
//!
//! // C = diag(4, 3) factors as L = I, D = diag(4, 3)
//! let l = SparseColMat::new(2, 2, vec![0, 1, 2], vec![0, 1], vec![4.0, 3.0])?;
//! let factor = LdlFactor::new(l)?;
//!
//! // Column 0 of C changes from [4, 0] to [9, 0]
//! let before = SparseColMat::column_vector(2, &[(0, 4.0)])?;
//! let after = SparseColMat::column_vector(2, &[(0, 9.0)])?;
//!
//! let updated = row_modify(&factor, &before, &after, 0)?;
//! assert_eq!(updated.pivot(0), 9.0);
//! assert_eq!(updated.pivot(1), 3.0);
//! # Ok::<(), rowmod_core::RowModError>(())
//! ```
//!
//! # References
//!
//! - T. A. Davis and W. W. Hager, "Row modification of a sparse Cholesky
//!   factorization", SIAM J. Matrix Anal. Appl. 26(3), 2005 (section 4).

#![warn(clippy::all)]

pub mod error;
pub mod factor;
pub mod rowmod;
pub mod sparse;

pub use error::RowModError;
pub use factor::LdlFactor;
pub use rowmod::{row_modify, row_modify_with, RowModWorkspace};
pub use sparse::SparseColMat;
