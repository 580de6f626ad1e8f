//! Sparse LDL^T factorization storage.

use crate::error::RowModError;
use crate::sparse::SparseColMat;

/// Sparse LDL^T factorization of a symmetric matrix C.
///
/// L and D share one CSC matrix: the first stored entry of column `j` is
/// the diagonal, holding the pivot `D_jj`, and the entries below it are
/// the off-diagonal values of the unit-lower-triangular factor L. This is
/// the storage convention of the CHOLMOD family of LDL codes.
#[derive(Debug, Clone, PartialEq)]
pub struct LdlFactor {
    l: SparseColMat,
}

impl LdlFactor {
    /// Wrap a CSC matrix as a factorization, validating the storage rules.
    ///
    /// Requires a square matrix whose every column stores its diagonal
    /// entry first (row indices are sorted, so the matrix is necessarily
    /// lower triangular when this holds).
    pub fn new(l: SparseColMat) -> Result<Self, RowModError> {
        if l.rows() != l.cols() {
            return Err(RowModError::NotSquare {
                rows: l.rows(),
                cols: l.cols(),
            });
        }
        for j in 0..l.cols() {
            let rng = l.col_range(j);
            if rng.is_empty() || l.rowind()[rng.start] != j {
                return Err(RowModError::MissingDiagonal { col: j });
            }
        }
        Ok(Self { l })
    }

    // Used by the kernel: the output shares the input's already-validated
    // pattern, so revalidation is skipped.
    pub(crate) fn from_validated(l: SparseColMat) -> Self {
        Self { l }
    }

    /// Matrix dimension n.
    pub fn dim(&self) -> usize {
        self.l.rows()
    }

    /// Pivot `D_jj` for column `j`.
    pub fn pivot(&self, j: usize) -> f64 {
        self.l.values[self.l.col_range(j).start]
    }

    /// Borrow the underlying CSC storage.
    pub fn matrix(&self) -> &SparseColMat {
        &self.l
    }

    /// Take the underlying CSC storage.
    pub fn into_matrix(self) -> SparseColMat {
        self.l
    }

    /// Solve `L D L^T x = b` by substitution.
    pub fn solve(&self, b: &[f64]) -> Vec<f64> {
        let n = self.dim();
        assert_eq!(b.len(), n);

        let mut x = b.to_vec();
        let l = &self.l;

        // L z = b (unit diagonal, skip the stored pivot)
        for j in 0..n {
            let rng = l.col_range(j);
            for p in rng.start + 1..rng.end {
                x[l.rowind[p]] -= l.values[p] * x[j];
            }
        }
        // D w = z
        for j in 0..n {
            x[j] /= self.pivot(j);
        }
        // L^T x = w
        for j in (0..n).rev() {
            let rng = l.col_range(j);
            for p in rng.start + 1..rng.end {
                x[j] -= l.values[p] * x[l.rowind[p]];
            }
        }
        x
    }
}
