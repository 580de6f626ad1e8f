//! Owned compressed-column sparse matrices.
//!
//! The kernel works directly on the three CSC arrays (column pointers, row
//! indices, values), so it owns them outright instead of borrowing through
//! `sprs` views. Conversions to and from [`sprs::CsMat`] are provided for
//! callers that assemble their matrices with the `sprs` builders.

use crate::error::RowModError;
use sprs::{CsMat, TriMat};

/// Square or rectangular sparse matrix in compressed-column (CSC) format.
///
/// Structural invariants, enforced at construction:
/// - `colptr` has length `ncols + 1`, starts at 0, is monotone, and ends
///   at `nnz`;
/// - row indices are strictly increasing within each column and `< nrows`;
/// - `rowind` and `values` have the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseColMat {
    pub(crate) nrows: usize,
    pub(crate) ncols: usize,
    pub(crate) colptr: Vec<usize>,
    pub(crate) rowind: Vec<usize>,
    pub(crate) values: Vec<f64>,
}

impl SparseColMat {
    /// Build a matrix from raw CSC arrays, validating the structure.
    pub fn new(
        nrows: usize,
        ncols: usize,
        colptr: Vec<usize>,
        rowind: Vec<usize>,
        values: Vec<f64>,
    ) -> Result<Self, RowModError> {
        if colptr.len() != ncols + 1 {
            return Err(RowModError::InvalidStructure(format!(
                "colptr has length {}, expected {}",
                colptr.len(),
                ncols + 1
            )));
        }
        if colptr[0] != 0 {
            return Err(RowModError::InvalidStructure(format!(
                "colptr[0] is {}, expected 0",
                colptr[0]
            )));
        }
        if rowind.len() != values.len() {
            return Err(RowModError::InvalidStructure(format!(
                "rowind length {} does not match values length {}",
                rowind.len(),
                values.len()
            )));
        }
        if colptr[ncols] != rowind.len() {
            return Err(RowModError::InvalidStructure(format!(
                "colptr[{}] is {}, expected nnz {}",
                ncols,
                colptr[ncols],
                rowind.len()
            )));
        }
        for j in 0..ncols {
            if colptr[j] > colptr[j + 1] {
                return Err(RowModError::InvalidStructure(format!(
                    "colptr not monotone at column {}",
                    j
                )));
            }
            for p in colptr[j]..colptr[j + 1] {
                if rowind[p] >= nrows {
                    return Err(RowModError::InvalidStructure(format!(
                        "row index {} out of range in column {}",
                        rowind[p], j
                    )));
                }
                if p > colptr[j] && rowind[p] <= rowind[p - 1] {
                    return Err(RowModError::InvalidStructure(format!(
                        "row indices not strictly increasing in column {}",
                        j
                    )));
                }
            }
        }
        Ok(Self {
            nrows,
            ncols,
            colptr,
            rowind,
            values,
        })
    }

    /// Build a matrix from (row, col, value) triplets via `sprs`.
    pub fn from_triplets<I>(nrows: usize, ncols: usize, triplets: I) -> Result<Self, RowModError>
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        let mut tri = TriMat::new((nrows, ncols));
        for (i, j, v) in triplets {
            tri.add_triplet(i, j, v);
        }
        Self::from_csmat(&tri.to_csc())
    }

    /// Build a single sparse column of dimension `n` from (row, value) pairs.
    ///
    /// Entries need not be sorted; duplicate rows are rejected.
    pub fn column_vector(n: usize, entries: &[(usize, f64)]) -> Result<Self, RowModError> {
        let mut sorted: Vec<(usize, f64)> = entries.to_vec();
        sorted.sort_by_key(|&(r, _)| r);
        let rowind: Vec<usize> = sorted.iter().map(|&(r, _)| r).collect();
        let values: Vec<f64> = sorted.iter().map(|&(_, v)| v).collect();
        Self::new(n, 1, vec![0, rowind.len()], rowind, values)
    }

    /// Convert from an `sprs` matrix, re-compressing CSR input if needed.
    pub fn from_csmat(mat: &CsMat<f64>) -> Result<Self, RowModError> {
        let csc;
        let mat = if mat.is_csc() {
            mat
        } else {
            csc = mat.to_csc();
            &csc
        };
        let indptr = mat.indptr();
        Self::new(
            mat.rows(),
            mat.cols(),
            indptr.raw_storage().to_vec(),
            mat.indices().to_vec(),
            mat.data().to_vec(),
        )
    }

    /// Convert into an `sprs` CSC matrix.
    pub fn to_csmat(&self) -> CsMat<f64> {
        CsMat::new_csc(
            (self.nrows, self.ncols),
            self.colptr.clone(),
            self.rowind.clone(),
            self.values.clone(),
        )
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.nrows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.ncols
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.rowind.len()
    }

    /// Column pointer array (length `cols() + 1`).
    pub fn colptr(&self) -> &[usize] {
        &self.colptr
    }

    /// Row index array.
    pub fn rowind(&self) -> &[usize] {
        &self.rowind
    }

    /// Value array, parallel to `rowind()`.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Storage range of column `j`.
    pub fn col_range(&self, j: usize) -> std::ops::Range<usize> {
        assert!(j < self.ncols, "column {} out of range", j);
        self.colptr[j]..self.colptr[j + 1]
    }

    /// Row indices of column `j`.
    pub fn col_rowind(&self, j: usize) -> &[usize] {
        &self.rowind[self.col_range(j)]
    }

    /// Values of column `j`.
    pub fn col_values(&self, j: usize) -> &[f64] {
        &self.values[self.col_range(j)]
    }
}
