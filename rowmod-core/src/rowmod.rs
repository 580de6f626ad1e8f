//! Row/column modification of a sparse LDL^T factorization.
//!
//! Given L·D·L^T = C and a pattern-preserving change of row and column `k`
//! of C from `before` to `after`, this module recomputes the factor values
//! without refactorizing, following Davis and Hager, "Row modification of
//! a sparse Cholesky factorization" (2005), section 4.
//!
//! Writing the symmetric permutation that moves row/column k last as
//!
//! ```text
//! C = [ C11   c12   C31^T ]
//!     [ c12^T c22   c32^T ]
//!     [ C31   c32   C33   ]
//! ```
//!
//! the change touches `c12`, `c22`, and `c32` only. The kernel proceeds in
//! four phases: index the occurrences of row k in the leading block of L,
//! forward-substitute the column delta through L11·D11 to correct `l12`
//! and the pivot `d22`, correct `l32`, and finally propagate the change
//! into L33 as one rank-1 update interleaved with one rank-1 downdate via
//! hyperbolic rotations, one pair per affected row.

use crate::error::RowModError;
use crate::factor::LdlFactor;
use crate::sparse::SparseColMat;

/// Reusable scratch buffers for [`row_modify_with`].
///
/// All dense vectors are sized to the matrix dimension and zero-filled at
/// the start of every call; contents after a call are unspecified. Reuse
/// across calls avoids reallocation, but a fresh workspace gives identical
/// results.
#[derive(Debug, Default)]
pub struct RowModWorkspace {
    /// Dense correction to l12, later rescaled to D11 * delta_l12
    delta_l12: Vec<f64>,
    /// Accumulator for w = L31 * D11 * delta_l12
    w: Vec<f64>,
    /// Rank-1 update direction (old column scaled by sqrt(d_old))
    wu: Vec<f64>,
    /// Rank-1 downdate direction (new column scaled by sqrt(d_new))
    wd: Vec<f64>,
    /// Storage offsets of row k within columns j < k of L
    row_offsets: Vec<usize>,
    /// Matching column indices, ascending
    row_cols: Vec<usize>,
}

impl RowModWorkspace {
    /// Create a workspace for matrices of dimension `n`.
    pub fn new(n: usize) -> Self {
        Self {
            delta_l12: vec![0.0; n],
            w: vec![0.0; n],
            wu: vec![0.0; n],
            wd: vec![0.0; n],
            row_offsets: Vec::with_capacity(n),
            row_cols: Vec::with_capacity(n),
        }
    }

    fn reset(&mut self, n: usize) {
        self.delta_l12.clear();
        self.delta_l12.resize(n, 0.0);
        self.w.clear();
        self.w.resize(n, 0.0);
        self.wu.clear();
        self.wu.resize(n, 0.0);
        self.wd.clear();
        self.wd.resize(n, 0.0);
        self.row_offsets.clear();
        self.row_cols.clear();
    }
}

/// Update the factorization after row and column `k` of C change.
///
/// `before` and `after` are sparse column vectors holding the old and new
/// column `k` of C. They must share one nonzero pattern, which contains
/// row `k` and introduces no fill into L. The input factor is not touched;
/// a new factor with the identical pattern and recomputed values is
/// returned.
///
/// Allocates its own scratch buffers; use [`row_modify_with`] to reuse a
/// workspace across calls.
pub fn row_modify(
    factor: &LdlFactor,
    before: &SparseColMat,
    after: &SparseColMat,
    k: usize,
) -> Result<LdlFactor, RowModError> {
    let mut ws = RowModWorkspace::new(factor.dim());
    row_modify_with(factor, before, after, k, &mut ws)
}

/// [`row_modify`] with caller-provided scratch buffers.
pub fn row_modify_with(
    factor: &LdlFactor,
    before: &SparseColMat,
    after: &SparseColMat,
    k: usize,
    ws: &mut RowModWorkspace,
) -> Result<LdlFactor, RowModError> {
    let l = factor.matrix();
    let n = l.rows();

    check_shapes(n, before, after, k)?;
    ws.reset(n);

    // Phase 1: locate row k in columns 0..k of L.
    index_row_pattern(l, k, &mut ws.row_offsets, &mut ws.row_cols);

    // All pattern preconditions are checked before the output is allocated.
    let cind = check_patterns(l, before, after, k, &ws.row_cols)?;

    let mut out = l.clone();

    let (d_old, d_new) = solve_leading_block(l, &mut out, before, after, k, cind, ws);

    if k < n - 1 {
        correct_trailing_column(l, &mut out, before, after, k, cind, d_old, d_new, ws);
        rotate_trailing_block(l, &mut out, k, d_old, d_new, ws);
    }

    Ok(LdlFactor::from_validated(out))
}

fn check_shapes(
    n: usize,
    before: &SparseColMat,
    after: &SparseColMat,
    k: usize,
) -> Result<(), RowModError> {
    for col in [before, after] {
        if col.cols() != 1 {
            return Err(RowModError::NotColumnVector { cols: col.cols() });
        }
        if col.rows() != n {
            return Err(RowModError::DimensionMismatch {
                expected: n,
                actual: col.rows(),
            });
        }
    }
    if k >= n {
        return Err(RowModError::PivotOutOfRange { k, n });
    }
    Ok(())
}

/// Verify the no-fill preconditions and return the offset of row `k`
/// within the update-column pattern.
///
/// The original algorithm assumes these hold and silently corrupts the
/// output when they do not; here every violation is a reported error.
fn check_patterns(
    l: &SparseColMat,
    before: &SparseColMat,
    after: &SparseColMat,
    k: usize,
    row_cols: &[usize],
) -> Result<usize, RowModError> {
    let pattern = before.col_rowind(0);
    if pattern != after.col_rowind(0) {
        return Err(RowModError::PatternMismatch(
            "before and after columns have different nonzero patterns".into(),
        ));
    }

    let cind = pattern
        .binary_search(&k)
        .map_err(|_| RowModError::MissingPivotEntry { k })?;

    // Rows above the pivot must hit stored entries of row k in the leading
    // block, rows below it stored entries of column k.
    let col_k = l.col_rowind(k);
    let mut q = 1; // col_k[0] is the diagonal
    for &r in pattern {
        if r < k {
            if row_cols.binary_search(&r).is_err() {
                return Err(RowModError::PatternMismatch(format!(
                    "update row {} has no stored entry in row {} of L",
                    r, k
                )));
            }
        } else if r > k {
            while q < col_k.len() && col_k[q] < r {
                q += 1;
            }
            if q >= col_k.len() || col_k[q] != r {
                return Err(RowModError::PatternMismatch(format!(
                    "update row {} has no stored entry in column {} of L",
                    r, k
                )));
            }
        }
    }
    Ok(cind)
}

/// Phase 1: record (storage offset, column) of every occurrence of row `k`
/// in columns 0..k of L. Offsets are valid for any matrix sharing L's
/// pattern.
fn index_row_pattern(
    l: &SparseColMat,
    k: usize,
    offsets: &mut Vec<usize>,
    cols: &mut Vec<usize>,
) {
    for j in 0..k {
        for p in l.col_range(j) {
            if l.rowind[p] == k {
                offsets.push(p);
                cols.push(j);
            }
        }
    }
}

/// Phase 2: solve `L11 D11 delta = after - before` (rows < k) by forward
/// substitution, fold the correction into the stored l12 entries of `out`,
/// and compute the new pivot.
///
/// Returns `(d_old, d_new)`. On exit `ws.delta_l12` holds D11 * delta,
/// which phase 3 consumes.
fn solve_leading_block(
    l: &SparseColMat,
    out: &mut SparseColMat,
    before: &SparseColMat,
    after: &SparseColMat,
    k: usize,
    cind: usize,
    ws: &mut RowModWorkspace,
) -> (f64, f64) {
    let bx = before.col_values(0);
    let ax = after.col_values(0);
    let d_old = l.values[l.colptr[k]];
    let mut d_new = d_old + (ax[cind] - bx[cind]);

    if k == 0 {
        out.values[out.colptr[0]] = d_new;
        return (d_old, d_new);
    }

    let delta = &mut ws.delta_l12;
    for (p, &r) in before.col_rowind(0).iter().enumerate() {
        if r >= k {
            break;
        }
        delta[r] = ax[p] - bx[p];
    }

    // Forward substitution through the triangular leading block.
    for j in 0..k {
        let rng = l.col_range(j);
        for p in rng.start + 1..rng.end {
            let r = l.rowind[p];
            if r >= k {
                break;
            }
            delta[r] -= l.values[p] * delta[j];
        }
        delta[j] /= l.values[rng.start];
    }

    // Accumulate into the stored l12 values (out still holds the old ones).
    for (&off, &j) in ws.row_offsets.iter().zip(&ws.row_cols) {
        out.values[off] += delta[j];
    }

    // d_new -= sum_j (delta_j * d_j) * (l12_old[j] + l12_new[j]),
    // rescaling delta to D11 * delta along the way for phase 3.
    for (&off, &j) in ws.row_offsets.iter().zip(&ws.row_cols) {
        delta[j] *= l.values[l.colptr[j]];
        d_new -= delta[j] * (l.values[off] + out.values[off]);
    }
    out.values[out.colptr[k]] = d_new;

    (d_old, d_new)
}

/// Phase 3: rewrite the stored entries of column `k` below the diagonal as
/// `l32_new = (delta_c + l32_old * d_old - w) / d_new`, where
/// `w = L31 * D11 * delta_l12` captures the leading-block change
/// propagating below the pivot (zero when k == 0).
#[allow(clippy::too_many_arguments)]
fn correct_trailing_column(
    l: &SparseColMat,
    out: &mut SparseColMat,
    before: &SparseColMat,
    after: &SparseColMat,
    k: usize,
    cind: usize,
    d_old: f64,
    d_new: f64,
    ws: &mut RowModWorkspace,
) {
    let w = &mut ws.w;
    if k > 0 {
        for j in 0..k {
            for p in l.col_range(j) {
                let r = l.rowind[p];
                if r > k {
                    w[r] += l.values[p] * ws.delta_l12[j];
                }
            }
        }
    }

    // Merge the update-column delta into column k, walking both sorted
    // patterns in lockstep.
    let pattern = before.col_rowind(0);
    let bx = before.col_values(0);
    let ax = after.col_values(0);
    let mut c = cind + 1;
    let rng = l.col_range(k);
    for p in rng.start + 1..rng.end {
        let r = out.rowind[p];
        let mut dc = 0.0;
        if c < pattern.len() && pattern[c] == r {
            dc = ax[c] - bx[c];
            c += 1;
        }
        out.values[p] = (dc + out.values[p] * d_old - w[r]) / d_new;
    }
}

/// Phase 4: propagate the column-k change into the trailing block L33.
///
/// One rank-1 update (direction: old l32 scaled by sqrt(d_old)) and one
/// rank-1 downdate (new l32 scaled by sqrt(d_new)) are applied as a single
/// pass of hyperbolic rotations. The update and downdate steps must be
/// interleaved per row: each row's rotation reads pivots and directions
/// already advanced by the rows before it, so running all updates and then
/// all downdates computes a different factorization.
fn rotate_trailing_block(
    l: &SparseColMat,
    out: &mut SparseColMat,
    k: usize,
    d_old: f64,
    d_new: f64,
    ws: &mut RowModWorkspace,
) {
    let n = l.rows();
    let wu = &mut ws.wu;
    let wd = &mut ws.wd;

    let sq_old = d_old.sqrt();
    let sq_new = d_new.sqrt();
    let rng = l.col_range(k);
    for p in rng.start + 1..rng.end {
        let r = l.rowind[p];
        wu[r] = l.values[p] * sq_old;
        wd[r] = out.values[p] * sq_new;
    }

    let mut alpha = 1.0;
    let mut alpha2 = 1.0;
    for i in k + 1..n {
        if wu[i] == 0.0 {
            continue;
        }
        let di = out.colptr[i];

        // Update step
        let beta = alpha + wu[i] * wu[i] / out.values[di];
        let gamma = wu[i] / (beta * out.values[di]);
        out.values[di] *= beta / alpha;
        alpha = beta;

        // Downdate step, on the already-updated pivot
        let beta2 = alpha2 - wd[i] * wd[i] / out.values[di];
        let gamma2 = wd[i] / (beta2 * out.values[di]);
        out.values[di] *= beta2 / alpha2;
        alpha2 = beta2;

        for p in di + 1..out.colptr[i + 1] {
            let r = out.rowind[p];
            wu[r] -= wu[i] * out.values[p];
            out.values[p] += gamma * wu[r];

            wd[r] -= wd[i] * out.values[p];
            out.values[p] -= gamma2 * wd[r];
        }
    }
}
