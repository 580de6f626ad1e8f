//! End-to-end tests for the row-modification kernel.
//!
//! Factorizations are built from dense references (nalgebra Cholesky,
//! rescaled to LDL^T) and the kernel's output is checked both against a
//! from-scratch factorization of the modified matrix and by reconstructing
//! L·D·L^T.

use nalgebra::DMatrix;
use rowmod_core::{row_modify, LdlFactor, RowModError, SparseColMat};

/// Factor a dense SPD matrix and store L and D at the given lower
/// triangular pattern. `pattern[j]` lists the row indices of column j,
/// starting with the diagonal.
fn ldl_with_pattern(c: &DMatrix<f64>, pattern: &[Vec<usize>]) -> LdlFactor {
    let n = c.nrows();
    assert_eq!(pattern.len(), n);

    let chol = c.clone().cholesky().expect("matrix not positive definite");
    let l = chol.l();

    let mut colptr = vec![0usize];
    let mut rowind = Vec::new();
    let mut values = Vec::new();
    for (j, rows) in pattern.iter().enumerate() {
        assert_eq!(rows[0], j, "pattern must start with the diagonal");
        for &i in rows {
            rowind.push(i);
            if i == j {
                values.push(l[(j, j)] * l[(j, j)]);
            } else {
                values.push(l[(i, j)] / l[(j, j)]);
            }
        }
        colptr.push(rowind.len());
    }

    let mat = SparseColMat::new(n, n, colptr, rowind, values).unwrap();
    LdlFactor::new(mat).unwrap()
}

/// Dense L·D·L^T of a factor.
fn reconstruct(f: &LdlFactor) -> DMatrix<f64> {
    let n = f.dim();
    let m = f.matrix();

    let mut l = DMatrix::<f64>::identity(n, n);
    let mut d = DMatrix::<f64>::zeros(n, n);
    for j in 0..n {
        let rows = m.col_rowind(j);
        let vals = m.col_values(j);
        d[(j, j)] = vals[0];
        for (&i, &v) in rows.iter().zip(vals).skip(1) {
            l[(i, j)] = v;
        }
    }
    &l * d * l.transpose()
}

/// Extract column `k` of a dense matrix at the given row pattern.
fn column_at(c: &DMatrix<f64>, k: usize, rows: &[usize]) -> SparseColMat {
    let entries: Vec<(usize, f64)> = rows.iter().map(|&r| (r, c[(r, k)])).collect();
    SparseColMat::column_vector(c.nrows(), &entries).unwrap()
}

fn assert_close(a: f64, b: f64, what: &str) {
    let tol = 1e-9 * (1.0 + b.abs());
    assert!((a - b).abs() < tol, "{}: {} vs {}", what, a, b);
}

fn assert_factors_match(got: &LdlFactor, expected: &LdlFactor) {
    assert_eq!(got.matrix().colptr(), expected.matrix().colptr());
    assert_eq!(got.matrix().rowind(), expected.matrix().rowind());
    for (p, (a, b)) in got
        .matrix()
        .values()
        .iter()
        .zip(expected.matrix().values())
        .enumerate()
    {
        assert_close(*a, *b, &format!("factor value at offset {}", p));
    }
}

fn tridiag_c() -> DMatrix<f64> {
    DMatrix::from_row_slice(3, 3, &[4.0, 1.0, 0.0, 1.0, 5.0, 2.0, 0.0, 2.0, 6.0])
}

fn tridiag_pattern() -> Vec<Vec<usize>> {
    vec![vec![0, 1], vec![1, 2], vec![2]]
}

/// Replace row and column `k` of `c` with the given full column.
fn replace_row_col(c: &DMatrix<f64>, k: usize, col: &[f64]) -> DMatrix<f64> {
    let mut out = c.clone();
    for i in 0..c.nrows() {
        out[(i, k)] = col[i];
        out[(k, i)] = col[i];
    }
    out
}

#[test]
fn interior_update_matches_direct_factorization() {
    let c = tridiag_c();
    let factor = ldl_with_pattern(&c, &tridiag_pattern());

    let c2 = replace_row_col(&c, 1, &[1.5, 6.0, 1.0]);
    let before = column_at(&c, 1, &[0, 1, 2]);
    let after = column_at(&c2, 1, &[0, 1, 2]);

    let updated = row_modify(&factor, &before, &after, 1).unwrap();
    let direct = ldl_with_pattern(&c2, &tridiag_pattern());
    assert_factors_match(&updated, &direct);
}

#[test]
fn interior_update_reconstructs_modified_matrix() {
    let c = tridiag_c();
    let factor = ldl_with_pattern(&c, &tridiag_pattern());

    let c2 = replace_row_col(&c, 1, &[1.5, 6.0, 1.0]);
    let before = column_at(&c, 1, &[0, 1, 2]);
    let after = column_at(&c2, 1, &[0, 1, 2]);

    let updated = row_modify(&factor, &before, &after, 1).unwrap();
    let rebuilt = reconstruct(&updated);
    for i in 0..3 {
        for j in 0..3 {
            assert_close(rebuilt[(i, j)], c2[(i, j)], &format!("C'[{},{}]", i, j));
        }
    }
}

#[test]
fn pattern_arrays_are_preserved() {
    let c = tridiag_c();
    let factor = ldl_with_pattern(&c, &tridiag_pattern());

    let c2 = replace_row_col(&c, 1, &[1.5, 6.0, 1.0]);
    let before = column_at(&c, 1, &[0, 1, 2]);
    let after = column_at(&c2, 1, &[0, 1, 2]);

    let updated = row_modify(&factor, &before, &after, 1).unwrap();
    assert_eq!(updated.matrix().colptr(), factor.matrix().colptr());
    assert_eq!(updated.matrix().rowind(), factor.matrix().rowind());
}

#[test]
fn round_trip_restores_original_factor() {
    let c = tridiag_c();
    let factor = ldl_with_pattern(&c, &tridiag_pattern());

    let c2 = replace_row_col(&c, 1, &[1.5, 6.0, 1.0]);
    let before = column_at(&c, 1, &[0, 1, 2]);
    let after = column_at(&c2, 1, &[0, 1, 2]);

    let updated = row_modify(&factor, &before, &after, 1).unwrap();
    let restored = row_modify(&updated, &after, &before, 1).unwrap();
    assert_factors_match(&restored, &factor);
}

#[test]
fn first_column_update_runs_trailing_phases_only() {
    let c = tridiag_c();
    let factor = ldl_with_pattern(&c, &tridiag_pattern());

    // Column 0 of a tridiagonal matrix touches rows {0, 1}
    let c2 = replace_row_col(&c, 0, &[5.0, 0.5, 0.0]);
    let before = column_at(&c, 0, &[0, 1]);
    let after = column_at(&c2, 0, &[0, 1]);

    let updated = row_modify(&factor, &before, &after, 0).unwrap();
    let direct = ldl_with_pattern(&c2, &tridiag_pattern());
    assert_factors_match(&updated, &direct);
}

#[test]
fn last_column_update_runs_leading_phases_only() {
    let c = tridiag_c();
    let factor = ldl_with_pattern(&c, &tridiag_pattern());

    let c2 = replace_row_col(&c, 2, &[0.0, 2.5, 7.0]);
    let before = column_at(&c, 2, &[1, 2]);
    let after = column_at(&c2, 2, &[1, 2]);

    let updated = row_modify(&factor, &before, &after, 2).unwrap();
    let direct = ldl_with_pattern(&c2, &tridiag_pattern());
    assert_factors_match(&updated, &direct);

    // Column 0 is untouched by a last-column update
    assert_eq!(updated.pivot(0), factor.pivot(0));
}

#[test]
fn missing_pivot_entry_is_rejected() {
    let c = tridiag_c();
    let factor = ldl_with_pattern(&c, &tridiag_pattern());

    let before = SparseColMat::column_vector(3, &[(0, 1.0), (2, 2.0)]).unwrap();
    let after = SparseColMat::column_vector(3, &[(0, 1.5), (2, 1.0)]).unwrap();

    let err = row_modify(&factor, &before, &after, 1).unwrap_err();
    assert!(
        matches!(err, RowModError::MissingPivotEntry { k: 1 }),
        "unexpected error: {:?}",
        err
    );
}

fn dense_spd_6x6() -> DMatrix<f64> {
    let b = DMatrix::from_fn(6, 6, |i, j| ((i * 7 + j * 3) % 5) as f64 * 0.3 - 0.5);
    &b * b.transpose() + DMatrix::identity(6, 6) * 6.0
}

fn full_lower_pattern(n: usize) -> Vec<Vec<usize>> {
    (0..n).map(|j| (j..n).collect()).collect()
}

#[test]
fn dense_pattern_update_exercises_all_phases() {
    let c = dense_spd_6x6();
    let pattern = full_lower_pattern(6);
    let factor = ldl_with_pattern(&c, &pattern);

    let k = 2;
    let mut col: Vec<f64> = (0..6).map(|i| c[(i, k)]).collect();
    let bump = [0.1, -0.2, 0.3, 0.05, -0.1, 0.2];
    for (ci, bi) in col.iter_mut().zip(bump) {
        *ci += bi;
    }
    let c2 = replace_row_col(&c, k, &col);

    let rows: Vec<usize> = (0..6).collect();
    let before = column_at(&c, k, &rows);
    let after = column_at(&c2, k, &rows);

    let updated = row_modify(&factor, &before, &after, k).unwrap();
    let direct = ldl_with_pattern(&c2, &pattern);
    assert_factors_match(&updated, &direct);

    let rebuilt = reconstruct(&updated);
    for i in 0..6 {
        for j in 0..6 {
            assert_close(rebuilt[(i, j)], c2[(i, j)], &format!("C'[{},{}]", i, j));
        }
    }
}

#[test]
fn repeated_updates_stay_consistent() {
    let c = dense_spd_6x6();
    let pattern = full_lower_pattern(6);
    let mut factor = ldl_with_pattern(&c, &pattern);
    let mut current = c.clone();
    let rows: Vec<usize> = (0..6).collect();

    for (step, k) in [1usize, 4, 0, 5].into_iter().enumerate() {
        let mut col: Vec<f64> = (0..6).map(|i| current[(i, k)]).collect();
        for (i, ci) in col.iter_mut().enumerate() {
            *ci += 0.05 * ((step + i + 1) as f64).sin();
        }
        let next = replace_row_col(&current, k, &col);

        let before = column_at(&current, k, &rows);
        let after = column_at(&next, k, &rows);
        factor = row_modify(&factor, &before, &after, k).unwrap();
        current = next;
    }

    let rebuilt = reconstruct(&factor);
    for i in 0..6 {
        for j in 0..6 {
            assert_close(
                rebuilt[(i, j)],
                current[(i, j)],
                &format!("C'[{},{}]", i, j),
            );
        }
    }
}

#[test]
fn solve_agrees_with_dense_reference() {
    let c = tridiag_c();
    let factor = ldl_with_pattern(&c, &tridiag_pattern());

    let b = nalgebra::DVector::from_row_slice(&[1.0, -2.0, 3.0]);
    let expected = c.clone().lu().solve(&b).unwrap();
    let x = factor.solve(b.as_slice());
    for i in 0..3 {
        assert_close(x[i], expected[i], &format!("x[{}]", i));
    }
}

#[test]
fn updated_factor_solves_modified_system() {
    let c = tridiag_c();
    let factor = ldl_with_pattern(&c, &tridiag_pattern());

    let c2 = replace_row_col(&c, 1, &[1.5, 6.0, 1.0]);
    let before = column_at(&c, 1, &[0, 1, 2]);
    let after = column_at(&c2, 1, &[0, 1, 2]);
    let updated = row_modify(&factor, &before, &after, 1).unwrap();

    let b = nalgebra::DVector::from_row_slice(&[2.0, 0.5, -1.0]);
    let expected = c2.clone().lu().solve(&b).unwrap();
    let x = updated.solve(b.as_slice());
    for i in 0..3 {
        assert_close(x[i], expected[i], &format!("x[{}]", i));
    }
}
