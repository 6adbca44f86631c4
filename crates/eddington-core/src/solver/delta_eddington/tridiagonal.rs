//! Thomas algorithm for tridiagonal systems.
//!
//! Gaussian elimination without pivoting specialised to three bands: a
//! forward sweep normalises every row against the one above it, then back
//! substitution runs from the last row to the first. Work and storage are
//! linear in the number of rows.

use crate::solver::SolverError;
use crate::types::Real;

/// Solve the tridiagonal system $a_i x_{i-1} + b_i x_i + c_i x_{i+1} = d_i$.
///
/// # Arguments
/// * `lower` - Sub-diagonal $a$ (`lower[0]` unused).
/// * `main` - Main diagonal $b$.
/// * `upper` - Super-diagonal $c$ (`upper[n - 1]` unused).
/// * `rhs` - Right-hand side $d$.
///
/// # Errors
/// * [`SolverError::DimensionMismatch`] if the bands differ in length.
/// * [`SolverError::NumericalInstability`] naming the row whose pivot
///   $b_i - a_i c'_{i-1}$ is zero to working precision or not finite.
pub fn thomas_solve(
    lower: &[Real],
    main: &[Real],
    upper: &[Real],
    rhs: &[Real],
) -> Result<Vec<Real>, SolverError> {
    let n = rhs.len();
    for (what, len) in [
        ("sub-diagonal", lower.len()),
        ("main diagonal", main.len()),
        ("super-diagonal", upper.len()),
    ] {
        if len != n {
            return Err(SolverError::DimensionMismatch {
                what: what.to_string(),
                expected: n,
                found: len,
            });
        }
    }
    if n == 0 {
        return Ok(Vec::new());
    }

    let mut c_prime = vec![0.0; n];
    let mut d_prime = vec![0.0; n];

    // Forward sweep
    for i in 0..n {
        let (coupling, carried_rhs) = if i == 0 {
            (0.0, 0.0)
        } else {
            (lower[i] * c_prime[i - 1], lower[i] * d_prime[i - 1])
        };
        let pivot = main[i] - coupling;
        if !pivot.is_finite() || pivot.abs() <= Real::EPSILON * (main[i].abs() + coupling.abs()) {
            return Err(SolverError::instability("tridiagonal pivot", i, pivot));
        }
        if i < n - 1 {
            c_prime[i] = upper[i] / pivot;
        }
        d_prime[i] = (rhs[i] - carried_rhs) / pivot;
    }

    // Back substitution
    let mut x = vec![0.0; n];
    x[n - 1] = d_prime[n - 1];
    for i in (0..n - 1).rev() {
        x[i] = d_prime[i] - c_prime[i] * x[i + 1];
    }

    Ok(x)
}

/// Residual $\max_i |a_i x_{i-1} + b_i x_i + c_i x_{i+1} - d_i|$ of a
/// solution.
#[cfg(test)]
pub(crate) fn max_residual(lower: &[Real], main: &[Real], upper: &[Real], rhs: &[Real], x: &[Real]) -> Real {
    let n = x.len();
    (0..n)
        .map(|i| {
            let mut row = main[i] * x[i] - rhs[i];
            if i > 0 {
                row += lower[i] * x[i - 1];
            }
            if i + 1 < n {
                row += upper[i] * x[i + 1];
            }
            row.abs()
        })
        .fold(0.0, Real::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TEST_TOL;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_thomas_identity() {
        let n = 5;
        let lower = vec![0.0; n];
        let main = vec![1.0; n];
        let upper = vec![0.0; n];
        let rhs = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let x = thomas_solve(&lower, &main, &upper, &rhs).unwrap();
        assert_eq!(x, rhs);
    }

    #[test]
    fn test_thomas_laplacian() {
        // [ 2 -1  0  0]       [1]
        // [-1  2 -1  0] x  =  [0]
        // [ 0 -1  2 -1]       [0]
        // [ 0  0 -1  2]       [1]
        let lower = vec![0.0, -1.0, -1.0, -1.0];
        let main = vec![2.0; 4];
        let upper = vec![-1.0, -1.0, -1.0, 0.0];
        let rhs = vec![1.0, 0.0, 0.0, 1.0];
        let x = thomas_solve(&lower, &main, &upper, &rhs).unwrap();
        for value in &x {
            assert_abs_diff_eq!(*value, 1.0, epsilon = TEST_TOL);
        }
    }

    #[test]
    fn test_thomas_residual_is_round_off() {
        let n = 40;
        let lower: Vec<Real> = (0..n).map(|i| if i == 0 { 0.0 } else { -0.3 - 0.01 * i as Real }).collect();
        let main: Vec<Real> = (0..n).map(|i| 3.0 + (i as Real).sin()).collect();
        let upper: Vec<Real> = (0..n).map(|i| if i == n - 1 { 0.0 } else { 0.7 }).collect();
        let rhs: Vec<Real> = (0..n).map(|i| (i as Real * 0.37).cos()).collect();
        let x = thomas_solve(&lower, &main, &upper, &rhs).unwrap();
        assert!(max_residual(&lower, &main, &upper, &rhs, &x) < TEST_TOL);
    }

    #[test]
    fn test_zero_pivot_names_the_row() {
        // Row 1 pivot: 1 - 1 * (1 / 1) = 0
        let lower = vec![0.0, 1.0, 0.0];
        let main = vec![1.0, 1.0, 1.0];
        let upper = vec![1.0, 1.0, 0.0];
        let rhs = vec![1.0, 1.0, 1.0];
        match thomas_solve(&lower, &main, &upper, &rhs) {
            Err(SolverError::NumericalInstability { layer, .. }) => assert_eq!(layer, Some(1)),
            other => panic!("expected a zero pivot, got {other:?}"),
        }
    }

    #[test]
    fn test_band_length_mismatch() {
        let err = thomas_solve(&[0.0], &[1.0, 1.0], &[0.0, 0.0], &[1.0, 1.0]).unwrap_err();
        assert!(matches!(err, SolverError::DimensionMismatch { .. }));
    }
}
