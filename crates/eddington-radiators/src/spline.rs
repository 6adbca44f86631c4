//! Cubic spline interpolation for tabulated cross-sections.
//!
//! Absorption cross-sections are tabulated at discrete wavelengths and vary
//! over several orders of magnitude across a band. The absorber radiators
//! interpolate $\ln \sigma(\lambda)$ with a natural cubic spline, which keeps
//! the interpolated cross-section positive and smooth between data points.

use eddington_grid::Real;

use crate::radiator::RadiatorError;

/// A natural cubic spline interpolator for real-valued data.
///
/// Given $n$ data points $(x_i, y_i)$, constructs piecewise cubic polynomials
/// with continuous first and second derivatives and zero curvature at both
/// ends.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    /// Sorted x values (knots).
    xs: Vec<Real>,
    /// Corresponding y values.
    ys: Vec<Real>,
    /// Second derivatives at each knot (computed during construction).
    y2s: Vec<Real>,
}

impl CubicSpline {
    /// Construct a natural cubic spline from data points.
    ///
    /// # Arguments
    /// * `xs` - Strictly increasing x values.
    /// * `ys` - Corresponding y values (same length as `xs`).
    ///
    /// # Errors
    /// [`RadiatorError::DataError`] if the lengths differ, fewer than two
    /// points are given, or `xs` is not strictly increasing.
    pub fn new(xs: Vec<Real>, ys: Vec<Real>) -> Result<Self, RadiatorError> {
        if xs.len() != ys.len() {
            return Err(RadiatorError::DataError(format!(
                "spline needs equal-length data, got {} x values and {} y values",
                xs.len(),
                ys.len()
            )));
        }
        if xs.len() < 2 {
            return Err(RadiatorError::DataError(
                "spline needs at least 2 data points".into(),
            ));
        }
        if let Some(i) = (1..xs.len()).find(|&i| !(xs[i] > xs[i - 1])) {
            return Err(RadiatorError::DataError(format!(
                "spline x values must be strictly increasing at index {i}"
            )));
        }

        let n = xs.len();
        let mut y2s = vec![0.0; n];
        let mut u = vec![0.0; n - 1];

        // Forward sweep (tridiagonal system for natural spline)
        for i in 1..n - 1 {
            let sig = (xs[i] - xs[i - 1]) / (xs[i + 1] - xs[i - 1]);
            let p = sig * y2s[i - 1] + 2.0;
            y2s[i] = (sig - 1.0) / p;
            u[i] = (ys[i + 1] - ys[i]) / (xs[i + 1] - xs[i])
                - (ys[i] - ys[i - 1]) / (xs[i] - xs[i - 1]);
            u[i] = (6.0 * u[i] / (xs[i + 1] - xs[i - 1]) - sig * u[i - 1]) / p;
        }

        // Back substitution
        for k in (0..n - 2).rev() {
            y2s[k + 1] = y2s[k + 1] * y2s[k + 2] + u[k + 1];
        }

        Ok(Self { xs, ys, y2s })
    }

    /// The interval `[x_first, x_last]` covered by the data.
    pub fn range(&self) -> (Real, Real) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    /// Evaluate the spline at a given x value.
    ///
    /// Extrapolation beyond the data range uses the boundary polynomial.
    pub fn evaluate(&self, x: Real) -> Real {
        let n = self.xs.len();

        // Binary search for the enclosing interval
        let mut lo = 0;
        let mut hi = n - 1;
        while hi - lo > 1 {
            let mid = (lo + hi) / 2;
            if self.xs[mid] > x {
                hi = mid;
            } else {
                lo = mid;
            }
        }

        let h = self.xs[hi] - self.xs[lo];
        let a = (self.xs[hi] - x) / h;
        let b = (x - self.xs[lo]) / h;

        a * self.ys[lo]
            + b * self.ys[hi]
            + ((a * a * a - a) * self.y2s[lo] + (b * b * b - b) * self.y2s[hi]) * h * h / 6.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TEST_TOL;

    #[test]
    fn test_spline_passes_through_data_points() {
        let xs = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let ys = vec![2.0, 3.0, 5.0, 4.0, 1.0];
        let spline = CubicSpline::new(xs.clone(), ys.clone()).unwrap();

        for (x, y) in xs.iter().zip(ys.iter()) {
            let result = spline.evaluate(*x);
            assert!(
                (result - y).abs() < TEST_TOL,
                "Spline({}) = {} but expected {}",
                x,
                result,
                y
            );
        }
    }

    #[test]
    fn test_spline_reproduces_linear_data() {
        let xs = vec![0.0, 1.0, 2.5, 4.0];
        let ys: Vec<Real> = xs.iter().map(|x| 3.0 * x - 1.0).collect();
        let spline = CubicSpline::new(xs, ys).unwrap();
        assert!((spline.evaluate(1.75) - 4.25).abs() < TEST_TOL);
    }

    #[test]
    fn test_spline_rejects_unsorted_knots() {
        let err = CubicSpline::new(vec![1.0, 3.0, 2.0], vec![0.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(err, RadiatorError::DataError(_)));
    }
}
