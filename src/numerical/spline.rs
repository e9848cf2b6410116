// SPDX-License-Identifier: AGPL-3.0-only

//! Natural cubic spline over strictly increasing knots.
//!
//! Fit solves the standard tridiagonal system for the second derivatives
//! with natural boundary conditions (y'' = 0 at both ends); evaluation,
//! first derivative, and the definite integral are the closed-form
//! per-segment expressions. Replaces the usual splrep/splev/splint trio
//! for this crate's fixed-resolution quadrature.

use super::locate::locate;

/// Natural cubic spline: knots, values, and second derivatives at the knots.
/// The `second_derivs`/`from_parts` pair is the persistable representation;
/// the cache stores those arrays rather than the struct itself.
#[derive(Debug, Clone)]
pub struct Spline {
    x: Vec<f64>,
    y: Vec<f64>,
    y2: Vec<f64>,
}

impl Spline {
    /// Fit a natural cubic spline through `(x, y)`.
    ///
    /// `x` must be strictly increasing with at least two knots and match
    /// `y` in length; violations are programmer errors and panic.
    #[must_use]
    pub fn fit(x: &[f64], y: &[f64]) -> Self {
        let n = x.len();
        assert!(n >= 2, "spline needs at least two knots, got {n}");
        assert_eq!(n, y.len(), "knot/value length mismatch");
        assert!(
            x.windows(2).all(|w| w[1] > w[0]),
            "spline knots must be strictly increasing"
        );

        let mut y2 = vec![0.0f64; n];
        let mut u = vec![0.0f64; n - 1];
        for i in 1..n - 1 {
            let sig = (x[i] - x[i - 1]) / (x[i + 1] - x[i - 1]);
            let p = sig * y2[i - 1] + 2.0;
            y2[i] = (sig - 1.0) / p;
            let dd = (y[i + 1] - y[i]) / (x[i + 1] - x[i])
                - (y[i] - y[i - 1]) / (x[i] - x[i - 1]);
            u[i] = (6.0 * dd / (x[i + 1] - x[i - 1]) - sig * u[i - 1]) / p;
        }
        y2[n - 1] = 0.0;
        for k in (0..n - 1).rev() {
            y2[k] = y2[k] * y2[k + 1] + u[k];
        }

        Self {
            x: x.to_vec(),
            y: y.to_vec(),
            y2,
        }
    }

    /// Rebuild a spline from persisted parts (knots, values, second
    /// derivatives), e.g. out of the table cache.
    #[must_use]
    pub fn from_parts(x: Vec<f64>, y: Vec<f64>, y2: Vec<f64>) -> Self {
        assert_eq!(x.len(), y.len(), "knot/value length mismatch");
        assert_eq!(x.len(), y2.len(), "knot/second-derivative length mismatch");
        Self { x, y, y2 }
    }

    /// Second derivatives at the knots (the persistable representation).
    #[must_use]
    pub fn second_derivs(&self) -> &[f64] {
        &self.y2
    }

    fn segment(&self, xv: f64) -> usize {
        locate(&self.x, xv).min(self.x.len() - 2)
    }

    /// Evaluate the spline at `xv` (end-segment polynomial extension
    /// outside the knot span).
    #[must_use]
    pub fn eval(&self, xv: f64) -> f64 {
        let j = self.segment(xv);
        let h = self.x[j + 1] - self.x[j];
        let a = (self.x[j + 1] - xv) / h;
        let b = (xv - self.x[j]) / h;
        a * self.y[j]
            + b * self.y[j + 1]
            + ((a.powi(3) - a) * self.y2[j] + (b.powi(3) - b) * self.y2[j + 1]) * h * h / 6.0
    }

    /// First derivative of the spline at `xv`.
    #[must_use]
    pub fn deriv1(&self, xv: f64) -> f64 {
        let j = self.segment(xv);
        let h = self.x[j + 1] - self.x[j];
        let a = (self.x[j + 1] - xv) / h;
        let b = (xv - self.x[j]) / h;
        (self.y[j + 1] - self.y[j]) / h
            + h / 6.0
                * (-(3.0 * a * a - 1.0) * self.y2[j] + (3.0 * b * b - 1.0) * self.y2[j + 1])
    }

    /// Definite integral over `[a, b]`, clamped to the knot span.
    ///
    /// Per-segment antiderivative of the cubic, summed analytically — no
    /// quadrature error beyond the fit itself.
    #[must_use]
    pub fn integral(&self, a: f64, b: f64) -> f64 {
        let (lo, hi, sign) = if a <= b { (a, b, 1.0) } else { (b, a, -1.0) };
        let n = self.x.len();
        let lo = lo.max(self.x[0]);
        let hi = hi.min(self.x[n - 1]);
        if hi <= lo {
            return 0.0;
        }

        let mut total = 0.0;
        let j_lo = self.segment(lo);
        let j_hi = self.segment(hi);
        for j in j_lo..=j_hi {
            let u = lo.max(self.x[j]);
            let v = hi.min(self.x[j + 1]);
            if v > u {
                total += self.segment_antideriv(j, v) - self.segment_antideriv(j, u);
            }
        }
        sign * total
    }

    /// Antiderivative of segment `j` evaluated at `t` (t inside segment j).
    fn segment_antideriv(&self, j: usize, t: f64) -> f64 {
        let h = self.x[j + 1] - self.x[j];
        let a = (self.x[j + 1] - t) / h;
        let b = (t - self.x[j]) / h;
        -h * a * a / 2.0 * self.y[j]
            + h * b * b / 2.0 * self.y[j + 1]
            + h.powi(3) / 6.0
                * ((a * a / 2.0 - a.powi(4) / 4.0) * self.y2[j]
                    + (b.powi(4) / 4.0 - b * b / 2.0) * self.y2[j + 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(n: usize, a: f64, b: f64) -> Vec<f64> {
        (0..n)
            .map(|i| a + (b - a) * i as f64 / (n - 1) as f64)
            .collect()
    }

    #[test]
    fn reproduces_knot_values_exactly() {
        let x = grid(9, 0.0, 4.0);
        let y: Vec<f64> = x.iter().map(|&v| v * v - 1.5 * v).collect();
        let s = Spline::fit(&x, &y);
        for (xi, yi) in x.iter().zip(&y) {
            assert!(
                (s.eval(*xi) - yi).abs() < 1e-12,
                "knot ({xi}, {yi}) not interpolated"
            );
        }
    }

    #[test]
    fn linear_data_is_exact_everywhere() {
        let x = grid(5, -2.0, 2.0);
        let y: Vec<f64> = x.iter().map(|&v| 3.0 * v + 1.0).collect();
        let s = Spline::fit(&x, &y);
        assert!((s.eval(0.37) - (3.0 * 0.37 + 1.0)).abs() < 1e-12);
        assert!((s.deriv1(-1.2) - 3.0).abs() < 1e-12);
        // ∫(3x+1) over [-2,2] = 4
        assert!((s.integral(-2.0, 2.0) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn sin_interpolation_accuracy() {
        let x = grid(51, 0.0, std::f64::consts::PI);
        let y: Vec<f64> = x.iter().map(|&v| v.sin()).collect();
        let s = Spline::fit(&x, &y);
        assert!((s.eval(1.0) - 1.0f64.sin()).abs() < 1e-6);
        assert!((s.deriv1(1.0) - 1.0f64.cos()).abs() < 1e-4);
        // ∫ sin over [0, π] = 2
        assert!((s.integral(0.0, std::f64::consts::PI) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn integral_is_antisymmetric_in_bounds() {
        let x = grid(11, 0.0, 1.0);
        let y: Vec<f64> = x.iter().map(|&v| v.exp()).collect();
        let s = Spline::fit(&x, &y);
        let fwd = s.integral(0.1, 0.9);
        let bwd = s.integral(0.9, 0.1);
        assert!((fwd + bwd).abs() < 1e-14);
    }

    #[test]
    fn integral_clamps_to_knot_span() {
        let x = grid(5, 0.0, 1.0);
        let y = vec![1.0; 5];
        let s = Spline::fit(&x, &y);
        // Constant 1 over a unit span: out-of-range bounds clamp, not extend.
        assert!((s.integral(-10.0, 10.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn parts_roundtrip_preserves_evaluation() {
        let x = grid(7, 0.0, 3.0);
        let y: Vec<f64> = x.iter().map(|&v| (v - 1.0).powi(3)).collect();
        let s = Spline::fit(&x, &y);
        let rebuilt = Spline::from_parts(x.clone(), y, s.second_derivs().to_vec());
        assert_eq!(s.eval(1.37).to_bits(), rebuilt.eval(1.37).to_bits());
    }

    #[test]
    #[should_panic(expected = "strictly increasing")]
    fn non_monotone_knots_panic() {
        let _ = Spline::fit(&[0.0, 1.0, 0.5], &[0.0, 1.0, 2.0]);
    }
}
