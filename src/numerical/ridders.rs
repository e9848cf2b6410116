// SPDX-License-Identifier: AGPL-3.0-only

//! Ridders-extrapolation numerical derivative.
//!
//! Polynomial extrapolation of central differences to vanishing step size
//! (Ridders, Adv. Eng. Software 4, 75, 1982; Numerical Recipes §5.7). The
//! tableau's own error estimate decides convergence — callers get the best
//! answer found, not the answer at a fixed step.

/// Step shrink factor per tableau column.
const CON: f64 = 1.4;
const CON2: f64 = CON * CON;

/// Tableau size: extrapolation stops after this many step refinements.
const NTAB: usize = 10;

/// Abort when the error grows by this factor over the best seen.
const SAFE: f64 = 2.0;

/// Derivative of `f` at `x` by Ridders extrapolation with initial step `h`.
///
/// Returns `(df, err)`: the best derivative estimate and its internal error
/// estimate. `h` should be an interval over which `f` changes substantially,
/// not an infinitesimal; it must be nonzero.
pub fn dfridr(f: impl Fn(f64) -> f64, x: f64, h: f64) -> (f64, f64) {
    assert!(h != 0.0, "dfridr requires a nonzero initial step");

    let mut a = [[0.0f64; NTAB]; NTAB];
    let mut hh = h.abs();
    a[0][0] = (f(x + hh) - f(x - hh)) / (2.0 * hh);
    let mut ans = a[0][0];
    let mut err = f64::MAX;

    for i in 1..NTAB {
        hh /= CON;
        a[0][i] = (f(x + hh) - f(x - hh)) / (2.0 * hh);
        let mut fac = CON2;
        for j in 1..=i {
            a[j][i] = (a[j - 1][i] * fac - a[j - 1][i - 1]) / (fac - 1.0);
            fac *= CON2;
            let errt = (a[j][i] - a[j - 1][i])
                .abs()
                .max((a[j][i] - a[j - 1][i - 1]).abs());
            if errt <= err {
                err = errt;
                ans = a[j][i];
            }
        }
        if (a[i][i] - a[i - 1][i - 1]).abs() >= SAFE * err {
            break;
        }
    }
    (ans, err)
}
