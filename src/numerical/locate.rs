// SPDX-License-Identifier: AGPL-3.0-only

//! Bisection table locator for ascending grids.

/// Locate `x` in the ascending table `xx` by bisection.
///
/// Returns the largest index `j` with `xx[j] <= x`, clamped to
/// `[0, xx.len() - 1]`: a target below the first entry maps to 0, a target
/// at or above the last entry maps to the last index. No interpolation —
/// callers read the co-indexed value directly (floor semantics).
#[must_use]
pub fn locate(xx: &[f64], x: f64) -> usize {
    let n = xx.len();
    if n <= 1 {
        return 0;
    }
    let mut lo = 0usize;
    let mut hi = n;
    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        if x >= xx[mid] {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo
}
