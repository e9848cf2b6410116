// SPDX-License-Identifier: AGPL-3.0-only

//! Cosmological and grid constants

/// Critical density today in units of h² M☉ Mpc⁻³ (2.76×10¹¹).
pub const RHO_CRIT_H2: f64 = 2.76e+11;

/// Smallest halo mass on the σ(M) grid, M☉. The grid is log-spaced from
/// here up to the configured maximum mass.
pub const MASS_GRID_MIN: f64 = 1.0e+4;

/// Grid points per decade of mass (also sets the redshift-history resolution).
pub const GRID_POINTS_PER_DECADE: f64 = 1000.0;

/// Sheth–Tormen amplitude A (Sheth & Tormen, MNRAS 308, 119, 1999).
pub const ST_AMPLITUDE: f64 = 0.322;

/// Sheth–Tormen a = 0.707.
pub const ST_A: f64 = 0.707;

/// Sheth–Tormen p = 0.3.
pub const ST_P: f64 = 0.3;
