// SPDX-License-Identifier: AGPL-3.0-only

//! Background-cosmology collaborator contract.
//!
//! The `Structures` engine never computes growth factors, densities, or the
//! mass–variance relation itself; it consumes them through this trait. Any
//! flat (Ωm + ΩΛ = 1) background model can drive the engine by implementing
//! it. The `Sync` bound lets the table builder evaluate the per-redshift
//! histories in parallel with read-only borrows.

/// Cosmological background model consumed by [`crate::structures::Structures`].
///
/// All methods are pure functions of redshift (or mass) plus the model's own
/// immutable state. Densities are comoving, in h²-free M☉ Mpc⁻³ units
/// consistent with [`crate::constants::RHO_CRIT_H2`]; ages and `dt/dz` share
/// one time unit (the accretion rate inherits it).
pub trait Cosmology: Sync {
    /// Linear growth factor D(z), normalized to D(0) = 1.
    fn growth_function(&self, z: f64) -> f64;

    /// Comoving dark-matter density and its time derivative: (ρ_dm, dρ_dm/dt).
    fn rodm(&self, z: f64) -> (f64, f64);

    /// Comoving baryon density ρ_b(z).
    fn robr(&self, z: f64) -> f64;

    /// Baryon density today, ρ_b(z = 0).
    fn robr0(&self) -> f64;

    /// Cosmic age t(z).
    fn age(&self, z: f64) -> f64;

    /// |dt/dz| at redshift z (positive magnitude).
    fn dt_dz(&self, z: f64) -> f64;

    /// Mass–variance relation over a batch of masses (M☉).
    ///
    /// Returns `(km, sg)`: log10-mass grid and the matching σ values. The
    /// model may resample, so the returned arrays are authoritative; `km`
    /// must be ascending and `sg` monotonically decreasing (σ shrinks on
    /// larger smoothing scales).
    fn sigma(&self, mass: &[f64]) -> (Vec<f64>, Vec<f64>);

    /// Critical linear-collapse overdensity δc (≈ 1.686 for EdS).
    fn delta_c(&self) -> f64;

    /// Scalar spectral tilt n_s of the primordial power spectrum.
    fn tilt(&self) -> f64;

    /// Matter density parameter Ωm(z).
    fn omega_m_z(&self, z: f64) -> f64;
}
