// SPDX-License-Identifier: AGPL-3.0-only

//! Baryon accretion-rate builder and lookup.
//!
//! The baryon fraction in structures fb(z) is evaluated on a 1000-point
//! redshift grid (plus an explicit z = 0 endpoint), spline-fit against the
//! scale factor a = 1/(1+z), and differentiated; the chain rule
//! d/da → d/dt through |dt/dz| turns the slope into a physical accretion
//! rate, tabulated on the ascending a grid.

use super::{AccretionTable, Structures};
use crate::cosmology::Cosmology;
use crate::error::CosmicStarError;
use crate::numerical::{locate, Spline};

/// Redshift grid points before the appended z = 0 endpoint.
const ACCRETION_GRID: usize = 1000;

impl<C: Cosmology> Structures<C> {
    /// Derive the accretion table from the (already built) base tables and
    /// the resolved integration limits.
    pub(crate) fn build_accretion_table(&mut self) -> Result<(), CosmicStarError> {
        let zmax = self.cfg.zmax;
        let deltaz = zmax / ACCRETION_GRID as f64;

        let mut z: Vec<f64> = (0..ACCRETION_GRID)
            .map(|i| zmax - i as f64 * deltaz)
            .collect();
        z.push(0.0);

        let mut fbt2 = Vec::with_capacity(z.len());
        for &zi in &z {
            fbt2.push(self.fbstruc(zi)?);
        }
        // z descends strictly to zmax/1000 and then to 0, so a ascends.
        let ascale: Vec<f64> = z.iter().map(|&zi| 1.0 / (1.0 + zi)).collect();

        let fb_spline = Spline::fit(&ascale, &fbt2);
        let robr0 = self.cosmology.robr0();
        let abt2: Vec<f64> = z
            .iter()
            .zip(&ascale)
            .map(|(&zi, &a)| {
                let dfb_da = fb_spline.deriv1(a);
                let a2 = a * a;
                robr0 * (-dfb_da * a2).abs() / self.cosmology.dt_dz(zi)
            })
            .collect();

        let spline = Spline::fit(&ascale, &abt2);
        self.accretion = AccretionTable {
            ascale,
            abt2,
            spline,
        };
        Ok(())
    }

    /// Baryon accretion rate onto structures at scale factor `a`.
    ///
    /// Raw-table lookup: bisection into the `ascale` grid, co-indexed rate,
    /// floor semantics. The fitted accretion spline is persisted alongside
    /// for downstream consumers but is not consulted here.
    #[must_use]
    pub fn abt(&self, a: f64) -> f64 {
        let i = locate(&self.accretion.ascale, a);
        self.accretion.abt2[i]
    }

    /// The accretion table: (scale-factor grid, rate), both ascending in a.
    #[must_use]
    pub fn accretion_table(&self) -> (&[f64], &[f64]) {
        (&self.accretion.ascale, &self.accretion.abt2)
    }
}
