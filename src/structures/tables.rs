// SPDX-License-Identifier: AGPL-3.0-only

//! Base table builder: the mass/σ grid and the four redshift histories.
//!
//! The mass grid is log-uniform from the fixed minimum mass up to the
//! configured maximum; the redshift grid descends linearly from zmax with
//! the same point count. σ(M) comes from one batch call to the cosmology
//! (whose returned arrays are authoritative — it may resample); the four
//! per-redshift histories are independent point evaluations and run as
//! order-preserving rayon maps.

use rayon::prelude::*;

use super::BaseTables;
use crate::constants::GRID_POINTS_PER_DECADE;
use crate::cosmology::Cosmology;

pub(crate) fn build_base_tables<C: Cosmology>(
    cosmology: &C,
    mmin: f64,
    mmax: f64,
    zmax: f64,
    ct2: f64,
    delta_c: f64,
) -> BaseTables {
    let kls = (mmax / mmin).log10();
    let numk = (GRID_POINTS_PER_DECADE * kls) as usize;
    let kls1 = kls / numk as f64;
    let deltaz = zmax / numk as f64;

    let kmass: Vec<f64> = (0..numk)
        .map(|i| mmin * 10.0f64.powf((i + 1) as f64 * kls1))
        .collect();
    let scale: Vec<f64> = kmass.iter().map(|&m| (m / ct2).powf(1.0 / 3.0)).collect();
    let zred: Vec<f64> = (0..numk).map(|i| zmax - i as f64 * deltaz).collect();

    let (km, sg) = cosmology.sigma(&kmass);

    let t_z: Vec<f64> = zred.par_iter().map(|&z| cosmology.age(z)).collect();
    let d_c2: Vec<f64> = zred
        .par_iter()
        .map(|&z| delta_c / cosmology.growth_function(z))
        .collect();
    let rdm2: Vec<f64> = zred.par_iter().map(|&z| cosmology.rodm(z).0).collect();
    let rbr2: Vec<f64> = zred.par_iter().map(|&z| cosmology.robr(z)).collect();

    BaseTables {
        km,
        scale,
        zred,
        sg,
        t_z,
        d_c2,
        rdm2,
        rbr2,
    }
}
