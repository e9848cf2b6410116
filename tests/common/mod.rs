// SPDX-License-Identifier: AGPL-3.0-only

//! Shared analytic cosmology fixture for the integration suite.
//!
//! `ToyCosmology` replaces a full transfer-function pipeline with closed
//! forms chosen so every quantity the structure engine consumes is exact
//! and monotone where it must be:
//!
//! - growth factor D(z) = 1 / (1 + z)
//! - variance sigma(M) = 3.0 * (M / 1e10)^(-0.2), a pure power law, so
//!   d ln sigma / d log10 M = -0.2 ln 10 everywhere
//! - comoving matter and baryon densities held constant at their z = 0
//!   values (drho_dm/dt = 0)
//! - age t(z) = 13.7 (1 + z)^(-3/2) Gyr, giving |dt/dz| in closed form
//!
//! The power-law sigma keeps every mass-range inversion exact on the
//! tabulated grid, which the round-trip tests below rely on.

use cosmicstar::constants::RHO_CRIT_H2;
use cosmicstar::Cosmology;

const SIGMA_PIVOT_MASS: f64 = 1.0e+10;
const SIGMA_PIVOT_AMPLITUDE: f64 = 3.0;
const SIGMA_SLOPE: f64 = 0.2;
const AGE_TODAY_GYR: f64 = 13.7;

pub struct ToyCosmology {
    pub omega_m: f64,
    pub omega_b: f64,
    pub omega_l: f64,
    pub h: f64,
}

impl ToyCosmology {
    pub fn reference() -> Self {
        Self {
            omega_m: 0.24,
            omega_b: 0.04,
            omega_l: 0.73,
            h: 0.7,
        }
    }
}

impl Cosmology for ToyCosmology {
    fn growth_function(&self, z: f64) -> f64 {
        1.0 / (1.0 + z)
    }

    fn rodm(&self, _z: f64) -> (f64, f64) {
        (self.omega_m * RHO_CRIT_H2 * self.h * self.h, 0.0)
    }

    fn robr(&self, _z: f64) -> f64 {
        self.robr0()
    }

    fn robr0(&self) -> f64 {
        self.omega_b * RHO_CRIT_H2 * self.h * self.h
    }

    fn age(&self, z: f64) -> f64 {
        AGE_TODAY_GYR * (1.0 + z).powf(-1.5)
    }

    fn dt_dz(&self, z: f64) -> f64 {
        1.5 * AGE_TODAY_GYR * (1.0 + z).powf(-2.5)
    }

    fn sigma(&self, mass: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let km: Vec<f64> = mass.iter().map(|m| m.log10()).collect();
        let sg: Vec<f64> = mass
            .iter()
            .map(|m| SIGMA_PIVOT_AMPLITUDE * (m / SIGMA_PIVOT_MASS).powf(-SIGMA_SLOPE))
            .collect();
        (km, sg)
    }

    fn delta_c(&self) -> f64 {
        1.686
    }

    fn tilt(&self) -> f64 {
        1.0
    }

    fn omega_m_z(&self, z: f64) -> f64 {
        let a3 = (1.0 + z).powi(3);
        self.omega_m * a3 / (self.omega_m * a3 + self.omega_l)
    }
}

/// Scratch cache directory under the system temp dir, unique per test.
pub fn scratch_cache_dir(tag: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("cosmicstar_it_{}_{}", tag, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}
