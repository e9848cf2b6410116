// SPDX-License-Identifier: AGPL-3.0-only

//! The nine-variant halo mass-function evaluator.
//!
//! Every variant shares the same skeleton: σ from the table lookup
//! ([`Structures::fstm`]), its logarithmic derivative by Ridders
//! extrapolation, the variant's multiplicity function fst(σ, z), then
//! `dn/dM = (ρ_dm/M²)·fst·|dσ/dlogM|/σ`. Variants differ in the fst shape,
//! whether the growth factor enters, and the published validity domain they
//! enforce before evaluating.
//!
//! # Provenance
//!
//! - ST: Sheth & Tormen, MNRAS 308, 119 (1999)
//! - PS: Press & Schechter, ApJ 187, 425 (1974)
//! - JK: Jenkins et al., MNRAS 321, 372 (2001), z = [0, 5]
//! - W: Warren et al., ApJ 646, 881 (2006), z = 0 (eqn. 5)
//! - TK: Tinker et al., ApJ 688, 709 (2008), z = [0, 2.5]; coefficient
//!   table from the Murray et al. hmf adaptation of Tinker's MF code
//! - WT1/WT2: Watson et al., MNRAS 433, 1230 (2013), z = [0, 30]
//! - B: Burr distribution, Marassi & Lima (2006) Press–Schechter extension
//! - R: Reed et al., MNRAS 374, 2 (2007), after genmf.f

use statrs::function::gamma::gamma;

use super::Structures;
use crate::constants::{ST_A, ST_AMPLITUDE, ST_P};
use crate::cosmology::Cosmology;
use crate::error::CosmicStarError;
use crate::numerical::{dfridr, Spline};

/// A caller-supplied mass-function variant: `(log10-mass, z) → dn/dM`.
pub type CustomMassFunction =
    Box<dyn Fn(f64, f64) -> Result<f64, CosmicStarError> + Send + Sync>;

/// Which published fitting formula evaluates the mass function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MassFunctionKind {
    /// Sheth–Tormen (1999) — the default.
    St,
    /// Press–Schechter (1974).
    Ps,
    /// Jenkins et al. (2001).
    Jk,
    /// Warren et al. (2006).
    W,
    /// Tinker et al. (2008), Δ-parametrized.
    Tk,
    /// Watson et al. (2013), Tinker-modified.
    Wt1,
    /// Watson et al. (2013), Γ × Tinker-modified.
    Wt2,
    /// Burr-distribution Press–Schechter extension.
    B,
    /// Reed et al. (2007).
    R,
    /// A variant registered at runtime under this tag.
    Custom(String),
}

impl MassFunctionKind {
    /// Tags of the nine builtin variants.
    pub const BUILTIN_TAGS: [&'static str; 9] =
        ["ST", "PS", "JK", "W", "TK", "WT1", "WT2", "B", "R"];

    /// Parse a builtin variant tag.
    ///
    /// # Errors
    ///
    /// [`CosmicStarError::UnknownMassFunction`] for anything outside
    /// [`MassFunctionKind::BUILTIN_TAGS`] — custom variants are named
    /// explicitly via [`MassFunctionKind::custom`], never parsed.
    pub fn from_tag(tag: &str) -> Result<Self, CosmicStarError> {
        match tag {
            "ST" => Ok(Self::St),
            "PS" => Ok(Self::Ps),
            "JK" => Ok(Self::Jk),
            "W" => Ok(Self::W),
            "TK" => Ok(Self::Tk),
            "WT1" => Ok(Self::Wt1),
            "WT2" => Ok(Self::Wt2),
            "B" => Ok(Self::B),
            "R" => Ok(Self::R),
            other => Err(CosmicStarError::UnknownMassFunction(other.into())),
        }
    }

    /// A runtime-registered variant keyed by `tag`.
    #[must_use]
    pub fn custom(tag: impl Into<String>) -> Self {
        Self::Custom(tag.into())
    }

    /// The variant's tag string.
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            Self::St => "ST",
            Self::Ps => "PS",
            Self::Jk => "JK",
            Self::W => "W",
            Self::Tk => "TK",
            Self::Wt1 => "WT1",
            Self::Wt2 => "WT2",
            Self::B => "B",
            Self::R => "R",
            Self::Custom(tag) => tag,
        }
    }

    /// Published validity range used by the dynamic integration-limits
    /// resolver: ln(1/σ) bounds for most variants (the convention the
    /// evaluator's domain check also uses), a direct log10-mass window for
    /// Warren, `None` where the formula has no registered range (limits
    /// stay static).
    #[must_use]
    pub fn sigma_ln_range(&self) -> Option<[f64; 2]> {
        match self {
            Self::Tk => Some([-0.6, 0.4]),
            Self::R => Some([-1.7, 0.9]),
            Self::Jk => Some([-1.2, 1.05]),
            Self::W => Some([10.0, 15.0]),
            Self::Wt1 => Some([-0.55, 1.31]),
            Self::Wt2 => Some([-0.06, 1.024]),
            Self::St | Self::Ps | Self::B | Self::Custom(_) => None,
        }
    }
}

/// Tinker (2008) coefficient anchors over Δ = 200..3200.
const TINKER_DELTA_VIRS: [f64; 9] = [
    200.0, 300.0, 400.0, 600.0, 800.0, 1200.0, 1600.0, 2400.0, 3200.0,
];
const TINKER_A: [f64; 9] = [
    1.858_659e-01,
    1.995_973e-01,
    2.115_659e-01,
    2.184_113e-01,
    2.480_968e-01,
    2.546_053e-01,
    2.6e-01,
    2.6e-01,
    2.6e-01,
];
const TINKER_SMALL_A: [f64; 9] = [
    1.466_904,
    1.521_782,
    1.559_186,
    1.614_585,
    1.869_936,
    2.128_056,
    2.301_275,
    2.529_241,
    2.661_983,
];
const TINKER_B: [f64; 9] = [
    2.571_104,
    2.254_217,
    2.048_674,
    1.869_559,
    1.588_649,
    1.507_134,
    1.464_374,
    1.436_827,
    1.405_210,
];
const TINKER_C: [f64; 9] = [
    1.193_958,
    1.270_316,
    1.335_191,
    1.446_266,
    1.581_345,
    1.795_050,
    1.965_613,
    2.237_466,
    2.439_729,
];

/// Per-evaluation values shared by every variant.
struct EvalPoint {
    kmass: f64,
    sgm: f64,
    dsgm_dlgm: f64,
    rdmt: f64,
}

impl<C: Cosmology> Structures<C> {
    /// The halo mass function dn/dM at log10-mass `lm` and redshift `z`
    /// (comoving number density per unit mass per unit redshift).
    ///
    /// Dispatches on the configured [`MassFunctionKind`].
    ///
    /// # Errors
    ///
    /// - [`CosmicStarError::OutsideMassRange`] when σ (or `lm` for Warren)
    ///   falls outside the variant's validity domain.
    /// - [`CosmicStarError::InvalidParameter`] for a bad Burr q or a
    ///   negative redshift passed to WT2.
    /// - [`CosmicStarError::UnknownMassFunction`] for an unregistered
    ///   custom tag.
    pub fn mass_function(&self, lm: f64, z: f64) -> Result<f64, CosmicStarError> {
        match &self.cfg.mass_function {
            MassFunctionKind::St => self.mf_sheth_tormen(lm, z),
            MassFunctionKind::Ps => self.mf_press_schechter(lm, z),
            MassFunctionKind::Jk => self.mf_jenkins(lm, z),
            MassFunctionKind::W => self.mf_warren(lm, z),
            MassFunctionKind::Tk => self.mf_tinker(lm, z),
            MassFunctionKind::Wt1 => self.mf_watson_tinker(lm, z),
            MassFunctionKind::Wt2 => self.mf_watson_gamma(lm, z),
            MassFunctionKind::B => self.mf_burr(lm, z),
            MassFunctionKind::R => self.mf_reed(lm, z),
            MassFunctionKind::Custom(tag) => {
                let f = self.registry.get(tag).ok_or_else(|| {
                    CosmicStarError::UnknownMassFunction(tag.clone())
                })?;
                f(lm, z)
            }
        }
    }

    /// σ, its Ridders logarithmic derivative (initial step lm/20), the halo
    /// mass, and ρ_dm at `z` — the inputs every variant consumes.
    fn eval_point(&self, lm: f64, z: f64) -> EvalPoint {
        let (rdmt, _drdmt) = self.cosmology.rodm(z);
        let step = lm / 2.0e+1;
        let (dsgm_dlgm, _err) = dfridr(|x| self.fstm(x), lm, step);
        EvalPoint {
            kmass: 10.0f64.powf(lm),
            sgm: self.fstm(lm),
            dsgm_dlgm,
            rdmt,
        }
    }

    /// Fold a multiplicity value fst into dn/dM.
    fn dn_dm(p: &EvalPoint, fst: f64) -> f64 {
        (p.rdmt / (p.kmass * p.kmass)) * fst * p.dsgm_dlgm.abs() / p.sgm
    }

    /// Reject σ outside the variant's published ln(1/σ) window.
    fn validate_mass_range(sgm: f64, lo: f64, hi: f64) -> Result<(), CosmicStarError> {
        let ln_inv = (1.0 / sgm).ln();
        if ln_inv <= lo || ln_inv >= hi {
            return Err(CosmicStarError::OutsideMassRange(format!(
                "ln(1/sigma) = {ln_inv:.4} not within ({lo}, {hi})"
            )));
        }
        Ok(())
    }

    /// ν = δc/(σD(z)) — the peak height entering the ν-parametrized shapes.
    fn peak_height(&self, sgm: f64, z: f64) -> f64 {
        self.delta_c / (sgm * self.cosmology.growth_function(z))
    }

    fn mf_sheth_tormen(&self, lm: f64, z: f64) -> Result<f64, CosmicStarError> {
        let p = self.eval_point(lm, z);
        let nu = self.peak_height(p.sgm, z);
        let nu2 = nu * nu;
        let ctst = ST_AMPLITUDE * (2.0 * ST_A / std::f64::consts::PI).sqrt();
        let fst = ctst
            * nu
            * (1.0 + (1.0 / (nu2 * ST_A)).powf(ST_P))
            * (-ST_A * nu2 / 2.0).exp();
        Ok(Self::dn_dm(&p, fst))
    }

    fn mf_press_schechter(&self, lm: f64, z: f64) -> Result<f64, CosmicStarError> {
        let p = self.eval_point(lm, z);
        let nu = self.peak_height(p.sgm, z);
        let fst = (2.0 / std::f64::consts::PI).sqrt() * nu * (-0.5 * nu * nu).exp();
        Ok(Self::dn_dm(&p, fst))
    }

    fn mf_jenkins(&self, lm: f64, z: f64) -> Result<f64, CosmicStarError> {
        let p = self.eval_point(lm, z);
        Self::validate_mass_range(p.sgm, -1.2, 1.05)?;
        let fst = 0.315 * (-((1.0 / p.sgm).ln() + 0.61).abs().powf(3.8)).exp();
        Ok(Self::dn_dm(&p, fst))
    }

    fn mf_warren(&self, lm: f64, z: f64) -> Result<f64, CosmicStarError> {
        const A: f64 = 0.7234;
        const SMALL_A: f64 = 1.625;
        const B: f64 = 0.2538;
        const C: f64 = 1.1982;

        if !(10.0..=15.0).contains(&lm) {
            return Err(CosmicStarError::OutsideMassRange(format!(
                "Warren requires log10(M) in [10, 15], got {lm}"
            )));
        }
        let p = self.eval_point(lm, z);
        let nu = self.peak_height(p.sgm, z);
        let fst = A * (nu.powf(-SMALL_A) + B) * (-C / (nu * nu)).exp();
        Ok(Self::dn_dm(&p, fst))
    }

    fn mf_tinker(&self, lm: f64, z: f64) -> Result<f64, CosmicStarError> {
        let p = self.eval_point(lm, z);
        Self::validate_mass_range(p.sgm, -0.6, 0.4)?;

        let delta = self.delta_halo;
        let a0 = Spline::fit(&TINKER_DELTA_VIRS, &TINKER_A).eval(delta);
        let small_a0 = Spline::fit(&TINKER_DELTA_VIRS, &TINKER_SMALL_A).eval(delta);
        let b0 = Spline::fit(&TINKER_DELTA_VIRS, &TINKER_B).eval(delta);
        let c0 = Spline::fit(&TINKER_DELTA_VIRS, &TINKER_C).eval(delta);

        let a_amp = a0 * (1.0 + z).powf(-0.14);
        let small_a = small_a0 * (1.0 + z).powf(-0.06);
        let alpha = (-(0.75 / (delta / 75.0).ln()).powf(1.2)).exp();
        let b = b0 * (1.0 + z).powf(-alpha);
        let c = c0;

        let fst = a_amp * ((p.sgm / b).powf(-small_a) + 1.0) * (-c / (p.sgm * p.sgm)).exp();
        Ok(Self::dn_dm(&p, fst))
    }

    fn mf_watson_tinker(&self, lm: f64, z: f64) -> Result<f64, CosmicStarError> {
        const A: f64 = 0.282;
        const SMALL_A: f64 = 2.163;
        const B: f64 = 1.406;
        const C: f64 = 1.21;

        let p = self.eval_point(lm, z);
        Self::validate_mass_range(p.sgm, -0.55, 1.31)?;
        let sgm_d = p.sgm * self.cosmology.growth_function(z);
        let fst = A * ((B / sgm_d).powf(SMALL_A) + 1.0) * (-C / (sgm_d * sgm_d)).exp();
        Ok(Self::dn_dm(&p, fst))
    }

    fn mf_watson_gamma(&self, lm: f64, z: f64) -> Result<f64, CosmicStarError> {
        if z < 0.0 {
            return Err(CosmicStarError::InvalidParameter(format!(
                "negative redshift z = {z} for the WT2 mass function"
            )));
        }

        let p = self.eval_point(lm, z);
        if z == 0.0 {
            Self::validate_mass_range(p.sgm, -0.55, 1.05)?;
        } else {
            Self::validate_mass_range(p.sgm, -0.06, 1.024)?;
        }

        let sgm_d = p.sgm * self.cosmology.growth_function(z);
        let omz = self.cosmology.omega_m_z(z);

        let (a_amp, small_a, b, gm) = if z == 0.0 {
            (0.194, 2.267, 1.805, 1.287)
        } else if z >= 6.0 {
            (0.563, 3.810, 0.874, 1.453)
        } else {
            (
                omz * (1.097 * (1.0 + z).powf(-3.216) + 0.074),
                omz * (5.907 * (1.0 + z).powf(-3.058) + 2.349),
                omz * (3.136 * (1.0 + z).powf(-3.599) + 2.344),
                1.318,
            )
        };
        let fst = a_amp * ((b / sgm_d).powf(small_a) + 1.0) * (-gm / (sgm_d * sgm_d)).exp();

        // Δ-dependent Γ-correction about the reference overdensity 178.
        const P: f64 = 0.072;
        const Q: f64 = 2.130;
        let delta = self.cfg.delta_wt;
        let d_z = -0.456 * omz - 0.139;
        let c_delta = (0.023 * (delta / 178.0 - 1.0)).exp();
        let gamma_dsz =
            c_delta * (delta / 178.0).powf(d_z) * (P * (1.0 - delta / 178.0) / sgm_d.powf(Q)).exp();

        Ok(Self::dn_dm(&p, gamma_dsz * fst))
    }

    /// Burr normalizer Bq, closed form on the two q branches.
    ///
    /// # Errors
    ///
    /// [`CosmicStarError::InvalidParameter`] for q unset or outside
    /// (0,2)\{1}.
    pub(crate) fn burr_bq(&self) -> Result<f64, CosmicStarError> {
        let Some(q) = self.q_burr else {
            return Err(CosmicStarError::InvalidParameter(
                "the Burr q coefficient is unset".into(),
            ));
        };
        if q <= 0.0 || q >= 2.0 || q == 1.0 {
            return Err(CosmicStarError::InvalidParameter(format!(
                "Burr q = {q} outside the valid range (0,2) excluding 1"
            )));
        }
        let bq = if q < 1.0 {
            (1.0 - q).sqrt() * ((3.0 - q) / 2.0) * gamma(0.5 + 1.0 / (1.0 - q))
                / gamma(1.0 / (1.0 - q))
        } else {
            (q - 1.0).sqrt() * gamma(1.0 / (q - 1.0)) / gamma(1.0 / (q - 1.0) - 0.5)
        };
        Ok(bq)
    }

    fn mf_burr(&self, lm: f64, z: f64) -> Result<f64, CosmicStarError> {
        let bq = self.burr_bq()?;
        // burr_bq validated q.
        let q = self.q_burr.unwrap_or(f64::NAN);
        let p = self.eval_point(lm, z);
        let nu = self.peak_height(p.sgm, z);
        let nu2 = nu * nu;
        let fst = bq
            * (2.0 / std::f64::consts::PI).sqrt()
            * nu
            * (1.0 - (1.0 - q) * 0.5 * nu2).powf(1.0 / (1.0 - q));
        Ok(Self::dn_dm(&p, fst))
    }

    fn mf_reed(&self, lm: f64, z: f64) -> Result<f64, CosmicStarError> {
        const SQRT_TWO_OVER_PI: f64 = 0.797_884_56;

        let p = self.eval_point(lm, z);
        Self::validate_mass_range(p.sgm, -1.7, 0.9)?;
        let nu = self.peak_height(p.sgm, z);

        let neff = (6.0 / p.sgm) * p.dsgm_dlgm.abs() + 3.0;
        let nu_prime = ST_A.sqrt() * nu;
        let ln_sigma_inv = (1.0 / p.sgm).ln();
        let ln_gauss1 = (-(ln_sigma_inv - 0.4).powi(2) / (2.0 * 0.6 * 0.6)).exp();
        let ln_gauss2 = (-(ln_sigma_inv - 0.75).powi(2) / (2.0 * 0.2 * 0.2)).exp();

        let fst = 0.3222
            * SQRT_TWO_OVER_PI
            * nu_prime
            * (-1.08 * nu_prime * nu_prime / 2.0).exp()
            * (1.0 + 1.0 / nu_prime.powf(0.6) + 0.6 * ln_gauss1 + 0.4 * ln_gauss2)
            * (-0.03 / (neff + 3.0).powi(2) * nu.powf(0.6)).exp();
        Ok(Self::dn_dm(&p, fst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_tag_parses_all_builtins() {
        for tag in MassFunctionKind::BUILTIN_TAGS {
            let kind = MassFunctionKind::from_tag(tag).expect("builtin tag parses");
            assert_eq!(kind.tag(), tag);
        }
    }

    #[test]
    fn from_tag_rejects_unknown() {
        let err = MassFunctionKind::from_tag("NOPE").unwrap_err();
        assert!(matches!(err, CosmicStarError::UnknownMassFunction(t) if t == "NOPE"));
    }

    #[test]
    fn sigma_ln_range_registry() {
        assert_eq!(MassFunctionKind::St.sigma_ln_range(), None);
        assert_eq!(MassFunctionKind::Ps.sigma_ln_range(), None);
        assert_eq!(MassFunctionKind::B.sigma_ln_range(), None);
        assert_eq!(MassFunctionKind::Jk.sigma_ln_range(), Some([-1.2, 1.05]));
        assert_eq!(MassFunctionKind::W.sigma_ln_range(), Some([10.0, 15.0]));
        assert_eq!(MassFunctionKind::Tk.sigma_ln_range(), Some([-0.6, 0.4]));
        assert_eq!(MassFunctionKind::R.sigma_ln_range(), Some([-1.7, 0.9]));
    }

    #[test]
    fn tinker_coefficient_splines_hit_anchor_points() {
        // A natural cubic interpolant must reproduce the tabulated anchors.
        for (i, &delta) in TINKER_DELTA_VIRS.iter().enumerate() {
            let a = Spline::fit(&TINKER_DELTA_VIRS, &TINKER_A).eval(delta);
            assert!(
                (a - TINKER_A[i]).abs() < 1e-12,
                "A anchor at delta = {delta}: {a} vs {}",
                TINKER_A[i]
            );
            let c = Spline::fit(&TINKER_DELTA_VIRS, &TINKER_C).eval(delta);
            assert!((c - TINKER_C[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn tinker_coefficients_interpolate_between_anchors() {
        let b = Spline::fit(&TINKER_DELTA_VIRS, &TINKER_B).eval(250.0);
        // B decreases monotonically over the anchor table.
        assert!(b < TINKER_B[0] && b > TINKER_B[1], "B(250) = {b}");
    }
}
