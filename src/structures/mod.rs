// SPDX-License-Identifier: AGPL-3.0-only

//! The `Structures` engine: statistical history of dark-matter halo
//! formation under the Press–Schechter family of formalisms.
//!
//! Construction precomputes (or loads from the table cache) the mass–variance
//! relation and the age/overdensity/density histories over a redshift grid,
//! resolves the variant-specific integration limits, and derives the baryon
//! accretion-rate curve. After that every public operation is a pure read:
//! the mass-function evaluator, the spline quadrature (`halos_n`, `fbstruc`,
//! `numerical_density_halos`), and the accretion lookup `abt`.
//!
//! Models first presented in Pereira & Miranda (MNRAS 401, 1924, 2010).

pub mod accretion;
pub mod mass_function;
pub mod tables;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::cache::{CachedTables, TableCache};
use crate::constants::RHO_CRIT_H2;
use crate::cosmology::Cosmology;
use crate::error::CosmicStarError;
use crate::numerical::{locate, Spline};

pub use mass_function::{CustomMassFunction, MassFunctionKind};

/// Construction parameters for [`Structures`]. Immutable afterwards except
/// through the explicit setters (`set_q_burr`, `set_delta_h_tinker`,
/// `set_dynamic_limits`).
///
/// The cosmological parameters must describe the same background model as
/// the `Cosmology` value passed to [`Structures::new`]; they parametrize the
/// mass/redshift grids and the cache key.
#[derive(Debug, Clone)]
pub struct StructuresConfig {
    /// log10 of the smallest halo mass that can form stars (M☉).
    pub lmin: f64,
    /// log10 of the largest halo mass on the grid (M☉).
    pub lmax: f64,
    /// Largest redshift of the history tables.
    pub zmax: f64,
    /// Dark-matter density parameter Ωm.
    pub omega_m: f64,
    /// Baryon density parameter Ωb.
    pub omega_b: f64,
    /// Dark-energy density parameter ΩΛ.
    pub omega_l: f64,
    /// Dimensionless Hubble parameter (H₀ = 100 h km/s/Mpc).
    pub h: f64,
    /// Which published fitting formula evaluates the mass function.
    pub mass_function: MassFunctionKind,
    /// Halo overdensity threshold Δ; meaningful for the Tinker variant only.
    pub delta_halo: f64,
    /// Burr-distribution shape parameter q, valid on (0,2)\{1}; `None`
    /// makes any Burr evaluation fail until `set_q_burr`.
    pub q_burr: Option<f64>,
    /// Reference overdensity for the WT2 Γ-correction (default 178).
    pub delta_wt: f64,
    /// Cache directory; `None` uses `$HOME/.cosmicstar`.
    pub cache_dir: Option<PathBuf>,
    /// Explicit cache key overriding the derived one.
    pub cache_file: Option<String>,
    /// Resolve integration limits from the variant's σ-validity range
    /// instead of the static `[lmin, lmax]`.
    pub dynamic_limits: bool,
}

impl Default for StructuresConfig {
    fn default() -> Self {
        Self {
            lmin: 6.0,
            lmax: 18.0,
            zmax: 20.0,
            omega_m: 0.24,
            omega_b: 0.04,
            omega_l: 0.73,
            h: 0.7,
            mass_function: MassFunctionKind::St,
            delta_halo: 200.0,
            q_burr: None,
            delta_wt: 178.0,
            cache_dir: None,
            cache_file: None,
            dynamic_limits: false,
        }
    }
}

impl StructuresConfig {
    /// Derive the cache key identifying this configuration's table set.
    ///
    /// Keyed on everything the tables depend on; the Tinker Δ enters only
    /// for the Tinker variant (it reshapes that formula's coefficients).
    #[must_use]
    pub fn cache_key(&self) -> String {
        if let Some(name) = &self.cache_file {
            return name.clone();
        }
        let tag = self.mass_function.tag();
        let variant = if matches!(self.mass_function, MassFunctionKind::Tk) {
            format!("{tag}{}", self.delta_halo)
        } else {
            tag.to_string()
        };
        format!(
            "structures_cache_{variant}_{}_{}_{}_{}_{}_{}_{}",
            self.omega_b, self.omega_m, self.omega_l, self.h, self.lmin, self.lmax, self.zmax
        )
    }
}

/// The five precomputed table groups over the mass/redshift grids.
#[derive(Debug, Clone, Default)]
pub(crate) struct BaseTables {
    /// log10-mass grid from the cosmology's σ batch, ascending.
    pub km: Vec<f64>,
    /// Comoving length scale (kmass/ct2)^(1/3) per grid point.
    pub scale: Vec<f64>,
    /// Redshift grid, descending zmax → ~0.
    pub zred: Vec<f64>,
    /// σ co-indexed with `km`, monotonically decreasing.
    pub sg: Vec<f64>,
    /// Cosmic age at each `zred`.
    pub t_z: Vec<f64>,
    /// δc/D(z) at each `zred`.
    pub d_c2: Vec<f64>,
    /// Comoving dark-matter density at each `zred`.
    pub rdm2: Vec<f64>,
    /// Comoving baryon density at each `zred`.
    pub rbr2: Vec<f64>,
}

/// Accretion-rate lookup table plus its fitted spline.
#[derive(Debug, Clone)]
pub(crate) struct AccretionTable {
    pub ascale: Vec<f64>,
    pub abt2: Vec<f64>,
    pub spline: Spline,
}

impl Default for AccretionTable {
    /// Placeholder replaced before construction returns.
    fn default() -> Self {
        Self {
            ascale: Vec::new(),
            abt2: Vec::new(),
            spline: Spline::from_parts(Vec::new(), Vec::new(), Vec::new()),
        }
    }
}

/// Press–Schechter-family structure-formation engine.
///
/// Owns the precomputed tables exclusively; all operations after
/// construction take `&self` and are safe to call from multiple threads.
pub struct Structures<C: Cosmology> {
    pub(crate) cosmology: C,
    pub(crate) cfg: StructuresConfig,
    /// Fixed lower mass bound of the σ(M) grid (M☉).
    pub(crate) mmin: f64,
    pub(crate) mmax: f64,
    /// δc from the background model.
    pub(crate) delta_c: f64,
    /// n_s / ln 10, the tilt factor of the mass-weighted integrand.
    pub(crate) tilt2: f64,
    /// (4π/3)·2.76e11·h²Ωm — folds mass into a comoving length scale.
    pub(crate) ct2: f64,
    /// Tinker Δ, mutable via `set_delta_h_tinker`.
    pub(crate) delta_halo: f64,
    /// Burr shape q, mutable via `set_q_burr`.
    pub(crate) q_burr: Option<f64>,
    pub(crate) dynamic_limits: bool,
    pub(crate) tables: BaseTables,
    pub(crate) accretion: AccretionTable,
    pub(crate) lm_inf: f64,
    pub(crate) lm_sup: f64,
    pub(crate) registry: BTreeMap<String, CustomMassFunction>,
    cache: TableCache,
    cache_key: String,
}

impl<C: Cosmology> Structures<C> {
    /// Build (or load from cache) the full engine for one configuration.
    ///
    /// On a cache hit the persisted table set is adopted verbatim; on any
    /// miss all tables are rebuilt and rewritten as a set.
    ///
    /// # Errors
    ///
    /// [`CosmicStarError::CacheIo`] if the cache directory cannot be
    /// created or the rebuilt set cannot be written; any mass-function
    /// domain error surfaced while deriving the accretion-rate table.
    pub fn new(cosmology: C, cfg: StructuresConfig) -> Result<Self, CosmicStarError> {
        Self::with_registry(cosmology, cfg, BTreeMap::new())
    }

    /// Like [`Structures::new`] but with one custom variant registered up
    /// front, so a `MassFunctionKind::Custom` configuration can drive the
    /// table build itself.
    pub fn with_custom_mass_function(
        cosmology: C,
        cfg: StructuresConfig,
        tag: impl Into<String>,
        f: CustomMassFunction,
    ) -> Result<Self, CosmicStarError> {
        let mut registry = BTreeMap::new();
        registry.insert(tag.into(), f);
        Self::with_registry(cosmology, cfg, registry)
    }

    fn with_registry(
        cosmology: C,
        cfg: StructuresConfig,
        registry: BTreeMap<String, CustomMassFunction>,
    ) -> Result<Self, CosmicStarError> {
        let cache = TableCache::open(cfg.cache_dir.clone())?;
        let cache_key = cfg.cache_key();

        let h2om = cfg.h * cfg.h * cfg.omega_m;
        let ct2 = 4.0 * std::f64::consts::PI * RHO_CRIT_H2 / 3.0 * h2om;

        let mut s = Self {
            mmin: crate::constants::MASS_GRID_MIN,
            mmax: 10.0f64.powf(cfg.lmax),
            delta_c: cosmology.delta_c(),
            tilt2: cosmology.tilt() / std::f64::consts::LN_10,
            ct2,
            delta_halo: cfg.delta_halo,
            q_burr: cfg.q_burr,
            dynamic_limits: cfg.dynamic_limits,
            tables: BaseTables::default(),
            accretion: AccretionTable::default(),
            lm_inf: cfg.lmin,
            lm_sup: cfg.lmax,
            registry,
            cache,
            cache_key,
            cosmology,
            cfg,
        };

        if let Some(cached) = s.cache.load(&s.cache_key) {
            s.adopt_cached(cached);
        } else {
            s.tables = tables::build_base_tables(
                &s.cosmology,
                s.mmin,
                s.mmax,
                s.cfg.zmax,
                s.ct2,
                s.delta_c,
            );
            let (inf, sup) = s.integration_limits_mass_function();
            s.lm_inf = inf;
            s.lm_sup = sup;
            s.build_accretion_table()?;
            let set = s.to_cached();
            s.cache.store(&s.cache_key, &set)?;
        }

        let (inf, sup) = s.integration_limits_mass_function();
        s.lm_inf = inf;
        s.lm_sup = sup;
        Ok(s)
    }

    fn adopt_cached(&mut self, c: CachedTables) {
        self.tables = BaseTables {
            km: c.km,
            scale: c.scale,
            zred: c.zred,
            sg: c.sg,
            t_z: c.t_z,
            d_c2: c.d_c2,
            rdm2: c.rdm2,
            rbr2: c.rbr2,
        };
        let spline = Spline::from_parts(c.ascale.clone(), c.abt2.clone(), c.tck_ab);
        self.accretion = AccretionTable {
            ascale: c.ascale,
            abt2: c.abt2,
            spline,
        };
    }

    fn to_cached(&self) -> CachedTables {
        CachedTables {
            km: self.tables.km.clone(),
            scale: self.tables.scale.clone(),
            zred: self.tables.zred.clone(),
            sg: self.tables.sg.clone(),
            t_z: self.tables.t_z.clone(),
            d_c2: self.tables.d_c2.clone(),
            rdm2: self.tables.rdm2.clone(),
            rbr2: self.tables.rbr2.clone(),
            abt2: self.accretion.abt2.clone(),
            ascale: self.accretion.ascale.clone(),
            tck_ab: self.accretion.spline.second_derivs().to_vec(),
        }
    }

    /// σ at log10-mass `lm`: bisection into the `km` grid, co-indexed `sg`
    /// value, floor semantics (no interpolation). This is the function
    /// Ridders differentiation works on.
    #[must_use]
    pub fn fstm(&self, lm: f64) -> f64 {
        let j = locate(&self.tables.km, lm);
        self.tables.sg[j]
    }

    /// Map a σ range back to `[log-mass down, log-mass up]` through the
    /// table. σ decreases with mass, so the lookup runs over the reversed
    /// array and converts the found indices back to mass order; bounds
    /// beyond the table clamp to its edges.
    #[must_use]
    pub fn mass_range_sigma(&self, sgm_min: f64, sgm_max: f64) -> [f64; 2] {
        let n = self.tables.sg.len() - 1;
        let reversed: Vec<f64> = self.tables.sg.iter().rev().copied().collect();
        let jmin = n - locate(&reversed, sgm_min);
        let jmax = n - locate(&reversed, sgm_max);
        [self.tables.km[jmin], self.tables.km[jmax]]
    }

    /// Integration limits for the active variant: the static
    /// `[lmin, lmax]` unless dynamic limits are enabled and the variant
    /// registers a σ-validity range (Warren's range is already in mass
    /// space and is used directly).
    ///
    /// The registered bounds are ln(1/σ) values, the same convention the
    /// evaluator's domain check applies, so the resolved window is always
    /// evaluable. The floor lookup lands one grid point past the small-σ
    /// cutoff on the high-mass side; the upper limit steps one grid point
    /// back so σ at both limits stays inside the open window.
    #[must_use]
    pub fn integration_limits_mass_function(&self) -> (f64, f64) {
        if !self.dynamic_limits {
            return (self.cfg.lmin, self.cfg.lmax);
        }
        let Some([lo, hi]) = self.cfg.mass_function.sigma_ln_range() else {
            return (self.cfg.lmin, self.cfg.lmax);
        };
        if matches!(self.cfg.mass_function, MassFunctionKind::W) {
            return (lo, hi);
        }
        let sgm_min = (-lo).exp();
        let sgm_max = (-hi).exp();
        let [lm_down, mut lm_up] = self.mass_range_sigma(sgm_min, sgm_max);
        let j = locate(&self.tables.km, lm_up);
        if j > 0 {
            lm_up = self.tables.km[j - 1];
        }
        (lm_down, lm_up)
    }

    /// Mass function × M × tilt Jacobian — the mass-weighted integrand of
    /// [`Structures::halos_n`], per unit log10-mass.
    fn fmass_m(&self, lm: f64, z: f64) -> Result<f64, CosmicStarError> {
        let kmass = 10.0f64.powf(lm);
        let frst = self.mass_function(lm, z)? * kmass;
        Ok(self.tilt2 * kmass * frst)
    }

    /// Mass-weighted integral of the mass function over the resolved
    /// integration limits: 50 log-mass samples, natural cubic spline,
    /// analytic definite integral.
    ///
    /// # Errors
    ///
    /// Propagates any domain-validity failure from the evaluator; a single
    /// failed sample aborts the integral.
    pub fn halos_n(&self, z: f64) -> Result<f64, CosmicStarError> {
        self.spline_integral(self.lm_inf, self.lm_sup, |lm| self.fmass_m(lm, z))
    }

    /// Fraction of baryonic matter locked into structures at redshift `z`.
    ///
    /// # Errors
    ///
    /// Propagates from [`Structures::halos_n`].
    pub fn fbstruc(&self, z: f64) -> Result<f64, CosmicStarError> {
        let (rdm, _drdm_dt) = self.cosmology.rodm(z);
        Ok(self.halos_n(z)? / rdm)
    }

    /// Comoving number density of dark halos at redshift `z`, integrated
    /// over the static `[lmin, lmax]` range regardless of dynamic limits.
    ///
    /// # Errors
    ///
    /// Propagates any domain-validity failure from the evaluator.
    pub fn numerical_density_halos(&self, z: f64) -> Result<f64, CosmicStarError> {
        self.spline_integral(self.cfg.lmin, self.cfg.lmax, |lm| self.mass_function(lm, z))
    }

    /// 50-sample spline quadrature shared by the integrated statistics.
    fn spline_integral(
        &self,
        inf: f64,
        sup: f64,
        f: impl Fn(f64) -> Result<f64, CosmicStarError>,
    ) -> Result<f64, CosmicStarError> {
        const SAMPLES: usize = 50;
        let deltal = (sup - inf) / (SAMPLES - 1) as f64;
        let mut lm_grid = Vec::with_capacity(SAMPLES);
        let mut fm = Vec::with_capacity(SAMPLES);
        for i in 0..SAMPLES {
            let lm = inf + i as f64 * deltal;
            lm_grid.push(lm);
            fm.push(f(lm)?);
        }
        let spl = Spline::fit(&lm_grid, &fm);
        Ok(spl.integral(inf, sup))
    }

    /// The valid log-mass integration range of the active mass function.
    #[must_use]
    pub fn integral_limits_fb(&self) -> [f64; 2] {
        [self.lm_inf, self.lm_sup]
    }

    /// Toggle dynamic (σ-range-derived) integration limits and re-resolve.
    pub fn set_dynamic_limits(&mut self, dynamic: bool) {
        self.dynamic_limits = dynamic;
        let (inf, sup) = self.integration_limits_mass_function();
        self.lm_inf = inf;
        self.lm_sup = sup;
    }

    /// Set the Burr-distribution shape parameter q. Validity is checked at
    /// evaluation time: q outside (0,2)\{1} fails the next Burr call.
    pub fn set_q_burr(&mut self, q: f64) {
        self.q_burr = Some(q);
    }

    /// Set the Tinker halo overdensity Δ. No-op returning `false` unless
    /// the active variant is Tinker.
    pub fn set_delta_h_tinker(&mut self, delta_halo: f64) -> bool {
        if matches!(self.cfg.mass_function, MassFunctionKind::Tk) {
            self.delta_halo = delta_halo;
            true
        } else {
            false
        }
    }

    /// The Tinker halo overdensity Δ.
    ///
    /// # Errors
    ///
    /// [`CosmicStarError::InvalidParameter`] if the active variant is not
    /// Tinker.
    pub fn delta_h_tinker(&self) -> Result<f64, CosmicStarError> {
        if matches!(self.cfg.mass_function, MassFunctionKind::Tk) {
            Ok(self.delta_halo)
        } else {
            Err(CosmicStarError::InvalidParameter(
                "delta_halo is only defined for the Tinker variant".into(),
            ))
        }
    }

    /// Register a custom mass-function variant under `tag`. Consulted by
    /// the evaluator only when the configured kind is
    /// [`MassFunctionKind::Custom`] with the same tag.
    pub fn register_mass_function(&mut self, tag: impl Into<String>, f: CustomMassFunction) {
        self.registry.insert(tag.into(), f);
    }

    /// Tags of every evaluable variant: the nine builtins plus any
    /// registered custom ones.
    #[must_use]
    pub fn mass_function_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = MassFunctionKind::BUILTIN_TAGS
            .iter()
            .map(|t| (*t).to_string())
            .collect();
        tags.extend(self.registry.keys().cloned());
        tags
    }

    /// The construction configuration.
    #[must_use]
    pub fn config(&self) -> &StructuresConfig {
        &self.cfg
    }

    /// Directory the table cache writes into.
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        self.cache.dir()
    }

    /// The cache key identifying this configuration's table set.
    #[must_use]
    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    /// The (log10-mass, σ) table, ascending in mass.
    #[must_use]
    pub fn sigma_table(&self) -> (&[f64], &[f64]) {
        (&self.tables.km, &self.tables.sg)
    }
}
