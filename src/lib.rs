// SPDX-License-Identifier: AGPL-3.0-only

//! cosmicstar — statistical history of dark-matter halo formation.
//!
//! From the Press–Schechter family of formalisms this crate computes the
//! halo mass function under nine published fitting formulas, integrates it
//! into halo statistics (total number density, fraction of baryons locked
//! into structures), and derives the baryon accretion rate onto structures
//! as a function of scale factor. Models after Pereira & Miranda
//! (MNRAS 401, 1924, 2010); mass functions from Sheth & Tormen (1999),
//! Press & Schechter (1974), Jenkins et al. (2001), Warren et al. (2006),
//! Tinker et al. (2008), Watson et al. (2013), Marassi & Lima (2006), and
//! Reed et al. (2007).
//!
//! ## Modules
//!   - `structures` — the `Structures` engine: precomputed tables, the
//!     mass-function evaluator, spline quadrature, accretion history
//!   - `cosmology` — background-model collaborator trait
//!   - `cache` — persistent keyed store of the precomputed table set
//!   - `numerical` — locate/Ridders/natural-spline kernels
//!   - `constants` — physical and grid constants
//!   - `error` — typed failure taxonomy
//!
//! The background cosmology (growth function, densities, σ(M), ages) is a
//! collaborator supplied by the caller through the [`cosmology::Cosmology`]
//! trait, not computed here.

pub mod cache;
pub mod constants;
pub mod cosmology;
pub mod error;
pub mod numerical;
pub mod structures;

pub use cache::{CachedTables, TableCache};
pub use cosmology::Cosmology;
pub use error::CosmicStarError;
pub use structures::{CustomMassFunction, MassFunctionKind, Structures, StructuresConfig};
