// SPDX-License-Identifier: AGPL-3.0-only

//! Typed errors for structure-formation computations.
//!
//! Construction, evaluation, and caching fail in distinct ways: a variant
//! tag nobody registered, σ outside a formula's fitted domain, a model
//! parameter that makes no sense, or a cache directory that cannot be
//! written. One enum keeps those distinguishable at match sites; `Display`
//! carries the detail.

use std::fmt;

/// Errors arising from configuration, mass-function evaluation, or caching.
#[derive(Debug)]
pub enum CosmicStarError {
    /// The requested mass-function tag is not registered (builtin or custom).
    UnknownMassFunction(String),

    /// σ (or log-mass, for Warren) lies outside the variant's published
    /// validity domain.
    OutsideMassRange(String),

    /// A model parameter is invalid: Burr q outside (0,2)\{1} or unset,
    /// negative redshift for WT2, or a Tinker-only accessor on another
    /// variant.
    InvalidParameter(String),

    /// The table cache directory or file cannot be created or written.
    CacheIo(String),
}

impl fmt::Display for CosmicStarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMassFunction(tag) => {
                write!(f, "No defined mass function for tag '{tag}'")
            }
            Self::OutsideMassRange(msg) => {
                write!(f, "Mass of dark halo outside of the valid range: {msg}")
            }
            Self::InvalidParameter(msg) => write!(f, "Invalid parameter: {msg}"),
            Self::CacheIo(msg) => write!(f, "Table cache I/O failed: {msg}"),
        }
    }
}

impl std::error::Error for CosmicStarError {}
