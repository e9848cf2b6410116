// SPDX-License-Identifier: AGPL-3.0-only

//! Self-contained numerical kernels: table location, Ridders differentiation,
//! and natural cubic splines.

pub mod locate;
pub mod ridders;
pub mod spline;

pub use locate::locate;
pub use ridders::dfridr;
pub use spline::Spline;
