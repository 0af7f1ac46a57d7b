//! Polynomial evaluation and point distributions.
//!
//! This module provides:
//! - 1D Legendre polynomials and their derivatives
//! - Gauss-Legendre nodes and weights (solution points)
//! - Spectral-difference flux points (endpoints + Gauss-Legendre interior)
//! - 1D Lagrange interpolation tables

mod lagrange;
mod legendre;
mod nodes;

pub use lagrange::LagrangeBasis1D;
pub use legendre::{legendre, legendre_and_derivative};
pub use nodes::{
    flux_nodes, gauss_legendre_nodes, gauss_legendre_weights, is_legendre_root, solution_nodes,
};
