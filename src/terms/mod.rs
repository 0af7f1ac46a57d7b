//! Per-element term engines.
//!
//! Each engine turns one element's solution (plus its face neighbours) into
//! a residual contribution and a wave speed:
//!
//! - [`ConvectiveTerm`]: analytical and Riemann fluxes, residual `-= ∇·F`
//! - [`DiffusiveTerm`]: averaged and lifted face gradients, residual `+= ∇·F_v`
//! - [`SourceTerm`]: local source, residual `+= S`
//!
//! Engines write only the slices of the element they evaluate and read
//! neighbours without mutation, so elements can be evaluated concurrently.

mod convective;
mod diffusive;
mod face;
pub mod scratch;
mod source;

pub use convective::ConvectiveTerm;
pub use diffusive::{
    DiffusiveTerm, DiffusiveTermConfig, flux_point_gradient, lifted_gradient, physical_gradient,
};
pub use face::FaceFlux;
pub use scratch::{FaceScratch, Scratch, ScratchGuard, ScratchPool};
pub use source::SourceTerm;

use crate::error::Result;
use crate::field::{ElementOutput, SolutionState};
use crate::mesh::SdMesh;

/// A term of the semi-discrete residual, evaluated element by element.
pub trait ElementTerm<M, const NEQS: usize, const NDIM: usize>: Send + Sync
where
    M: SdMesh<NDIM>,
{
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Check that the fields fit the mesh and every collaborator the term
    /// needs is present. Called once before a pass.
    fn validate(&self, mesh: &M, state: &SolutionState<'_, NEQS, NDIM>) -> Result<()>;

    /// Add this term's contribution for element `element` to `out`.
    fn compute_element(
        &self,
        mesh: &M,
        state: &SolutionState<'_, NEQS, NDIM>,
        element: usize,
        out: &mut ElementOutput<'_, NEQS>,
    ) -> Result<()>;
}
