//! Local source term.
//!
//! Pointwise: no faces, no divergence, no Jacobian scaling and no wave-speed
//! contribution.

use super::ElementTerm;
use super::face::point_data;
use crate::element::{ElementPoint, ElementView};
use crate::error::Result;
use crate::field::{ElementOutput, SolutionState};
use crate::mesh::SdMesh;
use crate::physics::SourceFunction;

/// Source term engine for physics `P`.
pub struct SourceTerm<P> {
    physics: P,
}

impl<P> SourceTerm<P> {
    /// Create the engine.
    pub fn new(physics: P) -> Self {
        Self { physics }
    }

    /// Physics strategy.
    pub fn physics(&self) -> &P {
        &self.physics
    }
}

impl<M, P, const NEQS: usize, const NDIM: usize> ElementTerm<M, NEQS, NDIM> for SourceTerm<P>
where
    M: SdMesh<NDIM>,
    P: SourceFunction<NEQS, NDIM>,
{
    fn name(&self) -> &'static str {
        "source"
    }

    fn validate(&self, mesh: &M, state: &SolutionState<'_, NEQS, NDIM>) -> Result<()> {
        state.check_mesh(mesh)
    }

    fn compute_element(
        &self,
        mesh: &M,
        state: &SolutionState<'_, NEQS, NDIM>,
        element: usize,
        out: &mut ElementOutput<'_, NEQS>,
    ) -> Result<()> {
        let elem = mesh.element(element);
        let n_sol = elem.nb_solution_points();
        out.check_len(n_sol)?;
        let u = state.solution.element(element);
        let gradients = state.gradients.map(|g| g.element(element));

        for s in 0..n_sol {
            let coord = elem.point_coord(ElementPoint::Solution(s));
            let data = point_data(&self.physics, u[s], coord, gradients.map(|g| g[s]));
            let source = self.physics.compute_source(&data);
            if let Some(term) = out.term.as_deref_mut() {
                term[s] = source;
            }
            for e in 0..NEQS {
                out.residual[s][e] += source[e];
            }
        }
        Ok(())
    }
}
