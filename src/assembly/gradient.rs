//! Solution gradient pass.
//!
//! First half of the two-pass strategy: compute every element's physical
//! gradient at its solution points once, then let terms read them.

use crate::element::{ElementPoint, ElementView};
use crate::error::Result;
use crate::field::{GradientField, SolutionField};
use crate::mesh::SdMesh;
use crate::terms::physical_gradient;

fn element_gradients<M, const NEQS: usize, const NDIM: usize>(
    mesh: &M,
    solution: &SolutionField<NEQS>,
    k: usize,
    out: &mut [[[f64; NEQS]; NDIM]],
) where
    M: SdMesh<NDIM>,
{
    let elem = mesh.element(k);
    let u = solution.element(k);
    for (s, g) in out.iter_mut().enumerate() {
        *g = physical_gradient(&elem, ElementPoint::Solution(s), u);
    }
}

/// Physical solution gradient at every solution point.
pub fn compute_gradient_field<M, const NEQS: usize, const NDIM: usize>(
    mesh: &M,
    solution: &SolutionField<NEQS>,
) -> Result<GradientField<NEQS, NDIM>>
where
    M: SdMesh<NDIM>,
{
    solution.check_shape("solution", mesh.n_elements(), mesh.nb_solution_points())?;
    let mut gradients = GradientField::zero_gradients(mesh.n_elements(), mesh.nb_solution_points());
    for k in 0..mesh.n_elements() {
        element_gradients(mesh, solution, k, gradients.element_mut(k));
    }
    Ok(gradients)
}

/// Parallel version of [`compute_gradient_field`].
#[cfg(feature = "parallel")]
pub fn compute_gradient_field_parallel<M, const NEQS: usize, const NDIM: usize>(
    mesh: &M,
    solution: &SolutionField<NEQS>,
) -> Result<GradientField<NEQS, NDIM>>
where
    M: SdMesh<NDIM>,
{
    use rayon::prelude::*;

    solution.check_shape("solution", mesh.n_elements(), mesh.nb_solution_points())?;
    let n_points = mesh.nb_solution_points();
    let mut gradients = GradientField::zero_gradients(mesh.n_elements(), n_points);
    gradients
        .data_mut()
        .par_chunks_mut(n_points)
        .enumerate()
        .for_each(|(k, chunk)| element_gradients(mesh, solution, k, chunk));
    Ok(gradients)
}
