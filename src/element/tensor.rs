//! Reference [`ElementView`] on multilinear cells.

use super::geometry::{multilinear_jacobian, multilinear_map};
use super::{ElementPoint, ElementView, SdReference};

/// One cell of a tensor mesh seen through its reference element.
#[derive(Clone, Copy)]
pub struct TensorElement<'a, const NDIM: usize> {
    reference: &'a SdReference<NDIM>,
    vertices: &'a [[f64; NDIM]],
    index: usize,
}

impl<'a, const NDIM: usize> TensorElement<'a, NDIM> {
    /// Create a view; `vertices` are in lexicographic reference order.
    pub fn new(reference: &'a SdReference<NDIM>, vertices: &'a [[f64; NDIM]], index: usize) -> Self {
        debug_assert_eq!(vertices.len(), 1 << NDIM);
        Self {
            reference,
            vertices,
            index,
        }
    }

    /// Reference element.
    pub fn reference(&self) -> &'a SdReference<NDIM> {
        self.reference
    }

    /// Cell vertices.
    pub fn vertices(&self) -> &'a [[f64; NDIM]] {
        self.vertices
    }
}

impl<const NDIM: usize> ElementView<NDIM> for TensorElement<'_, NDIM> {
    fn index(&self) -> usize {
        self.index
    }

    fn nb_solution_points(&self) -> usize {
        self.reference.n_solution_points()
    }

    fn nb_flux_points(&self) -> usize {
        self.reference.n_flux_points()
    }

    fn nb_faces(&self) -> usize {
        self.reference.n_faces()
    }

    fn face_flux_point_indices(&self, face: usize) -> &[usize] {
        self.reference.face_flux_points(face)
    }

    fn interior_flux_point_indices(&self) -> &[usize] {
        self.reference.interior_flux_points()
    }

    fn flux_point_sign(&self, fp: usize) -> f64 {
        self.reference.flux_sign(fp)
    }

    fn flux_point_direction(&self, fp: usize) -> usize {
        self.reference.flux_direction(fp)
    }

    fn point_coord(&self, point: ElementPoint) -> [f64; NDIM] {
        multilinear_map(self.vertices, &self.reference.reference_coord(point))
    }

    fn geometric_jacobian(&self, point: ElementPoint) -> [[f64; NDIM]; NDIM] {
        multilinear_jacobian(self.vertices, &self.reference.reference_coord(point))
    }

    fn reconstruct_value<const N: usize>(&self, fp: usize, nodal: &[[f64; N]]) -> [f64; N] {
        self.reference.reconstruct_value(fp, nodal)
    }

    fn reconstruct_divergence<const N: usize>(&self, flux: &[[f64; N]]) -> Vec<[f64; N]> {
        self.reference.reconstruct_divergence(flux)
    }

    fn reconstruct_directional(&self, values: &[f64]) -> Vec<[f64; NDIM]> {
        self.reference.reconstruct_directional(values)
    }

    fn local_gradient_operator(&self, point: ElementPoint) -> Vec<[f64; NDIM]> {
        self.reference.local_gradient_operator(point)
    }

    fn flux_field_local_gradient<const N: usize>(
        &self,
        fp: usize,
        values: &[[f64; N]],
    ) -> [[f64; N]; NDIM] {
        self.reference.flux_field_local_gradient(fp, values)
    }
}
