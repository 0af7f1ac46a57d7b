//! Per-element shape-function operators.
//!
//! The term engines only see elements through [`ElementView`]: point counts,
//! face/interior flux-point lists, reconstruction and differentiation
//! operators, and the geometric Jacobian. [`TensorElement`] is the reference
//! implementation on multilinear cells.

pub mod geometry;
pub mod reference;
pub mod tensor;

pub use reference::{FluxPointLayout, SdReference};
pub use tensor::TensorElement;

/// A point of an element, numbered per point set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementPoint {
    /// Solution point index
    Solution(usize),
    /// Flux point index
    Flux(usize),
}

/// Read-only view of one element's SD operators and geometry.
///
/// Values are returned by value so that views can be held by several
/// evaluations at once.
pub trait ElementView<const NDIM: usize> {
    /// Global element index.
    fn index(&self) -> usize;

    /// Number of solution points.
    fn nb_solution_points(&self) -> usize;

    /// Number of flux points.
    fn nb_flux_points(&self) -> usize;

    /// Number of faces.
    fn nb_faces(&self) -> usize;

    /// Flux points lying on `face`.
    fn face_flux_point_indices(&self, face: usize) -> &[usize];

    /// Flux points strictly inside the element.
    fn interior_flux_point_indices(&self) -> &[usize];

    /// Fixed sign of a flux point relative to the outward face normal.
    fn flux_point_sign(&self, fp: usize) -> f64;

    /// Reference direction whose flux a flux point carries.
    fn flux_point_direction(&self, fp: usize) -> usize;

    /// Physical coordinates of a point.
    fn point_coord(&self, point: ElementPoint) -> [f64; NDIM];

    /// Geometric Jacobian `G[d][i] = ∂x_i/∂ξ_d` at a point.
    fn geometric_jacobian(&self, point: ElementPoint) -> [[f64; NDIM]; NDIM];

    /// Jacobian determinant at a point.
    fn jacobian_determinant(&self, point: ElementPoint) -> f64 {
        geometry::determinant(&self.geometric_jacobian(point))
    }

    /// Plane-Jacobian normal of a flux point, `det(G) ∇_x ξ_d` for its
    /// direction `d`.
    fn plane_jacobian_normal(&self, fp: usize) -> [f64; NDIM] {
        let g = self.geometric_jacobian(ElementPoint::Flux(fp));
        geometry::plane_jacobian_normal(&g, self.flux_point_direction(fp))
    }

    /// Interpolate solution-point values to flux point `fp`.
    fn reconstruct_value<const N: usize>(&self, fp: usize, nodal: &[[f64; N]]) -> [f64; N];

    /// Reference divergence of a flux-point field at every solution point.
    fn reconstruct_divergence<const N: usize>(&self, flux: &[[f64; N]]) -> Vec<[f64; N]>;

    /// Interpolate a scalar flux-point field to every solution point, one
    /// value per reference direction.
    fn reconstruct_directional(&self, values: &[f64]) -> Vec<[f64; NDIM]>;

    /// Reference gradient of every solution basis function at `point`.
    fn local_gradient_operator(&self, point: ElementPoint) -> Vec<[f64; NDIM]>;

    /// Reference gradient at flux point `fp` of a field defined on flux points.
    fn flux_field_local_gradient<const N: usize>(
        &self,
        fp: usize,
        values: &[[f64; N]],
    ) -> [[f64; N]; NDIM];
}
