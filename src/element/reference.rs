//! Tensor-product spectral-difference reference element.
//!
//! Along each reference direction the element carries N+1 solution points
//! (Gauss-Legendre) and N+2 flux points (endpoints + Gauss-Legendre roots of
//! P_N). A flux point of direction `d` sits at a flux node along `ξ_d` and at
//! solution nodes along every other direction, so all 1D operators act along
//! single lines of points.
//!
//! Numbering:
//! - solution point: `Σ_e m[e] (N+1)^e` for multi-index `m`
//! - flux point of direction `d`: `d · B + m[d] + (N+2) · t`, where `B` is the
//!   number of flux points per direction and `t` enumerates the remaining
//!   indices in ascending direction order
//! - face `2d` is `ξ_d = -1` (sign -1), face `2d + 1` is `ξ_d = +1` (sign +1)

use faer::Mat;

use super::ElementPoint;
use crate::error::{Result, SdError};
use crate::polynomial::{LagrangeBasis1D, flux_nodes, gauss_legendre_weights, solution_nodes};

/// Location of a flux point in the tensor layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FluxPointLayout<const NDIM: usize> {
    /// Reference direction the flux point carries flux for.
    pub direction: usize,
    /// Node index per direction: a flux node along `direction`, solution
    /// nodes elsewhere.
    pub index: [usize; NDIM],
}

/// Coordinate of a point along one direction: a solution or a flux node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NodeRef {
    Solution(usize),
    Flux(usize),
}

/// Reference tables and numbering of a tensor-product SD element.
#[derive(Clone)]
pub struct SdReference<const NDIM: usize> {
    order: usize,
    n_sol_1d: usize,
    n_flux_1d: usize,

    /// Solution nodes in [-1, 1]
    pub solution_nodes: Vec<f64>,
    /// Flux nodes in [-1, 1], endpoints included
    pub flux_nodes: Vec<f64>,
    solution_weights_1d: Vec<f64>,

    /// l_j(flux node a), shape (N+2, N+1)
    sol_at_flux: Mat<f64>,
    /// l'_j(flux node a), shape (N+2, N+1)
    dsol_at_flux: Mat<f64>,
    /// l'_j(solution node k), shape (N+1, N+1)
    dsol_at_sol: Mat<f64>,
    /// h_a(solution node k), shape (N+1, N+2)
    flux_at_sol: Mat<f64>,
    /// h'_a(solution node k), shape (N+1, N+2)
    dflux_at_sol: Mat<f64>,
    /// h'_a(flux node b), shape (N+2, N+2)
    dflux_at_flux: Mat<f64>,

    solution_points: Vec<[usize; NDIM]>,
    flux_points: Vec<FluxPointLayout<NDIM>>,
    flux_signs: Vec<f64>,
    face_flux_points: Vec<Vec<usize>>,
    interior_flux_points: Vec<usize>,
}

impl<const NDIM: usize> SdReference<NDIM> {
    /// Build the reference element for polynomial order `order`.
    pub fn new(order: usize) -> Result<Self> {
        if !(1..=3).contains(&NDIM) {
            return Err(SdError::configuration(format!(
                "tensor SD elements support 1 to 3 dimensions, got {}",
                NDIM
            )));
        }

        let n_sol_1d = order + 1;
        let n_flux_1d = order + 2;

        let sol_nodes = solution_nodes(order);
        let fl_nodes = flux_nodes(order);
        let solution_weights_1d = gauss_legendre_weights(&sol_nodes);

        let sol_basis = LagrangeBasis1D::new(sol_nodes.clone());
        let flux_basis = LagrangeBasis1D::new(fl_nodes.clone());

        let sol_at_flux = sol_basis.interpolation_matrix(&fl_nodes);
        let dsol_at_flux = sol_basis.derivative_matrix(&fl_nodes);
        let dsol_at_sol = sol_basis.derivative_matrix(&sol_nodes);
        let flux_at_sol = flux_basis.interpolation_matrix(&sol_nodes);
        let dflux_at_sol = flux_basis.derivative_matrix(&sol_nodes);
        let dflux_at_flux = flux_basis.derivative_matrix(&fl_nodes);

        // Solution points, first direction fastest
        let n_sol = n_sol_1d.pow(NDIM as u32);
        let solution_points: Vec<[usize; NDIM]> = (0..n_sol)
            .map(|s| {
                let mut rem = s;
                std::array::from_fn(|_| {
                    let i = rem % n_sol_1d;
                    rem /= n_sol_1d;
                    i
                })
            })
            .collect();

        // Flux points, direction blocks, flux node fastest inside a block
        let n_lines = n_sol_1d.pow(NDIM as u32 - 1);
        let mut flux_points = Vec::with_capacity(NDIM * n_lines * n_flux_1d);
        for direction in 0..NDIM {
            for t in 0..n_lines {
                let mut index = [0; NDIM];
                let mut rem = t;
                for e in (0..NDIM).filter(|&e| e != direction) {
                    index[e] = rem % n_sol_1d;
                    rem /= n_sol_1d;
                }
                for a in 0..n_flux_1d {
                    index[direction] = a;
                    flux_points.push(FluxPointLayout { direction, index });
                }
            }
        }

        let mut face_flux_points = vec![Vec::with_capacity(n_lines); 2 * NDIM];
        let mut interior_flux_points = Vec::new();
        let mut flux_signs = Vec::with_capacity(flux_points.len());
        for (f, layout) in flux_points.iter().enumerate() {
            let a = layout.index[layout.direction];
            if a == 0 {
                face_flux_points[2 * layout.direction].push(f);
                flux_signs.push(-1.0);
            } else if a == n_flux_1d - 1 {
                face_flux_points[2 * layout.direction + 1].push(f);
                flux_signs.push(1.0);
            } else {
                interior_flux_points.push(f);
                flux_signs.push(1.0);
            }
        }

        Ok(Self {
            order,
            n_sol_1d,
            n_flux_1d,
            solution_nodes: sol_nodes,
            flux_nodes: fl_nodes,
            solution_weights_1d,
            sol_at_flux,
            dsol_at_flux,
            dsol_at_sol,
            flux_at_sol,
            dflux_at_sol,
            dflux_at_flux,
            solution_points,
            flux_points,
            flux_signs,
            face_flux_points,
            interior_flux_points,
        })
    }

    /// Polynomial order.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of solution points.
    pub fn n_solution_points(&self) -> usize {
        self.solution_points.len()
    }

    /// Number of flux points (all directions).
    pub fn n_flux_points(&self) -> usize {
        self.flux_points.len()
    }

    /// Number of faces.
    pub fn n_faces(&self) -> usize {
        2 * NDIM
    }

    /// Solution-point number of a multi-index.
    #[inline]
    pub fn solution_index(&self, index: &[usize; NDIM]) -> usize {
        index
            .iter()
            .rev()
            .fold(0, |acc, &i| acc * self.n_sol_1d + i)
    }

    /// Flux-point number of direction `d` and multi-index `index`.
    #[inline]
    pub fn flux_index(&self, direction: usize, index: &[usize; NDIM]) -> usize {
        let block = self.n_flux_1d * self.n_sol_1d.pow(NDIM as u32 - 1);
        let mut t = 0;
        let mut stride = 1;
        for e in (0..NDIM).filter(|&e| e != direction) {
            t += index[e] * stride;
            stride *= self.n_sol_1d;
        }
        direction * block + index[direction] + self.n_flux_1d * t
    }

    /// Multi-index of a solution point.
    #[inline]
    pub fn solution_multi_index(&self, s: usize) -> [usize; NDIM] {
        self.solution_points[s]
    }

    /// Layout of a flux point.
    #[inline]
    pub fn flux_layout(&self, f: usize) -> FluxPointLayout<NDIM> {
        self.flux_points[f]
    }

    /// Flux points on a face.
    pub fn face_flux_points(&self, face: usize) -> &[usize] {
        &self.face_flux_points[face]
    }

    /// Flux points strictly inside the element.
    pub fn interior_flux_points(&self) -> &[usize] {
        &self.interior_flux_points
    }

    /// Sign of a flux point relative to the outward normal.
    #[inline]
    pub fn flux_sign(&self, f: usize) -> f64 {
        self.flux_signs[f]
    }

    /// Tensor quadrature weight of a solution point on [-1, 1]^NDIM.
    pub fn solution_weight(&self, s: usize) -> f64 {
        self.solution_points[s]
            .iter()
            .map(|&i| self.solution_weights_1d[i])
            .product()
    }

    /// Quadrature weight of a face flux point on its reference face
    /// [-1, 1]^(NDIM-1).
    pub fn face_weight(&self, f: usize) -> f64 {
        let layout = self.flux_points[f];
        (0..NDIM)
            .filter(|&e| e != layout.direction)
            .map(|e| self.solution_weights_1d[layout.index[e]])
            .product()
    }

    fn node_refs(&self, point: ElementPoint) -> [NodeRef; NDIM] {
        match point {
            ElementPoint::Solution(s) => {
                let m = self.solution_points[s];
                std::array::from_fn(|e| NodeRef::Solution(m[e]))
            }
            ElementPoint::Flux(f) => {
                let layout = self.flux_points[f];
                std::array::from_fn(|e| {
                    if e == layout.direction {
                        NodeRef::Flux(layout.index[e])
                    } else {
                        NodeRef::Solution(layout.index[e])
                    }
                })
            }
        }
    }

    /// Reference coordinates of a point.
    pub fn reference_coord(&self, point: ElementPoint) -> [f64; NDIM] {
        let refs = self.node_refs(point);
        std::array::from_fn(|e| match refs[e] {
            NodeRef::Solution(k) => self.solution_nodes[k],
            NodeRef::Flux(a) => self.flux_nodes[a],
        })
    }

    /// Reference direction of a flux point.
    #[inline]
    pub fn flux_direction(&self, f: usize) -> usize {
        self.flux_points[f].direction
    }

    fn basis_value(&self, node: NodeRef, j: usize) -> f64 {
        match node {
            NodeRef::Solution(k) => {
                if k == j {
                    1.0
                } else {
                    0.0
                }
            }
            NodeRef::Flux(a) => self.sol_at_flux[(a, j)],
        }
    }

    fn basis_derivative(&self, node: NodeRef, j: usize) -> f64 {
        match node {
            NodeRef::Solution(k) => self.dsol_at_sol[(k, j)],
            NodeRef::Flux(a) => self.dsol_at_flux[(a, j)],
        }
    }

    /// Interpolate solution-point values to a flux point.
    pub fn reconstruct_value<const N: usize>(&self, f: usize, nodal: &[[f64; N]]) -> [f64; N] {
        let layout = self.flux_points[f];
        let d = layout.direction;
        let a = layout.index[d];
        let mut index = layout.index;
        let mut out = [0.0; N];
        for i in 0..self.n_sol_1d {
            index[d] = i;
            let w = self.sol_at_flux[(a, i)];
            let u = &nodal[self.solution_index(&index)];
            for e in 0..N {
                out[e] += w * u[e];
            }
        }
        out
    }

    /// Reference divergence `Σ_d ∂F_d/∂ξ_d` at every solution point.
    pub fn reconstruct_divergence<const N: usize>(&self, flux: &[[f64; N]]) -> Vec<[f64; N]> {
        self.solution_points
            .iter()
            .map(|m| {
                let mut out = [0.0; N];
                for d in 0..NDIM {
                    let mut index = *m;
                    for a in 0..self.n_flux_1d {
                        index[d] = a;
                        let w = self.dflux_at_sol[(m[d], a)];
                        let fv = &flux[self.flux_index(d, &index)];
                        for e in 0..N {
                            out[e] += w * fv[e];
                        }
                    }
                }
                out
            })
            .collect()
    }

    /// Interpolate per-direction flux-point values to every solution point.
    pub fn reconstruct_directional(&self, values: &[f64]) -> Vec<[f64; NDIM]> {
        self.solution_points
            .iter()
            .map(|m| {
                std::array::from_fn(|d| {
                    let mut index = *m;
                    (0..self.n_flux_1d)
                        .map(|a| {
                            index[d] = a;
                            self.flux_at_sol[(m[d], a)] * values[self.flux_index(d, &index)]
                        })
                        .sum()
                })
            })
            .collect()
    }

    /// Reference gradient of every solution-point basis function at `point`.
    ///
    /// Entry `j` holds `∂l_j/∂ξ_d` for each direction `d`.
    pub fn local_gradient_operator(&self, point: ElementPoint) -> Vec<[f64; NDIM]> {
        let refs = self.node_refs(point);
        self.solution_points
            .iter()
            .map(|mj| {
                let values: [f64; NDIM] = std::array::from_fn(|e| self.basis_value(refs[e], mj[e]));
                let derivs: [f64; NDIM] =
                    std::array::from_fn(|e| self.basis_derivative(refs[e], mj[e]));
                std::array::from_fn(|d| {
                    (0..NDIM)
                        .map(|e| if e == d { derivs[e] } else { values[e] })
                        .product()
                })
            })
            .collect()
    }

    /// Reference gradient at flux point `f` of a field living on flux points.
    ///
    /// The field is differentiated along the flux-point line through `f`;
    /// only the component of `f`'s own direction is non-zero.
    pub fn flux_field_local_gradient<const N: usize>(
        &self,
        f: usize,
        values: &[[f64; N]],
    ) -> [[f64; N]; NDIM] {
        let layout = self.flux_points[f];
        let d = layout.direction;
        let a = layout.index[d];
        let mut index = layout.index;
        let mut out = [[0.0; N]; NDIM];
        for b in 0..self.n_flux_1d {
            index[d] = b;
            let w = self.dflux_at_flux[(a, b)];
            let v = &values[self.flux_index(d, &index)];
            for e in 0..N {
                out[d][e] += w * v[e];
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_counts() {
        let r1 = SdReference::<1>::new(2).unwrap();
        assert_eq!(r1.n_solution_points(), 3);
        assert_eq!(r1.n_flux_points(), 4);
        assert_eq!(r1.interior_flux_points().len(), 2);

        let r2 = SdReference::<2>::new(1).unwrap();
        assert_eq!(r2.n_solution_points(), 4);
        assert_eq!(r2.n_flux_points(), 2 * 3 * 2);
        assert_eq!(r2.n_faces(), 4);
        for face in 0..4 {
            assert_eq!(r2.face_flux_points(face).len(), 2);
        }

        let r3 = SdReference::<3>::new(1).unwrap();
        assert_eq!(r3.n_solution_points(), 8);
        assert_eq!(r3.n_flux_points(), 3 * 3 * 4);
        assert_eq!(r3.face_flux_points(5).len(), 4);
    }

    #[test]
    fn test_flux_index_roundtrip() {
        let r = SdReference::<3>::new(2).unwrap();
        for f in 0..r.n_flux_points() {
            let layout = r.flux_layout(f);
            assert_eq!(r.flux_index(layout.direction, &layout.index), f);
        }
        for s in 0..r.n_solution_points() {
            assert_eq!(r.solution_index(&r.solution_multi_index(s)), s);
        }
    }

    #[test]
    fn test_signs_and_faces() {
        let r = SdReference::<2>::new(2).unwrap();
        for face in 0..r.n_faces() {
            let expected = if face % 2 == 0 { -1.0 } else { 1.0 };
            for &f in r.face_flux_points(face) {
                assert_eq!(r.flux_sign(f), expected);
                let xi = r.reference_coord(ElementPoint::Flux(f));
                assert_eq!(xi[face / 2], expected);
            }
        }
        for &f in r.interior_flux_points() {
            let xi = r.reference_coord(ElementPoint::Flux(f));
            let d = r.flux_direction(f);
            assert!(xi[d].abs() < 1.0);
        }
    }

    #[test]
    fn test_reconstruction_of_linear_field() {
        let r = SdReference::<2>::new(2).unwrap();
        let field = |xi: [f64; 2]| 1.0 + 2.0 * xi[0] - 0.5 * xi[1];
        let nodal: Vec<[f64; 1]> = (0..r.n_solution_points())
            .map(|s| [field(r.reference_coord(ElementPoint::Solution(s)))])
            .collect();
        for f in 0..r.n_flux_points() {
            let exact = field(r.reference_coord(ElementPoint::Flux(f)));
            assert!((r.reconstruct_value(f, &nodal)[0] - exact).abs() < 1e-13);
        }
    }

    #[test]
    fn test_divergence_of_linear_flux() {
        // F_ξ = 3ξ, F_η = -η  →  div = 3 - 1 = 2
        let r = SdReference::<2>::new(1).unwrap();
        let flux: Vec<[f64; 1]> = (0..r.n_flux_points())
            .map(|f| {
                let xi = r.reference_coord(ElementPoint::Flux(f));
                match r.flux_direction(f) {
                    0 => [3.0 * xi[0]],
                    _ => [-xi[1]],
                }
            })
            .collect();
        for div in r.reconstruct_divergence(&flux) {
            assert!((div[0] - 2.0).abs() < 1e-13);
        }
    }

    #[test]
    fn test_local_gradient_operator() {
        let r = SdReference::<2>::new(2).unwrap();
        let field = |xi: [f64; 2]| xi[0] * xi[1] + 4.0 * xi[1];
        let nodal: Vec<f64> = (0..r.n_solution_points())
            .map(|s| field(r.reference_coord(ElementPoint::Solution(s))))
            .collect();
        let points = (0..r.n_solution_points())
            .map(ElementPoint::Solution)
            .chain((0..r.n_flux_points()).map(ElementPoint::Flux));
        for point in points {
            let xi = r.reference_coord(point);
            let op = r.local_gradient_operator(point);
            let grad: [f64; 2] =
                std::array::from_fn(|d| op.iter().zip(&nodal).map(|(g, u)| g[d] * u).sum());
            assert!((grad[0] - xi[1]).abs() < 1e-12);
            assert!((grad[1] - (xi[0] + 4.0)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_directional_reconstruction_of_constant() {
        let r = SdReference::<2>::new(3).unwrap();
        let values = vec![2.5; r.n_flux_points()];
        for ws in r.reconstruct_directional(&values) {
            assert!((ws[0] - 2.5).abs() < 1e-12);
            assert!((ws[1] - 2.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_flux_field_gradient_order_zero() {
        // Flux nodes {-1, 1}: h'_{-1} = -1/2, h'_{+1} = 1/2
        let r = SdReference::<1>::new(0).unwrap();
        let right = r.face_flux_points(1)[0];
        let mut jump = vec![[0.0]; r.n_flux_points()];
        jump[right] = [2.0];
        let g = r.flux_field_local_gradient(right, &jump);
        assert!((g[0][0] - 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_solution_weights_sum() {
        let r = SdReference::<2>::new(2).unwrap();
        let total: f64 = (0..r.n_solution_points()).map(|s| r.solution_weight(s)).sum();
        assert!((total - 4.0).abs() < 1e-13);
    }

    #[test]
    fn test_face_weights_sum() {
        let r = SdReference::<3>::new(2).unwrap();
        for face in 0..r.n_faces() {
            let total: f64 = r.face_flux_points(face).iter().map(|&f| r.face_weight(f)).sum();
            assert!((total - 4.0).abs() < 1e-13);
        }
        let line = SdReference::<1>::new(1).unwrap();
        assert_eq!(line.face_weight(line.face_flux_points(0)[0]), 1.0);
    }

    #[test]
    fn test_unsupported_dimension() {
        assert!(matches!(
            SdReference::<4>::new(1),
            Err(SdError::Configuration(_))
        ));
    }
}
