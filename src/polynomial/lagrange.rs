//! 1D Lagrange interpolation tables.
//!
//! Spectral-difference operators are tensor products of two 1D bases: one
//! through the solution points (reconstruction, gradients) and one through the
//! flux points (divergence, lifting).

use faer::Mat;

/// Lagrange basis through a fixed set of distinct nodes.
#[derive(Clone, Debug)]
pub struct LagrangeBasis1D {
    nodes: Vec<f64>,
}

impl LagrangeBasis1D {
    /// Create a basis through `nodes`.
    pub fn new(nodes: Vec<f64>) -> Self {
        Self { nodes }
    }

    /// Interpolation nodes.
    pub fn nodes(&self) -> &[f64] {
        &self.nodes
    }

    /// Number of basis functions.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the basis is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Value of basis function `j` at `x`.
    pub fn value(&self, j: usize, x: f64) -> f64 {
        let xj = self.nodes[j];
        self.nodes
            .iter()
            .enumerate()
            .filter(|&(m, _)| m != j)
            .map(|(_, &xm)| (x - xm) / (xj - xm))
            .product()
    }

    /// Derivative of basis function `j` at `x`.
    pub fn derivative(&self, j: usize, x: f64) -> f64 {
        let xj = self.nodes[j];
        let n = self.nodes.len();
        let mut sum = 0.0;
        for i in (0..n).filter(|&i| i != j) {
            let mut term = 1.0 / (xj - self.nodes[i]);
            for m in (0..n).filter(|&m| m != j && m != i) {
                term *= (x - self.nodes[m]) / (xj - self.nodes[m]);
            }
            sum += term;
        }
        sum
    }

    /// Interpolation matrix: `M[(p, j)] = l_j(points[p])`.
    pub fn interpolation_matrix(&self, points: &[f64]) -> Mat<f64> {
        Mat::from_fn(points.len(), self.len(), |p, j| self.value(j, points[p]))
    }

    /// Derivative matrix: `M[(p, j)] = l'_j(points[p])`.
    pub fn derivative_matrix(&self, points: &[f64]) -> Mat<f64> {
        Mat::from_fn(points.len(), self.len(), |p, j| self.derivative(j, points[p]))
    }
}
