//! Solution-point and flux-point distributions on [-1, 1].
//!
//! Spectral-difference elements carry N+1 solution points at the
//! Gauss-Legendre roots of P_{N+1} and N+2 flux points: both endpoints plus the
//! N Gauss-Legendre roots of P_N. This is the flux-point family for which the
//! scheme is linearly stable at every order.

use super::legendre::{legendre, legendre_and_derivative};
use std::f64::consts::PI;

/// Compute the `n` Gauss-Legendre points (roots of P_n) in ascending order.
///
/// Only the lower half is iterated; the upper half is mirrored so that the set
/// is exactly symmetric. Face points of neighbouring elements then coincide
/// bitwise whenever their mappings agree.
pub fn gauss_legendre_nodes(n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }

    let mut nodes = vec![0.0; n];
    for i in 0..n / 2 {
        // Initial guess from the asymptotic root estimate
        let mut x = -(PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        for _ in 0..100 {
            let (p, dp) = legendre_and_derivative(n, x);
            let update = p / dp;
            x -= update;
            if update.abs() < 1e-15 {
                break;
            }
        }
        nodes[i] = x;
        nodes[n - 1 - i] = -x;
    }

    nodes
}

/// Gauss-Legendre quadrature weights for the given nodes of P_n.
///
/// w_j = 2 / ((1 - x_j²) [P'_n(x_j)]²)
pub fn gauss_legendre_weights(nodes: &[f64]) -> Vec<f64> {
    let n = nodes.len();
    nodes
        .iter()
        .map(|&x| {
            let (_, dp) = legendre_and_derivative(n, x);
            2.0 / ((1.0 - x * x) * dp * dp)
        })
        .collect()
}

/// Solution points for polynomial order `order`: N+1 Gauss-Legendre points.
pub fn solution_nodes(order: usize) -> Vec<f64> {
    gauss_legendre_nodes(order + 1)
}

/// Flux points for polynomial order `order`: N+2 points, endpoints included.
pub fn flux_nodes(order: usize) -> Vec<f64> {
    let mut nodes = Vec::with_capacity(order + 2);
    nodes.push(-1.0);
    nodes.extend(gauss_legendre_nodes(order));
    nodes.push(1.0);
    nodes
}

/// Check whether `x` is a root of P_n to the given tolerance.
pub fn is_legendre_root(n: usize, x: f64, tol: f64) -> bool {
    legendre(n, x).abs() < tol
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_counts() {
        for order in 0..=6 {
            assert_eq!(solution_nodes(order).len(), order + 1);
            assert_eq!(flux_nodes(order).len(), order + 2);
        }
    }

    #[test]
    fn test_gauss_legendre_roots() {
        for n in 1..=8 {
            for &x in &gauss_legendre_nodes(n) {
                assert!(is_legendre_root(n, x, 1e-13), "x = {} not a root of P_{}", x, n);
            }
        }
    }

    #[test]
    fn test_nodes_exactly_symmetric() {
        for n in 1..=8 {
            let nodes = gauss_legendre_nodes(n);
            for i in 0..n {
                assert_eq!(nodes[i], -nodes[n - 1 - i]);
            }
        }
    }

    #[test]
    fn test_nodes_ascending() {
        for order in 0..=6 {
            let nodes = flux_nodes(order);
            for w in nodes.windows(2) {
                assert!(w[0] < w[1]);
            }
        }
    }

    #[test]
    fn test_order_zero_layout() {
        assert_eq!(solution_nodes(0), vec![0.0]);
        assert_eq!(flux_nodes(0), vec![-1.0, 1.0]);
        assert_eq!(flux_nodes(1), vec![-1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_weights_integrate_polynomials() {
        // n-point Gauss quadrature is exact up to degree 2n-1
        for n in 1..=6 {
            let nodes = gauss_legendre_nodes(n);
            let weights = gauss_legendre_weights(&nodes);
            for degree in 0..2 * n {
                let quad: f64 = nodes
                    .iter()
                    .zip(&weights)
                    .map(|(&x, &w)| w * x.powi(degree as i32))
                    .sum();
                let exact = if degree % 2 == 0 {
                    2.0 / (degree as f64 + 1.0)
                } else {
                    0.0
                };
                assert!((quad - exact).abs() < 1e-13);
            }
        }
    }
}
