//! Geometric mapping of multilinear cells.
//!
//! A cell with 2^NDIM vertices is mapped from the reference box [-1, 1]^NDIM:
//!
//! x(ξ) = Σ_v N_v(ξ) x_v,   N_v(ξ) = Π_e (1 + s_{v,e} ξ_e) / 2
//!
//! where s_{v,e} = ±1 is bit `e` of the vertex number (0 → -1, 1 → +1).
//! Lines, bilinear quadrilaterals and trilinear hexahedra are covered; only
//! parallelepipeds have a constant Jacobian.
//!
//! The geometric Jacobian is stored row-per-reference-direction:
//! `G[d][i] = ∂x_i/∂ξ_d`, so that `∇_ξ u = G ∇_x u`.

use faer::{Mat, linalg::solvers::Solve};

/// Vertex sign along reference direction `e`.
#[inline]
fn vertex_sign(vertex: usize, e: usize) -> f64 {
    if (vertex >> e) & 1 == 1 { 1.0 } else { -1.0 }
}

/// Map a reference point to physical space.
pub fn multilinear_map<const NDIM: usize>(vertices: &[[f64; NDIM]], xi: &[f64; NDIM]) -> [f64; NDIM] {
    let mut x = [0.0; NDIM];
    for (v, coords) in vertices.iter().enumerate() {
        let weight: f64 = (0..NDIM)
            .map(|e| 0.5 * (1.0 + vertex_sign(v, e) * xi[e]))
            .product();
        for i in 0..NDIM {
            x[i] += weight * coords[i];
        }
    }
    x
}

/// Geometric Jacobian `G[d][i] = ∂x_i/∂ξ_d` at a reference point.
pub fn multilinear_jacobian<const NDIM: usize>(
    vertices: &[[f64; NDIM]],
    xi: &[f64; NDIM],
) -> [[f64; NDIM]; NDIM] {
    let mut g = [[0.0; NDIM]; NDIM];
    for (v, coords) in vertices.iter().enumerate() {
        for d in 0..NDIM {
            let mut dn = 0.5 * vertex_sign(v, d);
            for e in (0..NDIM).filter(|&e| e != d) {
                dn *= 0.5 * (1.0 + vertex_sign(v, e) * xi[e]);
            }
            for i in 0..NDIM {
                g[d][i] += dn * coords[i];
            }
        }
    }
    g
}

/// Determinant of a small square matrix (cofactor expansion).
pub fn determinant<const NDIM: usize>(g: &[[f64; NDIM]; NDIM]) -> f64 {
    let at = |i: usize, j: usize| g[i][j];
    match NDIM {
        0 => 1.0,
        1 => at(0, 0),
        2 => at(0, 0) * at(1, 1) - at(0, 1) * at(1, 0),
        3 => {
            at(0, 0) * (at(1, 1) * at(2, 2) - at(1, 2) * at(2, 1))
                - at(0, 1) * (at(1, 0) * at(2, 2) - at(1, 2) * at(2, 0))
                + at(0, 2) * (at(1, 0) * at(2, 1) - at(1, 1) * at(2, 0))
        }
        _ => {
            let rows: Vec<Vec<f64>> = g.iter().map(|r| r.to_vec()).collect();
            laplace_determinant(&rows)
        }
    }
}

fn laplace_determinant(m: &[Vec<f64>]) -> f64 {
    let n = m.len();
    if n == 1 {
        return m[0][0];
    }
    let mut det = 0.0;
    for col in 0..n {
        let minor: Vec<Vec<f64>> = m[1..]
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|&(c, _)| c != col)
                    .map(|(_, &v)| v)
                    .collect()
            })
            .collect();
        let sign = if col % 2 == 0 { 1.0 } else { -1.0 };
        det += sign * m[0][col] * laplace_determinant(&minor);
    }
    det
}

/// Solve `G X = B` for several right-hand sides.
///
/// Maps reference-space gradients to physical space: with `B[d][e] = ∂u_e/∂ξ_d`
/// the result is `X[i][e] = ∂u_e/∂x_i`.
pub fn solve_jacobian<const NDIM: usize, const N: usize>(
    g: &[[f64; NDIM]; NDIM],
    rhs: &[[f64; N]; NDIM],
) -> [[f64; N]; NDIM] {
    let jac = Mat::from_fn(NDIM, NDIM, |d, i| g[d][i]);
    let b = Mat::from_fn(NDIM, N, |d, e| rhs[d][e]);

    let lu = jac.as_ref().full_piv_lu();
    let x = lu.solve(&b);

    std::array::from_fn(|i| std::array::from_fn(|e| x[(i, e)]))
}

/// Plane-Jacobian normal `m_d = det(G) ∇_x ξ_d` for reference direction `d`.
///
/// Its magnitude is the area scaling of a constant-ξ_d surface and its
/// direction is the unit normal of that surface, pointing towards +ξ_d.
pub fn plane_jacobian_normal<const NDIM: usize>(g: &[[f64; NDIM]; NDIM], d: usize) -> [f64; NDIM] {
    // ∇_x ξ_d is column d of G⁻¹
    let mut unit = [[0.0; 1]; NDIM];
    unit[d][0] = 1.0;
    let column = solve_jacobian(g, &unit);
    let det = determinant(g);
    std::array::from_fn(|i| det * column[i][0])
}

/// Euclidean norm.
#[inline]
pub fn norm<const NDIM: usize>(v: &[f64; NDIM]) -> f64 {
    v.iter().map(|c| c * c).sum::<f64>().sqrt()
}
