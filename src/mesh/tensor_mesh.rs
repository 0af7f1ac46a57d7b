//! Unstructured mesh of multilinear line, quadrilateral or hexahedral cells.
//!
//! Cells list their 2^NDIM vertices in lexicographic reference order: bit `e`
//! of the local vertex number selects `ξ_e = -1` (0) or `ξ_e = +1` (1).
//! Two cells are neighbours across a face when the face vertex sets agree.
//! Faces without a partner become ghost faces, whose points are stored in the
//! reverse order of the owner's face flux points.

use std::collections::HashMap;

use super::{BoundaryKind, FaceNeighbour, SdMesh};
use crate::element::{ElementPoint, ElementView, SdReference, TensorElement};
use crate::error::{Result, SdError};

#[derive(Clone, Debug)]
struct GhostFace<const NDIM: usize> {
    element: usize,
    face: usize,
    kind: BoundaryKind,
    coords: Vec<[f64; NDIM]>,
}

/// Tensor-product SD mesh.
#[derive(Clone)]
pub struct TensorMesh<const NDIM: usize> {
    reference: SdReference<NDIM>,
    vertices: Vec<[f64; NDIM]>,
    cells: Vec<Vec<usize>>,
    /// Vertex coordinates per cell, `2^NDIM` entries per cell
    cell_vertices: Vec<[f64; NDIM]>,
    neighbours: Vec<Vec<FaceNeighbour>>,
    ghosts: Vec<GhostFace<NDIM>>,
}

impl TensorMesh<1> {
    /// Uniform mesh of `[x0, x1]` with `n` cells.
    pub fn uniform_line(x0: f64, x1: f64, n: usize, order: usize) -> Result<Self> {
        Self::uniform([x0], [x1], [n], order)
    }
}

impl TensorMesh<2> {
    /// Uniform mesh of `[x0, x1] × [y0, y1]` with `nx × ny` cells.
    pub fn uniform_rectangle(
        x0: f64,
        x1: f64,
        y0: f64,
        y1: f64,
        nx: usize,
        ny: usize,
        order: usize,
    ) -> Result<Self> {
        Self::uniform([x0, y0], [x1, y1], [nx, ny], order)
    }
}

impl TensorMesh<3> {
    /// Uniform mesh of an axis-aligned box.
    pub fn uniform_box(lower: [f64; 3], upper: [f64; 3], counts: [usize; 3], order: usize) -> Result<Self> {
        Self::uniform(lower, upper, counts, order)
    }
}

impl<const NDIM: usize> TensorMesh<NDIM> {
    /// Uniform mesh of an axis-aligned box in any supported dimension.
    pub fn uniform(
        lower: [f64; NDIM],
        upper: [f64; NDIM],
        counts: [usize; NDIM],
        order: usize,
    ) -> Result<Self> {
        if counts.iter().any(|&n| n == 0) {
            return Err(SdError::configuration(
                "need at least one cell in each direction",
            ));
        }
        if (0..NDIM).any(|e| !(upper[e] > lower[e])) {
            return Err(SdError::configuration("invalid domain bounds"));
        }

        let n_vertices: usize = counts.iter().map(|n| n + 1).product();
        let vertex_index = |idx: &[usize; NDIM]| -> usize {
            let mut id = 0;
            let mut stride = 1;
            for e in 0..NDIM {
                id += idx[e] * stride;
                stride *= counts[e] + 1;
            }
            id
        };

        let mut vertices = Vec::with_capacity(n_vertices);
        for v in 0..n_vertices {
            let mut rem = v;
            let x: [f64; NDIM] = std::array::from_fn(|e| {
                let i = rem % (counts[e] + 1);
                rem /= counts[e] + 1;
                lower[e] + (upper[e] - lower[e]) * i as f64 / counts[e] as f64
            });
            vertices.push(x);
        }

        let n_cells: usize = counts.iter().product();
        let mut cells = Vec::with_capacity(n_cells);
        for c in 0..n_cells {
            let mut rem = c;
            let cell: [usize; NDIM] = std::array::from_fn(|e| {
                let i = rem % counts[e];
                rem /= counts[e];
                i
            });
            let local: Vec<usize> = (0..1usize << NDIM)
                .map(|v| {
                    let idx: [usize; NDIM] = std::array::from_fn(|e| cell[e] + ((v >> e) & 1));
                    vertex_index(&idx)
                })
                .collect();
            cells.push(local);
        }

        Self::from_cells(vertices, cells, order)
    }

    /// Build a mesh from vertex coordinates and cell-vertex lists.
    pub fn from_cells(vertices: Vec<[f64; NDIM]>, cells: Vec<Vec<usize>>, order: usize) -> Result<Self> {
        let reference = SdReference::new(order)?;
        let n_local = 1usize << NDIM;

        for (k, cell) in cells.iter().enumerate() {
            if cell.len() != n_local {
                return Err(SdError::configuration(format!(
                    "cell {} has {} vertices, expected {}",
                    k,
                    cell.len(),
                    n_local
                )));
            }
            if let Some(&v) = cell.iter().find(|&&v| v >= vertices.len()) {
                return Err(SdError::configuration(format!(
                    "cell {} references vertex {} of {}",
                    k,
                    v,
                    vertices.len()
                )));
            }
        }

        let cell_vertices = cells
            .iter()
            .flat_map(|cell| cell.iter().map(|&v| vertices[v]))
            .collect();

        // Faces keyed by their sorted vertex set
        let mut open: HashMap<Vec<usize>, (usize, usize)> = HashMap::new();
        let mut neighbours = vec![Vec::new(); cells.len()];
        let mut pairs = Vec::new();
        for (k, cell) in cells.iter().enumerate() {
            neighbours[k] = vec![
                FaceNeighbour::Boundary {
                    ghost: usize::MAX,
                    kind: BoundaryKind::Regular,
                };
                2 * NDIM
            ];
            for face in 0..2 * NDIM {
                let key = face_key::<NDIM>(cell, face);
                match open.remove(&key) {
                    Some(other) => pairs.push(((k, face), other)),
                    None => {
                        open.insert(key, (k, face));
                    }
                }
            }
        }

        for ((k, f), (j, g)) in pairs {
            neighbours[k][f] = FaceNeighbour::Interior { element: j, face: g };
            neighbours[j][g] = FaceNeighbour::Interior { element: k, face: f };
        }

        let mut boundary: Vec<(usize, usize)> = open.into_values().collect();
        boundary.sort_unstable();
        let mut ghosts = Vec::with_capacity(boundary.len());
        for (ghost, (k, face)) in boundary.into_iter().enumerate() {
            neighbours[k][face] = FaceNeighbour::Boundary {
                ghost,
                kind: BoundaryKind::Regular,
            };
            ghosts.push(GhostFace {
                element: k,
                face,
                kind: BoundaryKind::Regular,
                coords: Vec::new(),
            });
        }

        let mut mesh = Self {
            reference,
            vertices,
            cells,
            cell_vertices,
            neighbours,
            ghosts,
        };
        mesh.update_geometry();

        log::debug!(
            "TensorMesh<{}>: {} cells, {} vertices, {} ghost faces, order {}",
            NDIM,
            mesh.cells.len(),
            mesh.vertices.len(),
            mesh.ghosts.len(),
            order
        );
        Ok(mesh)
    }

    /// Set the closure of every boundary face.
    pub fn with_boundary_kind(mut self, kind: BoundaryKind) -> Self {
        for ghost in 0..self.ghosts.len() {
            self.set_ghost_kind(ghost, kind);
        }
        self
    }

    /// Set the closure of boundary faces that are local face `face` of their
    /// owner (e.g. face 1 is the `ξ_0 = +1` side).
    pub fn with_boundary_kind_on(mut self, face: usize, kind: BoundaryKind) -> Self {
        for ghost in 0..self.ghosts.len() {
            if self.ghosts[ghost].face == face {
                self.set_ghost_kind(ghost, kind);
            }
        }
        self
    }

    /// Move every vertex through `f`, keeping the connectivity.
    pub fn map_vertices(mut self, f: impl Fn([f64; NDIM]) -> [f64; NDIM]) -> Self {
        for x in self.vertices.iter_mut() {
            *x = f(*x);
        }
        let vertices = &self.vertices;
        self.cell_vertices = self
            .cells
            .iter()
            .flat_map(|cell| cell.iter().map(|&v| vertices[v]))
            .collect();
        self.update_geometry();
        self
    }

    fn set_ghost_kind(&mut self, ghost: usize, kind: BoundaryKind) {
        let g = &mut self.ghosts[ghost];
        g.kind = kind;
        self.neighbours[g.element][g.face] = FaceNeighbour::Boundary { ghost, kind };
    }

    fn update_geometry(&mut self) {
        for ghost in 0..self.ghosts.len() {
            let (k, face) = (self.ghosts[ghost].element, self.ghosts[ghost].face);
            let elem = self.element(k);
            let coords: Vec<[f64; NDIM]> = elem
                .face_flux_point_indices(face)
                .iter()
                .rev()
                .map(|&fp| elem.point_coord(ElementPoint::Flux(fp)))
                .collect();
            self.ghosts[ghost].coords = coords;
        }

        for k in 0..self.cells.len() {
            let elem = self.element(k);
            let inverted = (0..elem.nb_solution_points())
                .any(|s| elem.jacobian_determinant(ElementPoint::Solution(s)) <= 0.0);
            if inverted {
                log::warn!("cell {} has a non-positive Jacobian determinant", k);
            }
        }
    }

    /// Reference element shared by all cells.
    pub fn reference(&self) -> &SdReference<NDIM> {
        &self.reference
    }

    /// Polynomial order.
    pub fn order(&self) -> usize {
        self.reference.order()
    }

    /// Vertex coordinates.
    pub fn vertices(&self) -> &[[f64; NDIM]] {
        &self.vertices
    }

    /// Cell-vertex lists.
    pub fn cells(&self) -> &[Vec<usize>] {
        &self.cells
    }

    /// Boundary closure of a ghost face.
    pub fn ghost_kind(&self, ghost: usize) -> BoundaryKind {
        self.ghosts[ghost].kind
    }
}

/// Sorted global vertex ids of a local face.
fn face_key<const NDIM: usize>(cell: &[usize], face: usize) -> Vec<usize> {
    let (d, side) = (face / 2, face % 2);
    let mut key: Vec<usize> = (0..cell.len())
        .filter(|v| (v >> d) & 1 == side)
        .map(|v| cell[v])
        .collect();
    key.sort_unstable();
    key
}

impl<const NDIM: usize> SdMesh<NDIM> for TensorMesh<NDIM> {
    type Element<'a> = TensorElement<'a, NDIM>;

    fn n_elements(&self) -> usize {
        self.cells.len()
    }

    fn element(&self, k: usize) -> TensorElement<'_, NDIM> {
        let n_local = 1 << NDIM;
        TensorElement::new(
            &self.reference,
            &self.cell_vertices[k * n_local..(k + 1) * n_local],
            k,
        )
    }

    fn nb_solution_points(&self) -> usize {
        self.reference.n_solution_points()
    }

    fn face_neighbour(&self, element: usize, face: usize) -> FaceNeighbour {
        self.neighbours[element][face]
    }

    fn n_ghost_faces(&self) -> usize {
        self.ghosts.len()
    }

    fn ghost_face_coords(&self, ghost: usize) -> &[[f64; NDIM]] {
        &self.ghosts[ghost].coords
    }

    fn ghost_owner(&self, ghost: usize) -> (usize, usize) {
        (self.ghosts[ghost].element, self.ghosts[ghost].face)
    }
}
