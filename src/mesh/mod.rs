//! Face and neighbour resolution.
//!
//! The term engines need three things from a mesh: an [`ElementView`] per
//! element, the neighbour across each local face, and the point coordinates
//! of boundary pseudo-elements ("ghost faces"). [`SdMesh`] is that contract;
//! [`TensorMesh`] is the reference implementation.

mod tensor_mesh;

pub use tensor_mesh::TensorMesh;

use crate::element::ElementView;

/// How a boundary face is closed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BoundaryKind {
    /// Outer boundary: the convective flux is taken from the interior state
    /// only.
    Extrapolated,
    /// Regular boundary: the ghost state enters a numerical flux like a
    /// neighbouring element.
    #[default]
    Regular,
}

/// Result of querying the neighbour across a local face.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaceNeighbour {
    /// Face shared with another element.
    Interior {
        /// Neighbour element index
        element: usize,
        /// Local face index on the neighbour
        face: usize,
    },
    /// Face on the domain boundary.
    Boundary {
        /// Ghost face index
        ghost: usize,
        /// Boundary closure
        kind: BoundaryKind,
    },
}

impl FaceNeighbour {
    /// Returns `true` if this is an interior face.
    #[inline]
    pub fn is_interior(&self) -> bool {
        matches!(self, FaceNeighbour::Interior { .. })
    }

    /// Returns `true` if this is a boundary face.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        matches!(self, FaceNeighbour::Boundary { .. })
    }

    /// Ghost face index, if on the boundary.
    #[inline]
    pub fn ghost(&self) -> Option<usize> {
        match self {
            FaceNeighbour::Boundary { ghost, .. } => Some(*ghost),
            FaceNeighbour::Interior { .. } => None,
        }
    }
}

/// Mesh as seen by the term engines.
///
/// Every element carries the same number of solution points and every ghost
/// face the same number of points, so that persistent fields can be stored
/// contiguously.
pub trait SdMesh<const NDIM: usize>: Send + Sync {
    /// Element view type.
    type Element<'a>: ElementView<NDIM>
    where
        Self: 'a;

    /// Number of elements.
    fn n_elements(&self) -> usize;

    /// View of element `k`.
    fn element(&self, k: usize) -> Self::Element<'_>;

    /// Solution points per element.
    fn nb_solution_points(&self) -> usize;

    /// Neighbour across local face `face` of element `element`.
    fn face_neighbour(&self, element: usize, face: usize) -> FaceNeighbour;

    /// Number of ghost faces.
    fn n_ghost_faces(&self) -> usize;

    /// Points of a ghost face, in the ghost's own numbering.
    fn ghost_face_coords(&self, ghost: usize) -> &[[f64; NDIM]];

    /// Element and local face a ghost face closes.
    fn ghost_owner(&self, ghost: usize) -> (usize, usize);

    /// Points per ghost face.
    fn nb_ghost_points(&self) -> usize {
        if self.n_ghost_faces() == 0 {
            0
        } else {
            self.ghost_face_coords(0).len()
        }
    }
}
