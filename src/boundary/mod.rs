//! Ghost states for regular boundary faces.
//!
//! A regular boundary face enters the numerical flux like a neighbouring
//! element whose state lives on a ghost face. A [`BoundaryCondition`] turns
//! the interior state at each ghost point into the ghost state;
//! [`fill_ghost_states`] runs it over every ghost face of a mesh.

use crate::element::{ElementPoint, ElementView};
use crate::error::{Result, SdError};
use crate::face_matcher::FaceMatcher;
use crate::field::SolutionField;
use crate::mesh::SdMesh;

/// Everything a boundary condition sees at one ghost point.
#[derive(Clone, Copy, Debug)]
pub struct GhostContext<const NEQS: usize, const NDIM: usize> {
    /// Physical position of the ghost point
    pub position: [f64; NDIM],
    /// Interior state reconstructed at the matching flux point
    pub interior: [f64; NEQS],
    /// Outward unit normal of the owning element
    pub normal: [f64; NDIM],
    /// Ghost face index
    pub ghost: usize,
}

/// Ghost-state rule of a boundary.
pub trait BoundaryCondition<const NEQS: usize, const NDIM: usize>: Send + Sync {
    /// Ghost state at one point.
    fn ghost_state(&self, ctx: &GhostContext<NEQS, NDIM>) -> [f64; NEQS];

    /// Name for logging.
    fn name(&self) -> &'static str;
}

/// Ghost state equal to the interior state.
#[derive(Clone, Copy, Debug, Default)]
pub struct Extrapolation;

impl<const NEQS: usize, const NDIM: usize> BoundaryCondition<NEQS, NDIM> for Extrapolation {
    fn ghost_state(&self, ctx: &GhostContext<NEQS, NDIM>) -> [f64; NEQS] {
        ctx.interior
    }

    fn name(&self) -> &'static str {
        "extrapolation"
    }
}

/// Fixed ghost state.
#[derive(Clone, Copy, Debug)]
pub struct FixedState<const NEQS: usize> {
    /// Ghost state
    pub state: [f64; NEQS],
}

impl<const NEQS: usize> FixedState<NEQS> {
    /// Create a fixed-state boundary.
    pub fn new(state: [f64; NEQS]) -> Self {
        Self { state }
    }
}

impl<const NEQS: usize, const NDIM: usize> BoundaryCondition<NEQS, NDIM> for FixedState<NEQS> {
    fn ghost_state(&self, _ctx: &GhostContext<NEQS, NDIM>) -> [f64; NEQS] {
        self.state
    }

    fn name(&self) -> &'static str {
        "fixed state"
    }
}

/// Ghost state from a function of position.
#[derive(Clone, Copy)]
pub struct FunctionState<F> {
    f: F,
}

impl<F> FunctionState<F> {
    /// Create a boundary from `f(position)`.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F, const NEQS: usize, const NDIM: usize> BoundaryCondition<NEQS, NDIM> for FunctionState<F>
where
    F: Fn(&[f64; NDIM]) -> [f64; NEQS] + Send + Sync,
{
    fn ghost_state(&self, ctx: &GhostContext<NEQS, NDIM>) -> [f64; NEQS] {
        (self.f)(&ctx.position)
    }

    fn name(&self) -> &'static str {
        "function state"
    }
}

/// Zero ghost-state field sized for `mesh`.
pub fn ghost_field<M, const NEQS: usize, const NDIM: usize>(mesh: &M) -> SolutionField<NEQS>
where
    M: SdMesh<NDIM>,
{
    SolutionField::zeros(mesh.n_ghost_faces(), mesh.nb_ghost_points())
}

/// Evaluate `bc` at every ghost point of `mesh`.
pub fn fill_ghost_states<M, B, const NEQS: usize, const NDIM: usize>(
    mesh: &M,
    solution: &SolutionField<NEQS>,
    bc: &B,
    ghosts: &mut SolutionField<NEQS>,
) -> Result<()>
where
    M: SdMesh<NDIM>,
    B: BoundaryCondition<NEQS, NDIM> + ?Sized,
{
    solution.check_shape("solution", mesh.n_elements(), mesh.nb_solution_points())?;
    ghosts.check_shape("ghost states", mesh.n_ghost_faces(), mesh.nb_ghost_points())?;

    for ghost in 0..mesh.n_ghost_faces() {
        let (k, face) = mesh.ghost_owner(ghost);
        let elem = mesh.element(k);
        let fps = elem.face_flux_point_indices(face);
        let owner: Vec<[f64; NDIM]> = fps
            .iter()
            .map(|&fp| elem.point_coord(ElementPoint::Flux(fp)))
            .collect();
        let coords = mesh.ghost_face_coords(ghost);
        let map = FaceMatcher::match_points(coords, &owner).map_err(|e| {
            log::error!("ghost face {} of element {}: {}", ghost, k, e);
            SdError::configuration(format!("ghost face {} does not match its owner: {}", ghost, e))
        })?;

        let u = solution.element(k);
        let out = ghosts.element_mut(ghost);
        for (i, position) in coords.iter().enumerate() {
            let fp = fps[map[i]];
            let sign = elem.flux_point_sign(fp);
            let m = elem.plane_jacobian_normal(fp);
            let area = crate::element::geometry::norm(&m);
            let ctx = GhostContext {
                position: *position,
                interior: elem.reconstruct_value(fp, u),
                normal: std::array::from_fn(|d| sign * m[d] / area),
                ghost,
            };
            out[i] = bc.ghost_state(&ctx);
        }
    }

    log::debug!(
        "filled {} ghost faces with {} boundary",
        mesh.n_ghost_faces(),
        bc.name()
    );
    Ok(())
}
