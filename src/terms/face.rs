//! Face resolution shared by the flux terms.

use crate::element::{ElementPoint, ElementView};
use crate::error::{Result, SdError};
use crate::face_matcher::{FaceMatchError, FaceMatcher};
use crate::field::SolutionState;
use crate::mesh::{BoundaryKind, FaceNeighbour, SdMesh};
use crate::physics::{PhysicsModel, PhysicsPointData};

/// Flux through one face point, seen from the element that owns the face.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceFlux<const NEQS: usize, const NDIM: usize> {
    /// Physical coordinates of the face point
    pub coord: [f64; NDIM],
    /// Unit normal pointing out of the owning element
    pub normal: [f64; NDIM],
    /// Flux per unit area along `normal`
    pub flux: [f64; NEQS],
}

/// What lies across a face.
pub(crate) enum FacePartner<E> {
    /// Neighbouring element and its local face.
    Element { view: E, face: usize },
    /// Ghost face with regular closure.
    Ghost { ghost: usize },
    /// Outer boundary closed by extrapolation.
    Extrapolated,
}

/// Resolve the partner of `face` and fill `map` with, for each of this
/// element's face flux points, the partner's face point ordinal.
///
/// Extrapolated faces leave `map` empty.
pub(crate) fn resolve_face<'m, M, const NDIM: usize>(
    mesh: &'m M,
    elem: &M::Element<'m>,
    face: usize,
    map: &mut Vec<usize>,
) -> Result<FacePartner<M::Element<'m>>>
where
    M: SdMesh<NDIM>,
{
    map.clear();
    let own = face_coords(elem, face);

    match mesh.face_neighbour(elem.index(), face) {
        FaceNeighbour::Interior { element, face: other_face } => {
            let view = mesh.element(element);
            let other = face_coords(&view, other_face);
            let matched = FaceMatcher::match_points(&own, &other)
                .map_err(|e| match_error(elem.index(), face, e))?;
            map.extend(matched);
            log::trace!(
                "element {} face {} -> element {} face {}",
                elem.index(),
                face,
                element,
                other_face
            );
            Ok(FacePartner::Element {
                view,
                face: other_face,
            })
        }
        FaceNeighbour::Boundary {
            kind: BoundaryKind::Extrapolated,
            ..
        } => {
            log::trace!("element {} face {} extrapolated", elem.index(), face);
            Ok(FacePartner::Extrapolated)
        }
        FaceNeighbour::Boundary {
            ghost,
            kind: BoundaryKind::Regular,
        } => {
            let matched = FaceMatcher::match_points(&own, mesh.ghost_face_coords(ghost))
                .map_err(|e| match_error(elem.index(), face, e))?;
            map.extend(matched);
            log::trace!("element {} face {} -> ghost {}", elem.index(), face, ghost);
            Ok(FacePartner::Ghost { ghost })
        }
    }
}

/// Solution of the partner at this element's `i`-th face point.
pub(crate) fn partner_solution<E, const NEQS: usize, const NDIM: usize>(
    partner: &FacePartner<E>,
    state: &SolutionState<'_, NEQS, NDIM>,
    map: &[usize],
    i: usize,
) -> Result<Option<[f64; NEQS]>>
where
    E: ElementView<NDIM>,
{
    match partner {
        FacePartner::Element { view, face } => {
            let fq = view.face_flux_point_indices(*face)[map[i]];
            Ok(Some(
                view.reconstruct_value(fq, state.solution.element(view.index())),
            ))
        }
        FacePartner::Ghost { ghost } => Ok(Some(state.ghost(*ghost)?[map[i]])),
        FacePartner::Extrapolated => Ok(None),
    }
}

/// Coordinates of the flux points of a face, in face order.
pub(crate) fn face_coords<E, const NDIM: usize>(elem: &E, face: usize) -> Vec<[f64; NDIM]>
where
    E: ElementView<NDIM>,
{
    elem.face_flux_point_indices(face)
        .iter()
        .map(|&fp| elem.point_coord(ElementPoint::Flux(fp)))
        .collect()
}

/// Unit normal and area factor of a flux point.
#[inline]
pub(crate) fn unit_normal<E, const NDIM: usize>(elem: &E, fp: usize) -> ([f64; NDIM], f64)
where
    E: ElementView<NDIM>,
{
    let m = elem.plane_jacobian_normal(fp);
    let area = crate::element::geometry::norm(&m);
    (std::array::from_fn(|i| m[i] / area), area)
}

/// Build the point data a physics strategy sees.
#[inline]
pub(crate) fn point_data<P, const NEQS: usize, const NDIM: usize>(
    physics: &P,
    solution: [f64; NEQS],
    coord: [f64; NDIM],
    gradient: Option<[[f64; NEQS]; NDIM]>,
) -> PhysicsPointData<NEQS, NDIM, <P as PhysicsModel<NEQS, NDIM>>::Extra>
where
    P: PhysicsModel<NEQS, NDIM>,
{
    PhysicsPointData {
        solution,
        coord,
        solution_gradient: gradient,
        extra: physics.extra_data(&coord),
    }
}

/// Fail if a regular boundary is present but no ghost states were given.
pub(crate) fn check_ghost_states<M, const NEQS: usize, const NDIM: usize>(
    mesh: &M,
    state: &SolutionState<'_, NEQS, NDIM>,
) -> Result<()>
where
    M: SdMesh<NDIM>,
{
    if state.ghosts.is_some() {
        return Ok(());
    }
    let needs_ghosts = (0..mesh.n_ghost_faces()).any(|g| {
        let (k, face) = mesh.ghost_owner(g);
        matches!(
            mesh.face_neighbour(k, face),
            FaceNeighbour::Boundary {
                kind: BoundaryKind::Regular,
                ..
            }
        )
    });
    if needs_ghosts {
        log::error!("regular boundary faces present but no ghost states supplied");
        Err(SdError::configuration(
            "regular boundary faces need ghost states",
        ))
    } else {
        Ok(())
    }
}

fn match_error(element: usize, face: usize, err: FaceMatchError) -> SdError {
    log::error!("element {} face {}: {}", element, face, err);
    match err {
        FaceMatchError::CountMismatch { left, right } => {
            SdError::dimension_mismatch("face points", left, right)
        }
        FaceMatchError::Unmatched { point, coord } => SdError::Connectivity {
            element,
            face,
            point,
            coord,
        },
    }
}
