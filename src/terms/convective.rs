//! Convective (first-derivative) flux term.
//!
//! Interior flux points carry the analytical flux, face flux points a Riemann
//! flux between this element and whatever lies across the face. Fluxes are
//! stored contravariantly, `F̃ = |m| F·n̂`, with `m` the plane-Jacobian normal
//! of the flux point; face values are multiplied by the flux point's sign so
//! that the physics always sees the outward normal.

use super::face::{
    FaceFlux, check_ghost_states, partner_solution, point_data, resolve_face, unit_normal,
};
use super::scratch::ScratchPool;
use super::ElementTerm;
use crate::element::{ElementPoint, ElementView};
use crate::error::Result;
use crate::field::{ElementOutput, SolutionState};
use crate::mesh::SdMesh;
use crate::physics::{ConvectiveFlux, FluxResult};

/// Convective term engine for physics `P`.
pub struct ConvectiveTerm<P, const NEQS: usize, const NDIM: usize> {
    physics: P,
    scratch: ScratchPool<NEQS, NDIM>,
}

impl<P, const NEQS: usize, const NDIM: usize> ConvectiveTerm<P, NEQS, NDIM>
where
    P: ConvectiveFlux<NEQS, NDIM>,
{
    /// Create the engine.
    pub fn new(physics: P) -> Self {
        log::debug!("ConvectiveTerm with {} physics", physics.name());
        Self {
            physics,
            scratch: ScratchPool::new(),
        }
    }

    /// Physics strategy.
    pub fn physics(&self) -> &P {
        &self.physics
    }

    /// Visit every point of a face with its outward unit normal, area factor,
    /// sign and Riemann (or extrapolated) flux.
    fn for_each_face_point<'m, M>(
        &self,
        mesh: &'m M,
        state: &SolutionState<'_, NEQS, NDIM>,
        elem: &M::Element<'m>,
        face: usize,
        map: &mut Vec<usize>,
        mut visit: impl FnMut(usize, [f64; NDIM], [f64; NDIM], f64, FluxResult<NEQS>),
    ) -> Result<()>
    where
        M: SdMesh<NDIM>,
    {
        let partner = resolve_face(mesh, elem, face, map)?;
        let u = state.solution.element(elem.index());

        for (i, &fp) in elem.face_flux_point_indices(face).iter().enumerate() {
            let sign = elem.flux_point_sign(fp);
            let (n_hat, area) = unit_normal(elem, fp);
            let outward: [f64; NDIM] = std::array::from_fn(|d| sign * n_hat[d]);
            let coord = elem.point_coord(ElementPoint::Flux(fp));
            let left = point_data(&self.physics, elem.reconstruct_value(fp, u), coord, None);

            let result = match partner_solution(&partner, state, map, i)? {
                Some(other) => {
                    let right = point_data(&self.physics, other, coord, None);
                    self.physics.compute_numerical_flux(&left, &right, &outward)
                }
                None => self.physics.compute_analytical_flux(&left, &outward),
            };
            visit(fp, coord, outward, area, result);
        }
        Ok(())
    }

    /// Riemann fluxes through one face of one element, per unit area along
    /// the element's outward normal.
    pub fn face_fluxes<M>(
        &self,
        mesh: &M,
        state: &SolutionState<'_, NEQS, NDIM>,
        element: usize,
        face: usize,
    ) -> Result<Vec<FaceFlux<NEQS, NDIM>>>
    where
        M: SdMesh<NDIM>,
    {
        let elem = mesh.element(element);
        let mut map = Vec::new();
        let mut fluxes = Vec::with_capacity(elem.face_flux_point_indices(face).len());
        self.for_each_face_point(mesh, state, &elem, face, &mut map, |_, coord, normal, _, r| {
            fluxes.push(FaceFlux {
                coord,
                normal,
                flux: r.flux,
            })
        })?;
        Ok(fluxes)
    }
}

impl<M, P, const NEQS: usize, const NDIM: usize> ElementTerm<M, NEQS, NDIM>
    for ConvectiveTerm<P, NEQS, NDIM>
where
    M: SdMesh<NDIM>,
    P: ConvectiveFlux<NEQS, NDIM>,
{
    fn name(&self) -> &'static str {
        "convective"
    }

    fn validate(&self, mesh: &M, state: &SolutionState<'_, NEQS, NDIM>) -> Result<()> {
        state.check_mesh(mesh)?;
        check_ghost_states(mesh, state)
    }

    fn compute_element(
        &self,
        mesh: &M,
        state: &SolutionState<'_, NEQS, NDIM>,
        element: usize,
        out: &mut ElementOutput<'_, NEQS>,
    ) -> Result<()> {
        let elem = mesh.element(element);
        let n_sol = elem.nb_solution_points();
        out.check_len(n_sol)?;
        let u = state.solution.element(element);

        let mut guard = self.scratch.acquire();
        let scratch = &mut *guard;
        scratch.reset(elem.nb_flux_points());

        for &fp in elem.interior_flux_point_indices() {
            let (n_hat, area) = unit_normal(&elem, fp);
            let coord = elem.point_coord(ElementPoint::Flux(fp));
            let data = point_data(&self.physics, elem.reconstruct_value(fp, u), coord, None);
            let r = self.physics.compute_analytical_flux(&data, &n_hat);
            scratch.flux[fp] = r.flux.map(|f| area * f);
            scratch.wave_speed[fp] = area * r.wave_speed;
        }

        for face in 0..elem.nb_faces() {
            let flux = &mut scratch.flux;
            let wave_speed = &mut scratch.wave_speed;
            self.for_each_face_point(
                mesh,
                state,
                &elem,
                face,
                &mut scratch.face.map,
                |fp, _, _, area, r| {
                    let sign = elem.flux_point_sign(fp);
                    flux[fp] = r.flux.map(|f| sign * area * f);
                    wave_speed[fp] = area * r.wave_speed;
                },
            )?;
        }

        let divergence = elem.reconstruct_divergence(&scratch.flux);
        let directional = elem.reconstruct_directional(&scratch.wave_speed);

        for s in 0..n_sol {
            let det = elem.jacobian_determinant(ElementPoint::Solution(s));
            let contribution = divergence[s].map(|d| -d / det);
            for e in 0..NEQS {
                out.residual[s][e] += contribution[e];
            }
            if let Some(term) = out.term.as_deref_mut() {
                term[s] = contribution;
            }
            let speed = directional[s].iter().sum::<f64>() / NDIM as f64;
            out.merge_wave_speed(s, speed / det);
        }

        Ok(())
    }
}
