//! Diffusive (second-derivative) flux term with a lifting correction.
//!
//! Gradients are evaluated directly at flux points. Along the flux point's
//! own direction the solution is differentiated on the flux-point line, whose
//! face values are replaced by the average with the neighbour; the other
//! components come from the solution polynomial. The result is mapped to
//! physical space with `∇ₓu = G⁻¹ ∇_ξ u`. On a face both sides' solution and
//! gradient are averaged, and a lifted gradient built from the jump
//! `u_other - u_this` is added with weight `lifting_coefficient`.
//!
//! The flux is added to the residual and the wave speed uses the squared
//! Jacobian determinant.

use super::face::{
    FaceFlux, FacePartner, check_ghost_states, partner_solution, point_data, resolve_face,
    unit_normal,
};
use super::scratch::{FaceScratch, ScratchPool};
use super::ElementTerm;
use crate::element::geometry::solve_jacobian;
use crate::element::{ElementPoint, ElementView};
use crate::error::{Result, SdError};
use crate::field::{ElementOutput, SolutionState};
use crate::mesh::SdMesh;
use crate::physics::{DiffusiveFlux, FluxResult};

/// Options of the diffusive term.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiffusiveTermConfig {
    /// Weight of the lifted face gradient (`alpha`)
    pub lifting_coefficient: f64,
}

impl Default for DiffusiveTermConfig {
    fn default() -> Self {
        Self {
            lifting_coefficient: 0.0,
        }
    }
}

impl DiffusiveTermConfig {
    /// Default options: no lifting.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the lifting coefficient.
    pub fn with_lifting_coefficient(mut self, alpha: f64) -> Self {
        self.lifting_coefficient = alpha;
        self
    }

    /// Fail unless the lifting coefficient is finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        let alpha = self.lifting_coefficient;
        if !alpha.is_finite() || alpha < 0.0 {
            return Err(SdError::configuration(format!(
                "lifting coefficient must be finite and non-negative, got {}",
                alpha
            )));
        }
        Ok(())
    }
}

/// Physical gradient of solution-point values at any element point.
pub fn physical_gradient<E, const NEQS: usize, const NDIM: usize>(
    elem: &E,
    point: ElementPoint,
    nodal: &[[f64; NEQS]],
) -> [[f64; NEQS]; NDIM]
where
    E: ElementView<NDIM>,
{
    let op = elem.local_gradient_operator(point);
    let mut local = [[0.0; NEQS]; NDIM];
    for (g, u) in op.iter().zip(nodal) {
        for d in 0..NDIM {
            for e in 0..NEQS {
                local[d][e] += g[d] * u[e];
            }
        }
    }
    solve_jacobian(&elem.geometric_jacobian(point), &local)
}

/// Physical gradient at flux point `fp` from solution-point values and the
/// face-averaged flux-point field `averaged`.
///
/// The component along the flux point's direction differentiates `averaged`
/// on its flux-point line, so face averages reach the gradient even at
/// order 0. The transverse components differentiate the solution polynomial.
pub fn flux_point_gradient<E, const NEQS: usize, const NDIM: usize>(
    elem: &E,
    fp: usize,
    nodal: &[[f64; NEQS]],
    averaged: &[[f64; NEQS]],
) -> [[f64; NEQS]; NDIM]
where
    E: ElementView<NDIM>,
{
    let d = elem.flux_point_direction(fp);
    let mut local = [[0.0; NEQS]; NDIM];
    local[d] = elem.flux_field_local_gradient(fp, averaged)[d];

    let op = elem.local_gradient_operator(ElementPoint::Flux(fp));
    for (g, u) in op.iter().zip(nodal) {
        for t in (0..NDIM).filter(|&t| t != d) {
            for e in 0..NEQS {
                local[t][e] += g[t] * u[e];
            }
        }
    }
    solve_jacobian(&elem.geometric_jacobian(ElementPoint::Flux(fp)), &local)
}

/// Solution at every flux point of `elem`, with each face point replaced by
/// the average of both sides. Extrapolated faces keep this side's value.
fn averaged_flux_field<'m, M, const NEQS: usize, const NDIM: usize>(
    mesh: &'m M,
    state: &SolutionState<'_, NEQS, NDIM>,
    elem: &M::Element<'m>,
    map: &mut Vec<usize>,
    field: &mut Vec<[f64; NEQS]>,
) -> Result<()>
where
    M: SdMesh<NDIM>,
{
    let u = state.solution.element(elem.index());
    field.clear();
    field.extend((0..elem.nb_flux_points()).map(|fp| elem.reconstruct_value(fp, u)));

    for face in 0..elem.nb_faces() {
        let partner = resolve_face(mesh, elem, face, map)?;
        for (i, &fp) in elem.face_flux_point_indices(face).iter().enumerate() {
            if let Some(other) = partner_solution(&partner, state, map, i)? {
                let this = field[fp];
                field[fp] = std::array::from_fn(|e| 0.5 * (this[e] + other[e]));
            }
        }
    }
    Ok(())
}

/// Physical gradient at flux point `fp` of a jump field living on flux
/// points.
pub fn lifted_gradient<E, const NEQS: usize, const NDIM: usize>(
    elem: &E,
    fp: usize,
    jump: &[[f64; NEQS]],
) -> [[f64; NEQS]; NDIM]
where
    E: ElementView<NDIM>,
{
    let local = elem.flux_field_local_gradient(fp, jump);
    solve_jacobian(&elem.geometric_jacobian(ElementPoint::Flux(fp)), &local)
}

/// Diffusive term engine for physics `P`.
pub struct DiffusiveTerm<P, const NEQS: usize, const NDIM: usize> {
    physics: P,
    config: DiffusiveTermConfig,
    scratch: ScratchPool<NEQS, NDIM>,
}

impl<P, const NEQS: usize, const NDIM: usize> DiffusiveTerm<P, NEQS, NDIM>
where
    P: DiffusiveFlux<NEQS, NDIM>,
{
    /// Create the engine with default options.
    pub fn new(physics: P) -> Self {
        log::debug!("DiffusiveTerm with {} physics", physics.name());
        Self {
            physics,
            config: DiffusiveTermConfig::default(),
            scratch: ScratchPool::new(),
        }
    }

    /// Create the engine with explicit options.
    pub fn with_config(physics: P, config: DiffusiveTermConfig) -> Result<Self> {
        config.validate()?;
        log::debug!(
            "DiffusiveTerm with {} physics, lifting coefficient {}",
            physics.name(),
            config.lifting_coefficient
        );
        Ok(Self {
            physics,
            config,
            scratch: ScratchPool::new(),
        })
    }

    /// Physics strategy.
    pub fn physics(&self) -> &P {
        &self.physics
    }

    /// Options.
    pub fn config(&self) -> &DiffusiveTermConfig {
        &self.config
    }

    /// Visit every point of a face with its coordinate, outward unit normal,
    /// area factor and diffusive flux of the averaged face data.
    fn for_each_face_point<'m, M>(
        &self,
        mesh: &'m M,
        state: &SolutionState<'_, NEQS, NDIM>,
        elem: &M::Element<'m>,
        averaged: &[[f64; NEQS]],
        face: usize,
        buffers: &mut FaceScratch<NEQS, NDIM>,
        mut visit: impl FnMut(usize, [f64; NDIM], [f64; NDIM], f64, FluxResult<NEQS>),
    ) -> Result<()>
    where
        M: SdMesh<NDIM>,
    {
        buffers.clear();
        let partner = resolve_face(mesh, elem, face, &mut buffers.map)?;
        if let FacePartner::Element { view, .. } = &partner {
            averaged_flux_field(
                mesh,
                state,
                view,
                &mut buffers.map_other,
                &mut buffers.averaged_other,
            )?;
        }
        let u = state.solution.element(elem.index());
        let fps = elem.face_flux_point_indices(face);

        for (i, &fp) in fps.iter().enumerate() {
            let this = elem.reconstruct_value(fp, u);
            let gradient_this = flux_point_gradient(elem, fp, u, averaged);
            let other = partner_solution(&partner, state, &buffers.map, i)?.unwrap_or(this);
            let gradient_other = match &partner {
                FacePartner::Element { view, face: g } => {
                    let fq = view.face_flux_point_indices(*g)[buffers.map[i]];
                    flux_point_gradient(
                        view,
                        fq,
                        state.solution.element(view.index()),
                        &buffers.averaged_other,
                    )
                }
                // Pseudo-elements carry no field of their own
                FacePartner::Ghost { .. } | FacePartner::Extrapolated => gradient_this,
            };
            buffers.this.push(this);
            buffers.other.push(other);
            buffers.gradient_this.push(gradient_this);
            buffers.gradient_other.push(gradient_other);
        }

        let alpha = self.config.lifting_coefficient;
        if alpha != 0.0 {
            self.lift(elem, &partner, fps, buffers);
        }

        for (i, &fp) in fps.iter().enumerate() {
            let solution: [f64; NEQS] =
                std::array::from_fn(|e| 0.5 * (buffers.this[i][e] + buffers.other[i][e]));
            let mut gradient: [[f64; NEQS]; NDIM] = std::array::from_fn(|d| {
                std::array::from_fn(|e| {
                    0.5 * (buffers.gradient_this[i][d][e] + buffers.gradient_other[i][d][e])
                })
            });
            if alpha != 0.0 {
                for d in 0..NDIM {
                    for e in 0..NEQS {
                        gradient[d][e] += alpha * buffers.lifted[i][d][e];
                    }
                }
            }

            let sign = elem.flux_point_sign(fp);
            let (n_hat, area) = unit_normal(elem, fp);
            let outward: [f64; NDIM] = std::array::from_fn(|d| sign * n_hat[d]);
            let coord = elem.point_coord(ElementPoint::Flux(fp));
            let data = point_data(&self.physics, solution, coord, Some(gradient));
            visit(fp, coord, outward, area, self.physics.compute_flux(&data, &outward));
        }
        Ok(())
    }

    /// Average of both sides' lifted gradients at every face point, stored in
    /// `buffers.lifted`.
    fn lift<E>(
        &self,
        elem: &E,
        partner: &FacePartner<E>,
        fps: &[usize],
        buffers: &mut FaceScratch<NEQS, NDIM>,
    ) where
        E: ElementView<NDIM>,
    {
        buffers.jump_this.clear();
        buffers.jump_this.resize(elem.nb_flux_points(), [0.0; NEQS]);
        for (i, &fp) in fps.iter().enumerate() {
            let jump: [f64; NEQS] =
                std::array::from_fn(|e| buffers.other[i][e] - buffers.this[i][e]);
            buffers.jump_this[fp] = jump;
        }
        for &fp in fps {
            buffers.lifted.push(lifted_gradient(elem, fp, &buffers.jump_this));
        }

        if let FacePartner::Element { view, face } = partner {
            let fqs = view.face_flux_point_indices(*face);
            buffers.jump_other.clear();
            buffers.jump_other.resize(view.nb_flux_points(), [0.0; NEQS]);
            for i in 0..fps.len() {
                let fq = fqs[buffers.map[i]];
                let jump: [f64; NEQS] =
                    std::array::from_fn(|e| buffers.this[i][e] - buffers.other[i][e]);
                buffers.jump_other[fq] = jump;
            }
            for i in 0..fps.len() {
                let fq = fqs[buffers.map[i]];
                let other = lifted_gradient(view, fq, &buffers.jump_other);
                let lifted = &mut buffers.lifted[i];
                for d in 0..NDIM {
                    for e in 0..NEQS {
                        lifted[d][e] = 0.5 * (lifted[d][e] + other[d][e]);
                    }
                }
            }
        }
        // Boundary faces reuse this side's lifted gradient, whose average
        // with itself is unchanged.
    }

    /// Diffusive fluxes through one face of one element, per unit area along
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
        let mut buffers = FaceScratch::default();
        let mut averaged = Vec::new();
        averaged_flux_field(mesh, state, &elem, &mut buffers.map, &mut averaged)?;

        let mut fluxes = Vec::with_capacity(elem.face_flux_point_indices(face).len());
        self.for_each_face_point(
            mesh,
            state,
            &elem,
            &averaged,
            face,
            &mut buffers,
            |_, coord, normal, _, r| {
                fluxes.push(FaceFlux {
                    coord,
                    normal,
                    flux: r.flux,
                })
            },
        )?;
        Ok(fluxes)
    }
}

impl<M, P, const NEQS: usize, const NDIM: usize> ElementTerm<M, NEQS, NDIM>
    for DiffusiveTerm<P, NEQS, NDIM>
where
    M: SdMesh<NDIM>,
    P: DiffusiveFlux<NEQS, NDIM>,
{
    fn name(&self) -> &'static str {
        "diffusive"
    }

    fn validate(&self, mesh: &M, state: &SolutionState<'_, NEQS, NDIM>) -> Result<()> {
        self.config.validate()?;
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
        averaged_flux_field(mesh, state, &elem, &mut scratch.face.map, &mut scratch.averaged)?;

        for &fp in elem.interior_flux_point_indices() {
            let (n_hat, area) = unit_normal(&elem, fp);
            let coord = elem.point_coord(ElementPoint::Flux(fp));
            let gradient = flux_point_gradient(&elem, fp, u, &scratch.averaged);
            let data = point_data(
                &self.physics,
                elem.reconstruct_value(fp, u),
                coord,
                Some(gradient),
            );
            let r = self.physics.compute_flux(&data, &n_hat);
            scratch.flux[fp] = r.flux.map(|f| area * f);
            scratch.wave_speed[fp] = area * area * r.wave_speed;
        }

        for face in 0..elem.nb_faces() {
            let flux = &mut scratch.flux;
            let wave_speed = &mut scratch.wave_speed;
            self.for_each_face_point(
                mesh,
                state,
                &elem,
                &scratch.averaged,
                face,
                &mut scratch.face,
                |fp, _, _, area, r| {
                    let sign = elem.flux_point_sign(fp);
                    flux[fp] = r.flux.map(|f| sign * area * f);
                    wave_speed[fp] = area * area * r.wave_speed;
                },
            )?;
        }

        let divergence = elem.reconstruct_divergence(&scratch.flux);
        let directional = elem.reconstruct_directional(&scratch.wave_speed);

        for s in 0..n_sol {
            let det = elem.jacobian_determinant(ElementPoint::Solution(s));
            let contribution = divergence[s].map(|d| d / det);
            for e in 0..NEQS {
                out.residual[s][e] += contribution[e];
            }
            if let Some(term) = out.term.as_deref_mut() {
                term[s] = contribution;
            }
            let speed = directional[s].iter().sum::<f64>() / NDIM as f64;
            out.merge_wave_speed(s, 2.0 * speed / (det * det));
        }
        Ok(())
    }
}
