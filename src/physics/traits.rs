//! Strategy interfaces implemented by concrete physics.
//!
//! The term engines are generic over these traits and never hard-code a flux
//! law. Every method is a pure function of its point data and unit normal.
//!
//! # Conventions
//!
//! - Normals passed to the strategies are unit vectors. Face normals point out
//!   of the element being evaluated.
//! - Numerical fluxes must be consistent, `F*(q, q; n) = F(q) · n`, and
//!   conservative, `F*(q_l, q_r; n) = -F*(q_r, q_l; -n)`.
//! - Near-singular states (vanishing velocity, density, ...) must be handled
//!   inside the strategy with a finite fallback; the engines do not check.

use super::data::PhysicsPointData;

/// Flux along a unit normal together with the local wave speed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FluxResult<const NEQS: usize> {
    /// Flux projected on the unit normal.
    pub flux: [f64; NEQS],
    /// Maximum characteristic speed along the normal (non-negative).
    pub wave_speed: f64,
}

impl<const NEQS: usize> FluxResult<NEQS> {
    /// Create a flux result.
    #[inline]
    pub fn new(flux: [f64; NEQS], wave_speed: f64) -> Self {
        Self { flux, wave_speed }
    }
}

/// Common part of every physics strategy.
pub trait PhysicsModel<const NEQS: usize, const NDIM: usize>: Send + Sync {
    /// Additional per-point data this physics needs (use `()` if none).
    type Extra: Clone + Default + Send + Sync;

    /// Human-readable name for debugging and logging.
    fn name(&self) -> &'static str;

    /// Compute the extra per-point data at a physical location.
    fn extra_data(&self, coord: &[f64; NDIM]) -> Self::Extra {
        let _ = coord;
        Self::Extra::default()
    }
}

/// Point data type seen by physics `P`.
pub type PointData<P, const NEQS: usize, const NDIM: usize> =
    PhysicsPointData<NEQS, NDIM, <P as PhysicsModel<NEQS, NDIM>>::Extra>;

/// First-derivative (hyperbolic) flux law.
pub trait ConvectiveFlux<const NEQS: usize, const NDIM: usize>: PhysicsModel<NEQS, NDIM> {
    /// Physical flux `F(q) · n` at a point inside an element.
    fn compute_analytical_flux(
        &self,
        data: &PhysicsPointData<NEQS, NDIM, Self::Extra>,
        normal: &[f64; NDIM],
    ) -> FluxResult<NEQS>;

    /// Riemann flux between an interior (`left`) and exterior (`right`) state.
    fn compute_numerical_flux(
        &self,
        left: &PhysicsPointData<NEQS, NDIM, Self::Extra>,
        right: &PhysicsPointData<NEQS, NDIM, Self::Extra>,
        normal: &[f64; NDIM],
    ) -> FluxResult<NEQS>;
}

/// Second-derivative (parabolic) flux law.
///
/// The data always carries `solution_gradient`.
pub trait DiffusiveFlux<const NEQS: usize, const NDIM: usize>: PhysicsModel<NEQS, NDIM> {
    /// Diffusive flux `F_v(q, ∇q) · n` and its diffusive wave speed.
    fn compute_flux(
        &self,
        data: &PhysicsPointData<NEQS, NDIM, Self::Extra>,
        normal: &[f64; NDIM],
    ) -> FluxResult<NEQS>;
}

/// Local source law.
pub trait SourceFunction<const NEQS: usize, const NDIM: usize>: PhysicsModel<NEQS, NDIM> {
    /// Source vector at a solution point.
    fn compute_source(&self, data: &PhysicsPointData<NEQS, NDIM, Self::Extra>) -> [f64; NEQS];
}
