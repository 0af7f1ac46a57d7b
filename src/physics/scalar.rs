//! Reference scalar-transport physics.
//!
//! Small, fully specified strategies used by tests, benchmarks and as a
//! template for real physics modules:
//! - [`LinearAdvection`]: `F(u) = a u` with an upwind Riemann flux
//! - [`ScalarDiffusion`]: `F_v(u) = ν ∇u`
//! - [`ConstantSource`]: fixed source vector

use super::traits::{
    ConvectiveFlux, DiffusiveFlux, FluxResult, PhysicsModel, PointData, SourceFunction,
};

#[inline]
fn dot<const NDIM: usize>(a: &[f64; NDIM], b: &[f64; NDIM]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Linear advection of a scalar with constant velocity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearAdvection<const NDIM: usize> {
    /// Advection velocity.
    pub velocity: [f64; NDIM],
}

impl<const NDIM: usize> LinearAdvection<NDIM> {
    /// Create with a given velocity.
    pub fn new(velocity: [f64; NDIM]) -> Self {
        Self { velocity }
    }
}

impl<const NDIM: usize> PhysicsModel<1, NDIM> for LinearAdvection<NDIM> {
    type Extra = ();

    fn name(&self) -> &'static str {
        "linear-advection"
    }
}

impl<const NDIM: usize> ConvectiveFlux<1, NDIM> for LinearAdvection<NDIM> {
    fn compute_analytical_flux(
        &self,
        data: &PointData<Self, 1, NDIM>,
        normal: &[f64; NDIM],
    ) -> FluxResult<1> {
        let a_n = dot(&self.velocity, normal);
        FluxResult::new([a_n * data.solution[0]], a_n.abs())
    }

    fn compute_numerical_flux(
        &self,
        left: &PointData<Self, 1, NDIM>,
        right: &PointData<Self, 1, NDIM>,
        normal: &[f64; NDIM],
    ) -> FluxResult<1> {
        // Upwind: outflow takes the interior state, inflow the exterior one
        let a_n = dot(&self.velocity, normal);
        let upwind = if a_n > 0.0 {
            left.solution[0]
        } else {
            right.solution[0]
        };
        FluxResult::new([a_n * upwind], a_n.abs())
    }
}

/// Isotropic diffusion of a scalar.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScalarDiffusion {
    /// Diffusivity ν.
    pub diffusivity: f64,
}

impl ScalarDiffusion {
    /// Create with a given diffusivity.
    pub fn new(diffusivity: f64) -> Self {
        Self { diffusivity }
    }
}

impl<const NDIM: usize> PhysicsModel<1, NDIM> for ScalarDiffusion {
    type Extra = ();

    fn name(&self) -> &'static str {
        "scalar-diffusion"
    }
}

impl<const NDIM: usize> DiffusiveFlux<1, NDIM> for ScalarDiffusion {
    fn compute_flux(&self, data: &PointData<Self, 1, NDIM>, normal: &[f64; NDIM]) -> FluxResult<1> {
        let du_dn = data.normal_derivative(0, normal);
        FluxResult::new([self.diffusivity * du_dn], self.diffusivity)
    }
}

/// Source term returning the same vector everywhere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstantSource<const NEQS: usize> {
    /// Source value.
    pub value: [f64; NEQS],
}

impl<const NEQS: usize> ConstantSource<NEQS> {
    /// Create with a given value.
    pub fn new(value: [f64; NEQS]) -> Self {
        Self { value }
    }
}

impl<const NEQS: usize, const NDIM: usize> PhysicsModel<NEQS, NDIM> for ConstantSource<NEQS> {
    type Extra = ();

    fn name(&self) -> &'static str {
        "constant-source"
    }
}

impl<const NEQS: usize, const NDIM: usize> SourceFunction<NEQS, NDIM> for ConstantSource<NEQS> {
    fn compute_source(&self, _data: &PointData<Self, NEQS, NDIM>) -> [f64; NEQS] {
        self.value
    }
}
