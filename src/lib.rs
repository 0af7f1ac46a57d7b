//! # sd-rs
//!
//! Per-element term evaluation for high-order spectral-difference (SD)
//! discretizations of conservation laws.
//!
//! The crate provides:
//! - Physics strategy traits (analytical/Riemann flux, diffusive flux, source)
//! - Convective, diffusive (with lifting) and source term engines
//! - Coordinate-based face point matching between neighbouring elements
//! - A tensor-product SD reference element and mesh on multilinear cells
//! - Ghost states for boundary faces
//! - Residual assembly and explicit time-step bounds
//!
//! Semi-discrete form assembled by the engines:
//!
//! ```text
//! dQ/dt = -∇·F(Q) + ∇·F_v(Q, ∇Q) + S(Q)
//! ```

pub mod assembly;
pub mod boundary;
pub mod element;
pub mod error;
pub mod face_matcher;
pub mod field;
pub mod mesh;
pub mod physics;
pub mod polynomial;
pub mod terms;

pub use assembly::{
    SchemeBuilder, SchemeOutput, SpatialScheme, compute_gradient_field, stable_time_step,
};
#[cfg(feature = "parallel")]
pub use assembly::compute_gradient_field_parallel;
pub use boundary::{
    BoundaryCondition, Extrapolation, FixedState, FunctionState, GhostContext, fill_ghost_states,
    ghost_field,
};
pub use element::{ElementPoint, ElementView, SdReference, TensorElement};
pub use error::{Result, SdError};
pub use face_matcher::{FaceMatchError, FaceMatcher, MATCH_TOLERANCE};
pub use field::{
    ElementField, ElementOutput, GradientField, SolutionField, SolutionState, WaveSpeedField,
};
pub use mesh::{BoundaryKind, FaceNeighbour, SdMesh, TensorMesh};
pub use physics::{
    ConstantSource, ConvectiveFlux, DiffusiveFlux, FluxResult, LinearAdvection, PhysicsModel,
    PhysicsPointData, ScalarDiffusion, SourceFunction,
};
pub use terms::{
    ConvectiveTerm, DiffusiveTerm, DiffusiveTermConfig, ElementTerm, FaceFlux, SourceTerm,
};
