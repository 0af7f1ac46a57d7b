//! Physics strategy interface and per-point data.
//!
//! Concrete physics modules (Euler, Navier-Stokes, linearized Euler, scalar
//! transport, ...) implement the strategy traits of this module; the term
//! engines in [`crate::terms`] are generic over them.
//!
//! # Strategy Traits
//! - [`PhysicsModel`]: name and physics-specific per-point data
//! - [`ConvectiveFlux`]: analytical flux and Riemann flux
//! - [`DiffusiveFlux`]: gradient-dependent flux
//! - [`SourceFunction`]: local source
//!
//! ## Reference Physics
//! - [`LinearAdvection`], [`ScalarDiffusion`], [`ConstantSource`]

mod data;
mod scalar;
mod traits;

pub use data::PhysicsPointData;
pub use scalar::{ConstantSource, LinearAdvection, ScalarDiffusion};
pub use traits::{
    ConvectiveFlux, DiffusiveFlux, FluxResult, PhysicsModel, PointData, SourceFunction,
};
