//! Residual assembly over a whole mesh.
//!
//! A [`SpatialScheme`] is an ordered list of element terms. One pass zeroes
//! the residual and wave speed, then runs every term on every element:
//!
//! ```text
//! dQ/dt = -∇·F(Q) + ∇·F_v(Q, ∇Q) + S(Q)
//! ```
//!
//! The parallel variants (cargo feature `parallel`) split the output fields
//! into per-element chunks and evaluate elements concurrently.

mod gradient;
mod scheme;

pub use gradient::compute_gradient_field;
#[cfg(feature = "parallel")]
pub use gradient::compute_gradient_field_parallel;
pub use scheme::{SchemeBuilder, SchemeOutput, SpatialScheme};

use crate::field::WaveSpeedField;

/// Largest stable explicit time step for a Courant number `cfl`.
///
/// Wave speeds are already divided by the element size, so
/// `dt = cfl / max(wave_speed)`. Returns infinity when nothing moves.
pub fn stable_time_step(cfl: f64, wave_speed: &WaveSpeedField) -> f64 {
    let max_speed = wave_speed.max();
    if max_speed < 1e-14 {
        return f64::INFINITY;
    }
    cfl / max_speed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_time_step() {
        let ws = WaveSpeedField::from_data(vec![1.0, 4.0, 2.0], 1, 3).unwrap();
        assert!((stable_time_step(0.5, &ws) - 0.125).abs() < 1e-15);

        let still = WaveSpeedField::zeros(2, 2);
        assert!(stable_time_step(0.5, &still).is_infinite());
    }
}
