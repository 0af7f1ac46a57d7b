//! Per-point physical data handed to physics strategies.

/// Bundle of physical quantities at one solution or flux point.
///
/// Recreated for every evaluation and never persisted. Physics strategies
/// that need more than the solution, coordinate and gradient (mean flow, wall
/// distance, ...) attach it through `extra`.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsPointData<const NEQS: usize, const NDIM: usize, E = ()> {
    /// Solution vector.
    pub solution: [f64; NEQS],
    /// Physical coordinates.
    pub coord: [f64; NDIM],
    /// Physical solution gradient, `solution_gradient[d][e] = ∂u_e/∂x_d`.
    pub solution_gradient: Option<[[f64; NEQS]; NDIM]>,
    /// Physics-specific per-point data.
    pub extra: E,
}

impl<const NEQS: usize, const NDIM: usize> PhysicsPointData<NEQS, NDIM, ()> {
    /// Point data without gradient or extra quantities.
    #[inline]
    pub fn new(solution: [f64; NEQS], coord: [f64; NDIM]) -> Self {
        Self {
            solution,
            coord,
            solution_gradient: None,
            extra: (),
        }
    }
}

impl<const NEQS: usize, const NDIM: usize, E> PhysicsPointData<NEQS, NDIM, E> {
    /// Attach a physical solution gradient.
    #[inline]
    pub fn with_gradient(mut self, gradient: [[f64; NEQS]; NDIM]) -> Self {
        self.solution_gradient = Some(gradient);
        self
    }

    /// Replace the extra per-point data.
    #[inline]
    pub fn with_extra<F>(self, extra: F) -> PhysicsPointData<NEQS, NDIM, F> {
        PhysicsPointData {
            solution: self.solution,
            coord: self.coord,
            solution_gradient: self.solution_gradient,
            extra,
        }
    }

    /// Gradient, or zero if none was attached.
    #[inline]
    pub fn gradient_or_zero(&self) -> [[f64; NEQS]; NDIM] {
        self.solution_gradient.unwrap_or([[0.0; NEQS]; NDIM])
    }

    /// Gradient of equation `eq` projected on `normal`.
    #[inline]
    pub fn normal_derivative(&self, eq: usize, normal: &[f64; NDIM]) -> f64 {
        match &self.solution_gradient {
            Some(grad) => (0..NDIM).map(|d| grad[d][eq] * normal[d]).sum(),
            None => 0.0,
        }
    }
}
