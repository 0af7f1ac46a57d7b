//! Persistent per-element fields.
//!
//! Values are stored interleaved, `data[k * n_points + i]` for element (or
//! ghost face) `k` and point `i`, each entry holding all variables of one
//! point. Term engines only ever receive the slice of a single element.

use crate::element::{ElementPoint, ElementView};
use crate::error::{Result, SdError};
use crate::mesh::SdMesh;

/// Point values for a set of elements with a fixed number of points each.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementField<T> {
    data: Vec<T>,
    n_elements: usize,
    n_points: usize,
}

/// Solution or residual: `NEQS` values per solution point.
pub type SolutionField<const NEQS: usize> = ElementField<[f64; NEQS]>;

/// Wave speed: one value per solution point.
pub type WaveSpeedField = ElementField<f64>;

/// Physical solution gradient per solution point, `[d][e] = ∂u_e/∂x_d`.
pub type GradientField<const NEQS: usize, const NDIM: usize> = ElementField<[[f64; NEQS]; NDIM]>;

impl<T: Copy> ElementField<T> {
    /// Create a field with every value set to `value`.
    pub fn filled(n_elements: usize, n_points: usize, value: T) -> Self {
        Self {
            data: vec![value; n_elements * n_points],
            n_elements,
            n_points,
        }
    }

    /// Create a field from raw interleaved data.
    pub fn from_data(data: Vec<T>, n_elements: usize, n_points: usize) -> Result<Self> {
        SdError::check_dimension("field values", n_elements * n_points, data.len())?;
        Ok(Self {
            data,
            n_elements,
            n_points,
        })
    }

    /// Evaluate `f` at every solution point of a mesh.
    pub fn from_solution_points<M, const NDIM: usize>(mesh: &M, f: impl Fn(&[f64; NDIM]) -> T) -> Self
    where
        M: SdMesh<NDIM>,
    {
        let n_points = mesh.nb_solution_points();
        let mut data = Vec::with_capacity(mesh.n_elements() * n_points);
        for k in 0..mesh.n_elements() {
            let elem = mesh.element(k);
            for s in 0..n_points {
                data.push(f(&elem.point_coord(ElementPoint::Solution(s))));
            }
        }
        Self {
            data,
            n_elements: mesh.n_elements(),
            n_points,
        }
    }

    /// Evaluate `f` at every point of every ghost face of a mesh.
    pub fn from_ghost_points<M, const NDIM: usize>(mesh: &M, f: impl Fn(&[f64; NDIM]) -> T) -> Self
    where
        M: SdMesh<NDIM>,
    {
        let n_points = mesh.nb_ghost_points();
        let data = (0..mesh.n_ghost_faces())
            .flat_map(|g| mesh.ghost_face_coords(g).iter().map(&f))
            .collect();
        Self {
            data,
            n_elements: mesh.n_ghost_faces(),
            n_points,
        }
    }

    /// Number of elements.
    #[inline]
    pub fn n_elements(&self) -> usize {
        self.n_elements
    }

    /// Number of points per element.
    #[inline]
    pub fn n_points(&self) -> usize {
        self.n_points
    }

    /// Values of element `k`.
    #[inline]
    pub fn element(&self, k: usize) -> &[T] {
        let start = k * self.n_points;
        &self.data[start..start + self.n_points]
    }

    /// Mutable values of element `k`.
    #[inline]
    pub fn element_mut(&mut self, k: usize) -> &mut [T] {
        let start = k * self.n_points;
        &mut self.data[start..start + self.n_points]
    }

    /// Value at point `i` of element `k`.
    #[inline]
    pub fn get(&self, k: usize, i: usize) -> T {
        self.data[k * self.n_points + i]
    }

    /// Set the value at point `i` of element `k`.
    #[inline]
    pub fn set(&mut self, k: usize, i: usize, value: T) {
        self.data[k * self.n_points + i] = value;
    }

    /// Set every value.
    pub fn fill(&mut self, value: T) {
        self.data.iter_mut().for_each(|v| *v = value);
    }

    /// All values.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// All values, mutable.
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Mutable per-element chunks, in element order.
    pub fn elements_mut(&mut self) -> std::slice::ChunksMut<'_, T> {
        self.data.chunks_mut(self.n_points.max(1))
    }

    /// Fail unless the field has `n_elements × n_points` entries.
    pub fn check_shape(&self, what: &'static str, n_elements: usize, n_points: usize) -> Result<()> {
        SdError::check_dimension(what, n_elements, self.n_elements)?;
        SdError::check_dimension(what, n_points, self.n_points)
    }
}

impl<const N: usize> ElementField<[f64; N]> {
    /// Zero-initialized field.
    pub fn zeros(n_elements: usize, n_points: usize) -> Self {
        Self::filled(n_elements, n_points, [0.0; N])
    }

    /// Maximum absolute value over all variables.
    pub fn max_abs(&self) -> f64 {
        self.data
            .iter()
            .flat_map(|v| v.iter())
            .map(|x| x.abs())
            .fold(0.0, f64::max)
    }
}

impl ElementField<f64> {
    /// Zero-initialized scalar field.
    pub fn zeros(n_elements: usize, n_points: usize) -> Self {
        Self::filled(n_elements, n_points, 0.0)
    }

    /// Largest value.
    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(0.0, f64::max)
    }
}

impl<const NEQS: usize, const NDIM: usize> ElementField<[[f64; NEQS]; NDIM]> {
    /// Zero-initialized gradient field.
    pub fn zero_gradients(n_elements: usize, n_points: usize) -> Self {
        Self::filled(n_elements, n_points, [[0.0; NEQS]; NDIM])
    }
}

/// Read-only inputs of one evaluation pass.
#[derive(Clone, Copy)]
pub struct SolutionState<'a, const NEQS: usize, const NDIM: usize> {
    /// Solution at solution points
    pub solution: &'a SolutionField<NEQS>,
    /// Ghost states at ghost-face points; needed for regular boundaries
    pub ghosts: Option<&'a SolutionField<NEQS>>,
    /// Precomputed solution gradients at solution points
    pub gradients: Option<&'a GradientField<NEQS, NDIM>>,
}

impl<'a, const NEQS: usize, const NDIM: usize> SolutionState<'a, NEQS, NDIM> {
    /// State without ghost values or gradients.
    pub fn new(solution: &'a SolutionField<NEQS>) -> Self {
        Self {
            solution,
            ghosts: None,
            gradients: None,
        }
    }

    /// Attach ghost-face states.
    pub fn with_ghosts(mut self, ghosts: &'a SolutionField<NEQS>) -> Self {
        self.ghosts = Some(ghosts);
        self
    }

    /// Attach a precomputed gradient field.
    pub fn with_gradients(mut self, gradients: &'a GradientField<NEQS, NDIM>) -> Self {
        self.gradients = Some(gradients);
        self
    }

    /// Ghost states of a ghost face.
    pub fn ghost(&self, ghost: usize) -> Result<&'a [[f64; NEQS]]> {
        match self.ghosts {
            Some(field) if ghost < field.n_elements() => Ok(field.element(ghost)),
            Some(field) => Err(SdError::dimension_mismatch(
                "ghost faces",
                ghost + 1,
                field.n_elements(),
            )),
            None => Err(SdError::configuration(
                "regular boundary face reached without ghost states",
            )),
        }
    }

    /// Fail unless the fields fit `mesh`.
    pub fn check_mesh<M: SdMesh<NDIM>>(&self, mesh: &M) -> Result<()> {
        self.solution
            .check_shape("solution", mesh.n_elements(), mesh.nb_solution_points())?;
        if let Some(ghosts) = self.ghosts {
            ghosts.check_shape("ghost states", mesh.n_ghost_faces(), mesh.nb_ghost_points())?;
        }
        if let Some(gradients) = self.gradients {
            gradients.check_shape("gradients", mesh.n_elements(), mesh.nb_solution_points())?;
        }
        Ok(())
    }
}

/// Writable slices of one element.
pub struct ElementOutput<'a, const NEQS: usize> {
    /// Residual at solution points
    pub residual: &'a mut [[f64; NEQS]],
    /// Wave speed at solution points
    pub wave_speed: &'a mut [f64],
    /// Optional dedicated contribution slot of the running term
    pub term: Option<&'a mut [[f64; NEQS]]>,
}

impl<'a, const NEQS: usize> ElementOutput<'a, NEQS> {
    /// Output without a term slot.
    pub fn new(residual: &'a mut [[f64; NEQS]], wave_speed: &'a mut [f64]) -> Self {
        Self {
            residual,
            wave_speed,
            term: None,
        }
    }

    /// Attach a term contribution slot.
    pub fn with_term(mut self, term: &'a mut [[f64; NEQS]]) -> Self {
        self.term = Some(term);
        self
    }

    /// Merge a wave speed by maximum.
    #[inline]
    pub fn merge_wave_speed(&mut self, point: usize, value: f64) {
        let slot = &mut self.wave_speed[point];
        *slot = slot.max(value);
    }

    /// Fail unless every slice holds `n_points` entries.
    pub fn check_len(&self, n_points: usize) -> Result<()> {
        SdError::check_dimension("residual points", n_points, self.residual.len())?;
        SdError::check_dimension("wave speed points", n_points, self.wave_speed.len())?;
        if let Some(term) = &self.term {
            SdError::check_dimension("term points", n_points, term.len())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::TensorMesh;

    #[test]
    fn test_element_slices() {
        let mut field = SolutionField::<2>::zeros(3, 2);
        field.element_mut(1)[0] = [1.0, 2.0];
        assert_eq!(field.get(1, 0), [1.0, 2.0]);
        assert_eq!(field.element(1), &[[1.0, 2.0], [0.0, 0.0]]);
        assert_eq!(field.max_abs(), 2.0);
        assert_eq!(field.elements_mut().count(), 3);
    }

    #[test]
    fn test_from_data_checks_length() {
        assert!(WaveSpeedField::from_data(vec![0.0; 5], 2, 3).is_err());
        let field = WaveSpeedField::from_data(vec![1.0, 4.0, 2.0], 1, 3).unwrap();
        assert_eq!(field.max(), 4.0);
    }

    #[test]
    fn test_from_solution_points() {
        let mesh = TensorMesh::uniform_line(0.0, 2.0, 2, 0).unwrap();
        let field = SolutionField::<1>::from_solution_points(&mesh, |x: &[f64; 1]| [x[0]]);
        assert!((field.get(0, 0)[0] - 0.5).abs() < 1e-14);
        assert!((field.get(1, 0)[0] - 1.5).abs() < 1e-14);
    }

    #[test]
    fn test_missing_ghosts() {
        let solution = SolutionField::<1>::zeros(1, 1);
        let state = SolutionState::<1, 1>::new(&solution);
        assert!(matches!(state.ghost(0), Err(SdError::Configuration(_))));
    }

    #[test]
    fn test_merge_wave_speed() {
        let mut residual = [[0.0]; 2];
        let mut ws = [3.0, 1.0];
        let mut out = ElementOutput::new(&mut residual, &mut ws);
        out.merge_wave_speed(0, 2.0);
        out.merge_wave_speed(1, 2.0);
        assert_eq!(ws, [3.0, 2.0]);
    }
}
