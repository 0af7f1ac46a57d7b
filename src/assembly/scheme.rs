//! Ordered term lists and the residual pass.

use crate::error::{Result, SdError};
use crate::field::{ElementOutput, SolutionField, SolutionState, WaveSpeedField};
use crate::mesh::SdMesh;
use crate::terms::ElementTerm;

struct SchemeEntry<M, const NEQS: usize, const NDIM: usize>
where
    M: SdMesh<NDIM>,
{
    term: Box<dyn ElementTerm<M, NEQS, NDIM>>,
    record: bool,
}

/// Builder for [`SpatialScheme`].
pub struct SchemeBuilder<M, const NEQS: usize, const NDIM: usize>
where
    M: SdMesh<NDIM>,
{
    entries: Vec<SchemeEntry<M, NEQS, NDIM>>,
}

impl<M, const NEQS: usize, const NDIM: usize> Default for SchemeBuilder<M, NEQS, NDIM>
where
    M: SdMesh<NDIM>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<M, const NEQS: usize, const NDIM: usize> SchemeBuilder<M, NEQS, NDIM>
where
    M: SdMesh<NDIM>,
{
    /// Empty builder.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a term.
    pub fn with_term(mut self, term: impl ElementTerm<M, NEQS, NDIM> + 'static) -> Self {
        self.entries.push(SchemeEntry {
            term: Box::new(term),
            record: false,
        });
        self
    }

    /// Append a term whose contribution is also kept in its own field.
    pub fn with_recorded_term(mut self, term: impl ElementTerm<M, NEQS, NDIM> + 'static) -> Self {
        self.entries.push(SchemeEntry {
            term: Box::new(term),
            record: true,
        });
        self
    }

    /// Finish the scheme.
    pub fn build(self) -> Result<SpatialScheme<M, NEQS, NDIM>> {
        if self.entries.is_empty() {
            log::error!("spatial scheme built without terms");
            return Err(SdError::configuration("spatial scheme needs at least one term"));
        }
        log::debug!(
            "spatial scheme: {}",
            self.entries
                .iter()
                .map(|e| e.term.name())
                .collect::<Vec<_>>()
                .join(" + ")
        );
        Ok(SpatialScheme {
            entries: self.entries,
        })
    }
}

/// Output fields of a residual pass.
#[derive(Clone, Debug)]
pub struct SchemeOutput<const NEQS: usize> {
    /// Residual `dQ/dt` at solution points
    pub residual: SolutionField<NEQS>,
    /// Wave speed at solution points
    pub wave_speed: WaveSpeedField,
    contributions: Vec<Option<SolutionField<NEQS>>>,
}

impl<const NEQS: usize> SchemeOutput<NEQS> {
    /// Recorded contribution of term `term`, if it was added with
    /// [`SchemeBuilder::with_recorded_term`].
    pub fn contribution(&self, term: usize) -> Option<&SolutionField<NEQS>> {
        self.contributions.get(term).and_then(|c| c.as_ref())
    }
}

/// Ordered list of element terms.
pub struct SpatialScheme<M, const NEQS: usize, const NDIM: usize>
where
    M: SdMesh<NDIM>,
{
    entries: Vec<SchemeEntry<M, NEQS, NDIM>>,
}

impl<M, const NEQS: usize, const NDIM: usize> SpatialScheme<M, NEQS, NDIM>
where
    M: SdMesh<NDIM>,
{
    /// Number of terms.
    pub fn n_terms(&self) -> usize {
        self.entries.len()
    }

    /// Term names, in evaluation order.
    pub fn term_names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.term.name()).collect()
    }

    /// Allocate output fields for `mesh`.
    pub fn allocate_output(&self, mesh: &M) -> SchemeOutput<NEQS> {
        let (n_elements, n_points) = (mesh.n_elements(), mesh.nb_solution_points());
        SchemeOutput {
            residual: SolutionField::zeros(n_elements, n_points),
            wave_speed: WaveSpeedField::zeros(n_elements, n_points),
            contributions: self
                .entries
                .iter()
                .map(|e| e.record.then(|| SolutionField::zeros(n_elements, n_points)))
                .collect(),
        }
    }

    /// Run every term's checks.
    pub fn validate(&self, mesh: &M, state: &SolutionState<'_, NEQS, NDIM>) -> Result<()> {
        for entry in &self.entries {
            entry.term.validate(mesh, state)?;
        }
        Ok(())
    }

    fn prepare(
        &self,
        mesh: &M,
        state: &SolutionState<'_, NEQS, NDIM>,
        output: &mut SchemeOutput<NEQS>,
    ) -> Result<()> {
        self.validate(mesh, state)?;

        let (n_elements, n_points) = (mesh.n_elements(), mesh.nb_solution_points());
        output.residual.check_shape("residual", n_elements, n_points)?;
        output.wave_speed.check_shape("wave speed", n_elements, n_points)?;
        SdError::check_dimension("term contributions", self.entries.len(), output.contributions.len())?;
        for field in output.contributions.iter().flatten() {
            field.check_shape("term contribution", n_elements, n_points)?;
        }

        output.residual.fill([0.0; NEQS]);
        output.wave_speed.fill(0.0);
        for field in output.contributions.iter_mut().flatten() {
            field.fill([0.0; NEQS]);
        }
        Ok(())
    }

    /// Evaluate the residual and wave speed over the whole mesh.
    pub fn assemble_residual(
        &self,
        mesh: &M,
        state: &SolutionState<'_, NEQS, NDIM>,
        output: &mut SchemeOutput<NEQS>,
    ) -> Result<()> {
        self.prepare(mesh, state, output)?;

        let SchemeOutput {
            residual,
            wave_speed,
            contributions,
        } = output;
        for k in 0..mesh.n_elements() {
            for (entry, contribution) in self.entries.iter().zip(contributions.iter_mut()) {
                let mut out = ElementOutput::new(residual.element_mut(k), wave_speed.element_mut(k));
                if let Some(field) = contribution {
                    out = out.with_term(field.element_mut(k));
                }
                entry.term.compute_element(mesh, state, k, &mut out)?;
            }
        }

        log::debug!(
            "residual pass: {} elements, {} terms, max |R| {:.3e}, max wave speed {:.3e}",
            mesh.n_elements(),
            self.entries.len(),
            output.residual.max_abs(),
            output.wave_speed.max()
        );
        Ok(())
    }

    /// Parallel version of [`SpatialScheme::assemble_residual`].
    ///
    /// Produces the same values: every element is still evaluated by the
    /// terms in order, only different elements run concurrently.
    #[cfg(feature = "parallel")]
    pub fn assemble_residual_parallel(
        &self,
        mesh: &M,
        state: &SolutionState<'_, NEQS, NDIM>,
        output: &mut SchemeOutput<NEQS>,
    ) -> Result<()> {
        use rayon::prelude::*;

        self.prepare(mesh, state, output)?;
        let (n_elements, n_points) = (mesh.n_elements(), mesh.nb_solution_points());

        let SchemeOutput {
            residual,
            wave_speed,
            contributions,
        } = output;

        // Per element, one optional contribution chunk per term
        let mut term_chunks: Vec<Vec<Option<&mut [[f64; NEQS]]>>> = (0..n_elements)
            .map(|_| Vec::with_capacity(self.entries.len()))
            .collect();
        for contribution in contributions.iter_mut() {
            match contribution {
                Some(field) => {
                    for (chunks, chunk) in term_chunks
                        .iter_mut()
                        .zip(field.data_mut().chunks_mut(n_points))
                    {
                        chunks.push(Some(chunk));
                    }
                }
                None => term_chunks.iter_mut().for_each(|chunks| chunks.push(None)),
            }
        }

        residual
            .data_mut()
            .par_chunks_mut(n_points)
            .zip(wave_speed.data_mut().par_chunks_mut(n_points))
            .zip(term_chunks.into_par_iter())
            .enumerate()
            .try_for_each(|(k, ((res, ws), mut terms))| -> Result<()> {
                for (entry, term) in self.entries.iter().zip(terms.iter_mut()) {
                    let mut out = ElementOutput {
                        residual: &mut *res,
                        wave_speed: &mut *ws,
                        term: term.take(),
                    };
                    entry.term.compute_element(mesh, state, k, &mut out)?;
                }
                Ok(())
            })?;

        log::debug!(
            "parallel residual pass: {} elements, {} terms, max wave speed {:.3e}",
            n_elements,
            self.entries.len(),
            output.wave_speed.max()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::TensorMesh;
    use crate::physics::ConstantSource;
    use crate::terms::SourceTerm;

    #[test]
    fn test_empty_scheme_is_rejected() {
        let result = SchemeBuilder::<TensorMesh<1>, 1, 1>::new().build();
        assert!(matches!(result, Err(SdError::Configuration(_))));
    }

    #[test]
    fn test_recorded_contributions() {
        let mesh = TensorMesh::uniform_line(0.0, 1.0, 4, 1).unwrap();
        let scheme = SchemeBuilder::<_, 1, 1>::new()
            .with_recorded_term(SourceTerm::new(ConstantSource::new([2.0])))
            .with_term(SourceTerm::new(ConstantSource::new([0.5])))
            .build()
            .unwrap();
        assert_eq!(scheme.term_names(), vec!["source", "source"]);

        let solution = SolutionField::<1>::zeros(4, mesh.nb_solution_points());
        let state = SolutionState::new(&solution);
        let mut output = scheme.allocate_output(&mesh);
        output.residual.fill([100.0]);
        scheme.assemble_residual(&mesh, &state, &mut output).unwrap();

        for r in output.residual.data() {
            assert!((r[0] - 2.5).abs() < 1e-15);
        }
        let recorded = output.contribution(0).unwrap();
        assert!(recorded.data().iter().all(|c| c[0] == 2.0));
        assert!(output.contribution(1).is_none());
    }

    #[test]
    fn test_output_shape_mismatch() {
        let mesh = TensorMesh::uniform_line(0.0, 1.0, 4, 1).unwrap();
        let other = TensorMesh::uniform_line(0.0, 1.0, 3, 1).unwrap();
        let scheme = SchemeBuilder::<_, 1, 1>::new()
            .with_term(SourceTerm::new(ConstantSource::new([1.0])))
            .build()
            .unwrap();

        let solution = SolutionField::<1>::zeros(4, mesh.nb_solution_points());
        let state = SolutionState::new(&solution);
        let mut output = scheme.allocate_output(&other);
        let err = scheme.assemble_residual(&mesh, &state, &mut output);
        assert!(matches!(err, Err(SdError::DimensionMismatch { .. })));
    }
}
