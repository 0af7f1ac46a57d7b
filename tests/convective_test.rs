//! Integration tests for the convective term.
//!
//! These tests verify:
//! 1. First-order 1D element with a linear ramp: fluxes and divergence
//! 2. Free-stream preservation on affine and bilinear meshes
//! 3. Conservation of the Riemann flux across shared faces
//! 4. Global conservation: volume integral of the residual equals the
//!    boundary flux
//! 5. Connectivity errors on mismatched face points

use parking_lot::Mutex;
use sd_rs::{
    BoundaryKind, ConvectiveFlux, ConvectiveTerm, ElementOutput, ElementPoint, ElementTerm,
    ElementView, Extrapolation, FaceNeighbour, FixedState, FluxResult, LinearAdvection,
    PhysicsModel, PhysicsPointData, SdError, SdMesh, SolutionField, SolutionState, TensorElement,
    TensorMesh, WaveSpeedField, fill_ghost_states, ghost_field,
};

const TOL: f64 = 1e-12;

/// Evaluate one term over the whole mesh.
fn evaluate<M, T, const NEQS: usize, const NDIM: usize>(
    term: &T,
    mesh: &M,
    state: &SolutionState<'_, NEQS, NDIM>,
) -> (SolutionField<NEQS>, WaveSpeedField)
where
    M: SdMesh<NDIM>,
    T: ElementTerm<M, NEQS, NDIM>,
{
    term.validate(mesh, state).unwrap();
    let mut residual = SolutionField::zeros(mesh.n_elements(), mesh.nb_solution_points());
    let mut wave_speed = WaveSpeedField::zeros(mesh.n_elements(), mesh.nb_solution_points());
    for k in 0..mesh.n_elements() {
        let mut out = ElementOutput::new(residual.element_mut(k), wave_speed.element_mut(k));
        term.compute_element(mesh, state, k, &mut out).unwrap();
    }
    (residual, wave_speed)
}

/// Linear advection that records every analytical flux evaluation as
/// `(x, u, F·n)`.
struct RecordingAdvection {
    inner: LinearAdvection<1>,
    calls: Mutex<Vec<(f64, f64, f64)>>,
}

impl RecordingAdvection {
    fn new(velocity: f64) -> Self {
        Self {
            inner: LinearAdvection::new([velocity]),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl PhysicsModel<1, 1> for RecordingAdvection {
    type Extra = ();

    fn name(&self) -> &'static str {
        "recording-advection"
    }
}

impl ConvectiveFlux<1, 1> for RecordingAdvection {
    fn compute_analytical_flux(
        &self,
        data: &PhysicsPointData<1, 1>,
        normal: &[f64; 1],
    ) -> FluxResult<1> {
        let r = self.inner.compute_analytical_flux(data, normal);
        self.calls
            .lock()
            .push((data.coord[0], data.solution[0], r.flux[0]));
        r
    }

    fn compute_numerical_flux(
        &self,
        left: &PhysicsPointData<1, 1>,
        right: &PhysicsPointData<1, 1>,
        normal: &[f64; 1],
    ) -> FluxResult<1> {
        self.inner.compute_numerical_flux(left, right, normal)
    }
}

/// Bilinear distortion of the unit square that keeps the boundary fixed.
fn wavy(x: [f64; 2]) -> [f64; 2] {
    let bump = (std::f64::consts::PI * x[0]).sin() * (std::f64::consts::PI * x[1]).sin();
    [x[0] + 0.08 * bump, x[1] - 0.06 * bump]
}

// ============================================================================
// End-to-end 1D ramp
// ============================================================================

/// Single first-order element, unit velocity, ramp 0 → 1 between the two
/// solution points.
#[test]
fn test_linear_ramp_first_order_element() {
    let length = 2.0;
    let mesh = TensorMesh::uniform_line(1.0, 1.0 + length, 1, 1)
        .unwrap()
        .with_boundary_kind(BoundaryKind::Extrapolated);
    let elem = mesh.element(0);

    let x1 = elem.point_coord(ElementPoint::Solution(0))[0];
    let x2 = elem.point_coord(ElementPoint::Solution(1))[0];
    let slope = 1.0 / (x2 - x1);
    let ramp = |x: f64| (x - x1) * slope;

    let solution = SolutionField::from_data(vec![[0.0], [1.0]], 1, 2).unwrap();
    let state = SolutionState::new(&solution);
    let term = ConvectiveTerm::new(LinearAdvection::new([1.0]));

    // Face fluxes: velocity × reconstructed value, along the outward normal
    for face in 0..2 {
        let fluxes = term.face_fluxes(&mesh, &state, 0, face).unwrap();
        assert_eq!(fluxes.len(), 1);
        let f = &fluxes[0];
        let expected = f.normal[0] * ramp(f.coord[0]);
        assert!((f.flux[0] - expected).abs() < TOL, "face {}: {:?}", face, f);
    }

    // Divergence constant across the element: residual = -velocity × slope
    let (residual, _) = evaluate(&term, &mesh, &state);
    for r in residual.element(0) {
        assert!((r[0] + slope).abs() < TOL, "residual {} vs {}", r[0], -slope);
    }

    // Interior flux point: velocity × value reconstructed at the midpoint
    let interior = elem.interior_flux_point_indices();
    assert_eq!(interior.len(), 1);
    let fp = interior[0];
    let x_mid = elem.point_coord(ElementPoint::Flux(fp))[0];
    assert!((x_mid - 2.0).abs() < TOL);
    assert!((elem.reconstruct_value(fp, solution.element(0))[0] - ramp(x_mid)).abs() < TOL);

    let velocity = 1.5;
    let recording = ConvectiveTerm::new(RecordingAdvection::new(velocity));
    evaluate(&recording, &mesh, &state);
    let calls = recording.physics().calls.lock().clone();
    // Interior point plus both extrapolated faces
    assert_eq!(calls.len(), 3);
    for &(x, u, flux) in &calls {
        assert!((u - ramp(x)).abs() < TOL, "value at {}: {}", x, u);
        assert!((flux.abs() - velocity * u.abs()).abs() < TOL, "flux at {}: {}", x, flux);
    }
    let (_, u_mid, flux_mid) = calls
        .iter()
        .copied()
        .find(|&(x, _, _)| (x - x_mid).abs() < TOL)
        .unwrap();
    assert!((u_mid - 0.5).abs() < TOL);
    assert!((flux_mid - velocity * 0.5).abs() < TOL);
}

#[test]
fn test_wave_speed_scales_with_element_size() {
    let mesh = TensorMesh::uniform_line(0.0, 1.0, 4, 0)
        .unwrap()
        .with_boundary_kind(BoundaryKind::Extrapolated);
    let solution = SolutionField::<1>::zeros(4, 1);
    let state = SolutionState::new(&solution);
    let term = ConvectiveTerm::new(LinearAdvection::new([3.0]));

    let (_, wave_speed) = evaluate(&term, &mesh, &state);
    // |a| / (h / 2)
    for &ws in wave_speed.data() {
        assert!((ws - 24.0).abs() < TOL);
    }
}

#[test]
fn test_wave_speed_never_decreases() {
    let mesh = TensorMesh::uniform_line(0.0, 1.0, 2, 1)
        .unwrap()
        .with_boundary_kind(BoundaryKind::Extrapolated);
    let solution = SolutionField::<1>::zeros(2, 2);
    let state = SolutionState::new(&solution);
    let term = ConvectiveTerm::new(LinearAdvection::new([0.1]));

    let mut residual = [[0.0]; 2];
    let mut wave_speed = [1e6, 0.0];
    let mut out = ElementOutput::new(&mut residual, &mut wave_speed);
    term.compute_element(&mesh, &state, 0, &mut out).unwrap();
    assert_eq!(wave_speed[0], 1e6);
    assert!(wave_speed[1] > 0.0);
}

// ============================================================================
// Free-stream preservation
// ============================================================================

fn assert_free_stream(mesh: &TensorMesh<2>) {
    let solution = SolutionField::<1>::from_solution_points(mesh, |_: &[f64; 2]| [1.7]);
    let mut ghosts = ghost_field(mesh);
    fill_ghost_states(mesh, &solution, &FixedState::new([1.7]), &mut ghosts).unwrap();
    let state = SolutionState::new(&solution).with_ghosts(&ghosts);
    let term = ConvectiveTerm::new(LinearAdvection::new([0.8, -0.45]));

    let (residual, wave_speed) = evaluate(&term, mesh, &state);
    assert!(residual.max_abs() < 1e-11, "max residual {}", residual.max_abs());
    assert!(wave_speed.data().iter().all(|&ws| ws > 0.0));
}

#[test]
fn test_free_stream_affine_mesh() {
    for order in 0..4 {
        let mesh = TensorMesh::uniform_rectangle(0.0, 2.0, -1.0, 0.5, 3, 2, order).unwrap();
        assert_free_stream(&mesh);
    }
}

#[test]
fn test_free_stream_bilinear_mesh() {
    for order in 0..4 {
        let mesh = TensorMesh::uniform_rectangle(0.0, 1.0, 0.0, 1.0, 3, 3, order)
            .unwrap()
            .map_vertices(wavy);
        assert_free_stream(&mesh);
    }
}

#[test]
fn test_free_stream_hexahedra() {
    let mesh = TensorMesh::uniform_box([0.0; 3], [1.0, 2.0, 1.0], [2, 2, 1], 2)
        .unwrap()
        .map_vertices(|x| [x[0] + 0.1 * x[1] * x[2], x[1], x[2] + 0.05 * x[0]]);
    let solution = SolutionField::<1>::from_solution_points(&mesh, |_: &[f64; 3]| [0.4]);
    let state = SolutionState::new(&solution);
    let mesh = mesh.with_boundary_kind(BoundaryKind::Extrapolated);
    let term = ConvectiveTerm::new(LinearAdvection::new([0.3, 0.2, -0.5]));

    let (residual, _) = evaluate(&term, &mesh, &state);
    assert!(residual.max_abs() < 1e-11);
}

// ============================================================================
// Conservation
// ============================================================================

fn smooth_state(mesh: &TensorMesh<2>) -> SolutionField<1> {
    SolutionField::from_solution_points(mesh, |x: &[f64; 2]| {
        [1.0 + (3.0 * x[0]).sin() * (2.0 * x[1]).cos() + x[0] * x[1]]
    })
}

#[test]
fn test_riemann_flux_conserved_across_faces() {
    let mesh = TensorMesh::uniform_rectangle(0.0, 1.0, 0.0, 1.0, 3, 2, 2)
        .unwrap()
        .map_vertices(wavy);
    let solution = smooth_state(&mesh);
    let mut ghosts = ghost_field(&mesh);
    fill_ghost_states(&mesh, &solution, &Extrapolation, &mut ghosts).unwrap();
    let state = SolutionState::new(&solution).with_ghosts(&ghosts);
    let term = ConvectiveTerm::new(LinearAdvection::new([1.0, 0.6]));

    let mut checked = 0;
    for k in 0..mesh.n_elements() {
        for face in 0..4 {
            let FaceNeighbour::Interior { element, face: other } = mesh.face_neighbour(k, face) else {
                continue;
            };
            let mine = term.face_fluxes(&mesh, &state, k, face).unwrap();
            let theirs = term.face_fluxes(&mesh, &state, element, other).unwrap();
            for a in &mine {
                let b = theirs
                    .iter()
                    .find(|b| (b.coord[0] - a.coord[0]).abs() < 1e-13 && (b.coord[1] - a.coord[1]).abs() < 1e-13)
                    .unwrap();
                // Opposite normals, identical physical flux
                assert!((a.normal[0] + b.normal[0]).abs() < 1e-12);
                assert!((a.normal[1] + b.normal[1]).abs() < 1e-12);
                assert!((a.flux[0] + b.flux[0]).abs() < TOL);
                checked += 1;
            }
        }
    }
    assert!(checked > 0);
}

#[test]
fn test_global_conservation() {
    let mesh = TensorMesh::uniform_rectangle(0.0, 1.0, 0.0, 1.0, 3, 3, 2)
        .unwrap()
        .map_vertices(wavy);
    let solution = smooth_state(&mesh);
    let mut ghosts = ghost_field(&mesh);
    fill_ghost_states(&mesh, &solution, &FixedState::new([0.5]), &mut ghosts).unwrap();
    let state = SolutionState::new(&solution).with_ghosts(&ghosts);
    let term = ConvectiveTerm::new(LinearAdvection::new([0.7, -0.4]));

    let (residual, _) = evaluate(&term, &mesh, &state);

    let reference = mesh.reference();
    let mut volume = 0.0;
    for k in 0..mesh.n_elements() {
        let elem = mesh.element(k);
        for s in 0..elem.nb_solution_points() {
            let det = elem.jacobian_determinant(ElementPoint::Solution(s));
            volume += reference.solution_weight(s) * det * residual.get(k, s)[0];
        }
    }

    let mut boundary = 0.0;
    for ghost in 0..mesh.n_ghost_faces() {
        let (k, face) = mesh.ghost_owner(ghost);
        let elem: TensorElement<'_, 2> = mesh.element(k);
        let fluxes = term.face_fluxes(&mesh, &state, k, face).unwrap();
        for (&fp, f) in elem.face_flux_point_indices(face).iter().zip(&fluxes) {
            let m = elem.plane_jacobian_normal(fp);
            let area = (m[0] * m[0] + m[1] * m[1]).sqrt();
            boundary += reference.face_weight(fp) * area * f.flux[0];
        }
    }

    assert!(
        (volume + boundary).abs() < 1e-12,
        "volume {} boundary {}",
        volume,
        boundary
    );
}

// ============================================================================
// Connectivity errors
// ============================================================================

/// Mesh whose ghost faces are shifted away from their owners.
struct ShiftedGhosts {
    inner: TensorMesh<2>,
    coords: Vec<Vec<[f64; 2]>>,
}

impl ShiftedGhosts {
    fn new(inner: TensorMesh<2>, shift: f64) -> Self {
        let coords = (0..inner.n_ghost_faces())
            .map(|g| {
                inner
                    .ghost_face_coords(g)
                    .iter()
                    .map(|x| [x[0] + shift, x[1] + shift])
                    .collect()
            })
            .collect();
        Self { inner, coords }
    }
}

impl SdMesh<2> for ShiftedGhosts {
    type Element<'a> = TensorElement<'a, 2>;

    fn n_elements(&self) -> usize {
        self.inner.n_elements()
    }

    fn element(&self, k: usize) -> TensorElement<'_, 2> {
        self.inner.element(k)
    }

    fn nb_solution_points(&self) -> usize {
        self.inner.nb_solution_points()
    }

    fn face_neighbour(&self, element: usize, face: usize) -> FaceNeighbour {
        self.inner.face_neighbour(element, face)
    }

    fn n_ghost_faces(&self) -> usize {
        self.inner.n_ghost_faces()
    }

    fn ghost_face_coords(&self, ghost: usize) -> &[[f64; 2]] {
        &self.coords[ghost]
    }

    fn ghost_owner(&self, ghost: usize) -> (usize, usize) {
        self.inner.ghost_owner(ghost)
    }
}

#[test]
fn test_mismatched_ghost_points_are_fatal() {
    let inner = TensorMesh::uniform_rectangle(0.0, 1.0, 0.0, 1.0, 1, 1, 2).unwrap();
    let mesh = ShiftedGhosts::new(inner, 1e-9);
    let solution = SolutionField::<1>::zeros(1, mesh.nb_solution_points());
    let ghosts = SolutionField::<1>::zeros(mesh.n_ghost_faces(), 3);
    let state = SolutionState::new(&solution).with_ghosts(&ghosts);
    let term = ConvectiveTerm::new(LinearAdvection::new([1.0, 1.0]));

    let mut residual = vec![[0.0]; mesh.nb_solution_points()];
    let mut wave_speed = vec![0.0; mesh.nb_solution_points()];
    let mut out = ElementOutput::new(&mut residual, &mut wave_speed);
    let err = term.compute_element(&mesh, &state, 0, &mut out).unwrap_err();
    match err {
        SdError::Connectivity { element, face, .. } => {
            assert_eq!(element, 0);
            assert_eq!(face, 0);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_tolerated_ghost_shift() {
    let inner = TensorMesh::uniform_rectangle(0.0, 1.0, 0.0, 1.0, 1, 1, 2).unwrap();
    let mesh = ShiftedGhosts::new(inner, 4.0 * f64::EPSILON);
    let solution = SolutionField::<1>::zeros(1, mesh.nb_solution_points());
    let ghosts = SolutionField::<1>::zeros(mesh.n_ghost_faces(), 3);
    let state = SolutionState::new(&solution).with_ghosts(&ghosts);
    let term = ConvectiveTerm::new(LinearAdvection::new([1.0, 1.0]));

    let (residual, _) = evaluate(&term, &mesh, &state);
    assert!(residual.max_abs() < TOL);
}

#[test]
fn test_missing_ghost_states() {
    let mesh = TensorMesh::uniform_line(0.0, 1.0, 2, 1).unwrap();
    let solution = SolutionField::<1>::zeros(2, 2);
    let state = SolutionState::new(&solution);
    let term = ConvectiveTerm::new(LinearAdvection::new([1.0]));
    let err = ElementTerm::<TensorMesh<1>, 1, 1>::validate(&term, &mesh, &state).unwrap_err();
    assert!(matches!(err, SdError::Configuration(_)));

    // Extrapolated boundaries need none
    let mesh = mesh.with_boundary_kind(BoundaryKind::Extrapolated);
    assert!(ElementTerm::<TensorMesh<1>, 1, 1>::validate(&term, &mesh, &state).is_ok());
}
