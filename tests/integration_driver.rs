//! Integration tests for the reverse-communication L-BFGS-B driver.
//!
//! Purpose
//! -------
//! - Validate the public surface end to end: options, bounds, workspace
//!   reuse, the built-in step routine, stopping rules, diagnostics and the
//!   error taxonomy.
//! - Cross-check the built-in routine against `argmin`'s L-BFGS on an
//!   unconstrained problem where both must agree on the minimizer.
//!
//! Coverage
//! --------
//! - `optimization::lbfgsb::api`: `minimize`, `minimize_with`.
//! - `optimization::lbfgsb::workspace`: sizing, `Resize` hints, reuse.
//! - `optimization::lbfgsb::bounds`: one-sided, two-sided and infinite
//!   sentinels as seen through a full run.
//! - `optimization::errors`: `ErrorKind` of every failure surfaced here.
//!
//! Exclusions
//! ----------
//! - Task-dispatch corner cases against scripted routines (unit tests in
//!   `run`).
//! - Status-string encoding details (unit tests in `status`).
use std::cell::Cell;

use approx::assert_abs_diff_eq;
use argmin::{
    core::{CostFunction, Error, Executor, Gradient, State},
    solver::{linesearch::MoreThuenteLineSearch, quasinewton::LBFGS},
};
use lbfgsb_rc::{
    ErrorKind, OptError, OptResult,
    optimization::lbfgsb::{
        Bounds, Diagnostics, Grad, MinimizeOptions, Objective, ProjectedLbfgs, StopPredicate,
        Termination, Theta, Tolerances, Workspace, minimize, minimize_with,
    },
};
use ndarray::{Array1, array};

/// Purpose
/// -------
/// Separable quadratic `Σ (x_i - t_i)^2` with its analytic gradient.
///
/// Usage
/// -----
/// - Baseline smooth problem whose minimizer is known exactly, both with
///   and without bounds (the constrained minimizer is `clamp(t)`).
fn quadratic(target: &Array1<f64>) -> impl FnMut(&Theta, &mut Grad) -> f64 + '_ {
    move |x: &Theta, g: &mut Grad| {
        let r = x - target;
        g.assign(&(&r * 2.0));
        r.dot(&r)
    }
}

/// Purpose
/// -------
/// Two-dimensional Rosenbrock function `(1 - a)^2 + 100 (b - a^2)^2`.
fn rosenbrock(x: &Theta, g: &mut Grad) -> f64 {
    let (a, b) = (x[0], x[1]);
    g[0] = -2.0 * (1.0 - a) - 400.0 * a * (b - a * a);
    g[1] = 200.0 * (b - a * a);
    (1.0 - a).powi(2) + 100.0 * (b - a * a).powi(2)
}

/// Rosenbrock as an `argmin` problem for the reference solver.
struct RosenbrockProblem;

impl CostFunction for RosenbrockProblem {
    type Param = Array1<f64>;
    type Output = f64;

    fn cost(&self, p: &Self::Param) -> Result<Self::Output, Error> {
        let mut g = Array1::zeros(2);
        Ok(rosenbrock(p, &mut g))
    }
}

impl Gradient for RosenbrockProblem {
    type Param = Array1<f64>;
    type Gradient = Array1<f64>;

    fn gradient(&self, p: &Self::Param) -> Result<Self::Gradient, Error> {
        let mut g = Array1::zeros(2);
        rosenbrock(p, &mut g);
        Ok(g)
    }
}

#[test]
// Purpose
// -------
// Unconstrained quadratic in five variables converges to the target.
//
// Given
// -----
// - t = [1, -2, 3, 0.5, -0.25], x0 = 0, default options.
//
// Expect
// ------
// - `Termination::Converged` with a `CONVERGENCE` message.
// - Value ≈ 0 and x ≈ t.
// - Diagnostics report at least one iteration and no constraints.
fn unconstrained_quadratic_converges() {
    // Arrange
    let target = array![1.0, -2.0, 3.0, 0.5, -0.25];
    let mut x = Theta::zeros(5);

    // Act
    let out = minimize(&mut quadratic(&target), &mut x, &MinimizeOptions::default())
        .expect("quadratic should converge");

    // Assert
    assert_eq!(out.termination, Termination::Converged);
    assert!(out.message.starts_with("CONVERGENCE"), "message: {}", out.message);
    assert_abs_diff_eq!(out.value, 0.0, epsilon = 1e-10);
    for (xi, ti) in x.iter().zip(target.iter()) {
        assert_abs_diff_eq!(*xi, *ti, epsilon = 1e-6);
    }
    assert!(out.diagnostics.iterations >= 1);
    assert!(!out.diagnostics.is_constrained);
}

#[test]
// Purpose
// -------
// Box-constrained quadratic ends on the box at `clamp(t)`.
//
// Given
// -----
// - t = [2, -3, 0.5, 4], box [0, 1] on the first three variables and a
//   lower bound only (upper = +∞) on the last.
// - High-accuracy tolerances (factr = 10, pgtol = 1e-8).
//
// Expect
// ------
// - x = [1, 0, 0.5, 4] within tolerance and inside the box.
// - Constrained but not fully boxed; two constraints active at the end.
fn bounded_quadratic_ends_on_box() {
    // Arrange
    let target = array![2.0, -3.0, 0.5, 4.0];
    let lower = array![0.0, 0.0, 0.0, 1.0];
    let upper = array![1.0, 1.0, 1.0, f64::INFINITY];
    let opts = MinimizeOptions::default()
        .with_bounds(Bounds::new(Some(lower.view()), Some(upper.view())))
        .with_tolerances(Tolerances::new(10.0, 1e-8).expect("valid tolerances"));
    let mut x = array![0.5, 0.5, 0.5, 1.0];

    // Act
    let out = minimize(&mut quadratic(&target), &mut x, &opts).expect("should converge");

    // Assert
    assert!(out.converged());
    let expected = [1.0, 0.0, 0.5, 4.0];
    for (i, e) in expected.iter().enumerate() {
        assert_abs_diff_eq!(x[i], *e, epsilon = 1e-6);
        assert!(x[i] >= lower[i] && x[i] <= upper[i]);
    }
    assert!(out.diagnostics.is_constrained);
    assert!(!out.diagnostics.is_fully_boxed);
    assert_eq!(out.diagnostics.active_constraints, 2);
}

#[test]
// Purpose
// -------
// With `max_steps = 1` the run stops at the first new iterate.
fn max_steps_one_stops_after_first_iterate() {
    // Arrange
    let target = array![10.0, -10.0, 5.0];
    let mut x = Theta::zeros(3);
    let opts = MinimizeOptions::default().with_max_steps(1).expect("valid limit");

    // Act
    let out = minimize(&mut quadratic(&target), &mut x, &opts).expect("stops cleanly");

    // Assert
    assert_eq!(out.termination, Termination::Stopped);
    assert!(out.diagnostics.iterations <= 1);
    assert!(out.message.starts_with("STOP"));
}

#[test]
// Purpose
// -------
// An always-true predicate stops at the first new iterate and the
// objective is never evaluated again afterwards.
//
// Expect
// ------
// - Exactly one iteration, `Termination::Stopped`.
// - The objective's own call count equals the routine's evaluation count.
fn always_true_predicate_stops_without_extra_evaluations() {
    // Arrange
    let target = array![1.0, 2.0];
    let calls = Cell::new(0usize);
    let mut inner = quadratic(&target);
    let mut counted = |x: &Theta, g: &mut Grad| {
        calls.set(calls.get() + 1);
        inner(x, g)
    };
    let polls = Cell::new(0usize);
    let stop: StopPredicate<'_> = &|_| {
        polls.set(polls.get() + 1);
        true
    };
    let opts = MinimizeOptions::default().with_stop(stop);
    let mut ws = Workspace::new(2, opts.corrections).expect("valid shape");
    let mut x = Theta::zeros(2);

    // Act
    let out = minimize_with(&mut counted, &mut x, &opts, &mut ws, ProjectedLbfgs)
        .expect("stops cleanly");

    // Assert
    assert_eq!(out.termination, Termination::Stopped);
    assert_eq!(out.diagnostics.iterations, 1);
    assert_eq!(polls.get(), 1);
    assert_eq!(calls.get(), ws.diagnostics().total_evaluations());
}

#[test]
// Purpose
// -------
// The predicate observes live diagnostics, so it can encode its own
// convergence rule.
fn predicate_sees_live_diagnostics() {
    // Arrange
    let target = array![3.0, -1.0, 2.0, 0.0];
    let stop: StopPredicate<'_> = &|d: &Diagnostics<'_>| d.projected_gradient_norm() < 1e-2;
    let opts = MinimizeOptions::default()
        .with_tolerances(Tolerances::new(0.0, 0.0).expect("zero disables both tests"))
        .with_stop(stop);
    let mut x = Theta::zeros(4);

    // Act
    let out = minimize(&mut quadratic(&target), &mut x, &opts).expect("stops cleanly");

    // Assert
    assert_eq!(out.termination, Termination::Stopped);
    assert!(out.diagnostics.projected_gradient_norm < 1e-2);
}

#[test]
// Purpose
// -------
// A gradient with the wrong sign makes every line search fail; the run
// ends with an abnormal-termination error carrying the last value.
fn sign_flipped_gradient_is_abnormal() {
    // Arrange
    let target = array![1.0, 1.0, 1.0];
    let mut inner = quadratic(&target);
    let mut flipped = |x: &Theta, g: &mut Grad| {
        let v = inner(x, g);
        g.mapv_inplace(|gi| -gi);
        v
    };
    let mut x = Theta::zeros(3);

    // Act
    let err = minimize(&mut flipped, &mut x, &MinimizeOptions::default())
        .expect_err("line search cannot succeed");

    // Assert
    assert_eq!(err.kind(), ErrorKind::Abnormal);
    match err {
        OptError::Abnormal { value, message } => {
            assert!(value.is_finite());
            assert!(message.starts_with("ABNORMAL"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
// Purpose
// -------
// Inconsistent or divergent objectives end in an abnormal-termination error
// instead of a reported convergence or an endless run.
//
// Given
// -----
// - f(x) = Σ x_i with a gradient that is always zero.
// - f(x) = -‖x‖² with its true gradient, no step limit.
//
// Expect
// ------
// - Both runs fail with `ErrorKind::Abnormal`; the first leaves `x` at the
//   start point.
fn inconsistent_and_divergent_objectives_are_abnormal() {
    // Arrange
    let mut zero_gradient = |x: &Theta, g: &mut Grad| {
        g.fill(0.0);
        x.sum()
    };
    let mut unbounded = |x: &Theta, g: &mut Grad| {
        g.assign(&(x * -2.0));
        -x.dot(x)
    };
    let opts = MinimizeOptions::default();

    // Act
    let mut x = array![1.0, 2.0];
    let flat = minimize(&mut zero_gradient, &mut x, &opts).expect_err("gradient contradicts f");
    let mut y = array![1.0, 2.0];
    let diverged = minimize(&mut unbounded, &mut y, &opts).expect_err("unbounded below");

    // Assert
    assert_eq!(flat.kind(), ErrorKind::Abnormal);
    assert_eq!(x, array![1.0, 2.0]);
    assert!(matches!(flat, OptError::Abnormal { value, .. } if value == 3.0));
    assert_eq!(diverged.kind(), ErrorKind::Abnormal);
    assert!(y.iter().all(|v| v.is_finite()));
}

#[test]
// Purpose
// -------
// Inputs the routine rejects surface as invalid-argument errors.
//
// Given
// -----
// - A non-finite objective at the starting point.
// - An empty box (lower > upper).
// - A lower-bound vector shorter than x.
//
// Expect
// ------
// - `SolverInput` with an `ERROR` message for the first two.
// - `BoundLengthMismatch` for the third; all classify as InvalidArgument.
fn invalid_inputs_are_rejected() {
    // Non-finite start.
    let mut x = array![1.0, 2.0];
    let mut nan_start = |_: &Theta, g: &mut Grad| {
        g.fill(0.0);
        f64::NAN
    };
    let err = minimize(&mut nan_start, &mut x, &MinimizeOptions::default())
        .expect_err("NaN start must be rejected");
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(matches!(&err, OptError::SolverInput { message } if message.starts_with("ERROR")));

    // Infeasible box.
    let target = array![0.0, 0.0];
    let lower = array![0.0, 2.0];
    let upper = array![1.0, 1.0];
    let opts = MinimizeOptions::default()
        .with_bounds(Bounds::new(Some(lower.view()), Some(upper.view())));
    let err = minimize(&mut quadratic(&target), &mut x, &opts).expect_err("empty box");
    assert_eq!(
        err,
        OptError::SolverInput { message: "ERROR: NO FEASIBLE SOLUTION".to_string() }
    );
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    // Short bound vector.
    let short = array![0.0];
    let opts = MinimizeOptions::default().with_bounds(Bounds::none().with_lower(short.view()));
    let err = minimize(&mut quadratic(&target), &mut x, &opts).expect_err("short lower");
    assert!(matches!(err, OptError::BoundLengthMismatch { expected: 2, found: 1, .. }));
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
// Purpose
// -------
// Objective failures raised mid-run propagate unchanged.
fn objective_error_propagates() {
    struct FailsAfter {
        remaining: usize,
    }

    impl Objective for FailsAfter {
        fn evaluate(&mut self, x: &Theta, grad: &mut Grad) -> OptResult<f64> {
            if self.remaining == 0 {
                return Err(OptError::Objective { text: "budget exhausted".to_string() });
            }
            self.remaining -= 1;
            grad.assign(&(x * 2.0 - 2.0));
            Ok((x - 1.0).mapv(|r| r * r).sum())
        }
    }

    let mut x = array![10.0, -10.0];
    let err = minimize(&mut FailsAfter { remaining: 2 }, &mut x, &MinimizeOptions::default())
        .expect_err("objective gives up");
    assert_eq!(err, OptError::Objective { text: "budget exhausted".to_string() });
    assert_eq!(err.kind(), ErrorKind::Objective);
}

#[test]
// Purpose
// -------
// One workspace serves several smaller runs; a larger problem yields a
// resize hint that sizes a workspace which then succeeds.
//
// Expect
// ------
// - Runs with n = 4 and n = 2 on a workspace built for n = 6 converge.
// - n = 20 fails with `Resize`; a workspace built from `required_n` works.
fn workspace_reuse_and_resize() {
    // Arrange
    let opts = MinimizeOptions::default().with_corrections(5).expect("valid depth");
    let mut ws = Workspace::new(6, 5).expect("valid shape");

    // Act / Assert: reuse for smaller problems.
    for n in [4usize, 2] {
        let target = Array1::from_iter((0..n).map(|i| i as f64 - 1.0));
        let mut x = Theta::zeros(n);
        let out = minimize_with(&mut quadratic(&target), &mut x, &opts, &mut ws, ProjectedLbfgs)
            .expect("fits in workspace");
        assert!(out.converged(), "n={n}");
    }

    // Act / Assert: too large.
    let target = Array1::from_elem(20, 0.5);
    let mut x = Theta::zeros(20);
    let err = minimize_with(&mut quadratic(&target), &mut x, &opts, &mut ws, ProjectedLbfgs)
        .expect_err("n = 20 does not fit");
    assert_eq!(err.kind(), ErrorKind::Resize);
    let required = err.required_n().expect("resize carries a hint");
    assert!(required >= 20);

    let mut bigger = Workspace::new(required, 5).expect("valid shape");
    let mut routine = ProjectedLbfgs::new();
    let out = minimize_with(&mut quadratic(&target), &mut x, &opts, &mut bigger, &mut routine)
        .expect("resized workspace fits");
    assert!(out.converged());
}

#[test]
// Purpose
// -------
// Reading diagnostics twice without stepping yields identical values, and
// the outcome's snapshot matches the workspace after the run.
fn diagnostics_are_idempotent() {
    // Arrange
    let target = array![0.3, -0.7, 1.1];
    let opts = MinimizeOptions::default();
    let mut ws = Workspace::new(3, opts.corrections).expect("valid shape");
    let mut x = Theta::zeros(3);

    // Act
    let out = minimize_with(&mut quadratic(&target), &mut x, &opts, &mut ws, ProjectedLbfgs)
        .expect("converges");

    // Assert
    let first = ws.diagnostics().snapshot();
    let second = ws.diagnostics().snapshot();
    assert_eq!(first, second);
    assert_eq!(first, out.diagnostics);
    assert_eq!(ws.diagnostics().iterations(), out.diagnostics.iterations);
    assert!(first.total_evaluations >= first.iterations + 1);
}

#[test]
// Purpose
// -------
// The built-in routine agrees with `argmin`'s L-BFGS (More–Thuente line
// search) on the Rosenbrock function from the classic start (-1.2, 1).
//
// Expect
// ------
// - Both solvers reach the minimizer (1, 1) and agree within 1e-4.
fn rosenbrock_matches_argmin_reference() {
    // Arrange
    let x0 = array![-1.2, 1.0];
    let opts = MinimizeOptions::default()
        .with_tolerances(Tolerances::new(10.0, 1e-8).expect("valid tolerances"))
        .with_max_steps(1000)
        .expect("valid limit");
    let mut x = x0.clone();

    // Act
    let out = minimize(&mut rosenbrock, &mut x, &opts).expect("rosenbrock converges");

    let solver = LBFGS::new(MoreThuenteLineSearch::new(), 7);
    let reference = Executor::new(RosenbrockProblem, solver)
        .configure(|state| state.param(x0).max_iters(500))
        .run()
        .expect("argmin run succeeds");
    let x_ref = reference.state().get_best_param().expect("argmin keeps a best param").clone();

    // Assert
    assert!(out.converged(), "message: {}", out.message);
    for i in 0..2 {
        assert_abs_diff_eq!(x[i], 1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(x[i], x_ref[i], epsilon = 1e-4);
    }
    assert_abs_diff_eq!(out.value, 0.0, epsilon = 1e-6);
}
