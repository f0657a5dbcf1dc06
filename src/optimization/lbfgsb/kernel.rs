//! ProjectedLbfgs — built-in reverse-communication step routine.
//!
//! Purpose
//! -------
//! Provide a self-contained [`StepRoutine`] so the driver works without a
//! native L-BFGS-B library. The routine is a projected limited-memory BFGS
//! method: a masked two-loop recursion on the free variables, followed by a
//! projected Armijo backtracking search along the box.
//!
//! Key behaviors
//! -------------
//! - Keeps no state in `self`; everything lives in the workspace buffers
//!   handed to each call, so a run can be resumed on any instance.
//! - Emits the standard task strings (`FG_START`, `FG_LNSRCH`, `NEW_X`,
//!   `CONVERGENCE: ...`, `ABNORMAL...`, `ERROR: ...`).
//! - Writes counters, norms and timings to the documented save-array slots
//!   read by [`crate::optimization::lbfgsb::diagnostics::Diagnostics`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Scratch layout inside `wa` for `(n, m)`:
//!   `S[m·n] | Y[m·n] | x0[n] | g0[n] | d[n] | r[n] | rho[m] | alpha[m] | …`.
//! - `iwa[..n]` holds the free-variable flags of the current iteration.
//! - Correction pairs live in a ring of `m` slots; `isave` private slots
//!   track its length and write position.
//! - Every accepted iterate lies inside the box.
//! - A non-finite value or gradient ends the run: at the start point as an
//!   input error, anywhere else as an abnormal exit at the last accepted
//!   point.
//! - A start point whose gradient is exactly zero is only reported as
//!   converged after a central difference of `f` around it agrees.
//!
//! Conventions
//! -----------
//! - Verbosity follows the classic `iprint` levels: `< 0` silent, `0` one
//!   line at termination, `k > 0` a progress line every `k` iterations,
//!   `≥ 99` a line per evaluation. Output goes through `tracing`.
use std::time::Instant;

use ndarray::{ArrayView1, ArrayViewMut1, Zip};
use tracing::{debug, info};

use crate::optimization::lbfgsb::{
    bounds::{BoundaryCode, EncodedBounds},
    diagnostics::{
        D_CAUCHY_TIME, D_DIRECTION_NORM, D_EPSILON, D_FACTR_TOL, D_INITIAL_SLOPE,
        D_LINE_SEARCH_TIME, D_MAX_STEP, D_PREVIOUS_VALUE, D_PROJ_GRAD_NORM, D_SLOPE, D_STEP,
        D_SUBSPACE_TIME, D_THETA, I_ACTIVE_CONSTRAINTS, I_CURRENT_CAUCHY_INTERVALS,
        I_CURRENT_EVALS, I_FREE_VARIABLES, I_ITERATIONS, I_SKIPPED_UPDATES,
        I_TOTAL_CAUCHY_INTERVALS, I_TOTAL_EVALS, I_UPDATES, L_BOXED, L_CONSTRAINED,
        L_PROJECTED_START,
    },
    status::Task,
    step::{StepBuffers, StepCall, StepRoutine},
    types::{Grad, Theta},
};

// ---- Private save-array slots ----

const P_PHASE: usize = 0;
const P_PAIRS: usize = 1;
const P_NEXT: usize = 2;
const P_BACKTRACKS: usize = 3;
const DP_F0: usize = 15;
const DP_F_PLUS: usize = 16;

const PHASE_START_EVAL: i32 = 1;
const PHASE_LINE_SEARCH: i32 = 2;
const PHASE_NEW_X: i32 = 3;
const PHASE_CHECK_PLUS: i32 = 4;
const PHASE_CHECK_MINUS: i32 = 5;

// ---- Line-search constants ----

const ARMIJO_C1: f64 = 1e-4;
const MAX_BACKTRACKS: i32 = 20;
const MIN_STEP: f64 = 1e-20;
const BIG: f64 = 1e10;

// ---- Zero-gradient check ----

/// Relative half-width of the central difference taken around a start
/// point whose gradient is exactly zero.
const CHECK_STEP: f64 = 1e-4;

// ---- Task texts ----

const TASK_FG_START: &str = "FG_START";
const TASK_FG_LNSRCH: &str = "FG_LNSRCH";
const TASK_NEW_X: &str = "NEW_X";
const TASK_CONV_PGTOL: &str = "CONVERGENCE: NORM_OF_PROJECTED_GRADIENT_<=_PGTOL";
const TASK_CONV_FACTR: &str = "CONVERGENCE: REL_REDUCTION_OF_F_<=_FACTR*EPSMCH";
const TASK_ABNORMAL: &str = "ABNORMAL_TERMINATION_IN_LNSRCH";
const TASK_ABNORMAL_NOT_FINITE: &str = "ABNORMAL: F OR G IS NOT FINITE AT A TRIAL POINT";
const TASK_ABNORMAL_GRADIENT: &str = "ABNORMAL: GRADIENT INCONSISTENT WITH FUNCTION VALUES";

/// Projected two-loop L-BFGS with Armijo backtracking.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectedLbfgs;

impl ProjectedLbfgs {
    pub fn new() -> Self {
        Self
    }
}

impl StepRoutine for ProjectedLbfgs {
    fn step(&mut self, call: StepCall<'_, '_>) {
        let StepCall { m, x, bounds, f, g, factr, pgtol, verbosity, buffers } = call;
        let mut kernel = Kernel { m, bounds, factr, pgtol, verbosity, b: buffers };
        match Task::decode(kernel.b.task) {
            Some(Task::Start) if kernel.b.task.starts_with("START") => kernel.start(x),
            Some(Task::FunctionGradient) => kernel.after_evaluation(x, f, g),
            Some(Task::NewIterate) => kernel.after_new_x(x, f, g),
            // Terminal states and a caller-written STOP are left as they are.
            _ => {}
        }
    }
}

// ---- Kernel state for one call ----

struct Kernel<'a, 'b> {
    m: usize,
    bounds: &'a EncodedBounds<'b>,
    factr: f64,
    pgtol: f64,
    verbosity: i32,
    b: StepBuffers<'a>,
}

/// Named views into `wa`.
struct Scratch<'w> {
    s: &'w mut [f64],
    y: &'w mut [f64],
    x0: &'w mut [f64],
    g0: &'w mut [f64],
    d: &'w mut [f64],
    r: &'w mut [f64],
    rho: &'w mut [f64],
    alpha: &'w mut [f64],
}

fn split_scratch(wa: &mut [f64], n: usize, m: usize) -> Scratch<'_> {
    let (s, rest) = wa.split_at_mut(m * n);
    let (y, rest) = rest.split_at_mut(m * n);
    let (x0, rest) = rest.split_at_mut(n);
    let (g0, rest) = rest.split_at_mut(n);
    let (d, rest) = rest.split_at_mut(n);
    let (r, rest) = rest.split_at_mut(n);
    let (rho, rest) = rest.split_at_mut(m);
    let (alpha, _) = rest.split_at_mut(m);
    Scratch { s, y, x0, g0, d, r, rho, alpha }
}

impl Kernel<'_, '_> {
    // ---- Phase handlers ----

    fn start(&mut self, x: &mut Theta) {
        let n = x.len();
        self.b.lsave.fill(0);
        self.b.isave.fill(0);
        self.b.dsave.fill(0.0);
        self.b.csave.set("");

        if let Some(msg) = self.input_error(n) {
            self.finish(msg, f64::NAN);
            return;
        }

        let codes = self.bounds.codes();
        self.b.lsave[L_CONSTRAINED] = i32::from(self.bounds.is_constrained());
        self.b.lsave[L_BOXED] = i32::from(codes.iter().all(|&c| c == BoundaryCode::Both));
        let moved = project_into(x.view_mut(), self.bounds);
        self.b.lsave[L_PROJECTED_START] = i32::from(moved);

        self.b.dsave[D_EPSILON] = f64::EPSILON;
        self.b.dsave[D_FACTR_TOL] = self.factr * f64::EPSILON;
        self.b.dsave[D_THETA] = 1.0;
        self.b.isave[P_PHASE] = PHASE_START_EVAL;
        self.b.task.set(TASK_FG_START);
    }

    fn after_evaluation(&mut self, x: &mut Theta, f: &mut f64, g: &mut Grad) {
        self.b.isave[I_TOTAL_EVALS] += 1;
        self.b.isave[I_CURRENT_EVALS] += 1;
        if self.verbosity >= 99 {
            debug!(evaluation = self.b.isave[I_TOTAL_EVALS], value = *f, "objective evaluated");
        }

        match self.b.isave[P_PHASE] {
            PHASE_START_EVAL => {
                if !f.is_finite() || g.iter().any(|v| !v.is_finite()) {
                    self.finish("ERROR: F OR G IS NOT FINITE AT THE STARTING POINT", *f);
                    return;
                }
                let pg = projected_grad_norm(x.view(), g.view(), self.bounds);
                self.b.dsave[D_PROJ_GRAD_NORM] = pg;
                if pg <= self.pgtol {
                    if g.iter().all(|&v| v == 0.0) && self.begin_gradient_check(x, *f, g) {
                        return;
                    }
                    self.finish(TASK_CONV_PGTOL, *f);
                    return;
                }
                self.begin_iteration(x, *f, g, false);
            }
            PHASE_LINE_SEARCH => self.line_search(x, f, g),
            PHASE_CHECK_PLUS => {
                self.b.dsave[DP_F_PLUS] = *f;
                let sc = split_scratch(self.b.wa, x.len(), self.m);
                trial_point(x, sc.x0, sc.d, -1.0, self.bounds);
                self.b.isave[P_PHASE] = PHASE_CHECK_MINUS;
                self.b.task.set(TASK_FG_START);
            }
            PHASE_CHECK_MINUS => self.end_gradient_check(x, f, g),
            _ => self.finish("ERROR: EVALUATION REQUESTED OUT OF SEQUENCE", *f),
        }
    }

    fn after_new_x(&mut self, x: &mut Theta, f: &mut f64, g: &mut Grad) {
        if self.b.isave[P_PHASE] != PHASE_NEW_X {
            self.finish("ERROR: NEW_X RECEIVED OUT OF SEQUENCE", *f);
            return;
        }
        if self.b.dsave[D_PROJ_GRAD_NORM] <= self.pgtol {
            self.finish(TASK_CONV_PGTOL, *f);
            return;
        }
        let fold = self.b.dsave[D_PREVIOUS_VALUE];
        let scale = fold.abs().max(f.abs()).max(1.0);
        if fold - *f <= self.b.dsave[D_FACTR_TOL] * scale {
            self.finish(TASK_CONV_FACTR, *f);
            return;
        }
        self.begin_iteration(x, *f, g, false);
    }

    // ---- Zero-gradient check ----

    /// Start a central difference `f(x ± h)` around a start point whose
    /// gradient is exactly zero. Coordinates without room for `±h` inside
    /// the box are left out; returns `false` when none has room.
    fn begin_gradient_check(&mut self, x: &mut Theta, f: f64, g: &Grad) -> bool {
        let n = x.len();
        let bounds = self.bounds;
        let (lower, upper) = (bounds.lower(), bounds.upper());
        let sc = split_scratch(self.b.wa, n, self.m);
        let mut any = false;
        for (i, &code) in bounds.codes().iter().enumerate() {
            let h = CHECK_STEP * x[i].abs().max(1.0);
            let room_up = !code.has_upper() || x[i] + h <= upper[i];
            let room_down = !code.has_lower() || x[i] - h >= lower[i];
            sc.d[i] = if room_up && room_down { h } else { 0.0 };
            any |= sc.d[i] != 0.0;
            sc.x0[i] = x[i];
            sc.g0[i] = g[i];
        }
        if !any {
            return false;
        }
        self.b.dsave[DP_F0] = f;
        trial_point(x, sc.x0, sc.d, 1.0, bounds);
        self.b.isave[P_PHASE] = PHASE_CHECK_PLUS;
        self.b.task.set(TASK_FG_START);
        true
    }

    /// Compare the odd part of the central difference, which a zero
    /// gradient predicts to vanish to first order, against its even part.
    /// Restores the start point either way.
    fn end_gradient_check(&mut self, x: &mut Theta, f: &mut f64, g: &mut Grad) {
        let f_plus = self.b.dsave[DP_F_PLUS];
        let f_minus = *f;
        self.restore_saved_point(x, f, g);
        let f0 = *f;

        let odd = 0.5 * (f_plus - f_minus);
        let even = 0.5 * (f_plus + f_minus) - f0;
        let tol = f64::EPSILON.sqrt() * f0.abs().max(1.0);
        let consistent =
            odd.is_finite() && even.is_finite() && (odd.abs() <= tol || odd.abs() <= even.abs());
        if consistent {
            self.finish(TASK_CONV_PGTOL, f0);
        } else {
            debug!(odd, even, "function changes to first order at a zero gradient");
            self.finish(TASK_ABNORMAL_GRADIENT, f0);
        }
    }

    // ---- Iteration ----

    /// Pick the free set and direction at the accepted point `(x, f, g)`,
    /// then request the first trial point of the line search.
    ///
    /// The first trial step is `1/‖d‖` on the first iteration and after a
    /// restart, and `1` otherwise.
    fn begin_iteration(&mut self, x: &mut Theta, f: f64, g: &Grad, mut restart: bool) {
        let n = x.len();
        let m = self.m;

        let clock = Instant::now();
        let (free, intervals) = self.mark_free_set(x.view(), g.view());
        self.b.isave[I_FREE_VARIABLES] = free as i32;
        self.b.isave[I_ACTIVE_CONSTRAINTS] = (n - free) as i32;
        self.b.isave[I_CURRENT_CAUCHY_INTERVALS] = intervals as i32;
        self.b.isave[I_TOTAL_CAUCHY_INTERVALS] += intervals as i32;
        self.b.dsave[D_CAUCHY_TIME] += clock.elapsed().as_secs_f64();

        let clock = Instant::now();
        let pairs = self.b.isave[P_PAIRS] as usize;
        let next = self.b.isave[P_NEXT] as usize;
        let theta = if pairs > 0 { self.b.dsave[D_THETA] } else { 1.0 };
        let mut sc = split_scratch(self.b.wa, n, m);
        let mask = &self.b.iwa[..n];
        let mut gtd = two_loop_direction(&mut sc, g.view(), mask, pairs, next, m, theta);
        if !(gtd < 0.0) {
            // Not a descent direction: fall back to projected steepest descent.
            self.b.isave[P_PAIRS] = 0;
            self.b.isave[P_NEXT] = 0;
            self.b.dsave[D_THETA] = 1.0;
            restart = true;
            let sc = split_scratch(self.b.wa, n, m);
            gtd = 0.0;
            for i in 0..n {
                sc.d[i] = if mask[i] != 0 { -g[i] } else { 0.0 };
                gtd += g[i] * sc.d[i];
            }
        }
        self.b.dsave[D_SUBSPACE_TIME] += clock.elapsed().as_secs_f64();

        let sc = split_scratch(self.b.wa, n, m);
        let d = ArrayView1::from(&*sc.d);
        let dnorm = d.dot(&d).sqrt();
        let stpmx = max_feasible_step(x.view(), d, self.bounds);
        let stp = if restart || self.b.isave[I_ITERATIONS] == 0 { 1.0 / dnorm } else { 1.0 };

        for i in 0..n {
            sc.x0[i] = x[i];
            sc.g0[i] = g[i];
        }
        self.b.dsave[DP_F0] = f;
        self.b.dsave[D_DIRECTION_NORM] = dnorm;
        self.b.dsave[D_MAX_STEP] = stpmx.min(BIG);
        self.b.dsave[D_STEP] = stp;
        self.b.dsave[D_INITIAL_SLOPE] = gtd;
        self.b.dsave[D_SLOPE] = gtd;
        self.b.isave[I_CURRENT_EVALS] = 0;
        self.b.isave[P_BACKTRACKS] = 0;

        let sc = split_scratch(self.b.wa, n, m);
        trial_point(x, sc.x0, sc.d, stp, self.bounds);
        self.b.isave[P_PHASE] = PHASE_LINE_SEARCH;
        self.b.task.set(TASK_FG_LNSRCH);
    }

    /// Projected Armijo test at the trial point; accept, backtrack, restart,
    /// or give up.
    fn line_search(&mut self, x: &mut Theta, f: &mut f64, g: &mut Grad) {
        let clock = Instant::now();
        let n = x.len();
        let m = self.m;
        let f0 = self.b.dsave[DP_F0];
        let stp = self.b.dsave[D_STEP];
        let gtd0 = self.b.dsave[D_INITIAL_SLOPE];

        let sc = split_scratch(self.b.wa, n, m);
        let mut moved_slope = 0.0;
        let mut slope = 0.0;
        for i in 0..n {
            moved_slope += sc.g0[i] * (x[i] - sc.x0[i]);
            slope += g[i] * sc.d[i];
        }
        self.b.dsave[D_SLOPE] = slope;

        if !f.is_finite() || g.iter().any(|v| !v.is_finite()) {
            self.restore_saved_point(x, f, g);
            self.finish(TASK_ABNORMAL_NOT_FINITE, f0);
            self.b.dsave[D_LINE_SEARCH_TIME] += clock.elapsed().as_secs_f64();
            return;
        }
        let accepted = moved_slope < 0.0 && *f <= f0 + ARMIJO_C1 * moved_slope;

        if accepted {
            self.accept(x, *f, g);
        } else {
            self.b.isave[P_BACKTRACKS] += 1;
            if self.b.isave[P_BACKTRACKS] >= MAX_BACKTRACKS || stp < MIN_STEP {
                self.restore_saved_point(x, f, g);
                if self.b.isave[P_PAIRS] > 0 {
                    debug!(
                        iteration = self.b.isave[I_ITERATIONS],
                        "line search failed; dropping corrections"
                    );
                    self.b.isave[P_PAIRS] = 0;
                    self.b.isave[P_NEXT] = 0;
                    self.b.dsave[D_THETA] = 1.0;
                    self.begin_iteration(x, f0, g, true);
                } else {
                    self.finish(TASK_ABNORMAL, f0);
                }
            } else {
                let denom = 2.0 * (*f - f0 - stp * gtd0);
                let cand = if denom > 0.0 { -gtd0 * stp * stp / denom } else { 0.5 * stp };
                let next_stp = cand.clamp(0.1 * stp, 0.5 * stp);
                self.b.dsave[D_STEP] = next_stp;
                let sc = split_scratch(self.b.wa, n, m);
                trial_point(x, sc.x0, sc.d, next_stp, self.bounds);
                self.b.task.set(TASK_FG_LNSRCH);
            }
        }
        self.b.dsave[D_LINE_SEARCH_TIME] += clock.elapsed().as_secs_f64();
    }

    /// Store the correction pair and announce the new iterate.
    fn accept(&mut self, x: &Theta, f: f64, g: &Grad) {
        let n = x.len();
        let m = self.m;
        let next = self.b.isave[P_NEXT] as usize;
        let sc = split_scratch(self.b.wa, n, m);

        let slot = next * n..(next + 1) * n;
        let (mut sy, mut yy) = (0.0, 0.0);
        {
            let s = &mut sc.s[slot.clone()];
            let y = &mut sc.y[slot];
            for i in 0..n {
                s[i] = x[i] - sc.x0[i];
                y[i] = g[i] - sc.g0[i];
                sy += s[i] * y[i];
                yy += y[i] * y[i];
            }
        }
        if sy > f64::EPSILON * yy && sy > 0.0 {
            sc.rho[next] = 1.0 / sy;
            let pairs = (self.b.isave[P_PAIRS] as usize + 1).min(m);
            self.b.isave[P_PAIRS] = pairs as i32;
            self.b.isave[P_NEXT] = ((next + 1) % m) as i32;
            self.b.isave[I_UPDATES] += 1;
            self.b.dsave[D_THETA] = yy / sy;
        } else {
            self.b.isave[I_SKIPPED_UPDATES] += 1;
        }

        self.b.isave[I_ITERATIONS] += 1;
        self.b.dsave[D_PREVIOUS_VALUE] = self.b.dsave[DP_F0];
        let pg = projected_grad_norm(x.view(), g.view(), self.bounds);
        self.b.dsave[D_PROJ_GRAD_NORM] = pg;

        let iter = self.b.isave[I_ITERATIONS];
        if self.verbosity > 0 && iter % self.verbosity == 0 {
            info!(iteration = iter, value = f, projected_gradient = pg, "new iterate");
        }
        self.b.isave[P_PHASE] = PHASE_NEW_X;
        self.b.task.set(TASK_NEW_X);
    }

    // ---- Helper Methods ----

    /// Put back the point saved at the start of the line search or check.
    fn restore_saved_point(&mut self, x: &mut Theta, f: &mut f64, g: &mut Grad) {
        let n = x.len();
        let sc = split_scratch(self.b.wa, n, self.m);
        for i in 0..n {
            x[i] = sc.x0[i];
            g[i] = sc.g0[i];
        }
        *f = self.b.dsave[DP_F0];
    }

    fn input_error(&self, n: usize) -> Option<&'static str> {
        if n == 0 {
            return Some("ERROR: N .LE. 0");
        }
        if self.m == 0 {
            return Some("ERROR: M .LE. 0");
        }
        if !(self.factr >= 0.0) {
            return Some("ERROR: FACTR .LT. 0");
        }
        if !(self.pgtol >= 0.0) {
            return Some("ERROR: PGTOL .LT. 0");
        }
        let codes = self.bounds.codes();
        let (lower, upper) = (self.bounds.lower(), self.bounds.upper());
        if codes.len() != n
            || (codes.iter().any(|c| c.has_lower()) && lower.len() != n)
            || (codes.iter().any(|c| c.has_upper()) && upper.len() != n)
        {
            return Some("ERROR: INVALID NBD");
        }
        let infeasible =
            codes.iter().enumerate().any(|(i, &c)| c == BoundaryCode::Both && lower[i] > upper[i]);
        if infeasible {
            return Some("ERROR: NO FEASIBLE SOLUTION");
        }
        None
    }

    /// Flag free variables in `iwa` and count breakpoints of the projected
    /// steepest-descent path. Returns `(free, breakpoints)`.
    fn mark_free_set(&mut self, x: ArrayView1<'_, f64>, g: ArrayView1<'_, f64>) -> (usize, usize) {
        let codes = self.bounds.codes();
        let (lower, upper) = (self.bounds.lower(), self.bounds.upper());
        let mut free = 0;
        let mut breakpoints = 0;
        for (i, &code) in codes.iter().enumerate() {
            let at_lower = code.has_lower() && x[i] <= lower[i];
            let at_upper = code.has_upper() && x[i] >= upper[i];
            let fixed = (at_lower && g[i] > 0.0) || (at_upper && g[i] < 0.0);
            self.b.iwa[i] = i32::from(!fixed);
            if !fixed {
                free += 1;
            }
            let hits_lower = g[i] > 0.0 && code.has_lower() && x[i] > lower[i];
            let hits_upper = g[i] < 0.0 && code.has_upper() && x[i] < upper[i];
            if hits_lower || hits_upper {
                breakpoints += 1;
            }
        }
        (free, breakpoints)
    }

    /// Record a terminal task and log the summary line.
    fn finish(&mut self, task: &str, f: f64) {
        self.b.task.set(task);
        if self.verbosity >= 0 {
            info!(
                iterations = self.b.isave[I_ITERATIONS],
                evaluations = self.b.isave[I_TOTAL_EVALS],
                value = f,
                projected_gradient = self.b.dsave[D_PROJ_GRAD_NORM],
                status = task,
                "step routine finished"
            );
        }
    }
}

// ---- Numerical helpers ----

/// Masked two-loop recursion; writes `d = -H·g` on the free set into
/// `sc.d` and returns `g·d`. Fixed variables get a zero component.
fn two_loop_direction(
    sc: &mut Scratch<'_>, g: ArrayView1<'_, f64>, mask: &[i32], pairs: usize, next: usize,
    m: usize, theta: f64,
) -> f64 {
    let n = g.len();
    let slot = |k: usize| (next + m - pairs + k) % m;
    for i in 0..n {
        sc.r[i] = if mask[i] != 0 { g[i] } else { 0.0 };
    }

    for k in (0..pairs).rev() {
        let j = slot(k);
        let s = &sc.s[j * n..(j + 1) * n];
        let y = &sc.y[j * n..(j + 1) * n];
        let a = sc.rho[j] * masked_dot(s, &*sc.r, mask);
        sc.alpha[j] = a;
        for i in 0..n {
            if mask[i] != 0 {
                sc.r[i] -= a * y[i];
            }
        }
    }
    for ri in sc.r.iter_mut() {
        *ri /= theta;
    }
    for k in 0..pairs {
        let j = slot(k);
        let s = &sc.s[j * n..(j + 1) * n];
        let y = &sc.y[j * n..(j + 1) * n];
        let beta = sc.rho[j] * masked_dot(y, &*sc.r, mask);
        for i in 0..n {
            if mask[i] != 0 {
                sc.r[i] += (sc.alpha[j] - beta) * s[i];
            }
        }
    }

    let mut gtd = 0.0;
    for i in 0..n {
        sc.d[i] = -sc.r[i];
        gtd += g[i] * sc.d[i];
    }
    gtd
}

fn masked_dot(a: &[f64], b: &[f64], mask: &[i32]) -> f64 {
    a.iter().zip(b).zip(mask).filter(|(_, &f)| f != 0).map(|((x, y), _)| x * y).sum()
}

/// Clamp `x` into the box; returns `true` if any entry moved.
fn project_into(mut x: ArrayViewMut1<'_, f64>, bounds: &EncodedBounds<'_>) -> bool {
    let (lower, upper) = (bounds.lower(), bounds.upper());
    let mut moved = false;
    for (i, &code) in bounds.codes().iter().enumerate() {
        let before = x[i];
        if code.has_lower() && x[i] < lower[i] {
            x[i] = lower[i];
        }
        if code.has_upper() && x[i] > upper[i] {
            x[i] = upper[i];
        }
        moved |= x[i] != before;
    }
    moved
}

/// `x = P(x0 + stp·d)`.
fn trial_point(x: &mut Theta, x0: &[f64], d: &[f64], stp: f64, bounds: &EncodedBounds<'_>) {
    Zip::from(x.view_mut()).and(ArrayView1::from(x0)).and(ArrayView1::from(d)).for_each(
        |xi, &x0i, &di| {
            *xi = x0i + stp * di;
        },
    );
    project_into(x.view_mut(), bounds);
}

/// ∞-norm of the projected gradient.
fn projected_grad_norm(
    x: ArrayView1<'_, f64>, g: ArrayView1<'_, f64>, bounds: &EncodedBounds<'_>,
) -> f64 {
    let (lower, upper) = (bounds.lower(), bounds.upper());
    let mut norm = 0.0f64;
    for (i, &code) in bounds.codes().iter().enumerate() {
        let mut gi = g[i];
        if gi < 0.0 {
            if code.has_upper() {
                gi = gi.max(x[i] - upper[i]);
            }
        } else if code.has_lower() {
            gi = gi.min(x[i] - lower[i]);
        }
        norm = norm.max(gi.abs());
    }
    norm
}

/// Largest `t` with `x + t·d` inside the box (∞ if unbounded).
fn max_feasible_step(
    x: ArrayView1<'_, f64>, d: ArrayView1<'_, f64>, bounds: &EncodedBounds<'_>,
) -> f64 {
    let (lower, upper) = (bounds.lower(), bounds.upper());
    let mut amax = f64::INFINITY;
    for (i, &code) in bounds.codes().iter().enumerate() {
        if d[i] > 0.0 && code.has_upper() {
            amax = amax.min((upper[i] - x[i]) / d[i]);
        } else if d[i] < 0.0 && code.has_lower() {
            amax = amax.min((lower[i] - x[i]) / d[i]);
        }
    }
    amax.max(0.0)
}
