//! Diagnostics — read-only accessors over a workspace's save arrays.
//!
//! Purpose
//! -------
//! Expose the counters, norms, and timings a step routine keeps in `lsave`,
//! `isave`, and `dsave` under descriptive names, so callers (and stop
//! predicates) never index the save arrays directly.
//!
//! Key behaviors
//! -------------
//! - [`Diagnostics`] borrows the arrays; every accessor is O(1) and pure.
//! - [`Diagnostics::snapshot`] copies all fields into an owned
//!   [`DiagnosticsSnapshot`] that outlives the workspace borrow.
//!
//! Invariants & assumptions
//! ------------------------
//! - Values are meaningful only after the first step; before that they read
//!   as zeros.
//! - Slot offsets follow the L-BFGS-B save-array layout; they are
//!   crate-private and shared only with the built-in step routine.

// ---- Save-array offsets (0-based) ----

pub(crate) const L_PROJECTED_START: usize = 0;
pub(crate) const L_CONSTRAINED: usize = 1;
pub(crate) const L_BOXED: usize = 2;

pub(crate) const I_TOTAL_CAUCHY_INTERVALS: usize = 21;
pub(crate) const I_SKIPPED_UPDATES: usize = 25;
pub(crate) const I_ITERATIONS: usize = 29;
pub(crate) const I_UPDATES: usize = 30;
pub(crate) const I_CURRENT_CAUCHY_INTERVALS: usize = 32;
pub(crate) const I_TOTAL_EVALS: usize = 33;
pub(crate) const I_CURRENT_EVALS: usize = 35;
pub(crate) const I_FREE_VARIABLES: usize = 37;
pub(crate) const I_ACTIVE_CONSTRAINTS: usize = 38;

pub(crate) const D_THETA: usize = 0;
pub(crate) const D_PREVIOUS_VALUE: usize = 1;
pub(crate) const D_FACTR_TOL: usize = 2;
pub(crate) const D_DIRECTION_NORM: usize = 3;
pub(crate) const D_EPSILON: usize = 4;
pub(crate) const D_CAUCHY_TIME: usize = 6;
pub(crate) const D_SUBSPACE_TIME: usize = 7;
pub(crate) const D_LINE_SEARCH_TIME: usize = 8;
pub(crate) const D_SLOPE: usize = 10;
pub(crate) const D_MAX_STEP: usize = 11;
pub(crate) const D_PROJ_GRAD_NORM: usize = 12;
pub(crate) const D_STEP: usize = 13;
pub(crate) const D_INITIAL_SLOPE: usize = 14;

/// Borrowed view over the save arrays of a workspace.
#[derive(Debug, Clone, Copy)]
pub struct Diagnostics<'a> {
    lsave: &'a [i32],
    isave: &'a [i32],
    dsave: &'a [f64],
}

impl<'a> Diagnostics<'a> {
    pub(crate) fn new(lsave: &'a [i32], isave: &'a [i32], dsave: &'a [f64]) -> Self {
        Self { lsave, isave, dsave }
    }

    /// The initial point was outside the box and has been projected.
    pub fn projected_initial_point(&self) -> bool {
        self.lsave[L_PROJECTED_START] != 0
    }

    /// At least one variable carries a bound.
    pub fn is_constrained(&self) -> bool {
        self.lsave[L_CONSTRAINED] != 0
    }

    /// Every variable has both a lower and an upper bound.
    pub fn is_fully_boxed(&self) -> bool {
        self.lsave[L_BOXED] != 0
    }

    /// Breakpoint intervals explored while locating Cauchy points, all iterations.
    pub fn total_cauchy_intervals(&self) -> usize {
        self.count(I_TOTAL_CAUCHY_INTERVALS)
    }

    /// Quasi-Newton updates skipped for lack of positive curvature.
    pub fn skipped_updates(&self) -> usize {
        self.count(I_SKIPPED_UPDATES)
    }

    /// Accepted iterates so far.
    pub fn iterations(&self) -> usize {
        self.count(I_ITERATIONS)
    }

    /// Correction pairs stored so far.
    pub fn updates(&self) -> usize {
        self.count(I_UPDATES)
    }

    /// Breakpoint intervals explored in the current iteration.
    pub fn current_cauchy_intervals(&self) -> usize {
        self.count(I_CURRENT_CAUCHY_INTERVALS)
    }

    /// Function/gradient evaluations over the whole run.
    pub fn total_evaluations(&self) -> usize {
        self.count(I_TOTAL_EVALS)
    }

    /// Function/gradient evaluations in the current line search.
    pub fn current_evaluations(&self) -> usize {
        self.count(I_CURRENT_EVALS)
    }

    pub fn free_variables(&self) -> usize {
        self.count(I_FREE_VARIABLES)
    }

    pub fn active_constraints(&self) -> usize {
        self.count(I_ACTIVE_CONSTRAINTS)
    }

    /// Scaling of the quasi-Newton matrix.
    pub fn theta(&self) -> f64 {
        self.dsave[D_THETA]
    }

    /// Objective value at the previous accepted iterate.
    pub fn previous_value(&self) -> f64 {
        self.dsave[D_PREVIOUS_VALUE]
    }

    /// `factr · ε`, the relative-reduction threshold in use.
    pub fn factr_tolerance(&self) -> f64 {
        self.dsave[D_FACTR_TOL]
    }

    /// 2-norm of the current search direction.
    pub fn direction_norm(&self) -> f64 {
        self.dsave[D_DIRECTION_NORM]
    }

    pub fn machine_epsilon(&self) -> f64 {
        self.dsave[D_EPSILON]
    }

    /// Seconds spent locating Cauchy points.
    pub fn cauchy_time(&self) -> f64 {
        self.dsave[D_CAUCHY_TIME]
    }

    /// Seconds spent in subspace minimization.
    pub fn subspace_time(&self) -> f64 {
        self.dsave[D_SUBSPACE_TIME]
    }

    /// Seconds spent in the line search.
    pub fn line_search_time(&self) -> f64 {
        self.dsave[D_LINE_SEARCH_TIME]
    }

    /// Directional derivative at the current trial point.
    pub fn slope(&self) -> f64 {
        self.dsave[D_SLOPE]
    }

    /// Directional derivative at the start of the line search.
    pub fn initial_slope(&self) -> f64 {
        self.dsave[D_INITIAL_SLOPE]
    }

    /// Largest feasible step along the current direction.
    pub fn max_step(&self) -> f64 {
        self.dsave[D_MAX_STEP]
    }

    /// Current step length in the line search.
    pub fn step_length(&self) -> f64 {
        self.dsave[D_STEP]
    }

    /// ∞-norm of the projected gradient at the latest iterate.
    pub fn projected_gradient_norm(&self) -> f64 {
        self.dsave[D_PROJ_GRAD_NORM]
    }

    /// Copy every field into an owned snapshot.
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            projected_initial_point: self.projected_initial_point(),
            is_constrained: self.is_constrained(),
            is_fully_boxed: self.is_fully_boxed(),
            total_cauchy_intervals: self.total_cauchy_intervals(),
            skipped_updates: self.skipped_updates(),
            iterations: self.iterations(),
            updates: self.updates(),
            current_cauchy_intervals: self.current_cauchy_intervals(),
            total_evaluations: self.total_evaluations(),
            current_evaluations: self.current_evaluations(),
            free_variables: self.free_variables(),
            active_constraints: self.active_constraints(),
            theta: self.theta(),
            previous_value: self.previous_value(),
            factr_tolerance: self.factr_tolerance(),
            direction_norm: self.direction_norm(),
            machine_epsilon: self.machine_epsilon(),
            cauchy_time: self.cauchy_time(),
            subspace_time: self.subspace_time(),
            line_search_time: self.line_search_time(),
            slope: self.slope(),
            initial_slope: self.initial_slope(),
            max_step: self.max_step(),
            step_length: self.step_length(),
            projected_gradient_norm: self.projected_gradient_norm(),
        }
    }

    // ---- Helper Methods ----

    fn count(&self, slot: usize) -> usize {
        usize::try_from(self.isave[slot]).unwrap_or(0)
    }
}

/// Owned copy of [`Diagnostics`], detached from the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DiagnosticsSnapshot {
    pub projected_initial_point: bool,
    pub is_constrained: bool,
    pub is_fully_boxed: bool,
    pub total_cauchy_intervals: usize,
    pub skipped_updates: usize,
    pub iterations: usize,
    pub updates: usize,
    pub current_cauchy_intervals: usize,
    pub total_evaluations: usize,
    pub current_evaluations: usize,
    pub free_variables: usize,
    pub active_constraints: usize,
    pub theta: f64,
    pub previous_value: f64,
    pub factr_tolerance: f64,
    pub direction_norm: f64,
    pub machine_epsilon: f64,
    pub cauchy_time: f64,
    pub subspace_time: f64,
    pub line_search_time: f64,
    pub slope: f64,
    pub initial_slope: f64,
    pub max_step: f64,
    pub step_length: f64,
    pub projected_gradient_norm: f64,
}
