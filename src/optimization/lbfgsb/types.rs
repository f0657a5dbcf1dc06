//! lbfgsb::types — shared numeric aliases and protocol constants.
//!
//! Purpose
//! -------
//! Centralize the vector aliases, default settings, and fixed buffer widths
//! used across the driver, the workspace, and step routines, so the rest of
//! the code never spells out `ndarray` generics or magic sizes.
//!
//! Conventions
//! -----------
//! - Points and gradients are `ndarray` vectors over `f64` with 0-based
//!   indexing; step routines receive the same vectors without translation.
//! - Save-array lengths and the status width follow the classic L-BFGS-B
//!   calling contract so a native routine can be plugged in unchanged.
use ndarray::Array1;

/// Parameter vector `x` being optimized.
pub type Theta = Array1<f64>;

/// Gradient vector `∇f(x)`, same length as [`Theta`].
pub type Grad = Array1<f64>;

/// Scalar objective value.
pub type Cost = f64;

/// Default number of correction pairs (`m`).
pub const DEFAULT_CORRECTIONS: usize = 10;

/// Default relative-reduction factor; the stop test uses `factr * ε`.
pub const DEFAULT_FACTR: f64 = 1e7;

/// Default tolerance on the ∞-norm of the projected gradient.
pub const DEFAULT_PGTOL: f64 = 1e-5;

/// Default verbosity (negative means silent).
pub const DEFAULT_VERBOSITY: i32 = -1;

/// Fixed width of the task and message strings.
pub const STATUS_WIDTH: usize = 60;

/// Length of the logical save array.
pub const LSAVE_LEN: usize = 4;

/// Length of the integer save array.
pub const ISAVE_LEN: usize = 44;

/// Length of the float save array.
pub const DSAVE_LEN: usize = 29;

/// Task written before the first step of a run.
pub const START_TASK: &str = "START";
