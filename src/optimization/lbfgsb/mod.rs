//! lbfgsb — reverse-communication driver for a bound-constrained L-BFGS-B
//! step routine.
//!
//! Purpose
//! -------
//! Minimize a smooth objective `f(x)` subject to optional per-variable box
//! constraints by repeatedly invoking a step routine that never calls the
//! objective itself. The routine rewrites a fixed-width task string; the
//! driver reacts by evaluating `f` and `∇f`, polling caller stopping rules,
//! or ending the run.
//!
//! Key behaviors
//! -------------
//! - Encode optional lower/upper bound vectors into the routine's boundary
//!   codes ([`bounds::encode_bounds`]), treating infinite sentinels as
//!   absent sides.
//! - Size, validate and reuse the persistent scratch state
//!   ([`workspace::Workspace`]); a too-small workspace is a resize signal
//!   carrying the dimension to reallocate with.
//! - Run the task state machine ([`run::run_driver`]) behind the two entry
//!   points [`minimize`] and [`minimize_with`].
//! - Expose counters, norms and timings from the save arrays
//!   ([`diagnostics::Diagnostics`]).
//! - Ship one concrete step routine, [`kernel::ProjectedLbfgs`], that keeps
//!   all of its state in the workspace.
//!
//! Invariants & assumptions
//! ------------------------
//! - Buffer sizes handed to a routine match `(2m + 4)·n + 12·m·(m + 1)`
//!   floats and `3·n` integers for the call's `(n, m)` exactly.
//! - Status strings are 60 bytes, space-padded, unterminated; the driver
//!   decodes them by leading byte immediately after each step.
//! - The stopping predicate and step limit are only consulted when a new
//!   iterate has been accepted, never between line-search evaluations.
//!
//! Conventions
//! -----------
//! - 0-based indexing throughout; vectors are `ndarray` aliases from
//!   [`types`].
//! - Errors are [`OptError`](crate::optimization::errors::OptError) values;
//!   only a routine that breaks the task protocol causes a panic.
//! - Progress is reported through `tracing` events; nothing is printed.
//!
//! Testing notes
//! -------------
//! - Unit tests per submodule cover encoding, sizing, decoding, dispatch
//!   against scripted routines, and the kernel's bookkeeping.
//! - Integration tests under `tests/` run end-to-end problems and compare
//!   against `argmin`'s L-BFGS as an independent reference.

pub mod api;
pub mod bounds;
pub mod diagnostics;
pub mod kernel;
pub mod run;
pub mod status;
pub mod step;
pub mod traits;
pub mod types;
pub mod validation;
pub mod workspace;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::{minimize, minimize_with};
pub use self::bounds::{BoundSide, BoundaryCode, Bounds, EncodedBounds, encode_bounds};
pub use self::diagnostics::{Diagnostics, DiagnosticsSnapshot};
pub use self::kernel::ProjectedLbfgs;
pub use self::status::{StatusString, Task};
pub use self::step::{StepBuffers, StepCall, StepRoutine};
pub use self::traits::{
    MinimizeOptions, Objective, Outcome, StopPredicate, Termination, Tolerances,
};
pub use self::types::{Cost, Grad, Theta};
pub use self::workspace::{Workspace, required_float_len, required_int_len};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use lbfgsb_rc::optimization::lbfgsb::prelude::*;
//
// to import the main driver surface in a single line.

pub mod prelude {
    pub use super::api::{minimize, minimize_with};
    pub use super::bounds::Bounds;
    pub use super::diagnostics::Diagnostics;
    pub use super::kernel::ProjectedLbfgs;
    pub use super::step::StepRoutine;
    pub use super::traits::{MinimizeOptions, Objective, Outcome, Termination, Tolerances};
    pub use super::types::{Grad, Theta};
    pub use super::workspace::Workspace;
}
