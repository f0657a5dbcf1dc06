//! High-level entry points for bound-constrained minimization.
//!
//! [`minimize`] allocates a fresh [`Workspace`] sized for the problem and
//! runs the built-in [`ProjectedLbfgs`] routine. [`minimize_with`] takes a
//! caller-owned workspace and any [`StepRoutine`], for reuse across runs or
//! for plugging in a native L-BFGS-B.
use crate::optimization::{
    errors::OptResult,
    lbfgsb::{
        kernel::ProjectedLbfgs,
        run::run_driver,
        step::StepRoutine,
        traits::{MinimizeOptions, Objective, Outcome},
        types::Theta,
        workspace::Workspace,
    },
};

/// Minimize `f` from `x` with the built-in routine.
///
/// # Behavior
/// - Allocates a workspace for `(x.len(), opts.corrections)`.
/// - Runs [`ProjectedLbfgs`] through the reverse-communication driver.
/// - Leaves the final point in `x`.
///
/// # Errors
/// - [`crate::optimization::errors::OptError::InvalidDimension`] /
///   [`crate::optimization::errors::OptError::InvalidCorrections`] for an
///   empty `x` or zero depth.
/// - Everything [`run_driver`] can return.
///
/// # Example
/// ```
/// use lbfgsb_rc::prelude::*;
/// use ndarray::array;
///
/// let mut x = array![3.0, -1.0];
/// let out = minimize(
///     &mut |x: &Theta, g: &mut Grad| {
///         g.assign(&(x * 2.0));
///         x.dot(x)
///     },
///     &mut x,
///     &MinimizeOptions::default(),
/// )?;
/// assert!(out.converged());
/// assert!(x.iter().all(|v| v.abs() < 1e-4));
/// # Ok::<(), OptError>(())
/// ```
pub fn minimize<O>(f: &mut O, x: &mut Theta, opts: &MinimizeOptions<'_>) -> OptResult<Outcome>
where
    O: Objective + ?Sized,
{
    let mut ws = Workspace::new(x.len(), opts.corrections)?;
    run_driver(f, x, opts, &mut ws, ProjectedLbfgs)
}

/// Minimize `f` from `x` with a caller-owned workspace and step routine.
///
/// The workspace must be large enough for `(x.len(), opts.corrections)`;
/// it is never grown. A too-small workspace yields
/// [`crate::optimization::errors::OptError::Resize`] whose `required_n`
/// sizes a replacement. After the call, `ws.diagnostics()` reports on the
/// run.
///
/// # Errors
/// Everything [`run_driver`] can return.
pub fn minimize_with<O, R>(
    f: &mut O, x: &mut Theta, opts: &MinimizeOptions<'_>, ws: &mut Workspace, routine: R,
) -> OptResult<Outcome>
where
    O: Objective + ?Sized,
    R: StepRoutine,
{
    run_driver(f, x, opts, ws, routine)
}
