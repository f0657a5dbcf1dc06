//! Reverse-communication driver loop.
//!
//! The driver owns no numerics. It hands the point, the encoded bounds and
//! the workspace to a [`StepRoutine`], decodes the task the routine left
//! behind, and either evaluates the objective, polls the stopping rules, or
//! ends the run:
//!
//! | task | driver action                                              |
//! |------|------------------------------------------------------------|
//! | `F`  | evaluate `f(x)` and `∇f(x)`, no stopping check             |
//! | `N`  | stop if the step limit or the caller's predicate fires      |
//! | `C`  | return [`Termination::Converged`]                          |
//! | `A`  | [`OptError::Abnormal`] with the last value and message     |
//! | `E`  | [`OptError::SolverInput`] with the routine's message       |
//!
//! Any other leading byte after a step is a broken routine and panics.
use tracing::{debug, trace};

use crate::optimization::{
    errors::{OptError, OptResult},
    lbfgsb::{
        bounds::encode_bounds,
        status::Task,
        step::{StepCall, StepRoutine},
        traits::{MinimizeOptions, Objective, Outcome, Termination},
        types::{Grad, START_TASK, Theta},
        validation::{
            validate_corrections, validate_dimension, validate_grad, validate_max_steps,
        },
        workspace::Workspace,
    },
};

const STOP_MAX_STEPS: &str = "STOP: ITERATION LIMIT REACHED";
const STOP_PREDICATE: &str = "STOP: STOPPING RULE SATISFIED";

/// Drive `routine` on `objective` from `x` until it converges, fails, or a
/// stopping rule fires at a new iterate.
///
/// On return `x` holds the last point the routine produced and the
/// workspace still holds the run's diagnostics.
///
/// # Errors
/// - [`OptError::InvalidCorrections`] / [`OptError::InvalidDimension`] for
///   a zero depth or an empty `x`.
/// - [`OptError::BoundLengthMismatch`] for short bound vectors.
/// - [`OptError::Resize`] if `ws` is too small for `(x.len(), corrections)`.
/// - [`OptError::GradientDimMismatch`] if the objective resized the gradient.
/// - Objective errors, unchanged.
/// - [`OptError::Abnormal`] / [`OptError::SolverInput`] from the routine.
///
/// # Panics
/// If the routine leaves a task outside the protocol.
pub fn run_driver<O, R>(
    objective: &mut O, x: &mut Theta, opts: &MinimizeOptions<'_>, ws: &mut Workspace,
    mut routine: R,
) -> OptResult<Outcome>
where
    O: Objective + ?Sized,
    R: StepRoutine,
{
    let m = opts.corrections;
    validate_corrections(m)?;
    validate_max_steps(opts.max_steps)?;
    let n = x.len();
    validate_dimension(n)?;
    let bounds = encode_bounds(n, &opts.bounds)?;
    ws.validate(n, m)?;

    ws.set_task(START_TASK);
    let mut f = 0.0;
    let mut g = Grad::zeros(n);
    debug!(n, m, constrained = bounds.is_constrained(), "starting driver");

    loop {
        routine.step(StepCall {
            m,
            x: &mut *x,
            bounds: &bounds,
            f: &mut f,
            g: &mut g,
            factr: opts.tols.factr,
            pgtol: opts.tols.pgtol,
            verbosity: opts.verbosity,
            buffers: ws.buffers_mut(n, m)?,
        });

        let task = Task::decode(ws.task());
        trace!(task = %ws.task().trimmed(), "step returned");
        match task {
            Some(Task::FunctionGradient) => {
                f = objective.evaluate(x, &mut g)?;
                validate_grad(&g, n)?;
            }
            Some(Task::NewIterate) => {
                let diag = ws.diagnostics();
                let hit_limit = opts.max_steps.is_some_and(|cap| diag.iterations() >= cap);
                let requested = !hit_limit && opts.stop.is_some_and(|stop| stop(&diag));
                if hit_limit || requested {
                    let reason = if hit_limit { STOP_MAX_STEPS } else { STOP_PREDICATE };
                    debug!(iterations = diag.iterations(), reason, "stopping at new iterate");
                    ws.set_task(reason);
                    return Ok(finish(ws, f, Termination::Stopped));
                }
            }
            Some(Task::Converged) => return Ok(finish(ws, f, Termination::Converged)),
            Some(Task::Abnormal) => {
                let message = ws.task().trimmed();
                debug!(value = f, %message, "routine terminated abnormally");
                return Err(OptError::Abnormal { value: f, message });
            }
            Some(Task::Error) => {
                let message = ws.task().trimmed();
                debug!(%message, "routine rejected its input");
                return Err(OptError::SolverInput { message });
            }
            Some(Task::Start) | None => {
                unreachable!("step routine left task outside the protocol: {:?}", ws.task())
            }
        }
    }
}

// ---- Helper Methods ----

fn finish(ws: &Workspace, value: f64, termination: Termination) -> Outcome {
    let diagnostics = ws.diagnostics().snapshot();
    debug!(
        %termination,
        value,
        iterations = diagnostics.iterations,
        evaluations = diagnostics.total_evaluations,
        "driver finished"
    );
    Outcome { value, termination, message: ws.task().trimmed(), diagnostics }
}
