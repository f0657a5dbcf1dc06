//! The step-routine contract.
//!
//! A step routine is the numerical core the driver does not implement: it is
//! entered once per loop iteration with the current point and the complete
//! persistent state, advances its internal state machine, and rewrites the
//! task string to say what it needs next. It never calls the objective
//! itself.
//!
//! Buffer sizes in [`StepBuffers`] always match the L-BFGS-B formulas for
//! the call's `(n, m)` exactly, so a native routine that does no bounds
//! checking can be wrapped without further slicing.
use crate::optimization::lbfgsb::{
    bounds::EncodedBounds,
    status::StatusString,
    types::{DSAVE_LEN, Grad, ISAVE_LEN, LSAVE_LEN, Theta},
};

/// Exact-size mutable views of a workspace for one step.
///
/// - `wa`: `(2m + 4)·n + 12·m·(m + 1)` floats.
/// - `iwa`: `3·n` integers.
/// - `task`, `csave`: fixed-width status fields.
/// - `lsave`, `isave`, `dsave`: save arrays carried across steps.
#[derive(Debug)]
pub struct StepBuffers<'a> {
    pub wa: &'a mut [f64],
    pub iwa: &'a mut [i32],
    pub task: &'a mut StatusString,
    pub csave: &'a mut StatusString,
    pub lsave: &'a mut [i32; LSAVE_LEN],
    pub isave: &'a mut [i32; ISAVE_LEN],
    pub dsave: &'a mut [f64; DSAVE_LEN],
}

/// Arguments of one step-routine invocation.
///
/// `f` is the value slot: the routine may leave it untouched (the value
/// round-trips) or overwrite it when it restores an earlier point.
#[derive(Debug)]
pub struct StepCall<'a, 'b> {
    pub m: usize,
    pub x: &'a mut Theta,
    pub bounds: &'a EncodedBounds<'b>,
    pub f: &'a mut f64,
    pub g: &'a mut Grad,
    pub factr: f64,
    pub pgtol: f64,
    pub verbosity: i32,
    pub buffers: StepBuffers<'a>,
}

/// A reverse-communication step routine.
///
/// Implementations keep no state of their own between calls beyond what
/// they write into the call's buffers; a run may be resumed on a different
/// routine instance as long as the workspace is the same.
pub trait StepRoutine {
    fn step(&mut self, call: StepCall<'_, '_>);
}

impl<R: StepRoutine + ?Sized> StepRoutine for &mut R {
    fn step(&mut self, call: StepCall<'_, '_>) {
        (**self).step(call)
    }
}
