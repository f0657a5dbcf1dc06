//! Workspace — persistent scratch state for one problem size.
//!
//! Purpose
//! -------
//! Own every buffer a step routine needs across calls: the float and integer
//! scratch areas, the task and message fields, and the three save arrays.
//! A workspace is created explicitly for `(n, m)` and may be reused for any
//! smaller-or-equal problem; it is never grown.
//!
//! Key behaviors
//! -------------
//! - [`Workspace::new`] allocates buffers at exactly the sizes the step
//!   contract requires and arms the task field with the start sentinel.
//! - [`Workspace::validate`] checks capacities for a new `(n, m)` and, on
//!   failure, reports the smallest dimension that would fit.
//! - [`Workspace::buffers_mut`] hands out exact-size views for one step.
//! - [`Workspace::diagnostics`] exposes the save arrays read-only.
//!
//! Invariants & assumptions
//! ------------------------
//! - `wa.len() == required_float_len(n, m)` and `iwa.len() == required_int_len(n)`
//!   for the `(n, m)` the workspace was created with; lengths never change.
//! - Exclusive ownership is enforced by `&mut` borrows; two runs cannot
//!   share one workspace concurrently.
//!
//! Conventions
//! -----------
//! - Status fields are 60 bytes, space-padded, with no terminator.
//! - `lsave` stores logical flags as 0/1 integers.
use crate::optimization::{
    errors::{OptError, OptResult},
    lbfgsb::{
        diagnostics::Diagnostics,
        status::StatusString,
        step::StepBuffers,
        types::{DSAVE_LEN, ISAVE_LEN, LSAVE_LEN, START_TASK},
        validation::{validate_corrections, validate_dimension},
    },
};

/// Float scratch length for `(n, m)`: `(2m + 4)·n + 12·m·(m + 1)`.
pub fn required_float_len(n: usize, m: usize) -> usize {
    (2 * m + 4) * n + 12 * m * (m + 1)
}

/// Integer scratch length for `n`: `3·n`.
pub fn required_int_len(n: usize) -> usize {
    3 * n
}

#[derive(Debug, Clone)]
pub struct Workspace {
    n: usize,
    m: usize,
    wa: Vec<f64>,
    iwa: Vec<i32>,
    task: StatusString,
    csave: StatusString,
    lsave: [i32; LSAVE_LEN],
    isave: [i32; ISAVE_LEN],
    dsave: [f64; DSAVE_LEN],
}

impl Workspace {
    /// Allocate a workspace for dimension `n` and correction depth `m`.
    ///
    /// # Errors
    /// - [`OptError::InvalidDimension`] if `n == 0`.
    /// - [`OptError::InvalidCorrections`] if `m == 0`.
    pub fn new(n: usize, m: usize) -> OptResult<Self> {
        validate_dimension(n)?;
        validate_corrections(m)?;
        Ok(Self {
            n,
            m,
            wa: vec![0.0; required_float_len(n, m)],
            iwa: vec![0; required_int_len(n)],
            task: StatusString::from_text(START_TASK),
            csave: StatusString::blank(),
            lsave: [0; LSAVE_LEN],
            isave: [0; ISAVE_LEN],
            dsave: [0.0; DSAVE_LEN],
        })
    }

    /// Dimension the workspace was created for.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Correction depth the workspace was created for.
    pub fn corrections(&self) -> usize {
        self.m
    }

    pub fn float_capacity(&self) -> usize {
        self.wa.len()
    }

    pub fn int_capacity(&self) -> usize {
        self.iwa.len()
    }

    /// Current task field.
    pub fn task(&self) -> &StatusString {
        &self.task
    }

    /// Current message field.
    pub fn message(&self) -> &StatusString {
        &self.csave
    }

    /// Check the buffers can serve a problem of size `(n, m)`.
    ///
    /// # Errors
    /// - [`OptError::InvalidDimension`] / [`OptError::InvalidCorrections`]
    ///   for a zero `n` or `m`.
    /// - [`OptError::Resize`] when a buffer is too small; `required_n` is the
    ///   smallest dimension for which a fresh workspace at this workspace's
    ///   correction depth (or at `m`) would hold the problem.
    pub fn validate(&self, n: usize, m: usize) -> OptResult<()> {
        validate_dimension(n)?;
        validate_corrections(m)?;
        if self.wa.len() >= required_float_len(n, m) && self.iwa.len() >= required_int_len(n) {
            return Ok(());
        }
        let required_n = self.min_dimension(n, m);
        Err(OptError::Resize { requested_n: n, corrections: m, required_n })
    }

    /// Re-arm the start sentinel and clear status and save arrays.
    ///
    /// Scratch buffers are left as they are; routines reinitialize them on
    /// `START`.
    pub fn reset(&mut self) {
        self.task.set(START_TASK);
        self.csave = StatusString::blank();
        self.lsave = [0; LSAVE_LEN];
        self.isave = [0; ISAVE_LEN];
        self.dsave = [0.0; DSAVE_LEN];
    }

    /// Exact-size buffer views for a step on `(n, m)`.
    ///
    /// # Errors
    /// Same as [`Workspace::validate`].
    pub fn buffers_mut(&mut self, n: usize, m: usize) -> OptResult<StepBuffers<'_>> {
        self.validate(n, m)?;
        Ok(StepBuffers {
            wa: &mut self.wa[..required_float_len(n, m)],
            iwa: &mut self.iwa[..required_int_len(n)],
            task: &mut self.task,
            csave: &mut self.csave,
            lsave: &mut self.lsave,
            isave: &mut self.isave,
            dsave: &mut self.dsave,
        })
    }

    /// Read-only view of the counters and timings in the save arrays.
    pub fn diagnostics(&self) -> Diagnostics<'_> {
        Diagnostics::new(&self.lsave, &self.isave, &self.dsave)
    }

    pub(crate) fn set_task(&mut self, text: &str) {
        self.task.set(text);
    }

    // ---- Helper Methods ----

    /// Invert both sizing formulas at this workspace's depth, rounding up.
    fn min_dimension(&self, n: usize, m: usize) -> usize {
        let per_var = 2 * self.m + 4;
        let fixed = 12 * self.m * (self.m + 1);
        let from_float = required_float_len(n, m).saturating_sub(fixed).div_ceil(per_var);
        let from_int = required_int_len(n).div_ceil(3);
        from_float.max(from_int).max(1)
    }
}
