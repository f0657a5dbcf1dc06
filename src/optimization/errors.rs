use crate::optimization::lbfgsb::bounds::BoundSide;

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

/// Coarse classification of [`OptError`] values.
///
/// Callers that only need to decide *how* to react (fix their input,
/// reallocate a workspace, give up on the run) can match on this instead of
/// on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed caller input, detected up front or reported by the step routine.
    InvalidArgument,
    /// A reused workspace is too small for the requested problem.
    Resize,
    /// The step routine stopped without satisfying its convergence test.
    Abnormal,
    /// The user objective reported a failure.
    Objective,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Problem shape ----
    /// Problem dimension must be at least one.
    InvalidDimension {
        n: usize,
        reason: &'static str,
    },

    /// Correction depth must be at least one.
    InvalidCorrections {
        m: usize,
        reason: &'static str,
    },

    /// Step limit must allow at least one accepted iterate.
    InvalidMaxSteps {
        max_steps: usize,
        reason: &'static str,
    },

    /// A supplied bound vector is shorter than the problem dimension.
    BoundLengthMismatch {
        side: BoundSide,
        expected: usize,
        found: usize,
    },

    // ---- Tolerances ----
    /// Relative-reduction factor needs to be finite and non-negative.
    InvalidFactr {
        tol: f64,
        reason: &'static str,
    },

    /// Projected-gradient tolerance needs to be finite and non-negative.
    InvalidPgtol {
        tol: f64,
        reason: &'static str,
    },

    // ---- Objective ----
    /// Gradient dimensions do not match parameter dimensions.
    GradientDimMismatch {
        expected: usize,
        found: usize,
    },

    /// Failure raised by the user objective.
    Objective {
        text: String,
    },

    // ---- Workspace ----
    /// Workspace buffers cannot hold the requested problem.
    Resize {
        requested_n: usize,
        corrections: usize,
        required_n: usize,
    },

    // ---- Step routine ----
    /// Step routine rejected its input (`ERROR: ...` task).
    SolverInput {
        message: String,
    },

    /// Step routine terminated abnormally (`ABNORMAL_...` task).
    Abnormal {
        value: f64,
        message: String,
    },
}

impl OptError {
    /// Classify this error for callers that only need the broad category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OptError::InvalidDimension { .. }
            | OptError::InvalidCorrections { .. }
            | OptError::InvalidMaxSteps { .. }
            | OptError::BoundLengthMismatch { .. }
            | OptError::InvalidFactr { .. }
            | OptError::InvalidPgtol { .. }
            | OptError::GradientDimMismatch { .. }
            | OptError::SolverInput { .. } => ErrorKind::InvalidArgument,
            OptError::Resize { .. } => ErrorKind::Resize,
            OptError::Abnormal { .. } => ErrorKind::Abnormal,
            OptError::Objective { .. } => ErrorKind::Objective,
        }
    }

    /// Minimal dimension to reallocate with, if this is a resize signal.
    pub fn required_n(&self) -> Option<usize> {
        match self {
            OptError::Resize { required_n, .. } => Some(*required_n),
            _ => None,
        }
    }
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Problem shape ----
            OptError::InvalidDimension { n, reason } => {
                write!(f, "Invalid problem dimension {n}: {reason}")
            }
            OptError::InvalidCorrections { m, reason } => {
                write!(f, "Invalid correction depth {m}: {reason}")
            }
            OptError::InvalidMaxSteps { max_steps, reason } => {
                write!(f, "Invalid step limit {max_steps}: {reason}")
            }
            OptError::BoundLengthMismatch { side, expected, found } => {
                write!(
                    f,
                    "{side} bound length mismatch: expected at least {expected}, found {found}"
                )
            }

            // ---- Tolerances ----
            OptError::InvalidFactr { tol, reason } => {
                write!(f, "Invalid function reduction factor {tol}: {reason}")
            }
            OptError::InvalidPgtol { tol, reason } => {
                write!(f, "Invalid projected gradient tolerance {tol}: {reason}")
            }

            // ---- Objective ----
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            OptError::Objective { text } => {
                write!(f, "Objective evaluation failed: {text}")
            }

            // ---- Workspace ----
            OptError::Resize { requested_n, corrections, required_n } => {
                write!(
                    f,
                    "Workspace too small for n = {requested_n} with {corrections} corrections; \
                     reallocate with n >= {required_n}"
                )
            }

            // ---- Step routine ----
            OptError::SolverInput { message } => {
                write!(f, "Step routine rejected its input: {message}")
            }
            OptError::Abnormal { value, message } => {
                write!(f, "Abnormal termination at f = {value}: {message}")
            }
        }
    }
}
