//! Validation helpers for the driver and workspace.
//!
//! This module centralizes the consistency checks shared by the public
//! entry points:
//!
//! - **Shape checks**: [`validate_dimension`], [`validate_corrections`]
//!   reject empty problems and empty correction histories.
//! - **Step limit**: [`validate_max_steps`] rejects a limit of zero.
//! - **Tolerance checks**: [`verify_factr`], [`verify_pgtol`] ensure the
//!   stopping tolerances are finite and non-negative.
//! - **Gradient checks**: [`validate_grad`] enforces that the objective kept
//!   the gradient at the problem dimension.
//!
//! Finiteness of objective values and gradient entries is not checked here;
//! the step routine owns that decision.
use crate::optimization::{
    errors::{OptError, OptResult},
    lbfgsb::types::Grad,
};

/// Validate the problem dimension `n`.
///
/// # Errors
/// Returns [`OptError::InvalidDimension`] if `n == 0`.
pub fn validate_dimension(n: usize) -> OptResult<()> {
    if n == 0 {
        return Err(OptError::InvalidDimension {
            n,
            reason: "Problem dimension must be greater than zero.",
        });
    }
    Ok(())
}

/// Validate the correction depth `m`.
///
/// # Errors
/// Returns [`OptError::InvalidCorrections`] if `m == 0`.
pub fn validate_corrections(m: usize) -> OptResult<()> {
    if m == 0 {
        return Err(OptError::InvalidCorrections {
            m,
            reason: "Number of corrections must be greater than zero.",
        });
    }
    Ok(())
}

/// Validate an optional step limit.
///
/// The limit is compared against the accepted-iterate counter at each new
/// iterate, so the smallest meaningful value is one.
///
/// # Errors
/// Returns [`OptError::InvalidMaxSteps`] if the limit is `Some(0)`.
pub fn validate_max_steps(max_steps: Option<usize>) -> OptResult<()> {
    if max_steps == Some(0) {
        return Err(OptError::InvalidMaxSteps {
            max_steps: 0,
            reason: "Step limit must be at least one accepted iterate.",
        });
    }
    Ok(())
}

/// Validate the relative-reduction factor.
///
/// Zero is allowed and disables the relative-reduction test.
///
/// # Errors
/// Returns [`OptError::InvalidFactr`] if the value is non-finite or < 0.0.
pub fn verify_factr(tol: f64) -> OptResult<()> {
    if !tol.is_finite() {
        return Err(OptError::InvalidFactr { tol, reason: "Tolerance must be finite." });
    }
    if tol < 0.0 {
        return Err(OptError::InvalidFactr { tol, reason: "Tolerance must be non-negative." });
    }
    Ok(())
}

/// Validate the projected-gradient tolerance.
///
/// Zero is allowed and disables the projected-gradient test.
///
/// # Errors
/// Returns [`OptError::InvalidPgtol`] if the value is non-finite or < 0.0.
pub fn verify_pgtol(tol: f64) -> OptResult<()> {
    if !tol.is_finite() {
        return Err(OptError::InvalidPgtol { tol, reason: "Tolerance must be finite." });
    }
    if tol < 0.0 {
        return Err(OptError::InvalidPgtol { tol, reason: "Tolerance must be non-negative." });
    }
    Ok(())
}

/// Validate that an objective left the gradient at length `dim`.
///
/// # Errors
/// [`OptError::GradientDimMismatch`] if `grad.len() != dim`.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    Ok(())
}
