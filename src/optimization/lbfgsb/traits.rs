//! Public API surface for bound-constrained minimization.
//!
//! - [`Objective`]: trait users implement (or a plain closure) to supply
//!   `f(x)` and `∇f(x)`.
//! - [`MinimizeOptions`] and [`Tolerances`]: configuration for the driver.
//! - [`Outcome`] and [`Termination`]: normalized result of a successful run.
//!
//! Convention: the driver *minimizes*. The objective writes the gradient
//! into the buffer it is handed and returns the value; the buffer always has
//! the problem dimension on entry and must keep it.
use crate::optimization::{
    errors::OptResult,
    lbfgsb::{
        bounds::Bounds,
        diagnostics::{Diagnostics, DiagnosticsSnapshot},
        types::{
            Cost, DEFAULT_CORRECTIONS, DEFAULT_FACTR, DEFAULT_PGTOL, DEFAULT_VERBOSITY, Grad,
            Theta,
        },
        validation::{validate_corrections, validate_max_steps, verify_factr, verify_pgtol},
    },
};

/// Objective and gradient supplier.
///
/// `evaluate` receives the current point and a gradient buffer of length
/// `n`; it returns `f(x)` and leaves `∇f(x)` in the buffer. Returning an
/// error aborts the run and the error reaches the caller unchanged.
///
/// Any `FnMut(&Theta, &mut Grad) -> f64` closure is an infallible
/// objective.
pub trait Objective {
    fn evaluate(&mut self, x: &Theta, grad: &mut Grad) -> OptResult<Cost>;
}

impl<F> Objective for F
where
    F: FnMut(&Theta, &mut Grad) -> Cost,
{
    fn evaluate(&mut self, x: &Theta, grad: &mut Grad) -> OptResult<Cost> {
        Ok(self(x, grad))
    }
}

/// Caller-supplied stopping rule, polled only when a new iterate is
/// accepted.
pub type StopPredicate<'a> = &'a dyn Fn(&Diagnostics<'_>) -> bool;

/// Stopping tolerances handed to the step routine.
///
/// - `factr`: relative-reduction factor; the routine stops when
///   `(f_old - f) / max(|f_old|, |f|, 1) <= factr * ε`. Typical values are
///   `1e12` (low accuracy), `1e7` (moderate), `10` (high).
/// - `pgtol`: stop when the ∞-norm of the projected gradient is `<= pgtol`.
///
/// Zero disables the corresponding test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub factr: f64,
    pub pgtol: f64,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Errors
    /// - [`crate::optimization::errors::OptError::InvalidFactr`] /
    ///   [`crate::optimization::errors::OptError::InvalidPgtol`] for
    ///   non-finite or negative values.
    pub fn new(factr: f64, pgtol: f64) -> OptResult<Self> {
        verify_factr(factr)?;
        verify_pgtol(pgtol)?;
        Ok(Self { factr, pgtol })
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self { factr: DEFAULT_FACTR, pgtol: DEFAULT_PGTOL }
    }
}

/// Driver-level configuration.
///
/// Fields:
/// - `bounds`: optional lower/upper bound vectors (borrowed).
/// - `corrections`: number of correction pairs `m` kept by the routine.
/// - `tols`: [`Tolerances`] forwarded to the routine.
/// - `max_steps`: stop once the iteration counter reaches this value
///   (at least one; checked when an iterate is accepted).
/// - `stop`: optional [`StopPredicate`] over the current diagnostics.
/// - `verbosity`: routine print level (`< 0` silent).
///
/// Default:
/// - no bounds, `corrections = 10`, `factr = 1e7`, `pgtol = 1e-5`,
///   no step limit, no predicate, `verbosity = -1`.
#[derive(Clone, Copy)]
pub struct MinimizeOptions<'a> {
    pub bounds: Bounds<'a>,
    pub corrections: usize,
    pub tols: Tolerances,
    pub max_steps: Option<usize>,
    pub stop: Option<StopPredicate<'a>>,
    pub verbosity: i32,
}

impl<'a> MinimizeOptions<'a> {
    /// Create options with explicit bounds, depth and tolerances.
    ///
    /// # Errors
    /// - [`crate::optimization::errors::OptError::InvalidCorrections`] if
    ///   `corrections == 0`.
    pub fn new(bounds: Bounds<'a>, corrections: usize, tols: Tolerances) -> OptResult<Self> {
        validate_corrections(corrections)?;
        Ok(Self { bounds, corrections, tols, ..Self::default() })
    }

    pub fn with_bounds(mut self, bounds: Bounds<'a>) -> Self {
        self.bounds = bounds;
        self
    }

    /// Set the correction depth.
    ///
    /// # Errors
    /// - [`crate::optimization::errors::OptError::InvalidCorrections`] if
    ///   `corrections == 0`.
    pub fn with_corrections(mut self, corrections: usize) -> OptResult<Self> {
        validate_corrections(corrections)?;
        self.corrections = corrections;
        Ok(self)
    }

    pub fn with_tolerances(mut self, tols: Tolerances) -> Self {
        self.tols = tols;
        self
    }

    /// Stop once `max_steps` iterates have been accepted.
    ///
    /// # Errors
    /// - [`crate::optimization::errors::OptError::InvalidMaxSteps`] if
    ///   `max_steps == 0`.
    pub fn with_max_steps(mut self, max_steps: usize) -> OptResult<Self> {
        validate_max_steps(Some(max_steps))?;
        self.max_steps = Some(max_steps);
        Ok(self)
    }

    pub fn with_stop(mut self, stop: StopPredicate<'a>) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn with_verbosity(mut self, verbosity: i32) -> Self {
        self.verbosity = verbosity;
        self
    }
}

impl Default for MinimizeOptions<'_> {
    fn default() -> Self {
        Self {
            bounds: Bounds::none(),
            corrections: DEFAULT_CORRECTIONS,
            tols: Tolerances::default(),
            max_steps: None,
            stop: None,
            verbosity: DEFAULT_VERBOSITY,
        }
    }
}

impl std::fmt::Debug for MinimizeOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MinimizeOptions")
            .field("bounds", &self.bounds)
            .field("corrections", &self.corrections)
            .field("tols", &self.tols)
            .field("max_steps", &self.max_steps)
            .field("stop", &self.stop.map(|_| "<predicate>"))
            .field("verbosity", &self.verbosity)
            .finish()
    }
}

/// Why a successful run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The routine's own convergence test held.
    Converged,
    /// The step limit or the caller's predicate fired at a new iterate.
    Stopped,
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::Converged => write!(f, "converged"),
            Termination::Stopped => write!(f, "stopped"),
        }
    }
}

/// Result returned by `minimize` / `minimize_with`.
///
/// - `value`: objective value at the final point (the point itself is left
///   in the caller's `x`).
/// - `termination`: [`Termination`] reason.
/// - `message`: final task text with padding stripped.
/// - `diagnostics`: owned copy of the save-array counters at exit.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub value: Cost,
    pub termination: Termination,
    pub message: String,
    pub diagnostics: DiagnosticsSnapshot,
}

impl Outcome {
    pub fn converged(&self) -> bool {
        self.termination == Termination::Converged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptError;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Validation in `Tolerances::new` and `MinimizeOptions::new`.
    // - Defaults and builder setters of `MinimizeOptions`.
    // - The closure blanket impl of `Objective`.
    //
    // They intentionally DO NOT cover:
    // - Driver behavior (see `run` and the integration tests).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Defaults match the classic L-BFGS-B settings.
    fn defaults_are_classic() {
        let opts = MinimizeOptions::default();
        assert_eq!(opts.corrections, 10);
        assert_eq!(opts.tols, Tolerances { factr: 1e7, pgtol: 1e-5 });
        assert_eq!(opts.max_steps, None);
        assert!(opts.stop.is_none());
        assert_eq!(opts.verbosity, -1);
        assert!(opts.bounds.lower.is_none() && opts.bounds.upper.is_none());
    }

    #[test]
    // Purpose
    // -------
    // Invalid tolerances, zero depth and a zero step limit are rejected at
    // construction.
    fn constructors_validate() {
        assert!(matches!(Tolerances::new(-1.0, 1e-5), Err(OptError::InvalidFactr { .. })));
        assert!(matches!(Tolerances::new(1e7, f64::NAN), Err(OptError::InvalidPgtol { .. })));
        assert!(Tolerances::new(0.0, 0.0).is_ok());
        assert!(matches!(
            MinimizeOptions::new(Bounds::none(), 0, Tolerances::default()),
            Err(OptError::InvalidCorrections { .. })
        ));
        assert!(matches!(
            MinimizeOptions::default().with_corrections(0),
            Err(OptError::InvalidCorrections { .. })
        ));
        assert!(matches!(
            MinimizeOptions::default().with_max_steps(0),
            Err(OptError::InvalidMaxSteps { max_steps: 0, .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Setters compose and the predicate survives `Debug` formatting.
    fn setters_compose() {
        // Arrange
        let lower = array![0.0, 0.0];
        let stop: StopPredicate<'_> = &|d| d.iterations() > 3;

        // Act
        let opts = MinimizeOptions::default()
            .with_bounds(Bounds::none().with_lower(lower.view()))
            .with_max_steps(7)
            .expect("valid limit")
            .with_stop(stop)
            .with_verbosity(0)
            .with_corrections(4)
            .expect("valid depth");

        // Assert
        assert_eq!(opts.corrections, 4);
        assert_eq!(opts.max_steps, Some(7));
        assert_eq!(opts.verbosity, 0);
        assert!(opts.bounds.lower.is_some());
        assert!(format!("{opts:?}").contains("<predicate>"));
    }

    #[test]
    // Purpose
    // -------
    // A closure is an infallible objective that fills the gradient buffer.
    fn closure_is_objective() {
        // Arrange
        let mut calls = 0;
        let mut obj = |x: &Theta, g: &mut Grad| {
            calls += 1;
            g.assign(&(x * 2.0));
            x.dot(x)
        };
        let x = array![1.0, 2.0];
        let mut g = Grad::zeros(2);

        // Act
        let v = obj.evaluate(&x, &mut g).expect("closure never fails");

        // Assert
        assert_eq!(v, 5.0);
        assert_eq!(g, array![2.0, 4.0]);
        drop(obj);
        assert_eq!(calls, 1);
    }
}
