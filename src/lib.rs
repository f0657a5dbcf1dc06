//! lbfgsb_rc — reverse-communication driver for bound-constrained L-BFGS-B.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers. The crate drives a
//! limited-memory, bound-constrained quasi-Newton step routine through its
//! task-string protocol: the routine asks for evaluations or announces new
//! iterates, and the driver answers until convergence, an abnormal stop, or
//! a caller-supplied stopping rule.
//!
//! Key behaviors
//! -------------
//! - Re-export the `optimization` module and a flat `prelude`.
//! - Ship a built-in step routine so the driver is usable without linking a
//!   native L-BFGS-B; any routine honoring the contract can be swapped in.
//!
//! Invariants & assumptions
//! ------------------------
//! - Single-threaded and synchronous; a workspace is borrowed mutably for a
//!   whole run.
//! - Gradients are supplied by the caller; no differentiation is attempted.
//!
//! Downstream usage
//! ----------------
//! ```
//! use lbfgsb_rc::prelude::*;
//! use ndarray::array;
//!
//! let lower = array![0.0, 0.0];
//! let upper = array![1.0, 1.0];
//! let opts = MinimizeOptions::default()
//!     .with_bounds(Bounds::new(Some(lower.view()), Some(upper.view())));
//!
//! let mut x = array![0.5, 0.5];
//! let mut objective = |x: &Theta, g: &mut Grad| {
//!     g[0] = 2.0 * (x[0] - 2.0);
//!     g[1] = 2.0 * (x[1] + 1.0);
//!     (x[0] - 2.0).powi(2) + (x[1] + 1.0).powi(2)
//! };
//! let out = minimize(&mut objective, &mut x, &opts)?;
//! assert!(out.converged());
//! assert_eq!(x, array![1.0, 0.0]);
//! # Ok::<(), OptError>(())
//! ```

pub mod optimization;

pub use crate::optimization::errors::{ErrorKind, OptError, OptResult};

pub mod prelude {
    pub use crate::optimization::prelude::*;
}
