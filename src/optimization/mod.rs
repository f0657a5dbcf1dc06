//! optimization — bound-constrained quasi-Newton driver and error surface.
//!
//! Purpose
//! -------
//! Provide the reverse-communication L-BFGS-B driver (`lbfgsb`) together with
//! a single error/result surface. Callers supply an objective with gradient,
//! an initial point and optional bounds, and obtain the final point, value
//! and solver diagnostics without touching the step routine's buffers.
//!
//! Key behaviors
//! -------------
//! - Expose `minimize` / `minimize_with`, the workspace type, bound encoding
//!   and diagnostics through `lbfgsb`.
//! - Normalize configuration mistakes, workspace sizing failures, routine
//!   terminations and objective failures into one enum (`errors::OptError`)
//!   with a common result alias (`OptResult<T>`) and a coarse
//!   `errors::ErrorKind` classifier.
//!
//! Conventions
//! -----------
//! - All entry points minimize; maximizing callers negate their objective.
//! - Public entry points that can fail return `OptResult<T>`.
//! - Logging goes through `tracing`; installing a subscriber is the
//!   application's job.

pub mod errors;
pub mod lbfgsb;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use lbfgsb_rc::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::errors::{ErrorKind, OptError, OptResult};
    pub use super::lbfgsb::prelude::*;
}
