//! Bound encoding — optional box constraints → per-variable boundary codes.
//!
//! Purpose
//! -------
//! Turn the caller's optional lower/upper bound vectors into the form a step
//! routine consumes: one [`BoundaryCode`] per variable plus borrowed bound
//! vectors, where a missing side is a zero-length placeholder.
//!
//! Key behaviors
//! -------------
//! - `-∞` on the lower side and `+∞` on the upper side count as "absent",
//!   whether or not a vector was supplied.
//! - Bound vectors longer than `n` are accepted and viewed through their
//!   first `n` entries; shorter ones are rejected.
//! - Bound data is never copied; [`EncodedBounds`] holds views into the
//!   caller's arrays.
//!
//! Invariants & assumptions
//! ------------------------
//! - `codes.len() == n` after a successful [`encode_bounds`].
//! - A placeholder side is only ever paired with codes that mark that side
//!   absent, so step routines never index into it.
use crate::optimization::errors::{OptError, OptResult};
use ndarray::{ArrayView1, s};

/// Which side of the box a bound vector describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundSide {
    Lower,
    Upper,
}

impl std::fmt::Display for BoundSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundSide::Lower => write!(f, "Lower"),
            BoundSide::Upper => write!(f, "Upper"),
        }
    }
}

/// Per-variable classification of the active bounds.
///
/// The discriminants are the integer `nbd` codes of the L-BFGS-B contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum BoundaryCode {
    #[default]
    Unbounded = 0,
    LowerOnly = 1,
    Both = 2,
    UpperOnly = 3,
}

impl BoundaryCode {
    /// Build the code from which sides carry a finite bound.
    pub fn from_sides(has_lower: bool, has_upper: bool) -> Self {
        match (has_lower, has_upper) {
            (false, false) => BoundaryCode::Unbounded,
            (true, false) => BoundaryCode::LowerOnly,
            (true, true) => BoundaryCode::Both,
            (false, true) => BoundaryCode::UpperOnly,
        }
    }

    pub fn has_lower(self) -> bool {
        matches!(self, BoundaryCode::LowerOnly | BoundaryCode::Both)
    }

    pub fn has_upper(self) -> bool {
        matches!(self, BoundaryCode::UpperOnly | BoundaryCode::Both)
    }

    /// Raw `nbd` value expected by native step routines.
    pub fn raw(self) -> i32 {
        self as i32
    }
}

/// Caller-facing box constraints. Either side may be omitted.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bounds<'a> {
    pub lower: Option<ArrayView1<'a, f64>>,
    pub upper: Option<ArrayView1<'a, f64>>,
}

impl<'a> Bounds<'a> {
    /// No constraints on any variable.
    pub fn none() -> Self {
        Self { lower: None, upper: None }
    }

    pub fn new(lower: Option<ArrayView1<'a, f64>>, upper: Option<ArrayView1<'a, f64>>) -> Self {
        Self { lower, upper }
    }

    pub fn with_lower(mut self, lower: ArrayView1<'a, f64>) -> Self {
        self.lower = Some(lower);
        self
    }

    pub fn with_upper(mut self, upper: ArrayView1<'a, f64>) -> Self {
        self.upper = Some(upper);
        self
    }
}

/// Bounds in the shape a step routine consumes.
///
/// `lower`/`upper` are either views of length `n` or empty placeholders.
#[derive(Debug, Clone)]
pub struct EncodedBounds<'a> {
    lower: ArrayView1<'a, f64>,
    upper: ArrayView1<'a, f64>,
    codes: Vec<BoundaryCode>,
}

impl<'a> EncodedBounds<'a> {
    pub fn lower(&self) -> ArrayView1<'a, f64> {
        self.lower
    }

    pub fn upper(&self) -> ArrayView1<'a, f64> {
        self.upper
    }

    pub fn codes(&self) -> &[BoundaryCode] {
        &self.codes
    }

    /// `true` if at least one variable has an active bound.
    pub fn is_constrained(&self) -> bool {
        self.codes.iter().any(|&c| c != BoundaryCode::Unbounded)
    }
}

/// Encode optional bounds for a problem of dimension `n`.
///
/// Returns
/// -------
/// [`EncodedBounds`] borrowing the caller's vectors (sliced to `n`).
///
/// Errors
/// ------
/// - [`OptError::BoundLengthMismatch`] if a supplied vector has fewer than
///   `n` entries; the error names the offending side.
pub fn encode_bounds<'a>(n: usize, bounds: &Bounds<'a>) -> OptResult<EncodedBounds<'a>> {
    let lower = bounds.lower.map(|l| prefix(l, n, BoundSide::Lower)).transpose()?;
    let upper = bounds.upper.map(|u| prefix(u, n, BoundSide::Upper)).transpose()?;

    let codes = (0..n)
        .map(|i| {
            let has_lower = lower.as_ref().is_some_and(|l| l[i] != f64::NEG_INFINITY);
            let has_upper = upper.as_ref().is_some_and(|u| u[i] != f64::INFINITY);
            BoundaryCode::from_sides(has_lower, has_upper)
        })
        .collect();

    Ok(EncodedBounds {
        lower: lower.unwrap_or_else(placeholder),
        upper: upper.unwrap_or_else(placeholder),
        codes,
    })
}

// ---- Helper Methods ----

fn prefix(v: ArrayView1<'_, f64>, n: usize, side: BoundSide) -> OptResult<ArrayView1<'_, f64>> {
    if v.len() < n {
        return Err(OptError::BoundLengthMismatch { side, expected: n, found: v.len() });
    }
    Ok(v.slice_move(s![..n]))
}

fn placeholder<'a>() -> ArrayView1<'a, f64> {
    let empty: &'a [f64] = &[];
    ArrayView1::from(empty)
}
