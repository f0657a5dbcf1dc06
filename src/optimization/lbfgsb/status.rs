//! Fixed-width status strings and the decoded task code.
//!
//! The step routine talks to the driver through two 60-byte, space-padded,
//! unterminated text fields. The driver decodes the task field's leading
//! byte into a [`Task`] right after every call; raw text only leaves the
//! driver as a trimmed diagnostic message.
use crate::optimization::lbfgsb::types::STATUS_WIDTH;

/// 60-byte space-padded status field (no terminator).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct StatusString([u8; STATUS_WIDTH]);

impl StatusString {
    /// All spaces: the "no status yet" representation.
    pub fn blank() -> Self {
        Self([b' '; STATUS_WIDTH])
    }

    /// Build a field holding `text`, space-padded (truncated past the width).
    pub fn from_text(text: &str) -> Self {
        let mut s = Self::blank();
        s.set(text);
        s
    }

    /// Overwrite the whole field with `text` followed by spaces.
    pub fn set(&mut self, text: &str) {
        self.0 = [b' '; STATUS_WIDTH];
        let bytes = text.as_bytes();
        let len = bytes.len().min(STATUS_WIDTH);
        self.0[..len].copy_from_slice(&bytes[..len]);
    }

    pub fn as_bytes(&self) -> &[u8; STATUS_WIDTH] {
        &self.0
    }

    /// Mutable access for native routines that write the field in place.
    pub fn as_bytes_mut(&mut self) -> &mut [u8; STATUS_WIDTH] {
        &mut self.0
    }

    pub fn leading(&self) -> u8 {
        self.0[0]
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix.as_bytes())
    }

    /// Text with trailing padding stripped; non-UTF-8 bytes are replaced.
    pub fn trimmed(&self) -> String {
        String::from_utf8_lossy(&self.0).trim_end().to_string()
    }

    pub fn is_blank(&self) -> bool {
        self.0.iter().all(|&b| b == b' ')
    }
}

impl Default for StatusString {
    fn default() -> Self {
        Self::blank()
    }
}

impl std::fmt::Debug for StatusString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StatusString({:?})", self.trimmed())
    }
}

/// Decoded task code of the reverse-communication protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Start sentinel (`START`), or a caller-written `STOP`.
    Start,
    /// `FG...`: evaluate value and gradient at the current point.
    FunctionGradient,
    /// `NEW_X`: the current point is an accepted iterate.
    NewIterate,
    /// `CONVERGENCE...`: the routine's own stopping test holds.
    Converged,
    /// `ABNORMAL_...`: the routine gave up (e.g. line-search failure).
    Abnormal,
    /// `ERROR...`: the routine rejected its input.
    Error,
}

impl Task {
    /// Decode the leading byte; `None` for anything outside the protocol.
    pub fn decode(status: &StatusString) -> Option<Task> {
        match status.leading() {
            b'S' => Some(Task::Start),
            b'F' => Some(Task::FunctionGradient),
            b'N' => Some(Task::NewIterate),
            b'C' => Some(Task::Converged),
            b'A' => Some(Task::Abnormal),
            b'E' => Some(Task::Error),
            _ => None,
        }
    }

    /// `true` for states after which the routine will not move again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Task::Converged | Task::Abnormal | Task::Error)
    }
}
